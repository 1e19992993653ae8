//! Prompt-to-scenes generation.

use std::sync::Arc;

use tracing::{info, warn};

use super::AiCapabilities;
use crate::core::assets::MediaAsset;
use crate::core::project::SharedStudioState;
use crate::core::render::ProgressSink;
use crate::core::{AssetId, CoreError, CoreResult};

/// Prompts longer than this are split into scenes first
pub const PROMPT_SPLIT_THRESHOLD_CHARS: usize = 180;

/// Whether a prompt should go through scene splitting.
pub fn should_split_prompt(prompt: &str) -> bool {
    let lowered = prompt.to_lowercase();
    prompt.chars().count() > PROMPT_SPLIT_THRESHOLD_CHARS
        || lowered.contains("act ")
        || lowered.contains("scene ")
}

fn preview(prompt: &str) -> String {
    let head: String = prompt.chars().take(30).collect();
    format!("\"{head}...\"")
}

/// Turns a text prompt into generated image assets
pub struct SceneGenerator {
    state: SharedStudioState,
    ai: Arc<dyn AiCapabilities>,
    sink: Arc<dyn ProgressSink>,
}

impl SceneGenerator {
    pub fn new(
        state: SharedStudioState,
        ai: Arc<dyn AiCapabilities>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self { state, ai, sink }
    }

    /// Generates one asset per scene and adds them to the front of the bin.
    ///
    /// Long prompts are split into scenes first; a failed split falls back
    /// to the original prompt. Any image failure aborts the whole batch and
    /// nothing is added.
    pub async fn generate(&self, prompt: &str) -> CoreResult<Vec<AssetId>> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            let err = CoreError::ValidationError("Prompt cannot be empty.".to_string());
            self.sink.fail(&err.to_string());
            return Err(err);
        }

        let result = self.generate_assets(prompt).await;
        let result = match result {
            Ok(assets) if assets.is_empty() => Err(CoreError::ValidationError(
                "No scenes were generated. The prompt might have been too short or complex."
                    .to_string(),
            )),
            Ok(assets) => {
                let ids = self.state.write().await.add_assets(assets);
                info!("Generated {} scene(s)", ids.len());
                Ok(ids)
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            self.sink.fail(&err.to_string());
        }
        self.sink.clear();
        result
    }

    async fn generate_assets(&self, prompt: &str) -> CoreResult<Vec<MediaAsset>> {
        let mut prompts = vec![prompt.to_string()];
        if should_split_prompt(prompt) {
            self.sink
                .report("Analyzing long prompt and splitting into scenes...");
            match self.ai.split_long_prompt_into_scenes(prompt).await {
                Ok(scenes) => {
                    let scenes: Vec<String> = scenes
                        .into_iter()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                    if !scenes.is_empty() {
                        prompts = scenes;
                    }
                }
                Err(e) => warn!("Scene splitting failed, using the original prompt: {}", e),
            }
        }

        let parts = prompts.len();
        let mut assets = Vec::with_capacity(parts);
        for (i, scene_prompt) in prompts.iter().enumerate() {
            if parts > 1 {
                self.sink.report(&format!(
                    "Generating scene {} of {}: {}",
                    i + 1,
                    parts,
                    preview(scene_prompt)
                ));
            } else {
                self.sink.report("Generating your scene...");
            }
            let image = self.ai.generate_image(scene_prompt).await?;
            assets.push(MediaAsset::generated(image, scene_prompt, i, parts));
        }
        Ok(assets)
    }
}
