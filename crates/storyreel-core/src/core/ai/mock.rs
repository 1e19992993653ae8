//! In-memory `AiCapabilities` for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AiCapabilities, AiCapability, AiResult, AiServiceError};

#[derive(Default)]
pub struct MockAi {
    failing: HashSet<AiCapability>,
    scenes: Option<Vec<String>>,
    calls: Mutex<Vec<(AiCapability, String)>>,
}

impl MockAi {
    pub fn failing(capabilities: &[AiCapability]) -> Self {
        Self {
            failing: capabilities.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn with_scenes(scenes: &[&str]) -> Self {
        Self {
            scenes: Some(scenes.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Inputs passed to `capability`, in call order
    pub fn sources(&self, capability: AiCapability) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == capability)
            .map(|(_, input)| input.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn call(&self, capability: AiCapability, input: &str) -> AiResult<()> {
        self.calls.lock().unwrap().push((capability, input.to_string()));
        if self.failing.contains(&capability) {
            return Err(AiServiceError::new(capability, "mock failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl AiCapabilities for MockAi {
    async fn generate_image(&self, prompt: &str) -> AiResult<String> {
        self.call(AiCapability::ImageGeneration, prompt)?;
        Ok(format!("img({prompt})"))
    }

    async fn split_long_prompt_into_scenes(&self, prompt: &str) -> AiResult<Vec<String>> {
        self.call(AiCapability::SceneSplitting, prompt)?;
        Ok(self.scenes.clone().unwrap_or_else(|| vec![prompt.to_string()]))
    }

    async fn remove_background(&self, image: &str) -> AiResult<String> {
        self.call(AiCapability::BackgroundRemoval, image)?;
        Ok(format!("bg({image})"))
    }

    async fn relight(&self, image: &str) -> AiResult<String> {
        self.call(AiCapability::Relighting, image)?;
        Ok(format!("relit({image})"))
    }

    async fn enhance_quality(&self, image: &str) -> AiResult<String> {
        self.call(AiCapability::QualityEnhancement, image)?;
        Ok(format!("enhance({image})"))
    }

    async fn generate_captions(&self, prompt: &str) -> AiResult<String> {
        self.call(AiCapability::Captioning, prompt)?;
        Ok(format!("caption: {prompt}"))
    }

    async fn generate_speech_audio(&self, text: &str) -> AiResult<String> {
        self.call(AiCapability::SpeechSynthesis, text)?;
        Ok(format!("speech({text})"))
    }
}
