//! AI capability interface.

use async_trait::async_trait;

/// Operations an AI backend provides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AiCapability {
    ImageGeneration,
    SceneSplitting,
    BackgroundRemoval,
    Relighting,
    QualityEnhancement,
    Captioning,
    SpeechSynthesis,
}

impl std::fmt::Display for AiCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AiCapability::ImageGeneration => "Image generation",
            AiCapability::SceneSplitting => "Scene splitting",
            AiCapability::BackgroundRemoval => "Background removal",
            AiCapability::Relighting => "Relighting",
            AiCapability::QualityEnhancement => "Quality enhancement",
            AiCapability::Captioning => "Caption generation",
            AiCapability::SpeechSynthesis => "Speech synthesis",
        };
        f.write_str(name)
    }
}

/// Failure of an AI capability call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{capability} failed: {message}")]
pub struct AiServiceError {
    pub capability: AiCapability,
    pub message: String,
}

impl AiServiceError {
    pub fn new(capability: AiCapability, message: impl Into<String>) -> Self {
        Self {
            capability,
            message: message.into(),
        }
    }
}

pub type AiResult<T> = Result<T, AiServiceError>;

/// AI backend used by the studio.
///
/// Image and audio values are references (normally `data:` URIs) that the
/// export pipeline can fetch.
#[async_trait]
pub trait AiCapabilities: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> AiResult<String>;

    /// Splits a long scene description into shorter per-scene prompts.
    async fn split_long_prompt_into_scenes(&self, prompt: &str) -> AiResult<Vec<String>>;

    async fn remove_background(&self, image: &str) -> AiResult<String>;

    async fn relight(&self, image: &str) -> AiResult<String>;

    async fn enhance_quality(&self, image: &str) -> AiResult<String>;

    async fn generate_captions(&self, prompt: &str) -> AiResult<String>;

    /// Synthesizes speech for `text`, returning an audio reference.
    async fn generate_speech_audio(&self, text: &str) -> AiResult<String>;
}
