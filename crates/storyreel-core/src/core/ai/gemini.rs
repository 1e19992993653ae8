//! Google Gemini backend
//!
//! Implements `AiCapabilities` on the Gemini REST API: text models for
//! captions and scene splitting, Imagen for scene images, an image-output
//! model for edits and a TTS model for narration.

use std::io::Cursor;
use std::sync::LazyLock;

use async_trait::async_trait;
use base64::Engine as _;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::capabilities::{AiCapabilities, AiCapability, AiResult, AiServiceError};
use crate::core::assets::data_uri;
use crate::core::render::{MediaFetcher, SourceFetcher};
use crate::core::settings::AiSettings;
use crate::core::{CoreError, CoreResult};

const BACKGROUND_REMOVAL_PROMPT: &str = "Remove the background from this image, making it transparent. If the main subject is a person or object, keep that. Output only the modified image.";
const ENHANCE_PROMPT: &str = "Upscale this image by 2x and enhance its overall quality, improving clarity and detail without significantly altering the artistic style. Output only the modified image.";
const RELIGHT_PROMPT: &str = "Apply enhanced, cinematic lighting to this image. Make it more dramatic. Output only the modified image.";

const CAPTION_SYSTEM: &str = "You are an expert caption writer for social media videos.";
const SPLIT_SYSTEM: &str = "You are a storyboard assistant. Break the user's scene description into a sequence of short, self-contained image prompts, one per video clip of roughly 5 to 7 seconds. Keep characters, setting and style consistent across prompts so the clips read as one story. Respond with a JSON array of strings and nothing else.";

/// Mime types accepted by the image edit model
const EDITABLE_IMAGE_MIMES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// Sample rate of TTS output when the response does not state one
const DEFAULT_PCM_RATE: u32 = 24_000;

static JSON_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(\w*)?\s*\n?(.*?)\n?\s*```$").expect("valid regex")
});

/// Gemini-backed AI capabilities
pub struct GeminiCapabilities {
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    api_key: String,
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    base_url: String,
    text_model: String,
    image_model: String,
    edit_model: String,
    tts_model: String,
    voice: String,
    fetcher: MediaFetcher,
    #[cfg(feature = "ai-providers")]
    client: reqwest::Client,
}

impl GeminiCapabilities {
    pub fn new(settings: &AiSettings) -> CoreResult<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CoreError::ValidationError("Gemini API key is required".to_string()))?
            .to_string();

        let mut settings = settings.clone();
        settings.normalize();

        #[cfg(feature = "ai-providers")]
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: settings.base_url,
            text_model: settings.text_model,
            image_model: settings.image_model,
            edit_model: settings.edit_model,
            tts_model: settings.tts_model,
            voice: settings.voice,
            fetcher: MediaFetcher::new(),
            #[cfg(feature = "ai-providers")]
            client,
        })
    }

    #[cfg(feature = "ai-providers")]
    async fn post<T: Serialize + Sync>(
        &self,
        capability: AiCapability,
        model: &str,
        method: &str,
        body: &T,
    ) -> AiResult<String> {
        let url = format!("{}/models/{}:{}", self.base_url, model, method);
        tracing::debug!("Gemini {} request to model {}", capability, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AiServiceError::new(capability, format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AiServiceError::new(capability, format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            let error: ApiError = serde_json::from_str(&text).unwrap_or(ApiError {
                error: ApiErrorDetail {
                    message: text.clone(),
                    code: None,
                    status: None,
                },
            });
            let status_str = error.error.status.as_deref().unwrap_or("unknown");
            return Err(AiServiceError::new(
                capability,
                format!(
                    "Gemini API error ({}; status={}): {}",
                    status, status_str, error.error.message
                ),
            ));
        }
        Ok(text)
    }

    #[cfg(feature = "ai-providers")]
    async fn generate_content(
        &self,
        capability: AiCapability,
        model: &str,
        request: &GenerateContentRequest,
    ) -> AiResult<GenerateContentResponse> {
        let body = self.post(capability, model, "generateContent", request).await?;
        let response: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            AiServiceError::new(capability, format!("Failed to parse response: {}", e))
        })?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            return Err(AiServiceError::new(
                capability,
                format!("Content blocked by Gemini safety filters: {}", reason),
            ));
        }
        Ok(response)
    }

    #[cfg(not(feature = "ai-providers"))]
    async fn generate_content(
        &self,
        capability: AiCapability,
        _model: &str,
        _request: &GenerateContentRequest,
    ) -> AiResult<GenerateContentResponse> {
        Err(feature_disabled(capability))
    }

    #[cfg(feature = "ai-providers")]
    async fn predict(
        &self,
        capability: AiCapability,
        model: &str,
        request: &PredictRequest,
    ) -> AiResult<PredictResponse> {
        let body = self.post(capability, model, "predict", request).await?;
        serde_json::from_str(&body).map_err(|e| {
            AiServiceError::new(capability, format!("Failed to parse response: {}", e))
        })
    }

    #[cfg(not(feature = "ai-providers"))]
    async fn predict(
        &self,
        capability: AiCapability,
        _model: &str,
        _request: &PredictRequest,
    ) -> AiResult<PredictResponse> {
        Err(feature_disabled(capability))
    }

    /// Loads an image reference as `(mime, base64)` ready for an inline part.
    async fn inline_image(
        &self,
        capability: AiCapability,
        source: &str,
    ) -> AiResult<(String, String)> {
        let (mime_type, payload) = if data_uri::is_data_uri(source) {
            let (mime_type, payload) = data_uri::split(source)
                .map_err(|e| AiServiceError::new(capability, format!("Invalid image: {}", e)))?;
            (mime_type.to_string(), payload.to_string())
        } else {
            let bytes = self
                .fetcher
                .fetch(source)
                .await
                .map_err(|e| AiServiceError::new(capability, e.to_string()))?;
            (
                data_uri::image_mime_for_path(source).to_string(),
                base64::engine::general_purpose::STANDARD.encode(bytes),
            )
        };

        if !EDITABLE_IMAGE_MIMES.contains(&mime_type.as_str()) {
            return Err(AiServiceError::new(
                capability,
                format!("Unsupported image type for editing: {}", mime_type),
            ));
        }
        Ok((mime_type, payload))
    }

    async fn edit_image(
        &self,
        capability: AiCapability,
        source: &str,
        instruction: &str,
    ) -> AiResult<String> {
        let (mime_type, data) = self.inline_image(capability, source).await?;
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline(mime_type, data),
                Part::text(instruction),
            ])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
                ..Default::default()
            }),
        };

        let response = self
            .generate_content(capability, &self.edit_model, &request)
            .await?;
        let image = first_inline_data(&response, "image/")
            .ok_or_else(|| AiServiceError::new(capability, "No image returned by Gemini"))?;
        Ok(format!("data:{};base64,{}", image.mime_type, image.data))
    }

    async fn generate_text(
        &self,
        capability: AiCapability,
        system: &str,
        prompt: String,
        response_mime_type: Option<&str>,
    ) -> AiResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(system)],
            }),
            generation_config: response_mime_type.map(|mime| GenerationConfig {
                response_mime_type: Some(mime.to_string()),
                ..Default::default()
            }),
        };

        let response = self
            .generate_content(capability, &self.text_model, &request)
            .await?;
        let text = first_text(&response);
        if text.trim().is_empty() {
            return Err(AiServiceError::new(capability, "Empty response from Gemini"));
        }
        Ok(text)
    }
}

#[cfg(not(feature = "ai-providers"))]
fn feature_disabled(capability: AiCapability) -> AiServiceError {
    AiServiceError::new(
        capability,
        "AI providers feature not enabled. Build with --features ai-providers",
    )
}

#[async_trait]
impl AiCapabilities for GeminiCapabilities {
    async fn generate_image(&self, prompt: &str) -> AiResult<String> {
        let capability = AiCapability::ImageGeneration;
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                output_mime_type: "image/png".to_string(),
            },
        };

        let response = self.predict(capability, &self.image_model, &request).await?;
        let prediction = response
            .predictions
            .unwrap_or_default()
            .into_iter()
            .find(|p| p.bytes_base64_encoded.is_some())
            .ok_or_else(|| AiServiceError::new(capability, "No image returned by Imagen"))?;
        let mime_type = prediction
            .mime_type
            .unwrap_or_else(|| "image/png".to_string());
        Ok(format!(
            "data:{};base64,{}",
            mime_type,
            prediction.bytes_base64_encoded.unwrap_or_default()
        ))
    }

    async fn split_long_prompt_into_scenes(&self, prompt: &str) -> AiResult<Vec<String>> {
        let capability = AiCapability::SceneSplitting;
        let text = self
            .generate_text(
                capability,
                SPLIT_SYSTEM,
                format!(
                    "Based on the system instruction, split the following scene description into a JSON array of strings: \"{}\"",
                    prompt
                ),
                Some("application/json"),
            )
            .await?;
        let scenes = parse_scene_prompts(&text).map_err(|e| AiServiceError::new(capability, e))?;
        if scenes.is_empty() {
            return Err(AiServiceError::new(capability, "Gemini returned no scenes"));
        }
        Ok(scenes)
    }

    async fn remove_background(&self, image: &str) -> AiResult<String> {
        self.edit_image(AiCapability::BackgroundRemoval, image, BACKGROUND_REMOVAL_PROMPT)
            .await
    }

    async fn relight(&self, image: &str) -> AiResult<String> {
        self.edit_image(AiCapability::Relighting, image, RELIGHT_PROMPT)
            .await
    }

    async fn enhance_quality(&self, image: &str) -> AiResult<String> {
        self.edit_image(AiCapability::QualityEnhancement, image, ENHANCE_PROMPT)
            .await
    }

    async fn generate_captions(&self, prompt: &str) -> AiResult<String> {
        let text = self
            .generate_text(
                AiCapability::Captioning,
                CAPTION_SYSTEM,
                format!(
                    "Generate concise and engaging captions for a video scene described as: \"{}\". The captions should be suitable for a short video clip. Provide only the caption text.",
                    prompt
                ),
                None,
            )
            .await?;
        Ok(text.trim().to_string())
    }

    async fn generate_speech_audio(&self, text: &str) -> AiResult<String> {
        let capability = AiCapability::SpeechSynthesis;
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(text)])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                }),
                ..Default::default()
            }),
        };

        let response = self
            .generate_content(capability, &self.tts_model, &request)
            .await?;
        let audio = first_inline_data(&response, "audio/")
            .ok_or_else(|| AiServiceError::new(capability, "No audio returned by Gemini"))?;
        let pcm = base64::engine::general_purpose::STANDARD
            .decode(audio.data.trim())
            .map_err(|e| AiServiceError::new(capability, format!("Invalid audio payload: {}", e)))?;
        let rate = parse_pcm_rate(&audio.mime_type).unwrap_or(DEFAULT_PCM_RATE);
        let wav = pcm_to_wav(&pcm, rate).map_err(|e| AiServiceError::new(capability, e))?;
        Ok(data_uri::encode("audio/wav", &wav))
    }
}

// =============================================================================
// Response helpers
// =============================================================================

/// Strips a surrounding markdown code fence, if any.
pub fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match JSON_FENCE_RE.captures(trimmed).and_then(|c| c.get(2)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Parses a scene list: a JSON array of strings, or an object wrapping one.
pub fn parse_scene_prompts(text: &str) -> Result<Vec<String>, String> {
    let value: serde_json::Value = serde_json::from_str(strip_json_fence(text))
        .map_err(|e| format!("Response is not valid JSON: {}", e))?;

    let array = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) if map.len() == 1 => {
            match map.into_iter().next().map(|(_, v)| v) {
                Some(serde_json::Value::Array(items)) => items,
                _ => return Err("Expected a JSON array of scene prompts".to_string()),
            }
        }
        _ => return Err("Expected a JSON array of scene prompts".to_string()),
    };

    array
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(s) => Ok(s.trim().to_string()),
            other => Err(format!("Scene prompt is not a string: {}", other)),
        })
        .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
        .collect()
}

/// Reads `rate=N` from a PCM mime type such as `audio/L16;codec=pcm;rate=24000`.
pub fn parse_pcm_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .filter(|rate| *rate > 0)
}

/// Wraps mono signed 16-bit little-endian PCM in a WAV container.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, String> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| format!("Failed to start WAV stream: {}", e))?;
        for frame in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([frame[0], frame[1]]))
                .map_err(|e| format!("Failed to write WAV sample: {}", e))?;
        }
        writer
            .finalize()
            .map_err(|e| format!("Failed to finish WAV stream: {}", e))?;
    }
    Ok(cursor.into_inner())
}

fn first_inline_data<'a>(
    response: &'a GenerateContentResponse,
    mime_prefix: &str,
) -> Option<&'a InlineData> {
    response
        .candidates
        .iter()
        .flatten()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| d.mime_type.starts_with(mime_prefix) && !d.data.is_empty())
}

fn first_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .iter()
        .flatten()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

// =============================================================================
// API Types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(mime_type: String, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData { mime_type, data }),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    output_mime_type: String,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[allow(dead_code)]
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    status: Option<String>,
}
