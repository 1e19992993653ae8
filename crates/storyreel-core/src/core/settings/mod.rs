//! Settings Persistence
//!
//! `settings.json` with per-section defaults, a `normalize()` pass that
//! repairs invalid values instead of failing, atomic writes and environment
//! overrides.
//!
//! Storage location: {config_dir}/storyreel/settings.json

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::fs::atomic_write_json_pretty;
use crate::core::render::ExportSettings;
use crate::core::{CoreError, CoreResult};

/// Settings schema version
pub const SETTINGS_VERSION: u32 = 1;

pub const SETTINGS_FILE: &str = "settings.json";

/// Overrides the FFmpeg binary path
pub const ENV_FFMPEG_PATH: &str = "STORYREEL_FFMPEG_PATH";

/// Supplies the Gemini API key
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Studio settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudioSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub export: ExportSettings,

    #[serde(default)]
    pub ffmpeg: FFmpegSettings,

    #[serde(default)]
    pub ai: AiSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            export: ExportSettings::default(),
            ffmpeg: FFmpegSettings::default(),
            ai: AiSettings::default(),
        }
    }
}

impl StudioSettings {
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;
        self.export.normalize();
        self.ffmpeg.normalize();
        self.ai.normalize();
    }

    /// Applies `STORYREEL_FFMPEG_PATH` and `GEMINI_API_KEY` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_FFMPEG_PATH).filter(|v| !v.trim().is_empty()) {
            self.ffmpeg.binary_path = Some(path.trim().to_string());
        }
        if let Some(key) = lookup(ENV_GEMINI_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.ai.api_key = Some(key.trim().to_string());
        }
    }
}

/// FFmpeg settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FFmpegSettings {
    /// Explicit ffmpeg binary; auto-detected when unset
    pub binary_path: Option<String>,
}

impl FFmpegSettings {
    pub fn normalize(&mut self) {
        if self.binary_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            self.binary_path = None;
        }
    }

    pub fn binary(&self) -> Option<PathBuf> {
        self.binary_path.as_deref().map(PathBuf::from)
    }
}

/// AI provider settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    /// Text and JSON generation
    pub text_model: String,
    /// Imagen model for scene images
    pub image_model: String,
    /// Image-in/image-out edits (background, relight, enhance)
    pub edit_model: String,
    pub tts_model: String,
    /// Prebuilt TTS voice name
    pub voice: String,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            edit_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            timeout_secs: 120,
        }
    }
}

impl AiSettings {
    pub fn normalize(&mut self) {
        let defaults = Self::default();
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.api_key = None;
        }
        let base = self.base_url.trim().trim_end_matches('/');
        if base.starts_with("https://") || base.starts_with("http://") {
            self.base_url = base.to_string();
        } else {
            self.base_url = defaults.base_url;
        }
        for (value, default) in [
            (&mut self.text_model, defaults.text_model),
            (&mut self.image_model, defaults.image_model),
            (&mut self.edit_model, defaults.edit_model),
            (&mut self.tts_model, defaults.tts_model),
            (&mut self.voice, defaults.voice),
        ] {
            if value.trim().is_empty() {
                *value = default;
            }
        }
        self.timeout_secs = self.timeout_secs.clamp(5, 600);
    }
}

/// Loads and saves `StudioSettings`
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Manager for an explicit settings file
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Manager for the platform config directory
    pub fn default_location() -> CoreResult<Self> {
        let dir = dirs::config_dir().ok_or_else(|| {
            CoreError::Internal("Could not determine the platform config directory".to_string())
        })?;
        Ok(Self::new(dir.join("storyreel").join(SETTINGS_FILE)))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Loads settings, falling back to defaults when the file is missing or unreadable.
    pub fn load(&self) -> StudioSettings {
        let mut settings = match self.read() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!("Settings file not found, using defaults");
                StudioSettings::default()
            }
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                StudioSettings::default()
            }
        };
        settings.normalize();
        settings
    }

    fn read(&self) -> CoreResult<Option<StudioSettings>> {
        if !self.settings_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.settings_path)?;
        let settings = serde_json::from_str::<StudioSettings>(&content)?;
        Ok(Some(settings))
    }

    /// Normalizes and writes settings atomically, returning what was stored.
    pub fn save(&self, settings: &StudioSettings) -> CoreResult<StudioSettings> {
        let mut normalized = settings.clone();
        normalized.normalize();
        atomic_write_json_pretty(&self.settings_path, &normalized)
            .map_err(|e| CoreError::SettingsSaveFailed(e.to_string()))?;
        info!("Settings saved to {:?}", self.settings_path);
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = StudioSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.ai.voice, "Kore");
        assert_eq!(settings.ai.image_model, "imagen-3.0-generate-002");
        assert!(settings.ffmpeg.binary_path.is_none());
    }

    #[test]
    fn test_partial_file_loads_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"export": {"fps": 30}, "ai": {"voice": ""}}"#).unwrap();

        let settings = SettingsManager::new(path).load();
        assert_eq!(settings.export.fps, 30);
        assert_eq!(settings.export.width, 1280);
        assert_eq!(settings.ai.voice, "Kore");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{{{").unwrap();
        assert_eq!(SettingsManager::new(path).load(), StudioSettings::default());
    }

    #[test]
    fn test_save_normalizes_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SettingsManager::new(dir.path().join("nested").join(SETTINGS_FILE));

        let mut settings = StudioSettings::default();
        settings.ai.timeout_secs = 1;
        settings.ai.base_url = "ftp://nope/".into();
        settings.ffmpeg.binary_path = Some("  ".into());

        let saved = manager.save(&settings).unwrap();
        assert_eq!(saved.ai.timeout_secs, 5);
        assert_eq!(saved.ai.base_url, AiSettings::default().base_url);
        assert!(saved.ffmpeg.binary_path.is_none());
        assert_eq!(manager.load(), saved);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = StudioSettings::default();
        settings.apply_overrides_from(|key| match key {
            ENV_FFMPEG_PATH => Some("/opt/ffmpeg/bin/ffmpeg".to_string()),
            ENV_GEMINI_API_KEY => Some(" key-123 ".to_string()),
            _ => None,
        });
        assert_eq!(
            settings.ffmpeg.binary(),
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(settings.ai.api_key.as_deref(), Some("key-123"));

        let mut untouched = StudioSettings::default();
        untouched.apply_overrides_from(|_| Some("   ".to_string()));
        assert_eq!(untouched, StudioSettings::default());
    }
}
