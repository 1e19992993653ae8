//! Export encoding settings.

use serde::{Deserialize, Serialize};

use crate::core::Size2D;

/// x264 presets accepted by `normalize`
const X264_PRESETS: [&str; 9] = [
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

const PIXEL_FORMATS: [&str; 3] = ["yuv420p", "yuv422p", "yuv444p"];

const SAMPLE_RATES: [u32; 3] = [22050, 44100, 48000];

/// Encoding parameters for a storyboard export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    pub fps: u32,
    pub video_codec: String,
    /// x264 speed preset
    pub preset: String,
    pub pixel_format: String,
    pub audio_codec: String,
    /// Audio bitrate (e.g., "192k")
    pub audio_bitrate: String,
    /// Audio sample rate in Hz; all scenes are normalized to stereo at this rate
    pub sample_rate: u32,
    /// Output file name inside the engine working directory
    pub output_file: String,
    /// Suggested file name for the exported video
    pub download_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 25,
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            sample_rate: 44100,
            output_file: "output.mp4".to_string(),
            download_name: "ai_video_export.mp4".to_string(),
        }
    }
}

impl ExportSettings {
    pub fn canvas(&self) -> Size2D {
        Size2D::new(self.width, self.height)
    }

    /// Resets invalid values to defaults or clamps them into range.
    pub fn normalize(&mut self) {
        let defaults = Self::default();

        // yuv420p needs even dimensions
        self.width = even_clamp(self.width, 16, 7680);
        self.height = even_clamp(self.height, 16, 4320);
        self.fps = self.fps.clamp(1, 120);

        if self.video_codec.trim().is_empty() {
            self.video_codec = defaults.video_codec.clone();
        }
        normalize_enum(&mut self.preset, &X264_PRESETS, &defaults.preset);
        normalize_enum(&mut self.pixel_format, &PIXEL_FORMATS, &defaults.pixel_format);
        if self.audio_codec.trim().is_empty() {
            self.audio_codec = defaults.audio_codec.clone();
        }
        if !is_valid_bitrate(&self.audio_bitrate) {
            self.audio_bitrate = defaults.audio_bitrate.clone();
        }
        if !SAMPLE_RATES.contains(&self.sample_rate) {
            self.sample_rate = defaults.sample_rate;
        }
        if !is_valid_output_name(&self.output_file) {
            self.output_file = defaults.output_file.clone();
        }
        if self.download_name.trim().is_empty() {
            self.download_name = defaults.download_name;
        }
    }
}

fn even_clamp(value: u32, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(min, max);
    clamped - clamped % 2
}

fn normalize_enum(value: &mut String, allowed: &[&str], default: &str) {
    let lowered = value.trim().to_ascii_lowercase();
    if allowed.contains(&lowered.as_str()) {
        *value = lowered;
    } else {
        *value = default.to_string();
    }
}

fn is_valid_bitrate(value: &str) -> bool {
    let digits = value.strip_suffix(&['k', 'K', 'm', 'M'][..]).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_valid_output_name(name: &str) -> bool {
    name.ends_with(".mp4") && crate::core::fs::validate_staged_file_name(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = ExportSettings::default();
        assert_eq!(s.canvas(), Size2D::new(1280, 720));
        assert_eq!(s.fps, 25);
        assert_eq!(s.preset, "ultrafast");
        assert_eq!(s.audio_bitrate, "192k");
        assert_eq!(s.output_file, "output.mp4");
        assert_eq!(s.download_name, "ai_video_export.mp4");
    }

    #[test]
    fn test_normalize_repairs_invalid_values() {
        let mut s = ExportSettings {
            width: 1281,
            height: 2,
            fps: 0,
            preset: "Ludicrous".into(),
            pixel_format: "YUV444P".into(),
            audio_bitrate: "loud".into(),
            sample_rate: 12345,
            output_file: "../out.mp4".into(),
            ..ExportSettings::default()
        };
        s.normalize();
        assert_eq!(s.width, 1280);
        assert_eq!(s.height, 16);
        assert_eq!(s.fps, 1);
        assert_eq!(s.preset, "ultrafast");
        assert_eq!(s.pixel_format, "yuv444p");
        assert_eq!(s.audio_bitrate, "192k");
        assert_eq!(s.sample_rate, 44100);
        assert_eq!(s.output_file, "output.mp4");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s: ExportSettings = serde_json::from_str(r#"{"fps": 30}"#).unwrap();
        assert_eq!(s.fps, 30);
        assert_eq!(s.width, 1280);
    }
}
