//! Storyboard entry types.

use serde::{Deserialize, Serialize};

use crate::core::assets::VariantKind;
use crate::core::{new_id, AssetId, ItemId, OverlayId, PercentPosition, TimeSec, DEFAULT_SCENE_DURATION};

/// Caption drawn over a scene in the preview (not burned into exports)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub id: OverlayId,
    pub text: String,
    pub font_size: u32,
    pub color: String,
    pub position: PercentPosition,
    pub font_family: String,
}

impl TextOverlay {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            font_size: 24,
            color: "#FFFFFF".to_string(),
            position: PercentPosition::center(),
            font_family: "Arial".to_string(),
        }
    }
}

/// Per-scene AI feature flags, in-flight markers and text results
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiFeatureState {
    pub background_removed: bool,
    pub relit: bool,
    pub enhanced_quality: bool,
    /// Accepted and stored, has no effect on output
    pub flicker_removed: bool,

    pub is_background_removing: bool,
    pub is_relighting: bool,
    pub is_enhancing_quality: bool,
    pub is_generating_tts: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_captions_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_to_speech_text: Option<String>,
}

impl AiFeatureState {
    pub fn flag(&self, kind: VariantKind) -> bool {
        match kind {
            VariantKind::BackgroundRemoved => self.background_removed,
            VariantKind::Relit => self.relit,
            VariantKind::EnhancedQuality => self.enhanced_quality,
        }
    }

    pub fn set_flag(&mut self, kind: VariantKind, value: bool) {
        match kind {
            VariantKind::BackgroundRemoved => self.background_removed = value,
            VariantKind::Relit => self.relit = value,
            VariantKind::EnhancedQuality => self.enhanced_quality = value,
        }
    }

    pub fn in_flight(&self, kind: VariantKind) -> bool {
        match kind {
            VariantKind::BackgroundRemoved => self.is_background_removing,
            VariantKind::Relit => self.is_relighting,
            VariantKind::EnhancedQuality => self.is_enhancing_quality,
        }
    }

    pub fn set_in_flight(&mut self, kind: VariantKind, value: bool) {
        match kind {
            VariantKind::BackgroundRemoved => self.is_background_removing = value,
            VariantKind::Relit => self.is_relighting = value,
            VariantKind::EnhancedQuality => self.is_enhancing_quality = value,
        }
    }

    /// True while any AI request for this scene is outstanding.
    pub fn any_in_flight(&self) -> bool {
        self.is_background_removing
            || self.is_relighting
            || self.is_enhancing_quality
            || self.is_generating_tts
    }
}

/// One scene on the storyboard
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardItem {
    pub id: ItemId,
    pub asset_id: AssetId,
    pub duration_seconds: TimeSec,
    #[serde(default)]
    pub text_overlays: Vec<TextOverlay>,
    /// CSS filter string applied in the preview only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    /// Speech track reference (data URI, URL or path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_source: Option<String>,
    #[serde(default)]
    pub ai_features: AiFeatureState,
}

impl StoryboardItem {
    pub fn new(asset_id: impl Into<AssetId>) -> Self {
        Self {
            id: new_id(),
            asset_id: asset_id.into(),
            duration_seconds: DEFAULT_SCENE_DURATION,
            text_overlays: Vec::new(),
            filter_expression: None,
            audio_source: None,
            ai_features: AiFeatureState::default(),
        }
    }

    /// Text to speak for this scene: the first non-empty overlay, else the
    /// auto captions.
    pub fn speech_text(&self) -> Option<String> {
        self.text_overlays
            .iter()
            .map(|o| o.text.trim())
            .find(|t| !t.is_empty())
            .or_else(|| {
                self.ai_features
                    .auto_captions_text
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
            })
            .map(str::to_string)
    }
}
