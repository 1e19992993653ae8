//! AI Feature Orchestrator
//!
//! Applies per-scene AI feature toggles to the studio state. Image variants
//! use an optimistic update: the flag and its in-flight marker are set
//! first, the capability is called without holding the state lock, and the
//! result either commits the variant into the asset cache or rolls the flag
//! back.
//!
//! Enabling enhanced quality never invalidates relit or background-removed
//! variants computed from the unenhanced image.
//!
//! A second request for a variant that is still in flight on the same scene
//! is refused with `FeatureOutcome::AlreadyInFlight` and leaves state
//! untouched, instead of racing the first request with last-write-wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::{AiCapabilities, AiServiceError};
use crate::core::assets::VariantKind;
use crate::core::project::SharedStudioState;
use crate::core::render::{resolve_image_source, ProgressSink};
use crate::core::{CoreError, CoreResult, ItemId};

/// Requested change to one scene feature
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureSetting {
    BackgroundRemoved(bool),
    Relit(bool),
    EnhancedQuality(bool),
    FlickerRemoved(bool),
    AutoCaptionsText(Option<String>),
    TextToSpeechText(Option<String>),
}

impl FeatureSetting {
    pub fn key(&self) -> FeatureKey {
        match self {
            FeatureSetting::BackgroundRemoved(_) => FeatureKey::Variant(VariantKind::BackgroundRemoved),
            FeatureSetting::Relit(_) => FeatureKey::Variant(VariantKind::Relit),
            FeatureSetting::EnhancedQuality(_) => FeatureKey::Variant(VariantKind::EnhancedQuality),
            FeatureSetting::FlickerRemoved(_) => FeatureKey::FlickerRemoved,
            FeatureSetting::AutoCaptionsText(_) => FeatureKey::AutoCaptions,
            FeatureSetting::TextToSpeechText(_) => FeatureKey::Speech,
        }
    }
}

/// Feature identity used for transition tracking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    Variant(VariantKind),
    FlickerRemoved,
    AutoCaptions,
    Speech,
}

/// Lifecycle of one (scene, feature) change
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransitionState {
    #[default]
    Idle,
    Pending,
    Committed,
    RolledBack,
}

impl TransitionState {
    pub fn can_advance_to(self, next: TransitionState) -> bool {
        match next {
            TransitionState::Pending => true,
            TransitionState::Committed | TransitionState::RolledBack => {
                self == TransitionState::Pending
            }
            TransitionState::Idle => false,
        }
    }
}

/// Result of a feature change
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureOutcome {
    /// Value written straight through (text features, flicker, disable)
    Applied,
    /// AI result committed; `cached` when the variant already existed
    Committed { cached: bool },
    /// The capability failed and the optimistic update was reverted
    RolledBack(AiServiceError),
    /// A request for this scene and feature is already outstanding
    AlreadyInFlight,
}

/// Applies AI features to studio state
pub struct FeatureOrchestrator {
    state: SharedStudioState,
    ai: Arc<dyn AiCapabilities>,
    sink: Arc<dyn ProgressSink>,
    transitions: Mutex<HashMap<(ItemId, FeatureKey), TransitionState>>,
}

impl FeatureOrchestrator {
    pub fn new(
        state: SharedStudioState,
        ai: Arc<dyn AiCapabilities>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            state,
            ai,
            sink,
            transitions: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self) -> &SharedStudioState {
        &self.state
    }

    /// Latest recorded transition for a scene feature
    pub fn transition(&self, item_id: &str, key: FeatureKey) -> TransitionState {
        self.transitions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(item_id.to_string(), key))
            .copied()
            .unwrap_or_default()
    }

    fn record(&self, item_id: &str, key: FeatureKey, next: TransitionState) {
        let mut transitions = self.transitions.lock().unwrap_or_else(|e| e.into_inner());
        let entry = transitions.entry((item_id.to_string(), key)).or_default();
        if !entry.can_advance_to(next) {
            // last write wins; a newer request already moved this pair on
            debug!("{:?} for {} went {:?} -> {:?}", key, item_id, *entry, next);
        }
        *entry = next;
    }

    /// Applies `setting` to the scene `item_id`.
    pub async fn set_feature(&self, item_id: &str, setting: FeatureSetting) -> CoreResult<FeatureOutcome> {
        let key = setting.key();
        match setting {
            FeatureSetting::BackgroundRemoved(enabled) => {
                self.set_variant(item_id, VariantKind::BackgroundRemoved, enabled).await
            }
            FeatureSetting::Relit(enabled) => self.set_variant(item_id, VariantKind::Relit, enabled).await,
            FeatureSetting::EnhancedQuality(enabled) => {
                self.set_variant(item_id, VariantKind::EnhancedQuality, enabled).await
            }
            FeatureSetting::FlickerRemoved(enabled) => {
                self.write_through(item_id, key, |f| f.flicker_removed = enabled)
                    .await
            }
            FeatureSetting::AutoCaptionsText(text) => {
                self.write_through(item_id, key, |f| f.auto_captions_text = text)
                    .await
            }
            FeatureSetting::TextToSpeechText(text) => {
                self.write_through(item_id, key, |f| f.text_to_speech_text = text)
                    .await
            }
        }
    }

    async fn write_through(
        &self,
        item_id: &str,
        key: FeatureKey,
        apply: impl FnOnce(&mut crate::core::storyboard::AiFeatureState),
    ) -> CoreResult<FeatureOutcome> {
        let mut state = self.state.write().await;
        let item = state.storyboard.require_mut(item_id)?;
        apply(&mut item.ai_features);
        self.record(item_id, key, TransitionState::Pending);
        self.record(item_id, key, TransitionState::Committed);
        Ok(FeatureOutcome::Applied)
    }

    async fn set_variant(&self, item_id: &str, kind: VariantKind, enabled: bool) -> CoreResult<FeatureOutcome> {
        let key = FeatureKey::Variant(kind);

        if !enabled {
            let mut state = self.state.write().await;
            let item = state.storyboard.require_mut(item_id)?;
            item.ai_features.set_flag(kind, false);
            item.ai_features.set_in_flight(kind, false);
            self.record(item_id, key, TransitionState::Pending);
            self.record(item_id, key, TransitionState::Committed);
            debug!("Disabled {} for {}", kind, item_id);
            return Ok(FeatureOutcome::Applied);
        }

        // Optimistic update under the lock; the AI call happens after it is released.
        let (asset_id, source) = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let item = state.storyboard.require_mut(item_id)?;
            let asset = state
                .assets
                .iter()
                .find(|a| a.id == item.asset_id)
                .ok_or_else(|| CoreError::AssetNotFound(item.asset_id.clone()))?;

            if item.ai_features.in_flight(kind) {
                return Ok(FeatureOutcome::AlreadyInFlight);
            }

            item.ai_features.set_flag(kind, true);
            self.record(item_id, key, TransitionState::Pending);

            if asset.has_variant(kind) {
                item.ai_features.set_in_flight(kind, false);
                self.record(item_id, key, TransitionState::Committed);
                debug!("Using cached {} variant for {}", kind, item_id);
                return Ok(FeatureOutcome::Committed { cached: true });
            }

            item.ai_features.set_in_flight(kind, true);
            let source = match kind {
                VariantKind::Relit => resolve_image_source(item, asset).to_string(),
                VariantKind::BackgroundRemoved | VariantKind::EnhancedQuality => {
                    asset.base_source.clone()
                }
            };
            (asset.id.clone(), source)
        };

        info!("Requesting {} for scene {}", kind, item_id);
        let result = match kind {
            VariantKind::BackgroundRemoved => self.ai.remove_background(&source).await,
            VariantKind::Relit => self.ai.relight(&source).await,
            VariantKind::EnhancedQuality => self.ai.enhance_quality(&source).await,
        };

        let mut state = self.state.write().await;
        match result {
            Ok(variant) => {
                match state.asset_mut(&asset_id) {
                    Some(asset) => {
                        asset.cache_variant(kind, variant);
                    }
                    None => warn!("Asset {} was deleted before {} finished", asset_id, kind),
                }
                if let Some(item) = state.storyboard.get_mut(item_id) {
                    item.ai_features.set_in_flight(kind, false);
                }
                self.record(item_id, key, TransitionState::Committed);
                Ok(FeatureOutcome::Committed { cached: false })
            }
            Err(err) => {
                if let Some(item) = state.storyboard.get_mut(item_id) {
                    item.ai_features.set_flag(kind, false);
                    item.ai_features.set_in_flight(kind, false);
                }
                self.record(item_id, key, TransitionState::RolledBack);
                warn!("{} for scene {} rolled back: {}", kind, item_id, err);
                self.sink.fail(&err.to_string());
                Ok(FeatureOutcome::RolledBack(err))
            }
        }
    }

    /// Generates captions from the scene asset's prompt.
    pub async fn generate_captions(&self, item_id: &str) -> CoreResult<FeatureOutcome> {
        let key = FeatureKey::AutoCaptions;
        let prompt = {
            let state = self.state.read().await;
            let item = state
                .storyboard
                .get(item_id)
                .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
            let asset = state
                .asset(&item.asset_id)
                .ok_or_else(|| CoreError::AssetNotFound(item.asset_id.clone()))?;
            asset.prompt.clone()
        };
        if prompt.trim().is_empty() {
            let err = CoreError::ValidationError("Scene has no prompt to caption".to_string());
            self.sink.fail(&err.to_string());
            return Err(err);
        }

        self.record(item_id, key, TransitionState::Pending);
        self.sink.report("Generating captions...");
        let result = self.ai.generate_captions(&prompt).await;

        let outcome = match result {
            Ok(text) => {
                let mut state = self.state.write().await;
                if let Some(item) = state.storyboard.get_mut(item_id) {
                    item.ai_features.auto_captions_text = Some(text);
                }
                self.record(item_id, key, TransitionState::Committed);
                FeatureOutcome::Committed { cached: false }
            }
            Err(err) => {
                self.record(item_id, key, TransitionState::RolledBack);
                self.sink.fail(&err.to_string());
                FeatureOutcome::RolledBack(err)
            }
        };
        self.sink.clear();
        Ok(outcome)
    }

    /// Speaks the scene's first non-empty overlay (or its captions) and
    /// attaches the audio to the scene.
    pub async fn generate_speech(&self, item_id: &str) -> CoreResult<FeatureOutcome> {
        let key = FeatureKey::Speech;
        let text = {
            let mut state = self.state.write().await;
            let item = state.storyboard.require_mut(item_id)?;
            if item.ai_features.is_generating_tts {
                return Ok(FeatureOutcome::AlreadyInFlight);
            }
            let Some(text) = item.speech_text() else {
                let err = CoreError::ValidationError(
                    "No text available in the selected scene for text-to-speech".to_string(),
                );
                self.sink.fail(&err.to_string());
                return Err(err);
            };
            item.ai_features.is_generating_tts = true;
            text
        };

        self.record(item_id, key, TransitionState::Pending);
        self.sink.report("Generating speech...");
        let result = self.ai.generate_speech_audio(&text).await;

        let mut state = self.state.write().await;
        let item = state.storyboard.get_mut(item_id);
        let outcome = match result {
            Ok(audio) => {
                if let Some(item) = item {
                    item.ai_features.is_generating_tts = false;
                    item.ai_features.text_to_speech_text = Some(text);
                    item.audio_source = Some(audio);
                }
                self.record(item_id, key, TransitionState::Committed);
                FeatureOutcome::Committed { cached: false }
            }
            Err(err) => {
                if let Some(item) = item {
                    item.ai_features.is_generating_tts = false;
                }
                self.record(item_id, key, TransitionState::RolledBack);
                self.sink.fail(&err.to_string());
                FeatureOutcome::RolledBack(err)
            }
        };
        drop(state);
        self.sink.clear();
        Ok(outcome)
    }
}
