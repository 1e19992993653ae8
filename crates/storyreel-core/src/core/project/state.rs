//! Studio state container.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::assets::MediaAsset;
use crate::core::storyboard::{Storyboard, StoryboardItem, TextOverlay};
use crate::core::{AssetId, CoreError, CoreResult, ItemId, OverlayId, TimeSec};

/// Owned copy of the data an export works on
#[derive(Clone, Debug, Default)]
pub struct ExportSnapshot {
    pub storyboard: Vec<StoryboardItem>,
    pub assets: Vec<MediaAsset>,
}

/// Media bin plus storyboard
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioState {
    /// Newest first
    pub assets: Vec<MediaAsset>,
    pub storyboard: Storyboard,
}

impl StudioState {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Media bin
    // =========================================================================

    /// Adds an asset to the front of the bin.
    pub fn add_asset(&mut self, asset: MediaAsset) -> AssetId {
        let id = asset.id.clone();
        debug!("Adding asset {} ({})", id, asset.display_name());
        self.assets.insert(0, asset);
        id
    }

    /// Adds a batch of assets to the front of the bin, keeping batch order.
    pub fn add_assets(&mut self, assets: Vec<MediaAsset>) -> Vec<AssetId> {
        let ids = assets.iter().map(|a| a.id.clone()).collect();
        self.assets.splice(0..0, assets);
        ids
    }

    pub fn asset(&self, asset_id: &str) -> Option<&MediaAsset> {
        self.assets.iter().find(|a| a.id == asset_id)
    }

    pub fn asset_mut(&mut self, asset_id: &str) -> Option<&mut MediaAsset> {
        self.assets.iter_mut().find(|a| a.id == asset_id)
    }

    /// Deletes an asset. Fails while any storyboard entry references it.
    pub fn delete_asset(&mut self, asset_id: &str) -> CoreResult<MediaAsset> {
        if self.storyboard.references_asset(asset_id) {
            return Err(CoreError::AssetInUse(asset_id.to_string()));
        }
        let index = self
            .assets
            .iter()
            .position(|a| a.id == asset_id)
            .ok_or_else(|| CoreError::AssetNotFound(asset_id.to_string()))?;
        Ok(self.assets.remove(index))
    }

    // =========================================================================
    // Storyboard
    // =========================================================================

    /// Appends a scene for `asset_id` with default settings.
    pub fn add_to_storyboard(&mut self, asset_id: &str) -> CoreResult<ItemId> {
        if self.asset(asset_id).is_none() {
            return Err(CoreError::AssetNotFound(asset_id.to_string()));
        }
        let item = StoryboardItem::new(asset_id);
        let id = item.id.clone();
        self.storyboard.push(item);
        Ok(id)
    }

    pub fn remove_from_storyboard(&mut self, item_id: &str) -> CoreResult<StoryboardItem> {
        self.storyboard.remove(item_id)
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> CoreResult<()> {
        self.storyboard.move_item(from, to)
    }

    pub fn set_duration(&mut self, item_id: &str, seconds: TimeSec) -> CoreResult<()> {
        self.storyboard.set_duration(item_id, seconds)
    }

    pub fn set_filter(&mut self, item_id: &str, filter: Option<String>) -> CoreResult<()> {
        let filter = filter.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
        self.storyboard.require_mut(item_id)?.filter_expression = filter;
        Ok(())
    }

    pub fn set_audio_source(&mut self, item_id: &str, audio: Option<String>) -> CoreResult<()> {
        self.storyboard.require_mut(item_id)?.audio_source = audio;
        Ok(())
    }

    pub fn add_text_overlay(&mut self, item_id: &str, overlay: TextOverlay) -> CoreResult<OverlayId> {
        let id = overlay.id.clone();
        self.storyboard.require_mut(item_id)?.text_overlays.push(overlay);
        Ok(id)
    }

    /// Replaces an existing overlay with the same id.
    pub fn update_text_overlay(&mut self, item_id: &str, overlay: TextOverlay) -> CoreResult<()> {
        let item = self.storyboard.require_mut(item_id)?;
        let slot = item
            .text_overlays
            .iter_mut()
            .find(|o| o.id == overlay.id)
            .ok_or_else(|| CoreError::ValidationError(format!("Text overlay not found: {}", overlay.id)))?;
        *slot = overlay;
        Ok(())
    }

    pub fn remove_text_overlay(&mut self, item_id: &str, overlay_id: &str) -> CoreResult<()> {
        let item = self.storyboard.require_mut(item_id)?;
        let before = item.text_overlays.len();
        item.text_overlays.retain(|o| o.id != overlay_id);
        if item.text_overlays.len() == before {
            return Err(CoreError::ValidationError(format!(
                "Text overlay not found: {overlay_id}"
            )));
        }
        Ok(())
    }

    /// Clears in-flight markers left over from an interrupted session.
    pub fn reset_in_flight(&mut self) {
        for item in self.storyboard.items_mut() {
            let features = &mut item.ai_features;
            features.is_background_removing = false;
            features.is_relighting = false;
            features.is_enhancing_quality = false;
            features.is_generating_tts = false;
        }
    }

    /// Owned copy for an export job.
    pub fn snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            storyboard: self.storyboard.items().to_vec(),
            assets: self.assets.clone(),
        }
    }

    pub fn current_topic(&self) -> String {
        super::summarize_topic(self.storyboard.items(), &self.assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn studio_with_asset() -> (StudioState, AssetId) {
        let mut state = StudioState::new();
        let id = state.add_asset(MediaAsset::uploaded("data:image/png;base64,AA==", "a.png", vec![]));
        (state, id)
    }

    #[test]
    fn test_assets_are_prepended() {
        let (mut state, first) = studio_with_asset();
        let second = state.add_asset(MediaAsset::uploaded("b.png", "b.png", vec![]));
        assert_eq!(state.assets[0].id, second);
        assert_eq!(state.assets[1].id, first);

        let batch = vec![
            MediaAsset::generated("x", "one", 0, 2),
            MediaAsset::generated("y", "two", 1, 2),
        ];
        let ids = state.add_assets(batch);
        assert_eq!(state.assets[0].id, ids[0]);
        assert_eq!(state.assets[1].id, ids[1]);
        assert_eq!(state.assets[2].id, second);
    }

    #[test]
    fn test_delete_asset_in_use_fails() {
        let (mut state, asset_id) = studio_with_asset();
        let item_id = state.add_to_storyboard(&asset_id).unwrap();

        assert!(matches!(
            state.delete_asset(&asset_id),
            Err(CoreError::AssetInUse(_))
        ));

        state.remove_from_storyboard(&item_id).unwrap();
        assert!(state.asset(&asset_id).is_some());
        state.delete_asset(&asset_id).unwrap();
        assert!(state.asset(&asset_id).is_none());
    }

    #[test]
    fn test_add_to_storyboard_requires_asset() {
        let mut state = StudioState::new();
        assert!(matches!(
            state.add_to_storyboard("missing"),
            Err(CoreError::AssetNotFound(_))
        ));
    }

    #[test]
    fn test_overlay_lifecycle() {
        let (mut state, asset_id) = studio_with_asset();
        let item_id = state.add_to_storyboard(&asset_id).unwrap();

        let overlay_id = state.add_text_overlay(&item_id, TextOverlay::new("Hi")).unwrap();
        let mut edited = state.storyboard.get(&item_id).unwrap().text_overlays[0].clone();
        edited.text = "Hello".into();
        state.update_text_overlay(&item_id, edited).unwrap();
        assert_eq!(state.storyboard.get(&item_id).unwrap().text_overlays[0].text, "Hello");

        state.remove_text_overlay(&item_id, &overlay_id).unwrap();
        assert!(state.remove_text_overlay(&item_id, &overlay_id).is_err());
    }

    #[test]
    fn test_set_filter_normalizes_blank() {
        let (mut state, asset_id) = studio_with_asset();
        let item_id = state.add_to_storyboard(&asset_id).unwrap();
        state.set_filter(&item_id, Some("grayscale(100%)".into())).unwrap();
        assert_eq!(
            state.storyboard.get(&item_id).unwrap().filter_expression.as_deref(),
            Some("grayscale(100%)")
        );
        state.set_filter(&item_id, Some("  ".into())).unwrap();
        assert!(state.storyboard.get(&item_id).unwrap().filter_expression.is_none());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (mut state, asset_id) = studio_with_asset();
        let item_id = state.add_to_storyboard(&asset_id).unwrap();
        let snapshot = state.snapshot();
        state.set_duration(&item_id, 9.0).unwrap();
        assert_eq!(snapshot.storyboard[0].duration_seconds, 5.0);
        assert_eq!(snapshot.assets.len(), 1);
    }
}
