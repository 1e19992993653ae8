//! Storyboard
//!
//! Ordered sequence of scenes. Moves are pure repositions (remove at the
//! source index, insert at the destination), never swaps.

mod models;
pub use models::*;

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, ItemId, TimeSec};

/// Scene durations must be positive and finite.
pub fn is_valid_duration(seconds: TimeSec) -> bool {
    seconds.is_finite() && seconds > 0.0
}

/// Ordered list of storyboard entries
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Storyboard {
    items: Vec<StoryboardItem>,
}

impl Storyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[StoryboardItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut StoryboardItem> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: StoryboardItem) {
        self.items.push(item);
    }

    pub fn get(&self, item_id: &str) -> Option<&StoryboardItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn get_mut(&mut self, item_id: &str) -> Option<&mut StoryboardItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    pub fn require_mut(&mut self, item_id: &str) -> CoreResult<&mut StoryboardItem> {
        self.get_mut(item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
    }

    pub fn position(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == item_id)
    }

    pub fn references_asset(&self, asset_id: &str) -> bool {
        self.items.iter().any(|i| i.asset_id == asset_id)
    }

    /// Removes an entry, returning it. The referenced asset is untouched.
    pub fn remove(&mut self, item_id: &str) -> CoreResult<StoryboardItem> {
        let index = self
            .position(item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Moves the entry at `from` so it ends up at index `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> CoreResult<()> {
        let len = self.items.len();
        if from >= len {
            return Err(CoreError::InvalidIndex { index: from, len });
        }
        if to >= len {
            return Err(CoreError::InvalidIndex { index: to, len });
        }
        if from == to {
            return Ok(());
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(())
    }

    pub fn set_duration(&mut self, item_id: &str, seconds: TimeSec) -> CoreResult<()> {
        if !is_valid_duration(seconds) {
            return Err(CoreError::InvalidDuration(seconds));
        }
        self.require_mut(item_id)?.duration_seconds = seconds;
        Ok(())
    }

    /// Fails with `InvalidDuration` on the first entry whose duration is not positive and finite.
    pub fn validate_durations(&self) -> CoreResult<()> {
        match self.items.iter().find(|i| !is_valid_duration(i.duration_seconds)) {
            Some(item) => Err(CoreError::InvalidDuration(item.duration_seconds)),
            None => Ok(()),
        }
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }
}
