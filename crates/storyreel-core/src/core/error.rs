//! StoryReel Error Definitions
//!
//! Errors raised by studio state mutations and the supporting services.

use thiserror::Error;

use super::{AssetId, ItemId};
use crate::core::ai::AiServiceError;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Asset Errors
    // =========================================================================
    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("Asset in use: {0}")]
    AssetInUse(AssetId),

    #[error("Unsupported media source: {0}")]
    UnsupportedSource(String),

    // =========================================================================
    // Storyboard Errors
    // =========================================================================
    #[error("Storyboard item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(f64),

    #[error("Invalid storyboard index {index} (storyboard has {len} entries)")]
    InvalidIndex { index: usize, len: usize },

    // =========================================================================
    // Validation
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Project / Settings Errors
    // =========================================================================
    #[error("Project file corrupted: {0}")]
    ProjectCorrupted(String),

    #[error("Failed to save settings: {0}")]
    SettingsSaveFailed(String),

    // =========================================================================
    // AI Errors
    // =========================================================================
    #[error(transparent)]
    AiService(#[from] AiServiceError),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_user_presentable() {
        let err = CoreError::AssetInUse("01ABC".to_string());
        assert_eq!(err.to_string(), "Asset in use: 01ABC");

        let err = CoreError::InvalidIndex { index: 7, len: 3 };
        assert_eq!(
            err.to_string(),
            "Invalid storyboard index 7 (storyboard has 3 entries)"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::IoError(_)));
    }
}
