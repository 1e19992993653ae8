//! StoryReel Core Type Definitions
//!
//! Fundamental aliases and small value types shared by every module.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Media asset unique identifier (ULID)
pub type AssetId = String;

/// Storyboard entry unique identifier (ULID)
pub type ItemId = String;

/// Text overlay unique identifier (ULID)
pub type OverlayId = String;

/// Generates a fresh ULID string.
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Default scene length for newly added storyboard entries
pub const DEFAULT_SCENE_DURATION: TimeSec = 5.0;

// =============================================================================
// Geometry
// =============================================================================

/// Position expressed in percent of the frame (0.0 - 100.0 on each axis)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentPosition {
    pub x: f64,
    pub y: f64,
}

impl PercentPosition {
    /// Creates a position, clamping both axes into the frame.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    pub fn center() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

impl Default for PercentPosition {
    fn default() -> Self {
        Self::center()
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        50.0
    }
}

/// Output frame size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: u32,
    pub height: u32,
}

impl Size2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_ulid() {
        let id = new_id();
        assert_eq!(id.len(), 26);
        assert!(ulid::Ulid::from_string(&id).is_ok());
        assert_ne!(id, new_id());
    }

    #[test]
    fn test_percent_position_clamps() {
        let pos = PercentPosition::new(-10.0, 140.0);
        assert_eq!(pos, PercentPosition { x: 0.0, y: 100.0 });

        let pos = PercentPosition::new(f64::NAN, 25.0);
        assert_eq!(pos.x, 50.0);
        assert_eq!(pos.y, 25.0);
    }
}
