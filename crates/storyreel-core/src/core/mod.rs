//! StoryReel Core Module
//!
//! Contains the studio data model, the AI feature orchestration layer and
//! the storyboard export pipeline.

pub mod ai;
pub mod assets;
pub mod ffmpeg;
pub mod fs;
pub mod project;
pub mod render;
pub mod settings;
pub mod storyboard;

mod types;
pub use types::*;

mod error;
pub use error::*;
