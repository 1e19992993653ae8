//! Render Module
//!
//! Storyboard export: variant resolution, scene planning, filter graph
//! generation, the transcoding engine abstraction and the export job.

mod engine;
mod export;
mod ffmpeg_engine;
mod graph;
mod progress;
mod settings;
mod source;
mod variants;

pub use engine::*;
pub use export::*;
pub use ffmpeg_engine::*;
pub use graph::*;
pub use progress::*;
pub use settings::*;
pub use source::*;
pub use variants::*;
