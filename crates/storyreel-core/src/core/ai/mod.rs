//! AI Module
//!
//! The capability interface the studio calls for image generation, image
//! edits, captions and speech; the Gemini provider behind it; and the
//! orchestration that applies results to studio state with optimistic
//! updates and rollback.

mod capabilities;
pub mod gemini;
mod generation;
mod orchestrator;

#[cfg(test)]
pub(crate) mod mock;

pub use capabilities::*;
pub use gemini::GeminiCapabilities;
pub use generation::*;
pub use orchestrator::*;
