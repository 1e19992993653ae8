//! StoryReel Core Library
//!
//! Storyboard-to-video engine: media assets and an ordered storyboard,
//! AI-derived image variants with optimistic toggling, and an FFmpeg export
//! job that composites the storyboard into a single MP4.
//!
//! Callers own a [`core::project::StudioState`] (usually shared through
//! [`core::project::SharedStudioState`]) and pass it explicitly to the
//! orchestrator, the scene generator and the exporter.

pub mod core;

use std::path::PathBuf;

use crate::core::project::{load_project, save_project, shared, SharedStudioState};
use crate::core::CoreResult;

/// Project file opened from disk
pub struct ActiveProject {
    /// Project file path
    pub path: PathBuf,
    /// Studio state (in-memory)
    pub state: SharedStudioState,
}

impl ActiveProject {
    /// Opens a project file, starting empty when it does not exist yet.
    pub fn open(path: PathBuf) -> CoreResult<Self> {
        let state = load_project(&path)?;
        Ok(Self {
            path,
            state: shared(state),
        })
    }

    /// Writes the current studio state back to the project file.
    pub async fn save(&self) -> CoreResult<()> {
        let state = self.state.read().await;
        save_project(&self.path, &state)
    }
}
