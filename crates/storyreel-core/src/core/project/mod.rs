//! Studio project state
//!
//! The explicit state container holding the media bin and the storyboard,
//! its JSON persistence, and topic summarization.

mod state;
mod topic;

pub use state::*;
pub use topic::*;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::core::{fs::atomic_write_json_pretty, CoreError, CoreResult};

/// Studio state shared between the orchestrator, generators and callers
pub type SharedStudioState = Arc<RwLock<StudioState>>;

pub fn shared(state: StudioState) -> SharedStudioState {
    Arc::new(RwLock::new(state))
}

/// Loads a project file. A missing file yields an empty studio.
pub fn load_project(path: &Path) -> CoreResult<StudioState> {
    if !path.exists() {
        info!("Project file not found at {:?}, starting empty", path);
        return Ok(StudioState::default());
    }

    let text = std::fs::read_to_string(path)?;
    let mut state: StudioState = serde_json::from_str(&text)
        .map_err(|e| CoreError::ProjectCorrupted(format!("{}: {e}", path.display())))?;
    state
        .storyboard
        .validate_durations()
        .map_err(|e| CoreError::ProjectCorrupted(format!("{}: {e}", path.display())))?;
    state.reset_in_flight();
    info!(
        "Loaded project from {:?} ({} assets, {} scenes)",
        path,
        state.assets.len(),
        state.storyboard.len()
    );
    Ok(state)
}

/// Writes the project file atomically.
pub fn save_project(path: &Path, state: &StudioState) -> CoreResult<()> {
    atomic_write_json_pretty(path, state)?;
    info!("Saved project to {:?}", path);
    Ok(())
}
