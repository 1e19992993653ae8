//! Filesystem utilities.
//!
//! Crash-tolerant writes for the project file and settings, plus the name
//! check applied to every file staged into an engine working directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{CoreError, CoreResult};

/// Validates a bare file name used inside an engine working directory.
///
/// Rejects empty names, path separators, traversal sequences and control
/// characters so staged files can never escape the directory.
pub fn validate_staged_file_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("file name is empty".to_string());
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') || name.contains(':') {
        return Err(format!("invalid file name '{name}': path components are not allowed"));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(format!("invalid file name '{name}': contains control characters"));
    }
    Ok(())
}

fn sibling_path(path: &Path, suffix: &str) -> CoreResult<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CoreError::Internal(format!("invalid target path: {}", path.display())))?;
    Ok(path.with_file_name(format!("{file_name}.{suffix}")))
}

/// Writes `bytes` to `path` atomically.
///
/// Data goes to a temp sibling first, is synced, then renamed over the
/// target. An existing target is moved to `<name>.bak` for the duration of
/// the swap and restored if the rename fails.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = sibling_path(path, &format!("tmp-{}", ulid::Ulid::new()))?;
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    // Windows refuses to rename over an existing file.
    let backup_path = sibling_path(path, "bak")?;
    let had_existing = path.exists();
    if had_existing {
        let _ = std::fs::remove_file(&backup_path);
        if let Err(e) = std::fs::rename(path, &backup_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        if had_existing {
            let _ = std::fs::rename(&backup_path, path);
        }
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    if had_existing {
        let _ = std::fs::remove_file(&backup_path);
    }
    Ok(())
}

/// Serializes `value` as pretty JSON and writes it atomically.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let json = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &json)
}
