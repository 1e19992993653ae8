//! FFmpeg Detection Module
//!
//! Resolves the ffmpeg binary from an explicit path, common install
//! locations or the system PATH.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::{FFmpegError, FFmpegResult};

/// Information about a detected FFmpeg installation
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    pub ffmpeg_path: PathBuf,
    /// Version string from `ffmpeg -version`
    pub version: String,
}

#[cfg(target_os = "windows")]
const FFMPEG_BINARY: &str = "ffmpeg.exe";

#[cfg(not(target_os = "windows"))]
const FFMPEG_BINARY: &str = "ffmpeg";

/// Detects FFmpeg, preferring `explicit` when given.
///
/// An explicit path that does not exist is an error rather than a silent
/// fallback to the system binary.
pub fn detect_ffmpeg(explicit: Option<&Path>) -> FFmpegResult<FFmpegInfo> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(FFmpegError::InvalidInput(format!(
                "configured FFmpeg binary does not exist: {}",
                path.display()
            )));
        }
        let version = get_ffmpeg_version(path)?;
        info!("Using configured FFmpeg {} at {:?}", version, path);
        return Ok(FFmpegInfo {
            ffmpeg_path: path.to_path_buf(),
            version,
        });
    }
    detect_system_ffmpeg()
}

/// Detects FFmpeg from common install locations and the system PATH.
pub fn detect_system_ffmpeg() -> FFmpegResult<FFmpegInfo> {
    let ffmpeg_path = which_ffmpeg()?;
    let version = get_ffmpeg_version(&ffmpeg_path)?;
    info!("Detected system FFmpeg {} at {:?}", version, ffmpeg_path);
    Ok(FFmpegInfo {
        ffmpeg_path,
        version,
    })
}

fn which_ffmpeg() -> FFmpegResult<PathBuf> {
    for dir in get_common_ffmpeg_paths() {
        let candidate = dir.join(FFMPEG_BINARY);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    #[cfg(target_os = "windows")]
    let lookup = "where";

    #[cfg(not(target_os = "windows"))]
    let lookup = "which";

    let output = Command::new(lookup)
        .arg("ffmpeg")
        .output()
        .map_err(|_| FFmpegError::NotFound)?;
    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(first) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
            debug!("Found ffmpeg via {}: {}", lookup, first);
            return Ok(PathBuf::from(first));
        }
    }

    Err(FFmpegError::NotFound)
}

fn get_common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));
        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }
        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            paths.push(PathBuf::from(userprofile).join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/opt/local/bin"));
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

fn get_ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let output = Command::new(ffmpeg_path)
        .arg("-version")
        .output()
        .map_err(FFmpegError::ProcessError)?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(
            "Failed to get FFmpeg version".to_string(),
        ));
    }

    parse_version_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the first line of `ffmpeg -version` ("ffmpeg version X ...").
fn parse_version_output(output: &str) -> FFmpegResult<String> {
    let first_line = output
        .lines()
        .next()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| FFmpegError::ParseError("Could not parse FFmpeg version".to_string()))?;

    Ok(first_line
        .strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(first_line)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_output() {
        let out = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023\nbuilt with gcc";
        assert_eq!(parse_version_output(out).unwrap(), "6.1.1-3ubuntu5");
        assert_eq!(parse_version_output("custom build\n").unwrap(), "custom build");
        assert!(parse_version_output("").is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-ffmpeg");
        assert!(matches!(
            detect_ffmpeg(Some(&missing)),
            Err(FFmpegError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_detect_system_ffmpeg() {
        // Not a hard failure when FFmpeg isn't installed
        match detect_system_ffmpeg() {
            Ok(info) => assert!(!info.version.is_empty()),
            Err(FFmpegError::NotFound) => {}
            Err(e) => println!("FFmpeg detection failed: {e}"),
        }
    }
}
