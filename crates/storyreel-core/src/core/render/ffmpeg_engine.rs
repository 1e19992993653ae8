//! Process-backed `TranscodeEngine`.
//!
//! Stages files into a private temp directory and runs the system ffmpeg
//! inside it, so the bare names used by the filter graph resolve locally.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{EngineLog, TranscodeEngine};
use crate::core::ffmpeg::{detect_ffmpeg, FFmpegError, FFmpegResult, FFmpegRunner};
use crate::core::fs::validate_staged_file_name;

/// FFmpeg engine working in an exclusively owned directory
#[derive(Debug, Default)]
pub struct FFmpegEngine {
    /// Binary to use instead of auto-detection
    explicit_path: Option<PathBuf>,
    runner: Option<FFmpegRunner>,
    work_dir: Option<PathBuf>,
}

impl FFmpegEngine {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self {
            explicit_path,
            runner: None,
            work_dir: None,
        }
    }

    pub fn work_dir(&self) -> Option<&PathBuf> {
        self.work_dir.as_ref()
    }

    fn file_path(&self, name: &str) -> FFmpegResult<PathBuf> {
        validate_staged_file_name(name).map_err(FFmpegError::InvalidInput)?;
        let dir = self.work_dir.as_ref().ok_or(FFmpegError::NotLoaded)?;
        Ok(dir.join(name))
    }
}

#[async_trait]
impl TranscodeEngine for FFmpegEngine {
    async fn load(&mut self) -> FFmpegResult<()> {
        if self.runner.is_some() {
            return Ok(());
        }

        let explicit = self.explicit_path.clone();
        let info = tokio::task::spawn_blocking(move || detect_ffmpeg(explicit.as_deref()))
            .await
            .map_err(|e| FFmpegError::ExecutionFailed(format!("detection task failed: {e}")))??;

        let dir = std::env::temp_dir().join(format!("storyreel-{}", ulid::Ulid::new()));
        tokio::fs::create_dir_all(&dir).await?;
        info!("FFmpeg {} ready, working in {:?}", info.version, dir);

        self.runner = Some(FFmpegRunner::new(info));
        self.work_dir = Some(dir);
        Ok(())
    }

    async fn write_file(&mut self, name: &str, bytes: &[u8]) -> FFmpegResult<()> {
        let path = self.file_path(name)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn exec(&mut self, args: &[String], on_log: EngineLog<'_>) -> FFmpegResult<i32> {
        let runner = self.runner.as_ref().ok_or(FFmpegError::NotLoaded)?;
        let dir = self.work_dir.as_ref().ok_or(FFmpegError::NotLoaded)?;
        let code = runner.run_in(dir, args, on_log).await?;
        debug!("ffmpeg exited with code {}", code);
        Ok(code)
    }

    async fn read_file(&mut self, name: &str) -> FFmpegResult<Vec<u8>> {
        let path = self.file_path(name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| FFmpegError::OutputError(format!("{}: {e}", path.display())))
    }

    async fn delete_file(&mut self, name: &str) -> FFmpegResult<()> {
        let path = self.file_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for FFmpegEngine {
    fn drop(&mut self) {
        if let Some(dir) = self.work_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("Failed to remove engine working directory {:?}: {}", dir, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_ops_require_load() {
        let mut engine = FFmpegEngine::new(None);
        assert!(engine.work_dir().is_none());
        assert!(matches!(
            engine.write_file("img0.png", b"x").await,
            Err(FFmpegError::NotLoaded)
        ));
        assert!(matches!(
            engine.exec(&[], &|_| {}).await,
            Err(FFmpegError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_load_with_missing_binary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = FFmpegEngine::new(Some(dir.path().join("nope")));
        assert!(engine.load().await.is_err());
        assert!(engine.work_dir().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = FFmpegEngine::new(None);
        engine.work_dir = Some(dir.path().to_path_buf());
        assert!(matches!(
            engine.write_file("../evil.png", b"x").await,
            Err(FFmpegError::InvalidInput(_))
        ));
        engine.write_file("img0.png", b"x").await.unwrap();
        assert!(dir.path().join("img0.png").exists());
    }

    #[tokio::test]
    async fn test_real_ffmpeg_round_trip() {
        // Skipped when FFmpeg isn't installed
        let mut engine = FFmpegEngine::new(None);
        if engine.load().await.is_err() {
            return;
        }
        engine.write_file("note.txt", b"hello").await.unwrap();
        assert_eq!(engine.read_file("note.txt").await.unwrap(), b"hello");
        engine.delete_file("note.txt").await.unwrap();
        engine.delete_file("note.txt").await.unwrap();

        let code = engine
            .exec(&["-hide_banner".to_string(), "-version".to_string()], &|_| {})
            .await
            .unwrap();
        assert_eq!(code, 0);

        let dir = engine.work_dir().cloned().unwrap();
        drop(engine);
        assert!(!dir.exists());
    }
}
