//! Transcoding engine abstraction.
//!
//! The export job talks to FFmpeg through a small file-plus-exec interface:
//! files are staged by bare name into the engine's working area, a command
//! runs against them, and the output is read back by name.

use async_trait::async_trait;

use crate::core::ffmpeg::FFmpegResult;

/// Callback receiving engine log lines as they are produced
pub type EngineLog<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Engine able to stage files and run FFmpeg-style argument lists
#[async_trait]
pub trait TranscodeEngine: Send {
    /// Prepares the engine. Called once per instance; later exports reuse it.
    async fn load(&mut self) -> FFmpegResult<()>;

    /// Writes a file into the working area under a bare name.
    async fn write_file(&mut self, name: &str, bytes: &[u8]) -> FFmpegResult<()>;

    /// Runs the engine with `args`; returns the process exit code.
    async fn exec(&mut self, args: &[String], on_log: EngineLog<'_>) -> FFmpegResult<i32>;

    async fn read_file(&mut self, name: &str) -> FFmpegResult<Vec<u8>>;

    async fn delete_file(&mut self, name: &str) -> FFmpegResult<()>;
}
