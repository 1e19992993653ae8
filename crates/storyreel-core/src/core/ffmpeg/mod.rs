//! FFmpeg Integration Module
//!
//! Locates an FFmpeg binary and runs it as a child process, streaming its
//! log lines back to the caller. The storyboard exporter drives it through
//! the `TranscodeEngine` abstraction in `render`.

mod detection;
mod runner;

pub use detection::*;
pub use runner::*;

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Install FFmpeg or set STORYREEL_FFMPEG_PATH.")]
    NotFound,

    #[error("FFmpeg engine not loaded")]
    NotLoaded,

    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;
