//! FFmpeg process runner.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tracing::debug;

use super::{FFmpegError, FFmpegInfo, FFmpegResult};

/// Runs the detected ffmpeg binary
#[derive(Debug, Clone)]
pub struct FFmpegRunner {
    info: FFmpegInfo,
}

impl FFmpegRunner {
    pub fn new(info: FFmpegInfo) -> Self {
        Self { info }
    }

    pub fn info(&self) -> &FFmpegInfo {
        &self.info
    }

    /// Runs ffmpeg with `args` inside `work_dir` and returns its exit code.
    ///
    /// Every stderr line is handed to `on_line`. FFmpeg separates progress
    /// updates with `\r`, so both `\r` and `\n` end a line.
    pub async fn run_in(
        &self,
        work_dir: &Path,
        args: &[String],
        on_line: &(dyn Fn(&str) + Send + Sync),
    ) -> FFmpegResult<i32> {
        if !work_dir.is_dir() {
            return Err(FFmpegError::InvalidInput(format!(
                "working directory does not exist: {}",
                work_dir.display()
            )));
        }

        let mut cmd = tokio::process::Command::new(&self.info.ffmpeg_path);
        cmd.args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        debug!("Spawning {:?} in {:?}", self.info.ffmpeg_path, work_dir);
        let mut child = cmd.spawn().map_err(FFmpegError::ProcessError)?;

        if let Some(mut stderr) = child.stderr.take() {
            let mut splitter = LineSplitter::default();
            let mut buf = [0u8; 4096];
            loop {
                let read = stderr.read(&mut buf).await.map_err(FFmpegError::ProcessError)?;
                if read == 0 {
                    break;
                }
                splitter.push(&buf[..read], on_line);
            }
            splitter.finish(on_line);
        }

        let status = child.wait().await.map_err(FFmpegError::ProcessError)?;
        // Terminated by signal on unix
        Ok(status.code().unwrap_or(-1))
    }
}

/// Splits a byte stream into lines on `\r` or `\n`, skipping empty lines.
#[derive(Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn push(&mut self, chunk: &[u8], on_line: &(dyn Fn(&str) + Send + Sync)) {
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                self.flush(on_line);
            } else {
                self.pending.push(byte);
            }
        }
    }

    fn finish(&mut self, on_line: &(dyn Fn(&str) + Send + Sync)) {
        self.flush(on_line);
    }

    fn flush(&mut self, on_line: &(dyn Fn(&str) + Send + Sync)) {
        if self.pending.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            on_line(trimmed);
        }
    }
}
