//! Progress/Error Reporting Channel
//!
//! Long-running operations report through a `ProgressSink`. The contract is
//! single-slot: each message replaces the previous one, a terminal failure
//! carries one user-presentable message, and the busy indicator is cleared
//! exactly once when the operation ends.

use std::sync::{Arc, LazyLock, Mutex};

use regex::Regex;
use tokio::sync::mpsc;

use crate::core::TimeSec;

/// Event delivered to a progress sink
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Replaces the current progress message and marks the sink busy
    Message(String),
    /// Non-fatal problem; never counts as the terminal error
    Warning(String),
    /// Terminal, user-presentable error
    Failed(String),
    /// Clears the busy indicator
    Idle,
}

/// Receiver for progress and error reporting
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);

    fn report(&self, message: &str) {
        self.emit(ProgressEvent::Message(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.emit(ProgressEvent::Warning(message.to_string()));
    }

    fn fail(&self, message: &str) {
        self.emit(ProgressEvent::Failed(message.to_string()));
    }

    fn clear(&self) {
        self.emit(ProgressEvent::Idle);
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn emit(&self, event: ProgressEvent) {
        (**self).emit(event)
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

// =============================================================================
// LatestProgress
// =============================================================================

/// Current contents of a `LatestProgress` sink
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressSlot {
    /// `Some` while busy
    pub message: Option<String>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

/// Thread-safe single-slot sink, the shape a UI binds to
#[derive(Debug, Default)]
pub struct LatestProgress {
    slot: Mutex<ProgressSlot>,
}

impl LatestProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressSlot {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_busy(&self) -> bool {
        self.snapshot().message.is_some()
    }

    /// Takes the pending error, leaving the slot empty.
    pub fn take_error(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).error.take()
    }
}

impl ProgressSink for LatestProgress {
    fn emit(&self, event: ProgressEvent) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match event {
            ProgressEvent::Message(message) => slot.message = Some(message),
            ProgressEvent::Warning(warning) => slot.warnings.push(warning),
            ProgressEvent::Failed(error) => slot.error = Some(error),
            ProgressEvent::Idle => slot.message = None,
        }
    }
}

// =============================================================================
// ChannelProgressSink
// =============================================================================

/// Forwards every event over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        // receiver gone means nobody is listening
        let _ = self.tx.send(event);
    }
}

// =============================================================================
// FFmpeg log parsing
// =============================================================================

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=\s*(-?\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid regex")
});

/// Extracts the elapsed output time from an FFmpeg stats line.
pub fn parse_elapsed_time(line: &str) -> Option<TimeSec> {
    let caps = TIME_RE.captures(line)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    if hours < 0.0 {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Formats the encoding progress message for an elapsed time.
pub fn encoding_message(elapsed: TimeSec, total: TimeSec) -> String {
    if total > 0.0 {
        let percent = (elapsed / total * 100.0).clamp(0.0, 100.0);
        format!("Encoding video: {elapsed:.1}s of {total:.1}s ({percent:.0}%)")
    } else {
        format!("Encoding video: {elapsed:.1}s")
    }
}
