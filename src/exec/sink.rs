// src/exec/sink.rs

//! Real-time line forwarding for running processes.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

/// Which output channel a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Receives each line as soon as it is read from the child.
///
/// Called concurrently from the stdout and stderr drains. Lines of one
/// stream arrive in emission order; there is no ordering between streams.
pub trait LineSink: Send + Sync {
    fn line(&self, stream: Stream, line: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LineSink for NullSink {
    fn line(&self, _stream: Stream, _line: &str) {}
}

/// Forwards lines to `tracing`: stdout at `info`, stderr at `debug`.
#[derive(Debug, Clone)]
pub struct TracingSink {
    label: String,
}

impl TracingSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl LineSink for TracingSink {
    fn line(&self, stream: Stream, line: &str) {
        match stream {
            Stream::Stdout => info!(process = %self.label, "stdout: {}", line),
            Stream::Stderr => debug!(process = %self.label, "stderr: {}", line),
        }
    }
}

/// Records every line it sees; handy for callers that want the
/// interleaving as observed.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<(Stream, String)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Stream, String)> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn lines_of(&self, stream: Stream) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, l)| l)
            .collect()
    }
}

impl LineSink for RecordingSink {
    fn line(&self, stream: Stream, line: &str) {
        let mut guard = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((stream, line.to_string()));
    }
}
