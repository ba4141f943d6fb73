// src/exec/capture.rs

//! Per-stream output accumulation.
//!
//! A [`Capture`] stores raw bytes exactly as read (line terminators
//! included), so the captured length always equals what the child wrote.
//! With a limit set it keeps only the most recent output, dropping whole
//! chunks from the front.

use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct Capture {
    chunks: VecDeque<Vec<u8>>,
    len: usize,
    limit: Option<usize>,
    dropped: usize,
}

impl Capture {
    /// Unbounded capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most roughly `limit` bytes of the most recent output.
    ///
    /// The newest chunk is always retained, even if it alone exceeds the
    /// limit.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.len += chunk.len();
        self.chunks.push_back(chunk);

        if let Some(limit) = self.limit {
            while self.len > limit && self.chunks.len() > 1 {
                if let Some(old) = self.chunks.pop_front() {
                    self.len -= old.len();
                    self.dropped += old.len();
                }
            }
        }
    }

    /// Bytes currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes discarded because of the limit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn truncated(&self) -> bool {
        self.dropped > 0
    }

    /// Decode the captured bytes, replacing invalid UTF-8.
    pub fn to_text(&self) -> String {
        let mut bytes = Vec::with_capacity(self.len);
        for chunk in &self.chunks {
            bytes.extend_from_slice(chunk);
        }
        match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}
