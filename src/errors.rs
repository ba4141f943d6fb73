// src/errors.rs

//! Crate-wide error type.
//!
//! Every stage reports failures through [`ProvisionError`]. Variants that
//! come out of a process run carry the captured output so a failure can be
//! diagnosed without re-running the installer; their `Display` only ever
//! shows a bounded stderr tail.

use std::time::Duration;

use thiserror::Error;

use crate::engine::Stage;
use crate::exec::ExecutionResult;
use crate::extract::Field;

/// Lines of stderr kept in user-visible failure messages.
pub const STDERR_TAIL_LINES: usize = 20;
/// Upper bound (bytes) on the stderr tail in user-visible failure messages.
pub const STDERR_TAIL_BYTES: usize = 4096;

#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The binary could not be located or started.
    #[error("failed to start '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited nonzero.
    #[error(
        "'{binary}' exited with code {}: {}",
        .result.exit_code,
        stderr_tail(&.result.stderr)
    )]
    Execution {
        binary: String,
        result: Box<ExecutionResult>,
    },

    /// A required field was not found in the installer output.
    #[error("required field '{0}' not found in installer output")]
    Extraction(Field),

    /// Missing credential, region, secret or bad configuration value.
    #[error("Configuration error: {0}")]
    ConfigValidation(String),

    /// The deadline expired; the process group was killed.
    #[error(
        "'{binary}' timed out after {timeout:?}: {}",
        stderr_tail(&.partial.stderr)
    )]
    Timeout {
        binary: String,
        timeout: Duration,
        partial: Box<ExecutionResult>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProvisionError {
    /// Convenience constructor for [`ProvisionError::ConfigValidation`].
    pub fn config(msg: impl Into<String>) -> Self {
        ProvisionError::ConfigValidation(msg.into())
    }

    /// Captured output attached to this error, if the failure came out of a
    /// process run.
    pub fn captured(&self) -> Option<&ExecutionResult> {
        match self {
            ProvisionError::Execution { result, .. } => Some(result.as_ref()),
            ProvisionError::Timeout { partial, .. } => Some(partial.as_ref()),
            _ => None,
        }
    }

    /// Whether an outer caller may reasonably retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProvisionError::Execution { .. } | ProvisionError::Timeout { .. }
        )
    }
}

/// Return the last [`STDERR_TAIL_LINES`] lines of `text`, further capped to
/// the last [`STDERR_TAIL_BYTES`] bytes (cut on a char boundary).
pub fn stderr_tail(text: &str) -> String {
    tail(text, STDERR_TAIL_LINES, STDERR_TAIL_BYTES)
}

/// Bounded tail of `text`: at most `max_lines` trailing lines and at most
/// `max_bytes` trailing bytes.
pub fn tail(text: &str, max_lines: usize, max_bytes: usize) -> String {
    let trimmed = text.trim_end_matches(['\n', '\r']);
    let lines: Vec<&str> = trimmed.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    let joined = lines[start..].join("\n");

    if joined.len() <= max_bytes {
        return joined;
    }

    let mut cut = joined.len() - max_bytes;
    while !joined.is_char_boundary(cut) {
        cut += 1;
    }
    joined[cut..].to_string()
}

/// A [`ProvisionError`] tagged with the stage that produced it.
///
/// `captured` holds the installer output when the failure happened after a
/// completed run (strict extraction failures); for `Execution` and `Timeout`
/// the output travels inside the error itself.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: ProvisionError,
    pub captured: Option<Box<ExecutionResult>>,
}

impl StageFailure {
    pub fn new(stage: Stage, error: ProvisionError) -> Self {
        Self {
            stage,
            error,
            captured: None,
        }
    }

    pub fn with_captured(mut self, result: ExecutionResult) -> Self {
        self.captured = Some(Box::new(result));
        self
    }

    /// Output of the installer run, wherever it is attached.
    pub fn captured(&self) -> Option<&ExecutionResult> {
        self.captured.as_deref().or_else(|| self.error.captured())
    }
}

/// Tag a stage onto a [`Result`].
pub trait StageExt<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageFailure>;
}

impl<T> StageExt<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageFailure> {
        self.map_err(|error| StageFailure::new(stage, error))
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let text = (1..=30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let t = tail(&text, 3, 1024);
        assert_eq!(t, "line 28\nline 29\nline 30");
    }

    #[test]
    fn tail_respects_byte_cap_on_char_boundary() {
        let text = "ééééé";
        let t = tail(text, 10, 3);
        assert!(t.len() <= 3);
        assert!(t.chars().all(|c| c == 'é'));
    }

    #[test]
    fn execution_error_display_is_bounded() {
        let stderr = (0..10_000).map(|i| format!("noise {i}\n")).collect::<String>();
        let err = ProvisionError::Execution {
            binary: "openshift-install".into(),
            result: Box::new(ExecutionResult {
                exit_code: 3,
                stdout: String::new(),
                stderr,
                duration: Duration::from_secs(1),
                truncated: false,
            }),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("'openshift-install' exited with code 3"));
        assert!(msg.contains("noise 9999"));
        assert!(!msg.contains("noise 100\n"));
        assert!(msg.len() < STDERR_TAIL_BYTES + 200);
        assert!(err.is_retryable());
    }
}
