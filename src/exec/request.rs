// src/exec/request.rs

//! Input and output value types for a single process run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

/// Everything needed to launch one process.
///
/// The binary is invoked directly with `args` as its argument vector; no
/// shell is involved, so argument boundaries are exactly the vector's
/// elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    binary: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl ExecutionRequest {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            timeout: None,
        }
    }

    /// Conventional `<binary> <command> <subcommand> <args...>` shape.
    pub fn command(
        binary: impl Into<String>,
        command: impl Into<String>,
        subcommand: impl Into<String>,
    ) -> Self {
        Self::new(binary).arg(command).arg(subcommand)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Overlay one environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Deadline for the whole run; on expiry the process group is killed.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    pub fn dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn env_overlay(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Outcome of a completed run.
///
/// Only produced after the process has exited **and** both output streams
/// reached end-of-stream (or, on timeout, after the drains were stopped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Exit code as reported by the OS; `-1` when terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
    /// True when a capture limit dropped older output from either stream.
    pub truncated: bool,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, separated by a newline when needed.
    pub fn combined_output(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        out.push_str(&self.stdout);
        if !out.is_empty() && !out.ends_with('\n') && !self.stderr.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// `{exit_code, output, error}` view of a run, as printed by `exec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput<'a> {
    pub exit_code: i32,
    pub output: &'a str,
    pub error: &'a str,
    pub duration_ms: u64,
    pub truncated: bool,
}

impl<'a> From<&'a ExecutionResult> for CommandOutput<'a> {
    fn from(r: &'a ExecutionResult) -> Self {
        Self {
            exit_code: r.exit_code,
            output: &r.stdout,
            error: &r.stderr,
            duration_ms: u64::try_from(r.duration.as_millis()).unwrap_or(u64::MAX),
            truncated: r.truncated,
        }
    }
}

fn serialize_duration_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_argument_order() {
        let req = ExecutionRequest::command("openshift-install", "create", "cluster")
            .arg("--dir=/tmp/hub")
            .arg("--log-level=info");
        assert_eq!(req.binary(), "openshift-install");
        assert_eq!(
            req.arg_list(),
            ["create", "cluster", "--dir=/tmp/hub", "--log-level=info"]
        );
        assert!(req.dir().is_none());
        assert!(req.deadline().is_none());
    }

    #[test]
    fn combined_output_inserts_separator() {
        let r = ExecutionResult {
            exit_code: 0,
            stdout: "out".into(),
            stderr: "err\n".into(),
            duration: Duration::ZERO,
            truncated: false,
        };
        assert_eq!(r.combined_output(), "out\nerr\n");
    }
}
