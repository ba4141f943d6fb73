// src/types.rs

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which captured output the extractor scans.
///
/// - `Stdout`: standard output only (default). The installer's narrative
///   log must be routed to stdout for this to find anything.
/// - `Combined`: stdout followed by stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputSource {
    #[default]
    Stdout,
    Combined,
}

impl FromStr for OutputSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(OutputSource::Stdout),
            "combined" => Ok(OutputSource::Combined),
            other => Err(format!(
                "invalid scan source: {other} (expected \"stdout\" or \"combined\")"
            )),
        }
    }
}

/// Installer `--log-level` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerLogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl InstallerLogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallerLogLevel::Debug => "debug",
            InstallerLogLevel::Info => "info",
            InstallerLogLevel::Warn => "warn",
            InstallerLogLevel::Error => "error",
        }
    }
}
