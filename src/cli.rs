// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{ConfigOverrides, DEFAULT_CONFIG_FILE};
use crate::types::OutputSource;

/// Command-line arguments for `ocp-provision`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ocp-provision",
    version,
    about = "Drive openshift-install to completion and report the cluster's endpoints and credentials.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Provision.toml` in the current working directory. A missing
    /// file means "all defaults".
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `OCP_PROVISION_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate, prepare, run the installer and report the result as JSON.
    Install(InstallArgs),

    /// Run an arbitrary binary through the process runner.
    Exec(ExecArgs),

    /// Extract installation fields from a saved installer log.
    Parse(ParseArgs),

    /// Exchange an offline token for a pull secret.
    PullSecret(PullSecretArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InstallArgs {
    /// Overrides `[cluster].name`.
    #[arg(long, value_name = "NAME")]
    pub cluster_name: Option<String>,

    /// Overrides `[cluster].region`.
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Which captured output the extractor scans.
    #[arg(long, value_enum, value_name = "SOURCE")]
    pub scan: Option<OutputSource>,

    /// Stop after the install config is rendered.
    #[arg(long)]
    pub dry_run: bool,
}

impl InstallArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            cluster_name: self.cluster_name.clone(),
            region: self.region.clone(),
            scan: self.scan,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ExecArgs {
    /// Binary to run (looked up on `PATH`).
    pub binary: String,

    /// Arguments passed verbatim.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Working directory of the child.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Deadline such as `30s` or `5m`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ParseArgs {
    /// Installer log to scan.
    pub log_file: PathBuf,

    /// Fail unless every `[extract].required` field is found.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PullSecretArgs {
    #[arg(long, env = "RH_OFFLINE_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub offline_token: String,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
