// src/lib.rs

pub mod cli;
pub mod collab;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod extract;
pub mod logging;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, ExecArgs, InstallArgs, ParseArgs, PullSecretArgs};
use crate::collab::{PullSecretProvider, RedHatSso};
use crate::config::{load_and_validate, load_raw_or_default, parse_duration};
use crate::engine::{InstallReport, Orchestrator};
use crate::errors::ProvisionError;
use crate::exec::{CommandOutput, ExecutionRequest, ProcessRunner, TracingSink};
use crate::extract::{Extractor, Strictness};

/// High-level entry point used by `main.rs`.
///
/// Everything machine-readable goes to stdout as JSON; logs go to stderr.
pub async fn run(args: CliArgs) -> Result<()> {
    match &args.command {
        Command::Install(install) => run_install(&args.config, install).await,
        Command::Exec(exec) => run_exec(&args.config, exec).await,
        Command::Parse(parse) => run_parse(&args.config, parse),
        Command::PullSecret(pull) => run_pull_secret(&args.config, pull).await,
    }
}

async fn run_install(config_path: &Path, args: &InstallArgs) -> Result<()> {
    let cfg = load_and_validate(config_path, &args.overrides())
        .with_context(|| format!("loading {}", config_path.display()))?;
    let cluster = cfg.cluster.name.clone();
    let orchestrator = Orchestrator::from_config(cfg)?;

    if args.dry_run {
        let prepared = orchestrator.prepare_only().await?;
        print_json(&prepared)?;
        debug!("dry-run complete (installer not executed)");
        return Ok(());
    }

    let result = orchestrator.install().await;
    let report = InstallReport::new(&cluster, &result);
    print_json(&report)?;

    match result {
        Ok(_) => Ok(()),
        Err(failure) => Err(failure.into()),
    }
}

async fn run_exec(config_path: &Path, args: &ExecArgs) -> Result<()> {
    let raw = load_raw_or_default(config_path)?;
    let runner = ProcessRunner::new()
        .with_sink(Arc::new(TracingSink::new(args.binary.clone())))
        .with_capture_limit(raw.installer.max_capture_bytes);

    let mut request = ExecutionRequest::new(&args.binary).args(&args.args);
    if let Some(dir) = &args.dir {
        request = request.working_dir(dir);
    }
    if let Some(timeout) = &args.timeout {
        let timeout = parse_duration(timeout).map_err(|e| anyhow!("--timeout: {e}"))?;
        request = request.timeout(timeout);
    }

    match runner.run(&request).await {
        Ok(result) => {
            print_json(&CommandOutput::from(&result))?;
            if !result.success() {
                bail!("'{}' exited with code {}", args.binary, result.exit_code);
            }
            Ok(())
        }
        Err(err @ ProvisionError::Timeout { .. }) => {
            if let Some(partial) = err.captured() {
                print_json(&CommandOutput::from(partial))?;
            }
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn run_parse(config_path: &Path, args: &ParseArgs) -> Result<()> {
    let raw = load_raw_or_default(config_path)?;
    let text = std::fs::read_to_string(&args.log_file)
        .with_context(|| format!("reading {}", args.log_file.display()))?;

    let strictness = Strictness::from_flag(args.strict, &raw.extract.required);
    let info = Extractor::installer()?.extract(&text, &strictness)?;
    info!(missing = ?info.missing(), "log parsed");
    print_json(&info)
}

async fn run_pull_secret(config_path: &Path, args: &PullSecretArgs) -> Result<()> {
    let raw = load_raw_or_default(config_path)?;
    let provider = RedHatSso::new(&raw.pull_secret);
    let secret = provider.fetch_pull_secret(&args.offline_token).await?;
    println!("{secret}");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
