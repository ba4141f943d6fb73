// src/engine/orchestrator.rs

//! The install pipeline: `Validate → Prepare → Execute → Extract → Finalize`.
//!
//! Each stage returns a [`ProvisionError`]; [`Orchestrator::install`] tags it
//! with the stage through [`StageExt::at`]. Nothing is retried here; a failure
//! is reported once, with whatever output the installer produced.
//!
//! The per-cluster lock is taken after validation and held until the outcome
//! is assembled, so two installs of the same cluster never share a working
//! directory.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collab::env::{
    AWS_ACCESS_KEY_ID, AWS_DEFAULT_REGION, AWS_SECRET_ACCESS_KEY, expand_home, require,
};
use crate::collab::{Collaborators, EnvSource, InstallParams, Secrets, zone_count};
use crate::config::ConfigFile;
use crate::engine::locks::ClusterLocks;
use crate::engine::stage::Stage;
use crate::errors::{ProvisionError, Result, StageExt, StageFailure};
use crate::exec::{
    ExecutionRequest, ExecutionResult, LineSink, NullSink, ProcessBackend, ProcessRunner,
    TracingSink,
};
use crate::extract::{Extractor, Strictness, StructuredInstallationInfo};
use crate::types::OutputSource;

/// Parent of the per-cluster working directories when none is configured.
pub const DEFAULT_CLUSTERS_DIR: &str = "~/clusters";

/// Prerequisites resolved by the Validate stage.
#[derive(Debug, Clone)]
pub struct Validated {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub pull_secret: String,
    pub ssh_pubkey: String,
    pub work_dir: PathBuf,
}

/// Result of the Prepare stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prepared {
    pub work_dir: PathBuf,
    pub config_path: PathBuf,
    pub worker_zones: Vec<String>,
    pub master_zones: Vec<String>,
}

/// Successful end of the pipeline.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub cluster: String,
    pub info: StructuredInstallationInfo,
    pub execution: ExecutionResult,
    pub work_dir: PathBuf,
    pub config_path: PathBuf,
}

pub struct Orchestrator {
    config: ConfigFile,
    backend: Arc<dyn ProcessBackend>,
    collaborators: Collaborators,
    extractor: Extractor,
    locks: ClusterLocks,
}

impl Orchestrator {
    pub fn new(
        config: ConfigFile,
        backend: Arc<dyn ProcessBackend>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        Ok(Self {
            config,
            backend,
            collaborators,
            extractor: Extractor::installer()?,
            locks: ClusterLocks::new(),
        })
    }

    /// Production wiring: installer lines are forwarded to `tracing`.
    pub fn from_config(config: ConfigFile) -> Result<Self> {
        let sink = Arc::new(TracingSink::new(config.installer.binary.clone()));
        Self::with_installer_sink(config, sink)
    }

    /// Production wiring with `sink` receiving the installer's lines.
    ///
    /// Collaborator CLIs (`ansible-vault`, `aws`) get a runner of their own
    /// that forwards nothing: `ansible-vault view` prints decrypted secrets.
    pub fn with_installer_sink(config: ConfigFile, sink: Arc<dyn LineSink>) -> Result<Self> {
        let runner = ProcessRunner::new()
            .with_sink(sink)
            .with_capture_limit(config.installer.max_capture_bytes);
        let quiet: Arc<dyn ProcessBackend> =
            Arc::new(ProcessRunner::new().with_sink(Arc::new(NullSink)));
        let collaborators = Collaborators::from_config(&config, quiet);
        Self::new(config, Arc::new(runner), collaborators)
    }

    /// Replace the environment the Validate stage reads.
    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.collaborators.env = env;
        self
    }

    /// Share a lock registry with other orchestrators.
    pub fn with_locks(mut self, locks: ClusterLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Replace the extraction rules.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn cluster(&self) -> &str {
        &self.config.cluster.name
    }

    /// Run the whole pipeline.
    pub async fn install(&self) -> std::result::Result<InstallOutcome, StageFailure> {
        let cluster = self.cluster();
        info!(cluster, "install started");

        let validated = self.validate().await.at(Stage::Validate)?;
        let _guard = self.locks.acquire(cluster).await;

        let prepared = self.prepare(&validated).await.at(Stage::Prepare)?;
        let execution = self
            .execute(&validated, &prepared)
            .await
            .at(Stage::Execute)?;

        let info = match self.extract(&execution) {
            Ok(info) => info,
            Err(error) => {
                return Err(StageFailure::new(Stage::Extract, error).with_captured(execution));
            }
        };

        let outcome = self.finalize(info, execution, prepared);
        info!(cluster, "install finished");
        Ok(outcome)
    }

    /// Validate and Prepare only; nothing is executed.
    pub async fn prepare_only(&self) -> std::result::Result<Prepared, StageFailure> {
        let validated = self.validate().await.at(Stage::Validate)?;
        let _guard = self.locks.acquire(self.cluster()).await;
        self.prepare(&validated).await.at(Stage::Prepare)
    }

    /// Resolve credentials, region, pull secret and SSH key.
    pub async fn validate(&self) -> Result<Validated> {
        let env = self.collaborators.env.as_ref();
        let cluster = &self.config.cluster;
        let secrets_cfg = &self.config.secrets;

        let access_key_id = require(env, AWS_ACCESS_KEY_ID)?;
        let secret_access_key = require(env, AWS_SECRET_ACCESS_KEY)?;
        let passphrase = if secrets_cfg.encrypted {
            Some(require(env, &secrets_cfg.passphrase_env)?)
        } else {
            None
        };

        let secrets_path = expand_home(&secrets_cfg.file, env)?;
        if !secrets_path.is_file() {
            return Err(ProvisionError::config(format!(
                "secrets file {} does not exist",
                secrets_path.display()
            )));
        }

        let region = cluster
            .region
            .clone()
            .or_else(|| env.var(AWS_DEFAULT_REGION))
            .ok_or_else(|| {
                ProvisionError::config(
                    "AWS region needs to be specified as input or using 'AWS_DEFAULT_REGION' environment variable",
                )
            })?;

        let plaintext = self
            .collaborators
            .secrets
            .decrypt(&secrets_path, passphrase.as_deref())
            .await?;
        let secrets = Secrets::from_yaml(&plaintext)?;
        let pull_secret = match (secrets.pull_secret, secrets.rh_offline_token) {
            (Some(secret), _) => secret,
            (None, Some(token)) => {
                debug!("no pull secret in secrets file, exchanging offline token");
                self.collaborators.pull_secrets.fetch_pull_secret(&token).await?
            }
            (None, None) => {
                return Err(ProvisionError::config(format!(
                    "{} contains neither pull_secret nor rh_offline_token",
                    secrets_path.display()
                )));
            }
        };

        let ssh_pubkey = match &cluster.ssh_pubkey {
            Some(key) => key.trim().to_string(),
            None => {
                let path = expand_home(&cluster.ssh_pubkey_file, env)?;
                let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                    ProvisionError::config(format!(
                        "cannot read SSH public key {}: {e}",
                        path.display()
                    ))
                })?;
                text.trim().to_string()
            }
        };
        if ssh_pubkey.is_empty() {
            return Err(ProvisionError::config("SSH public key is empty"));
        }

        let clusters_dir = match &cluster.clusters_dir {
            Some(dir) => expand_home(dir, env)?,
            None => expand_home(std::path::Path::new(DEFAULT_CLUSTERS_DIR), env)?,
        };

        debug!(cluster = %cluster.name, region = %region, "prerequisites validated");
        Ok(Validated {
            region,
            access_key_id,
            secret_access_key,
            pull_secret,
            ssh_pubkey,
            work_dir: clusters_dir.join(&cluster.name),
        })
    }

    /// Create the working directory, look up zones and render the install
    /// config.
    pub async fn prepare(&self, validated: &Validated) -> Result<Prepared> {
        let cluster = &self.config.cluster;

        tokio::fs::create_dir_all(&validated.work_dir).await?;

        let worker_zones = self.zones_for(&validated.region, cluster.worker_replicas).await?;
        let master_zones = self.zones_for(&validated.region, cluster.master_replicas).await?;

        let params = InstallParams {
            cluster_name: cluster.name.clone(),
            region: validated.region.clone(),
            base_domain: cluster.base_domain.clone(),
            worker_instance_type: cluster.worker_instance_type.clone(),
            worker_replicas: cluster.worker_replicas,
            worker_zones,
            master_instance_type: cluster.master_instance_type.clone(),
            master_replicas: cluster.master_replicas,
            master_zones,
            ssh_pubkey: validated.ssh_pubkey.clone(),
            work_dir: validated.work_dir.clone(),
        };
        let renderer = Arc::clone(&self.collaborators.renderer);
        let pull_secret = validated.pull_secret.clone();
        let render_params = params.clone();
        let config_path =
            tokio::task::spawn_blocking(move || renderer.render(&render_params, &pull_secret))
                .await
                .map_err(|e| anyhow!("install config rendering did not complete: {e}"))??;

        Ok(Prepared {
            work_dir: params.work_dir,
            config_path,
            worker_zones: params.worker_zones,
            master_zones: params.master_zones,
        })
    }

    async fn zones_for(&self, region: &str, replicas: u32) -> Result<Vec<String>> {
        let count = zone_count(replicas);
        if count == 0 {
            return Ok(Vec::new());
        }
        self.collaborators
            .zones
            .list_availability_zones(region, count)
            .await
    }

    /// The installer request for a prepared working directory.
    pub fn installer_request(&self, validated: &Validated, prepared: &Prepared) -> ExecutionRequest {
        let installer = &self.config.installer;
        let mut request = ExecutionRequest::command(&installer.binary, "create", "cluster")
            .arg(format!("--dir={}", prepared.work_dir.display()))
            .arg(format!("--log-level={}", installer.log_level.as_str()))
            .working_dir(&prepared.work_dir)
            .env(AWS_ACCESS_KEY_ID, &validated.access_key_id)
            .env(AWS_SECRET_ACCESS_KEY, &validated.secret_access_key)
            .env(AWS_DEFAULT_REGION, &validated.region);
        if let Some(timeout) = installer.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    /// Run the installer. A nonzero exit is an [`ProvisionError::Execution`].
    pub async fn execute(&self, validated: &Validated, prepared: &Prepared) -> Result<ExecutionResult> {
        let request = self.installer_request(validated, prepared);
        info!(
            cluster = %self.config.cluster.name,
            binary = request.binary(),
            args = ?request.arg_list(),
            "running installer"
        );

        let result = self.backend.run(&request).await?;
        if !result.success() {
            warn!(
                cluster = %self.config.cluster.name,
                exit_code = result.exit_code,
                "installer failed"
            );
            return Err(ProvisionError::Execution {
                binary: request.binary().to_string(),
                result: Box::new(result),
            });
        }
        Ok(result)
    }

    /// Mine the configured output source of a finished run.
    pub fn extract(&self, result: &ExecutionResult) -> Result<StructuredInstallationInfo> {
        let text: Cow<'_, str> = match self.config.installer.scan {
            OutputSource::Stdout => Cow::Borrowed(&result.stdout),
            OutputSource::Combined => Cow::Owned(result.combined_output()),
        };
        let extract = &self.config.extract;
        let strictness = Strictness::from_flag(extract.strict, &extract.required);
        self.extractor.extract(&text, &strictness)
    }

    fn finalize(
        &self,
        info: StructuredInstallationInfo,
        execution: ExecutionResult,
        prepared: Prepared,
    ) -> InstallOutcome {
        debug!(missing = ?info.missing(), "assembling outcome");
        InstallOutcome {
            cluster: self.config.cluster.name.clone(),
            info,
            execution,
            work_dir: prepared.work_dir,
            config_path: prepared.config_path,
        }
    }
}
