// src/collab/render.rs

//! Install-configuration rendering.
//!
//! The rendered file is always replaced atomically: content goes to a
//! temporary file in the target directory, is synced, then renamed over the
//! target. A reader sees either the old file or the complete new one.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::errors::Result;

/// File name the installer reads from its `--dir`.
pub const INSTALL_CONFIG_FILE: &str = "install-config.yaml";

/// Everything the renderer needs about the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallParams {
    pub cluster_name: String,
    pub region: String,
    pub base_domain: String,
    pub worker_instance_type: String,
    pub worker_replicas: u32,
    pub worker_zones: Vec<String>,
    pub master_instance_type: String,
    pub master_replicas: u32,
    pub master_zones: Vec<String>,
    pub ssh_pubkey: String,
    /// Per-cluster working directory; the file is written here.
    pub work_dir: PathBuf,
}

/// Contract: render the install configuration and return the written path.
pub trait ConfigRenderer: Send + Sync {
    fn render(&self, params: &InstallParams, pull_secret: &str) -> Result<PathBuf>;
}

/// Renders the AWS `install-config.yaml` with `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallConfigRenderer;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstallConfig<'a> {
    api_version: &'a str,
    base_domain: &'a str,
    metadata: Metadata<'a>,
    compute: Vec<MachinePool<'a>>,
    control_plane: MachinePool<'a>,
    platform: Platform<'a>,
    publish: &'a str,
    pull_secret: &'a str,
    ssh_key: &'a str,
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct MachinePool<'a> {
    architecture: &'a str,
    hyperthreading: &'a str,
    name: &'a str,
    platform: PoolPlatform<'a>,
    replicas: u32,
}

#[derive(Debug, Serialize)]
struct PoolPlatform<'a> {
    aws: AwsPool<'a>,
}

#[derive(Debug, Serialize)]
struct AwsPool<'a> {
    #[serde(rename = "type")]
    instance_type: &'a str,
    #[serde(skip_serializing_if = "no_zones")]
    zones: &'a [String],
}

#[derive(Debug, Serialize)]
struct Platform<'a> {
    aws: AwsPlatform<'a>,
}

#[derive(Debug, Serialize)]
struct AwsPlatform<'a> {
    region: &'a str,
}

fn no_zones(zones: &&[String]) -> bool {
    zones.is_empty()
}

fn machine_pool<'a>(
    name: &'a str,
    instance_type: &'a str,
    replicas: u32,
    zones: &'a [String],
) -> MachinePool<'a> {
    MachinePool {
        architecture: "amd64",
        hyperthreading: "Enabled",
        name,
        platform: PoolPlatform {
            aws: AwsPool {
                instance_type,
                zones,
            },
        },
        replicas,
    }
}

impl InstallConfigRenderer {
    /// Rendered document, without touching the filesystem.
    pub fn to_yaml(&self, params: &InstallParams, pull_secret: &str) -> Result<String> {
        let doc = InstallConfig {
            api_version: "v1",
            base_domain: &params.base_domain,
            metadata: Metadata {
                name: &params.cluster_name,
            },
            compute: vec![machine_pool(
                "worker",
                &params.worker_instance_type,
                params.worker_replicas,
                &params.worker_zones,
            )],
            control_plane: machine_pool(
                "master",
                &params.master_instance_type,
                params.master_replicas,
                &params.master_zones,
            ),
            platform: Platform {
                aws: AwsPlatform {
                    region: &params.region,
                },
            },
            publish: "External",
            pull_secret,
            ssh_key: &params.ssh_pubkey,
        };
        Ok(serde_yaml::to_string(&doc)?)
    }
}

impl ConfigRenderer for InstallConfigRenderer {
    fn render(&self, params: &InstallParams, pull_secret: &str) -> Result<PathBuf> {
        let contents = self.to_yaml(params, pull_secret)?;
        let target = params.work_dir.join(INSTALL_CONFIG_FILE);
        write_atomic(&target, contents.as_bytes())?;
        info!(
            cluster = %params.cluster_name,
            path = ?target,
            "install config rendered"
        );
        Ok(target)
    }
}

/// Replace `target` with `contents` in one step.
///
/// The temporary file is created next to the target so the final rename
/// never crosses filesystems. On failure the target is left untouched and
/// the temporary file is removed.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".install-config.")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
