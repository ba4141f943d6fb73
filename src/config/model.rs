// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::extract::Field;
use crate::types::{InstallerLogLevel, OutputSource};

pub const DEFAULT_TOKEN_ENDPOINT: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";
pub const DEFAULT_PULL_SECRET_API: &str =
    "https://api.openshift.com/api/accounts_mgmt/v1/access_token";
pub const DEFAULT_CLIENT_ID: &str = "rhsm-api";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [installer]
/// binary = "openshift-install"
/// log_level = "info"
/// timeout = "90m"
/// scan = "combined"
///
/// [cluster]
/// name = "hub"
/// region = "us-west-2"
/// base_domain = "ocp.example.com"
/// worker_replicas = 3
///
/// [secrets]
/// file = "vars/secrets.yml"
///
/// [extract]
/// strict = true
/// required = ["api_server_url", "web_console_url"]
/// ```
///
/// Everything except `[cluster].name` and `[cluster].base_domain` has a
/// default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub installer: RawInstallerSection,

    #[serde(default)]
    pub cluster: ClusterSection,

    #[serde(default)]
    pub secrets: SecretsSection,

    #[serde(default)]
    pub extract: ExtractSection,

    #[serde(default)]
    pub aws: AwsSection,

    #[serde(default)]
    pub pull_secret: PullSecretSection,
}

/// Values the CLI may override on top of the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cluster_name: Option<String>,
    pub region: Option<String>,
    pub scan: Option<OutputSource>,
}

impl RawConfigFile {
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(name) = &overrides.cluster_name {
            self.cluster.name = name.clone();
        }
        if let Some(region) = &overrides.region {
            self.cluster.region = Some(region.clone());
        }
        if let Some(scan) = overrides.scan {
            self.installer.scan = scan;
        }
    }
}

/// `[installer]` section, before the timeout string is parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInstallerSection {
    #[serde(default = "default_installer_binary")]
    pub binary: String,

    #[serde(default)]
    pub log_level: InstallerLogLevel,

    /// Duration string (`"90m"`, `"30s"`); no deadline if absent.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Per-stream capture limit in bytes; unbounded if absent.
    #[serde(default)]
    pub max_capture_bytes: Option<usize>,

    #[serde(default)]
    pub scan: OutputSource,
}

impl Default for RawInstallerSection {
    fn default() -> Self {
        Self {
            binary: default_installer_binary(),
            log_level: InstallerLogLevel::default(),
            timeout: None,
            max_capture_bytes: None,
            scan: OutputSource::default(),
        }
    }
}

fn default_installer_binary() -> String {
    "openshift-install".to_string()
}

/// Validated `[installer]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSection {
    pub binary: String,
    pub log_level: InstallerLogLevel,
    pub timeout: Option<Duration>,
    pub max_capture_bytes: Option<usize>,
    pub scan: OutputSource,
}

/// `[cluster]` section: the parameters of the cluster to create.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSection {
    #[serde(default)]
    pub name: String,

    /// Falls back to `AWS_DEFAULT_REGION` when absent.
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub base_domain: String,

    #[serde(default = "default_worker_instance_type")]
    pub worker_instance_type: String,

    #[serde(default = "default_replicas")]
    pub worker_replicas: u32,

    #[serde(default = "default_master_instance_type")]
    pub master_instance_type: String,

    #[serde(default = "default_replicas")]
    pub master_replicas: u32,

    /// Literal SSH public key. Takes precedence over `ssh_pubkey_file`.
    #[serde(default)]
    pub ssh_pubkey: Option<String>,

    #[serde(default = "default_ssh_pubkey_file")]
    pub ssh_pubkey_file: PathBuf,

    /// Parent of the per-cluster working directories. `~/clusters` if absent.
    #[serde(default)]
    pub clusters_dir: Option<PathBuf>,
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            region: None,
            base_domain: String::new(),
            worker_instance_type: default_worker_instance_type(),
            worker_replicas: default_replicas(),
            master_instance_type: default_master_instance_type(),
            master_replicas: default_replicas(),
            ssh_pubkey: None,
            ssh_pubkey_file: default_ssh_pubkey_file(),
            clusters_dir: None,
        }
    }
}

fn default_worker_instance_type() -> String {
    "m5.4xlarge".to_string()
}

fn default_master_instance_type() -> String {
    "c5.4xlarge".to_string()
}

fn default_replicas() -> u32 {
    3
}

fn default_ssh_pubkey_file() -> PathBuf {
    PathBuf::from("~/.ssh/id_rsa.pub")
}

/// `[secrets]` section: where the secrets file lives and how to open it.
///
/// The decrypted file is YAML with optional `pull_secret` and
/// `rh_offline_token` keys.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretsSection {
    #[serde(default = "default_secrets_file")]
    pub file: PathBuf,

    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,

    #[serde(default = "default_true")]
    pub encrypted: bool,

    #[serde(default = "default_vault_binary")]
    pub vault_binary: String,
}

impl Default for SecretsSection {
    fn default() -> Self {
        Self {
            file: default_secrets_file(),
            passphrase_env: default_passphrase_env(),
            encrypted: true,
            vault_binary: default_vault_binary(),
        }
    }
}

fn default_secrets_file() -> PathBuf {
    PathBuf::from("vars/secrets.yml")
}

fn default_passphrase_env() -> String {
    "VAULT_SECRET".to_string()
}

fn default_vault_binary() -> String {
    "ansible-vault".to_string()
}

fn default_true() -> bool {
    true
}

/// `[extract]` section: absence policy for the installer output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractSection {
    #[serde(default = "default_true")]
    pub strict: bool,

    /// Checked in this order; the first missing one is reported.
    #[serde(default = "default_required")]
    pub required: Vec<Field>,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            strict: true,
            required: default_required(),
        }
    }
}

fn default_required() -> Vec<Field> {
    Field::ALL.to_vec()
}

/// `[aws]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsSection {
    #[serde(default = "default_aws_binary")]
    pub binary: String,

    /// Static zone list; replaces the CLI lookup when set.
    #[serde(default)]
    pub zones: Option<Vec<String>>,
}

impl Default for AwsSection {
    fn default() -> Self {
        Self {
            binary: default_aws_binary(),
            zones: None,
        }
    }
}

fn default_aws_binary() -> String {
    "aws".to_string()
}

/// `[pull_secret]` section: OAuth2 refresh-token exchange endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PullSecretSection {
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,
}

impl Default for PullSecretSection {
    fn default() -> Self {
        Self {
            token_endpoint: default_token_endpoint(),
            api_endpoint: default_api_endpoint(),
            client_id: default_client_id(),
        }
    }
}

fn default_token_endpoint() -> String {
    DEFAULT_TOKEN_ENDPOINT.to_string()
}

fn default_api_endpoint() -> String {
    DEFAULT_PULL_SECRET_API.to_string()
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub installer: InstallerSection,
    pub cluster: ClusterSection,
    pub secrets: SecretsSection,
    pub extract: ExtractSection,
    pub aws: AwsSection,
    pub pull_secret: PullSecretSection,
}
