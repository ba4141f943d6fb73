// src/collab/mod.rs

//! External collaborators of the install pipeline.
//!
//! The orchestrator only sees the traits defined here; each has one or more
//! concrete implementations:
//!
//! - [`zones`]: `ZoneLookup` (`AwsCliZones`, `StaticZones`)
//! - [`pull_secret`]: `PullSecretProvider` (`RedHatSso`)
//! - [`secrets`]: `SecretDecryptor` (`AnsibleVaultCli`, `PlainSecrets`)
//! - [`render`]: `ConfigRenderer` (`InstallConfigRenderer`)
//! - [`env`]: `EnvSource` (`ProcessEnv`, `StaticEnv`)

use std::sync::Arc;

pub mod env;
pub mod pull_secret;
pub mod render;
pub mod secrets;
pub mod zones;

pub use env::{EnvSource, ProcessEnv, StaticEnv};
pub use pull_secret::{PullSecretProvider, RedHatSso};
pub use render::{ConfigRenderer, INSTALL_CONFIG_FILE, InstallConfigRenderer, InstallParams};
pub use secrets::{AnsibleVaultCli, PlainSecrets, SecretDecryptor, Secrets};
pub use zones::{AwsCliZones, StaticZones, ZoneLookup, zone_count};

use crate::config::ConfigFile;
use crate::exec::ProcessBackend;

/// The full set of collaborators the orchestrator needs.
#[derive(Clone)]
pub struct Collaborators {
    pub env: Arc<dyn EnvSource>,
    pub zones: Arc<dyn ZoneLookup>,
    pub secrets: Arc<dyn SecretDecryptor>,
    pub pull_secrets: Arc<dyn PullSecretProvider>,
    pub renderer: Arc<dyn ConfigRenderer>,
}

impl Collaborators {
    /// Production wiring for `cfg`; CLI-backed collaborators run through
    /// `backend`. Its sink sees decrypted vault output, so it must not log.
    pub fn from_config(cfg: &ConfigFile, backend: Arc<dyn ProcessBackend>) -> Self {
        let zones: Arc<dyn ZoneLookup> = match &cfg.aws.zones {
            Some(list) => Arc::new(StaticZones::new(list.clone())),
            None => Arc::new(AwsCliZones::new(Arc::clone(&backend), cfg.aws.binary.clone())),
        };

        let secrets: Arc<dyn SecretDecryptor> = if cfg.secrets.encrypted {
            Arc::new(AnsibleVaultCli::new(backend, cfg.secrets.vault_binary.clone()))
        } else {
            Arc::new(PlainSecrets)
        };

        Self {
            env: Arc::new(ProcessEnv),
            zones,
            secrets,
            pull_secrets: Arc::new(RedHatSso::new(&cfg.pull_secret)),
            renderer: Arc::new(InstallConfigRenderer),
        }
    }
}
