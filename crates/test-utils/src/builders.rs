#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use ocp_provision::config::{ConfigFile, RawConfigFile};
use ocp_provision::extract::Field;
use ocp_provision::types::OutputSource;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from a valid cluster (`hub` in `us-west-2`) with an unencrypted
/// secrets file and a literal SSH key, so only the parts under test need
/// to be set.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.cluster.name = "hub".to_string();
        config.cluster.base_domain = "ocp.example.com".to_string();
        config.cluster.region = Some("us-west-2".to_string());
        config.cluster.ssh_pubkey = Some("ssh-ed25519 AAAAtest test@example.com".to_string());
        config.secrets.encrypted = false;
        Self { config }
    }

    pub fn cluster(mut self, name: &str) -> Self {
        self.config.cluster.name = name.to_string();
        self
    }

    pub fn region(mut self, region: Option<&str>) -> Self {
        self.config.cluster.region = region.map(str::to_string);
        self
    }

    pub fn clusters_dir(mut self, dir: &Path) -> Self {
        self.config.cluster.clusters_dir = Some(dir.to_path_buf());
        self
    }

    pub fn secrets_file(mut self, path: &Path) -> Self {
        self.config.secrets.file = path.to_path_buf();
        self
    }

    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.config.secrets.encrypted = encrypted;
        self
    }

    pub fn ssh_pubkey(mut self, key: Option<&str>) -> Self {
        self.config.cluster.ssh_pubkey = key.map(str::to_string);
        self
    }

    pub fn ssh_pubkey_file(mut self, path: &Path) -> Self {
        self.config.cluster.ssh_pubkey_file = PathBuf::from(path);
        self
    }

    pub fn replicas(mut self, workers: u32, masters: u32) -> Self {
        self.config.cluster.worker_replicas = workers;
        self.config.cluster.master_replicas = masters;
        self
    }

    pub fn installer(mut self, binary: &str) -> Self {
        self.config.installer.binary = binary.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.installer.timeout = Some(format!("{}ms", timeout.as_millis()));
        self
    }

    pub fn scan(mut self, scan: OutputSource) -> Self {
        self.config.installer.scan = scan;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.extract.strict = strict;
        self
    }

    pub fn required(mut self, fields: &[Field]) -> Self {
        self.config.extract.required = fields.to_vec();
        self
    }

    pub fn raw_clone(&self) -> RawConfigFile {
        self.config.clone()
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl From<RawConfigFile> for ConfigFileBuilder {
    fn from(config: RawConfigFile) -> Self {
        Self { config }
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
