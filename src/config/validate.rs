// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, InstallerSection, RawConfigFile};
use crate::errors::{ProvisionError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ProvisionError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let installer = InstallerSection {
            timeout: raw
                .installer
                .timeout
                .as_deref()
                .map(parse_duration)
                .transpose()
                .map_err(|e| ProvisionError::config(format!("[installer].timeout: {e}")))?,
            binary: raw.installer.binary,
            log_level: raw.installer.log_level,
            max_capture_bytes: raw.installer.max_capture_bytes,
            scan: raw.installer.scan,
        };

        Ok(ConfigFile {
            installer,
            cluster: raw.cluster,
            secrets: raw.secrets,
            extract: raw.extract,
            aws: raw.aws,
            pull_secret: raw.pull_secret,
        })
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_installer(cfg)?;
    validate_cluster(cfg)?;
    validate_secrets(cfg)?;
    Ok(())
}

fn validate_installer(cfg: &RawConfigFile) -> Result<()> {
    if cfg.installer.binary.trim().is_empty() {
        return Err(ProvisionError::config("[installer].binary must not be empty"));
    }
    if cfg.installer.max_capture_bytes == Some(0) {
        return Err(ProvisionError::config(
            "[installer].max_capture_bytes must be >= 1 (got 0)",
        ));
    }
    Ok(())
}

fn validate_cluster(cfg: &RawConfigFile) -> Result<()> {
    let name = cfg.cluster.name.as_str();
    if name.is_empty() {
        return Err(ProvisionError::config(
            "[cluster].name is required (or pass --cluster-name)",
        ));
    }
    if !is_dns_label(name) {
        return Err(ProvisionError::config(format!(
            "[cluster].name '{name}' must be a DNS label: lowercase letters, digits and '-', \
             not starting or ending with '-', at most 63 characters"
        )));
    }
    if cfg.cluster.base_domain.trim().is_empty() {
        return Err(ProvisionError::config("[cluster].base_domain is required"));
    }
    if cfg.cluster.master_replicas == 0 {
        return Err(ProvisionError::config(
            "[cluster].master_replicas must be >= 1 (got 0)",
        ));
    }
    if let Some(region) = &cfg.cluster.region {
        if region.trim().is_empty() {
            return Err(ProvisionError::config("[cluster].region must not be empty"));
        }
    }
    Ok(())
}

fn validate_secrets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.secrets.encrypted && cfg.secrets.passphrase_env.trim().is_empty() {
        return Err(ProvisionError::config(
            "[secrets].passphrase_env must name an environment variable",
        ));
    }
    Ok(())
}

fn is_dns_label(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 63
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
