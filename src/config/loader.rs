// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, ConfigOverrides, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = ?path, "config file parsed");

    Ok(config)
}

/// Load a configuration file, apply CLI overrides, and validate.
///
/// A missing file is not an error when the overrides alone can produce a
/// valid configuration; every section has defaults except the cluster
/// name and base domain.
pub fn load_and_validate(path: impl AsRef<Path>, overrides: &ConfigOverrides) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw = if path.exists() {
        load_from_path(path)?
    } else {
        debug!(path = ?path, "config file not found; using defaults");
        RawConfigFile::default()
    };
    raw.apply_overrides(overrides);
    ConfigFile::try_from(raw)
}

/// Raw configuration for commands that do not need a complete cluster
/// definition; a missing file yields the defaults.
pub fn load_raw_or_default(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        load_from_path(path)
    } else {
        Ok(RawConfigFile::default())
    }
}

/// Config file read when `--config` is not given, relative to the working
/// directory.
pub const DEFAULT_CONFIG_FILE: &str = "Provision.toml";
