// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply CLI overrides (`loader.rs`).
//! - Validate and convert the raw model (`validate.rs`).
//! - Parse duration strings such as `"90m"` (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, load_raw_or_default};
pub use model::{
    AwsSection, ClusterSection, ConfigFile, ConfigOverrides, ExtractSection, InstallerSection,
    PullSecretSection, RawConfigFile, RawInstallerSection, SecretsSection,
};
