// src/collab/env.rs

//! Environment lookups behind a trait, so validation can be tested without
//! touching the process environment.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::errors::{ProvisionError, Result};

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

pub trait EnvSource: Send + Sync {
    /// Value of `key`; empty values count as unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: BTreeMap<String, String>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Fetch a required variable or fail with a message naming it.
pub fn require(env: &dyn EnvSource, key: &str) -> Result<String> {
    env.var(key).ok_or_else(|| {
        ProvisionError::config(format!("{key} could not be found in environment variables"))
    })
}

/// Replace a leading `~` with `$HOME`.
pub fn expand_home(path: &Path, env: &dyn EnvSource) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = env.var("HOME").ok_or_else(|| {
                ProvisionError::config(format!(
                    "cannot expand '~' in {}: HOME is not set",
                    path.display()
                ))
            })?;
            Ok(PathBuf::from(home).join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}
