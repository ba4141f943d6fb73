// src/collab/secrets.rs

//! Secrets-file decryption and the decrypted secrets document.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{ProvisionError, Result};
use crate::exec::{BoxFuture, ExecutionRequest, ProcessBackend};

/// Contract: return the plaintext of the secrets file at `path`.
pub trait SecretDecryptor: Send + Sync {
    fn decrypt<'a>(
        &'a self,
        path: &'a Path,
        passphrase: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Decrypts through `ansible-vault view`.
///
/// The passphrase is written to a private temporary file that lives only for
/// the duration of the call; it never appears on a command line.
pub struct AnsibleVaultCli {
    backend: Arc<dyn ProcessBackend>,
    binary: String,
}

impl AnsibleVaultCli {
    pub fn new(backend: Arc<dyn ProcessBackend>, binary: impl Into<String>) -> Self {
        Self {
            backend,
            binary: binary.into(),
        }
    }

    async fn view(&self, path: &Path, passphrase: Option<&str>) -> Result<String> {
        let passphrase = passphrase
            .ok_or_else(|| ProvisionError::config("vault passphrase is required to decrypt secrets"))?;

        let mut password_file = tempfile::NamedTempFile::new()?;
        password_file.write_all(passphrase.as_bytes())?;
        password_file.flush()?;

        let request = ExecutionRequest::new(&self.binary)
            .arg("view")
            .arg("--vault-password-file")
            .arg(password_file.path().display().to_string())
            .arg(path.display().to_string());

        let result = self.backend.run(&request).await?;
        drop(password_file);

        if !result.success() {
            return Err(ProvisionError::Execution {
                binary: self.binary.clone(),
                result: Box::new(result),
            });
        }
        info!(path = ?path, "secrets file decrypted");
        Ok(result.stdout)
    }
}

impl SecretDecryptor for AnsibleVaultCli {
    fn decrypt<'a>(
        &'a self,
        path: &'a Path,
        passphrase: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.view(path, passphrase))
    }
}

/// Reads an unencrypted secrets file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSecrets;

impl SecretDecryptor for PlainSecrets {
    fn decrypt<'a>(
        &'a self,
        path: &'a Path,
        _passphrase: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(read_plain(path))
    }
}

async fn read_plain(path: &Path) -> Result<String> {
    debug!(path = ?path, "reading plaintext secrets file");
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Decrypted secrets document.
///
/// ```yaml
/// pull_secret: '{"auths": {...}}'   # or a mapping
/// rh_offline_token: eyJhbGciOi...
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    /// Pull secret as a JSON string.
    pub pull_secret: Option<String>,
    pub rh_offline_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSecrets {
    #[serde(default)]
    pull_secret: Option<serde_yaml::Value>,
    #[serde(default)]
    rh_offline_token: Option<String>,
}

impl Secrets {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let raw: RawSecrets = serde_yaml::from_str(text)?;

        let pull_secret = match raw.pull_secret {
            None | Some(serde_yaml::Value::Null) => None,
            Some(serde_yaml::Value::String(s)) => Some(s.trim().to_string()),
            Some(other) => Some(serde_json::to_string(&other)?),
        }
        .filter(|s| !s.is_empty());

        let rh_offline_token = raw
            .rh_offline_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            pull_secret,
            rh_offline_token,
        })
    }
}
