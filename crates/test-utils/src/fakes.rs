//! In-memory collaborators for orchestrator tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ocp_provision::collab::{
    Collaborators, ConfigRenderer, EnvSource, InstallConfigRenderer, InstallParams,
    PullSecretProvider, SecretDecryptor, StaticEnv, StaticZones, ZoneLookup,
};
use ocp_provision::errors::{ProvisionError, Result};
use ocp_provision::exec::BoxFuture;

/// Environment with AWS credentials and a vault passphrase set.
pub fn aws_env() -> StaticEnv {
    StaticEnv::new()
        .with("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
        .with("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI/K7MDENG")
        .with("VAULT_SECRET", "vault-pass")
        .with("HOME", "/home/tester")
}

/// Returns a fixed secrets document regardless of the file contents.
pub struct FakeDecryptor {
    plaintext: String,
    calls: Mutex<Vec<(PathBuf, Option<String>)>>,
}

impl FakeDecryptor {
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self {
            plaintext: plaintext.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pull_secret(secret: &str) -> Self {
        Self::new(format!("pull_secret: '{secret}'\n"))
    }

    pub fn calls(&self) -> Vec<(PathBuf, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl SecretDecryptor for FakeDecryptor {
    fn decrypt<'a>(
        &'a self,
        path: &'a Path,
        passphrase: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), passphrase.map(str::to_string)));
        Box::pin(std::future::ready(Ok(self.plaintext.clone())))
    }
}

/// Exchanges any token for a fixed secret, recording the tokens seen.
#[derive(Default)]
pub struct FakePullSecrets {
    secret: String,
    tokens: Mutex<Vec<String>>,
}

impl FakePullSecrets {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

impl PullSecretProvider for FakePullSecrets {
    fn fetch_pull_secret<'a>(&'a self, offline_token: &'a str) -> BoxFuture<'a, Result<String>> {
        self.tokens.lock().unwrap().push(offline_token.to_string());
        let result = if offline_token.is_empty() {
            Err(ProvisionError::config("offline token is empty"))
        } else {
            Ok(self.secret.clone())
        };
        Box::pin(std::future::ready(result))
    }
}

/// Real renderer that also remembers the parameters it was given.
#[derive(Default)]
pub struct RecordingRenderer {
    rendered: Mutex<Vec<InstallParams>>,
}

impl RecordingRenderer {
    pub fn rendered(&self) -> Vec<InstallParams> {
        self.rendered.lock().unwrap().clone()
    }
}

impl ConfigRenderer for RecordingRenderer {
    fn render(&self, params: &InstallParams, pull_secret: &str) -> Result<PathBuf> {
        self.rendered.lock().unwrap().push(params.clone());
        InstallConfigRenderer.render(params, pull_secret)
    }
}

/// Handles on the fakes behind a [`Collaborators`] set.
pub struct FakeCollaborators {
    pub decryptor: Arc<FakeDecryptor>,
    pub pull_secrets: Arc<FakePullSecrets>,
    pub renderer: Arc<RecordingRenderer>,
}

impl FakeCollaborators {
    pub fn new() -> Self {
        Self {
            decryptor: Arc::new(FakeDecryptor::with_pull_secret(r#"{"auths":{}}"#)),
            pull_secrets: Arc::new(FakePullSecrets::new(r#"{"auths":{"fetched":{}}}"#)),
            renderer: Arc::new(RecordingRenderer::default()),
        }
    }

    pub fn decryptor(mut self, decryptor: FakeDecryptor) -> Self {
        self.decryptor = Arc::new(decryptor);
        self
    }

    /// Collaborators backed by these fakes, `env` and a static zone list.
    pub fn wire(&self, env: impl EnvSource + 'static) -> Collaborators {
        let zones: Arc<dyn ZoneLookup> = Arc::new(StaticZones::new(vec![
            "us-west-2a".to_string(),
            "us-west-2b".to_string(),
            "us-west-2c".to_string(),
            "us-west-2d".to_string(),
        ]));
        Collaborators {
            env: Arc::new(env),
            zones,
            secrets: self.decryptor.clone(),
            pull_secrets: self.pull_secrets.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

impl Default for FakeCollaborators {
    fn default() -> Self {
        Self::new()
    }
}
