// src/collab/pull_secret.rs

//! Pull-secret acquisition through an OAuth2 refresh-token exchange.

use anyhow::anyhow;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::PullSecretSection;
use crate::errors::Result;
use crate::exec::BoxFuture;

/// Contract: exchange an offline (refresh) token for a pull secret, returned
/// as a JSON string.
pub trait PullSecretProvider: Send + Sync {
    fn fetch_pull_secret<'a>(&'a self, offline_token: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Vendor SSO + accounts API client.
///
/// 1. POST `grant_type=refresh_token` to the token endpoint, get an access
///    token.
/// 2. POST to the access-token API with `Authorization: Bearer`, the JSON
///    body is the pull secret.
#[derive(Debug, Clone)]
pub struct RedHatSso {
    client: reqwest::Client,
    token_endpoint: String,
    api_endpoint: String,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl RedHatSso {
    pub fn new(settings: &PullSecretSection) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_endpoint: settings.token_endpoint.clone(),
            api_endpoint: settings.api_endpoint.clone(),
            client_id: settings.client_id.clone(),
        }
    }

    async fn access_token(&self, offline_token: &str) -> Result<String> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", offline_token),
        ];

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&form[..])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to retrieve access token ({status}): {body}").into());
        }

        let token: TokenResponse = response.json().await?;
        debug!("access token obtained");
        Ok(token.access_token)
    }

    async fn fetch(&self, offline_token: &str) -> Result<String> {
        let access_token = self.access_token(offline_token).await?;

        let response = self
            .client
            .post(&self.api_endpoint)
            .bearer_auth(&access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to download pull secret ({status}): {body}").into());
        }

        let secret: serde_json::Value = response.json().await?;
        info!("pull secret downloaded");
        Ok(serde_json::to_string(&secret)?)
    }
}

impl PullSecretProvider for RedHatSso {
    fn fetch_pull_secret<'a>(&'a self, offline_token: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.fetch(offline_token))
    }
}
