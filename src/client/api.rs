//! The client's server mediator: sign-up, sign-in and the sync round trip.

use http::{header, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::client::vault::LocalCache;
use crate::error::{AppError, Result};
use crate::handlers::auth::AuthResponse;
use crate::models::envelope::Envelope;

/// Client-side configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:3000`.
    pub server_url: String,
    /// Per-request timeout; auth and sync calls fail closed past it.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// One device's connection to the server.
///
/// The session credential lives in the cookie jar; the long-lived secret
/// stays in the vault's credential source for re-authentication.
pub struct SyncClient {
    http: reqwest::Client,
    config: ClientConfig,
    vault: Arc<LocalCache>,
}

impl SyncClient {
    pub fn new(config: ClientConfig, vault: Arc<LocalCache>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config,
            vault,
        })
    }

    pub fn vault(&self) -> &Arc<LocalCache> {
        &self.vault
    }

    /// Registers a new account and signs the device in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        self.authenticate("/api/auth/register", email, password).await
    }

    /// Signs the device in to an existing account.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.authenticate("/api/auth/login", email, password).await
    }

    async fn authenticate(&self, endpoint: &str, email: &str, password: &str) -> Result<()> {
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "email or password is empty".to_string(),
            ));
        }

        let response = self
            .http
            .post(format!("{}{}", self.config.server_url, endpoint))
            .json(&sonic_rs::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Authentication(format!(
                "authentication failed with status {status}: {body}"
            )));
        }

        let payload: AuthResponse = response
            .json()
            .await
            .map_err(|e| AppError::Serialization(e.to_string()))?;

        // session cookie is now in the jar; remember who we are and keep
        // the passphrase in the secret store for re-login
        self.vault.set_identity(email, payload.user_id);
        self.vault.credentials().set_passphrase(email, password)?;
        tracing::debug!(user = %payload.user_id, "device authenticated");
        Ok(())
    }

    /// Revokes the server-side session.
    pub async fn logout(&self) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/api/auth/logout", self.config.server_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::Authentication(format!(
                "logout failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// One sync round trip.
    ///
    /// Sends the entire local set (possibly empty, a pure pull) and applies
    /// the server's authoritative snapshot via [`LocalCache::swap`]. On a
    /// rejected session it re-authenticates with the stored passphrase and
    /// retries exactly once. On transport failure the local cache is left
    /// untouched.
    pub async fn sync(&self) -> Result<()> {
        let mut response = self.post_snapshot().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("session rejected, re-authenticating");
            let identity = self.vault.identity()?;
            let passphrase = self.vault.credentials().get_passphrase(&identity.email)?;
            self.sign_in(&identity.email, &passphrase).await?;
            response = self.post_snapshot().await?;
        }

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status if status.is_success() => {
                let body = response.bytes().await?;
                if body.is_empty() {
                    return Ok(());
                }
                let server_set: Vec<Envelope> = sonic_rs::from_slice(&body)
                    .map_err(|e| AppError::Serialization(e.to_string()))?;
                self.vault.swap(server_set);
                Ok(())
            }
            StatusCode::UNAUTHORIZED => Err(AppError::Authentication(
                "session rejected after re-login".to_string(),
            )),
            status => Err(AppError::Internal(format!(
                "sync failed with status {status}"
            ))),
        }
    }

    async fn post_snapshot(&self) -> Result<reqwest::Response> {
        let snapshot = self.vault.snapshot();
        let body = sonic_rs::to_string(&snapshot)
            .map_err(|e| AppError::Serialization(e.to_string()))?;
        self.http
            .post(format!("{}/api/sync", self.config.server_url))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(AppError::from)
    }
}
