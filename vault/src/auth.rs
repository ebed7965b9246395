//! Lazy, single-flight token acquisition.
//!
//! The token is fetched on first use and then kept for the lifetime of the
//! authenticator. A present token is treated as valid; nothing here inspects
//! its TTL or reacts to the store rejecting it. Callers that know the token
//! went stale call [`TokenAuthenticator::clear_token`].

use crate::{
    config::VaultConfig,
    error::{VaultError, VaultResult},
    provider::SecretStore,
    secrets::KubernetesLoginRequest,
};
use secrecy::SecretString;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Owns the active store token.
pub struct TokenAuthenticator {
    static_token: Option<SecretString>,
    role: String,
    token_path: PathBuf,
    backend: String,
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("role", &self.role)
            .field("token_path", &self.token_path)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl TokenAuthenticator {
    /// Create an authenticator with no token installed.
    #[must_use]
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            static_token: config.auth_token.clone(),
            role: config.role.clone(),
            token_path: config.token_path.clone(),
            backend: config.auth_backend.clone(),
            token: RwLock::new(None),
        }
    }

    /// Whether a token is currently installed.
    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Drop the installed token so the next call authenticates again.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    /// Return the installed token, authenticating first if there is none.
    ///
    /// Concurrent callers share one login: the first to take the write lock
    /// authenticates, the rest wait and pick up its token. A failed attempt
    /// installs nothing. Dropping the future mid-login leaves the state
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`VaultError::TokenFile`] when the service-account token cannot be
    /// read, [`VaultError::LoginFailed`] when the login request fails and
    /// [`VaultError::NoClientToken`] when the store answers without a token.
    pub async fn ensure_valid_token<S>(&self, store: &S) -> VaultResult<SecretString>
    where
        S: SecretStore + ?Sized,
    {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            debug!("token installed while waiting for the lock");
            return Ok(token.clone());
        }

        let token = self.authenticate(store).await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    #[instrument(skip(self, store), fields(role = %self.role, backend = %self.backend))]
    async fn authenticate<S>(&self, store: &S) -> VaultResult<SecretString>
    where
        S: SecretStore + ?Sized,
    {
        if let Some(token) = &self.static_token {
            info!("using passed in vault token, skipping authentication with vault");
            return Ok(token.clone());
        }

        info!("authenticating with vault");

        let jwt = tokio::fs::read_to_string(&self.token_path)
            .await
            .map_err(|source| VaultError::TokenFile {
                path: self.token_path.clone(),
                source,
            })?;

        let body = serde_json::to_value(KubernetesLoginRequest {
            jwt: jwt.trim(),
            role: &self.role,
        })?;

        let login_path = format!("auth/{}/login", self.backend);
        let response = store
            .write(&login_path, None, body)
            .await
            .map_err(|e| VaultError::login_failed(&self.backend, e))?;

        let client_token = response
            .and_then(|r| r.auth)
            .map(|auth| auth.client_token)
            .filter(|token| !token.is_empty())
            .ok_or(VaultError::NoClientToken)?;

        info!("successfully authenticated with vault");
        Ok(SecretString::from(client_token))
    }
}
