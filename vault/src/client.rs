//! Vault client facade tying authentication, reads and key mapping together.

use crate::{
    auth::TokenAuthenticator,
    config::VaultConfig,
    error::VaultResult,
    gateway,
    mapper::{OutputMode, ResolvedSecrets},
    provider::SecretStore,
    resolver::{self, Environment, ProcessEnvironment},
    transport::HttpSecretStore,
};
use rust_common::build_http_client;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Vault client with lazy authentication.
///
/// One instance is meant to be shared (behind an `Arc`) by every task that
/// resolves secrets; the token is the only state the tasks share.
#[derive(Debug)]
pub struct VaultClient<S = HttpSecretStore> {
    config: VaultConfig,
    store: S,
    auth: TokenAuthenticator,
}

impl VaultClient<HttpSecretStore> {
    /// Create a client talking HTTP to `config.addr`.
    ///
    /// No request is made until the first resolution.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid address or unreadable CA
    /// certificate, or a platform error if the HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        config.validate()?;
        let http = build_http_client(&config.http_config()?)?;
        let store = HttpSecretStore::new(&config.addr, http)?;
        Ok(Self::with_store(config, store))
    }
}

impl<S: SecretStore> VaultClient<S> {
    /// Create a client on top of any [`SecretStore`].
    #[must_use]
    pub fn with_store(config: VaultConfig, store: S) -> Self {
        let auth = TokenAuthenticator::new(&config);
        Self {
            config,
            store,
            auth,
        }
    }

    /// The configuration this client was built from.
    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Authenticate unless a token is already installed.
    ///
    /// # Errors
    ///
    /// See [`TokenAuthenticator::ensure_valid_token`].
    pub async fn ensure_valid_token(&self) -> VaultResult<()> {
        self.auth.ensure_valid_token(&self.store).await.map(drop)
    }

    /// Forget the current token; the next call logs in again.
    pub async fn clear_token(&self) {
        self.auth.clear_token().await;
    }

    /// Fetch and normalize the secret fields stored at `path`.
    ///
    /// # Errors
    ///
    /// Authentication errors, [`crate::VaultError::SecretNotFound`],
    /// [`crate::VaultError::UnexpectedDataFormat`] and transport errors.
    pub async fn fetch_secrets(&self, path: &str) -> VaultResult<HashMap<String, String>> {
        let token = self.auth.ensure_valid_token(&self.store).await?;
        gateway::fetch_secrets(&self.store, &token, path).await
    }

    /// Resolve every configured mapping in the given output mode.
    ///
    /// # Errors
    ///
    /// The first error in declared path and entry order.
    pub async fn resolve(&self, mode: OutputMode) -> VaultResult<ResolvedSecrets> {
        resolver::resolve(&self.store, &self.auth, &self.config.secrets, mode).await
    }

    /// Resolve into the nested configuration namespace.
    ///
    /// # Errors
    ///
    /// See [`VaultClient::resolve`].
    pub async fn resolve_all(&self) -> VaultResult<ResolvedSecrets> {
        self.resolve(OutputMode::Nested).await
    }

    /// Resolve in flat mode and export every value into `env`.
    ///
    /// Nothing is written unless every mapping resolved.
    ///
    /// # Errors
    ///
    /// See [`VaultClient::resolve`].
    #[instrument(skip(self, env))]
    pub async fn apply_to_environment<E>(&self, env: &mut E) -> VaultResult<usize>
    where
        E: Environment + ?Sized + Send,
    {
        let resolved = self.resolve(OutputMode::Flat).await?;
        let applied = resolver::apply(&resolved, env)?;
        info!(variables = applied, "exported vault secrets to environment");
        Ok(applied)
    }
}

/// Load [`VaultConfig`] from the environment and export the configured
/// secrets into the process environment.
///
/// Returns `false` without contacting the store when `VAULT_DISABLED` is set.
/// Meant to run at startup before other threads read the environment.
///
/// # Errors
///
/// Configuration errors while loading, and any resolution error.
pub async fn load_secrets_into_env() -> VaultResult<bool> {
    let config = VaultConfig::from_env()?;
    if config.disabled {
        info!("vault disabled, skipping secret resolution");
        return Ok(false);
    }
    let client = VaultClient::new(config)?;
    client.apply_to_environment(&mut ProcessEnvironment).await?;
    Ok(true)
}
