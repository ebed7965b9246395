//! Vault/OpenBao secret resolution for application startup.
//!
//! Declared `vault path -> keys` mappings are fetched with a lazily acquired
//! token (static, or Kubernetes service-account login) and exported either as
//! environment variables or as a nested configuration tree where
//! `parent.child` destination keys are grouped under `parent`.
//!
//! ```no_run
//! # async fn run() -> vault_secrets::VaultResult<()> {
//! use vault_secrets::{VaultClient, VaultConfig};
//!
//! let client = VaultClient::new(VaultConfig::from_env()?)?;
//! let resolved = client.resolve_all().await?;
//! println!("{}", resolved.to_json());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mapper;
pub mod mapping;
pub mod provider;
pub mod resolver;
pub mod secrets;
pub mod transport;

pub use auth::TokenAuthenticator;
pub use client::{VaultClient, load_secrets_into_env};
pub use config::VaultConfig;
pub use error::{ErrorCategory, VaultError, VaultResult};
pub use gateway::normalize_secret_data;
pub use mapper::{DestinationKey, OutputMode, ResolvedSecrets, SecretValue, merge};
pub use mapping::{SecretMapping, SecretsConfig};
pub use provider::SecretStore;
pub use resolver::{Environment, ProcessEnvironment};
pub use secrets::LogicalResponse;
pub use transport::HttpSecretStore;
