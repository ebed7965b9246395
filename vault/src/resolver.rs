//! One resolution pass over the declared secrets config.
//!
//! Paths are visited in declared order with one read per path. The first
//! failure aborts the pass; nothing is applied to an [`Environment`] unless
//! every mapping resolved.

use crate::{
    auth::TokenAuthenticator,
    error::{VaultError, VaultResult},
    gateway::fetch_secrets,
    mapper::{DestinationKey, OutputMode, ResolvedSecrets, SecretValue},
    mapping::SecretsConfig,
    provider::SecretStore,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Destination for flat-mode output.
pub trait Environment {
    /// Set variable `key` to `value`.
    fn set_var(&mut self, key: &str, value: &str);
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    #[allow(unsafe_code)]
    fn set_var(&mut self, key: &str, value: &str) {
        // SAFETY: secrets are applied once at startup; names and values were
        // checked for `=` and NUL before reaching here. Callers must not read
        // the environment from other threads while this runs.
        unsafe { std::env::set_var(key, value) }
    }
}

impl Environment for HashMap<String, String> {
    fn set_var(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

impl Environment for BTreeMap<String, String> {
    fn set_var(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// Resolve every declared mapping into `mode`'s namespace.
///
/// In [`OutputMode::Nested`] all destination keys are checked before any
/// network call, so a malformed key fails the pass without touching the
/// store.
///
/// # Errors
///
/// The first configuration, authentication, lookup or transport error in
/// declared path and entry order.
pub async fn resolve<S>(
    store: &S,
    auth: &TokenAuthenticator,
    secrets: &SecretsConfig,
    mode: OutputMode,
) -> VaultResult<ResolvedSecrets>
where
    S: SecretStore + ?Sized,
{
    check_destinations(secrets, mode)?;

    let mut output = ResolvedSecrets::new();
    for (path, mappings) in secrets.iter() {
        let token = auth.ensure_valid_token(store).await?;
        let fetched = fetch_secrets(store, &token, path).await?;

        for mapping in mappings {
            let value = fetched
                .get(&mapping.vault_key)
                .ok_or_else(|| VaultError::key_not_found(&mapping.vault_key, path))?;
            let destination = mapping.destination_key();
            place(&mut output, mode, path, destination, value)?;
        }
        debug!(path, mappings = mappings.len(), "resolved vault path");
    }

    info!(paths = secrets.len(), keys = output.len(), "resolved secrets from vault");
    Ok(output)
}

/// Write flat output into `env`; returns the number of variables set.
///
/// Every entry is checked before the first write.
///
/// # Errors
///
/// [`VaultError::InvalidConfig`] if `resolved` holds a nested group, which
/// only [`OutputMode::Nested`] produces, and
/// [`VaultError::InvalidEnvironmentVariable`] for a name or value the
/// environment cannot hold.
pub fn apply<E>(resolved: &ResolvedSecrets, env: &mut E) -> VaultResult<usize>
where
    E: Environment + ?Sized,
{
    let mut pairs = Vec::with_capacity(resolved.len());
    for (key, value) in resolved.iter() {
        match value {
            SecretValue::Plain(value) => {
                check_env_var(key, value)?;
                pairs.push((key, value.as_str()));
            }
            SecretValue::Group(_) => {
                return Err(VaultError::InvalidConfig(format!(
                    "cannot export nested secret group {key} as an environment variable"
                )));
            }
        }
    }

    for (key, value) in &pairs {
        env.set_var(key, value);
    }
    Ok(pairs.len())
}

fn check_destinations(secrets: &SecretsConfig, mode: OutputMode) -> VaultResult<()> {
    if mode == OutputMode::Flat {
        return Ok(());
    }
    for (path, mappings) in secrets.iter() {
        for mapping in mappings {
            let destination = mapping.destination_key();
            if DestinationKey::parse(destination).is_none() {
                return Err(VaultError::InvalidDestinationKey {
                    key: destination.to_string(),
                    path: path.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn place(
    output: &mut ResolvedSecrets,
    mode: OutputMode,
    path: &str,
    destination: &str,
    value: &str,
) -> VaultResult<()> {
    match mode {
        OutputMode::Flat => {
            check_env_var(destination, value)?;
            output.insert_plain(destination, value);
        }
        OutputMode::Nested => match DestinationKey::parse(destination) {
            Some(DestinationKey::Direct(key)) => output.insert_plain(key, value),
            Some(DestinationKey::Nested { parent, child }) => output
                .merge_nested(parent, child, value)
                .map_err(|_| VaultError::DestinationConflict {
                    key: destination.to_string(),
                    path: path.to_string(),
                })?,
            None => {
                return Err(VaultError::InvalidDestinationKey {
                    key: destination.to_string(),
                    path: path.to_string(),
                });
            }
        },
    }
    Ok(())
}

fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['=', '\0'])
}

fn check_env_var(name: &str, value: &str) -> VaultResult<()> {
    if !is_valid_env_name(name) || value.contains('\0') {
        return Err(VaultError::InvalidEnvironmentVariable {
            name: name.to_string(),
        });
    }
    Ok(())
}
