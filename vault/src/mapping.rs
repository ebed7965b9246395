//! Declared vault path to destination key mappings.
//!
//! The document is a JSON object keyed by vault path, each value a list of
//! mappings:
//!
//! ```json
//! {"secret/data/app": [{"vaultKey": "password", "envVar": "APP_PASSWORD"}]}
//! ```
//!
//! `envVar` and `configKey` are interchangeable spellings of the destination
//! key. Declared path order is kept so resolution walks the paths in the
//! order the operator wrote them.

use crate::error::{VaultError, VaultResult};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// A single vault key to destination key mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretMapping {
    /// Key to look up in the secret stored at the path
    #[serde(rename = "vaultKey")]
    pub vault_key: String,
    /// Destination key; falls back to `vault_key` when absent or empty
    #[serde(default, rename = "envVar", alias = "configKey")]
    pub destination: Option<String>,
}

impl SecretMapping {
    /// Map `vault_key` onto a destination of the same name.
    #[must_use]
    pub fn new(vault_key: impl Into<String>) -> Self {
        Self {
            vault_key: vault_key.into(),
            destination: None,
        }
    }

    /// Set an explicit destination key.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// The key the resolved value is exposed under.
    #[must_use]
    pub fn destination_key(&self) -> &str {
        match self.destination.as_deref() {
            Some(destination) if !destination.is_empty() => destination,
            _ => &self.vault_key,
        }
    }
}

/// Ordered mapping from vault path to the keys fetched from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretsConfig {
    paths: Vec<(String, Vec<SecretMapping>)>,
}

impl SecretsConfig {
    /// Create an empty config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON secrets config document.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidSecretsConfig`] for malformed JSON and
    /// [`VaultError::InvalidConfig`] for a mapping with an empty `vaultKey`.
    pub fn parse(value: &str) -> VaultResult<Self> {
        let config: Self = serde_json::from_str(value).map_err(VaultError::InvalidSecretsConfig)?;
        config.validate()?;
        Ok(config)
    }

    /// Add mappings for a path, builder style.
    ///
    /// Declaring a path twice replaces the earlier mappings but keeps the
    /// earlier position.
    #[must_use]
    pub fn with_path(
        mut self,
        path: impl Into<String>,
        mappings: impl IntoIterator<Item = SecretMapping>,
    ) -> Self {
        self.insert(path.into(), mappings.into_iter().collect());
        self
    }

    fn insert(&mut self, path: String, mappings: Vec<SecretMapping>) {
        match self.paths.iter_mut().find(|(existing, _)| *existing == path) {
            Some(entry) => entry.1 = mappings,
            None => self.paths.push((path, mappings)),
        }
    }

    /// Check that every mapping names a vault key.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] naming the first offending path.
    pub fn validate(&self) -> VaultResult<()> {
        for (path, mappings) in &self.paths {
            if mappings.iter().any(|m| m.vault_key.is_empty()) {
                return Err(VaultError::InvalidConfig(format!(
                    "mapping for vault path {path} has an empty vaultKey"
                )));
            }
        }
        Ok(())
    }

    /// Iterate paths in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SecretMapping])> {
        self.paths
            .iter()
            .map(|(path, mappings)| (path.as_str(), mappings.as_slice()))
    }

    /// Number of declared paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no path is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'de> Deserialize<'de> for SecretsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PathsVisitor;

        impl<'de> Visitor<'de> for PathsVisitor {
            type Value = SecretsConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping vault paths to lists of secret mappings")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut config = SecretsConfig::new();
                while let Some((path, mappings)) =
                    access.next_entry::<String, Option<Vec<SecretMapping>>>()?
                {
                    config.insert(path, mappings.unwrap_or_default());
                }
                Ok(config)
            }
        }

        deserializer.deserialize_map(PathsVisitor)
    }
}
