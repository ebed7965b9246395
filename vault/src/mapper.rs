//! Folding resolved values into the output namespace.
//!
//! Destination keys are either plain (`password`) or dotted (`db.password`).
//! Dotted keys collect into a one-level group per parent so several secrets
//! can populate the same configuration section.

use crate::error::VaultResult;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// How destination keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Destination keys are environment variable names taken verbatim
    Flat,
    /// Destination keys are `key` or `parent.child` configuration paths
    Nested,
}

/// A destination key split for nested output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKey<'a> {
    /// Top-level key
    Direct(&'a str),
    /// `parent.child`
    Nested {
        /// Group name
        parent: &'a str,
        /// Key within the group
        child: &'a str,
    },
}

impl<'a> DestinationKey<'a> {
    /// Split `key` on `.`; `None` unless it yields one or two non-empty
    /// segments.
    #[must_use]
    pub fn parse(key: &'a str) -> Option<Self> {
        let mut segments = key.split('.');
        let first = segments.next().filter(|s| !s.is_empty())?;
        match (segments.next(), segments.next()) {
            (None, _) => Some(Self::Direct(first)),
            (Some(child), None) if !child.is_empty() => Some(Self::Nested {
                parent: first,
                child,
            }),
            _ => None,
        }
    }
}

/// Merge `child_value` under `child_key` into an optional existing group.
///
/// Siblings are preserved; an existing value for `child_key` is replaced.
#[must_use]
pub fn merge(
    group: Option<BTreeMap<String, String>>,
    child_key: &str,
    child_value: &str,
) -> BTreeMap<String, String> {
    let mut group = group.unwrap_or_default();
    group.insert(child_key.to_string(), child_value.to_string());
    group
}

/// A resolved value: plain string or a merged dotted-key group.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretValue {
    /// Plain value
    Plain(String),
    /// Children collected from `parent.child` destinations
    Group(BTreeMap<String, String>),
}

impl SecretValue {
    /// The plain value, if this is not a group.
    #[must_use]
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            Self::Plain(value) => Some(value),
            Self::Group(_) => None,
        }
    }

    /// The group, if this is one.
    #[must_use]
    pub const fn as_group(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Plain(_) => None,
            Self::Group(group) => Some(group),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Plain(value) => Value::String(value.clone()),
            Self::Group(group) => Value::Object(
                group
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Plain([REDACTED])"),
            Self::Group(group) => f.debug_tuple("Group").field(&group.keys().collect::<Vec<_>>()).finish(),
        }
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Plain(value) => serializer.serialize_str(value),
            Self::Group(group) => {
                let mut map = serializer.serialize_map(Some(group.len()))?;
                for (k, v) in group {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// Nested destination targets a parent that holds a plain value.
#[derive(Debug, Error)]
#[error("destination {parent} already holds a plain value")]
pub struct GroupConflict {
    /// The conflicting parent key
    pub parent: String,
}

/// Output of one resolution pass, keyed by destination.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedSecrets {
    values: BTreeMap<String, SecretValue>,
}

impl ResolvedSecrets {
    /// Create an empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to a plain value, replacing whatever was there.
    pub fn insert_plain(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), SecretValue::Plain(value.into()));
    }

    /// Merge `value` into the group at `parent` under `child`.
    ///
    /// # Errors
    ///
    /// [`GroupConflict`] if `parent` already holds a plain value.
    pub fn merge_nested(&mut self, parent: &str, child: &str, value: &str) -> Result<(), GroupConflict> {
        let existing = match self.values.remove(parent) {
            None => None,
            Some(SecretValue::Group(group)) => Some(group),
            Some(plain @ SecretValue::Plain(_)) => {
                self.values.insert(parent.to_string(), plain);
                return Err(GroupConflict {
                    parent: parent.to_string(),
                });
            }
        };
        self.values
            .insert(parent.to_string(), SecretValue::Group(merge(existing, child, value)));
        Ok(())
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SecretValue> {
        self.values.get(key)
    }

    /// Destination keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of destination keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON object for merging into an application config tree.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// String-only view; groups are rendered as compact JSON objects.
    ///
    /// # Errors
    ///
    /// [`crate::VaultError::Serialization`] if a group cannot be encoded.
    pub fn to_string_map(&self) -> VaultResult<BTreeMap<String, String>> {
        self.values
            .iter()
            .map(|(k, v)| -> VaultResult<(String, String)> {
                let rendered = match v {
                    SecretValue::Plain(value) => value.clone(),
                    SecretValue::Group(group) => serde_json::to_string(group)?,
                };
                Ok((k.clone(), rendered))
            })
            .collect()
    }
}

impl fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

impl Serialize for ResolvedSecrets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in &self.values {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl IntoIterator for ResolvedSecrets {
    type Item = (String, SecretValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, SecretValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
