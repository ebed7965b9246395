//! Shared proptest generators.
//!
//! Generated names stay within `[a-z0-9_]` so they are valid as store paths,
//! payload keys, environment variable names and nested destination segments.

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// A single identifier segment.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

/// Store paths such as `secret/data/app_1`.
pub fn secret_path_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("secret"), Just("kv"), Just("apps")],
        prop::bool::ANY,
        vec(segment_strategy(), 1..3),
    )
        .prop_map(|(mount, kv2, rest)| {
            let prefix = if kv2 {
                format!("{mount}/data")
            } else {
                mount.to_string()
            };
            format!("{prefix}/{}", rest.join("/"))
        })
}

/// Field names inside a secret payload.
pub fn vault_key_strategy() -> impl Strategy<Value = String> {
    segment_strategy().prop_filter("reserved envelope key", |k| k != "data")
}

/// Environment variable names.
pub fn env_var_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,15}"
}

/// Valid nested destinations: `key` or `parent.child`.
pub fn destination_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        segment_strategy(),
        (segment_strategy(), segment_strategy()).prop_map(|(p, c)| format!("{p}.{c}")),
    ]
}

/// Destinations with three or more non-empty segments.
pub fn deep_destination_key_strategy() -> impl Strategy<Value = String> {
    vec(segment_strategy(), 3..6).prop_map(|segments| segments.join("."))
}

/// Arbitrary secret values, including characters that need JSON escaping.
pub fn secret_value_strategy() -> impl Strategy<Value = String> {
    "[ -~]{0,32}"
}

/// A flat secret payload: field name to string value.
pub fn secret_fields_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    btree_map(vault_key_strategy(), secret_value_strategy(), 1..8)
}

/// Secrets config JSON paired with the payload stored at each path.
///
/// Every mapping references a key present in its payload and destinations are
/// unique across the whole config.
pub fn secrets_fixture_strategy() -> impl Strategy<Value = SecretsFixture> {
    btree_map(secret_path_strategy(), secret_fields_strategy(), 1..4).prop_map(|stores| {
        let mut config = Map::new();
        for (index, (path, fields)) in stores.iter().enumerate() {
            let mappings: Vec<Value> = fields
                .keys()
                .map(|key| json!({"vaultKey": key, "envVar": format!("P{index}_{}", key.to_uppercase())}))
                .collect();
            config.insert(path.clone(), Value::Array(mappings));
        }
        SecretsFixture {
            config: Value::Object(config),
            stores,
        }
    })
}

/// Generated secrets config and the matching store contents.
#[derive(Debug, Clone)]
pub struct SecretsFixture {
    /// `{path: [{vaultKey, envVar}]}`
    pub config: Value,
    /// Payload stored under each path
    pub stores: BTreeMap<String, BTreeMap<String, String>>,
}

impl SecretsFixture {
    /// Destination to value pairs a successful flat resolution must produce.
    #[must_use]
    pub fn expected(&self) -> BTreeMap<String, String> {
        let mut expected = BTreeMap::new();
        for (index, fields) in self.stores.values().enumerate() {
            for (key, value) in fields {
                expected.insert(format!("P{index}_{}", key.to_uppercase()), value.clone());
            }
        }
        expected
    }
}
