//! Secret reads and response normalization.

use crate::{
    error::{VaultError, VaultResult},
    provider::SecretStore,
};
use secrecy::SecretString;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Read the secret at `path` and flatten it into string fields.
///
/// # Errors
///
/// [`VaultError::SecretNotFound`] when nothing is stored at `path`,
/// [`VaultError::UnexpectedDataFormat`] when the payload has a non-object
/// `data` field, and any transport error from `store`.
#[instrument(skip(store, token))]
pub async fn fetch_secrets<S>(
    store: &S,
    token: &SecretString,
    path: &str,
) -> VaultResult<HashMap<String, String>>
where
    S: SecretStore + ?Sized,
{
    info!("querying vault for secrets at {path}");

    let response = store
        .read(path, token)
        .await?
        .ok_or_else(|| VaultError::not_found(path))?;

    normalize_secret_data(path, response.data.unwrap_or_default())
}

/// Unwrap an optional KV v2 `data` envelope and stringify every value.
///
/// Strings pass through untouched; every other value is rendered as compact
/// JSON (`42`, `true`, `null`, `["a"]`).
///
/// # Errors
///
/// [`VaultError::UnexpectedDataFormat`] when `data` is present but not an
/// object.
pub fn normalize_secret_data(
    path: &str,
    mut data: Map<String, Value>,
) -> VaultResult<HashMap<String, String>> {
    let fields = match data.remove("data") {
        Some(Value::Object(inner)) => inner,
        Some(_) => return Err(VaultError::UnexpectedDataFormat(path.to_string())),
        None => data,
    };

    Ok(fields
        .into_iter()
        .map(|(key, value)| (key, stringify(value)))
        .collect())
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_flat_response() {
        let fields = normalize_secret_data("p", object(json!({"password": "s3cr3t"}))).unwrap();
        assert_eq!(fields.get("password").map(String::as_str), Some("s3cr3t"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_kv2_envelope_matches_flat() {
        let flat = normalize_secret_data("p", object(json!({"password": "s3cr3t"}))).unwrap();
        let wrapped = normalize_secret_data(
            "p",
            object(json!({"data": {"password": "s3cr3t"}, "metadata": {"version": 2}})),
        )
        .unwrap();

        assert_eq!(flat, wrapped);
    }

    #[test]
    fn test_scalars_are_stringified() {
        let fields = normalize_secret_data(
            "p",
            object(json!({"port": 5432, "ratio": 0.5, "enabled": true, "unset": null, "hosts": ["a", "b"]})),
        )
        .unwrap();

        assert_eq!(fields["port"], "5432");
        assert_eq!(fields["ratio"], "0.5");
        assert_eq!(fields["enabled"], "true");
        assert_eq!(fields["unset"], "null");
        assert_eq!(fields["hosts"], r#"["a","b"]"#);
    }

    #[test]
    fn test_non_object_data_is_rejected() {
        for data in [json!("oops"), json!(["a"]), json!(null), json!(1)] {
            let result = normalize_secret_data("secret/app", object(json!({"data": data})));
            assert!(matches!(result, Err(VaultError::UnexpectedDataFormat(ref p)) if p == "secret/app"));
        }
    }

    #[test]
    fn test_empty_payload() {
        let fields = normalize_secret_data("p", Map::new()).unwrap();
        assert!(fields.is_empty());
    }
}
