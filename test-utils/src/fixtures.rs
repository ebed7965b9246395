//! Sample store payloads.
//!
//! Shapes follow what the HTTP API returns for logical reads and logins.

use serde_json::{Value, json};

/// Client token handed out by [`kubernetes_login_response`].
pub const SAMPLE_CLIENT_TOKEN: &str = "hvs.CAESIJ-sample-client-token";

/// Service-account JWT used by login tests.
pub const SAMPLE_JWT: &str = "eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJzeXN0ZW06c2VydmljZWFjY291bnQ6YXBwOmFwaSJ9.c2ln";

/// KV v1 read: fields sit directly under `data`.
#[must_use]
pub fn kv1_read_response(fields: &Value) -> Value {
    json!({
        "request_id": "3c5a1d24-0f8e-4b7a-9c55-6f1b0e2a7d10",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 2_764_800,
        "data": fields,
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// KV v2 read: fields are wrapped in a second `data` object next to
/// `metadata`.
#[must_use]
pub fn kv2_read_response(fields: &Value) -> Value {
    json!({
        "request_id": "8d2f6e91-5b3c-4a0d-b7e4-1a9c3f5d2e80",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": {
            "data": fields,
            "metadata": {
                "created_time": "2024-05-02T09:14:11.521Z",
                "custom_metadata": null,
                "deletion_time": "",
                "destroyed": false,
                "version": 3
            }
        },
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Successful Kubernetes login carrying `client_token`.
#[must_use]
pub fn kubernetes_login_response(client_token: &str) -> Value {
    json!({
        "request_id": "f41d0c7b-2e6a-4c93-8a15-0b7d9e3c6f22",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": null,
        "wrap_info": null,
        "warnings": null,
        "auth": {
            "client_token": client_token,
            "accessor": "hmac-sha256:sample-accessor",
            "policies": ["default", "app-read"],
            "token_policies": ["default", "app-read"],
            "metadata": {
                "role": "app",
                "service_account_name": "api",
                "service_account_namespace": "app"
            },
            "lease_duration": 3600,
            "renewable": true,
            "entity_id": "b0e1c2d3-0000-4000-8000-000000000001",
            "token_type": "service",
            "orphan": true
        }
    })
}

/// Login answered without an `auth` block.
#[must_use]
pub fn login_response_without_auth() -> Value {
    json!({
        "request_id": "0a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d",
        "data": null,
        "auth": null,
        "warnings": ["role has no bound policies"]
    })
}

/// Error body with the given messages.
#[must_use]
pub fn error_response(errors: &[&str]) -> Value {
    json!({ "errors": errors })
}
