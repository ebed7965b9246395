//! Wire types exchanged with the secret store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Body of a Kubernetes auth login request.
#[derive(Serialize)]
pub struct KubernetesLoginRequest<'a> {
    /// Service-account JWT
    pub jwt: &'a str,
    /// Role bound to the service account
    pub role: &'a str,
}

impl fmt::Debug for KubernetesLoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubernetesLoginRequest")
            .field("jwt", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Envelope of any logical read or write response.
///
/// `data` carries the secret fields for reads (wrapped once more in `data`
/// by KV v2 mounts), `auth` carries the client token for logins. Lease and
/// policy metadata is ignored.
#[derive(Default, Deserialize)]
pub struct LogicalResponse {
    /// Secret payload
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    /// Authentication result
    #[serde(default)]
    pub auth: Option<AuthData>,
}

impl fmt::Debug for LogicalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalResponse")
            .field("data", &self.data.as_ref().map(|data| data.keys().collect::<Vec<_>>()))
            .field("auth", &self.auth)
            .finish()
    }
}

/// Authentication block of a login response.
#[derive(Deserialize)]
pub struct AuthData {
    /// Token to send as `X-Vault-Token`
    #[serde(default)]
    pub client_token: String,
}

impl fmt::Debug for AuthData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthData")
            .field("client_token", &"[REDACTED]")
            .finish()
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    /// Server supplied error messages
    #[serde(default)]
    pub errors: Vec<String>,
}
