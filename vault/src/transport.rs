//! Vault HTTP API implementation of [`SecretStore`].

use crate::{
    error::{VaultError, VaultResult},
    provider::SecretStore,
    secrets::{ErrorResponse, LogicalResponse},
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Talks to the Vault/OpenBao HTTP API under `{addr}/v1/`.
#[derive(Debug, Clone)]
pub struct HttpSecretStore {
    http: Client,
    base: String,
}

impl HttpSecretStore {
    /// Create a store for the server at `addr` using `http` for requests.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] if `addr` is not a URL.
    pub fn new(addr: &str, http: Client) -> VaultResult<Self> {
        Url::parse(addr)
            .map_err(|e| VaultError::InvalidConfig(format!("invalid vault address {addr}: {e}")))?;
        Ok(Self {
            http,
            base: addr.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base, path.trim_start_matches('/'))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SecretString>,
        body: Option<Value>,
    ) -> VaultResult<Option<LogicalResponse>> {
        let is_read = method == Method::GET;
        let mut request = self
            .http
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");

        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|source| VaultError::Http {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|source| VaultError::Http {
            path: path.to_string(),
            source,
        })?;

        if status.is_success() {
            if status == StatusCode::NO_CONTENT || bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(None);
            }
            let errors = serde_json::from_slice::<ErrorResponse>(&bytes)
                .map(|body| body.errors)
                .unwrap_or_default();
            if !errors.is_empty() {
                warn!(path, ?errors, "vault reported errors in a successful response");
                return Err(VaultError::unavailable(format!(
                    "Errors reported for {path}: {}",
                    errors.join(", ")
                )));
            }
            return serde_json::from_slice(&bytes).map(Some).map_err(VaultError::from);
        }

        let errors = serde_json::from_slice::<ErrorResponse>(&bytes)
            .map(|body| body.errors)
            .unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND if is_read && errors.is_empty() => {
                debug!(path, "nothing stored at path");
                Ok(None)
            }
            StatusCode::FORBIDDEN => {
                warn!(path, ?errors, "vault denied access");
                Err(VaultError::PermissionDenied(path.to_string()))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(VaultError::RateLimited),
            _ => {
                warn!(path, %status, ?errors, "vault returned an error");
                let detail = if errors.is_empty() {
                    String::from_utf8_lossy(&bytes).trim().to_string()
                } else {
                    errors.join(", ")
                };
                Err(VaultError::unavailable(format!("Status {status} for {path}: {detail}")))
            }
        }
    }
}

#[async_trait]
impl SecretStore for HttpSecretStore {
    #[instrument(skip(self, token))]
    async fn read(&self, path: &str, token: &SecretString) -> VaultResult<Option<LogicalResponse>> {
        self.request(Method::GET, path, Some(token), None).await
    }

    #[instrument(skip(self, token, body))]
    async fn write(
        &self,
        path: &str,
        token: Option<&SecretString>,
        body: Value,
    ) -> VaultResult<Option<LogicalResponse>> {
        self.request(Method::POST, path, token, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_utils::fixtures::error_response;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> HttpSecretStore {
        HttpSecretStore::new(&server.uri(), Client::new()).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let store = HttpSecretStore::new("http://vault:8200/", Client::new()).unwrap();
        assert_eq!(store.url("secret/data/app"), "http://vault:8200/v1/secret/data/app");
        assert_eq!(store.url("/auth/k8s/login"), "http://vault:8200/v1/auth/k8s/login");
    }

    #[test]
    fn test_invalid_address() {
        let result = HttpSecretStore::new("vault without scheme", Client::new());
        assert!(matches!(result, Err(VaultError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_read_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/data/app"))
            .and(header("X-Vault-Token", "s.token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"data": {"password": "s3cr3t"}}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = store(&server)
            .read("secret/data/app", &SecretString::from("s.token"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.data.unwrap()["data"]["password"], "s3cr3t");
    }

    #[tokio::test]
    async fn test_read_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(error_response(&[])))
            .mount(&server)
            .await;

        let response = store(&server)
            .read("secret/data/missing", &SecretString::from("t"))
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_write_unauthenticated_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/kubernetes/login"))
            .and(body_json(json!({"jwt": "jwt-value", "role": "app"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"auth": {"client_token": "s.new"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = store(&server)
            .write("auth/kubernetes/login", None, json!({"jwt": "jwt-value", "role": "app"}))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.auth.unwrap().client_token, "s.new");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/forbidden"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(error_response(&["permission denied"])),
            )
            .mount(&server)
            .await;
        Mock::given(path("/v1/busy"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(path("/v1/sealed"))
            .respond_with(ResponseTemplate::new(503).set_body_json(error_response(&["Vault is sealed"])))
            .mount(&server)
            .await;

        let store = store(&server);
        let token = SecretString::from("t");

        assert!(matches!(
            store.read("forbidden", &token).await,
            Err(VaultError::PermissionDenied(_))
        ));
        assert!(matches!(
            store.read("busy", &token).await,
            Err(VaultError::RateLimited)
        ));
        match store.read("sealed", &token).await {
            Err(VaultError::Unavailable(msg)) => assert!(msg.contains("Vault is sealed")),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_errors_in_success_body_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(error_response(&["role not bound"])),
            )
            .mount(&server)
            .await;

        let err = store(&server)
            .write("auth/kubernetes/login", None, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Unavailable(ref msg) if msg.contains("role not bound")));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = store(&server).write("sys/anything", None, json!({})).await.unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let store = HttpSecretStore::new("http://127.0.0.1:1", Client::new()).unwrap();
        let err = store.read("secret/data/app", &SecretString::from("t")).await.unwrap_err();
        assert!(matches!(err, VaultError::Http { .. }));
        assert!(err.is_retryable());
    }
}
