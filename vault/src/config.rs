//! Vault client configuration.
//!
//! Loaded once at startup, usually from the process environment, and read
//! only afterwards.

use crate::error::{VaultError, VaultResult};
use crate::mapping::SecretsConfig;
use rust_common::HttpConfig;
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Skip secret resolution entirely when `true`.
pub const ENV_DISABLED: &str = "VAULT_DISABLED";
/// Store address.
pub const ENV_SERVER: &str = "VAULT_SERVER";
/// Store address, consulted when [`ENV_SERVER`] is unset.
pub const ENV_URL: &str = "VAULT_URL";
/// Store address, consulted when neither [`ENV_SERVER`] nor [`ENV_URL`] is set.
pub const ENV_ADDR: &str = "VAULT_ADDR";
/// PEM CA certificate trusted for the store connection.
pub const ENV_CERTIFICATE_FILE_PATH: &str = "VAULT_CERTIFICATE_FILE_PATH";
/// Static token; bypasses Kubernetes login when set.
pub const ENV_AUTH_TOKEN: &str = "VAULT_AUTH_TOKEN";
/// Role used for Kubernetes login.
pub const ENV_AUTH_KUBERNETES_ROLE: &str = "VAULT_AUTH_KUBERNETES_ROLE";
/// Service-account JWT file.
pub const ENV_AUTH_KUBERNETES_TOKEN_PATH: &str = "VAULT_AUTH_KUBERNETES_TOKEN_PATH";
/// Mount name of the Kubernetes auth backend.
pub const ENV_AUTH_KUBERNETES_BACKEND: &str = "VAULT_AUTH_KUBERNETES_BACKEND";
/// JSON secrets config document.
pub const ENV_SECRETS_CONFIG: &str = "VAULT_SECRETS_CONFIG";
/// Per-request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "VAULT_TIMEOUT_SECS";

const DEFAULT_SERVER: &str = "http://localhost";
const DEFAULT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const DEFAULT_BACKEND: &str = "kubernetes";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Vault client configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Skip secret resolution entirely
    pub disabled: bool,
    /// Vault server address
    pub addr: String,
    /// PEM CA certificate to trust
    pub ca_certificate_path: Option<PathBuf>,
    /// Static auth token
    pub auth_token: Option<SecretString>,
    /// Kubernetes auth role name
    pub role: String,
    /// Service account token path
    pub token_path: PathBuf,
    /// Kubernetes auth backend mount name
    pub auth_backend: String,
    /// Paths and keys to resolve
    pub secrets: SecretsConfig,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            addr: DEFAULT_SERVER.to_string(),
            ca_certificate_path: None,
            auth_token: None,
            role: String::new(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            auth_backend: DEFAULT_BACKEND.to_string(),
            secrets: SecretsConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl VaultConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(addr: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`VaultConfig::from_lookup`].
    pub fn from_env() -> VaultResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] for unparseable values and an
    /// invalid address, and [`VaultError::InvalidSecretsConfig`] for a
    /// malformed secrets config document.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> VaultResult<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            disabled: get(ENV_DISABLED)
                .map(|v| parse_bool(ENV_DISABLED, &v))
                .transpose()?
                .unwrap_or(defaults.disabled),
            addr: get(ENV_SERVER)
                .or_else(|| get(ENV_URL))
                .or_else(|| get(ENV_ADDR))
                .unwrap_or(defaults.addr),
            ca_certificate_path: get(ENV_CERTIFICATE_FILE_PATH).map(PathBuf::from),
            auth_token: get(ENV_AUTH_TOKEN).map(SecretString::from),
            role: get(ENV_AUTH_KUBERNETES_ROLE).unwrap_or(defaults.role),
            token_path: get(ENV_AUTH_KUBERNETES_TOKEN_PATH)
                .map_or(defaults.token_path, PathBuf::from),
            auth_backend: get(ENV_AUTH_KUBERNETES_BACKEND).unwrap_or(defaults.auth_backend),
            secrets: get(ENV_SECRETS_CONFIG)
                .map(|v| SecretsConfig::parse(&v))
                .transpose()?
                .unwrap_or(defaults.secrets),
            timeout: get(ENV_TIMEOUT_SECS)
                .map(|v| parse_secs(ENV_TIMEOUT_SECS, &v))
                .transpose()?
                .unwrap_or(defaults.timeout),
        };

        if !config.disabled {
            config.validate()?;
        }
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> VaultResult<()> {
        let url = Url::parse(&self.addr)
            .map_err(|e| VaultError::InvalidConfig(format!("invalid vault address {}: {e}", self.addr)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(VaultError::InvalidConfig(format!(
                "vault address {} must use http or https",
                self.addr
            )));
        }
        if self.auth_token.is_none() && self.auth_backend.trim().is_empty() {
            return Err(VaultError::InvalidConfig(
                "kubernetes auth backend is required when no auth token is set".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(VaultError::InvalidConfig("timeout must be greater than 0".to_string()));
        }
        self.secrets.validate()
    }

    /// Use a static token instead of Kubernetes login; empty clears it.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.is_empty()).then(|| SecretString::from(token));
        self
    }

    /// Set the service account token path.
    #[must_use]
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Set the Kubernetes auth backend mount name.
    #[must_use]
    pub fn with_auth_backend(mut self, backend: impl Into<String>) -> Self {
        self.auth_backend = backend.into();
        self
    }

    /// Set the paths and keys to resolve.
    #[must_use]
    pub fn with_secrets(mut self, secrets: SecretsConfig) -> Self {
        self.secrets = secrets;
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Trust the PEM CA certificate at `path`.
    #[must_use]
    pub fn with_ca_certificate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_certificate_path = Some(path.into());
        self
    }

    /// HTTP client settings, loading the CA certificate if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::CertificateFile`] if the certificate cannot be read.
    pub fn http_config(&self) -> VaultResult<HttpConfig> {
        let http = HttpConfig::default().with_timeout(self.timeout);
        match &self.ca_certificate_path {
            Some(path) => {
                let pem = std::fs::read(path).map_err(|source| VaultError::CertificateFile {
                    path: path.clone(),
                    source,
                })?;
                Ok(http.with_ca_certificate(pem))
            }
            None => Ok(http),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> VaultResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(VaultError::InvalidConfig(format!(
            "failed to parse {name}: {other} is not a boolean"
        ))),
    }
}

fn parse_secs(name: &str, value: &str) -> VaultResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| VaultError::InvalidConfig(format!("failed to parse {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();
        assert_eq!(config.addr, "http://localhost");
        assert_eq!(
            config.token_path,
            PathBuf::from("/var/run/secrets/kubernetes.io/serviceaccount/token")
        );
        assert_eq!(config.auth_backend, "kubernetes");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.secrets.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = VaultConfig::from_lookup(lookup(&[
            (ENV_SERVER, "https://vault.example.com:8200"),
            (ENV_AUTH_KUBERNETES_ROLE, "my-app"),
            (ENV_AUTH_KUBERNETES_BACKEND, "k8s-prod"),
            (ENV_AUTH_KUBERNETES_TOKEN_PATH, "/tmp/token"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_SECRETS_CONFIG, r#"{"secret/data/app": [{"vaultKey": "password"}]}"#),
        ]))
        .unwrap();

        assert_eq!(config.addr, "https://vault.example.com:8200");
        assert_eq!(config.role, "my-app");
        assert_eq!(config.auth_backend, "k8s-prod");
        assert_eq!(config.token_path, PathBuf::from("/tmp/token"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.secrets.len(), 1);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_server_falls_back_to_vault_addr() {
        let config = VaultConfig::from_lookup(lookup(&[(ENV_ADDR, "http://bao:8200")])).unwrap();
        assert_eq!(config.addr, "http://bao:8200");

        let config = VaultConfig::from_lookup(lookup(&[
            (ENV_ADDR, "http://bao:8200"),
            (ENV_SERVER, "http://vault:8200"),
        ]))
        .unwrap();
        assert_eq!(config.addr, "http://vault:8200");

        let config =
            VaultConfig::from_lookup(lookup(&[(ENV_URL, "https://vault.prod:8200")])).unwrap();
        assert_eq!(config.addr, "https://vault.prod:8200");

        let config = VaultConfig::from_lookup(lookup(&[
            (ENV_ADDR, "http://bao:8200"),
            (ENV_URL, "https://vault.prod:8200"),
        ]))
        .unwrap();
        assert_eq!(config.addr, "https://vault.prod:8200");

        let config = VaultConfig::from_lookup(lookup(&[
            (ENV_URL, "https://vault.prod:8200"),
            (ENV_SERVER, "http://vault:8200"),
        ]))
        .unwrap();
        assert_eq!(config.addr, "http://vault:8200");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = VaultConfig::from_lookup(lookup(&[
            (ENV_AUTH_TOKEN, ""),
            (ENV_SECRETS_CONFIG, "  "),
        ]))
        .unwrap();

        assert!(config.auth_token.is_none());
        assert!(config.secrets.is_empty());
    }

    #[test]
    fn test_static_token_is_redacted() {
        let config = VaultConfig::from_lookup(lookup(&[(ENV_AUTH_TOKEN, "hvs.super-secret")])).unwrap();

        let token = config.auth_token.as_ref().map(|t| t.expose_secret().to_string());
        assert_eq!(token.as_deref(), Some("hvs.super-secret"));
        assert!(!format!("{config:?}").contains("hvs.super-secret"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            VaultConfig::from_lookup(lookup(&[(ENV_DISABLED, "maybe")])),
            Err(VaultError::InvalidConfig(_))
        ));
        assert!(matches!(
            VaultConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "ten")])),
            Err(VaultError::InvalidConfig(_))
        ));
        assert!(matches!(
            VaultConfig::from_lookup(lookup(&[(ENV_SERVER, "not a url")])),
            Err(VaultError::InvalidConfig(_))
        ));
        assert!(matches!(
            VaultConfig::from_lookup(lookup(&[(ENV_SECRETS_CONFIG, "{\"p\": 1}")])),
            Err(VaultError::InvalidSecretsConfig(_))
        ));
    }

    #[test]
    fn test_disabled_skips_validation() {
        let config = VaultConfig::from_lookup(lookup(&[
            (ENV_DISABLED, "true"),
            (ENV_SERVER, "ftp://nowhere"),
        ]))
        .unwrap();
        assert!(config.disabled);
    }

    #[test]
    fn test_backend_required_without_token() {
        let config = VaultConfig::default().with_auth_backend("");
        assert!(matches!(config.validate(), Err(VaultError::InvalidConfig(_))));

        let config = config.with_auth_token("root");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_static_token_clears() {
        let config = VaultConfig::default().with_auth_token("root").with_auth_token("");
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_http_config_missing_certificate() {
        let config = VaultConfig::default().with_ca_certificate_path("/definitely/not/here.pem");
        assert!(matches!(
            config.http_config(),
            Err(VaultError::CertificateFile { .. })
        ));
    }

    #[test]
    fn test_http_config_timeout() {
        let http = VaultConfig::default()
            .with_timeout(Duration::from_secs(3))
            .http_config()
            .unwrap();
        assert_eq!(http.timeout, Duration::from_secs(3));
        assert!(http.ca_certificate.is_none());
    }
}
