//! Vault error types using thiserror 2.0.
//!
//! Every failure is surfaced to the caller immediately; nothing in this crate
//! retries. [`VaultError::category`] groups the variants into configuration,
//! authentication, lookup and transport failures, and
//! [`VaultError::is_retryable`] tells external callers which ones are
//! transient.

use rust_common::PlatformError;
use std::path::PathBuf;
use thiserror::Error;

/// Vault-specific errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The secrets config document is not valid JSON of the expected shape
    #[error("Invalid secrets config: {0}")]
    InvalidSecretsConfig(#[source] serde_json::Error),

    /// Destination key is not `key` or `parent.child`
    #[error("nested secret key {key} from vault path {path} is not valid")]
    InvalidDestinationKey {
        /// The offending destination key
        key: String,
        /// Vault path the mapping belongs to
        path: String,
    },

    /// A nested destination targets a parent that already holds a plain value
    #[error("nested secret key {key} from vault path {path} conflicts with a plain value")]
    DestinationConflict {
        /// The nested destination key
        key: String,
        /// Vault path the mapping belongs to
        path: String,
    },

    /// Destination or value cannot be exported as an environment variable
    #[error("invalid env var {name}: names must be non-empty without '=' or NUL and values must not contain NUL")]
    InvalidEnvironmentVariable {
        /// The rejected variable name
        name: String,
    },

    /// CA certificate file could not be read
    #[error("unable to read certificate file {}: {source}", .path.display())]
    CertificateFile {
        /// Configured certificate path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Service-account token file could not be read
    #[error("unable to read vault token file {}: {source}", .path.display())]
    TokenFile {
        /// Configured token path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The login round trip against the auth backend failed
    #[error("kubernetes auth against backend {backend} failed: {source}")]
    LoginFailed {
        /// Auth backend mount name
        backend: String,
        /// Failure reported by the store
        #[source]
        source: Box<VaultError>,
    },

    /// Login succeeded but carried no usable client token
    #[error("no client token returned from vault")]
    NoClientToken,

    /// Secret not found
    #[error("no secret found at path: {0}")]
    SecretNotFound(String),

    /// The `data` field of a response is present but not an object
    #[error("unexpected data format in KV v2 response at path: {0}")]
    UnexpectedDataFormat(String),

    /// A declared vault key is missing from the fetched secret
    #[error("key {key} does not exist at vault path {path}")]
    KeyNotFound {
        /// The declared vault key
        key: String,
        /// Vault path that was read
        path: String,
    },

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Rate limited
    #[error("Rate limited")]
    RateLimited,

    /// Vault server unavailable or answered with an unexpected status
    #[error("Vault unavailable: {0}")]
    Unavailable(String),

    /// HTTP transport error
    #[error("request to vault path {path} failed: {source}")]
    Http {
        /// Vault path of the request
        path: String,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Platform error
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Coarse grouping of [`VaultError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed configuration or mapping declarations
    Configuration,
    /// Token file, login round trip or missing client token
    Authentication,
    /// Missing secret, missing key or unexpected response shape
    Lookup,
    /// Network, status and decoding failures
    Transport,
}

impl VaultError {
    /// Check if error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::RateLimited | Self::Http { .. } => true,
            Self::LoginFailed { source, .. } => source.is_retryable(),
            Self::Platform(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Which part of the taxonomy this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig(_)
            | Self::InvalidSecretsConfig(_)
            | Self::InvalidDestinationKey { .. }
            | Self::DestinationConflict { .. }
            | Self::InvalidEnvironmentVariable { .. }
            | Self::CertificateFile { .. } => ErrorCategory::Configuration,
            Self::TokenFile { .. }
            | Self::LoginFailed { .. }
            | Self::NoClientToken => ErrorCategory::Authentication,
            Self::SecretNotFound(_) | Self::UnexpectedDataFormat(_) | Self::KeyNotFound { .. } => {
                ErrorCategory::Lookup
            }
            Self::PermissionDenied(_)
            | Self::RateLimited
            | Self::Unavailable(_)
            | Self::Http { .. }
            | Self::Serialization(_)
            | Self::Platform(_) => ErrorCategory::Transport,
        }
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a secret not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::SecretNotFound(path.into())
    }

    /// Create a key not found error.
    #[must_use]
    pub fn key_not_found(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self::KeyNotFound {
            key: key.into(),
            path: path.into(),
        }
    }

    /// Wrap a store failure raised during login.
    #[must_use]
    pub fn login_failed(backend: impl Into<String>, source: Self) -> Self {
        Self::LoginFailed {
            backend: backend.into(),
            source: Box::new(source),
        }
    }
}
