//! Centralized error types shared by the vault secrets crates.
//!
//! Errors raised below the secret-store domain (HTTP client construction,
//! certificate parsing, logging setup) are expressed as [`PlatformError`],
//! with built-in retryability classification for callers that retry.

use thiserror::Error;

/// Common error type for platform operations.
///
/// All errors are classified as either retryable or non-retryable,
/// which helps callers decide whether to retry failed operations.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP request or client construction failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A PEM certificate could not be parsed
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Check if this error is retryable.
    ///
    /// Only HTTP timeouts and connection failures are transient; malformed
    /// input and setup failures fail the same way on every attempt.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// let err = PlatformError::invalid_certificate("not pem");
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::InvalidCertificate(_) | Self::InvalidInput(_) | Self::Internal(_) => false,
        }
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid certificate error with the given message.
    #[must_use]
    pub fn invalid_certificate(msg: impl Into<String>) -> Self {
        Self::InvalidCertificate(msg.into())
    }
}
