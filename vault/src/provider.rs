//! Remote key-value read/write capability the client is built on.

use crate::error::VaultResult;
use crate::secrets::LogicalResponse;
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;

/// Logical read/write access to a secret store.
///
/// Implementations map paths onto the store's API (for HTTP: `/v1/{path}`)
/// and surface store failures as [`crate::VaultError`]. They never retry and
/// never re-authenticate on their own.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read `path`. `Ok(None)` when nothing exists at the path.
    async fn read(&self, path: &str, token: &SecretString) -> VaultResult<Option<LogicalResponse>>;

    /// Write `body` to `path`, unauthenticated when `token` is `None`.
    async fn write(
        &self,
        path: &str,
        token: Option<&SecretString>,
        body: Value,
    ) -> VaultResult<Option<LogicalResponse>>;
}

#[async_trait]
impl<S: SecretStore + ?Sized> SecretStore for Arc<S> {
    async fn read(&self, path: &str, token: &SecretString) -> VaultResult<Option<LogicalResponse>> {
        (**self).read(path, token).await
    }

    async fn write(
        &self,
        path: &str,
        token: Option<&SecretString>,
        body: Value,
    ) -> VaultResult<Option<LogicalResponse>> {
        (**self).write(path, token, body).await
    }
}
