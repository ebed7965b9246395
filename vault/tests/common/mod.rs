//! In-memory secret store shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vault_secrets::{LogicalResponse, SecretStore, VaultError, VaultResult};

/// Login answer configured on a [`MemoryStore`].
#[derive(Debug, Clone)]
pub enum Login {
    /// Return this client token
    Token(String),
    /// Fail with a retryable store error
    Fail,
}

/// Records every call and serves payloads from memory.
pub struct MemoryStore {
    payloads: Mutex<HashMap<String, Value>>,
    login: Mutex<Login>,
    login_delay: Duration,
    logins: AtomicUsize,
    reads: Mutex<Vec<String>>,
    read_tokens: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(login: Login) -> Self {
        Self {
            payloads: Mutex::new(HashMap::new()),
            login: Mutex::new(login),
            login_delay: Duration::ZERO,
            logins: AtomicUsize::new(0),
            reads: Mutex::new(Vec::new()),
            read_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub fn with_payload(self, path: &str, payload: Value) -> Self {
        self.payloads.lock().unwrap().insert(path.to_string(), payload);
        self
    }

    pub fn set_login(&self, login: Login) {
        *self.login.lock().unwrap() = login;
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub fn read_tokens(&self) -> Vec<String> {
        self.read_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn read(&self, path: &str, token: &SecretString) -> VaultResult<Option<LogicalResponse>> {
        self.reads.lock().unwrap().push(path.to_string());
        self.read_tokens
            .lock()
            .unwrap()
            .push(token.expose_secret().to_string());

        let payload = self.payloads.lock().unwrap().get(path).cloned();
        match payload {
            Some(payload) => Ok(Some(serde_json::from_value(payload)?)),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        _path: &str,
        _token: Option<&SecretString>,
        _body: Value,
    ) -> VaultResult<Option<LogicalResponse>> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        let login = self.login.lock().unwrap().clone();
        match login {
            Login::Token(token) => Ok(Some(serde_json::from_value(
                test_utils::fixtures::kubernetes_login_response(&token),
            )?)),
            Login::Fail => Err(VaultError::unavailable("login backend down")),
        }
    }
}

/// Service-account token file holding `jwt`.
pub fn token_file(jwt: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{jwt}").unwrap();
    file
}
