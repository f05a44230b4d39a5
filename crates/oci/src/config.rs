//! Indexer configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IndexerError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration options for the OCI indexer.
///
/// Fixed once the indexer is constructed.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexerOptions {
    /// Registry host, optionally with a port (e.g. `registry.example.com`)
    pub registry: String,
    /// Repository within the registry (e.g. `packages`)
    pub repository: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Skip TLS certificate verification
    pub insecure: bool,
    /// Use plain HTTP instead of HTTPS
    pub plain_http: bool,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Page size hint for tag listing (`n` query parameter)
    pub page_size: Option<u32>,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            registry: String::new(),
            repository: String::new(),
            username: None,
            password: None,
            insecure: false,
            plain_http: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: None,
        }
    }
}

impl fmt::Debug for IndexerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerOptions")
            .field("registry", &self.registry)
            .field("repository", &self.repository)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("insecure", &self.insecure)
            .field("plain_http", &self.plain_http)
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl IndexerOptions {
    pub fn new(registry: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            repository: repository.into(),
            ..Self::default()
        }
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn plain_http(mut self, plain_http: bool) -> Self {
        self.plain_http = plain_http;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Username/password pair, present only when both halves are non-empty.
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.plain_http { "http" } else { "https" }
    }

    /// Check the fields required before the indexer can become ready.
    pub fn validate(&self) -> Result<()> {
        if self.registry.trim().is_empty() {
            return Err(IndexerError::Config(
                "OCI registry URL is required".to_string(),
            ));
        }

        if self.repository.trim().is_empty() {
            return Err(IndexerError::Config(
                "OCI repository name is required".to_string(),
            ));
        }

        Ok(())
    }
}
