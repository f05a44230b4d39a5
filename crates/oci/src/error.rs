use thiserror::Error;

use crate::indexer::IndexerState;

/// Errors surfaced by the indexer lifecycle.
///
/// Only `init` and calls made in the wrong state produce these; failures on
/// the read path are folded into [`crate::QueryOutcome::Degraded`].
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to create repository reference {reference}: {reason}")]
    Connection { reference: String, reason: String },

    #[error("OCI indexer not initialized (state: {state})")]
    NotInitialized { state: IndexerState },

    #[error("OCI indexer is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, IndexerError>;

impl IndexerError {
    pub fn is_config_error(&self) -> bool {
        matches!(self, IndexerError::Config(_))
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, IndexerError::Connection { .. })
    }
}

/// Tag enumeration failures.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to registry timed out")]
    Timeout,

    #[error("Registry denied access: {0}")]
    Unauthorized(String),

    #[error("Repository '{0}' not found in registry")]
    RepositoryNotFound(String),

    #[error("Registry does not support tag listing: {0}")]
    Unsupported(String),

    #[error("Registry responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl RegistryError {
    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RegistryError::Network(_) => true,
            RegistryError::Timeout => true,
            RegistryError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, RegistryError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RegistryError::Timeout
        } else if err.is_decode() {
            RegistryError::Protocol(err.to_string())
        } else {
            RegistryError::Network(err.to_string())
        }
    }
}

/// Per-tag conversion failures. The tag is skipped, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Tag is empty")]
    EmptyTag,

    #[error("Tag '{0}' has an empty version after ':'")]
    EmptyVersion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(RegistryError::Timeout.is_recoverable());
        assert!(RegistryError::Network("reset".into()).is_recoverable());
        assert!(
            RegistryError::Status {
                status: 503,
                message: "Service Unavailable".into()
            }
            .is_recoverable()
        );
        assert!(!RegistryError::Unauthorized("HTTP 401".into()).is_recoverable());
        assert!(!RegistryError::Unsupported("HTTP 405".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = IndexerError::NotInitialized {
            state: IndexerState::Closed,
        };
        assert_eq!(err.to_string(), "OCI indexer not initialized (state: closed)");

        let err = SynthesisError::EmptyVersion("nginx:".into());
        assert_eq!(err.to_string(), "Tag 'nginx:' has an empty version after ':'");
    }
}
