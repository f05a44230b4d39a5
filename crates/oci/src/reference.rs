//! Validated `registry/repository` pairs.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{IndexerError, Result};

/// Scheme used in package base paths.
pub const BASE_PATH_SCHEME: &str = "oci";

static REPOSITORY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:\.|_|__|-+)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:\.|_|__|-+)[a-z0-9]+)*)*$")
        .expect("repository pattern is valid")
});

/// A registry host paired with a repository path inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    registry: String,
    repository: String,
}

impl RepositoryReference {
    /// Parse and validate a registry/repository pair.
    ///
    /// The registry must be a bare `host[:port]`; the repository must follow
    /// the OCI distribution name grammar.
    pub fn new(registry: &str, repository: &str) -> Result<Self> {
        let combined = format!("{}/{}", registry, repository);
        let fail = |reason: String| IndexerError::Connection {
            reference: combined.clone(),
            reason,
        };

        if registry.contains("://") || registry.contains('/') {
            return Err(fail(format!(
                "registry '{}' must be a host with an optional port",
                registry
            )));
        }

        let url = Url::parse(&format!("https://{}/", registry))
            .map_err(|e| fail(format!("invalid registry '{}': {}", registry, e)))?;

        // Anything past `host[:port]` would leak into base paths.
        if url.host_str().is_none()
            || !url.username().is_empty()
            || url.password().is_some()
            || url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(fail(format!("invalid registry '{}'", registry)));
        }

        if !REPOSITORY_PATTERN.is_match(repository) {
            return Err(fail(format!("invalid repository name '{}'", repository)));
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
        })
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// `oci://registry/repository:reference`
    pub fn base_path(&self, reference: &str) -> String {
        format!(
            "{}://{}/{}:{}",
            BASE_PATH_SCHEME, self.registry, self.repository, reference
        )
    }

    /// Root URL of the registry API for the given scheme.
    pub fn api_base(&self, scheme: &str) -> Result<Url> {
        Url::parse(&format!("{}://{}/", scheme, self.registry)).map_err(|e| {
            IndexerError::Connection {
                reference: self.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)
    }
}
