//! Plain data shared between the OCI indexer and its consumers.
//!
//! [`PackageDescriptor`] is what the indexer hands out; [`GetOptions`] and
//! [`PackageFilter`] are what a search/serving layer passes back in. The
//! indexer accepts the options but leaves filtering to the caller, which can
//! use [`PackageFilter::matches`].

use semver::Version;
use serde::{Deserialize, Serialize};

/// Version assigned to packages whose tag carries no version part.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Classification given to every package discovered in a registry.
pub const INTEGRATION_TYPE: &str = "integration";

/// One discoverable package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    pub title: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub package_type: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Registry location, `oci://registry/repository:reference`.
    pub base_path: String,
}

impl PackageDescriptor {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }
}

/// Filter criteria a caller may attach to a query.
#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub package_type: Option<String>,
    pub min_version: Option<Version>,
}

impl PackageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_type(mut self, package_type: impl Into<String>) -> Self {
        self.package_type = Some(package_type.into());
        self
    }

    pub fn with_min_version(mut self, version: Version) -> Self {
        self.min_version = Some(version);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.package_type.is_none()
            && self.min_version.is_none()
    }

    /// Check a descriptor against every criterion that is set.
    ///
    /// Name matching is a case-insensitive substring match. A minimum version
    /// excludes packages whose version is not valid semver.
    pub fn matches(&self, package: &PackageDescriptor) -> bool {
        if let Some(name) = &self.name {
            if !package
                .name
                .to_ascii_lowercase()
                .contains(&name.to_ascii_lowercase())
            {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if !package.has_category(category) {
                return false;
            }
        }

        if let Some(package_type) = &self.package_type {
            if package.package_type != *package_type {
                return false;
            }
        }

        if let Some(min_version) = &self.min_version {
            match Version::parse(&package.version) {
                Ok(version) if version >= *min_version => {}
                _ => return false,
            }
        }

        true
    }

    pub fn apply(&self, packages: Vec<PackageDescriptor>) -> Vec<PackageDescriptor> {
        if self.is_empty() {
            return packages;
        }
        packages.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Options passed along with a package query.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub filter: Option<PackageFilter>,
}

impl GetOptions {
    pub fn with_filter(filter: PackageFilter) -> Self {
        Self {
            filter: Some(filter),
        }
    }
}
