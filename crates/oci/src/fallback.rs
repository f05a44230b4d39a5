//! Placeholder package returned when the registry cannot be enumerated.

use pkgreg_types::{DEFAULT_VERSION, INTEGRATION_TYPE, PackageDescriptor};

use crate::reference::RepositoryReference;

pub const FALLBACK_NAME: &str = "oci-mock-package";
pub const FALLBACK_TITLE: &str = "Mock OCI Package";
pub const FALLBACK_REFERENCE: &str = "latest";

// Differs from the tag-derived category; kept until product decides which is right.
pub const FALLBACK_CATEGORY: &str = "web";

/// The single placeholder descriptor for `reference`.
pub fn fallback(reference: &RepositoryReference) -> Vec<PackageDescriptor> {
    vec![PackageDescriptor {
        name: FALLBACK_NAME.to_string(),
        version: DEFAULT_VERSION.to_string(),
        title: Some(FALLBACK_TITLE.to_string()),
        description: format!("Mock package from OCI registry {}", reference),
        package_type: INTEGRATION_TYPE.to_string(),
        categories: vec![FALLBACK_CATEGORY.to_string()],
        base_path: reference.base_path(FALLBACK_REFERENCE),
    }]
}
