//! Package descriptors derived from registry tags.
//!
//! Tags stand in for package identity until artifact manifests are pulled
//! and parsed: `name:version` or just `name`.

use pkgreg_types::{DEFAULT_VERSION, INTEGRATION_TYPE, PackageDescriptor};

use crate::error::SynthesisError;
use crate::reference::RepositoryReference;

/// Category assigned to tag-derived packages.
pub const TAG_CATEGORY: &str = "observability";

/// Split a tag into `(name, version)`.
///
/// The split happens at the first `:`. An empty left part falls back to the
/// whole tag as the name.
pub fn split_tag(tag: &str) -> Result<(&str, &str), SynthesisError> {
    if tag.is_empty() {
        return Err(SynthesisError::EmptyTag);
    }

    match tag.split_once(':') {
        Some((_, "")) => Err(SynthesisError::EmptyVersion(tag.to_string())),
        Some(("", version)) => Ok((tag, version)),
        Some((name, version)) => Ok((name, version)),
        None => Ok((tag, DEFAULT_VERSION)),
    }
}

/// Build the descriptor for one tag.
pub fn synthesize(
    tag: &str,
    reference: &RepositoryReference,
) -> Result<PackageDescriptor, SynthesisError> {
    let (name, version) = split_tag(tag)?;

    Ok(PackageDescriptor {
        name: name.to_string(),
        version: version.to_string(),
        title: Some(format!("Package {}", name)),
        description: format!("Package {} from OCI registry {}", name, reference),
        package_type: INTEGRATION_TYPE.to_string(),
        categories: vec![TAG_CATEGORY.to_string()],
        base_path: reference.base_path(tag),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> RepositoryReference {
        RepositoryReference::new("registry.example.com", "packages").unwrap()
    }

    #[test]
    fn test_name_and_version() {
        let pkg = synthesize("nginx:1.2.0", &reference()).unwrap();
        assert_eq!(pkg.name, "nginx");
        assert_eq!(pkg.version, "1.2.0");
        assert_eq!(pkg.title.as_deref(), Some("Package nginx"));
        assert_eq!(
            pkg.description,
            "Package nginx from OCI registry registry.example.com/packages"
        );
        assert_eq!(pkg.package_type, "integration");
        assert_eq!(pkg.categories, vec!["observability"]);
        assert_eq!(pkg.base_path, "oci://registry.example.com/packages:nginx:1.2.0");
    }

    #[test]
    fn test_default_version() {
        let pkg = synthesize("redis", &reference()).unwrap();
        assert_eq!(pkg.name, "redis");
        assert_eq!(pkg.version, "1.0.0");
        assert_eq!(pkg.base_path, "oci://registry.example.com/packages:redis");
    }

    #[test]
    fn test_version_keeps_everything_after_first_colon() {
        let pkg = synthesize("app:2.0:rc1", &reference()).unwrap();
        assert_eq!(pkg.name, "app");
        assert_eq!(pkg.version, "2.0:rc1");
    }

    #[test]
    fn test_empty_name_uses_whole_tag() {
        let pkg = synthesize(":1.0.0", &reference()).unwrap();
        assert_eq!(pkg.name, ":1.0.0");
        assert_eq!(pkg.version, "1.0.0");
    }

    #[test]
    fn test_rejected_tags() {
        assert_eq!(synthesize("", &reference()), Err(SynthesisError::EmptyTag));
        assert_eq!(
            synthesize("nginx:", &reference()),
            Err(SynthesisError::EmptyVersion("nginx:".to_string()))
        );
        assert_eq!(
            synthesize(":", &reference()),
            Err(SynthesisError::EmptyVersion(":".to_string()))
        );
    }

    #[test]
    fn test_split_matches_first_colon_rule() {
        for tag in ["a", "a:b", "a:b:c", "x-y_z.1", ":v", "name:1.0.0-beta+build"] {
            let (name, version) = split_tag(tag).unwrap();
            match tag.find(':') {
                Some(i) => {
                    let left = &tag[..i];
                    assert_eq!(name, if left.is_empty() { tag } else { left });
                    assert_eq!(version, &tag[i + 1..]);
                }
                None => {
                    assert_eq!(name, tag);
                    assert_eq!(version, DEFAULT_VERSION);
                }
            }
        }
    }
}
