//! Tag enumeration against an OCI registry.
//!
//! The indexer only depends on [`TagLister`]. [`RegistryClient`] is the HTTP
//! implementation speaking the OCI distribution tag-list endpoint.

pub mod auth;
pub mod client;

use async_trait::async_trait;

use crate::error::RegistryError;

pub use client::RegistryClient;

/// Lists the tags of one repository.
///
/// Implementations hold no mutable state; the result reflects registry state
/// at call time, in registry order.
#[async_trait]
pub trait TagLister: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError>;
}
