//! pkgreg OCI - package discovery from OCI registry tags
//!
//! Lists the tags of one registry repository and turns each tag into a
//! [`PackageDescriptor`](pkgreg_types::PackageDescriptor). When the registry
//! cannot be listed, or yields nothing usable, a single placeholder package is
//! returned instead so the read path never fails.
//!
//! # Example
//!
//! ```no_run
//! use pkgreg_oci::{IndexerOptions, OciIndexer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = IndexerOptions::new("registry.example.com", "packages")
//!     .credentials("user", "secret");
//!
//! let indexer = OciIndexer::new(options);
//! indexer.init().await?;
//!
//! let outcome = indexer.query(None).await?;
//! if let Some(cause) = outcome.cause() {
//!     eprintln!("serving placeholder data: {}", cause);
//! }
//! for pkg in outcome.packages() {
//!     println!("{}@{} -> {}", pkg.name, pkg.version, pkg.base_path);
//! }
//!
//! indexer.close().await?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod error;
pub mod fallback;
pub mod indexer;
pub mod reference;
pub mod registry;
pub mod synthesize;

pub use config::IndexerOptions;
pub use error::{IndexerError, RegistryError, Result, SynthesisError};
pub use fallback::fallback;
pub use indexer::{
    DegradedCause, IndexerState, OciIndexer, OciIndexerBuilder, QueryOutcome, SkippedTag,
};
pub use reference::RepositoryReference;
pub use registry::{RegistryClient, TagLister};
pub use synthesize::synthesize;

pub use pkgreg_types::{GetOptions, PackageDescriptor, PackageFilter};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
