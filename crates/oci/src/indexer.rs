//! The OCI indexer: lifecycle plus the query path.
//!
//! ```text
//! Uninitialized --init(ok)--> Ready --close--> Closed
//! ```
//!
//! A failed `init` leaves the indexer where it was. `close` is accepted in
//! every state. Queries run only while ready and never fail because of the
//! registry: enumeration errors and empty results are answered with the
//! placeholder package and reported as [`QueryOutcome::Degraded`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pkgreg_types::{GetOptions, PackageDescriptor};
use tokio::sync::RwLock;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, debug, error, info, warn};

use crate::config::IndexerOptions;
use crate::error::{IndexerError, RegistryError, Result, SynthesisError};
use crate::fallback::fallback;
use crate::reference::RepositoryReference;
use crate::registry::{RegistryClient, TagLister};
use crate::synthesize::synthesize;

/// Observable lifecycle state of an indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerState {
    Uninitialized,
    Ready,
    Closed,
}

impl fmt::Display for IndexerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexerState::Uninitialized => "uninitialized",
            IndexerState::Ready => "ready",
            IndexerState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A tag that could not be turned into a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTag {
    pub tag: String,
    pub error: SynthesisError,
}

/// Why a query answered with the placeholder package.
#[derive(Debug)]
pub enum DegradedCause {
    /// The registry could not be enumerated.
    Enumeration(RegistryError),
    /// Enumeration worked but produced no usable tag.
    NoUsableTags { skipped: Vec<SkippedTag> },
}

impl fmt::Display for DegradedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedCause::Enumeration(err) => write!(f, "tag enumeration failed: {}", err),
            DegradedCause::NoUsableTags { skipped } if skipped.is_empty() => {
                f.write_str("registry returned no tags")
            }
            DegradedCause::NoUsableTags { skipped } => {
                write!(f, "none of the {} registry tags were usable", skipped.len())
            }
        }
    }
}

/// Result of a query. Both variants carry at least one package.
#[derive(Debug)]
pub enum QueryOutcome {
    Complete {
        packages: Vec<PackageDescriptor>,
        skipped: Vec<SkippedTag>,
    },
    Degraded {
        packages: Vec<PackageDescriptor>,
        cause: DegradedCause,
    },
}

impl QueryOutcome {
    pub fn packages(&self) -> &[PackageDescriptor] {
        match self {
            QueryOutcome::Complete { packages, .. } | QueryOutcome::Degraded { packages, .. } => {
                packages
            }
        }
    }

    pub fn into_packages(self) -> Vec<PackageDescriptor> {
        match self {
            QueryOutcome::Complete { packages, .. } | QueryOutcome::Degraded { packages, .. } => {
                packages
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, QueryOutcome::Degraded { .. })
    }

    pub fn cause(&self) -> Option<&DegradedCause> {
        match self {
            QueryOutcome::Degraded { cause, .. } => Some(cause),
            QueryOutcome::Complete { .. } => None,
        }
    }

    /// Tags dropped during synthesis, whichever variant this is.
    pub fn skipped(&self) -> &[SkippedTag] {
        match self {
            QueryOutcome::Complete { skipped, .. } => skipped,
            QueryOutcome::Degraded {
                cause: DegradedCause::NoUsableTags { skipped },
                ..
            } => skipped,
            QueryOutcome::Degraded { .. } => &[],
        }
    }
}

#[derive(Clone)]
struct ReadyHandle {
    reference: RepositoryReference,
    lister: Arc<dyn TagLister>,
}

enum Lifecycle {
    Uninitialized,
    Ready(ReadyHandle),
    Closed,
}

impl Lifecycle {
    fn state(&self) -> IndexerState {
        match self {
            Lifecycle::Uninitialized => IndexerState::Uninitialized,
            Lifecycle::Ready(_) => IndexerState::Ready,
            Lifecycle::Closed => IndexerState::Closed,
        }
    }
}

/// Builder for [`OciIndexer`].
pub struct OciIndexerBuilder {
    options: IndexerOptions,
    lister: Option<Arc<dyn TagLister>>,
    dispatch: Option<Dispatch>,
}

impl OciIndexerBuilder {
    pub fn new(options: IndexerOptions) -> Self {
        Self {
            options,
            lister: None,
            dispatch: None,
        }
    }

    /// Use this enumerator instead of an HTTP client built at `init`.
    pub fn tag_lister(mut self, lister: Arc<dyn TagLister>) -> Self {
        self.lister = Some(lister);
        self
    }

    /// Send the indexer's log events to this dispatcher.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn build(self) -> OciIndexer {
        let dispatch = self
            .dispatch
            .unwrap_or_else(|| tracing::dispatcher::get_default(Dispatch::clone));

        OciIndexer {
            options: self.options,
            lister: self.lister,
            dispatch,
            lifecycle: RwLock::new(Lifecycle::Uninitialized),
        }
    }
}

/// Indexer that reads packages from the tags of one OCI repository.
pub struct OciIndexer {
    options: IndexerOptions,
    lister: Option<Arc<dyn TagLister>>,
    dispatch: Dispatch,
    lifecycle: RwLock<Lifecycle>,
}

impl OciIndexer {
    pub fn new(options: IndexerOptions) -> Self {
        OciIndexerBuilder::new(options).build()
    }

    pub fn builder(options: IndexerOptions) -> OciIndexerBuilder {
        OciIndexerBuilder::new(options)
    }

    pub fn options(&self) -> &IndexerOptions {
        &self.options
    }

    pub async fn state(&self) -> IndexerState {
        self.lifecycle.read().await.state()
    }

    /// The validated reference, once initialized.
    pub async fn reference(&self) -> Option<RepositoryReference> {
        match &*self.lifecycle.read().await {
            Lifecycle::Ready(handle) => Some(handle.reference.clone()),
            _ => None,
        }
    }

    /// Validate the configuration and prepare the registry handle.
    pub async fn init(&self) -> Result<()> {
        self.init_inner().with_subscriber(self.dispatch.clone()).await
    }

    async fn init_inner(&self) -> Result<()> {
        info!(
            registry = %self.options.registry,
            repository = %self.options.repository,
            "Initializing OCI indexer"
        );

        let mut lifecycle = self.lifecycle.write().await;
        if let Lifecycle::Closed = *lifecycle {
            return Err(IndexerError::Closed);
        }

        self.options.validate()?;
        let reference = RepositoryReference::new(&self.options.registry, &self.options.repository)?;

        let lister: Arc<dyn TagLister> = match &self.lister {
            Some(lister) => Arc::clone(lister),
            None => Arc::new(RegistryClient::new(reference.clone(), &self.options)?),
        };

        if self.options.basic_credentials().is_some() {
            debug!("Authentication configured for OCI registry");
        }

        if self.options.insecure {
            warn!(
                registry = %reference.registry(),
                "TLS certificate verification disabled for OCI registry"
            );
        }

        *lifecycle = Lifecycle::Ready(ReadyHandle { reference, lister });
        info!("OCI indexer initialized successfully");
        Ok(())
    }

    /// Retrieve packages from the registry.
    ///
    /// Filters in `options` are accepted but not applied here.
    pub async fn query(&self, options: Option<&GetOptions>) -> Result<QueryOutcome> {
        self.run_query(options, None)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    /// Like [`query`](Self::query), with tag enumeration bounded by `deadline`.
    pub async fn query_with_deadline(
        &self,
        options: Option<&GetOptions>,
        deadline: Duration,
    ) -> Result<QueryOutcome> {
        self.run_query(options, Some(deadline))
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn run_query(
        &self,
        options: Option<&GetOptions>,
        deadline: Option<Duration>,
    ) -> Result<QueryOutcome> {
        debug!("Getting packages from OCI registry");

        let handle = match &*self.lifecycle.read().await {
            Lifecycle::Ready(handle) => handle.clone(),
            other => {
                let state = other.state();
                error!(%state, "Query on OCI indexer that is not ready");
                return Err(IndexerError::NotInitialized { state });
            }
        };

        if options
            .and_then(|o| o.filter.as_ref())
            .is_some_and(|f| !f.is_empty())
        {
            debug!("Filter supplied; filtering is left to the caller");
        }

        let listing = handle.lister.list_tags();
        let listed = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, listing)
                .await
                .unwrap_or(Err(RegistryError::Timeout)),
            None => listing.await,
        };

        let tags = match listed {
            Ok(tags) => tags,
            Err(err) => {
                warn!(
                    error = %err,
                    reference = %handle.reference,
                    "Failed to list tags from OCI registry, returning mock package"
                );
                return Ok(QueryOutcome::Degraded {
                    packages: fallback(&handle.reference),
                    cause: DegradedCause::Enumeration(err),
                });
            }
        };

        let mut packages = Vec::with_capacity(tags.len());
        let mut skipped = Vec::new();

        for tag in tags {
            debug!(tag = %tag, "Processing tag");
            match synthesize(&tag, &handle.reference) {
                Ok(package) => packages.push(package),
                Err(error) => {
                    warn!(tag = %tag, error = %error, "Failed to get package from tag");
                    skipped.push(SkippedTag { tag, error });
                }
            }
        }

        if packages.is_empty() {
            info!(
                skipped = skipped.len(),
                "No packages found in OCI registry tags, returning mock package"
            );
            return Ok(QueryOutcome::Degraded {
                packages: fallback(&handle.reference),
                cause: DegradedCause::NoUsableTags { skipped },
            });
        }

        info!(count = packages.len(), "Retrieved packages from OCI registry");
        Ok(QueryOutcome::Complete { packages, skipped })
    }

    /// Release the registry handle. Accepted in every state.
    ///
    /// Queries already in flight keep their own reference to the handle and
    /// finish normally.
    pub async fn close(&self) -> Result<()> {
        self.close_inner().with_subscriber(self.dispatch.clone()).await
    }

    async fn close_inner(&self) -> Result<()> {
        debug!("Closing OCI indexer");
        let mut lifecycle = self.lifecycle.write().await;
        if let Lifecycle::Ready(handle) = std::mem::replace(&mut *lifecycle, Lifecycle::Closed) {
            debug!(reference = %handle.reference, "Released OCI registry handle");
        }
        Ok(())
    }
}
