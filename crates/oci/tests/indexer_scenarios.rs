//! End-to-end indexer behaviour with in-memory tag enumerators.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pkgreg_oci::{
    DegradedCause, GetOptions, IndexerError, IndexerOptions, IndexerState, OciIndexer,
    PackageFilter, RegistryError, TagLister,
};
use tokio::sync::Notify;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

struct FixedTags(Vec<&'static str>);

#[async_trait]
impl TagLister for FixedTags {
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.0.iter().map(|t| t.to_string()).collect())
    }
}

struct UnreachableRegistry;

#[async_trait]
impl TagLister for UnreachableRegistry {
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        Err(RegistryError::Network("connection refused".to_string()))
    }
}

/// Blocks inside `list_tags` until released.
#[derive(Default)]
struct GatedTags {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl TagLister for GatedTags {
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(vec!["nginx:1.2.0".to_string(), "redis".to_string()])
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn dispatch(&self) -> Dispatch {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        Dispatch::new(subscriber)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn example_options() -> IndexerOptions {
    IndexerOptions::new("registry.example.com", "packages")
}

#[tokio::test]
async fn test_tags_become_packages_in_order() {
    let indexer = OciIndexer::builder(example_options())
        .tag_lister(Arc::new(FixedTags(vec!["nginx:1.2.0", "redis"])))
        .build();
    indexer.init().await.unwrap();

    let outcome = indexer.query(None).await.unwrap();
    assert!(!outcome.is_degraded());
    assert!(outcome.skipped().is_empty());

    let packages = outcome.packages();
    assert_eq!(packages.len(), 2);

    assert_eq!(packages[0].name, "nginx");
    assert_eq!(packages[0].version, "1.2.0");
    assert_eq!(
        packages[0].base_path,
        "oci://registry.example.com/packages:nginx:1.2.0"
    );

    assert_eq!(packages[1].name, "redis");
    assert_eq!(packages[1].version, "1.0.0");
    assert_eq!(packages[1].base_path, "oci://registry.example.com/packages:redis");
}

#[tokio::test]
async fn test_enumeration_failure_returns_placeholder() {
    let logs = CapturedLogs::default();
    let indexer = OciIndexer::builder(example_options())
        .tag_lister(Arc::new(UnreachableRegistry))
        .dispatch(logs.dispatch())
        .build();
    indexer.init().await.unwrap();

    let outcome = indexer.query(None).await.unwrap();
    assert!(matches!(
        outcome.cause(),
        Some(DegradedCause::Enumeration(RegistryError::Network(_)))
    ));

    let packages = outcome.into_packages();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "oci-mock-package");
    assert_eq!(packages[0].version, "1.0.0");
    assert_eq!(packages[0].base_path, "oci://registry.example.com/packages:latest");

    let output = logs.contents();
    assert!(output.contains("WARN"), "logs: {output}");
    assert!(output.contains("Failed to list tags from OCI registry"), "logs: {output}");
}

#[tokio::test]
async fn test_empty_registry_returns_placeholder() {
    let indexer = OciIndexer::builder(example_options())
        .tag_lister(Arc::new(FixedTags(vec![])))
        .build();
    indexer.init().await.unwrap();

    let outcome = indexer.query(None).await.unwrap();
    assert!(outcome.is_degraded());
    assert_eq!(
        outcome.cause().unwrap().to_string(),
        "registry returned no tags"
    );
    assert_eq!(outcome.packages()[0].name, "oci-mock-package");
}

#[tokio::test]
async fn test_missing_registry_fails_init_and_blocks_query() {
    let logs = CapturedLogs::default();
    let indexer = OciIndexer::builder(IndexerOptions::new("", "packages"))
        .tag_lister(Arc::new(FixedTags(vec!["nginx"])))
        .dispatch(logs.dispatch())
        .build();

    let err = indexer.init().await.unwrap_err();
    assert!(matches!(err, IndexerError::Config(_)));
    assert_eq!(indexer.state().await, IndexerState::Uninitialized);

    let err = indexer.query(None).await.unwrap_err();
    assert!(matches!(
        err,
        IndexerError::NotInitialized {
            state: IndexerState::Uninitialized
        }
    ));
    assert!(logs.contents().contains("ERROR"));
}

#[tokio::test]
async fn test_init_validation_table() {
    let cases = [
        ("valid configuration", IndexerOptions::new("registry.example.com", "packages"), true),
        ("missing registry", IndexerOptions::new("", "packages"), false),
        ("missing repository", IndexerOptions::new("registry.example.com", ""), false),
        ("registry with port", IndexerOptions::new("localhost:5000", "team/packages"), true),
    ];

    for (name, options, ok) in cases {
        let indexer = OciIndexer::new(options);
        assert_eq!(indexer.init().await.is_ok(), ok, "case: {name}");
    }
}

#[tokio::test]
async fn test_insecure_init_logs_warning() {
    let logs = CapturedLogs::default();
    let indexer = OciIndexer::builder(example_options().insecure(true))
        .dispatch(logs.dispatch())
        .build();
    indexer.init().await.unwrap();

    let output = logs.contents();
    assert!(output.contains("WARN"), "logs: {output}");
    assert!(output.contains("TLS certificate verification disabled"), "logs: {output}");
}

#[tokio::test]
async fn test_filter_is_accepted_but_not_applied() {
    let indexer = OciIndexer::builder(example_options())
        .tag_lister(Arc::new(FixedTags(vec!["nginx:1.2.0", "redis"])))
        .build();
    indexer.init().await.unwrap();

    let options = GetOptions::with_filter(PackageFilter::new().with_name("nginx"));
    let outcome = indexer.query(Some(&options)).await.unwrap();
    assert_eq!(outcome.packages().len(), 2);
}

#[tokio::test]
async fn test_close_never_fails() {
    let indexer = OciIndexer::new(example_options());
    indexer.close().await.unwrap();

    let indexer = OciIndexer::builder(example_options())
        .tag_lister(Arc::new(FixedTags(vec!["nginx"])))
        .build();
    indexer.init().await.unwrap();
    indexer.close().await.unwrap();
    indexer.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_queries_share_handle() {
    let indexer = Arc::new(
        OciIndexer::builder(example_options())
            .tag_lister(Arc::new(FixedTags(vec!["nginx:1.2.0", "redis"])))
            .build(),
    );
    indexer.init().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let indexer = Arc::clone(&indexer);
        handles.push(tokio::spawn(async move {
            indexer.query(None).await.unwrap().into_packages()
        }));
    }

    for handle in handles {
        let packages = handle.await.unwrap();
        assert_eq!(packages.len(), 2);
    }
}

#[tokio::test]
async fn test_close_during_query_lets_query_finish() {
    let lister = Arc::new(GatedTags::default());
    let indexer = Arc::new(
        OciIndexer::builder(example_options())
            .tag_lister(lister.clone())
            .build(),
    );
    indexer.init().await.unwrap();

    let in_flight = {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move { indexer.query(None).await })
    };

    lister.entered.notified().await;
    indexer.close().await.unwrap();
    assert_eq!(indexer.state().await, IndexerState::Closed);

    lister.release.notify_one();
    let outcome = in_flight.await.unwrap().unwrap();

    assert!(!outcome.is_degraded());
    let names: Vec<_> = outcome.packages().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["nginx", "redis"]);
    assert_eq!(indexer.state().await, IndexerState::Closed);
    assert!(matches!(
        indexer.query(None).await,
        Err(IndexerError::NotInitialized {
            state: IndexerState::Closed
        })
    ));
}
