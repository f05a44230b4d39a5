use std::time::Duration;

use eyre::{Result, WrapErr};
use pkgreg_oci::{GetOptions, IndexerOptions, OciIndexer, PackageFilter};
use tracing::{info, warn};

use crate::config::OutputConfig;

pub struct PackagesArgs {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_version: Option<String>,
    pub deadline: Option<u64>,
    pub strict: bool,
}

impl PackagesArgs {
    fn filter(&self) -> Result<PackageFilter> {
        let mut filter = PackageFilter::new();
        if let Some(name) = &self.name {
            filter = filter.with_name(name.clone());
        }
        if let Some(category) = &self.category {
            filter = filter.with_category(category.clone());
        }
        if let Some(min_version) = &self.min_version {
            let version = semver::Version::parse(min_version)
                .wrap_err_with(|| format!("Invalid --min-version '{}'", min_version))?;
            filter = filter.with_min_version(version);
        }
        Ok(filter)
    }
}

pub async fn handle_packages_command(
    args: PackagesArgs,
    options: IndexerOptions,
    output: &OutputConfig,
) -> Result<()> {
    let filter = args.filter()?;

    let indexer = OciIndexer::new(options);
    indexer
        .init()
        .await
        .wrap_err("Failed to initialize OCI indexer")?;

    let get_options = GetOptions::with_filter(filter.clone());
    let result = match args.deadline {
        Some(secs) => {
            indexer
                .query_with_deadline(Some(&get_options), Duration::from_secs(secs))
                .await
        }
        None => indexer.query(Some(&get_options)).await,
    };
    indexer.close().await?;
    let outcome = result?;

    for skipped in outcome.skipped() {
        warn!(tag = %skipped.tag, "Skipped tag: {}", skipped.error);
    }

    if let Some(cause) = outcome.cause() {
        if args.strict {
            return Err(eyre::eyre!("Registry returned placeholder data: {}", cause));
        }
        warn!("Serving placeholder package: {}", cause);
    }

    // Filtering happens here, outside the indexer.
    let packages = filter.apply(outcome.into_packages());
    info!(count = packages.len(), "Packages after filtering");

    let json = if output.pretty {
        serde_json::to_string_pretty(&packages)?
    } else {
        serde_json::to_string(&packages)?
    };
    println!("{}", json);

    Ok(())
}
