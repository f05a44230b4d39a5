use eyre::{Result, WrapErr};
use pkgreg_oci::{IndexerOptions, RegistryClient, RepositoryReference, TagLister};

/// Print raw tags, one per line. Unlike `packages`, failures are reported.
pub async fn handle_tags_command(options: IndexerOptions) -> Result<()> {
    options.validate()?;
    let reference = RepositoryReference::new(&options.registry, &options.repository)?;
    let client = RegistryClient::new(reference.clone(), &options)?;

    let tags = client
        .list_tags()
        .await
        .wrap_err_with(|| format!("Failed to list tags for {}", reference))?;

    for tag in tags {
        println!("{}", tag);
    }

    Ok(())
}
