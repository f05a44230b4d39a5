use std::io::{self, Write};
use std::path::Path;

use eyre::Result;
use pkgreg_oci::IndexerOptions;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub async fn handle_config_command(
    cmd: ConfigCommands,
    path: &Path,
    effective: &IndexerOptions,
) -> Result<()> {
    match cmd {
        ConfigCommands::Show => handle_show_config(path, effective).await,
        ConfigCommands::Get { key } => handle_get_config(path, key).await,
        ConfigCommands::Set { key, value } => handle_set_config(path, key, value).await,
        ConfigCommands::Reset { force } => handle_reset_config(path, force).await,
    }
}

async fn handle_show_config(path: &Path, effective: &IndexerOptions) -> Result<()> {
    let mut config = Config::load(path).await?;
    config.oci = effective.clone();

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}

async fn handle_get_config(path: &Path, key: String) -> Result<()> {
    let config = Config::load(path).await?;
    println!("{}: {}", key, config.get_value(&key)?);
    Ok(())
}

async fn handle_set_config(path: &Path, key: String, value: String) -> Result<()> {
    let mut config = Config::load(path).await?;
    config.set_value(&key, &value)?;
    config.save(path).await?;
    println!("Configuration updated: {} = {}", key, config.get_value(&key)?);
    Ok(())
}

async fn handle_reset_config(path: &Path, force: bool) -> Result<()> {
    if !force {
        print!("Reset configuration at {}? [y/N]: ", path.display());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Reset cancelled");
            return Ok(());
        }
    }

    Config::default().save(path).await?;
    println!("Configuration reset to defaults");
    Ok(())
}
