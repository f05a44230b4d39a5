mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Commands;
use crate::commands::config::handle_config_command;
use crate::commands::packages::{PackagesArgs, handle_packages_command};
use crate::commands::tags::handle_tags_command;
use crate::config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path).await?;
    let options = cli.registry.apply(config.oci.clone());

    match cli.command {
        Commands::Packages {
            name,
            category,
            min_version,
            deadline,
            strict,
        } => {
            let args = PackagesArgs {
                name,
                category,
                min_version,
                deadline,
                strict,
            };
            handle_packages_command(args, options, &config.output).await?;
        }
        Commands::Tags => {
            handle_tags_command(options).await?;
        }
        Commands::Config { command } => {
            handle_config_command(command, &config_path, &options).await?;
        }
    }

    Ok(())
}
