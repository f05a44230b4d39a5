use std::path::PathBuf;

use pkgreg_oci::IndexerOptions;

#[derive(clap::Parser, Debug)]
#[clap(name = "pkgreg", version, about = "Discover packages published to an OCI registry")]
pub struct Cli {
    /// Path to the JSON configuration file
    #[clap(long, env = "PKGREG_CONFIG")]
    pub config: Option<PathBuf>,

    #[clap(flatten)]
    pub registry: RegistryArgs,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Registry settings; each overrides the value from the config file.
#[derive(clap::Args, Debug, Default)]
pub struct RegistryArgs {
    /// Registry host, optionally with a port
    #[clap(long, env = "PKGREG_OCI_REGISTRY")]
    pub registry: Option<String>,
    /// Repository within the registry
    #[clap(long, env = "PKGREG_OCI_REPOSITORY")]
    pub repository: Option<String>,
    #[clap(long, env = "PKGREG_OCI_USERNAME")]
    pub username: Option<String>,
    #[clap(long, env = "PKGREG_OCI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Skip TLS certificate verification
    #[clap(long, env = "PKGREG_OCI_INSECURE")]
    pub insecure: bool,
    /// Use plain HTTP instead of HTTPS
    #[clap(long, env = "PKGREG_OCI_PLAIN_HTTP")]
    pub plain_http: bool,
    /// Per-request timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,
    /// Page size for tag listing
    #[clap(long)]
    pub page_size: Option<u32>,
}

impl RegistryArgs {
    /// Layer these arguments over options loaded from the config file.
    pub fn apply(&self, mut options: IndexerOptions) -> IndexerOptions {
        if let Some(registry) = &self.registry {
            options.registry = registry.clone();
        }
        if let Some(repository) = &self.repository {
            options.repository = repository.clone();
        }
        if let Some(username) = &self.username {
            options.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            options.password = Some(password.clone());
        }
        options.insecure |= self.insecure;
        options.plain_http |= self.plain_http;
        if let Some(timeout) = self.timeout {
            options.timeout_secs = timeout.max(1);
        }
        if let Some(page_size) = self.page_size {
            options.page_size = Some(page_size);
        }
        options
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Query the registry and print package descriptors as JSON
    Packages {
        /// Keep packages whose name contains this text
        #[clap(long)]
        name: Option<String>,
        /// Keep packages in this category
        #[clap(long)]
        category: Option<String>,
        /// Keep packages at or above this semver version
        #[clap(long)]
        min_version: Option<String>,
        /// Give up on tag listing after this many seconds
        #[clap(long)]
        deadline: Option<u64>,
        /// Exit with an error when only placeholder data is available
        #[clap(long)]
        strict: bool,
    },
    /// List raw registry tags
    Tags,
    /// Manage configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Reset the configuration file to defaults
    Reset {
        #[clap(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_flags_override_file_options() {
        let cli = Cli::try_parse_from([
            "pkgreg",
            "--registry",
            "localhost:5000",
            "--plain-http",
            "--timeout",
            "5",
            "packages",
            "--strict",
        ])
        .unwrap();

        let file = IndexerOptions::new("registry.example.com", "packages").credentials("u", "p");
        let options = cli.registry.apply(file);

        assert_eq!(options.registry, "localhost:5000");
        assert_eq!(options.repository, "packages");
        assert_eq!(options.username.as_deref(), Some("u"));
        assert!(options.plain_http);
        assert!(!options.insecure);
        assert_eq!(options.timeout_secs, 5);
        assert!(matches!(cli.command, Commands::Packages { strict: true, .. }));
    }

    #[test]
    fn test_config_subcommands_parse() {
        let cli = Cli::try_parse_from(["pkgreg", "config", "set", "oci.registry", "r.example.com"])
            .unwrap();
        match cli.command {
            Commands::Config {
                command: ConfigCommands::Set { key, value },
            } => {
                assert_eq!(key, "oci.registry");
                assert_eq!(value, "r.example.com");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
