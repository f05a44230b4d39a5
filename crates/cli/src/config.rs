use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use eyre::{Result, WrapErr};
use pkgreg_oci::IndexerOptions;
use serde::{Deserialize, Serialize};
use tokio::fs;

const REDACTED: &str = "<redacted>";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub oci: IndexerOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        get_default_config_dir().join("config.json")
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["oci", "registry"] => self.oci.registry = value.to_string(),
            ["oci", "repository"] => self.oci.repository = value.to_string(),
            ["oci", "username"] => self.oci.username = optional(value),
            ["oci", "password"] => self.oci.password = optional(value),
            ["oci", "insecure"] => self.oci.insecure = parse_bool(value)?,
            ["oci", "plain_http"] => self.oci.plain_http = parse_bool(value)?,
            ["oci", "timeout_secs"] => {
                self.oci.timeout_secs = value
                    .parse::<u64>()
                    .map_err(|_| eyre::eyre!("Invalid timeout: {}", value))?
                    .max(1);
            }
            ["oci", "page_size"] => {
                self.oci.page_size = if value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse::<u32>()
                            .map_err(|_| eyre::eyre!("Invalid page size: {}", value))?,
                    )
                };
            }
            ["output", "pretty"] => self.output.pretty = parse_bool(value)?,
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        let value = match parts.as_slice() {
            ["oci", "registry"] => self.oci.registry.clone(),
            ["oci", "repository"] => self.oci.repository.clone(),
            ["oci", "username"] => self.oci.username.clone().unwrap_or_default(),
            ["oci", "password"] => self
                .oci
                .password
                .as_ref()
                .map(|_| REDACTED.to_string())
                .unwrap_or_default(),
            ["oci", "insecure"] => self.oci.insecure.to_string(),
            ["oci", "plain_http"] => self.oci.plain_http.to_string(),
            ["oci", "timeout_secs"] => self.oci.timeout_secs.to_string(),
            ["oci", "page_size"] => self
                .oci
                .page_size
                .map(|n| n.to_string())
                .unwrap_or_default(),
            ["output", "pretty"] => self.output.pretty.to_string(),
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        };

        Ok(value)
    }

    /// Copy safe to print: the password is replaced.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.oci.password.is_some() {
            config.oci.password = Some(REDACTED.to_string());
        }
        config
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .map_err(|_| eyre::eyre!("Invalid boolean value: {}", value))
}

fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "pkgreg", "pkgreg") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        PathBuf::from(".pkgreg").join("config")
    }
}
