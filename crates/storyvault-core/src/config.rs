//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/storyvault/config.toml)
//! 3. Environment variables (STORYVAULT_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::DEFAULT_AUTHOR;

/// Environment variable prefix
const ENV_PREFIX: &str = "STORYVAULT";

/// Default prefix for exported backup archives
pub const DEFAULT_BACKUP_PREFIX: &str = "StoryVault";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the library database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Author recorded on created stories when none is given
    #[serde(default = "default_author")]
    pub default_author: String,

    /// Product prefix used in exported archive file names
    #[serde(default = "default_backup_prefix")]
    pub backup_prefix: String,

    /// Skip archive stories whose title already exists when appending
    #[serde(default = "default_true")]
    pub dedup_titles_on_append: bool,

    /// Shell command that receives sent story content on stdin
    #[serde(default)]
    pub send_command: Option<String>,

    /// Log file used when STORYVAULT_LOG is set
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_author: default_author(),
            backup_prefix: default_backup_prefix(),
            dedup_titles_on_append: true,
            send_command: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (STORYVAULT_DATA_DIR, STORYVAULT_DEFAULT_AUTHOR,
    ///    STORYVAULT_SEND_COMMAND)
    /// 2. Config file (~/.config/storyvault/config.toml or STORYVAULT_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // STORYVAULT_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // STORYVAULT_DEFAULT_AUTHOR
        if let Ok(val) = std::env::var(format!("{}_DEFAULT_AUTHOR", ENV_PREFIX)) {
            if !val.trim().is_empty() {
                self.default_author = val;
            }
        }

        // STORYVAULT_SEND_COMMAND
        if let Ok(val) = std::env::var(format!("{}_SEND_COMMAND", ENV_PREFIX)) {
            self.send_command = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with STORYVAULT_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storyvault")
            .join("config.toml")
    }

    /// Get the path to the SQLite library database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("library.db")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storyvault")
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn default_backup_prefix() -> String {
    DEFAULT_BACKUP_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}
