//! Configuration loading and management
//!
//! Handles parsing of `config.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clock::TodayZone;
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::DEFAULT_TASKS_KEY;

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Date handling
    #[serde(default)]
    pub dates: DatesConfig,

    /// Listing defaults
    #[serde(default)]
    pub list: ListConfig,
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key the task list is stored under
    #[serde(default = "default_key")]
    pub key: String,

    /// How long a writer waits for the store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_key() -> String {
    DEFAULT_TASKS_KEY.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatesConfig {
    /// Calendar used for "today": `local` or `utc`
    #[serde(default)]
    pub today: TodayZone,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListConfig {
    /// Leave completed tasks out of `todo list` unless `--done` is given
    #[serde(default)]
    pub hide_done: bool,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.toml` from the data directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(
                        path = %config_path.display(),
                        error = %err,
                        "ignoring invalid configuration"
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        let key = self.storage.key.trim();
        if key.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "storage.key cannot be empty".to_string(),
            ));
        }
        if !key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(crate::error::Error::InvalidConfig(format!(
                "storage.key '{key}' must be alphanumeric, '-' or '_'"
            )));
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
