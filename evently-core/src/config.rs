//! Evently configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_STORE_TIMEOUT;
use crate::error::{EventlyError, EventlyResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/evently";
static DEFAULT_STORE_TIMEOUT_STR: &str = "10s";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_store_timeout() -> String {
    DEFAULT_STORE_TIMEOUT_STR.to_string()
}

fn default_use_indexes() -> bool {
    true
}

/// Configuration at ~/.config/evently/config.toml, overridable with
/// `EVENTLY_*` environment variables (e.g. `EVENTLY_DATA_DIR`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventlyConfig {
    /// Where the local store and account book live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Upper bound on any single store call, e.g. "10s" or "1m".
    #[serde(default = "default_store_timeout")]
    pub store_timeout: String,

    /// Resolve join codes and memberships through the secondary indexes.
    /// When off, every lookup scans all events.
    #[serde(default = "default_use_indexes")]
    pub use_indexes: bool,
}

impl Default for EventlyConfig {
    fn default() -> Self {
        EventlyConfig {
            data_dir: default_data_dir(),
            store_timeout: default_store_timeout(),
            use_indexes: default_use_indexes(),
        }
    }
}

impl EventlyConfig {
    pub fn config_path() -> EventlyResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| EventlyError::Config("Could not determine config directory".into()))?
            .join("evently");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template on first run.
    pub fn load() -> EventlyResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> EventlyResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("EVENTLY"))
            .build()
            .map_err(|e| EventlyError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| EventlyError::Config(e.to_string()))
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn store_timeout(&self) -> EventlyResult<Duration> {
        if self.store_timeout.trim().is_empty() {
            return Ok(DEFAULT_STORE_TIMEOUT);
        }
        humantime::parse_duration(self.store_timeout.trim()).map_err(|e| {
            EventlyError::Config(format!(
                "Invalid store_timeout '{}': {}",
                self.store_timeout, e
            ))
        })
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> EventlyResult<()> {
        let contents = format!(
            "\
# evently configuration

# Where the local store and accounts live:
# data_dir = \"{}\"

# Give up on a store call after this long:
# store_timeout = \"{}\"

# Look up join codes and joined events through indexes instead of scanning:
# use_indexes = true
",
            DEFAULT_DATA_DIR, DEFAULT_STORE_TIMEOUT_STR
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EventlyError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| EventlyError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
