//! Configuration for the ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for the group store
    pub data_dir: PathBuf,

    /// Store file name inside `data_dir`
    pub store_file: String,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            store_file: "groups.json".to_string(),
            service_name: "ledger-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Config {
    /// Full path of the group store file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("TABSPLIT_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(file) = std::env::var("TABSPLIT_STORE_FILE") {
            config.store_file = file;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the store file name
    pub fn validate(&self) -> crate::Result<()> {
        if self.store_file.trim().is_empty() {
            return Err(crate::Error::Config("store_file must not be empty".to_string()));
        }
        Ok(())
    }
}
