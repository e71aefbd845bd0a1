//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;
use userfiles_store::{FileStoreConfig, RecordFormat};

use crate::cache::CacheConfig;
use crate::logging::LoggingConfig;

/// Environment variable naming the host base directory
pub const BASE_DIR_ENV: &str = "USERFILES_BASE_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// User record storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Users root directory
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Base directory the root is resolved against when it is not a
    /// directory by itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    #[serde(default)]
    pub format: RecordFormat,
    /// Record file name inside each user directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_file: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            base_dir: None,
            format: RecordFormat::default(),
            record_file: None,
        }
    }
}

impl StoreConfig {
    pub fn to_file_store_config(&self) -> FileStoreConfig {
        FileStoreConfig {
            root: self.root.clone(),
            base_dir: self.base_dir.clone(),
            format: self.format,
            record_file: self.record_file.clone(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("users")
}

impl RealmConfig {
    /// Load configuration from a file, using defaults if it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            config
        } else {
            info!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };

        Ok(config.with_base_dir_fallback(std::env::var_os(BASE_DIR_ENV)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fill an unset base directory from the host environment
    pub fn with_base_dir_fallback(mut self, base_dir: Option<OsString>) -> Self {
        if self.store.base_dir.is_none()
            && let Some(base) = base_dir.filter(|b| !b.is_empty())
        {
            self.store.base_dir = Some(PathBuf::from(base));
        }
        self
    }
}
