//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::storage::{StorageConfig, DEFAULT_EXPORT_DIR};
use crate::store::StoreLayout;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Report rendering and export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows shown in top-N rankings
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Directory name under the data directory for JSONL exports
    #[serde(default = "default_export_dir_name")]
    pub export_dir_name: String,
}

fn default_top_n() -> usize {
    10
}

fn default_export_dir_name() -> String {
    DEFAULT_EXPORT_DIR.to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            export_dir_name: default_export_dir_name(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub layout: StoreLayout,

    #[serde(default)]
    pub report: ReportConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            layout: StoreLayout::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Log level must not be empty".to_string(),
            ));
        }

        if self.report.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "report.top_n must be greater than 0".to_string(),
            ));
        }

        let export_dir = self.report.export_dir_name.trim();
        if export_dir.is_empty() || export_dir.contains(['/', '\\']) || export_dir == ".." {
            return Err(ConfigError::ValidationError(format!(
                "report.export_dir_name must be a plain directory name, got {:?}",
                self.report.export_dir_name
            )));
        }

        Ok(())
    }

    /// Storage paths derived from this configuration.
    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone()).with_export_dir(self.report.export_dir_name.trim())
    }
}
