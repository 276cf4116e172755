//! Repository configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::time::{TimeZoneMode, W3Time};

/// Default name of the metadata directory inside a repository.
pub const DEFAULT_DATA_DIR: &str = "rdiff-backup-data";

/// Default name of the increments directory inside the data directory.
pub const DEFAULT_INCREMENTS_DIR: &str = "increments";

/// Configuration for managing the increments of one repository.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ManageConfig {
    /// Root of the mirror.
    pub repository: PathBuf,

    /// Name of the metadata directory under the repository root.
    #[builder(default = "DEFAULT_DATA_DIR.to_string()")]
    #[serde(default = "default_data_dir")]
    pub data_dir_name: String,

    /// Name of the increments directory under the data directory.
    #[builder(default = "DEFAULT_INCREMENTS_DIR.to_string()")]
    #[serde(default = "default_increments_dir")]
    pub increments_dir_name: String,

    /// Zone used to encode and display times.
    #[builder(default)]
    #[serde(default)]
    pub time_zone: TimeZoneMode,

    /// Report what pruning would delete without deleting it.
    #[builder(default = "false")]
    #[serde(default)]
    pub dry_run: bool,
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_increments_dir() -> String {
    DEFAULT_INCREMENTS_DIR.to_string()
}

impl ManageConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.repository {
            Some(ref repository) if repository.as_os_str().is_empty() => {
                return Err("Repository path cannot be empty".to_string());
            }
            None => return Err("Repository path is required".to_string()),
            _ => {}
        }
        for name in [&self.data_dir_name, &self.increments_dir_name]
            .into_iter()
            .flatten()
        {
            if name.is_empty() || name.contains(std::path::is_separator) {
                return Err(format!("Invalid directory name: {name:?}"));
            }
        }
        Ok(())
    }
}

impl ManageConfig {
    /// Create a new config builder.
    pub fn builder() -> ManageConfigBuilder {
        ManageConfigBuilder::default()
    }

    /// Create a config with defaults for a repository.
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            data_dir_name: default_data_dir(),
            increments_dir_name: default_increments_dir(),
            time_zone: TimeZoneMode::default(),
            dry_run: false,
        }
    }

    /// Path of the metadata directory.
    pub fn data_dir(&self) -> PathBuf {
        self.repository.join(&self.data_dir_name)
    }

    /// Path of the increments directory.
    pub fn increments_dir(&self) -> PathBuf {
        self.data_dir().join(&self.increments_dir_name)
    }

    /// Time codec matching the configured zone.
    pub fn codec(&self) -> W3Time {
        W3Time::new(self.time_zone)
    }
}
