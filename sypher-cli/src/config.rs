//! CLI configuration.
//!
//! Loaded from a JSON file when one is given or found in the user config
//! directory; every field has a default, so a partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the CLI keeps its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding the database and device state.
    pub data_dir: PathBuf,
    /// License database file name, relative to `data_dir`.
    pub database_file: String,
    /// Device state file name, relative to `data_dir`.
    pub device_state_file: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("sypher"),
            database_file: "licenses.db".to_string(),
            device_state_file: "device.json".to_string(),
        }
    }
}

impl CliConfig {
    /// Returns the default config file location, `<config dir>/sypher/config.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sypher").join("config.json"))
    }

    /// Loads the config.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present, otherwise defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Reads a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Replaces the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    #[must_use]
    pub fn device_state_path(&self) -> PathBuf {
        self.data_dir.join(&self.device_state_file)
    }
}
