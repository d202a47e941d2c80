//! Sites configuration

use crate::error::{SitesError, SitesResult};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration shared by the reducer and its tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    /// Reducer behavior
    pub reducer: ReducerConfig,

    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

/// Behavior switches for the sites reducer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Drop untagged records from state when browsing history is cleared
    pub purge_history_on_clear: bool,
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            reducer: ReducerConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            purge_history_on_clear: true,
        }
    }
}

impl SitesConfig {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sites")
            .join("config.json")
    }

    /// Load configuration from file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> SitesResult<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            SitesError::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> SitesResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}
