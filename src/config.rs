//! Client settings management.
//!
//! This module handles loading and saving the local client settings,
//! which currently amount to the API base URL.
//!
//! Settings are stored at `~/.config/walletcare/settings.json`; the device
//! identity lives in the data directory and the offline cache in the cache
//! directory, both resolved here.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/data/cache directory paths
const APP_NAME: &str = "walletcare";

/// Settings file name
const SETTINGS_FILE: &str = "settings.json";

/// Default WalletCare API origin
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load the settings file, writing one with the defaults on first
    /// run so the user has something to edit.
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            let settings = Self::default();
            if let Err(e) = settings.save() {
                warn!(error = %e, "Failed to write default settings file");
            }
            Ok(settings)
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(SETTINGS_FILE))
    }

    /// Directory holding the persisted device identity.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Directory holding the offline cache generations.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
