//! Plugin configuration persistence.
//!
//! Stand-in for the host platform's config-entry store: the non-secret
//! half of the credential bundle (organization id and slug) plus the poll
//! options live in `~/.config/vibbo-feed/config.json`; the session cookie
//! itself goes to the OS keychain (see [`crate::auth::CredentialStore`]).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "vibbo-feed";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default poll interval in minutes
pub const DEFAULT_SCAN_INTERVAL_MINUTES: u64 = 30;

/// Minimum accepted poll interval in minutes
pub const MIN_SCAN_INTERVAL_MINUTES: u64 = 5;

/// Poll options, configurable after setup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Options {
    pub scan_interval: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL_MINUTES,
        }
    }
}

impl Options {
    /// Poll interval as a `Duration`
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval * 60)
    }
}

/// The persisted, non-secret part of a configured feed instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConfig {
    pub organization_id: String,
    pub organization_slug: String,
    pub organization_name: String,
    #[serde(default)]
    pub options: Options,
}

impl StoredConfig {
    /// Load the stored config, if setup has been completed.
    pub fn load() -> Result<Option<Self>> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(Some(serde_json::from_str(&contents)?))
        } else {
            Ok(None)
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Remove the stored config (keychain entry is deleted separately).
    pub fn delete() -> Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
