//! Application configuration loaded from `config.toml`.
//!
//! Every section and key is optional; a missing or unreadable file yields the
//! defaults, with a warning in the activity log when the file exists but is bad.

use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logger::{self, LogLevel};

/// Top-level `config.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub update: UpdateConfig,
    pub wake: WakeConfig,
    pub logging: LoggingConfig,
}

/// `[update]`: where releases are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// `owner/name` of the release repository.
    pub repository: String,
    /// Base URL of the release API.
    pub api_base: String,
    /// Substring identifying the non-Windows release asset.
    pub asset_keyword: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            repository: constants::UPDATE_REPOSITORY.to_string(),
            api_base: constants::UPDATE_API_BASE.to_string(),
            asset_keyword: constants::UPDATE_ASSET_KEYWORD.to_string(),
        }
    }
}

impl UpdateConfig {
    /// URL of the "latest release" document.
    pub fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            self.repository
        )
    }
}

/// `[wake]`: where magic packets are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeConfig {
    pub broadcast: Ipv4Addr,
    pub port: u16,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            broadcast: Ipv4Addr::BROADCAST,
            port: constants::WOL_PORT,
        }
    }
}

/// `[logging]`: activity log files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub to_file: bool,
    pub retention_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            to_file: true,
            retention_days: constants::LOG_RETENTION_DAYS,
        }
    }
}

impl AppConfig {
    /// Loads `config.toml` from `config_dir`, falling back to defaults.
    pub fn load(config_dir: &Path) -> Self {
        let path = config_dir.join(constants::CONFIG_FILE_NAME);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                logger::log(
                    LogLevel::Warning,
                    "CONFIG",
                    format!("Ignoring invalid {}: {e}", path.display()),
                );
                Self::default()
            }
        }
    }
}
