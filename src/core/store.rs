//! Durable storage for host profiles and the tunnel config path.

use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{Error, Result};
use crate::logger::{self, LogLevel};
use crate::state::{AppSettings, AppearanceMode};

/// Reads and writes `settings.json`.
///
/// Single writer: concurrent edits by another process are not detected and
/// the last `save` wins.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store backed by an explicit file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by `settings.json` inside `config_dir`.
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::at_path(config_dir.join(constants::SETTINGS_FILE_NAME))
    }

    /// Location of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved settings.
    ///
    /// Never fails: a missing file gives empty defaults, and an unreadable
    /// or malformed one gives empty defaults plus a warning in the log.
    pub fn load(&self) -> AppSettings {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppSettings::default(),
            Err(e) => {
                logger::log(
                    LogLevel::Warning,
                    "SETTINGS",
                    format!("Failed to read {}: {e}", self.path.display()),
                );
                return AppSettings::default();
            }
        };

        match serde_json::from_slice::<AppSettings>(&bytes) {
            Ok(mut settings) => {
                if settings.appearance_mode == AppearanceMode::Unknown {
                    settings.appearance_mode = AppearanceMode::System;
                }
                settings
            }
            Err(e) => {
                logger::log(
                    LogLevel::Warning,
                    "SETTINGS",
                    format!("Ignoring malformed {}: {e}", self.path.display()),
                );
                AppSettings::default()
            }
        }
    }

    /// Overwrites the settings file with `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file or its directory cannot be written.
    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("Failed to encode settings: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_at("create", parent, e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| Error::io_at("write", &self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HostProfile;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::in_dir(dir.path());
        let settings = store.load();
        assert!(settings.hosts.is_empty());
        assert!(settings.wireguard_config_path.is_empty());
        assert_eq!(settings.appearance_mode, AppearanceMode::System);
    }

    #[test]
    fn test_load_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::in_dir(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();
        assert_eq!(store.load(), AppSettings::default());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::at_path(dir.path().join("nested").join("settings.json"));

        let mut settings = AppSettings {
            wireguard_config_path: "/etc/wireguard/office.conf".to_string(),
            appearance_mode: AppearanceMode::Dark,
            ..AppSettings::default()
        };
        settings
            .add_host(HostProfile::new("office", "10.0.0.5", "AA:BB:CC:DD:EE:FF", "admin").unwrap())
            .unwrap();
        settings
            .add_host(HostProfile::new("lab", "10.0.0.6", "11-22-33-44-55-66", "root").unwrap())
            .unwrap();

        store.save(&settings).unwrap();
        let loaded = store.load();

        assert_eq!(loaded.hosts, settings.hosts);
        assert_eq!(loaded.wireguard_config_path, settings.wireguard_config_path);
        assert_eq!(loaded.appearance_mode, AppearanceMode::Dark);
    }

    #[test]
    fn test_save_writes_readable_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::in_dir(dir.path());
        let mut settings = AppSettings::default();
        settings
            .add_host(HostProfile::new("office", "10.0.0.5", "AA:BB:CC:DD:EE:FF", "admin").unwrap())
            .unwrap();
        store.save(&settings).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        for key in [
            "\"wireguard_config_path\"",
            "\"hosts\"",
            "\"ip_address\"",
            "\"mac_address\"",
            "\"rdp_user\"",
            "\"appearance_mode\": \"System\"",
        ] {
            assert!(text.contains(key), "missing {key} in {text}");
        }
        assert!(text.contains('\n'), "expected pretty-printed output");
    }

    #[test]
    fn test_load_accepts_legacy_file_without_appearance() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::in_dir(dir.path());
        std::fs::write(
            store.path(),
            r#"{"wireguard_config_path": "/a.conf", "hosts": [{"name": "pc", "ip_address": "1.2.3.4", "mac_address": "aa:bb:cc:dd:ee:ff", "rdp_user": "me"}]}"#,
        )
        .unwrap();
        let settings = store.load();
        assert_eq!(settings.host_names(), vec!["pc"]);
        assert_eq!(settings.appearance_mode, AppearanceMode::System);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::in_dir(dir.path());
        let mut settings = AppSettings::default();
        settings
            .add_host(HostProfile::new("old", "10.0.0.5", "AA:BB:CC:DD:EE:FF", "admin").unwrap())
            .unwrap();
        store.save(&settings).unwrap();

        settings.remove_host("old").unwrap();
        store.save(&settings).unwrap();
        assert!(store.load().hosts.is_empty());
    }
}
