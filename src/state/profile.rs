//! Host profile and settings types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Light/dark preference for front-ends. Not interpreted by the core.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
pub enum AppearanceMode {
    Light,
    Dark,
    /// Follow the desktop setting.
    #[default]
    System,
    /// Any value this version does not know; treated as `System`.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AppearanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppearanceMode::Light => write!(f, "Light"),
            AppearanceMode::Dark => write!(f, "Dark"),
            AppearanceMode::System | AppearanceMode::Unknown => write!(f, "System"),
        }
    }
}

/// A remote machine that can be woken and reached over remote desktop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    /// Unique display name.
    pub name: String,
    /// Address used for the remote desktop session.
    pub ip_address: String,
    /// Hardware address the magic packet targets.
    pub mac_address: String,
    /// Account name passed to the remote desktop client.
    pub rdp_user: String,
}

impl HostProfile {
    /// Builds a profile, trimming every field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any field is empty after trimming.
    pub fn new(name: &str, ip_address: &str, mac_address: &str, rdp_user: &str) -> Result<Self> {
        let host = Self {
            name: name.trim().to_string(),
            ip_address: ip_address.trim().to_string(),
            mac_address: mac_address.trim().to_string(),
            rdp_user: rdp_user.trim().to_string(),
        };
        host.validate()?;
        Ok(host)
    }

    /// Checks that all four fields are populated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("name", &self.name),
            ("IP address", &self.ip_address),
            ("MAC address", &self.mac_address),
            ("RDP user", &self.rdp_user),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((label, _)) => Err(Error::Validation(format!(
                "All host fields are required (missing {label})."
            ))),
            None => Ok(()),
        }
    }
}

/// Everything persisted by the profile store.
///
/// Owned by the control thread. Mutations only touch memory; call
/// [`crate::core::store::ProfileStore::save`] to persist a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// `WireGuard` configuration file; empty when not configured.
    pub wireguard_config_path: String,
    /// Host profiles in display order.
    pub hosts: Vec<HostProfile>,
    /// Front-end appearance preference.
    pub appearance_mode: AppearanceMode,
}

impl AppSettings {
    /// Looks up a host by name.
    pub fn host(&self, name: &str) -> Option<&HostProfile> {
        self.hosts.iter().find(|h| h.name == name)
    }

    /// Host names in display order.
    pub fn host_names(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.name.as_str()).collect()
    }

    /// Appends a new host.
    ///
    /// # Errors
    ///
    /// Fails on an empty field or when the name is already taken.
    pub fn add_host(&mut self, host: HostProfile) -> Result<()> {
        host.validate()?;
        if self.host(&host.name).is_some() {
            return Err(Error::DuplicateHost(host.name));
        }
        self.hosts.push(host);
        Ok(())
    }

    /// Replaces the host called `original_name`, keeping its position.
    ///
    /// # Errors
    ///
    /// Fails on an empty field, an unknown `original_name`, or a rename
    /// onto another existing host.
    pub fn update_host(&mut self, original_name: &str, host: HostProfile) -> Result<()> {
        host.validate()?;
        let idx = self
            .hosts
            .iter()
            .position(|h| h.name == original_name)
            .ok_or_else(|| Error::HostNotFound(original_name.to_string()))?;

        if host.name != original_name && self.host(&host.name).is_some() {
            return Err(Error::DuplicateHost(host.name));
        }
        self.hosts[idx] = host;
        Ok(())
    }

    /// Removes and returns the host called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostNotFound`] if no such host exists.
    pub fn remove_host(&mut self, name: &str) -> Result<HostProfile> {
        let idx = self
            .hosts
            .iter()
            .position(|h| h.name == name)
            .ok_or_else(|| Error::HostNotFound(name.to_string()))?;
        Ok(self.hosts.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str) -> HostProfile {
        HostProfile::new(name, "10.0.0.5", "AA:BB:CC:DD:EE:FF", "admin").unwrap()
    }

    #[test]
    fn test_new_rejects_each_empty_field() {
        assert!(HostProfile::new("", "10.0.0.5", "AA:BB:CC:DD:EE:FF", "admin").is_err());
        assert!(HostProfile::new("pc", " ", "AA:BB:CC:DD:EE:FF", "admin").is_err());
        assert!(HostProfile::new("pc", "10.0.0.5", "", "admin").is_err());
        let err = HostProfile::new("pc", "10.0.0.5", "AA:BB:CC:DD:EE:FF", "").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("RDP user"));
    }

    #[test]
    fn test_new_trims_fields() {
        let h = HostProfile::new(" office ", " 10.0.0.5", "AA:BB:CC:DD:EE:FF ", " admin ").unwrap();
        assert_eq!(h.name, "office");
        assert_eq!(h.ip_address, "10.0.0.5");
        assert_eq!(h.rdp_user, "admin");
    }

    #[test]
    fn test_add_host_appears_exactly_once() {
        let mut settings = AppSettings::default();
        settings.add_host(host("office")).unwrap();
        assert_eq!(settings.host_names(), vec!["office"]);

        let err = settings.add_host(host("office")).unwrap_err();
        assert!(matches!(err, Error::DuplicateHost(ref n) if n == "office"));
        assert_eq!(settings.hosts.len(), 1);
    }

    #[test]
    fn test_add_host_rejects_invalid_struct() {
        let mut settings = AppSettings::default();
        let mut bad = host("office");
        bad.mac_address = String::new();
        assert!(settings.add_host(bad).is_err());
        assert!(settings.hosts.is_empty());
    }

    #[test]
    fn test_update_host_keeps_position() {
        let mut settings = AppSettings::default();
        settings.add_host(host("a")).unwrap();
        settings.add_host(host("b")).unwrap();
        settings.add_host(host("c")).unwrap();

        let mut renamed = host("b2");
        renamed.ip_address = "10.0.0.9".to_string();
        settings.update_host("b", renamed).unwrap();

        assert_eq!(settings.host_names(), vec!["a", "b2", "c"]);
        assert_eq!(settings.host("b2").unwrap().ip_address, "10.0.0.9");
    }

    #[test]
    fn test_update_host_rejects_rename_collision() {
        let mut settings = AppSettings::default();
        settings.add_host(host("a")).unwrap();
        settings.add_host(host("b")).unwrap();

        let err = settings.update_host("b", host("a")).unwrap_err();
        assert!(matches!(err, Error::DuplicateHost(_)));
        assert_eq!(settings.host_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_update_and_remove_unknown_host() {
        let mut settings = AppSettings::default();
        assert!(matches!(
            settings.update_host("ghost", host("ghost")),
            Err(Error::HostNotFound(_))
        ));
        assert!(matches!(settings.remove_host("ghost"), Err(Error::HostNotFound(_))));
    }

    #[test]
    fn test_remove_host() {
        let mut settings = AppSettings::default();
        settings.add_host(host("a")).unwrap();
        settings.add_host(host("b")).unwrap();
        let removed = settings.remove_host("a").unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(settings.host_names(), vec!["b"]);
    }

    #[test]
    fn test_unknown_appearance_mode_deserializes() {
        let json = r#"{"wireguard_config_path": "", "hosts": [], "appearance_mode": "Sepia"}"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.appearance_mode.to_string(), "System");
    }
}
