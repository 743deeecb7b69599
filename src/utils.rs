//! Filesystem and time helpers shared across modules.

use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};

use crate::constants;

/// Returns the user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Resolves the configuration directory and creates it if needed.
///
/// An explicit override (flag or environment) wins over the platform default
/// (`~/.config/hostdeck` on Linux, `%APPDATA%\hostdeck` on Windows).
///
/// # Errors
///
/// Returns an error if no config directory can be determined or created.
pub fn get_app_config_dir(override_dir: Option<&Path>) -> std::io::Result<PathBuf> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::config_dir()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not determine the config directory",
                )
            })?
            .join(constants::APP_NAME),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path_str: &str) -> PathBuf {
    if let Some(stripped) = path_str.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path_str)
}

/// Whether the executable lives in a cargo `target/{debug,release}` directory.
///
/// Such binaries are rebuilt from source and must never replace themselves.
pub fn is_source_build(exe: &Path) -> bool {
    let parts: Vec<_> = exe
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    parts
        .windows(2)
        .any(|pair| pair[0] == "target" && (pair[1] == "debug" || pair[1] == "release"))
}

/// Formats a UTC timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`.
pub fn format_now() -> String {
    format_timestamp(Utc::now())
}

/// Current UTC date as `YYYY-MM-DD`.
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_format_timestamp_epoch() {
        assert_eq!(format_timestamp(at(0)), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_format_timestamp_known_instant() {
        assert_eq!(format_timestamp(at(1_700_000_000)), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_format_timestamp_leap_day() {
        assert_eq!(format_timestamp(at(1_709_208_000)), "2024-02-29 12:00:00");
    }

    #[test]
    fn test_today_is_date_only() {
        let today = today();
        assert_eq!(today.len(), 10);
        assert_eq!(&today[4..5], "-");
    }

    #[test]
    fn test_source_build_detection() {
        assert!(is_source_build(Path::new("/home/me/hostdeck/target/debug/hostdeck")));
        assert!(is_source_build(Path::new("/src/target/release/hostdeck")));
        assert!(!is_source_build(Path::new("/opt/hostdeck/hostdeck")));
        assert!(!is_source_build(Path::new("/home/me/target/hostdeck")));
    }

    #[test]
    fn test_expand_home_passthrough() {
        assert_eq!(
            expand_home("/etc/wireguard/wg0.conf"),
            PathBuf::from("/etc/wireguard/wg0.conf")
        );
    }

    #[test]
    fn test_config_dir_override_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let resolved = get_app_config_dir(Some(&nested)).unwrap();
        assert_eq!(resolved, nested);
        assert!(nested.is_dir());
    }
}
