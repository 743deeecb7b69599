//! Supported operating systems and tool lookup.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::process::ProcessRunner;

/// The two platforms with tunnel, remote desktop and update support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Microsoft Windows.
    Windows,
    /// Linux desktops.
    Linux,
}

impl Platform {
    /// Maps an OS name (as in `std::env::consts::OS`) to a platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] for anything but Windows or Linux.
    pub fn detect(os: &str) -> Result<Self> {
        match os {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }

    /// The platform this binary runs on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] when built for another OS.
    pub fn current() -> Result<Self> {
        Self::detect(std::env::consts::OS)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "Windows"),
            Platform::Linux => write!(f, "Linux"),
        }
    }
}

/// Finds a tool by checking well-known install locations, then the `PATH`.
///
/// `names` are tried in order for the `PATH` search.
pub fn locate_tool(
    runner: &dyn ProcessRunner,
    known_paths: &[&str],
    names: &[&str],
) -> Option<PathBuf> {
    known_paths
        .iter()
        .map(PathBuf::from)
        .find(|path| runner.is_file(path))
        .or_else(|| names.iter().find_map(|name| runner.find_in_path(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;

    #[test]
    fn test_detect_supported() {
        assert_eq!(Platform::detect("windows").unwrap(), Platform::Windows);
        assert_eq!(Platform::detect("linux").unwrap(), Platform::Linux);
    }

    #[test]
    fn test_detect_unsupported() {
        let err = Platform::detect("macos").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform(ref os) if os == "macos"));
        assert_eq!(err.to_string(), "Unsupported OS: macos");
    }

    #[test]
    fn test_locate_prefers_known_path() {
        let runner = FakeRunner::default()
            .with_file("/usr/local/bin/wg-quick")
            .with_path_entry("wg-quick", "/home/me/bin/wg-quick");
        let found = locate_tool(
            &runner,
            &["/usr/bin/wg-quick", "/usr/local/bin/wg-quick"],
            &["wg-quick"],
        );
        assert_eq!(found, Some(PathBuf::from("/usr/local/bin/wg-quick")));
    }

    #[test]
    fn test_locate_falls_back_to_path() {
        let runner = FakeRunner::default().with_path_entry("xfreerdp3", "/opt/bin/xfreerdp3");
        let found = locate_tool(&runner, &[], &["xfreerdp", "xfreerdp3"]);
        assert_eq!(found, Some(PathBuf::from("/opt/bin/xfreerdp3")));
    }

    #[test]
    fn test_locate_missing() {
        let runner = FakeRunner::default();
        assert_eq!(locate_tool(&runner, &["/usr/bin/wg-quick"], &["wg-quick"]), None);
    }
}
