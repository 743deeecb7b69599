//! Remote desktop client launching.

use std::path::PathBuf;
use std::sync::Arc;

use crate::constants;
use crate::error::{Error, Result};
use crate::platform::{self, Platform};
use crate::process::ProcessRunner;

/// Builds the client argument list for `ip_address`.
///
/// `mstsc` has no username flag, so on Windows a username only asks the
/// client to prompt for credentials.
pub fn client_args(platform: Platform, ip_address: &str, username: Option<&str>) -> Vec<String> {
    let mut args = vec![format!("/v:{ip_address}")];
    let username = username.map(str::trim).filter(|u| !u.is_empty());
    match (platform, username) {
        (Platform::Windows, Some(_)) => args.push("/prompt".to_string()),
        (Platform::Linux, Some(user)) => args.push(format!("/u:{user}")),
        (_, None) => {}
    }
    args
}

/// Spawns remote desktop sessions and forgets about them.
#[derive(Clone)]
pub struct RemoteDesktopLauncher {
    runner: Arc<dyn ProcessRunner>,
    platform: Platform,
}

impl RemoteDesktopLauncher {
    pub fn new(runner: Arc<dyn ProcessRunner>, platform: Platform) -> Self {
        Self { runner, platform }
    }

    /// Locates the platform's remote desktop client.
    pub fn resolve_client(&self) -> Option<PathBuf> {
        match self.platform {
            Platform::Windows => platform::locate_tool(
                self.runner.as_ref(),
                &constants::RDP_WINDOWS_PATHS,
                &[constants::RDP_WINDOWS_EXE],
            ),
            Platform::Linux => {
                platform::locate_tool(self.runner.as_ref(), &[], &constants::RDP_LINUX_EXES)
            }
        }
    }

    fn client_label(&self) -> &'static str {
        match self.platform {
            Platform::Windows => constants::RDP_WINDOWS_EXE,
            Platform::Linux => constants::RDP_LINUX_EXES[0],
        }
    }

    /// Starts a detached client session for `ip_address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty address,
    /// [`Error::NotInstalled`] if no client binary exists, and
    /// [`Error::Io`] if the spawn itself fails.
    pub fn launch(&self, ip_address: &str, username: Option<&str>) -> Result<String> {
        let ip_address = ip_address.trim();
        if ip_address.is_empty() {
            return Err(Error::Validation("Host has no IP address.".to_string()));
        }

        let client = self.resolve_client().ok_or_else(|| Error::NotInstalled {
            tool: self.client_label().to_string(),
        })?;
        let args = client_args(self.platform, ip_address, username);

        match self.runner.spawn_detached(&client, &args) {
            Ok(_) => Ok(format!("RDP client launched for {ip_address}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotInstalled {
                tool: self.client_label().to_string(),
            }),
            Err(e) => Err(Error::io_at("launch", &client, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;

    #[test]
    fn test_client_args_linux_with_user() {
        assert_eq!(
            client_args(Platform::Linux, "10.0.0.5", Some("admin")),
            vec!["/v:10.0.0.5", "/u:admin"]
        );
    }

    #[test]
    fn test_client_args_windows_prompts_for_user() {
        assert_eq!(
            client_args(Platform::Windows, "10.0.0.5", Some("admin")),
            vec!["/v:10.0.0.5", "/prompt"]
        );
    }

    #[test]
    fn test_client_args_without_user() {
        assert_eq!(client_args(Platform::Linux, "pc.lan", None), vec!["/v:pc.lan"]);
        assert_eq!(client_args(Platform::Windows, "pc.lan", Some("  ")), vec!["/v:pc.lan"]);
    }

    #[test]
    fn test_launch_spawns_detached_client() {
        let runner =
            Arc::new(FakeRunner::default().with_path_entry("xfreerdp", "/usr/bin/xfreerdp"));
        let launcher = RemoteDesktopLauncher::new(runner.clone(), Platform::Linux);

        let msg = launcher.launch("10.0.0.5", Some("admin")).unwrap();
        assert_eq!(msg, "RDP client launched for 10.0.0.5");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].detached);
        assert_eq!(calls[0].program, PathBuf::from("/usr/bin/xfreerdp"));
        assert_eq!(calls[0].args, vec!["/v:10.0.0.5", "/u:admin"]);
    }

    #[test]
    fn test_launch_windows_uses_system32_client() {
        let runner = Arc::new(FakeRunner::default().with_file(r"C:\Windows\System32\mstsc.exe"));
        let launcher = RemoteDesktopLauncher::new(runner.clone(), Platform::Windows);
        launcher.launch("10.0.0.5", None).unwrap();
        assert_eq!(
            runner.calls()[0].program,
            PathBuf::from(r"C:\Windows\System32\mstsc.exe")
        );
    }

    #[test]
    fn test_launch_missing_client() {
        let runner = Arc::new(FakeRunner::default());
        let launcher = RemoteDesktopLauncher::new(runner.clone(), Platform::Linux);
        let err = launcher.launch("10.0.0.5", None).unwrap_err();
        assert!(matches!(err, Error::NotInstalled { ref tool } if tool == "xfreerdp"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_launch_rejects_empty_address() {
        let runner =
            Arc::new(FakeRunner::default().with_path_entry("xfreerdp", "/usr/bin/xfreerdp"));
        let launcher = RemoteDesktopLauncher::new(runner, Platform::Linux);
        assert!(matches!(launcher.launch(" ", None), Err(Error::Validation(_))));
    }

    #[test]
    fn test_launch_spawn_not_found_maps_to_not_installed() {
        let runner = Arc::new(
            FakeRunner::default()
                .with_path_entry("xfreerdp", "/usr/bin/xfreerdp")
                .respond(Err(std::io::Error::from(std::io::ErrorKind::NotFound))),
        );
        let launcher = RemoteDesktopLauncher::new(runner, Platform::Linux);
        assert!(matches!(
            launcher.launch("10.0.0.5", None),
            Err(Error::NotInstalled { .. })
        ));
    }
}
