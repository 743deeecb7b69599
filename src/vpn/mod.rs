//! `WireGuard` tunnel lifecycle.
//!
//! Every call runs one tunnel command synchronously and blocks until it exits,
//! so callers must keep these off the UI thread. There is no re-entrancy
//! guard here; the boundary disables its controls while a call is in flight.
//!
//! | Platform | Connect                                   | Disconnect                                  |
//! |----------|-------------------------------------------|---------------------------------------------|
//! | Linux    | `wg-quick up <config>`                    | `wg-quick down <config>`                    |
//! | Windows  | `wireguard.exe /installtunnelservice <config>` | `wireguard.exe /uninstalltunnelservice <name>` |

pub mod tunnel;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants;
use crate::error::{Error, Result};
use crate::logger::{self, LogLevel};
use crate::platform::{self, Platform};
use crate::process::{CommandOutput, ProcessRunner};

/// Whether a failed tunnel command only says the tunnel was already down.
pub fn is_tunnel_absent(platform: Platform, stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    let platform_markers: &[&str] = match platform {
        Platform::Windows => &constants::TUNNEL_ABSENT_MARKERS_WINDOWS,
        Platform::Linux => &[],
    };
    constants::TUNNEL_ABSENT_MARKERS
        .iter()
        .chain(platform_markers)
        .any(|marker| lower.contains(marker))
}

/// Drives tunnel connect/disconnect through the platform's `WireGuard` tool.
#[derive(Clone)]
pub struct VpnController {
    runner: Arc<dyn ProcessRunner>,
    platform: Platform,
}

impl VpnController {
    pub fn new(runner: Arc<dyn ProcessRunner>, platform: Platform) -> Self {
        Self { runner, platform }
    }

    /// Name of the tunnel tool on this platform.
    pub fn tool_name(&self) -> &'static str {
        match self.platform {
            Platform::Windows => constants::WG_WINDOWS_EXE,
            Platform::Linux => constants::WG_LINUX_EXE,
        }
    }

    /// Locates the tunnel tool: install locations first, then the `PATH`.
    pub fn resolve_tool(&self) -> Option<PathBuf> {
        let known: &[&str] = match self.platform {
            Platform::Windows => &constants::WG_WINDOWS_PATHS,
            Platform::Linux => &constants::WG_LINUX_PATHS,
        };
        platform::locate_tool(self.runner.as_ref(), known, &[self.tool_name()])
    }

    fn require_tool(&self) -> Result<PathBuf> {
        self.resolve_tool().ok_or_else(|| Error::NotInstalled {
            tool: self.tool_name().to_string(),
        })
    }

    fn up_args(&self, config_path: &Path) -> Vec<String> {
        let config = config_path.to_string_lossy().to_string();
        match self.platform {
            Platform::Windows => vec!["/installtunnelservice".to_string(), config],
            Platform::Linux => vec!["up".to_string(), config],
        }
    }

    fn down_args(&self, config_path: &Path, name: &str) -> Vec<String> {
        match self.platform {
            Platform::Windows => vec!["/uninstalltunnelservice".to_string(), name.to_string()],
            Platform::Linux => vec!["down".to_string(), config_path.to_string_lossy().to_string()],
        }
    }

    fn run(&self, tool: &Path, args: &[String]) -> Result<CommandOutput> {
        self.runner.run(tool, args).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotInstalled {
                    tool: self.tool_name().to_string(),
                }
            } else {
                Error::io_at("execute", tool, e)
            }
        })
    }

    /// Brings the tunnel up, after first taking down any stale instance of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty path, [`Error::NotInstalled`]
    /// if the tunnel tool is missing, and [`Error::Process`] carrying the
    /// tool's stderr if the connect command fails.
    pub fn connect(&self, config_path: &Path) -> Result<String> {
        require_config(config_path)?;
        let tool = self.require_tool()?;

        match self.bring_down(&tool, config_path) {
            Ok(msg) => logger::log(LogLevel::Info, "VPN", format!("Pre-connect cleanup: {msg}")),
            // A stale tunnel that cannot be removed makes `up` fail with its own,
            // more specific error, so carry on.
            Err(Error::Process { stderr, .. }) => logger::log(
                LogLevel::Warning,
                "VPN",
                format!("Pre-connect disconnect failed: {}", stderr.trim()),
            ),
            Err(e) => return Err(e),
        }

        let out = self.run(&tool, &self.up_args(config_path))?;
        if out.success {
            Ok(format!(
                "Successfully connected to VPN using {}",
                config_path.display()
            ))
        } else {
            Err(Error::Process {
                action: "VPN connection".to_string(),
                stderr: out.stderr,
            })
        }
    }

    /// Takes the tunnel down. A tunnel that is already down counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty path, [`Error::NotInstalled`]
    /// if the tunnel tool is missing, and [`Error::Process`] carrying the
    /// tool's stderr for any other failure.
    pub fn disconnect(&self, config_path: &Path) -> Result<String> {
        require_config(config_path)?;
        let tool = self.require_tool()?;
        self.bring_down(&tool, config_path)
    }

    fn bring_down(&self, tool: &Path, config_path: &Path) -> Result<String> {
        let name = tunnel::tunnel_name(config_path)?;
        let out = self.run(tool, &self.down_args(config_path, &name))?;

        if out.success {
            Ok(format!("Successfully disconnected from VPN tunnel '{name}'"))
        } else if is_tunnel_absent(self.platform, &out.stderr) {
            Ok(format!("VPN tunnel '{name}' was already down"))
        } else {
            Err(Error::Process {
                action: "VPN disconnection".to_string(),
                stderr: out.stderr,
            })
        }
    }
}

fn require_config(config_path: &Path) -> Result<()> {
    if config_path.as_os_str().is_empty() {
        return Err(Error::Config(constants::MSG_CONFIG_NOT_SET.to_string()));
    }
    Ok(())
}
