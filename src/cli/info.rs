//! Environment diagnostics for `hostdeck info`.
//!
//! Only reports what is needed to debug a setup: versions, paths and whether
//! the external tools resolve. Host addresses and credentials are left out.

use std::fmt::Write as _;
use std::path::Path;

use super::commands::Context;
use crate::constants;
use crate::core::rdp::RemoteDesktopLauncher;
use crate::core::store::ProfileStore;
use crate::utils;
use crate::vpn::{tunnel, VpnController};

/// Diagnostic data collected for the report.
struct InfoReport {
    version: String,
    install_method: String,
    os_info: String,
    arch: String,
    config_dir: String,
    config_toml_status: String,
    vpn_tool: (&'static str, Option<String>),
    rdp_client: Option<String>,
    host_count: usize,
    tunnel: String,
    feed_url: String,
}

/// Prints the diagnostics report.
pub fn run(ctx: &Context) {
    print!("{}", render(&collect(ctx)));
}

fn collect(ctx: &Context) -> InfoReport {
    let config_file = ctx.config_dir.join(constants::CONFIG_FILE_NAME);
    let config_toml_status = if config_file.is_file() {
        "found".to_string()
    } else {
        "not found (using defaults)".to_string()
    };

    let settings = ProfileStore::in_dir(&ctx.config_dir).load();
    let tunnel = tunnel_status(settings.wireguard_config_path.trim());

    let vpn = VpnController::new(ctx.services.runner.clone(), ctx.services.platform);
    let rdp = RemoteDesktopLauncher::new(ctx.services.runner.clone(), ctx.services.platform);

    InfoReport {
        version: constants::APP_VERSION.to_string(),
        install_method: install_method(&ctx.services.current_exe).to_string(),
        os_info: os_info(),
        arch: std::env::consts::ARCH.to_string(),
        config_dir: ctx.config_dir.display().to_string(),
        config_toml_status,
        vpn_tool: (
            vpn.tool_name(),
            vpn.resolve_tool().map(|p| p.display().to_string()),
        ),
        rdp_client: rdp.resolve_client().map(|p| p.display().to_string()),
        host_count: settings.hosts.len(),
        tunnel,
        feed_url: ctx.config.update.latest_release_url(),
    }
}

fn tunnel_status(config_path: &str) -> String {
    if config_path.is_empty() {
        return "not set".to_string();
    }
    match tunnel::inspect(Path::new(config_path)) {
        Ok(info) => match info.endpoint {
            Some(endpoint) => format!("{} (endpoint {endpoint})", info.name),
            None => info.name,
        },
        Err(e) => format!("unreadable ({e})"),
    }
}

/// Classifies how the running binary was installed.
fn install_method(exe: &Path) -> &'static str {
    if utils::is_source_build(exe) {
        return "built from source";
    }
    let exe = exe.to_string_lossy().replace('\\', "/");
    if exe.contains("/.cargo/bin/") {
        "cargo install"
    } else if exe.contains("/usr/bin/") || exe.contains("/usr/local/bin/") {
        "system package"
    } else {
        "binary (self-updating)"
    }
}

fn os_info() -> String {
    #[cfg(target_os = "linux")]
    {
        linux_distro_name().unwrap_or_else(|| "Linux".to_string())
    }

    #[cfg(not(target_os = "linux"))]
    {
        std::env::consts::OS.to_string()
    }
}

#[cfg(target_os = "linux")]
fn linux_distro_name() -> Option<String> {
    let content = std::fs::read_to_string("/etc/os-release").ok()?;
    pretty_name(&content)
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn pretty_name(os_release: &str) -> Option<String> {
    os_release
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|value| value.trim_matches('"').to_string())
}

fn render(info: &InfoReport) -> String {
    let mut out = String::new();
    let found = |path: &Option<String>| path.clone().unwrap_or_else(|| "not found".to_string());

    let _ = writeln!(out, "{} {} ({})", constants::APP_NAME, info.version, info.install_method);
    let _ = writeln!(out, "  OS:           {} ({})", info.os_info, info.arch);
    let _ = writeln!(out, "\n  Tools:");
    let _ = writeln!(out, "    {:<14} {}", info.vpn_tool.0, found(&info.vpn_tool.1));
    let _ = writeln!(out, "    {:<14} {}", "rdp client", found(&info.rdp_client));
    let _ = writeln!(out, "\n  Config:");
    let _ = writeln!(out, "    Directory:   {}", info.config_dir);
    let _ = writeln!(out, "    config.toml: {}", info.config_toml_status);
    let _ = writeln!(out, "    Hosts:       {}", info.host_count);
    let _ = writeln!(out, "    Tunnel:      {}", info.tunnel);
    let _ = writeln!(out, "    Updates:     {}", info.feed_url);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Services;
    use crate::config::AppConfig;
    use crate::platform::Platform;
    use crate::process::fake::FakeRunner;
    use std::sync::Arc;

    #[test]
    fn test_install_method() {
        assert_eq!(
            install_method(Path::new("/home/me/src/hostdeck/target/release/hostdeck")),
            "built from source"
        );
        assert_eq!(install_method(Path::new("/home/me/.cargo/bin/hostdeck")), "cargo install");
        assert_eq!(install_method(Path::new("/usr/bin/hostdeck")), "system package");
        assert_eq!(install_method(Path::new("/opt/hostdeck/hostdeck")), "binary (self-updating)");
    }

    #[test]
    fn test_pretty_name() {
        let content = "NAME=\"Ubuntu\"\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\nID=ubuntu\n";
        assert_eq!(pretty_name(content).as_deref(), Some("Ubuntu 24.04 LTS"));
        assert_eq!(pretty_name("ID=arch\n"), None);
    }

    #[test]
    fn test_tunnel_status() {
        assert_eq!(tunnel_status(""), "not set");
        assert!(tunnel_status("/nonexistent/office.conf").starts_with("unreadable"));

        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("office.conf");
        std::fs::write(&conf, "[Peer]\nEndpoint = vpn.example.com:51820\n").unwrap();
        assert_eq!(
            tunnel_status(&conf.display().to_string()),
            "office (endpoint vpn.example.com)"
        );
    }

    #[test]
    fn test_report_lists_tools_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default().with_file("/usr/bin/wg-quick"));
        let ctx = Context {
            config_dir: dir.path().to_path_buf(),
            config: AppConfig::default(),
            services: Services {
                runner,
                platform: Platform::Linux,
                current_exe: dir.path().join("hostdeck"),
                pid: 1,
            },
        };

        let text = render(&collect(&ctx));
        assert!(text.contains("wg-quick       /usr/bin/wg-quick"));
        assert!(text.contains("rdp client     not found"));
        assert!(text.contains("config.toml: not found (using defaults)"));
        assert!(text.contains("Hosts:       0"));
        assert!(text.contains("Tunnel:      not set"));
        assert!(text.contains("binary (self-updating)"));
    }
}
