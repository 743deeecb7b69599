//! CLI subcommand handlers.
//!
//! One-shot commands call the core components directly on the main thread,
//! log the outcome, and save host changes themselves.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::args::{Commands, HostsAction};
use crate::app::Services;
use crate::config::AppConfig;
use crate::constants;
use crate::core::rdp::RemoteDesktopLauncher;
use crate::core::store::ProfileStore;
use crate::core::wol::WakeSender;
use crate::error::Error;
use crate::logger::{self, LogLevel};
use crate::state::{AppSettings, HostProfile};
use crate::update::{
    downloader, InstallOutcome, SelfUpdateInstaller, UpdateChecker, UpdateDownloader,
    UpdateStatus,
};
use crate::vpn::{tunnel, VpnController};

/// Everything a one-shot command needs.
pub struct Context {
    pub config_dir: PathBuf,
    pub config: AppConfig,
    pub services: Services,
}

impl Context {
    fn store(&self) -> ProfileStore {
        ProfileStore::in_dir(&self.config_dir)
    }
}

/// Logs an operation result and prints the success message.
fn report(category: &str, result: crate::Result<String>) -> Result<()> {
    match result {
        Ok(msg) => {
            logger::log(LogLevel::Success, category, msg.as_str());
            println!("{msg}");
            Ok(())
        }
        Err(e) => {
            logger::log(LogLevel::Error, category, e.to_string());
            Err(e.into())
        }
    }
}

fn find_host(settings: &AppSettings, name: &str) -> crate::Result<HostProfile> {
    settings
        .host(name)
        .cloned()
        .ok_or_else(|| Error::HostNotFound(name.to_string()))
}

/// Runs one subcommand.
///
/// # Errors
///
/// Returns the failed operation's error.
pub fn run(command: Commands, ctx: Context) -> Result<()> {
    match command {
        Commands::Hosts { action } => hosts(action, &ctx),
        Commands::SetConfig { path } => set_config(&path, &ctx),
        Commands::Connect => {
            let settings = ctx.store().load();
            let vpn = VpnController::new(ctx.services.runner.clone(), ctx.services.platform);
            report("VPN", vpn.connect(Path::new(settings.wireguard_config_path.trim())))
        }
        Commands::Disconnect => {
            let settings = ctx.store().load();
            let vpn = VpnController::new(ctx.services.runner.clone(), ctx.services.platform);
            report("VPN", vpn.disconnect(Path::new(settings.wireguard_config_path.trim())))
        }
        Commands::Wake { host } => {
            let host = find_host(&ctx.store().load(), &host)?;
            let sender = WakeSender::from_config(&ctx.config.wake);
            report(
                "WOL",
                sender
                    .wake(&host.mac_address)
                    .map(|msg| format!("{}: {msg}", host.name)),
            )
        }
        Commands::Rdp { host } => {
            let host = find_host(&ctx.store().load(), &host)?;
            let launcher =
                RemoteDesktopLauncher::new(ctx.services.runner.clone(), ctx.services.platform);
            report("RDP", launcher.launch(&host.ip_address, Some(&host.rdp_user)))
        }
        Commands::Update { check } => update(check, ctx),
        Commands::Info => {
            super::info::run(&ctx);
            Ok(())
        }
    }
}

fn hosts(action: HostsAction, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let mut settings = store.load();

    let result = match action {
        HostsAction::List => {
            if settings.hosts.is_empty() {
                println!("No hosts saved in {}", store.path().display());
            }
            for host in &settings.hosts {
                println!(
                    "{:<20} {:<16} {:<18} {}",
                    host.name, host.ip_address, host.mac_address, host.rdp_user
                );
            }
            return Ok(());
        }
        HostsAction::Add(fields) => fields
            .to_profile()
            .and_then(|host| {
                let name = host.name.clone();
                settings.add_host(host).map(|()| name)
            })
            .map(|name| format!("Added host: {name}")),
        HostsAction::Edit { original, edits } => find_host(&settings, &original)
            .and_then(|current| edits.apply(&current))
            .and_then(|host| {
                let name = host.name.clone();
                settings.update_host(&original, host).map(|()| name)
            })
            .map(|name| format!("Updated host: {name}")),
        HostsAction::Remove { name } => settings
            .remove_host(&name)
            .map(|host| format!("Removed host: {}", host.name)),
    };

    let result = result.and_then(|msg| store.save(&settings).map(|()| msg));
    report("HOST", result)
}

fn set_config(input: &str, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let mut settings = store.load();

    let result = tunnel::resolve_config_path(input).and_then(|path| {
        let info = tunnel::inspect(&path)?;
        settings.wireguard_config_path = path.to_string_lossy().to_string();
        store.save(&settings)?;
        let endpoint = info
            .endpoint
            .map(|host| format!(", endpoint {host}"))
            .unwrap_or_default();
        Ok(format!(
            "WireGuard config set to {} (tunnel '{}'{endpoint})",
            path.display(),
            info.name
        ))
    });
    report("SETTINGS", result)
}

fn update(check_only: bool, ctx: Context) -> Result<()> {
    let checker = UpdateChecker::from_config(&ctx.config.update);
    let status = checker.check(constants::CURRENT_VERSION).map_err(|e| {
        logger::log(LogLevel::Error, "UPDATE", format!("Update check failed: {e}"));
        e
    })?;

    let UpdateStatus::UpdateAvailable { version, assets } = status else {
        logger::log(LogLevel::Info, "UPDATE", constants::MSG_NO_UPDATE);
        println!("{}", constants::MSG_NO_UPDATE);
        return Ok(());
    };
    println!(
        "Update available: {version} (current {})",
        constants::CURRENT_VERSION
    );
    logger::log(LogLevel::Info, "UPDATE", format!("Update available: {version}"));
    if check_only {
        return Ok(());
    }

    let services = ctx.services;
    let mut installer = SelfUpdateInstaller::new(
        services.runner,
        services.platform,
        services.current_exe,
        services.pid,
    );
    if !installer.is_packaged() {
        println!("{}", constants::MSG_SOURCE_BUILD);
        return Ok(());
    }

    let keyword = &ctx.config.update.asset_keyword;
    let asset = downloader::get_appropriate_asset(&assets, services.platform, keyword)
        .ok_or_else(|| eyre!(constants::MSG_NO_ASSET))?;
    let dest = downloader::download_path(installer.current_exe(), &asset.name);

    println!("Downloading {}...", asset.name);
    let mut stderr = std::io::stderr();
    UpdateDownloader.download(&asset.download_url, &dest, |downloaded, total| {
        if total > 0 {
            let _ = write!(stderr, "\r  {:>3}%", downloaded * 100 / total);
        } else {
            let _ = write!(stderr, "\r  {downloaded} bytes");
        }
        let _ = stderr.flush();
    })?;
    eprintln!();

    match installer.install(&dest)? {
        InstallOutcome::SkippedSourceBuild => Ok(()),
        InstallOutcome::HandoffLaunched { .. } => {
            println!("Restarting into {version}...");
            installer.terminate()
        }
    }
}
