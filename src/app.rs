//! Control-thread application state.
//!
//! [`App`] owns every piece of mutable state. Blocking work (tunnel
//! commands, packets, HTTP) runs on worker threads that get copies of the
//! data they need and report back over the command channel; results are
//! applied in [`App::handle_message`], never from the worker itself.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::constants;
use crate::core::rdp::RemoteDesktopLauncher;
use crate::core::store::ProfileStore;
use crate::core::wol::WakeSender;
use crate::error::{Error, Result};
use crate::logger::{self, LogLevel};
use crate::message::{Message, VpnOp};
use crate::platform::Platform;
use crate::process::{ProcessRunner, SystemRunner};
use crate::state::{AppSettings, ConnectionState, HostProfile, UpdateTransfer, VpnSession};
use crate::update::{
    downloader, InstallOutcome, ReleaseInfo, SelfUpdateInstaller, UpdateChecker, UpdateDownloader,
    UpdateStatus,
};
use crate::vpn::{tunnel, VpnController};

/// Host environment the app drives: how processes run, which platform,
/// and which executable would be replaced by an update.
pub struct Services {
    pub runner: Arc<dyn ProcessRunner>,
    pub platform: Platform,
    pub current_exe: PathBuf,
    pub pid: u32,
}

impl Services {
    /// The real system.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported OS or if the executable path is unavailable.
    pub fn system() -> Result<Self> {
        let current_exe = std::env::current_exe()
            .map_err(|e| Error::io("Failed to locate the running executable", e))?;
        Ok(Self {
            runner: Arc::new(SystemRunner),
            platform: Platform::current()?,
            current_exe,
            pid: std::process::id(),
        })
    }
}

/// Main application state.
pub struct App {
    /// Set by `Quit` or after the update handoff started.
    pub should_quit: bool,
    /// In-memory settings; persisted only on `Save`.
    pub settings: AppSettings,
    /// Host targeted by wake/RDP when none is named.
    pub selected_host: Option<String>,
    pub session: VpnSession,
    /// Present while a download runs.
    pub transfer: Option<UpdateTransfer>,
    /// Newer release found by the last check.
    pub available_update: Option<ReleaseInfo>,
    /// Finished download waiting to be installed.
    pub downloaded_update: Option<PathBuf>,
    pub checking_update: bool,
    /// Settings changed since the last save.
    pub dirty: bool,

    platform: Platform,
    config: AppConfig,
    store: ProfileStore,
    vpn: VpnController,
    rdp: RemoteDesktopLauncher,
    wake: WakeSender,
    checker: UpdateChecker,
    installer: SelfUpdateInstaller,
    handoff_ready: bool,
    /// State to restore when a disconnect fails.
    pre_op_state: ConnectionState,

    // === Async Communication ===
    in_flight: usize,
    cmd_tx: mpsc::Sender<Message>,
    cmd_rx: mpsc::Receiver<Message>,
}

impl App {
    /// Loads settings from `store` and wires the services.
    pub fn new(store: ProfileStore, config: AppConfig, services: Services) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Message>();
        let settings = store.load();
        let selected_host = settings.hosts.first().map(|h| h.name.clone());

        let app = Self {
            should_quit: false,
            settings,
            selected_host,
            session: VpnSession::default(),
            transfer: None,
            available_update: None,
            downloaded_update: None,
            checking_update: false,
            dirty: false,

            platform: services.platform,
            vpn: VpnController::new(services.runner.clone(), services.platform),
            rdp: RemoteDesktopLauncher::new(services.runner.clone(), services.platform),
            wake: WakeSender::from_config(&config.wake),
            checker: UpdateChecker::from_config(&config.update),
            installer: SelfUpdateInstaller::new(
                services.runner,
                services.platform,
                services.current_exe,
                services.pid,
            ),
            config,
            store,
            handoff_ready: false,
            pre_op_state: ConnectionState::Disconnected,

            in_flight: 0,
            cmd_tx,
            cmd_rx,
        };

        logger::log(
            LogLevel::Info,
            "APP",
            format!(
                "{} {} {} on {}",
                constants::MSG_STARTED,
                constants::APP_NAME,
                constants::CURRENT_VERSION,
                app.platform
            ),
        );
        logger::log(
            LogLevel::Info,
            "APP",
            format!(
                "Loaded {} host(s) from {}",
                app.settings.hosts.len(),
                app.store.path().display()
            ),
        );
        app
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Whether any worker has not reported back yet.
    pub fn busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Whether the update handoff is running and the process must exit.
    pub fn handoff_ready(&self) -> bool {
        self.handoff_ready
    }

    /// Gives up the app for the installer, to exit into the handoff.
    pub fn into_installer(self) -> SelfUpdateInstaller {
        self.installer
    }

    /// Applies every worker result received so far.
    pub fn process_external(&mut self) {
        while let Ok(msg) = self.cmd_rx.try_recv() {
            self.handle_message(msg);
        }
    }

    /// Blocks until every outstanding worker has reported back.
    pub fn wait_idle(&mut self) {
        while self.in_flight > 0 {
            match self.cmd_rx.recv() {
                Ok(msg) => self.handle_message(msg),
                Err(_) => break,
            }
        }
    }

    /// Runs `job` on a worker thread. If it panics, `lost` is sent in place
    /// of its result so the in-flight count still drops.
    fn spawn_worker<F>(&mut self, lost: Message, job: F)
    where
        F: FnOnce(&mpsc::Sender<Message>) + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.cmd_tx.clone();
        std::thread::spawn(move || {
            if panic::catch_unwind(AssertUnwindSafe(|| job(&tx))).is_err() {
                let _ = tx.send(lost);
            }
        });
    }

    fn worker_done(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Handles one message on the control thread.
    pub fn handle_message(&mut self, msg: Message) {
        match msg {
            // Tunnel
            Message::Connect => self.start_vpn(VpnOp::Connect),
            Message::Disconnect => self.start_vpn(VpnOp::Disconnect),
            Message::ToggleVpn => {
                let op = if self.session.active() {
                    VpnOp::Disconnect
                } else {
                    VpnOp::Connect
                };
                self.start_vpn(op);
            }
            Message::VpnResult { op, result } => {
                self.worker_done();
                self.finish_vpn(op, result);
            }

            // Hosts
            Message::SelectHost(name) => {
                if self.settings.host(&name).is_some() {
                    self.selected_host = Some(name);
                } else {
                    logger::log(LogLevel::Error, "HOST", Error::HostNotFound(name).to_string());
                }
            }
            Message::AddHost(host) => self.add_host(host),
            Message::UpdateHost { original, host } => self.update_host(&original, host),
            Message::RemoveHost(name) => self.remove_host(&name),
            Message::Wake(name) => self.wake_host(name),
            Message::WakeResult { host, result } => {
                self.worker_done();
                match result {
                    Ok(msg) => logger::log(LogLevel::Success, "WOL", format!("{host}: {msg}")),
                    Err(e) => logger::log(LogLevel::Error, "WOL", format!("{host}: {e}")),
                }
            }
            Message::LaunchRdp(name) => self.launch_rdp(name),
            Message::RdpResult { host, result } => {
                self.worker_done();
                match result {
                    Ok(msg) => logger::log(LogLevel::Success, "RDP", format!("{host}: {msg}")),
                    Err(e) => logger::log(LogLevel::Error, "RDP", format!("{host}: {e}")),
                }
            }

            // Settings
            Message::SetConfigPath(input) => self.set_config_path(&input),
            Message::Save => match self.store.save(&self.settings) {
                Ok(()) => {
                    self.dirty = false;
                    logger::log(LogLevel::Success, "SETTINGS", constants::MSG_SETTINGS_SAVED);
                }
                Err(e) => logger::log(
                    LogLevel::Error,
                    "SETTINGS",
                    format!("Failed to save settings: {e}"),
                ),
            },
            Message::ClearLogs => logger::clear_logs(),

            // Self-update
            Message::CheckUpdates => self.check_updates(),
            Message::UpdateChecked(result) => {
                self.worker_done();
                self.finish_check(result);
            }
            Message::DownloadUpdate => self.download_update(),
            Message::DownloadProgress { downloaded, total } => {
                if let Some(transfer) = self.transfer.as_mut() {
                    transfer.downloaded_bytes = downloaded;
                    transfer.total_bytes = total;
                }
            }
            Message::DownloadFinished(result) => {
                self.worker_done();
                self.transfer = None;
                match result {
                    Ok(path) => {
                        logger::log(
                            LogLevel::Success,
                            "UPDATE",
                            format!("Update downloaded to {}. Ready to install.", path.display()),
                        );
                        self.downloaded_update = Some(path);
                    }
                    Err(e) => {
                        logger::log(LogLevel::Error, "UPDATE", format!("Download failed: {e}"));
                    }
                }
            }
            Message::InstallUpdate => self.install_update(),

            Message::Quit => {
                if self.dirty {
                    logger::log(LogLevel::Warning, "SETTINGS", "Unsaved changes discarded.");
                }
                self.should_quit = true;
            }
        }
    }

    // === Tunnel ===

    fn start_vpn(&mut self, op: VpnOp) {
        if self.session.state.is_transient() {
            logger::log(
                LogLevel::Warning,
                "VPN",
                format!("VPN operation {}.", constants::MSG_BUSY),
            );
            return;
        }

        let config_path = self.settings.wireguard_config_path.trim().to_string();
        if config_path.is_empty() {
            logger::log(LogLevel::Error, "VPN", constants::MSG_CONFIG_NOT_SET);
            self.session.last_message = constants::MSG_CONFIG_NOT_SET.to_string();
            return;
        }

        self.pre_op_state = self.session.state.clone();
        let started = Instant::now();
        self.session.state = match op {
            VpnOp::Connect => ConnectionState::Connecting { started },
            VpnOp::Disconnect => ConnectionState::Disconnecting { started },
        };
        logger::log(
            LogLevel::Info,
            "VPN",
            format!("{} using {config_path}...", self.session.state.label()),
        );

        let vpn = self.vpn.clone();
        let lost = Message::VpnResult {
            op,
            result: Err(Error::WorkerLost("VPN operation".to_string())),
        };
        self.spawn_worker(lost, move |tx| {
            let path = PathBuf::from(config_path);
            let result = match op {
                VpnOp::Connect => vpn.connect(&path),
                VpnOp::Disconnect => vpn.disconnect(&path),
            };
            let _ = tx.send(Message::VpnResult { op, result });
        });
    }

    fn finish_vpn(&mut self, op: VpnOp, result: Result<String>) {
        match result {
            Ok(msg) => {
                self.session.state = match op {
                    VpnOp::Connect => ConnectionState::Connected {
                        since: Instant::now(),
                    },
                    VpnOp::Disconnect => ConnectionState::Disconnected,
                };
                logger::log(LogLevel::Success, "VPN", msg.as_str());
                self.session.last_message = msg;
            }
            Err(e) => {
                // A failed connect already tore the tunnel down first.
                self.session.state = match op {
                    VpnOp::Connect => ConnectionState::Disconnected,
                    VpnOp::Disconnect => std::mem::take(&mut self.pre_op_state),
                };
                let msg = e.to_string();
                logger::log(LogLevel::Error, "VPN", msg.as_str());
                self.session.last_message = msg;
            }
        }
    }

    // === Hosts ===

    fn add_host(&mut self, host: HostProfile) {
        let name = host.name.clone();
        match self.settings.add_host(host) {
            Ok(()) => {
                self.dirty = true;
                if self.selected_host.is_none() {
                    self.selected_host = Some(name.clone());
                }
                logger::log(LogLevel::Success, "HOST", format!("Added host: {name}"));
            }
            Err(e) => logger::log(LogLevel::Error, "HOST", e.to_string()),
        }
    }

    fn update_host(&mut self, original: &str, host: HostProfile) {
        let name = host.name.clone();
        match self.settings.update_host(original, host) {
            Ok(()) => {
                self.dirty = true;
                if self.selected_host.as_deref() == Some(original) {
                    self.selected_host = Some(name.clone());
                }
                logger::log(LogLevel::Success, "HOST", format!("Updated host: {name}"));
            }
            Err(e) => logger::log(LogLevel::Error, "HOST", e.to_string()),
        }
    }

    fn remove_host(&mut self, name: &str) {
        match self.settings.remove_host(name) {
            Ok(removed) => {
                self.dirty = true;
                if self.selected_host.as_deref() == Some(name) {
                    self.selected_host = self.settings.hosts.first().map(|h| h.name.clone());
                }
                logger::log(LogLevel::Success, "HOST", format!("Removed host: {}", removed.name));
            }
            Err(e) => logger::log(LogLevel::Error, "HOST", e.to_string()),
        }
    }

    /// The named host, or the selected one. Logs why when there is none.
    fn target_host(&self, name: Option<String>, category: &str) -> Option<HostProfile> {
        let Some(name) = name.or_else(|| self.selected_host.clone()) else {
            logger::log(LogLevel::Error, category, constants::MSG_NO_HOST_SELECTED);
            return None;
        };
        let host = self.settings.host(&name).cloned();
        if host.is_none() {
            logger::log(LogLevel::Error, category, Error::HostNotFound(name).to_string());
        }
        host
    }

    fn wake_host(&mut self, name: Option<String>) {
        let Some(host) = self.target_host(name, "WOL") else {
            return;
        };
        let sender = self.wake;
        logger::log(
            LogLevel::Info,
            "WOL",
            format!("Sending magic packet to {} via {}...", host.name, sender.target()),
        );
        let lost = Message::WakeResult {
            host: host.name.clone(),
            result: Err(Error::WorkerLost("Wake-on-LAN".to_string())),
        };
        self.spawn_worker(lost, move |tx| {
            let result = sender.wake(&host.mac_address);
            let _ = tx.send(Message::WakeResult {
                host: host.name,
                result,
            });
        });
    }

    fn launch_rdp(&mut self, name: Option<String>) {
        let Some(host) = self.target_host(name, "RDP") else {
            return;
        };
        let launcher = self.rdp.clone();
        let lost = Message::RdpResult {
            host: host.name.clone(),
            result: Err(Error::WorkerLost("Remote desktop launch".to_string())),
        };
        self.spawn_worker(lost, move |tx| {
            let result = launcher.launch(&host.ip_address, Some(&host.rdp_user));
            let _ = tx.send(Message::RdpResult {
                host: host.name,
                result,
            });
        });
    }

    // === Settings ===

    fn set_config_path(&mut self, input: &str) {
        let path = match tunnel::resolve_config_path(input) {
            Ok(path) => path,
            Err(e) => {
                logger::log(LogLevel::Error, "SETTINGS", e.to_string());
                return;
            }
        };

        self.settings.wireguard_config_path = path.to_string_lossy().to_string();
        self.dirty = true;
        match tunnel::inspect(&path) {
            Ok(info) => {
                let endpoint = info
                    .endpoint
                    .map(|host| format!(" (endpoint {host})"))
                    .unwrap_or_default();
                logger::log(
                    LogLevel::Info,
                    "SETTINGS",
                    format!("WireGuard config set: tunnel '{}'{endpoint}", info.name),
                );
            }
            Err(e) => logger::log(LogLevel::Warning, "SETTINGS", e.to_string()),
        }
    }

    // === Self-update ===

    fn check_updates(&mut self) {
        if self.checking_update {
            logger::log(
                LogLevel::Warning,
                "UPDATE",
                format!("Update check {}.", constants::MSG_BUSY),
            );
            return;
        }
        self.checking_update = true;
        logger::log(LogLevel::Info, "UPDATE", "Checking for updates...");

        let checker = self.checker.clone();
        let lost = Message::UpdateChecked(Err(Error::WorkerLost("Update check".to_string())));
        self.spawn_worker(lost, move |tx| {
            let result = checker.check(constants::CURRENT_VERSION);
            let _ = tx.send(Message::UpdateChecked(result));
        });
    }

    fn finish_check(&mut self, result: Result<UpdateStatus>) {
        self.checking_update = false;
        match result {
            Ok(UpdateStatus::NoUpdate) => {
                self.available_update = None;
                logger::log(LogLevel::Info, "UPDATE", constants::MSG_NO_UPDATE);
            }
            Ok(UpdateStatus::UpdateAvailable { version, assets }) => {
                logger::log(
                    LogLevel::Success,
                    "UPDATE",
                    format!("Update available: {version} (current {})", constants::CURRENT_VERSION),
                );
                self.available_update = Some(ReleaseInfo {
                    latest_version: version,
                    assets,
                });
            }
            Err(e) => logger::log(LogLevel::Error, "UPDATE", format!("Update check failed: {e}")),
        }
    }

    fn download_update(&mut self) {
        if self.transfer.is_some() {
            logger::log(LogLevel::Warning, "UPDATE", format!("Download {}.", constants::MSG_BUSY));
            return;
        }
        let Some(release) = &self.available_update else {
            logger::log(
                LogLevel::Warning,
                "UPDATE",
                "No update available. Check for updates first.",
            );
            return;
        };
        let Some(asset) = downloader::get_appropriate_asset(
            &release.assets,
            self.platform,
            &self.config.update.asset_keyword,
        )
        .cloned() else {
            logger::log(LogLevel::Error, "UPDATE", constants::MSG_NO_ASSET);
            return;
        };

        let dest = downloader::download_path(self.installer.current_exe(), &asset.name);
        self.downloaded_update = None;
        self.transfer = Some(UpdateTransfer {
            downloaded_bytes: 0,
            total_bytes: 0,
            target_path: dest.clone(),
        });
        logger::log(LogLevel::Info, "UPDATE", format!("Downloading {}...", asset.name));

        let lost = Message::DownloadFinished(Err(Error::WorkerLost("Download".to_string())));
        self.spawn_worker(lost, move |tx| {
            let progress_tx = tx.clone();
            let result = UpdateDownloader.download(&asset.download_url, &dest, |downloaded, total| {
                let _ = progress_tx.send(Message::DownloadProgress { downloaded, total });
            });
            let _ = tx.send(Message::DownloadFinished(result.map(|_| dest)));
        });
    }

    fn install_update(&mut self) {
        let Some(path) = self.downloaded_update.clone() else {
            logger::log(LogLevel::Warning, "UPDATE", "No downloaded update to install.");
            return;
        };
        match self.installer.install(&path) {
            Ok(InstallOutcome::SkippedSourceBuild) => {}
            Ok(InstallOutcome::HandoffLaunched { .. }) => {
                self.handoff_ready = true;
                self.should_quit = true;
            }
            Err(e) => logger::log(LogLevel::Error, "UPDATE", format!("Update failed: {e}")),
        }
    }
}
