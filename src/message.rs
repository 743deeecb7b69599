//! Messages processed by the control thread.
//!
//! User intents come from the front-end; the `*Result`/`*Finished` variants
//! are sent back by worker threads and are the only way their results reach
//! application state.

use std::path::PathBuf;

use crate::error::Result;
use crate::state::HostProfile;
use crate::update::UpdateStatus;

/// Which tunnel command a [`Message::VpnResult`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpnOp {
    Connect,
    Disconnect,
}

#[derive(Debug)]
pub enum Message {
    // Tunnel
    Connect,
    Disconnect,
    ToggleVpn,

    // Hosts
    SelectHost(String),
    AddHost(HostProfile),
    UpdateHost {
        original: String,
        host: HostProfile,
    },
    RemoveHost(String),
    /// Wake the named host, or the selected one.
    Wake(Option<String>),
    /// Open a remote desktop session to the named host, or the selected one.
    LaunchRdp(Option<String>),

    // Settings
    SetConfigPath(String),
    Save,
    ClearLogs,

    // Self-update
    CheckUpdates,
    DownloadUpdate,
    InstallUpdate,

    Quit,

    // Worker results
    VpnResult {
        op: VpnOp,
        result: Result<String>,
    },
    WakeResult {
        host: String,
        result: Result<String>,
    },
    RdpResult {
        host: String,
        result: Result<String>,
    },
    UpdateChecked(Result<UpdateStatus>),
    DownloadProgress {
        downloaded: u64,
        total: u64,
    },
    DownloadFinished(Result<PathBuf>),
}
