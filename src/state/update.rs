//! Self-update state types.

use std::path::PathBuf;

/// Progress of an in-flight asset download.
///
/// Exists only while a download runs; `total_bytes` is zero when the server
/// does not announce a length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateTransfer {
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    pub target_path: PathBuf,
}

impl UpdateTransfer {
    /// Completion in percent, if the total is known.
    #[must_use]
    pub fn percent(&self) -> Option<u8> {
        if self.total_bytes == 0 {
            return None;
        }
        let pct = (self.downloaded_bytes.min(self.total_bytes) * 100) / self.total_bytes;
        u8::try_from(pct).ok()
    }
}

/// Self-update installer state machine.
///
/// `Idle -> ScriptWritten -> HandoffLaunched -> ProcessExiting`. A failure
/// before `HandoffLaunched` leaves the process running.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InstallerState {
    #[default]
    Idle,
    /// Handoff script is on disk, not yet started.
    ScriptWritten(PathBuf),
    /// Handoff script is running detached.
    HandoffLaunched,
    /// Terminal: this process is about to exit.
    ProcessExiting,
}
