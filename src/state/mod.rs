//! Application state types owned by the control thread.

mod connection;
mod profile;
mod update;

pub use connection::{ConnectionState, VpnSession};
pub use profile::{AppSettings, AppearanceMode, HostProfile};
pub use update::{InstallerState, UpdateTransfer};
