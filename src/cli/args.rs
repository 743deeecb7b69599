//! Command-line argument definitions.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::constants;
use crate::error::Result;
use crate::state::HostProfile;

/// hostdeck - WireGuard, Wake-on-LAN and remote desktop for your hosts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration directory (settings.json, config.toml, logs/)
    #[arg(long, global = true, env = constants::CONFIG_DIR_ENV, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Subcommand to execute; without one an interactive console starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage host profiles
    Hosts {
        #[command(subcommand)]
        action: HostsAction,
    },
    /// Set and save the WireGuard configuration file
    SetConfig {
        /// Path to a .conf file (`~/` is expanded)
        path: String,
    },
    /// Bring the configured tunnel up
    Connect,
    /// Take the configured tunnel down
    Disconnect,
    /// Send a Wake-on-LAN packet to a host
    Wake {
        /// Host name
        host: String,
    },
    /// Open a remote desktop session to a host
    Rdp {
        /// Host name
        host: String,
    },
    /// Check for a new release and install it
    Update {
        /// Only report whether an update is available
        #[arg(long)]
        check: bool,
    },
    /// Show version, environment and tool diagnostics
    Info,
}

/// Host profile subcommands
#[derive(Subcommand, Debug)]
pub enum HostsAction {
    /// List saved hosts
    List,
    /// Add a host
    Add(HostFields),
    /// Change fields of an existing host
    Edit {
        /// Current host name
        original: String,
        #[command(flatten)]
        edits: HostEdits,
    },
    /// Remove a host
    Remove {
        /// Host name
        name: String,
    },
}

/// All four host fields, positionally.
#[derive(ClapArgs, Debug, Clone)]
pub struct HostFields {
    /// Unique display name
    pub name: String,
    /// Address for remote desktop
    pub ip: String,
    /// MAC address for Wake-on-LAN
    pub mac: String,
    /// Remote desktop user
    pub user: String,
}

impl HostFields {
    /// Validated profile.
    ///
    /// # Errors
    ///
    /// Fails if any field is blank.
    pub fn to_profile(&self) -> Result<HostProfile> {
        HostProfile::new(&self.name, &self.ip, &self.mac, &self.user)
    }
}

/// Optional replacements for host fields.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct HostEdits {
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New IP address
    #[arg(long)]
    pub ip: Option<String>,
    /// New MAC address
    #[arg(long)]
    pub mac: Option<String>,
    /// New remote desktop user
    #[arg(long)]
    pub user: Option<String>,
}

impl HostEdits {
    /// `current` with the given fields replaced.
    ///
    /// # Errors
    ///
    /// Fails if a replacement is blank.
    pub fn apply(&self, current: &HostProfile) -> Result<HostProfile> {
        HostProfile::new(
            self.name.as_deref().unwrap_or(&current.name),
            self.ip.as_deref().unwrap_or(&current.ip_address),
            self.mac.as_deref().unwrap_or(&current.mac_address),
            self.user.as_deref().unwrap_or(&current.rdp_user),
        )
    }
}
