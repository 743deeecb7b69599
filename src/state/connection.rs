//! VPN session state types.

use std::time::Instant;

/// VPN tunnel state machine.
///
/// `Connecting` and `Disconnecting` only exist while a worker is running the
/// tunnel command; the boundary refuses new VPN requests in those states.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No tunnel is up.
    #[default]
    Disconnected,
    /// Connect command in flight.
    Connecting {
        /// When the attempt started.
        started: Instant,
    },
    /// Tunnel is up.
    Connected {
        /// When the tunnel came up.
        since: Instant,
    },
    /// Disconnect command in flight.
    Disconnecting {
        /// When the attempt started.
        started: Instant,
    },
}

impl ConnectionState {
    /// Whether a tunnel command is currently running.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connecting { .. } | Self::Disconnecting { .. })
    }

    /// Short label for status lines.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting { .. } => "Connecting",
            Self::Connected { .. } => "Connected",
            Self::Disconnecting { .. } => "Disconnecting",
        }
    }
}

/// Derived, never persisted VPN status.
#[derive(Clone, Debug, Default)]
pub struct VpnSession {
    /// Current position in the state machine.
    pub state: ConnectionState,
    /// Message from the last completed tunnel command.
    pub last_message: String,
}

impl VpnSession {
    /// Whether the tunnel is up.
    #[must_use]
    pub fn active(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }
}
