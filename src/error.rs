//! Error taxonomy shared by every core component.
//!
//! The `Display` text of each variant is the message shown to the user and
//! appended to the activity log, so it is written as a sentence, not a code.

use std::path::Path;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a core operation can fail with.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid settings.
    #[error("{0}")]
    Config(String),

    /// An external tool could not be found.
    #[error("{tool} command not found. Is it installed and in your PATH?")]
    NotInstalled {
        /// Name of the missing binary.
        tool: String,
    },

    /// An external tool ran and exited non-zero.
    #[error("{action} failed:\n{stderr}")]
    Process {
        /// What was being attempted ("VPN connection", ...).
        action: String,
        /// Standard error of the failed command, verbatim.
        stderr: String,
    },

    /// Transport or HTTP failure.
    #[error("{0}")]
    Network(String),

    /// A required field is empty or malformed.
    #[error("{0}")]
    Validation(String),

    /// A MAC address could not be parsed into six octets.
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// A host with this name already exists.
    #[error("A host named '{0}' already exists.")]
    DuplicateHost(String),

    /// No host with this name exists.
    #[error("No host named '{0}'.")]
    HostNotFound(String),

    /// The running OS has no supported implementation.
    #[error("Unsupported OS: {0}")]
    UnsupportedPlatform(String),

    /// A background worker panicked before reporting its result.
    #[error("{0} stopped unexpectedly.")]
    WorkerLost(String),

    /// File or socket I/O failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done when the failure happened.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wraps an I/O error with a short description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wraps an I/O error that happened on a specific path.
    pub fn io_at(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::io(format!("Failed to {action} {}", path.display()), source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_keeps_stderr_verbatim() {
        let err = Error::Process {
            action: "VPN connection".to_string(),
            stderr: "wg-quick: `wg0' already exists\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "VPN connection failed:\nwg-quick: `wg0' already exists\n"
        );
    }

    #[test]
    fn test_io_at_mentions_path() {
        let err = Error::io_at(
            "write",
            Path::new("/tmp/settings.json"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("Failed to write /tmp/settings.json"));
    }
}
