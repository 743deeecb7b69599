//! Application-wide constants and configuration values.
//!
//! This module defines all static configuration values used throughout hostdeck,
//! including tool locations, update feed defaults, file names, and UI messages.

use std::time::Duration;

// === Application Metadata ===

/// Application name (from Cargo.toml).
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
/// Current application version (from Cargo.toml).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Version tag as published in the release feed.
pub const CURRENT_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

// === Timing Configuration ===

/// Console tick rate in milliseconds.
pub const DEFAULT_TICK_RATE: u64 = 250;
/// Delay the handoff script waits before touching the executable.
pub const HANDOFF_DELAY_SECS: u64 = 2;

// === Path Configuration ===

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "HOSTDECK_CONFIG_DIR";
/// Name of the persisted host/tunnel settings file.
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Name of the application configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Name of the logs subdirectory.
pub const LOGS_DIR_NAME: &str = "logs";

// === Tunnel Tooling ===

/// `WireGuard` tunnel manager on Windows.
pub const WG_WINDOWS_EXE: &str = "wireguard.exe";
/// Install locations checked before the PATH on Windows.
pub const WG_WINDOWS_PATHS: [&str; 2] = [
    r"C:\Program Files\WireGuard\wireguard.exe",
    r"C:\Program Files (x86)\WireGuard\wireguard.exe",
];
/// `WireGuard` tunnel manager on Linux.
pub const WG_LINUX_EXE: &str = "wg-quick";
/// Install locations checked before the PATH on Linux.
pub const WG_LINUX_PATHS: [&str; 3] = [
    "/usr/bin/wg-quick",
    "/usr/local/bin/wg-quick",
    "/bin/wg-quick",
];

/// Failure output fragments meaning the tunnel was already down (lowercase).
pub const TUNNEL_ABSENT_MARKERS: [&str; 3] = [
    "tunnel not found",
    "no such device",
    "is not a wireguard interface",
];
/// Extra markers on Windows: the tunnel service is not installed.
pub const TUNNEL_ABSENT_MARKERS_WINDOWS: [&str; 1] = ["does not exist as an installed service"];

// === Remote Desktop ===

/// Remote desktop client on Windows.
pub const RDP_WINDOWS_EXE: &str = "mstsc.exe";
/// Install locations checked before the PATH on Windows.
pub const RDP_WINDOWS_PATHS: [&str; 1] = [r"C:\Windows\System32\mstsc.exe"];
/// Remote desktop clients on Linux, in order of preference.
pub const RDP_LINUX_EXES: [&str; 2] = ["xfreerdp", "xfreerdp3"];

// === Wake-on-LAN ===

/// Conventional Wake-on-LAN port.
pub const WOL_PORT: u16 = 9;
/// Size of a magic packet in bytes.
pub const MAGIC_PACKET_LEN: usize = 102;

// === Update Feed ===

/// Release repository queried for updates.
pub const UPDATE_REPOSITORY: &str = "EmmanouelKontos/vpn-rdp-tool";
/// Base URL of the release API.
pub const UPDATE_API_BASE: &str = "https://api.github.com";
/// Substring identifying the Linux release asset.
pub const UPDATE_ASSET_KEYWORD: &str = "UniversalVPNTool";
/// Chunk size used when streaming downloads to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;
/// Suffix appended to a downloaded replacement executable.
pub const DOWNLOAD_SUFFIX: &str = "new";
/// Suffix given to the executable being replaced.
pub const BACKUP_SUFFIX: &str = "old";
/// Timeout for establishing HTTP connections. Transfers themselves are unbounded.
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// === Logging ===

/// Maximum entries kept in the in-memory activity log.
pub const MAX_LOG_ENTRIES: usize = 500;
/// Size at which the daily log file is rotated.
pub const LOG_ROTATE_BYTES: u64 = 5 * 1024 * 1024;
/// Default number of days log files are kept.
pub const LOG_RETENTION_DAYS: u64 = 7;

// === Messages ===

pub const MSG_STARTED: &str = "Application started.";
pub const MSG_CONFIG_NOT_SET: &str = "WireGuard config path not set in Settings.";
pub const MSG_NO_HOST_SELECTED: &str = "No host selected.";
pub const MSG_NO_UPDATE: &str = "You are running the latest version.";
pub const MSG_NO_ASSET: &str = "No appropriate asset found for this OS.";
pub const MSG_SOURCE_BUILD: &str =
    "Self-update is only available for packaged builds. Rebuild from source to update.";
pub const MSG_BUSY: &str = "already in progress";
pub const MSG_SETTINGS_SAVED: &str = "Settings saved successfully.";

// === Error Messages ===

pub const ERR_SERVER_ERROR: &str = "Server returned error: ";
pub const ERR_HTTP_CLIENT_BUILD_FAILED: &str = "Failed to build HTTP client";
pub const ERR_NETWORK_REQUEST_FAILED: &str = "Network request failed";
pub const ERR_READ_CONTENT_FAILED: &str = "Failed to read content";
pub const ERR_FEED_DECODE_FAILED: &str = "Failed to decode release feed";
