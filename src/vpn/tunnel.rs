//! `WireGuard` configuration file handling.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils;

/// What the UI shows about the configured tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelInfo {
    /// Tunnel identifier (config file name without extension).
    pub name: String,
    /// Host part of the first `[Peer]` endpoint, if any.
    pub endpoint: Option<String>,
}

/// Derives the tunnel identifier from a config path: its base name without extension.
///
/// # Errors
///
/// Returns [`Error::Config`] if the path has no usable file name.
pub fn tunnel_name(config_path: &Path) -> Result<String> {
    config_path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            Error::Config(format!(
                "Cannot derive a tunnel name from {}",
                config_path.display()
            ))
        })
}

/// Validates a user-entered config path.
///
/// Expands `~/`, and requires an existing regular file.
///
/// # Errors
///
/// Returns [`Error::Config`] for an empty input, a missing path or a directory.
pub fn resolve_config_path(input: &str) -> Result<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::Config("WireGuard config path is empty.".to_string()));
    }

    let path = utils::expand_home(input);
    if !path.exists() {
        return Err(Error::Config(format!("File not found: {}", path.display())));
    }
    if !path.is_file() {
        return Err(Error::Config(format!("Not a file: {}", path.display())));
    }
    Ok(path)
}

/// Reads the config and summarizes it.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read.
pub fn inspect(config_path: &Path) -> Result<TunnelInfo> {
    let content =
        fs::read_to_string(config_path).map_err(|e| Error::io_at("read", config_path, e))?;
    Ok(TunnelInfo {
        name: tunnel_name(config_path)?,
        endpoint: parse_endpoint(&content),
    })
}

/// Extracts the host of the first `Endpoint = host:port` line.
fn parse_endpoint(content: &str) -> Option<String> {
    for line in content.lines() {
        let line = line.trim();
        if !line.to_lowercase().starts_with("endpoint") {
            continue;
        }
        let value = line.split_once('=')?.1.trim();
        // [v6::addr]:port
        if let Some(rest) = value.strip_prefix('[') {
            return rest.split(']').next().map(ToString::to_string);
        }
        let host = value.rsplit_once(':').map_or(value, |(host, _)| host);
        if !host.is_empty() {
            return Some(host.to_string());
        }
    }
    None
}
