//! Release asset download.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use url::Url;

use super::checker::Asset;
use crate::constants;
use crate::error::{Error, Result};
use crate::logger::{self, LogLevel};
use crate::platform::Platform;

/// Picks the release asset meant for `platform`.
///
/// Windows takes the first `.exe`; Linux takes the first asset whose name
/// contains `keyword` and is not an `.exe`. The extension match is
/// case-sensitive, as release assets are named.
#[allow(clippy::case_sensitive_file_extension_comparisons)]
pub fn get_appropriate_asset<'a>(
    assets: &'a [Asset],
    platform: Platform,
    keyword: &str,
) -> Option<&'a Asset> {
    assets.iter().find(|asset| {
        let is_exe = asset.name.ends_with(".exe");
        match platform {
            Platform::Windows => is_exe,
            Platform::Linux => asset.name.contains(keyword) && !is_exe,
        }
    })
}

/// Where a downloaded asset is stored: beside `current_exe`, as `<asset>.new`.
pub fn download_path(current_exe: &Path, asset_name: &str) -> PathBuf {
    let dir = current_exe.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{asset_name}.{}", constants::DOWNLOAD_SUFFIX))
}

/// Copies `reader` into `dest` in fixed-size chunks.
///
/// `on_progress(downloaded, total)` runs after every chunk; `total` is passed
/// through unchanged and may be zero. The destination is written in place,
/// so a failure leaves a partial file behind.
///
/// # Errors
///
/// Returns [`Error::Io`] if the destination cannot be created or written,
/// and [`Error::Network`] if reading the source fails.
pub fn stream_to_file<R, F>(
    mut reader: R,
    total: u64,
    dest: &Path,
    mut on_progress: F,
) -> Result<u64>
where
    R: Read,
    F: FnMut(u64, u64),
{
    let mut file = File::create(dest).map_err(|e| Error::io_at("create", dest, e))?;
    let mut buf = vec![0u8; constants::DOWNLOAD_CHUNK_SIZE];
    let mut downloaded: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::Network(format!(
                    "{}: {e}",
                    constants::ERR_READ_CONTENT_FAILED
                )))
            }
        };
        file.write_all(&buf[..n])
            .map_err(|e| Error::io_at("write", dest, e))?;
        downloaded += n as u64;
        on_progress(downloaded, total);
    }

    file.flush().map_err(|e| Error::io_at("write", dest, e))?;
    Ok(downloaded)
}

/// Streams release assets to disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateDownloader;

impl UpdateDownloader {
    /// Downloads `url` to `dest`, reporting progress after every chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] for a bad URL, a transport failure or a
    /// non-success status, and [`Error::Io`] if the file cannot be written.
    pub fn download<F>(&self, url: &str, dest: &Path, on_progress: F) -> Result<u64>
    where
        F: FnMut(u64, u64),
    {
        let url = Url::parse(url)
            .map_err(|e| Error::Network(format!("Invalid download URL '{url}': {e}")))?;

        let client = super::http_client()?;
        let response = client
            .get(url.clone())
            .send()
            .map_err(|e| {
                Error::Network(format!("{}: {e}", constants::ERR_NETWORK_REQUEST_FAILED))
            })?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "{}{}",
                constants::ERR_SERVER_ERROR,
                response.status()
            )));
        }

        let total = response.content_length().unwrap_or(0);
        logger::log(
            LogLevel::Info,
            "UPDATE",
            format!("Downloading {url} ({total} bytes) to {}", dest.display()),
        );

        let written = stream_to_file(response, total, dest, on_progress)?;
        logger::log(
            LogLevel::Success,
            "UPDATE",
            format!("Downloaded {written} bytes to {}", dest.display()),
        );
        Ok(written)
    }
}
