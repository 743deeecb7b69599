//! Self-update: release check, asset download and executable handoff.
//!
//! The pieces run in order `checker -> downloader -> installer`; each one is
//! blocking and is driven from a worker thread by the app.

pub mod checker;
pub mod downloader;
pub mod handoff;
pub mod installer;

use reqwest::blocking::Client;
use std::time::Duration;

use crate::constants;
use crate::error::{Error, Result};

pub use checker::{Asset, ReleaseInfo, UpdateChecker, UpdateStatus};
pub use downloader::UpdateDownloader;
pub use installer::{InstallOutcome, SelfUpdateInstaller};

/// Blocking HTTP client shared by the checker and the downloader.
///
/// Only connection setup is bounded; a transfer may take as long as it takes.
pub(crate) fn http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(constants::HTTP_CONNECT_TIMEOUT)
        .timeout(None::<Duration>)
        .user_agent(format!("{}/{}", constants::APP_NAME, constants::APP_VERSION))
        .build()
        .map_err(|e| Error::Network(format!("{}: {e}", constants::ERR_HTTP_CLIENT_BUILD_FAILED)))
}
