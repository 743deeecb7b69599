//! Release feed queries.

use serde::Deserialize;

use crate::config::UpdateConfig;
use crate::constants;
use crate::error::{Error, Result};

/// A downloadable release artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// The parts of a "latest release" document we use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseInfo {
    #[serde(rename = "tag_name")]
    pub latest_version: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Outcome of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    NoUpdate,
    UpdateAvailable { version: String, assets: Vec<Asset> },
}

/// Whether `latest` sorts after `current`.
///
/// This is a plain string comparison, not semantic versioning: `"v1.10.0"`
/// sorts *before* `"v1.9.0"`. Release tags are expected to keep a fixed width.
pub fn is_newer(latest: &str, current: &str) -> bool {
    latest > current
}

/// Compares a fetched release with the running version.
pub fn evaluate(release: ReleaseInfo, current_version: &str) -> UpdateStatus {
    if is_newer(&release.latest_version, current_version) {
        UpdateStatus::UpdateAvailable {
            version: release.latest_version,
            assets: release.assets,
        }
    } else {
        UpdateStatus::NoUpdate
    }
}

/// Decodes a "latest release" JSON document.
///
/// # Errors
///
/// Returns [`Error::Network`] if the body is not a release document.
pub fn parse_release(body: &[u8]) -> Result<ReleaseInfo> {
    serde_json::from_slice(body)
        .map_err(|e| Error::Network(format!("{}: {e}", constants::ERR_FEED_DECODE_FAILED)))
}

/// Queries the fixed release feed.
#[derive(Debug, Clone)]
pub struct UpdateChecker {
    feed_url: String,
}

impl UpdateChecker {
    /// Checker for an explicit "latest release" URL.
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
        }
    }

    /// Checker for the repository configured in `[update]`.
    pub fn from_config(config: &UpdateConfig) -> Self {
        Self::new(config.latest_release_url())
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    /// Fetches the latest release and compares it with `current_version`.
    ///
    /// One request, no retries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on transport failure, a non-success HTTP
    /// status, or an undecodable body.
    pub fn check(&self, current_version: &str) -> Result<UpdateStatus> {
        let client = super::http_client()?;
        let response = client
            .get(&self.feed_url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
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

        let body = response
            .bytes()
            .map_err(|e| Error::Network(format!("{}: {e}", constants::ERR_READ_CONTENT_FAILED)))?;
        let release = parse_release(&body)?;
        Ok(evaluate(release, current_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    const FEED: &str = r#"{
        "tag_name": "v1.0.8",
        "name": "Release 1.0.8",
        "assets": [
            {"name": "tool.exe", "browser_download_url": "https://example.com/tool.exe", "size": 10},
            {"name": "tool-UniversalVPNTool", "browser_download_url": "https://example.com/tool-UniversalVPNTool"}
        ]
    }"#;

    fn release(tag: &str) -> ReleaseInfo {
        ReleaseInfo {
            latest_version: tag.to_string(),
            assets: Vec::new(),
        }
    }

    #[test]
    fn test_parse_release_extracts_tag_and_assets() {
        let info = parse_release(FEED.as_bytes()).unwrap();
        assert_eq!(info.latest_version, "v1.0.8");
        assert_eq!(info.assets.len(), 2);
        assert_eq!(info.assets[0].name, "tool.exe");
        assert_eq!(info.assets[0].download_url, "https://example.com/tool.exe");
    }

    #[test]
    fn test_parse_release_rejects_garbage() {
        assert!(matches!(parse_release(b"<html>"), Err(Error::Network(_))));
        assert!(matches!(parse_release(br#"{"message": "Not Found"}"#), Err(Error::Network(_))));
    }

    #[test]
    fn test_newer_tag_reports_update() {
        let status = evaluate(parse_release(FEED.as_bytes()).unwrap(), "v1.0.7");
        match status {
            UpdateStatus::UpdateAvailable { version, assets } => {
                assert_eq!(version, "v1.0.8");
                assert_eq!(assets.len(), 2);
            }
            UpdateStatus::NoUpdate => panic!("expected an update"),
        }
    }

    #[test]
    fn test_same_or_older_tag_reports_no_update() {
        assert_eq!(evaluate(release("v1.0.7"), "v1.0.7"), UpdateStatus::NoUpdate);
        assert_eq!(evaluate(release("v1.0.6"), "v1.0.7"), UpdateStatus::NoUpdate);
    }

    #[test]
    fn test_comparison_is_lexicographic_not_semantic() {
        // Known ordering edge case: "1" < "9" at the first differing byte,
        // so a two-digit minor version sorts before a one-digit one.
        assert!(!is_newer("v1.10.0", "v1.9.0"));
        assert!(is_newer("v1.9.0", "v1.10.0"));
        assert_eq!(evaluate(release("v1.10.0"), "v1.9.0"), UpdateStatus::NoUpdate);
    }

    /// Serves one canned HTTP response on a loopback port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/repos/me/tool/releases/latest")
    }

    #[test]
    fn test_check_against_local_feed() {
        let url = serve_once("HTTP/1.1 200 OK", FEED);
        let status = UpdateChecker::new(url).check("v1.0.7").unwrap();
        assert!(matches!(
            status,
            UpdateStatus::UpdateAvailable { ref version, .. } if version == "v1.0.8"
        ));
    }

    #[test]
    fn test_check_http_error_is_network_error() {
        let url = serve_once("HTTP/1.1 404 Not Found", r#"{"message": "Not Found"}"#);
        let err = UpdateChecker::new(url).check("v1.0.7").unwrap_err();
        assert!(matches!(err, Error::Network(ref m) if m.contains("404")));
    }

    #[test]
    fn test_check_unreachable_feed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = UpdateChecker::new(format!("http://{addr}/latest"))
            .check("v1.0.7")
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
