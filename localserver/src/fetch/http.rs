//! HTTP implementation of [`Downloader`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tempfile::NamedTempFile;
use tracing::debug;

use super::traits::Downloader;
use super::{FetchError, FetchResult};

/// Default HTTP request timeout (120 seconds; packs are tens of MB).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Blocking HTTP downloader.
///
/// The body is streamed into a temporary file next to `dest` and renamed into
/// place once complete, so `dest` never holds a partial download.
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
    timeout: Duration,
}

impl std::fmt::Debug for HttpDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDownloader")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDownloader {
    /// Create a new downloader with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new downloader with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("localserver/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to create HTTP client");

        Self { client, timeout }
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> FetchResult<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.map_send_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| FetchError::io(parent, e))?;
        let bytes = response
            .copy_to(temp.as_file_mut())
            .map_err(|e| self.map_send_error(url, e))?;
        temp.persist(dest)
            .map_err(|e| FetchError::io(dest, e.error))?;

        debug!(url = %url, bytes, "Downloaded");
        Ok(bytes)
    }
}
