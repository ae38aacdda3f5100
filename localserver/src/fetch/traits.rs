//! Collaborator trait for downloads.

use std::path::Path;

use super::FetchResult;

/// Downloads a URL to a local file.
///
/// Abstracts HTTP so the fetcher and installer can be tested without network
/// access. Implementations must return [`super::FetchError::NotFound`] for a
/// 404 so callers can tell "no such release" from a transport failure, and
/// must not leave a partial file at `dest` on failure.
pub trait Downloader: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> FetchResult<u64>;
}
