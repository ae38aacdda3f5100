//! Release artifact resolution and download.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::traits::Downloader;
use super::{FetchError, FetchResult, VersionRef};

/// Resolves a [`VersionRef`] to candidate URLs and downloads the first one
/// that exists.
pub struct RemoteArtifactFetcher {
    downloader: Arc<dyn Downloader>,
    url_templates: Vec<String>,
}

impl RemoteArtifactFetcher {
    pub fn new(downloader: Arc<dyn Downloader>, url_templates: Vec<String>) -> Self {
        Self {
            downloader,
            url_templates,
        }
    }

    /// Candidate URLs for `version`, in configured order.
    pub fn candidates(&self, version: &VersionRef) -> Vec<String> {
        self.url_templates
            .iter()
            .map(|t| version.expand(t))
            .collect()
    }

    /// Download the archive for `version` into `scratch`.
    ///
    /// Candidates are tried in order. A 404 moves on to the next candidate;
    /// when every candidate 404s the result is
    /// [`FetchError::ArtifactNotFound`]. Any other failure is remembered and,
    /// if nothing succeeds, the last one is returned. Nothing beyond the
    /// candidate list is attempted.
    pub fn fetch(&self, version: &VersionRef, scratch: &Path) -> FetchResult<PathBuf> {
        let candidates = self.candidates(version);
        if candidates.is_empty() {
            return Err(FetchError::NoReleaseSources);
        }

        let mut last_error = None;
        for url in &candidates {
            let dest = scratch.join(artifact_file_name(url, version));
            match self.downloader.download(url, &dest) {
                Ok(bytes) => {
                    info!(version = %version, url = %url, bytes, "Fetched release archive");
                    return Ok(dest);
                }
                Err(FetchError::NotFound { .. }) => {
                    info!(url = %url, "Release archive not at this location");
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Release archive download failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::ArtifactNotFound {
            version: version.tag().to_string(),
            tried: candidates,
        }))
    }
}

/// Local file name for a downloaded archive: the last URL segment, or a name
/// derived from the version when the URL has none.
fn artifact_file_name(url: &str, version: &VersionRef) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() && !segment.contains("..") => segment.to_string(),
        _ => format!("release-{}.mrpack", version.bare()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves canned responses keyed by URL; unknown URLs are 404.
    struct FakeDownloader {
        bodies: HashMap<String, Result<Vec<u8>, String>>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeDownloader {
        fn new(entries: &[(&str, Result<&[u8], &str>)]) -> Self {
            Self {
                bodies: entries
                    .iter()
                    .map(|(u, r)| {
                        (
                            u.to_string(),
                            r.map(|b| b.to_vec()).map_err(|e| e.to_string()),
                        )
                    })
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl Downloader for FakeDownloader {
        fn download(&self, url: &str, dest: &Path) -> FetchResult<u64> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.bodies.get(url) {
                Some(Ok(body)) => {
                    std::fs::write(dest, body).unwrap();
                    Ok(body.len() as u64)
                }
                Some(Err(reason)) => Err(FetchError::Http {
                    url: url.to_string(),
                    reason: reason.clone(),
                }),
                None => Err(FetchError::NotFound {
                    url: url.to_string(),
                }),
            }
        }
    }

    fn templates() -> Vec<String> {
        vec![
            "https://a.example/{tag}/MCC-{version}.mrpack".to_string(),
            "https://b.example/MCC-{version}.mrpack".to_string(),
        ]
    }

    #[test]
    fn test_candidates_use_both_forms() {
        let fetcher = RemoteArtifactFetcher::new(Arc::new(FakeDownloader::new(&[])), templates());
        let version = VersionRef::parse("0.9.50", "v").unwrap();

        assert_eq!(
            fetcher.candidates(&version),
            vec![
                "https://a.example/v0.9.50/MCC-0.9.50.mrpack",
                "https://b.example/MCC-0.9.50.mrpack",
            ]
        );
    }

    #[test]
    fn test_first_success_wins() {
        let temp = TempDir::new().unwrap();
        let downloader = Arc::new(FakeDownloader::new(&[
            ("https://a.example/v1.0.0/MCC-1.0.0.mrpack", Ok(&b"pack-a"[..])),
            ("https://b.example/MCC-1.0.0.mrpack", Ok(&b"pack-b"[..])),
        ]));
        let fetcher = RemoteArtifactFetcher::new(downloader.clone(), templates());
        let version = VersionRef::parse("v1.0.0", "v").unwrap();

        let path = fetcher.fetch(&version, temp.path()).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"pack-a");
        assert_eq!(downloader.requested.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_falls_through_404_to_next_candidate() {
        let temp = TempDir::new().unwrap();
        let downloader = Arc::new(FakeDownloader::new(&[(
            "https://b.example/MCC-1.0.0.mrpack",
            Ok(&b"pack-b"[..]),
        )]));
        let fetcher = RemoteArtifactFetcher::new(downloader, templates());
        let version = VersionRef::parse("1.0.0", "v").unwrap();

        let path = fetcher.fetch(&version, temp.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "MCC-1.0.0.mrpack");
    }

    #[test]
    fn test_all_404_is_artifact_not_found() {
        let temp = TempDir::new().unwrap();
        let fetcher = RemoteArtifactFetcher::new(Arc::new(FakeDownloader::new(&[])), templates());
        let version = VersionRef::parse("9.9.9", "v").unwrap();

        match fetcher.fetch(&version, temp.path()) {
            Err(FetchError::ArtifactNotFound { version, tried }) => {
                assert_eq!(version, "v9.9.9");
                assert_eq!(tried.len(), 2);
            }
            other => panic!("expected ArtifactNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_network_error_is_reported_over_404() {
        let temp = TempDir::new().unwrap();
        let downloader = Arc::new(FakeDownloader::new(&[(
            "https://a.example/v1.0.0/MCC-1.0.0.mrpack",
            Err("connection reset"),
        )]));
        let fetcher = RemoteArtifactFetcher::new(downloader, templates());
        let version = VersionRef::parse("1.0.0", "v").unwrap();

        let err = fetcher.fetch(&version, temp.path()).unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Network);
    }

    #[test]
    fn test_no_templates() {
        let temp = TempDir::new().unwrap();
        let fetcher = RemoteArtifactFetcher::new(Arc::new(FakeDownloader::new(&[])), Vec::new());
        let version = VersionRef::parse("1.0.0", "v").unwrap();

        assert!(matches!(
            fetcher.fetch(&version, temp.path()),
            Err(FetchError::NoReleaseSources)
        ));
    }

    #[test]
    fn test_artifact_file_name() {
        let v = VersionRef::parse("1.0.0", "v").unwrap();
        assert_eq!(
            artifact_file_name("https://x.example/dl/MCC-1.0.0.mrpack?raw=1", &v),
            "MCC-1.0.0.mrpack"
        );
        assert_eq!(artifact_file_name("https://x.example/", &v), "release-1.0.0.mrpack");
    }
}
