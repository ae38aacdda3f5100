//! Remote release artifacts.
//!
//! A release is named by a [`VersionRef`]; [`RemoteArtifactFetcher`] expands
//! the configured URL templates for it and downloads the first candidate that
//! exists through a [`Downloader`] (HTTP in production, fakes in tests).

mod error;
mod fetcher;
mod http;
mod traits;
mod version;

pub use error::{FetchError, FetchResult};
pub use fetcher::RemoteArtifactFetcher;
pub use http::HttpDownloader;
pub use traits::Downloader;
pub use version::VersionRef;
