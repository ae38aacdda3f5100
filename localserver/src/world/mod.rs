//! Remote world sync.
//!
//! [`WorldSync`] decides what happens around a transfer (liveness check,
//! staging, backup-then-replace, exclusion policy). The transfer itself is
//! delegated to a [`RemoteSync`] collaborator.

mod error;
mod remote;
mod sync;

pub use error::{WorldSyncError, WorldSyncResult};
pub use remote::{ExclusionPolicy, RemoteEndpoint, RemoteSync, RsyncRemoteSync, LARGE_FILE_PATTERNS};
pub use sync::{DownloadOptions, DownloadedWorld, UploadOptions, UploadReport, WorldPair, WorldSync};
