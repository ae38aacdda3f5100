//! Directory tree operations: copy, backup-then-replace, selective removal.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use super::{SyncError, SyncResult};

/// Marker file a running game server keeps inside each world folder.
pub const LIVENESS_MARKER: &str = "session.lock";

/// Suffix of the staging sibling used while a tree copy is in flight.
const STAGING_SUFFIX: &str = ".partial";

/// Counts from a tree copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Files copied.
    pub files: u64,
    /// Bytes copied.
    pub bytes: u64,
}

/// File count and total size of a directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirStats {
    pub files: u64,
    pub bytes: u64,
}

/// Outcome of a selective removal.
#[derive(Debug, Default)]
pub struct RemoveSummary {
    /// Files that were deleted.
    pub removed: Vec<PathBuf>,
    /// Files the predicate left alone.
    pub kept: usize,
    /// Files selected for removal that could not be deleted (e.g. locked).
    pub failed: Vec<(PathBuf, String)>,
}

impl RemoveSummary {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Build the timestamped backup name for `dest`.
///
/// The name is the original file name followed by an ISO-8601 compact
/// timestamp with millisecond precision, e.g.
/// `world-production-20240301T142530.123`.
pub fn backup_name(dest: &Path, now: DateTime<Local>) -> SyncResult<PathBuf> {
    let base = dest
        .file_name()
        .ok_or_else(|| SyncError::InvalidPath(dest.to_path_buf()))?
        .to_string_lossy();
    let stamp = now.format("%Y%m%dT%H%M%S%.3f");
    Ok(dest.with_file_name(format!("{}-{}", base, stamp)))
}

/// First backup name for `dest` that is not already taken.
fn free_backup_name(dest: &Path) -> SyncResult<PathBuf> {
    let candidate = backup_name(dest, Local::now())?;
    if !exists_no_follow(&candidate) {
        return Ok(candidate);
    }

    let base = candidate.to_string_lossy().into_owned();
    let mut counter = 1u32;
    loop {
        let next = PathBuf::from(format!("{}-{}", base, counter));
        if !exists_no_follow(&next) {
            return Ok(next);
        }
        counter += 1;
    }
}

/// Replace `dest` with a copy of `source`, keeping the old `dest`.
///
/// The copy is staged beside `dest` first. Only once it is complete is the
/// existing `dest` renamed to a timestamped backup name and the staged copy
/// renamed into place. Pre-existing content is never deleted, so repeated
/// calls accumulate one backup each.
///
/// Returns the backup path when a previous `dest` existed.
pub fn backup_then_replace(dest: &Path, source: &Path) -> SyncResult<Option<PathBuf>> {
    if !exists_no_follow(source) {
        return Err(SyncError::SourceMissing(source.to_path_buf()));
    }

    let staging = staging_path(dest)?;
    remove_stale_staging(&staging)?;

    let staged = if source.is_dir() {
        copy_dir_recursive(source, &staging).map(|_| ())
    } else {
        super::atomic_copy(source, &staging).map(|_| ())
    };
    if let Err(e) = staged {
        let _ = remove_any(&staging);
        return Err(e);
    }

    let backup = if exists_no_follow(dest) {
        let backup = free_backup_name(dest)?;
        fs::rename(dest, &backup).map_err(|e| SyncError::io(dest, e))?;
        info!(from = %dest.display(), to = %backup.display(), "Backed up existing destination");
        Some(backup)
    } else {
        None
    };

    fs::rename(&staging, dest).map_err(|e| SyncError::io(dest, e))?;
    Ok(backup)
}

/// Recursively copy `source` into `dest`.
///
/// When `dest` does not exist the tree is staged in a sibling and renamed into
/// place, so an interrupted copy leaves either nothing or a complete tree.
/// When `dest` exists the contents are merged into it, overwriting files
/// with the same relative path.
pub fn copy_tree(dest: &Path, source: &Path) -> SyncResult<CopyStats> {
    if !source.exists() {
        return Err(SyncError::SourceMissing(source.to_path_buf()));
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        }
    }

    if !source.is_dir() {
        let bytes = super::atomic_copy(source, dest)?;
        return Ok(CopyStats { files: 1, bytes });
    }

    if dest.exists() {
        return copy_dir_recursive(source, dest);
    }

    let staging = staging_path(dest)?;
    remove_stale_staging(&staging)?;
    let stats = match copy_dir_recursive(source, &staging) {
        Ok(stats) => stats,
        Err(e) => {
            let _ = remove_any(&staging);
            return Err(e);
        }
    };
    fs::rename(&staging, dest).map_err(|e| SyncError::io(dest, e))?;

    debug!(
        source = %source.display(),
        dest = %dest.display(),
        files = stats.files,
        "Copied tree"
    );
    Ok(stats)
}

/// Delete every file under `path` for which `should_remove` returns true.
///
/// Directories are walked but never removed; symlinks are treated as files
/// and not followed. Per-file failures are collected rather than aborting
/// the walk. A missing `path` is an empty no-op.
pub fn remove_tree<F>(path: &Path, should_remove: F) -> SyncResult<RemoveSummary>
where
    F: Fn(&Path) -> bool,
{
    let mut summary = RemoveSummary::default();
    if !exists_no_follow(path) {
        return Ok(summary);
    }
    remove_walk(path, &should_remove, &mut summary)?;

    if !summary.failed.is_empty() {
        warn!(
            path = %path.display(),
            failed = summary.failed.len(),
            "Some files could not be removed (in use?)"
        );
    }
    Ok(summary)
}

/// Delete every file under `path` that `is_protected` does not claim.
pub fn remove_unprotected<F>(path: &Path, is_protected: F) -> SyncResult<RemoveSummary>
where
    F: Fn(&Path) -> bool,
{
    remove_tree(path, |p| !is_protected(p))
}

fn remove_walk<F>(path: &Path, should_remove: &F, summary: &mut RemoveSummary) -> SyncResult<()>
where
    F: Fn(&Path) -> bool,
{
    let meta = fs::symlink_metadata(path).map_err(|e| SyncError::io(path, e))?;
    if meta.is_dir() {
        let entries = fs::read_dir(path).map_err(|e| SyncError::io(path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| SyncError::io(path, e))?;
            remove_walk(&entry.path(), should_remove, summary)?;
        }
        return Ok(());
    }

    if !should_remove(path) {
        summary.kept += 1;
        return Ok(());
    }

    match fs::remove_file(path) {
        Ok(()) => summary.removed.push(path.to_path_buf()),
        Err(e) => summary.failed.push((path.to_path_buf(), e.to_string())),
    }
    Ok(())
}

/// Advisory check for a running process using the directory at `path`.
///
/// True when the lock marker is present. The marker can be stale, so a true
/// result means "may be running" and callers must treat it as a warning.
pub fn liveness(path: &Path) -> bool {
    path.join(LIVENESS_MARKER).exists()
}

/// Count files and bytes under `path`.
pub fn dir_stats(path: &Path) -> std::io::Result<DirStats> {
    let mut stats = DirStats::default();

    let meta = fs::symlink_metadata(path)?;
    if !meta.is_dir() {
        stats.files = 1;
        stats.bytes = meta.len();
        return Ok(stats);
    }

    for entry in fs::read_dir(path)? {
        let child = dir_stats(&entry?.path())?;
        stats.files += child.files;
        stats.bytes += child.bytes;
    }
    Ok(stats)
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> SyncResult<CopyStats> {
    let mut stats = CopyStats::default();
    fs::create_dir_all(dest).map_err(|e| SyncError::io(dest, e))?;

    let entries = fs::read_dir(source).map_err(|e| SyncError::io(source, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SyncError::io(source, e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| SyncError::io(&from, e))?;

        if file_type.is_dir() {
            let child = copy_dir_recursive(&from, &to)?;
            stats.files += child.files;
            stats.bytes += child.bytes;
        } else {
            let bytes = fs::copy(&from, &to).map_err(|e| SyncError::io(&from, e))?;
            stats.files += 1;
            stats.bytes += bytes;
        }
    }
    Ok(stats)
}

fn staging_path(dest: &Path) -> SyncResult<PathBuf> {
    let name = dest
        .file_name()
        .ok_or_else(|| SyncError::InvalidPath(dest.to_path_buf()))?
        .to_string_lossy();
    Ok(dest.with_file_name(format!(".{}{}", name, STAGING_SUFFIX)))
}

/// A staging sibling can only be left over from an interrupted copy.
fn remove_stale_staging(staging: &Path) -> SyncResult<()> {
    if exists_no_follow(staging) {
        warn!(path = %staging.display(), "Removing leftover staging copy from an interrupted run");
        remove_any(staging).map_err(|e| SyncError::io(staging, e))?;
    }
    Ok(())
}

fn remove_any(path: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn exists_no_follow(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
