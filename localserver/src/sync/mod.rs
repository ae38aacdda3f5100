//! Filesystem synchronization primitives.
//!
//! Everything that copies, backs up or prunes directory trees goes through
//! this module so the guarantees hold in one place:
//!
//! - [`backup_then_replace`] never deletes pre-existing content; it renames it
//!   to a timestamped sibling first.
//! - [`copy_tree`] stages a fresh destination next to its final location and
//!   renames it into place, so an interrupted copy never leaves a half-written
//!   destination.
//! - [`remove_tree`] only deletes entries its predicate selects.
//! - [`atomic_write`] and [`atomic_copy`] replace single files through a
//!   temporary sibling and a rename.
//! - [`liveness`] is an advisory check for a lock marker, not a lock.

mod atomic;
mod engine;
mod error;

pub use atomic::{atomic_copy, atomic_write, atomic_write_from};
pub use engine::{
    backup_name, backup_then_replace, copy_tree, dir_stats, liveness, remove_tree,
    remove_unprotected, CopyStats, DirStats, RemoveSummary, LIVENESS_MARKER,
};
pub use error::{SyncError, SyncResult};
