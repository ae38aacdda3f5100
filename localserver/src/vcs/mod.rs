//! Version checkout for the external modpack repository.
//!
//! [`VersionCheckoutManager`] moves the repository between its default
//! branch and a release tag, holding at most one set of shelved local
//! changes. The [`VersionControl`] trait is the collaborator seam; [`GitCli`]
//! is the production implementation.

mod error;
mod git;
mod manager;
mod state;
mod traits;

pub use error::{CheckoutError, CheckoutResult, VcsError, VcsResult};
pub use git::GitCli;
pub use manager::{
    CheckoutOptions, CheckoutOutcome, RevisionInfo, StartupCheck, VersionCheckoutManager,
    DIRTY_SUMMARY_LINES,
};
pub use state::{
    CheckoutPhase, CheckoutStateStore, JsonCheckoutStateStore, MemoryCheckoutStateStore, Shelf,
    VersionCheckoutState, STATE_FILE_NAME,
};
pub use traits::{Revision, ShelfHandle, VersionControl};
