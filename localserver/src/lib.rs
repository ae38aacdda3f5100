//! localserver - mode, version and modpack management for a local game server
//!
//! This library keeps a local server directory in one of several mutually
//! exclusive environment modes, moves an external modpack repository between
//! release tags, and installs modpack packages.
//!
//! # Main components
//!
//! - [`mode::ModeStateManager`]: switches configuration templates, world data
//!   and mod sets between modes
//! - [`vcs::VersionCheckoutManager`]: visits a release tag with local changes
//!   shelved, and returns
//! - [`package::PackageInstaller`]: fetch, parse, filter and deploy a package
//! - [`world::WorldSync`]: download and upload the production world
//!
//! ```ignore
//! use localserver::mode::{EnvironmentMode, SwitchOptions};
//!
//! let report = manager.switch_mode(EnvironmentMode::Production, SwitchOptions::default())?;
//! println!("{:?}", report.world);
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod mode;
pub mod package;
pub mod rcon;
pub mod server;
pub mod sync;
pub mod vcs;
pub mod world;

/// Version of the localserver library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_semver() {
        assert!(semver::Version::parse(VERSION).is_ok());
    }
}
