//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`common`] - Prompts and styled output shared by commands
//! - [`config`] - Configuration file management (path, show, init)
//! - [`install`] - Package installation and mod clearing
//! - [`mode`] - Mode switching and status
//! - [`server`] - Server start/stop and raw remote commands
//! - [`version`] - Modpack release checkout
//! - [`world`] - Remote world sync and world resets

pub mod common;
pub mod config;
pub mod install;
pub mod mode;
pub mod server;
pub mod version;
pub mod world;
