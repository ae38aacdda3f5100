//! User configuration.
//!
//! A single INI file (`~/.localserver/config.ini` by default) describes where
//! the server lives, how to reach its remote console, where the modpack
//! repository and its releases are, and how to reach the production host for
//! world sync.
//!
//! # Example
//!
//! ```
//! use localserver::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.server.port, 25565);
//! assert_eq!(config.modpack.tag_prefix, "v");
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, LoggingSettings, ModpackSettings, RconSettings, ServerSettings, SyncSettings,
};
