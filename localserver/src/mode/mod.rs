//! Environment modes and the mode state manager.
//!
//! A mode binds a configuration template, a world data set and a mod-set
//! policy. [`ModeStateManager::switch_mode`] applies one:
//!
//! 1. copy `server.properties.<mode>` over `server.properties` atomically
//! 2. production only: copy the modpack's `config/` into the server
//! 3. create the world working copy from its backup if absent
//! 4. prune or provision mods to satisfy the [`ModPolicy`]
//! 5. record the mode through the [`ModeStore`]
//!
//! [`ModeStateManager::prepare_start`] runs before a server start and
//! tops up the mod set the same way.

mod environment;
mod error;
mod manager;
mod mods;
mod pack_config;
mod store;

pub use environment::{
    EnvironmentMode, ModPolicy, WorldDataSet, WorldRole, ACTIVE_PROPERTIES, DIMENSION_SUFFIXES,
};
pub use error::{ModeError, ModeResult};
pub use manager::{
    ModAction, ModeStateManager, StartPreparation, StatusReport, SwitchOptions, SwitchReport,
    WorldAction, WorldStatus,
};
pub use mods::{
    disable_auto_updater, list_jars, restore_auto_updater, ModProvisioner, ModRules,
    UPDATER_CACHE, UPDATER_JAR,
};
pub use pack_config::{sync_pack_config, CONFIG_DIR};
pub use store::{FileModeStore, MemoryModeStore, ModeStore, MODE_FILE_NAME};
