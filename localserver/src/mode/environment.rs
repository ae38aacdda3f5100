//! Environment modes and the world data sets they bind to.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::ModeError;

/// Active server configuration file.
pub const ACTIVE_PROPERTIES: &str = "server.properties";

/// Dimension folder suffixes, in game order.
pub const DIMENSION_SUFFIXES: [&str; 3] = ["", "_nether", "_the_end"];

/// A named environment configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentMode {
    Test,
    Production,
    Fresh,
    Vanilla,
}

/// How a mode's mods directory should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModPolicy {
    /// The whole modpack.
    Full,
    /// Only the protected core dependency.
    FabricApiOnly,
}

/// Role a world data set plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldRole {
    /// Written only by remote sync.
    Backup,
    /// Mutable copy made from a backup.
    WorkingCopy,
    /// Generated by the server, deleted freely.
    Ephemeral,
}

impl fmt::Display for WorldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorldRole::Backup => "backup",
            WorldRole::WorkingCopy => "working copy",
            WorldRole::Ephemeral => "ephemeral",
        })
    }
}

/// A world dimension group: `<base>`, `<base>_nether` and `<base>_the_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldDataSet {
    pub base: &'static str,
    pub role: WorldRole,
}

impl WorldDataSet {
    pub const PRODUCTION_BACKUP: WorldDataSet = WorldDataSet {
        base: "world-production",
        role: WorldRole::Backup,
    };
    pub const PRODUCTION_LOCAL: WorldDataSet = WorldDataSet {
        base: "world-local",
        role: WorldRole::WorkingCopy,
    };

    /// Every group this tool knows about, backups first.
    pub fn known() -> Vec<WorldDataSet> {
        let mut all = vec![Self::PRODUCTION_BACKUP];
        all.extend(EnvironmentMode::ALL.iter().map(|m| m.world()));
        all
    }

    pub fn dimension_names(&self) -> Vec<String> {
        DIMENSION_SUFFIXES
            .iter()
            .map(|s| format!("{}{}", self.base, s))
            .collect()
    }

    /// Dimension folders under `root`, overworld first.
    pub fn dimension_paths(&self, root: &Path) -> Vec<PathBuf> {
        self.dimension_names()
            .into_iter()
            .map(|n| root.join(n))
            .collect()
    }

    /// The overworld folder, which decides whether the group exists.
    pub fn primary_path(&self, root: &Path) -> PathBuf {
        root.join(self.base)
    }

    pub fn exists(&self, root: &Path) -> bool {
        self.primary_path(root).exists()
    }
}

impl EnvironmentMode {
    pub const ALL: [EnvironmentMode; 4] = [
        EnvironmentMode::Test,
        EnvironmentMode::Production,
        EnvironmentMode::Fresh,
        EnvironmentMode::Vanilla,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnvironmentMode::Test => "test",
            EnvironmentMode::Production => "production",
            EnvironmentMode::Fresh => "fresh",
            EnvironmentMode::Vanilla => "vanilla",
        }
    }

    /// Template file name, e.g. `server.properties.production`.
    pub fn template_name(self) -> String {
        format!("{}.{}", ACTIVE_PROPERTIES, self.name())
    }

    /// The world the server runs against in this mode.
    pub fn world(self) -> WorldDataSet {
        match self {
            EnvironmentMode::Production => WorldDataSet::PRODUCTION_LOCAL,
            EnvironmentMode::Test => WorldDataSet {
                base: "world-test",
                role: WorldRole::Ephemeral,
            },
            EnvironmentMode::Fresh => WorldDataSet {
                base: "world-fresh",
                role: WorldRole::Ephemeral,
            },
            EnvironmentMode::Vanilla => WorldDataSet {
                base: "world-vanilla",
                role: WorldRole::Ephemeral,
            },
        }
    }

    /// Backup the working copy is made from, if any.
    pub fn backup(self) -> Option<WorldDataSet> {
        match self {
            EnvironmentMode::Production => Some(WorldDataSet::PRODUCTION_BACKUP),
            _ => None,
        }
    }

    pub fn mod_policy(self) -> ModPolicy {
        match self {
            EnvironmentMode::Vanilla => ModPolicy::FabricApiOnly,
            _ => ModPolicy::Full,
        }
    }

    /// Whether switching to this mode copies the modpack's `config/` into
    /// the server.
    pub fn syncs_pack_config(self) -> bool {
        matches!(self, EnvironmentMode::Production)
    }

    /// Mode whose world is `level_name`, if any.
    pub fn from_level_name(level_name: &str) -> Option<Self> {
        let level_name = level_name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.world().base == level_name)
    }
}

impl fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvironmentMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| ModeError::UnknownMode(s.to_string()))
    }
}
