//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Game server settings
    pub server: ServerSettings,
    /// Remote console settings
    pub rcon: RconSettings,
    /// Modpack repository and release settings
    pub modpack: ModpackSettings,
    /// Remote world sync settings
    pub sync: SyncSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Game server configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Server directory holding server.properties, mods/ and the worlds
    pub root: PathBuf,
    /// Java executable used to launch the server
    pub java_path: PathBuf,
    /// Server launcher jar, relative to `root`
    pub server_jar: String,
    /// Game port, probed for status display
    pub port: u16,
    /// JVM arguments passed before `-jar`
    pub jvm_args: Vec<String>,
}

/// RCON configuration.
#[derive(Debug, Clone)]
pub struct RconSettings {
    pub host: String,
    pub port: u16,
    /// RCON password; RCON features are unavailable when unset
    pub password: Option<String>,
}

/// Modpack configuration.
#[derive(Debug, Clone)]
pub struct ModpackSettings {
    /// Git checkout of the modpack; relative paths resolve against the server root
    pub repo_dir: PathBuf,
    /// Branch to return to after visiting a release tag
    pub default_branch: String,
    /// Prefix carried by release tags (e.g. "v" in "v0.9.50")
    pub tag_prefix: String,
    /// Release archive URL templates, tried in order. `{tag}` and `{version}`
    /// are replaced with the tag form and bare form of the requested version.
    pub release_urls: Vec<String>,
    /// File name prefix of exported `.mrpack` artifacts
    pub artifact_glob_prefix: String,
    /// Name fragment of the one mod that vanilla mode keeps
    pub protected_mod: String,
    /// Jar count at which the full mod set is considered present
    pub min_mod_count: usize,
    /// Scratch directory parent for downloads (system temp when unset)
    pub temp_dir: Option<PathBuf>,
    /// Packwiz executable used to export a package when none exists
    /// (a `packwiz` binary in `repo_dir`, then `PATH`, when unset)
    pub packwiz: Option<PathBuf>,
}

/// Remote world sync configuration.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    /// Remote world folders, in dimension order (overworld, nether, end)
    pub remote_worlds: Vec<String>,
    /// Skip large auxiliary database files during sync
    pub exclude_large_files: bool,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl ConfigFile {
    /// Absolute path of the modpack repository.
    pub fn repo_dir(&self) -> PathBuf {
        if self.modpack.repo_dir.is_absolute() {
            self.modpack.repo_dir.clone()
        } else {
            self.server.root.join(&self.modpack.repo_dir)
        }
    }

    /// Absolute path of the server launcher jar.
    pub fn server_jar_path(&self) -> PathBuf {
        self.server.root.join(&self.server.server_jar)
    }

    /// Whether enough `[sync]` settings are present to reach the remote host.
    pub fn sync_configured(&self) -> bool {
        self.sync.host.is_some() && self.sync.username.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_dir_relative_to_root() {
        let mut config = ConfigFile::default();
        config.server.root = PathBuf::from("/srv/mc/server");
        config.modpack.repo_dir = PathBuf::from("../MCC");

        assert_eq!(config.repo_dir(), PathBuf::from("/srv/mc/server/../MCC"));
    }

    #[test]
    fn test_repo_dir_absolute() {
        let mut config = ConfigFile::default();
        config.modpack.repo_dir = PathBuf::from("/opt/MCC");

        assert_eq!(config.repo_dir(), PathBuf::from("/opt/MCC"));
    }

    #[test]
    fn test_sync_configured() {
        let mut config = ConfigFile::default();
        assert!(!config.sync_configured());

        config.sync.host = Some("mc.example.net".to_string());
        config.sync.username = Some("admin".to_string());
        assert!(config.sync_configured());
    }
}
