//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;

use super::settings::*;

/// Default server launcher jar.
pub const DEFAULT_SERVER_JAR: &str = "fabric-server-launch.jar";

/// Default game port.
pub const DEFAULT_SERVER_PORT: u16 = 25565;

/// Default RCON host.
pub const DEFAULT_RCON_HOST: &str = "127.0.0.1";

/// Default RCON port.
pub const DEFAULT_RCON_PORT: u16 = 25575;

/// Default modpack repository, relative to the server root.
pub const DEFAULT_REPO_DIR: &str = "../MCC";

/// Default modpack branch.
pub const DEFAULT_BRANCH: &str = "main";

/// Default release tag prefix.
pub const DEFAULT_TAG_PREFIX: &str = "v";

/// Default exported artifact prefix.
pub const DEFAULT_ARTIFACT_PREFIX: &str = "MCC-";

/// Default protected mod name fragment.
pub const DEFAULT_PROTECTED_MOD: &str = "fabric-api";

/// Jar count at which the full mod set counts as present.
pub const DEFAULT_MIN_MOD_COUNT: usize = 10;

/// Default SFTP port of the hosting panel.
pub const DEFAULT_SYNC_PORT: u16 = 2022;

/// Default remote world folders.
pub const DEFAULT_REMOTE_WORLDS: [&str; 3] = ["/world", "/world_nether", "/world_the_end"];

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "localserver.log";

/// Default JVM arguments (G1GC set commonly used for modded servers).
pub const DEFAULT_JVM_ARGS: [&str; 21] = [
    "-Xms4G",
    "-Xmx4G",
    "-XX:+UseG1GC",
    "-XX:+ParallelRefProcEnabled",
    "-XX:MaxGCPauseMillis=200",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:+DisableExplicitGC",
    "-XX:+AlwaysPreTouch",
    "-XX:G1NewSizePercent=30",
    "-XX:G1MaxNewSizePercent=40",
    "-XX:G1HeapRegionSize=8M",
    "-XX:G1ReservePercent=20",
    "-XX:G1HeapWastePercent=5",
    "-XX:G1MixedGCCountTarget=4",
    "-XX:InitiatingHeapOccupancyPercent=15",
    "-XX:G1MixedGCLiveThresholdPercent=90",
    "-XX:G1RSetUpdatingPauseTimePercent=5",
    "-XX:SurvivorRatio=32",
    "-XX:+PerfDisableSharedMem",
    "-XX:MaxTenuringThreshold=1",
    "-Dusing.aikars.flags=https://mcflags.emc.gs",
];

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            server: ServerSettings {
                root: PathBuf::from("."),
                java_path: PathBuf::from("java"),
                server_jar: DEFAULT_SERVER_JAR.to_string(),
                port: DEFAULT_SERVER_PORT,
                jvm_args: DEFAULT_JVM_ARGS.iter().map(|s| s.to_string()).collect(),
            },
            rcon: RconSettings {
                host: DEFAULT_RCON_HOST.to_string(),
                port: DEFAULT_RCON_PORT,
                password: None,
            },
            modpack: ModpackSettings {
                repo_dir: PathBuf::from(DEFAULT_REPO_DIR),
                default_branch: DEFAULT_BRANCH.to_string(),
                tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
                release_urls: Vec::new(),
                artifact_glob_prefix: DEFAULT_ARTIFACT_PREFIX.to_string(),
                protected_mod: DEFAULT_PROTECTED_MOD.to_string(),
                min_mod_count: DEFAULT_MIN_MOD_COUNT,
                temp_dir: None,
                packwiz: None,
            },
            sync: SyncSettings {
                host: None,
                port: DEFAULT_SYNC_PORT,
                username: None,
                remote_worlds: DEFAULT_REMOTE_WORLDS.iter().map(|s| s.to_string()).collect(),
                exclude_large_files: true,
            },
            logging: LoggingSettings {
                file: config_dir.join("logs").join(DEFAULT_LOG_FILE),
            },
        }
    }
}
