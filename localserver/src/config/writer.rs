//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let password = config.rcon.password.as_deref().unwrap_or("");
    let temp_dir = config
        .modpack
        .temp_dir
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();
    let packwiz = config
        .modpack
        .packwiz
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();
    let sync_host = config.sync.host.as_deref().unwrap_or("");
    let sync_username = config.sync.username.as_deref().unwrap_or("");
    let exclude_large_files = if config.sync.exclude_large_files {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[server]
; Server directory holding server.properties, server.properties.<mode>,
; mods/ and the world folders
root = {}
; Java executable (JAVA_PATH environment variable overrides)
java_path = {}
; Server launcher jar, relative to root
server_jar = {}
; Game port, used to tell whether the server is up
port = {}
; JVM arguments, whitespace separated
jvm_args = {}

[rcon]
; Remote console used to stop the server before world operations
host = {}
port = {}
; Must match rcon.password in server.properties (RCON_PASSWORD overrides)
password = {}

[modpack]
; Git checkout of the modpack, relative to the server root or absolute
repo_dir = {}
; Branch to return to with `version default`
default_branch = {}
; Prefix of release tags
tag_prefix = {}
; Comma-separated release archive URLs, tried in order.
; {{tag}} becomes e.g. v0.9.50, {{version}} becomes 0.9.50
; Example: https://github.com/example/MCC/releases/download/{{tag}}/MCC-{{version}}.mrpack
release_urls = {}
; File name prefix of exported .mrpack files in repo_dir
artifact_glob_prefix = {}
; Mod kept in vanilla mode
protected_mod = {}
; Jar count at which the full mod set counts as installed
min_mod_count = {}
; Scratch directory for downloads (empty = system temp)
temp_dir = {}
; Packwiz executable for exporting a .mrpack when repo_dir has none
; (empty = packwiz in repo_dir, then PATH)
packwiz = {}

[sync]
; SFTP host of the production server (SFTP_HOST overrides)
host = {}
; SFTP_PORT overrides
port = {}
; SFTP_USERNAME overrides
username = {}
; Comma-separated remote world folders: overworld, nether, end
remote_worlds = {}
; Skip DistantHorizons.sqlite files (several GB, regenerated client side)
exclude_large_files = {}

[logging]
; Log file, truncated at the start of every run
file = {}
"#,
        path_to_string(&config.server.root),
        path_to_string(&config.server.java_path),
        config.server.server_jar,
        config.server.port,
        config.server.jvm_args.join(" "),
        config.rcon.host,
        config.rcon.port,
        password,
        path_to_string(&config.modpack.repo_dir),
        config.modpack.default_branch,
        config.modpack.tag_prefix,
        config.modpack.release_urls.join(", "),
        config.modpack.artifact_glob_prefix,
        config.modpack.protected_mod,
        config.modpack.min_mod_count,
        temp_dir,
        packwiz,
        sync_host,
        config.sync.port,
        sync_username,
        config.sync.remote_worlds.join(", "),
        exclude_large_files,
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
