//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = non_empty(section.get("root")) {
            config.server.root = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("java_path")) {
            config.server.java_path = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("server_jar")) {
            config.server.server_jar = v.to_string();
        }
        if let Some(v) = section.get("port") {
            config.server.port = parse_number("server", "port", v, "must be a port number")?;
        }
        if let Some(v) = non_empty(section.get("jvm_args")) {
            config.server.jvm_args = v.split_whitespace().map(str::to_string).collect();
        }
    }

    // [rcon] section
    if let Some(section) = ini.section(Some("rcon")) {
        if let Some(v) = non_empty(section.get("host")) {
            config.rcon.host = v.to_string();
        }
        if let Some(v) = section.get("port") {
            config.rcon.port = parse_number("rcon", "port", v, "must be a port number")?;
        }
        if let Some(v) = non_empty(section.get("password")) {
            config.rcon.password = Some(v.to_string());
        }
    }

    // [modpack] section
    if let Some(section) = ini.section(Some("modpack")) {
        if let Some(v) = non_empty(section.get("repo_dir")) {
            config.modpack.repo_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("default_branch")) {
            config.modpack.default_branch = v.to_string();
        }
        if let Some(v) = section.get("tag_prefix") {
            config.modpack.tag_prefix = v.trim().to_string();
        }
        if let Some(v) = section.get("release_urls") {
            let urls = split_list(v);
            if let Some(bad) = urls.iter().find(|u| !u.starts_with("http")) {
                return Err(ConfigFileError::InvalidValue {
                    section: "modpack".to_string(),
                    key: "release_urls".to_string(),
                    value: bad.clone(),
                    reason: "each entry must be an http(s) URL template".to_string(),
                });
            }
            config.modpack.release_urls = urls;
        }
        if let Some(v) = non_empty(section.get("artifact_glob_prefix")) {
            config.modpack.artifact_glob_prefix = v.to_string();
        }
        if let Some(v) = non_empty(section.get("protected_mod")) {
            config.modpack.protected_mod = v.to_string();
        }
        if let Some(v) = section.get("min_mod_count") {
            let count: usize = parse_number(
                "modpack",
                "min_mod_count",
                v,
                "must be a positive integer",
            )?;
            if count == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "modpack".to_string(),
                    key: "min_mod_count".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer".to_string(),
                });
            }
            config.modpack.min_mod_count = count;
        }
        if let Some(v) = non_empty(section.get("temp_dir")) {
            config.modpack.temp_dir = Some(expand_tilde(v));
        }
        if let Some(v) = non_empty(section.get("packwiz")) {
            config.modpack.packwiz = Some(expand_tilde(v));
        }
    }

    // [sync] section
    if let Some(section) = ini.section(Some("sync")) {
        if let Some(v) = non_empty(section.get("host")) {
            config.sync.host = Some(v.to_string());
        }
        if let Some(v) = section.get("port") {
            config.sync.port = parse_number("sync", "port", v, "must be a port number")?;
        }
        if let Some(v) = non_empty(section.get("username")) {
            config.sync.username = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("remote_worlds")) {
            config.sync.remote_worlds = split_list(v);
        }
        if let Some(v) = section.get("exclude_large_files") {
            config.sync.exclude_large_files = parse_bool("sync", "exclude_large_files", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

/// Apply environment overrides on top of a parsed configuration.
///
/// `lookup` is `std::env::var` in production; tests pass a map.
pub(super) fn apply_env_overrides<F>(
    config: &mut ConfigFile,
    lookup: F,
) -> Result<(), ConfigFileError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("JAVA_PATH") {
        config.server.java_path = expand_tilde(v.trim());
    }
    if let Some(v) = get("RCON_PASSWORD") {
        config.rcon.password = Some(v);
    }
    if let Some(v) = get("SFTP_HOST") {
        config.sync.host = Some(v.trim().to_string());
    }
    if let Some(v) = get("SFTP_PORT") {
        config.sync.port = parse_number("env", "SFTP_PORT", &v, "must be a port number")?;
    }
    if let Some(v) = get("SFTP_USERNAME") {
        config.sync.username = Some(v.trim().to_string());
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
