//! LuckPerms setup for local testing: everyone who joins is made operator.

use std::fs;
use std::path::Path;

use tracing::info;

use super::ServerError;
use crate::rcon::RemoteCommand;
use crate::sync::{atomic_write, SyncError, SyncResult};

/// LuckPerms configuration, relative to the server root.
pub const LUCKPERMS_CONFIG: &str = "config/luckperms/luckperms.conf";

/// YAML group storage, relative to the server root.
pub const LUCKPERMS_GROUPS: &str = "config/luckperms/yaml-storage/groups";

const DEFAULT_GROUP: &str = "name: default\npermissions:\n  - \"luckperms.autoop\"\n  - \"*\"\n";

/// Setting rewrites applied to `luckperms.conf`.
const CONFIG_REWRITES: [(&str, &str); 2] = [
    ("storage-method = \"h2\"", "storage-method = \"yaml\""),
    ("auto-op = false", "auto-op = true"),
];

/// Outcome of [`setup_auto_op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoOpSetup {
    /// LuckPerms has not written its configuration yet; it will on first run.
    NotInstalled,
    Configured {
        /// `luckperms.conf` was rewritten.
        config_updated: bool,
        /// The default group file was created.
        group_created: bool,
    },
}

/// Switch LuckPerms to YAML storage with auto-op enabled and give the
/// default group every permission. Idempotent.
pub fn setup_auto_op(root: &Path) -> SyncResult<AutoOpSetup> {
    let config = root.join(LUCKPERMS_CONFIG);
    if !config.is_file() {
        return Ok(AutoOpSetup::NotInstalled);
    }

    let original = fs::read_to_string(&config).map_err(|e| SyncError::io(&config, e))?;
    let updated = CONFIG_REWRITES
        .iter()
        .fold(original.clone(), |text, (from, to)| text.replace(from, to));
    let config_updated = updated != original;
    if config_updated {
        atomic_write(&config, updated.as_bytes())?;
        info!(path = %config.display(), "LuckPerms configured for auto-op");
    }

    let group = root.join(LUCKPERMS_GROUPS).join("default.yml");
    let group_created = !group.exists();
    if group_created {
        atomic_write(&group, DEFAULT_GROUP.as_bytes())?;
        info!(path = %group.display(), "Created default group with operator permissions");
    }

    Ok(AutoOpSetup::Configured {
        config_updated,
        group_created,
    })
}

/// Whether `name` is a valid player name (letters, digits, underscore; at
/// most 16 characters).
pub fn is_valid_player_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 16
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Grant `username` every permission and auto-op through LuckPerms
/// commands. Returns the non-empty replies.
pub fn grant_permissions(
    remote: &dyn RemoteCommand,
    username: &str,
) -> Result<Vec<String>, ServerError> {
    if !is_valid_player_name(username) {
        return Err(ServerError::InvalidPlayerName(username.to_string()));
    }
    let mut replies = Vec::new();
    for permission in ["*", "luckperms.autoop"] {
        let command = format!("lp user {} permission set {} true", username, permission);
        let reply = remote.send(&command)?;
        if !reply.trim().is_empty() {
            replies.push(reply.trim().to_string());
        }
    }
    info!(player = username, "Granted operator permissions");
    Ok(replies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcon::RconError;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingRemote(Mutex<Vec<String>>);

    impl RemoteCommand for RecordingRemote {
        fn send(&self, command: &str) -> Result<String, RconError> {
            self.0.lock().unwrap().push(command.to_string());
            Ok(format!("ok: {}", command))
        }
    }

    #[test]
    fn test_auto_op_waits_for_luckperms() {
        let temp = TempDir::new().unwrap();
        assert_eq!(setup_auto_op(temp.path()).unwrap(), AutoOpSetup::NotInstalled);
        assert!(!temp.path().join(LUCKPERMS_GROUPS).exists());
    }

    #[test]
    fn test_auto_op_rewrites_once() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join(LUCKPERMS_CONFIG);
        fs::create_dir_all(config.parent().unwrap()).unwrap();
        fs::write(
            &config,
            "server = \"global\"\nstorage-method = \"h2\"\nauto-op = false\n",
        )
        .unwrap();

        assert_eq!(
            setup_auto_op(temp.path()).unwrap(),
            AutoOpSetup::Configured {
                config_updated: true,
                group_created: true,
            }
        );
        assert_eq!(
            fs::read_to_string(&config).unwrap(),
            "server = \"global\"\nstorage-method = \"yaml\"\nauto-op = true\n"
        );
        let group = temp.path().join(LUCKPERMS_GROUPS).join("default.yml");
        assert!(fs::read_to_string(group).unwrap().contains("luckperms.autoop"));

        assert_eq!(
            setup_auto_op(temp.path()).unwrap(),
            AutoOpSetup::Configured {
                config_updated: false,
                group_created: false,
            }
        );
    }

    #[test]
    fn test_grant_sends_both_permissions() {
        let remote = RecordingRemote::default();

        let replies = grant_permissions(&remote, "Steve_01").unwrap();

        assert_eq!(
            *remote.0.lock().unwrap(),
            vec![
                "lp user Steve_01 permission set * true",
                "lp user Steve_01 permission set luckperms.autoop true",
            ]
        );
        assert_eq!(replies.len(), 2);
    }

    #[test]
    fn test_grant_rejects_bad_names() {
        let remote = RecordingRemote::default();
        for name in ["", "a b", "steve; stop", "abcdefghijklmnopq"] {
            assert!(matches!(
                grant_permissions(&remote, name),
                Err(ServerError::InvalidPlayerName(_))
            ));
        }
        assert!(remote.0.lock().unwrap().is_empty());
    }
}
