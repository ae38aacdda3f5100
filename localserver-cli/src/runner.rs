//! CLI runner for common setup.
//!
//! Loads configuration, initializes logging and wires concrete collaborators
//! into the library components so command handlers stay small.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use localserver::config::{config_file_path, ConfigFile};
use localserver::fetch::{HttpDownloader, VersionRef};
use localserver::logging::{init_logging, split_log_path, LoggingGuard};
use localserver::mode::{FileModeStore, ModRules, ModeStateManager, WorldDataSet, CONFIG_DIR};
use localserver::package::{InstallerProvisioner, PackageInstaller, PackwizExporter};
use localserver::rcon::RconClient;
use localserver::server::{ServerLaunch, ServerProcess};
use localserver::vcs::{
    CheckoutOptions, GitCli, JsonCheckoutStateStore, StartupCheck, VersionCheckoutManager,
};
use localserver::world::{RemoteEndpoint, RsyncRemoteSync, WorldSync};
use tracing::info;

use crate::error::CliError;

/// Checkout manager as wired for the CLI.
pub type CliCheckoutManager = VersionCheckoutManager<GitCli, JsonCheckoutStateStore>;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Load config (file, then environment) and initialize logging.
    pub fn new(config_path: Option<PathBuf>, debug: bool) -> Result<Self, CliError> {
        let config_path = config_path.unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?.with_env_overrides()?;

        let (log_dir, log_file) = split_log_path(&config.logging.file);
        let logging_guard = init_logging(log_dir, &log_file, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn root(&self) -> &Path {
        &self.config.server.root
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("localserver v{}", localserver::VERSION);
        info!(root = %self.root().display(), "localserver CLI: {} command", command);
    }

    pub fn rcon(&self) -> RconClient {
        let rcon = &self.config.rcon;
        RconClient::new(rcon.host.clone(), rcon.port, rcon.password.clone())
    }

    pub fn installer(&self) -> PackageInstaller {
        let modpack = &self.config.modpack;
        PackageInstaller::new(
            Arc::new(HttpDownloader::new()),
            modpack.release_urls.clone(),
            self.root(),
            modpack.protected_mod.clone(),
        )
        .with_scratch_parent(modpack.temp_dir.clone())
    }

    /// Packwiz runner for exporting a package from the modpack repository.
    pub fn exporter(&self) -> PackwizExporter {
        PackwizExporter::locate(&self.config.repo_dir(), self.config.modpack.packwiz.as_deref())
    }

    /// Parse a user-supplied version against the configured tag prefix.
    pub fn version_ref(&self, input: &str) -> Result<VersionRef, CliError> {
        VersionRef::parse(input, &self.config.modpack.tag_prefix)
            .map_err(|e| CliError::Usage(e.to_string()))
    }

    /// Provisioner used when a mode needs the full mod set. Exports a
    /// package when none exists, then falls back to the checked-out release
    /// tag.
    pub fn provisioner(&self, fallback: Option<VersionRef>) -> InstallerProvisioner {
        InstallerProvisioner::new(
            self.installer(),
            self.config.repo_dir(),
            self.config.modpack.artifact_glob_prefix.clone(),
            fallback,
        )
        .with_exporter(Box::new(self.exporter()))
    }

    pub fn mode_manager(&self) -> ModeStateManager {
        let fallback = self.current_release();
        ModeStateManager::new(
            self.root(),
            Box::new(FileModeStore::in_dir(self.root())),
            Box::new(self.provisioner(fallback)),
            ModRules {
                protected_name: self.config.modpack.protected_mod.clone(),
                min_full_count: self.config.modpack.min_mod_count,
            },
        )
        .with_pack_config(self.config.repo_dir().join(CONFIG_DIR))
    }

    /// Release tag the modpack repository is on, if it is on one.
    fn current_release(&self) -> Option<VersionRef> {
        use localserver::vcs::{Revision, VersionControl};
        let git = GitCli::open(self.config.repo_dir()).ok()?;
        match git.current_revision().ok()? {
            Revision::Tag(tag) => VersionRef::parse(&tag, &self.config.modpack.tag_prefix).ok(),
            _ => None,
        }
    }

    pub fn checkout_manager(&self) -> Result<(CliCheckoutManager, StartupCheck), CliError> {
        let modpack = &self.config.modpack;
        let repo = self.config.repo_dir();
        let git = GitCli::open(&repo).map_err(localserver::vcs::CheckoutError::from)?;
        let options = CheckoutOptions {
            default_branch: modpack.default_branch.clone(),
            tag_prefix: modpack.tag_prefix.clone(),
            artifact_cleanup: Some((repo, modpack.artifact_glob_prefix.clone())),
        };
        Ok(VersionCheckoutManager::open(
            git,
            JsonCheckoutStateStore::in_dir(self.root()),
            options,
        )?)
    }

    pub fn world_sync(&self, with_stop: bool) -> Result<WorldSync, CliError> {
        let sync = &self.config.sync;
        let (Some(host), Some(username)) = (sync.host.clone(), sync.username.clone()) else {
            return Err(localserver::world::WorldSyncError::NotConfigured(
                "set SFTP_HOST and SFTP_USERNAME or the [sync] section".to_string(),
            )
            .into());
        };
        let remote = RsyncRemoteSync::new(RemoteEndpoint {
            host,
            port: sync.port,
            username,
        });
        let command: Option<Box<dyn localserver::rcon::RemoteCommand>> = if with_stop {
            Some(Box::new(self.rcon()))
        } else {
            None
        };
        Ok(WorldSync::new(
            self.root(),
            &sync.remote_worlds,
            Box::new(remote),
            command,
        ))
    }

    pub fn server(&self) -> Result<ServerProcess, CliError> {
        let server = &self.config.server;
        let world_dir = self
            .mode_manager()
            .active_mode()?
            .map(|m| m.world().primary_path(self.root()))
            .or_else(|| Some(WorldDataSet::PRODUCTION_LOCAL.primary_path(self.root())));
        let launch = ServerLaunch {
            root: server.root.clone(),
            java_path: server.java_path.clone(),
            server_jar: server.server_jar.clone(),
            jvm_args: server.jvm_args.clone(),
            port: server.port,
            world_dir,
        };
        Ok(ServerProcess::new(launch, Box::new(self.rcon())))
    }
}
