//! Service facade binding configuration, vault and version control
//!
//! Front-ends talk to [`Service`] so they can be exercised against a double.

use snapfig_fs::NormalizedPath;
use snapfig_git::{GitVault, PullOutcome, VersionControl};

use crate::config::{self, Config, WatchedEntry};
use crate::manifest::Manifest;
use crate::sync::{CopyResult, Copier, RestoreResult, Restorer, VaultEntry};
use crate::{Error, Result};

/// Every operation a front-end can drive.
pub trait Service {
    /// Mirror enabled watched paths into the vault.
    fn copy(&self) -> Result<CopyResult>;

    /// Restore every enabled watched path from the vault.
    fn restore(&self) -> Result<RestoreResult>;

    /// Restore only the given vault-relative paths.
    fn restore_selective(&self, paths: &[String]) -> Result<RestoreResult>;

    /// Enabled watched entries present in the vault.
    fn list_vault_entries(&self) -> Result<Vec<VaultEntry>>;

    /// Push the vault to its remote.
    fn push(&self) -> Result<()>;

    /// Pull the vault from its remote, cloning when absent.
    fn pull(&self) -> Result<PullOutcome>;

    /// URL of the vault's `origin`, if any.
    fn remote_url(&self) -> Result<Option<String>>;

    /// Point the vault at `url` and remember it in the configuration.
    fn set_remote(&mut self, url: &str) -> Result<()>;

    /// Save the configuration to `path`, or to where it was loaded from.
    fn save_config(&self, path: Option<&NormalizedPath>) -> Result<()>;

    /// Re-read the configuration from where it was loaded. Home and vault
    /// directories stay as bound.
    fn reload_config(&mut self) -> Result<()>;

    fn config(&self) -> &Config;

    fn vault_dir(&self) -> &NormalizedPath;

    fn update_watching(&mut self, watching: Vec<WatchedEntry>);

    /// Check a watch list against the home and vault directories.
    fn validate_watching(&self, watching: &[WatchedEntry]) -> Result<()>;

    /// Adopt the vault manifest's watch list when the configuration has
    /// none. Returns whether anything was adopted.
    fn reconstruct_watching(&mut self) -> Result<bool>;
}

/// Production [`Service`] over the local filesystem and [`GitVault`].
pub struct DefaultService {
    config: Config,
    config_path: NormalizedPath,
    home: NormalizedPath,
    vault: NormalizedPath,
}

impl DefaultService {
    /// Bind `config` to the current user's home directory.
    pub fn new(config: Config, config_path: NormalizedPath) -> Result<Self> {
        let home = config::home_dir()?;
        let vault = config.vault_dir()?;
        Ok(Self::with_dirs(config, config_path, home, vault))
    }

    /// Bind `config` to explicit home and vault directories.
    pub fn with_dirs(
        config: Config,
        config_path: NormalizedPath,
        home: NormalizedPath,
        vault: NormalizedPath,
    ) -> Self {
        Self {
            config,
            config_path,
            home,
            vault,
        }
    }

    pub fn home_dir(&self) -> &NormalizedPath {
        &self.home
    }

    pub fn config_path(&self) -> &NormalizedPath {
        &self.config_path
    }

    fn git(&self) -> GitVault {
        GitVault::new()
            .with_remote(self.config.remote.clone())
            .with_token(self.config.git_token.clone())
    }

    fn restorer(&self) -> Restorer {
        Restorer::new(self.home.clone(), self.vault.clone(), &self.config)
    }
}

impl Service for DefaultService {
    fn copy(&self) -> Result<CopyResult> {
        Copier::new(self.home.clone(), self.vault.clone(), &self.config).copy()
    }

    fn restore(&self) -> Result<RestoreResult> {
        self.restorer().restore()
    }

    fn restore_selective(&self, paths: &[String]) -> Result<RestoreResult> {
        self.restorer().restore_selective(paths)
    }

    fn list_vault_entries(&self) -> Result<Vec<VaultEntry>> {
        self.restorer().list_vault_entries()
    }

    fn push(&self) -> Result<()> {
        Ok(self.git().push(&self.vault)?)
    }

    fn pull(&self) -> Result<PullOutcome> {
        Ok(self.git().pull(&self.vault)?)
    }

    fn remote_url(&self) -> Result<Option<String>> {
        Ok(self.git().has_remote(&self.vault)?)
    }

    fn set_remote(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidConfig {
                message: "remote URL is empty".to_string(),
            });
        }
        self.git().set_remote(&self.vault, url)?;
        self.config.remote = Some(url.to_string());
        Ok(())
    }

    fn save_config(&self, path: Option<&NormalizedPath>) -> Result<()> {
        self.config.save(path.unwrap_or(&self.config_path))
    }

    fn reload_config(&mut self) -> Result<()> {
        self.config = Config::load(&self.config_path)?;
        Ok(())
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn vault_dir(&self) -> &NormalizedPath {
        &self.vault
    }

    fn update_watching(&mut self, watching: Vec<WatchedEntry>) {
        self.config.watching = watching;
    }

    fn validate_watching(&self, watching: &[WatchedEntry]) -> Result<()> {
        config::validate_watching(watching)?;
        config::validate_vault_outside(watching, &self.home, &self.vault)
    }

    fn reconstruct_watching(&mut self) -> Result<bool> {
        if !self.config.watching.is_empty() || !Manifest::exists(&self.vault) {
            return Ok(false);
        }

        let manifest = Manifest::load(&self.vault)?;
        let watching = manifest.to_watching();
        self.validate_watching(&watching)?;

        tracing::info!(
            vault = %self.vault,
            entries = watching.len(),
            "Rebuilt watch list from vault manifest"
        );
        self.config.watching = watching;
        Ok(true)
    }
}
