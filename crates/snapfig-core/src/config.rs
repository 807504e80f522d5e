//! User configuration: the watch list and global git policy
//!
//! Stored as YAML at `~/.config/snapfig/config.yml` by default:
//!
//! ```yaml
//! git: disable
//! remote: git@github.com:user/dotfiles.git
//! watching:
//!   - path: .config/nvim
//!     git: remove
//!     enabled: true
//!   - path: .bashrc
//!     enabled: true
//! daemon:
//!   copy_interval: 30m
//!   push_interval: 6h
//! ```

use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snapfig_fs::{ConfigStore, NormalizedPath, VaultName, validate_relative_path};

use crate::{Error, Result};

const CONFIG_DIR: &str = ".config/snapfig";
const CONFIG_FILE: &str = "config.yml";
const VAULT_DIR: &str = ".snapfig/vault";
const STATE_DIR: &str = ".snapfig";
const PID_FILE: &str = "daemon.pid";
const LOG_FILE: &str = "daemon.log";

/// How an embedded `.git` directory is carried into the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitPolicy {
    /// Rename `.git` to `.git_disabled` in the vault; reverted on restore.
    #[default]
    Disable,

    /// Leave `.git` out of the vault entirely.
    Remove,
}

impl FromStr for GitPolicy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" => Ok(GitPolicy::Disable),
            "remove" => Ok(GitPolicy::Remove),
            _ => Err(Error::InvalidGitPolicy {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for GitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitPolicy::Disable => write!(f, "disable"),
            GitPolicy::Remove => write!(f, "remove"),
        }
    }
}

/// One watched path, relative to the home directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedEntry {
    pub path: String,

    /// Per-entry override of the global policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitPolicy>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl WatchedEntry {
    /// An enabled entry inheriting the global policy.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            git: None,
            enabled: true,
        }
    }

    pub fn with_policy(mut self, policy: GitPolicy) -> Self {
        self.git = Some(policy);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The entry's own policy, or `global` when it has none.
    pub fn effective_git_policy(&self, global: GitPolicy) -> GitPolicy {
        self.git.unwrap_or(global)
    }
}

/// Background runner settings. Intervals use `1h30m` style durations; an
/// unset interval disables that task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_interval: Option<String>,

    /// Restore from the vault after every scheduled pull
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_restore: bool,
}

impl DaemonConfig {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The complete user configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default policy for entries without their own
    #[serde(default)]
    pub git: GitPolicy,

    /// Remote the vault is pushed to and cloned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    /// HTTPS access token for the remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_token: Option<String>,

    /// Vault location; `~/` is expanded. Defaults to `~/.snapfig/vault`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_path: Option<String>,

    #[serde(default)]
    pub watching: Vec<WatchedEntry>,

    #[serde(default, skip_serializing_if = "DaemonConfig::is_empty")]
    pub daemon: DaemonConfig,
}

impl Config {
    /// Load and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if the file does not exist, a
    /// filesystem error if it cannot be parsed, or [`Error::InvalidConfig`]
    /// if a watched path is unusable.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_native(),
            });
        }

        let config: Config = ConfigStore::new().load(path)?;
        config.validate()?;
        tracing::debug!(path = %path, entries = config.watching.len(), "Loaded configuration");
        Ok(config)
    }

    /// Load the configuration, or return an empty one if the file is absent.
    pub fn load_or_default(path: &NormalizedPath) -> Result<Self> {
        match Self::load(path) {
            Err(Error::ConfigNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Save the configuration atomically; the format follows the extension.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        ConfigStore::new().save(path, self)?;
        tracing::debug!(path = %path, "Saved configuration");
        Ok(())
    }

    /// Check every watched path before it is joined onto home or vault.
    pub fn validate(&self) -> Result<()> {
        validate_watching(&self.watching)
    }

    /// Resolve the vault directory.
    pub fn vault_dir(&self) -> Result<NormalizedPath> {
        match self.vault_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => expand_home(path),
            _ => default_vault_dir(),
        }
    }

    /// The remote, ignoring an empty string.
    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref().filter(|r| !r.is_empty())
    }

    pub fn enabled_entries(&self) -> impl Iterator<Item = &WatchedEntry> {
        self.watching.iter().filter(|w| w.enabled)
    }
}

/// Validate a watch list, for example one rebuilt from a cloned manifest.
///
/// Paths must be relative, must not climb out of the home directory, and
/// must not collide with the vault's own `.git` or manifest.
pub fn validate_watching(watching: &[WatchedEntry]) -> Result<()> {
    for entry in watching {
        validate_relative_path(&entry.path).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?;

        let first = entry
            .path
            .trim()
            .trim_start_matches("./")
            .split(['/', '\\'])
            .next()
            .unwrap_or_default();
        if VaultName::GitDir.matches(first) || VaultName::Manifest.matches(first) {
            return Err(Error::InvalidConfig {
                message: format!("'{}' collides with a reserved vault name", entry.path),
            });
        }
    }
    Ok(())
}

/// Reject entries that are the vault, contain it, or lie inside it.
///
/// Copying any of them would mirror the vault into itself.
pub fn validate_vault_outside(
    watching: &[WatchedEntry],
    home: &NormalizedPath,
    vault: &NormalizedPath,
) -> Result<()> {
    let vault_native = vault.to_native();
    let vault = lexical_components(&vault_native);
    for entry in watching {
        let watched_native = home.join(&entry.path).to_native();
        let watched = lexical_components(&watched_native);
        if vault.starts_with(&watched) || watched.starts_with(&vault) {
            return Err(Error::InvalidConfig {
                message: format!("'{}' overlaps the vault directory", entry.path),
            });
        }
    }
    Ok(())
}

fn lexical_components(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// The current user's home directory.
pub fn home_dir() -> Result<NormalizedPath> {
    dirs::home_dir()
        .map(NormalizedPath::new)
        .ok_or(Error::HomeDirUnavailable)
}

/// `~/.config/snapfig`
pub fn default_config_dir() -> Result<NormalizedPath> {
    Ok(home_dir()?.join(CONFIG_DIR))
}

/// `~/.config/snapfig/config.yml`
pub fn default_config_path() -> Result<NormalizedPath> {
    Ok(default_config_dir()?.join(CONFIG_FILE))
}

/// `~/.snapfig/vault`
pub fn default_vault_dir() -> Result<NormalizedPath> {
    Ok(home_dir()?.join(VAULT_DIR))
}

/// `~/.snapfig/daemon.pid`
pub fn default_pid_path() -> Result<NormalizedPath> {
    Ok(home_dir()?.join(STATE_DIR).join(PID_FILE))
}

/// `~/.snapfig/daemon.log`
pub fn default_log_path() -> Result<NormalizedPath> {
    Ok(home_dir()?.join(STATE_DIR).join(LOG_FILE))
}

fn expand_home(path: &str) -> Result<NormalizedPath> {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(NormalizedPath::new(path)),
    }
}
