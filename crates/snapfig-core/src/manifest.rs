//! Vault manifest: the record of what a vault holds
//!
//! Written wholesale to `manifest.yml` at the vault root after every copy.
//! On a machine with no configuration the manifest is the only way to know
//! which paths a freshly cloned vault tracks.

use serde::{Deserialize, Serialize};
use snapfig_fs::{ConfigStore, NormalizedPath, VaultName};

use crate::config::{GitPolicy, WatchedEntry};
use crate::{Error, Result};

/// Schema version written to new manifests.
pub const MANIFEST_VERSION: u32 = 1;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One tracked path as it was copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    /// Effective policy applied during the copy
    pub git: GitPolicy,
    pub enabled: bool,
    pub is_dir: bool,
}

/// The manifest file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub last_updated: String,
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
    #[serde(default)]
    pub vault_location: String,
}

/// An entry the copier actually mirrored, with what it observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedItem {
    pub path: String,
    pub policy: GitPolicy,
    pub is_dir: bool,
}

impl Manifest {
    /// Location of the manifest inside `vault_dir`.
    pub fn path(vault_dir: &NormalizedPath) -> NormalizedPath {
        vault_dir.join(VaultName::Manifest.as_str())
    }

    pub fn exists(vault_dir: &NormalizedPath) -> bool {
        Self::path(vault_dir).exists()
    }

    /// Overwrite the manifest with `entries`, stamped with the current time.
    pub fn write(vault_dir: &NormalizedPath, entries: Vec<ManifestEntry>) -> Result<Manifest> {
        let manifest = Manifest {
            version: MANIFEST_VERSION,
            last_updated: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            entries,
            vault_location: vault_dir.as_str().to_string(),
        };

        let path = Self::path(vault_dir);
        ConfigStore::new().save(&path, &manifest)?;
        tracing::debug!(path = %path, entries = manifest.entries.len(), "Wrote manifest");
        Ok(manifest)
    }

    /// Read the manifest from `vault_dir`.
    ///
    /// # Errors
    ///
    /// [`Error::ManifestNotFound`] when absent, [`Error::ManifestParse`] when
    /// the file is not a valid manifest.
    pub fn load(vault_dir: &NormalizedPath) -> Result<Manifest> {
        let path = Self::path(vault_dir);
        if !path.exists() {
            return Err(Error::ManifestNotFound {
                path: path.to_native(),
            });
        }

        ConfigStore::new().load(&path).map_err(|e| match e {
            snapfig_fs::Error::ConfigParse { message, .. } => Error::ManifestParse {
                path: path.to_native(),
                message,
            },
            other => Error::Fs(other),
        })
    }

    /// Build manifest entries for what a copy run mirrored.
    ///
    /// Only enabled entries that were actually copied appear. Directory-ness
    /// and policy come from the copy outcome, since the effective policy may
    /// differ from the entry's own setting.
    pub fn from_watching(watching: &[WatchedEntry], copied: &[CopiedItem]) -> Vec<ManifestEntry> {
        watching
            .iter()
            .filter(|w| w.enabled)
            .filter_map(|w| {
                let item = copied.iter().find(|item| item.path == w.path)?;
                Some(ManifestEntry {
                    path: w.path.clone(),
                    git: item.policy,
                    enabled: true,
                    is_dir: item.is_dir,
                })
            })
            .collect()
    }

    /// Rebuild a watch list from the manifest, carrying policy and enabled flag.
    pub fn to_watching(&self) -> Vec<WatchedEntry> {
        self.entries
            .iter()
            .map(|entry| WatchedEntry {
                path: entry.path.clone(),
                git: Some(entry.git),
                enabled: entry.enabled,
            })
            .collect()
    }
}
