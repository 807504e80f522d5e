//! Origin to vault mirroring

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use snapfig_fs::NormalizedPath;
use snapfig_git::{GitVault, VersionControl};

use super::transfer::{self, EntryKind, TransferStats};
use crate::config::{self, Config, GitPolicy, WatchedEntry};
use crate::manifest::{CopiedItem, Manifest};
use crate::{Error, Result};

/// Outcome of [`Copier::copy`].
#[derive(Debug, Default)]
pub struct CopyResult {
    /// Watched paths that were mirrored
    pub copied: Vec<String>,
    /// Watched paths whose origin did not exist
    pub skipped: Vec<String>,
    pub files_updated: usize,
    pub files_skipped: usize,
    pub files_removed: usize,
    /// Version-control failure after mirroring. Never fails the copy itself.
    pub git_error: Option<snapfig_git::Error>,
}

impl CopyResult {
    fn record(&mut self, stats: TransferStats) {
        self.files_updated += stats.files_updated;
        self.files_skipped += stats.files_skipped;
        self.files_removed += stats.files_removed;
    }
}

/// Commit message for a copy that mirrored `count` entries.
pub fn commit_message(count: usize) -> String {
    format!("snapfig: backup {count} paths")
}

/// Mirrors enabled watched entries from the home directory into the vault.
pub struct Copier {
    home: NormalizedPath,
    vault: NormalizedPath,
    watching: Vec<WatchedEntry>,
    default_policy: GitPolicy,
    vcs: Box<dyn VersionControl>,
}

impl Copier {
    /// Create a copier for `config`, committing through a [`GitVault`].
    pub fn new(home: NormalizedPath, vault: NormalizedPath, config: &Config) -> Self {
        let vcs = GitVault::new()
            .with_remote(config.remote.clone())
            .with_token(config.git_token.clone());
        Self {
            home,
            vault,
            watching: config.watching.clone(),
            default_policy: config.git,
            vcs: Box::new(vcs),
        }
    }

    /// Replace the version-control collaborator.
    pub fn with_version_control(mut self, vcs: Box<dyn VersionControl>) -> Self {
        self.vcs = vcs;
        self
    }

    /// Mirror every enabled entry, in list order, then write the manifest and
    /// commit.
    ///
    /// # Errors
    ///
    /// A watched entry overlapping the vault fails the run with
    /// [`Error::InvalidConfig`] before anything is written.
    /// Any I/O failure aborts the run with [`Error::Entry`] naming the
    /// watched path. Entries copied before the failure stay in the vault.
    /// Version-control failures are reported in [`CopyResult::git_error`].
    pub fn copy(&self) -> Result<CopyResult> {
        config::validate_vault_outside(&self.watching, &self.home, &self.vault)?;
        let vault_native = self.vault.to_native();
        fs::create_dir_all(&vault_native).map_err(|e| Error::io(&vault_native, e))?;

        let mut result = CopyResult::default();
        let mut copied_items = Vec::new();

        for entry in self.watching.iter().filter(|w| w.enabled) {
            let source = self.home.join(&entry.path).to_native();
            let destination = self.vault.join(&entry.path).to_native();

            // The watched root itself is followed if it is a symlink
            let metadata = match fs::metadata(&source) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %entry.path, "Source missing, skipping");
                    result.skipped.push(entry.path.clone());
                    continue;
                }
                Err(e) => return Err(Error::io(&source, e).in_entry(&entry.path)),
            };

            let policy = entry.effective_git_policy(self.default_policy);
            let stats = if metadata.is_dir() {
                copy_dir(&source, &destination, policy)
            } else {
                copy_file(&source, &metadata, &destination)
            }
            .map_err(|e| e.in_entry(&entry.path))?;

            tracing::info!(
                path = %entry.path,
                updated = stats.files_updated,
                skipped = stats.files_skipped,
                removed = stats.files_removed,
                "Copied entry"
            );
            result.record(stats);
            result.copied.push(entry.path.clone());
            copied_items.push(CopiedItem {
                path: entry.path.clone(),
                policy,
                is_dir: metadata.is_dir(),
            });
        }

        Manifest::write(
            &self.vault,
            Manifest::from_watching(&self.watching, &copied_items),
        )?;

        match self.commit(result.copied.len()) {
            Ok(true) => tracing::debug!(vault = %self.vault, "Committed vault"),
            Ok(false) => tracing::debug!(vault = %self.vault, "Nothing to commit"),
            Err(e) => {
                tracing::warn!(error = %e, "Vault version control failed");
                result.git_error = Some(e);
            }
        }

        Ok(result)
    }

    fn commit(&self, count: usize) -> snapfig_git::Result<bool> {
        self.vcs.init_repo(&self.vault)?;
        self.vcs.commit(&self.vault, &commit_message(count))
    }
}

/// One planned child of a source directory.
struct Planned {
    source: PathBuf,
    name: OsString,
    destination: OsString,
    kind: EntryKind,
}

fn copy_dir(source: &Path, destination: &Path, policy: GitPolicy) -> Result<TransferStats> {
    let mut stats = TransferStats::removed(transfer::ensure_dir(destination)?);

    let mut planned = Vec::new();
    for entry in fs::read_dir(source).map_err(|e| Error::io(source, e))? {
        let entry = entry.map_err(|e| Error::io(source, e))?;
        let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
        let Some(kind) = EntryKind::from_file_type(file_type) else {
            tracing::debug!(path = %entry.path().display(), "Skipping special file");
            continue;
        };
        let name = entry.file_name();
        if let Some(mapped) = transfer::destination_name(&name, kind, policy) {
            planned.push(Planned {
                source: entry.path(),
                name,
                destination: mapped,
                kind,
            });
        }
    }

    // Two origin names can map onto one vault name, such as a symlink `foo`
    // beside a real `foo.snapfig-symlink`. The entry stored under its own
    // name wins so the pair does not overwrite each other on every run.
    planned.sort_by(|a, b| {
        (a.name != a.destination, &a.name).cmp(&(b.name != b.destination, &b.name))
    });
    let mut claimed = HashSet::new();
    planned.retain(|item| {
        let first = claimed.insert(item.destination.clone());
        if !first {
            tracing::warn!(
                path = %item.source.display(),
                vault_name = %item.destination.to_string_lossy(),
                "Vault name already taken by a sibling, skipping"
            );
        }
        first
    });

    // Stale content goes first, so a `.git_disabled` left by an earlier
    // policy is dropped before anything is written.
    let keep: HashSet<&OsString> = planned.iter().map(|p| &p.destination).collect();
    stats += TransferStats::removed(remove_stale(destination, &keep)?);

    for item in &planned {
        let target = destination.join(&item.destination);
        stats += match item.kind {
            EntryKind::Dir => copy_dir(&item.source, &target, policy)?,
            EntryKind::File => {
                let metadata =
                    fs::metadata(&item.source).map_err(|e| Error::io(&item.source, e))?;
                copy_file(&item.source, &metadata, &target)?
            }
            EntryKind::Symlink => write_marker(&item.source, &item.name, &target)?,
        };
    }

    transfer::copy_dir_permissions(source, destination)?;
    Ok(stats)
}

fn remove_stale(destination: &Path, keep: &HashSet<&OsString>) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(destination).map_err(|e| Error::io(destination, e))? {
        let entry = entry.map_err(|e| Error::io(destination, e))?;
        if !keep.contains(&entry.file_name()) {
            let path = entry.path();
            let count = transfer::remove_path(&path)?;
            tracing::debug!(path = %path.display(), files = count, "Removed stale vault entry");
            removed += count;
        }
    }
    Ok(removed)
}

fn copy_file(source: &Path, metadata: &fs::Metadata, destination: &Path) -> Result<TransferStats> {
    let mut stats = TransferStats::default();
    if let Some(existing) = transfer::metadata_if_exists(destination)?
        && existing.is_dir()
    {
        stats += TransferStats::removed(transfer::remove_path(destination)?);
    }

    if !transfer::should_copy(metadata, destination)? {
        stats += TransferStats::skipped();
        return Ok(stats);
    }

    transfer::replace_file(source, destination)?;
    tracing::debug!(path = %destination.display(), "Copied file");
    stats += TransferStats::updated();
    Ok(stats)
}

fn write_marker(link: &Path, name: &OsString, destination: &Path) -> Result<TransferStats> {
    let target = fs::read_link(link).map_err(|e| Error::io(link, e))?;
    let content = transfer::marker_content(&target, name);

    let mut stats = TransferStats::default();
    match transfer::metadata_if_exists(destination)? {
        Some(metadata) if metadata.is_file() => {
            let existing = fs::read(destination).map_err(|e| Error::io(destination, e))?;
            if existing == content.as_bytes() {
                return Ok(TransferStats::skipped());
            }
        }
        Some(_) => stats += TransferStats::removed(transfer::remove_path(destination)?),
        None => {}
    }

    fs::write(destination, content).map_err(|e| Error::io(destination, e))?;
    tracing::debug!(path = %destination.display(), "Wrote symlink marker");
    stats += TransferStats::updated();
    Ok(stats)
}
