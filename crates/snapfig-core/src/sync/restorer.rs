//! Vault to origin restoration, whole or selective, plus vault listing

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use snapfig_fs::{NormalizedPath, VaultName};
use walkdir::WalkDir;

use super::transfer::{self, EntryKind, TransferStats};
use crate::config::{Config, GitPolicy, WatchedEntry};
use crate::{Error, Result};

/// Outcome of [`Restorer::restore`] and [`Restorer::restore_selective`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreResult {
    /// Paths restored: whole watched entries or individually requested paths
    pub restored: Vec<String>,
    /// Watched entries with nothing restored
    pub skipped: Vec<String>,
    /// Paths backed up before being overwritten. Smart restore never needs
    /// one, so this stays empty.
    pub backups: Vec<String>,
    pub files_updated: usize,
    pub files_skipped: usize,
}

impl RestoreResult {
    fn record(&mut self, stats: TransferStats) {
        self.files_updated += stats.files_updated;
        self.files_skipped += stats.files_skipped;
    }
}

/// A watched entry as found in the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    pub path: String,
    pub is_dir: bool,
    /// Every path beneath a directory entry, relative to the vault root,
    /// sorted, with forward slashes
    pub children: Vec<String>,
}

/// Restores watched entries from the vault back to the home directory.
pub struct Restorer {
    home: NormalizedPath,
    vault: NormalizedPath,
    watching: Vec<WatchedEntry>,
    default_policy: GitPolicy,
}

impl Restorer {
    pub fn new(home: NormalizedPath, vault: NormalizedPath, config: &Config) -> Self {
        Self {
            home,
            vault,
            watching: config.watching.clone(),
            default_policy: config.git,
        }
    }

    fn enabled(&self) -> impl Iterator<Item = &WatchedEntry> {
        self.watching.iter().filter(|w| w.enabled)
    }

    /// Stat the vault counterpart of `entry`, `None` when it is absent.
    ///
    /// Copy never writes a symlink into the vault, so one found there is
    /// treated as absent rather than followed.
    fn vault_metadata(&self, entry: &WatchedEntry) -> Result<Option<(PathBuf, Metadata)>> {
        let path = self.vault.join(&entry.path).to_native();
        match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_symlink() => {
                tracing::warn!(path = %entry.path, "Vault entry is a symlink, ignoring");
                Ok(None)
            }
            Ok(metadata) => Ok(Some((path, metadata))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&path, e).in_entry(&entry.path)),
        }
    }

    /// Restore every enabled entry present in the vault.
    ///
    /// Files are rewritten whenever they differ from the vault copy in size
    /// or modification time, in either direction: a local edit made since
    /// the last copy is overwritten without warning.
    pub fn restore(&self) -> Result<RestoreResult> {
        let mut result = RestoreResult::default();

        for entry in self.enabled() {
            let Some((source, metadata)) = self.vault_metadata(entry)? else {
                tracing::debug!(path = %entry.path, "Not in vault, skipping");
                result.skipped.push(entry.path.clone());
                continue;
            };

            let destination = self.home.join(&entry.path).to_native();
            let policy = entry.effective_git_policy(self.default_policy);
            let stats = restore_path(&source, &metadata, &destination, policy)
                .map_err(|e| e.in_entry(&entry.path))?;

            tracing::info!(
                path = %entry.path,
                updated = stats.files_updated,
                skipped = stats.files_skipped,
                "Restored entry"
            );
            result.record(stats);
            result.restored.push(entry.path.clone());
        }

        Ok(result)
    }

    /// Restore only the requested paths, relative to home as in the vault.
    ///
    /// A request naming a whole watched entry restores all of it. Otherwise
    /// the entry's vault subtree is walked and each requested file or
    /// directory is restored; a requested directory is restored wholesale
    /// and not descended into. Entries with no matching request are listed
    /// in `skipped`.
    pub fn restore_selective<S: AsRef<str>>(&self, paths: &[S]) -> Result<RestoreResult> {
        let requested: HashSet<String> = paths
            .iter()
            .map(|p| normalize_request(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        let mut result = RestoreResult::default();

        for entry in self.enabled() {
            let Some((source, metadata)) = self.vault_metadata(entry)? else {
                result.skipped.push(entry.path.clone());
                continue;
            };

            let root = normalize_request(&entry.path);
            let destination = self.home.join(&entry.path).to_native();
            let policy = entry.effective_git_policy(self.default_policy);

            if requested.contains(&root) {
                let stats = restore_path(&source, &metadata, &destination, policy)
                    .map_err(|e| e.in_entry(&entry.path))?;
                result.record(stats);
                result.restored.push(entry.path.clone());
                continue;
            }

            let any_restored = metadata.is_dir()
                && restore_within(&source, &destination, &root, &requested, policy, &mut result)
                    .map_err(|e| e.in_entry(&entry.path))?;
            if !any_restored {
                result.skipped.push(entry.path.clone());
            }
        }

        Ok(result)
    }

    /// Enumerate enabled entries present in the vault, with every path
    /// beneath each directory entry.
    pub fn list_vault_entries(&self) -> Result<Vec<VaultEntry>> {
        let mut entries = Vec::new();

        for entry in self.enabled() {
            let Some((source, metadata)) = self.vault_metadata(entry)? else {
                continue;
            };
            let root = normalize_request(&entry.path);

            let mut children = Vec::new();
            if metadata.is_dir() {
                for item in WalkDir::new(&source).min_depth(1).sort_by_file_name() {
                    let item = item?;
                    if item.path_is_symlink() {
                        continue;
                    }
                    if let Some(relative) = relative_slash_path(&source, item.path()) {
                        children.push(format!("{root}/{relative}"));
                    }
                }
            }

            entries.push(VaultEntry {
                path: entry.path.clone(),
                is_dir: metadata.is_dir(),
                children,
            });
        }

        Ok(entries)
    }
}

/// Walk a directory entry's vault subtree restoring requested paths.
fn restore_within(
    source_root: &Path,
    destination_root: &Path,
    root: &str,
    requested: &HashSet<String>,
    policy: GitPolicy,
    result: &mut RestoreResult,
) -> Result<bool> {
    let mut any_restored = false;
    let mut walker = WalkDir::new(source_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(item) = walker.next() {
        let item = item?;
        if item.path_is_symlink() {
            tracing::debug!(path = %item.path().display(), "Skipping symlink in vault");
            continue;
        }
        let Some(relative) = relative_slash_path(source_root, item.path()) else {
            continue;
        };
        let full = format!("{root}/{relative}");
        if !requested.contains(&full) {
            continue;
        }

        let is_dir = item.file_type().is_dir();
        let destination = destination_root.join(origin_relative(&relative, is_dir, policy));
        let metadata = item.metadata()?;
        let stats = restore_path(item.path(), &metadata, &destination, policy)?;
        tracing::debug!(path = %full, "Restored selected path");

        result.record(stats);
        result.restored.push(full);
        any_restored = true;

        if is_dir {
            walker.skip_current_dir();
        }
    }

    Ok(any_restored)
}

/// Trim whitespace and slashes, and use forward slashes.
fn normalize_request(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .trim_matches('/')
        .trim_start_matches("./")
        .to_string()
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Map a vault-relative path back to its origin form. Every directory
/// component named `.git_disabled` becomes `.git` under `Disable`.
fn origin_relative(relative: &str, is_dir: bool, policy: GitPolicy) -> PathBuf {
    let parts: Vec<&str> = relative.split('/').collect();
    let last = parts.len().saturating_sub(1);
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let part_is_dir = i < last || is_dir;
            transfer::restored_name(OsStr::new(part), part_is_dir, policy)
        })
        .collect()
}

fn restore_path(
    source: &Path,
    metadata: &Metadata,
    destination: &Path,
    policy: GitPolicy,
) -> Result<TransferStats> {
    if metadata.is_dir() {
        restore_dir(source, destination, policy)
    } else {
        restore_file(source, metadata, destination)
    }
}

/// Restore a directory tree. A directory created here takes the vault
/// directory's mode; an existing one keeps its own.
fn restore_dir(source: &Path, destination: &Path, policy: GitPolicy) -> Result<TransferStats> {
    let created = transfer::metadata_if_exists(destination)?.is_none();
    fs::create_dir_all(destination).map_err(|e| Error::io(destination, e))?;

    let mut stats = TransferStats::default();
    for entry in fs::read_dir(source).map_err(|e| Error::io(source, e))? {
        let entry = entry.map_err(|e| Error::io(source, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
        let name = entry.file_name();

        match EntryKind::from_file_type(file_type) {
            Some(EntryKind::Dir) => {
                let target = destination.join(transfer::restored_name(&name, true, policy));
                stats += restore_dir(&path, &target, policy)?;
            }
            Some(EntryKind::File) => {
                let metadata = entry.metadata().map_err(|e| Error::io(&path, e))?;
                stats += restore_file(&path, &metadata, &destination.join(&name))?;
            }
            Some(EntryKind::Symlink) | None => {
                tracing::debug!(path = %path.display(), "Skipping non-regular vault entry");
            }
        }
    }

    if created {
        transfer::copy_dir_permissions(source, destination)?;
    }
    Ok(stats)
}

fn restore_file(source: &Path, metadata: &Metadata, destination: &Path) -> Result<TransferStats> {
    if !transfer::should_restore(metadata, destination)? {
        return Ok(TransferStats::skipped());
    }

    transfer::replace_file(source, destination)?;
    let mtime = FileTime::from_last_modification_time(metadata);
    filetime::set_file_mtime(destination, mtime).map_err(|e| Error::io(destination, e))?;

    tracing::debug!(path = %destination.display(), "Restored file");
    Ok(TransferStats::updated())
}

impl VaultEntry {
    /// Children that are not inside an embedded git database.
    pub fn visible_children(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(String::as_str).filter(|child| {
            !child
                .split('/')
                .any(|part| VaultName::DisabledGitDir.matches(part))
        })
    }
}
