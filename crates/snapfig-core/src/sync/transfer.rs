//! Transfer rules shared by the copy and restore walks
//!
//! Name mapping, freshness checks and the small filesystem steps both
//! directions are built from. Each walk returns a [`TransferStats`] that the
//! caller folds into its own.

use std::ffi::{OsStr, OsString};
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::ops::AddAssign;
use std::path::Path;

use filetime::FileTime;
use snapfig_fs::VaultName;
use snapfig_fs::constants::SYMLINK_MARKER_SUFFIX;
use walkdir::WalkDir;

use crate::config::GitPolicy;
use crate::{Error, Result};

/// What a directory entry is, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

impl EntryKind {
    /// Classify a file type; sockets, FIFOs and devices yield `None`.
    pub fn from_file_type(file_type: fs::FileType) -> Option<Self> {
        if file_type.is_symlink() {
            Some(Self::Symlink)
        } else if file_type.is_dir() {
            Some(Self::Dir)
        } else if file_type.is_file() {
            Some(Self::File)
        } else {
            None
        }
    }
}

/// File counters accumulated by a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Files written because they were new or changed
    pub files_updated: usize,
    /// Files left alone because they were unchanged
    pub files_skipped: usize,
    /// Stale files deleted from the destination
    pub files_removed: usize,
}

impl TransferStats {
    pub fn updated() -> Self {
        Self {
            files_updated: 1,
            ..Self::default()
        }
    }

    pub fn skipped() -> Self {
        Self {
            files_skipped: 1,
            ..Self::default()
        }
    }

    pub fn removed(count: usize) -> Self {
        Self {
            files_removed: count,
            ..Self::default()
        }
    }
}

impl AddAssign for TransferStats {
    fn add_assign(&mut self, other: Self) {
        self.files_updated += other.files_updated;
        self.files_skipped += other.files_skipped;
        self.files_removed += other.files_removed;
    }
}

/// Name an origin entry takes inside the vault, or `None` to leave it out.
///
/// A `.git` directory is dropped under [`GitPolicy::Remove`] and becomes
/// `.git_disabled` under [`GitPolicy::Disable`]. A symlink becomes its
/// `<name>.snapfig-symlink` marker. Both stale removal and the copy step use
/// this mapping.
pub fn destination_name(name: &OsStr, kind: EntryKind, policy: GitPolicy) -> Option<OsString> {
    match kind {
        EntryKind::Dir if name == VaultName::GitDir.as_str() => match policy {
            GitPolicy::Remove => None,
            GitPolicy::Disable => Some(VaultName::DisabledGitDir.as_str().into()),
        },
        EntryKind::Symlink => {
            let mut marker = name.to_os_string();
            marker.push(SYMLINK_MARKER_SUFFIX);
            Some(marker)
        }
        EntryKind::File | EntryKind::Dir => Some(name.to_os_string()),
    }
}

/// Name a vault entry takes back at its origin.
///
/// Only a `.git_disabled` directory under [`GitPolicy::Disable`] is renamed.
/// Markers are restored as the plain files they are.
pub fn restored_name(name: &OsStr, is_dir: bool, policy: GitPolicy) -> OsString {
    if is_dir && policy == GitPolicy::Disable && name == VaultName::DisabledGitDir.as_str() {
        return VaultName::GitDir.as_str().into();
    }
    name.to_os_string()
}

/// Marker content standing in for a symlink named `name`.
pub fn marker_content(target: &Path, name: &OsStr) -> String {
    format!(
        "ln -s {} {}\n",
        target.display(),
        Path::new(name).display()
    )
}

/// Copy direction: write when the destination is missing, differs in size,
/// or is strictly older than the source.
pub fn should_copy(source: &Metadata, destination: &Path) -> Result<bool> {
    let Some(existing) = metadata_if_exists(destination)? else {
        return Ok(true);
    };
    if source.len() != existing.len() {
        return Ok(true);
    }
    Ok(FileTime::from_last_modification_time(source)
        > FileTime::from_last_modification_time(&existing))
}

/// Restore direction: write on any size or modification-time difference.
/// The vault wins even when the local file is newer.
pub fn should_restore(source: &Metadata, destination: &Path) -> Result<bool> {
    let Some(existing) = metadata_if_exists(destination)? else {
        return Ok(true);
    };
    if source.len() != existing.len() {
        return Ok(true);
    }
    Ok(FileTime::from_last_modification_time(source)
        != FileTime::from_last_modification_time(&existing))
}

/// `symlink_metadata`, mapping `NotFound` to `None`.
pub fn metadata_if_exists(path: &Path) -> Result<Option<Metadata>> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Copy `source` over `destination`, creating parent directories.
///
/// A read-only destination (git object files are 0444) is unlinked and
/// written fresh.
pub fn replace_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    match fs::copy(source, destination) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied && destination.exists() => {
            fs::remove_file(destination).map_err(|e| Error::io(destination, e))?;
            fs::copy(source, destination)
                .map(|_| ())
                .map_err(|e| Error::io(destination, e))
        }
        Err(e) => Err(Error::io(destination, e)),
    }
}

/// Delete a file, symlink or directory tree and return how many files went
/// with it.
pub fn remove_path(path: &Path) -> Result<usize> {
    let Some(metadata) = metadata_if_exists(path)? else {
        return Ok(0);
    };

    if !metadata.is_dir() {
        fs::remove_file(path).map_err(|e| Error::io(path, e))?;
        return Ok(1);
    }

    // Directories carried over read-only would refuse to give up their entries
    let mut files = 0;
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            make_owner_writable(entry.path())?;
        } else {
            files += 1;
        }
    }
    fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
    Ok(files)
}

/// Make sure nothing but a directory sits at `path`, then create it.
///
/// Returns the number of files removed to make room.
pub fn ensure_dir(path: &Path) -> Result<usize> {
    let removed = match metadata_if_exists(path)? {
        Some(metadata) if !metadata.is_dir() => remove_path(path)?,
        _ => 0,
    };
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    make_owner_writable(path)?;
    Ok(removed)
}

/// Give directory `destination` the permissions of directory `source`.
///
/// Applied once the directory's contents are written, so a read-only source
/// directory does not block its own children.
pub fn copy_dir_permissions(source: &Path, destination: &Path) -> Result<()> {
    let permissions = fs::metadata(source)
        .map_err(|e| Error::io(source, e))?
        .permissions();
    fs::set_permissions(destination, permissions).map_err(|e| Error::io(destination, e))
}

/// Let the owner write into directory `path` again, undoing a read-only mode
/// carried over by [`copy_dir_permissions`] on an earlier run.
#[cfg(unix)]
pub fn make_owner_writable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .map_err(|e| Error::io(path, e))?
        .permissions();
    let mode = permissions.mode();
    if mode & 0o700 != 0o700 {
        permissions.set_mode(mode | 0o700);
        fs::set_permissions(path, permissions).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn make_owner_writable(path: &Path) -> Result<()> {
    let mut permissions = fs::metadata(path)
        .map_err(|e| Error::io(path, e))?
        .permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}
