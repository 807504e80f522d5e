//! Normalized path handling for vault-relative and origin paths

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Watched entries, manifest entries and selective-restore requests are all
/// expressed as forward-slash relative strings; `NormalizedPath` keeps the
/// absolute roots (home, vault) in the same shape so the two can be joined
/// and compared without caring about the platform separator. Conversion to
/// a native `PathBuf` happens only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a relative segment, which may itself contain `/`.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            return self.clone();
        }
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present. Dotfiles such as `.bashrc` have none.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Check if this path exists on the filesystem.
    ///
    /// Symlinks are not followed, so a dangling link still "exists".
    pub fn exists(&self) -> bool {
        self.to_native().symlink_metadata().is_ok()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Validate a watched path before it is joined onto the home or vault root.
///
/// The path must be non-empty, relative, and must not climb out of its root
/// through `..` components. Manifests read from a freshly cloned vault are
/// untrusted input, so reconstruction runs every entry through this check.
pub fn validate_relative_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Err(invalid("path is empty"));
    }
    if trimmed.starts_with('/') || trimmed.starts_with('\\') {
        return Err(invalid("path must be relative to the home directory"));
    }

    let native = Path::new(trimmed);
    for component in native.components() {
        match component {
            Component::ParentDir => {
                return Err(invalid("path must not contain '..' components"));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative to the home directory"));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    if trimmed.split(['/', '\\']).any(|part| part == "..") {
        return Err(invalid("path must not contain '..' components"));
    }

    Ok(())
}
