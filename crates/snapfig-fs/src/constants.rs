//! Well-known names inside a vault and inside mirrored trees.

use std::path::Path;

/// Suffix appended to a symlink's name to form its marker file.
pub const SYMLINK_MARKER_SUFFIX: &str = ".snapfig-symlink";

/// Fixed names the engine recognizes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultName {
    /// An embedded git database (`.git`)
    GitDir,
    /// A git database renamed out of the way inside the vault (`.git_disabled`)
    DisabledGitDir,
    /// The manifest at the vault root (`manifest.yml`)
    Manifest,
}

impl VaultName {
    /// Get the string representation of the name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitDir => ".git",
            Self::DisabledGitDir => ".git_disabled",
            Self::Manifest => "manifest.yml",
        }
    }

    /// True if `name` is exactly this well-known name.
    pub fn matches(&self, name: &str) -> bool {
        name == self.as_str()
    }
}

impl AsRef<Path> for VaultName {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for VaultName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for VaultName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
