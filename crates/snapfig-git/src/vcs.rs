//! The version-control contract consumed by the copy engine and front-ends

use crate::Result;
use snapfig_fs::NormalizedPath;

/// Outcome of a pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// The vault did not exist locally and was cloned from the remote.
    pub cloned: bool,
}

/// Stateless version-control operations parameterized by vault directory.
///
/// The copy engine calls `init_repo` and `commit` after a successful mirror
/// and treats any failure as advisory. Push, pull and remote management are
/// driven by front-ends.
pub trait VersionControl {
    /// Make `vault_dir` a repository if it is not one already.
    fn init_repo(&self, vault_dir: &NormalizedPath) -> Result<()>;

    /// Stage every change (additions, modifications, deletions) and commit.
    ///
    /// Returns `false` when there was nothing to commit.
    fn commit(&self, vault_dir: &NormalizedPath, message: &str) -> Result<bool>;

    /// URL of the `origin` remote, if one is configured.
    fn has_remote(&self, vault_dir: &NormalizedPath) -> Result<Option<String>>;

    /// Push the current branch to `origin`.
    fn push(&self, vault_dir: &NormalizedPath) -> Result<()>;

    /// Fast-forward from `origin`, cloning first when the vault is absent.
    fn pull(&self, vault_dir: &NormalizedPath) -> Result<PullOutcome>;

    /// Point `origin` at `url`, creating the repository and remote as needed.
    fn set_remote(&self, vault_dir: &NormalizedPath, url: &str) -> Result<()>;
}
