//! Git repository fixtures.
//!
//! Prefer the fake fixture when a test only needs a `.git` directory to be
//! present; the real ones cost a libgit2 init.

use std::fs;
use std::path::Path;

/// Create a `.git` directory with a HEAD file and one loose file, without
/// initialising a repository.
///
/// Enough for tests that only look at how `.git` is copied or renamed.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_git_dir(path: &Path) {
    let git = path.join(".git");
    fs::create_dir_all(git.join("refs/heads"))
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to create .git: {e}"));
    fs::write(git.join("HEAD"), "ref: refs/heads/main\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write HEAD: {e}"));
    fs::write(git.join("config"), "[core]\n\tbare = false\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write config: {e}"));
}

/// Initialise a real repository with `git2` and a local committer identity.
///
/// # Panics
/// Panics if the repository cannot be initialised or configured.
pub fn real_git_repo(path: &Path) -> git2::Repository {
    let repo = git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    });
    set_identity(&repo);
    repo
}

/// Initialise a bare repository to act as a vault remote.
///
/// HEAD points at `main` so clones check out the branch pushed to it.
///
/// # Panics
/// Panics if the repository cannot be initialised.
pub fn bare_remote(path: &Path) -> git2::Repository {
    let mut options = git2::RepositoryInitOptions::new();
    options.bare(true).initial_head("main");
    git2::Repository::init_opts(path, &options).unwrap_or_else(|e| {
        panic!(
            "bare_remote: failed to init bare repository at {}: {e}",
            path.display()
        )
    })
}

/// Number of commits reachable from HEAD, 0 for an unborn branch.
///
/// # Panics
/// Panics if the repository cannot be opened or walked.
pub fn commit_count(path: &Path) -> usize {
    let repo = git2::Repository::open(path)
        .unwrap_or_else(|e| panic!("commit_count: failed to open {}: {e}", path.display()));
    if repo.head().is_err() {
        return 0;
    }
    let mut walk = repo.revwalk().unwrap();
    walk.push_head().unwrap();
    walk.count()
}

/// Message of the commit at HEAD.
///
/// # Panics
/// Panics if the repository has no HEAD commit.
pub fn head_message(path: &Path) -> String {
    let repo = git2::Repository::open(path).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    commit.message().unwrap_or_default().to_string()
}

fn set_identity(repo: &git2::Repository) {
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();
}
