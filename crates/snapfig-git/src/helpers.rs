//! Shared git2 helper functions for vault operations
//!
//! These functions encapsulate the git2 patterns `GitVault` is built from.

use git2::{
    Cred, CredentialType, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks, Repository,
    Signature,
};

use crate::remote::TOKEN_USER;
use crate::{Error, Result};

/// Branch used when HEAD does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// Identity used for vault commits when git has no `user.name`/`user.email`.
const FALLBACK_NAME: &str = "snapfig";
const FALLBACK_EMAIL: &str = "snapfig@localhost";

/// Get the current branch name, including an unborn branch in a fresh repo.
///
/// Falls back to [`DEFAULT_BRANCH`] when HEAD is detached.
pub fn current_branch(repo: &Repository) -> String {
    if let Ok(head) = repo.head()
        && head.is_branch()
        && let Some(name) = head.shorthand()
    {
        return name.to_string();
    }

    // Unborn HEAD still points symbolically at refs/heads/<branch>
    repo.find_reference("HEAD")
        .ok()
        .and_then(|head| {
            head.symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
}

/// Stage additions, modifications and deletions under the work tree.
pub fn stage_all(repo: &Repository) -> Result<git2::Index> {
    let mut index = repo.index()?;
    index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"], None)?;
    index.write()?;
    Ok(index)
}

/// Commit the staged index on HEAD.
///
/// Returns `false` without committing when the staged tree matches HEAD's
/// tree, or when the very first commit would be empty.
pub fn commit_index(repo: &Repository, index: &mut git2::Index, message: &str) -> Result<bool> {
    let tree_id = index.write_tree()?;
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());

    match &parent {
        Some(parent) if parent.tree_id() == tree_id => return Ok(false),
        None if index.is_empty() => return Ok(false),
        _ => {}
    }

    let signature = repo
        .signature()
        .or_else(|_| Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))?;
    let tree = repo.find_tree(tree_id)?;
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let oid = repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )?;
    tracing::debug!(commit = %oid, "Committed vault changes");
    Ok(true)
}

/// Build remote callbacks that authenticate with `token` when given,
/// otherwise with the SSH agent or the credential helper from `config`.
pub fn remote_callbacks<'a>(
    config: Option<git2::Config>,
    token: Option<&'a str>,
) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        if let Some(token) = token.filter(|t| !t.is_empty())
            && allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
        {
            return Cred::userpass_plaintext(TOKEN_USER, token);
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && let Some(config) = &config
        {
            return Cred::credential_helper(config, url, username_from_url);
        }
        Cred::default()
    });
    callbacks
}

/// Push a branch to `remote_url` (or the named `origin` when no override).
///
/// git2 reports per-ref rejections through a callback rather than an error,
/// so those are surfaced as [`Error::PushFailed`].
pub fn push(
    repo: &Repository,
    url_override: Option<&str>,
    branch: &str,
    token: Option<&str>,
) -> Result<()> {
    let mut remote = match url_override {
        Some(url) => repo.remote_anonymous(url)?,
        None => repo.find_remote("origin").map_err(|_| Error::RemoteNotFound {
            name: "origin".to_string(),
        })?,
    };

    let mut rejection: Option<String> = None;
    let mut callbacks = remote_callbacks(repo.config().ok(), token);
    callbacks.push_update_reference(|refname, status| {
        if let Some(message) = status {
            rejection = Some(format!("{refname}: {message}"));
        }
        Ok(())
    });

    let mut options = PushOptions::new();
    options.remote_callbacks(callbacks);

    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    remote
        .push(&[&refspec], Some(&mut options))
        .map_err(|e| Error::PushFailed {
            message: e.message().to_string(),
        })?;
    drop(options);

    match rejection {
        Some(message) => Err(Error::PushFailed { message }),
        None => Ok(()),
    }
}

/// Fetch options carrying the same authentication as [`remote_callbacks`].
pub fn fetch_options(config: Option<git2::Config>, token: Option<&str>) -> FetchOptions<'_> {
    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks(config, token));
    options
}

/// Pull a branch using fetch + fast-forward.
///
/// An unborn local branch is simply pointed at the fetched commit. Anything
/// other than up-to-date or fast-forward is refused: two diverged vaults are
/// never merged.
pub fn pull(
    repo: &Repository,
    url_override: Option<&str>,
    branch: &str,
    token: Option<&str>,
) -> Result<()> {
    let mut remote = match url_override {
        Some(url) => repo.remote_anonymous(url)?,
        None => repo.find_remote("origin").map_err(|_| Error::RemoteNotFound {
            name: "origin".to_string(),
        })?,
    };

    let mut options = fetch_options(repo.config().ok(), token);
    remote
        .fetch(&[branch], Some(&mut options), None)
        .map_err(|e| Error::PullFailed {
            message: format!("Fetch failed: {}", e.message()),
        })?;

    let fetch_head = repo
        .find_reference("FETCH_HEAD")
        .map_err(|e| Error::PullFailed {
            message: format!("Could not find FETCH_HEAD: {}", e.message()),
        })?;
    let fetch_commit = fetch_head.peel_to_commit().map_err(|e| Error::PullFailed {
        message: format!("Could not resolve FETCH_HEAD: {}", e.message()),
    })?;

    let annotated = repo.find_annotated_commit(fetch_commit.id())?;
    let (analysis, _) = repo.merge_analysis(&[&annotated])?;

    if analysis.is_up_to_date() {
        return Ok(());
    }

    let refname = format!("refs/heads/{branch}");
    let reflog = format!("pull: fast-forward to {}", fetch_commit.id());

    if analysis.is_unborn() {
        repo.reference(&refname, fetch_commit.id(), true, &reflog)?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        return Ok(());
    }

    if analysis.is_fast_forward() {
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), &reflog)?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        return Ok(());
    }

    let head_commit = repo.head()?.peel_to_commit()?;
    Err(Error::CannotFastForward {
        message: format!(
            "Cannot fast-forward {} from {} to {}. The vault and its remote have diverged.",
            branch,
            head_commit.id(),
            fetch_commit.id()
        ),
    })
}
