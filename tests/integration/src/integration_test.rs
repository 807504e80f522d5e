//! End-to-end integration test for the backup and restore cycle
//!
//! Exercises the complete flow: config file -> copy -> commit -> push ->
//! clone on a second machine -> manifest reconstruction -> restore.

use std::fs;

use pretty_assertions::assert_eq;
use snapfig_core::{Config, DefaultService, GitPolicy, Service, WatchedEntry};
use snapfig_fs::NormalizedPath;
use snapfig_test_utils::Sandbox;
use snapfig_test_utils::git::{bare_remote, commit_count, real_git_repo};

fn config_path(sandbox: &Sandbox) -> NormalizedPath {
    NormalizedPath::new(sandbox.root().join("config/snapfig.yml"))
}

fn service(sandbox: &Sandbox) -> DefaultService {
    let path = config_path(sandbox);
    let config = Config::load_or_default(&path).unwrap();
    DefaultService::with_dirs(
        config,
        path,
        NormalizedPath::new(sandbox.home()),
        NormalizedPath::new(sandbox.vault()),
    )
}

/// A home with an nvim config that is itself a git checkout, a shell rc
/// file, and a plugin directory whose repository should not be kept.
fn populate_home(sandbox: &Sandbox) {
    sandbox.write_home(".config/nvim/init.lua", "require('keys')\n");
    sandbox.write_home(".config/nvim/lua/keys.lua", "vim.g.mapleader = ' '\n");
    real_git_repo(&sandbox.home_path(".config/nvim"));
    sandbox.write_home(".bashrc", "export EDITOR=nvim\n");
    sandbox.write_home(".local/share/plugin/plugin.vim", "\" plugin\n");
    real_git_repo(&sandbox.home_path(".local/share/plugin"));
}

fn write_config(sandbox: &Sandbox, remote: &str) {
    Config {
        git: GitPolicy::Disable,
        remote: Some(remote.to_string()),
        git_token: None,
        vault_path: None,
        watching: vec![
            WatchedEntry::new(".config/nvim"),
            WatchedEntry::new(".bashrc"),
            WatchedEntry::new(".local/share/plugin").with_policy(GitPolicy::Remove),
        ],
        ..Config::default()
    }
    .save(&config_path(sandbox))
    .unwrap();
}

#[test]
fn test_backup_and_restore_on_a_second_machine() {
    let laptop = Sandbox::new();
    let remote = laptop.root().join("dotfiles.git");
    bare_remote(&remote);
    let url = remote.to_string_lossy().into_owned();

    populate_home(&laptop);
    write_config(&laptop, &url);

    // Back up
    let mut origin = service(&laptop);
    origin.set_remote(&url).unwrap();
    let copied = origin.copy().unwrap();
    assert_eq!(copied.copied.len(), 3);
    assert!(copied.git_error.is_none(), "{:?}", copied.git_error);
    laptop.assert_vault_exists(".config/nvim/.git_disabled/HEAD");
    laptop.assert_vault_missing(".config/nvim/.git");
    laptop.assert_vault_missing(".local/share/plugin/.git");
    assert_eq!(commit_count(&laptop.vault()), 1);
    origin.push().unwrap();

    // New machine: only the remote is known
    let desktop = Sandbox::new();
    Config {
        remote: Some(url),
        ..Config::default()
    }
    .save(&config_path(&desktop))
    .unwrap();

    let mut replica = service(&desktop);
    assert!(replica.pull().unwrap().cloned);
    assert!(replica.reconstruct_watching().unwrap());
    replica.save_config(None).unwrap();
    let restored = replica.restore().unwrap();

    assert_eq!(restored.restored.len(), 3);
    desktop.assert_home_contains(".config/nvim/lua/keys.lua", "vim.g.mapleader = ' '\n");
    desktop.assert_home_contains(".bashrc", "export EDITOR=nvim\n");
    desktop.assert_home_missing(".local/share/plugin/.git");
    desktop.assert_home_contains(".config/nvim/.git/HEAD", "ref: refs/heads/");
    desktop.assert_home_missing(".config/nvim/.git_disabled");

    // The adopted watch list was persisted
    let saved = Config::load(&config_path(&desktop)).unwrap();
    assert_eq!(
        saved.watching,
        vec![
            WatchedEntry::new(".config/nvim").with_policy(GitPolicy::Disable),
            WatchedEntry::new(".bashrc").with_policy(GitPolicy::Disable),
            WatchedEntry::new(".local/share/plugin").with_policy(GitPolicy::Remove),
        ]
    );
}

#[test]
fn test_edits_flow_through_a_second_backup() {
    let laptop = Sandbox::new();
    let remote = laptop.root().join("dotfiles.git");
    bare_remote(&remote);
    let url = remote.to_string_lossy().into_owned();
    populate_home(&laptop);
    write_config(&laptop, &url);

    let origin = service(&laptop);
    origin.copy().unwrap();

    laptop.write_home(".bashrc", "export EDITOR=hx\n");
    fs::remove_file(laptop.home_path(".config/nvim/lua/keys.lua")).unwrap();
    let second = origin.copy().unwrap();

    assert_eq!(second.files_updated, 1);
    assert_eq!(second.files_removed, 1);
    laptop.assert_vault_contains(".bashrc", "export EDITOR=hx\n");
    laptop.assert_vault_missing(".config/nvim/lua/keys.lua");
    assert_eq!(commit_count(&laptop.vault()), 2);
}
