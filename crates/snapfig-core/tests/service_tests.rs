//! Tests for DefaultService driving a real vault repository

use pretty_assertions::assert_eq;
use snapfig_core::{Config, DefaultService, Error, GitPolicy, Service, WatchedEntry};
use snapfig_fs::NormalizedPath;
use snapfig_test_utils::Sandbox;
use snapfig_test_utils::git::{bare_remote, commit_count, head_message};

fn service(sandbox: &Sandbox, config: Config) -> DefaultService {
    DefaultService::with_dirs(
        config,
        NormalizedPath::new(sandbox.root().join("config.yml")),
        NormalizedPath::new(sandbox.home()),
        NormalizedPath::new(sandbox.vault()),
    )
}

fn watching(paths: &[&str]) -> Config {
    Config {
        watching: paths.iter().map(|p| WatchedEntry::new(*p)).collect(),
        ..Config::default()
    }
}

#[test]
fn test_copy_commits_to_vault_repository() {
    let sandbox = Sandbox::new();
    sandbox.write_home(".bashrc", "export A=1\n");
    sandbox.write_home(".config/fish/config.fish", "set -x A 1\n");
    let service = service(&sandbox, watching(&[".bashrc", ".config/fish"]));

    let result = service.copy().unwrap();

    assert_eq!(result.copied.len(), 2);
    assert!(result.git_error.is_none());
    assert_eq!(commit_count(&sandbox.vault()), 1);
    assert_eq!(head_message(&sandbox.vault()), "snapfig: backup 2 paths");

    // nothing changed, nothing to commit
    service.copy().unwrap();
    assert_eq!(commit_count(&sandbox.vault()), 1);
}

#[test]
fn test_restore_through_service() {
    let sandbox = Sandbox::new();
    sandbox.write_home(".config/nvim/init.lua", "vim.o.number = true\n");
    let service = service(&sandbox, watching(&[".config/nvim"]));
    service.copy().unwrap();

    sandbox.write_home(".config/nvim/init.lua", "broken\n");
    let result = service.restore().unwrap();

    assert_eq!(result.restored, vec![".config/nvim".to_string()]);
    sandbox.assert_home_contains(".config/nvim/init.lua", "vim.o.number = true\n");
}

#[test]
fn test_reconstruct_watching_from_manifest() {
    let sandbox = Sandbox::new();
    sandbox.write_home(".config/nvim/init.lua", "x\n");
    sandbox.write_home(".bashrc", "y\n");
    let mut config = watching(&[".config/nvim", ".bashrc"]);
    config.watching[0].git = Some(GitPolicy::Remove);
    service(&sandbox, config).copy().unwrap();

    let mut fresh = service(&sandbox, Config::default());
    assert!(fresh.reconstruct_watching().unwrap());

    assert_eq!(
        fresh.config().watching,
        vec![
            WatchedEntry::new(".config/nvim").with_policy(GitPolicy::Remove),
            WatchedEntry::new(".bashrc").with_policy(GitPolicy::Disable),
        ]
    );
}

#[test]
fn test_reconstruct_watching_keeps_existing_list() {
    let sandbox = Sandbox::new();
    sandbox.write_home(".bashrc", "y\n");
    service(&sandbox, watching(&[".bashrc"])).copy().unwrap();

    let mut configured = service(&sandbox, watching(&[".zshrc"]));
    assert!(!configured.reconstruct_watching().unwrap());
    assert_eq!(configured.config().watching, vec![WatchedEntry::new(".zshrc")]);
}

#[test]
fn test_reconstruct_watching_without_manifest() {
    let sandbox = Sandbox::new();
    let mut service = service(&sandbox, Config::default());

    assert!(!service.reconstruct_watching().unwrap());
    assert!(service.config().watching.is_empty());
}

#[test]
fn test_reconstruct_watching_rejects_escaping_manifest_paths() {
    let sandbox = Sandbox::new();
    sandbox.write_vault(
        "manifest.yml",
        "version: 1\nlast_updated: x\nentries:\n- path: ../outside\n  git: disable\n  enabled: true\n  is_dir: false\n",
    );
    let mut service = service(&sandbox, Config::default());

    let err = service.reconstruct_watching().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }), "got {err}");
    assert!(service.config().watching.is_empty());
}

#[test]
fn test_set_remote_updates_vault_and_config() {
    let sandbox = Sandbox::new();
    let remote = sandbox.root().join("remote.git");
    bare_remote(&remote);
    let url = remote.to_string_lossy().into_owned();
    let mut service = service(&sandbox, Config::default());

    assert_eq!(service.remote_url().unwrap(), None);
    service.set_remote(&format!("  {url}  ")).unwrap();

    assert_eq!(service.remote_url().unwrap(), Some(url.clone()));
    assert_eq!(service.config().remote.as_deref(), Some(url.as_str()));
}

#[test]
fn test_set_remote_rejects_empty_url() {
    let sandbox = Sandbox::new();
    let mut service = service(&sandbox, Config::default());

    let err = service.set_remote("   ").unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }), "got {err}");
    assert_eq!(service.config().remote, None);
}

#[test]
fn test_save_config_defaults_to_loaded_path() {
    let sandbox = Sandbox::new();
    let mut service = service(&sandbox, Config::default());
    service.update_watching(vec![WatchedEntry::new(".bashrc")]);

    service.save_config(None).unwrap();
    let elsewhere = NormalizedPath::new(sandbox.root().join("other/config.yml"));
    service.save_config(Some(&elsewhere)).unwrap();

    for path in [service.config_path().clone(), elsewhere] {
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.watching, vec![WatchedEntry::new(".bashrc")]);
    }
}

#[test]
fn test_push_then_pull_on_second_machine() {
    let first = Sandbox::new();
    let remote = first.root().join("remote.git");
    bare_remote(&remote);
    let url = remote.to_string_lossy().into_owned();

    first.write_home(".gitconfig", "[user]\n\tname = me\n");
    let mut origin = service(&first, watching(&[".gitconfig"]));
    origin.set_remote(&url).unwrap();
    origin.copy().unwrap();
    origin.push().unwrap();

    let second = Sandbox::new();
    let config = Config {
        remote: Some(url),
        ..Config::default()
    };
    let mut replica = service(&second, config);

    let outcome = replica.pull().unwrap();
    assert!(outcome.cloned);
    assert!(replica.reconstruct_watching().unwrap());
    replica.restore().unwrap();

    second.assert_home_contains(".gitconfig", "[user]\n\tname = me\n");
}
