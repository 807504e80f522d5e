//! Mission-based Integration Tests
//!
//! Production scenarios for the dotfile vault, grouped by mission. Each test
//! drives the public engine API against a sandboxed home and vault with a
//! real git repository behind the vault.

use std::fs;

use snapfig_core::{
    Config, DefaultService, GitPolicy, Manifest, SelectionTree, Service, WatchedEntry,
};
use snapfig_fs::NormalizedPath;
use snapfig_test_utils::Sandbox;
use snapfig_test_utils::git::fake_git_dir;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Service over a sandbox with the given watch list and global policy.
fn service(sandbox: &Sandbox, git: GitPolicy, watching: Vec<WatchedEntry>) -> DefaultService {
    DefaultService::with_dirs(
        Config {
            git,
            watching,
            ..Config::default()
        },
        NormalizedPath::new(sandbox.root().join("config.yml")),
        NormalizedPath::new(sandbox.home()),
        NormalizedPath::new(sandbox.vault()),
    )
}

fn vault(sandbox: &Sandbox) -> NormalizedPath {
    NormalizedPath::new(sandbox.vault())
}

// =============================================================================
// Mission 1: Backup
// =============================================================================

mod m1_backup {
    use super::*;
    use pretty_assertions::assert_eq;

    /// M1.1: nvim config with an embedded repository under Remove
    #[test]
    fn m1_1_remove_policy_drops_embedded_repository() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".config/nvim/init.lua", "x\n");
        fake_git_dir(&sandbox.home_path(".config/nvim"));
        let service = service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".config/nvim").with_policy(GitPolicy::Remove)],
        );

        let result = service.copy().unwrap();

        assert_eq!(result.copied, vec![".config/nvim".to_string()]);
        assert_eq!(result.files_updated, 1);
        sandbox.assert_vault_exists(".config/nvim/init.lua");
        sandbox.assert_vault_missing(".config/nvim/.git");
        sandbox.assert_vault_missing(".config/nvim/.git_disabled");
    }

    /// M1.2: a second backup with nothing changed touches nothing
    #[test]
    fn m1_2_backup_is_idempotent() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".config/fish/config.fish", "a\n");
        sandbox.write_home(".config/fish/functions/ll.fish", "b\n");
        sandbox.write_home(".bashrc", "c\n");
        let service = service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".config/fish"), WatchedEntry::new(".bashrc")],
        );

        service.copy().unwrap();
        let again = service.copy().unwrap();

        assert_eq!(again.files_updated, 0);
        assert_eq!(again.files_skipped, 3);
        assert_eq!(again.files_removed, 0);
    }

    /// M1.3: flipping Disable to Remove leaves no git database behind
    #[test]
    fn m1_3_policy_switch_cleans_renamed_repository() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".config/nvim/init.lua", "x\n");
        fake_git_dir(&sandbox.home_path(".config/nvim"));

        service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".config/nvim")],
        )
        .copy()
        .unwrap();
        sandbox.assert_vault_exists(".config/nvim/.git_disabled/HEAD");

        service(
            &sandbox,
            GitPolicy::Remove,
            vec![WatchedEntry::new(".config/nvim")],
        )
        .copy()
        .unwrap();

        sandbox.assert_vault_missing(".config/nvim/.git");
        sandbox.assert_vault_missing(".config/nvim/.git_disabled");
        sandbox.assert_vault_exists(".config/nvim/init.lua");
    }

    /// M1.4: unwatching a path keeps its vault copy but drops it from the manifest
    #[test]
    fn m1_4_disabled_entry_leaves_manifest() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".bashrc", "a\n");
        sandbox.write_home(".zshrc", "b\n");
        service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".bashrc"), WatchedEntry::new(".zshrc")],
        )
        .copy()
        .unwrap();

        service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".bashrc"), WatchedEntry::new(".zshrc").disabled()],
        )
        .copy()
        .unwrap();

        let manifest = Manifest::load(&vault(&sandbox)).unwrap();
        let paths: Vec<_> = manifest.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec![".bashrc"]);
    }

    /// M1.5: a theme symlink is recorded, not followed
    #[cfg(unix)]
    #[test]
    fn m1_5_symlink_becomes_marker() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".config/alacritty/alacritty.toml", "[font]\n");
        sandbox.write_home("themes/dark/colors.toml", "bg = '#000'\n");
        let target = sandbox.home_path("themes/dark");
        sandbox.symlink_home(".config/alacritty/current", &target.to_string_lossy());
        let service = service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".config/alacritty")],
        );

        service.copy().unwrap();

        sandbox.assert_vault_contains(
            ".config/alacritty/current.snapfig-symlink",
            &format!("ln -s {} current\n", target.display()),
        );
        sandbox.assert_vault_missing(".config/alacritty/current");
    }
}

// =============================================================================
// Mission 2: Restore
// =============================================================================

mod m2_restore {
    use super::*;
    use pretty_assertions::assert_eq;

    /// M2.1: Disable round trip brings the embedded repository back as .git
    #[test]
    fn m2_1_disable_round_trip() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".config/nvim/init.lua", "x\n");
        fake_git_dir(&sandbox.home_path(".config/nvim"));
        let service = service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".config/nvim")],
        );
        service.copy().unwrap();
        fs::remove_dir_all(sandbox.home_path(".config/nvim")).unwrap();

        service.restore().unwrap();

        sandbox.assert_home_contains(".config/nvim/init.lua", "x\n");
        sandbox.assert_home_contains(".config/nvim/.git/HEAD", "ref: refs/heads/main\n");
        sandbox.assert_home_missing(".config/nvim/.git_disabled");
    }

    /// M2.2: the vault wins over a local edit made after the last backup.
    ///
    /// Nothing warns about the lost edit; restore reconciles toward the
    /// vault unconditionally.
    #[test]
    fn m2_2_restore_overwrites_unsaved_local_edit() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".gitconfig", "[user]\n\tname = old\n");
        let service = service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".gitconfig")],
        );
        service.copy().unwrap();
        service.restore().unwrap();

        sandbox.write_home(".gitconfig", "[user]\n\tname = newer\n");
        let result = service.restore().unwrap();

        assert_eq!(result.files_updated, 1);
        sandbox.assert_home_contains(".gitconfig", "[user]\n\tname = old\n");
    }

    /// M2.3: restore reports entries with nothing in the vault
    #[test]
    fn m2_3_missing_vault_entry_is_skipped() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".bashrc", "a\n");
        service(&sandbox, GitPolicy::Disable, vec![WatchedEntry::new(".bashrc")])
            .copy()
            .unwrap();

        let result = service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".bashrc"), WatchedEntry::new(".tmux.conf")],
        )
        .restore()
        .unwrap();

        assert_eq!(result.restored, vec![".bashrc".to_string()]);
        assert_eq!(result.skipped, vec![".tmux.conf".to_string()]);
    }
}

// =============================================================================
// Mission 3: Selective Restore
// =============================================================================

mod m3_selective {
    use super::*;
    use pretty_assertions::assert_eq;

    fn backed_up() -> (Sandbox, DefaultService) {
        let sandbox = Sandbox::new();
        sandbox.write_home(".config/nvim/init.lua", "init\n");
        sandbox.write_home(".config/nvim/lua/keys.lua", "keys\n");
        sandbox.write_home(".config/nvim/lua/opts.lua", "opts\n");
        sandbox.write_home(".bashrc", "rc\n");
        let service = service(
            &sandbox,
            GitPolicy::Disable,
            vec![WatchedEntry::new(".config/nvim"), WatchedEntry::new(".bashrc")],
        );
        service.copy().unwrap();
        fs::remove_dir_all(sandbox.home_path(".config")).unwrap();
        fs::remove_file(sandbox.home_path(".bashrc")).unwrap();
        (sandbox, service)
    }

    /// M3.1: one requested file comes back, its siblings do not
    #[test]
    fn m3_1_single_file_scope() {
        let (sandbox, service) = backed_up();

        service
            .restore_selective(&[".config/nvim/lua/keys.lua".to_string()])
            .unwrap();

        sandbox.assert_home_contains(".config/nvim/lua/keys.lua", "keys\n");
        sandbox.assert_home_missing(".config/nvim/lua/opts.lua");
        sandbox.assert_home_missing(".config/nvim/init.lua");
        sandbox.assert_home_missing(".bashrc");
    }

    /// M3.2: picker selections collapse and restore exactly what was picked
    #[test]
    fn m3_2_selection_tree_drives_restore() {
        let (sandbox, service) = backed_up();
        let mut tree = SelectionTree::from_vault_entries(&service.list_vault_entries().unwrap());

        let keys = tree.find(".config/nvim/lua/keys.lua").unwrap();
        let opts = tree.find(".config/nvim/lua/opts.lua").unwrap();
        tree.toggle(keys);
        tree.toggle(opts);
        let paths = tree.selected_paths();
        assert_eq!(paths, vec![".config/nvim/lua".to_string()]);

        let result = service.restore_selective(&paths).unwrap();

        assert_eq!(result.restored, vec![".config/nvim/lua".to_string()]);
        assert_eq!(result.skipped, vec![".bashrc".to_string()]);
        sandbox.assert_home_exists(".config/nvim/lua/keys.lua");
        sandbox.assert_home_exists(".config/nvim/lua/opts.lua");
        sandbox.assert_home_missing(".config/nvim/init.lua");
    }
}

// =============================================================================
// Mission 4: Bootstrap From Vault
// =============================================================================

mod m4_bootstrap {
    use super::*;
    use pretty_assertions::assert_eq;

    /// M4.1: an empty configuration adopts the manifest, policies intact
    #[test]
    fn m4_1_manifest_rebuilds_watch_list() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".config/nvim/init.lua", "x\n");
        sandbox.write_home(".bashrc", "y\n");
        service(
            &sandbox,
            GitPolicy::Remove,
            vec![
                WatchedEntry::new(".config/nvim").with_policy(GitPolicy::Disable),
                WatchedEntry::new(".bashrc"),
            ],
        )
        .copy()
        .unwrap();

        let mut fresh = service(&sandbox, GitPolicy::Disable, vec![]);
        assert!(fresh.reconstruct_watching().unwrap());

        assert_eq!(
            fresh.config().watching,
            vec![
                WatchedEntry::new(".config/nvim").with_policy(GitPolicy::Disable),
                WatchedEntry::new(".bashrc").with_policy(GitPolicy::Remove),
            ]
        );
    }

    /// M4.2: a corrupt manifest is reported at reconstruction time only
    #[test]
    fn m4_2_corrupt_manifest_fails_reconstruction_only() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".bashrc", "y\n");
        let configured = service(&sandbox, GitPolicy::Disable, vec![WatchedEntry::new(".bashrc")]);
        configured.copy().unwrap();
        sandbox.write_vault("manifest.yml", "entries: [\n");

        configured.restore().unwrap();

        let mut fresh = service(&sandbox, GitPolicy::Disable, vec![]);
        assert!(matches!(
            fresh.reconstruct_watching(),
            Err(snapfig_core::Error::ManifestParse { .. })
        ));
    }
}

// =============================================================================
// Robustness
// =============================================================================

mod robustness {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Deep trees with many files survive a full cycle
    #[test]
    fn deep_tree_round_trip() {
        let sandbox = Sandbox::new();
        for depth in 0..8 {
            let dir = (0..=depth).map(|d| format!("d{d}")).collect::<Vec<_>>().join("/");
            for i in 0..5 {
                sandbox.write_home(&format!(".deep/{dir}/f{i}.txt"), &format!("{depth}-{i}\n"));
            }
        }
        let service = service(&sandbox, GitPolicy::Disable, vec![WatchedEntry::new(".deep")]);

        let copied = service.copy().unwrap();
        assert_eq!(copied.files_updated, 40);

        fs::remove_dir_all(sandbox.home_path(".deep")).unwrap();
        let restored = service.restore().unwrap();

        assert_eq!(restored.files_updated, 40);
        sandbox.assert_home_contains(".deep/d0/d1/d2/d3/d4/d5/d6/d7/f4.txt", "7-4\n");
    }

    /// Names that only look special are copied like any other file
    #[test]
    fn lookalike_names_are_plain_files() {
        let sandbox = Sandbox::new();
        sandbox.write_home(".config/app/.gitignore", "target\n");
        sandbox.write_home(".config/app/.git_disabled_notes", "n\n");
        sandbox.write_home(".config/app/sub/.git", "gitdir: ../elsewhere\n");
        let service = service(
            &sandbox,
            GitPolicy::Remove,
            vec![WatchedEntry::new(".config/app")],
        );

        service.copy().unwrap();

        sandbox.assert_vault_exists(".config/app/.gitignore");
        sandbox.assert_vault_exists(".config/app/.git_disabled_notes");
        sandbox.assert_vault_contains(".config/app/sub/.git", "gitdir: ../elsewhere\n");
    }
}
