//! [`Sandbox`]: a temporary home directory and vault for engine tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary `home/` and `vault/` pair with setup and assertion helpers.
///
/// Paths passed to the helpers are relative to the home or vault root and
/// use forward slashes.
///
/// # Example
///
/// ```rust,no_run
/// use snapfig_test_utils::Sandbox;
///
/// let sandbox = Sandbox::new();
/// sandbox.write_home(".config/nvim/init.lua", "vim.o.number = true");
/// sandbox.assert_home_contains(".config/nvim/init.lua", "number");
/// ```
pub struct Sandbox {
    temp_dir: TempDir,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Create an empty `home/`. `vault/` is left for the engine to create.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("home")).unwrap();
        Self { temp_dir }
    }

    /// Root of the temporary directory, parent of `home/` and `vault/`.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn home(&self) -> PathBuf {
        self.root().join("home")
    }

    /// The vault directory. Not created until something is written to it.
    pub fn vault(&self) -> PathBuf {
        self.root().join("vault")
    }

    pub fn home_path(&self, rel: &str) -> PathBuf {
        self.home().join(rel)
    }

    pub fn vault_path(&self, rel: &str) -> PathBuf {
        self.vault().join(rel)
    }

    /// Write a file under home, creating parent directories.
    pub fn write_home(&self, rel: &str, content: &str) -> PathBuf {
        write_file(&self.home_path(rel), content)
    }

    /// Write a file under the vault, creating parent directories.
    pub fn write_vault(&self, rel: &str, content: &str) -> PathBuf {
        write_file(&self.vault_path(rel), content)
    }

    /// Create a symlink at `rel` under home pointing at `target`.
    #[cfg(unix)]
    pub fn symlink_home(&self, rel: &str, target: &str) -> PathBuf {
        let link = self.home_path(rel);
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        std::os::unix::fs::symlink(target, &link)
            .unwrap_or_else(|e| panic!("Could not create symlink {}: {e}", link.display()));
        link
    }

    pub fn read_home(&self, rel: &str) -> String {
        read_file(&self.home_path(rel))
    }

    pub fn read_vault(&self, rel: &str) -> String {
        read_file(&self.vault_path(rel))
    }

    /// Assert that `rel` exists under home.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_home_exists(&self, rel: &str) {
        assert_exists(&self.home_path(rel));
    }

    /// Assert that `rel` exists under the vault.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_vault_exists(&self, rel: &str) {
        assert_exists(&self.vault_path(rel));
    }

    /// Assert that `rel` does **not** exist under home.
    pub fn assert_home_missing(&self, rel: &str) {
        assert_missing(&self.home_path(rel));
    }

    /// Assert that `rel` does **not** exist under the vault.
    pub fn assert_vault_missing(&self, rel: &str) {
        assert_missing(&self.vault_path(rel));
    }

    /// Assert that the home file at `rel` contains `content`.
    pub fn assert_home_contains(&self, rel: &str, content: &str) {
        assert_contains(&self.home_path(rel), content);
    }

    /// Assert that the vault file at `rel` contains `content`.
    pub fn assert_vault_contains(&self, rel: &str, content: &str) {
        assert_contains(&self.vault_path(rel), content);
    }
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content)
        .unwrap_or_else(|e| panic!("Could not write file {}: {e}", path.display()));
    path.to_path_buf()
}

fn read_file(path: &Path) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Could not read file {}: {e}", path.display()))
}

fn assert_exists(path: &Path) {
    assert!(
        path.symlink_metadata().is_ok(),
        "Expected path to exist: {}",
        path.display()
    );
}

fn assert_missing(path: &Path) {
    assert!(
        path.symlink_metadata().is_err(),
        "Expected path NOT to exist: {}",
        path.display()
    );
}

fn assert_contains(path: &Path, content: &str) {
    let actual = read_file(path);
    assert!(
        actual.contains(content),
        "File {} does not contain expected content.\nExpected: {}\nActual: {}",
        path.display(),
        content,
        actual
    );
}
