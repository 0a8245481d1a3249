//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a workspace fixture and helpers to build local git
//! remotes, so tests can resolve real repositories without network access.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new();
//!     let remote = fixture.remote("app", Some("local path: apps\n"));
//!     fixture.command().arg("resolve").arg(&remote).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// Dependency entry on `url` placed under `deps/`.
    pub fn dependency(url: &str) -> String {
        format!("  {}:\n    configs:\n      local path: deps\n", url)
    }

    /// Manifest declaring `urls` as dependencies.
    pub fn with_dependencies(urls: &[&str]) -> String {
        let mut yaml = String::from("dependencies:\n");
        for url in urls {
            yaml.push_str(&dependency(url));
        }
        yaml
    }

    /// Manifest with a `setup` block that writes a marker file.
    pub const WITH_SETUP: &str = r#"
setup:
  mark:
    commands: ["touch setup-ran"]
"#;
}

/// A temporary directory holding a workspace, a bare root and local remotes.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Root of the temporary directory, with symlinks resolved.
    pub fn path(&self) -> PathBuf {
        self.temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory")
    }

    /// The workspace directory.
    pub fn workspace(&self) -> PathBuf {
        self.path().join("ws")
    }

    /// The bare store root.
    pub fn bare_root(&self) -> PathBuf {
        self.path().join("bare")
    }

    /// Creates a git repository `remotes/<name>` on branch `main` with one
    /// commit holding `manifest` (if any) and returns its path as a URL.
    #[allow(dead_code)]
    pub fn remote(&self, name: &str, manifest: Option<&str>) -> String {
        let dir = self.path().join("remotes").join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create remote directory");
        git(&dir, &["init", "-q", "-b", "main"]);
        self.temp_dir
            .child(format!("remotes/{}/README.md", name))
            .write_str(&format!("# {}\n", name))
            .expect("Failed to write README");
        if let Some(manifest) = manifest {
            self.temp_dir
                .child(format!("remotes/{}/configs/config.yaml", name))
                .write_str(manifest)
                .expect("Failed to write manifest");
        }
        commit_all(&dir, "initial");
        dir.display().to_string()
    }

    /// URL a remote named `name` will have once created.
    #[allow(dead_code)]
    pub fn remote_url(&self, name: &str) -> String {
        self.path().join("remotes").join(name).display().to_string()
    }

    /// Get access to the underlying TempDir for advanced usage.
    #[allow(dead_code)]
    pub fn temp_dir(&self) -> &assert_fs::TempDir {
        &self.temp_dir
    }

    /// Create a command for the canopy binary pointed at this fixture's
    /// workspace and bare root.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("canopy");
        cmd.current_dir(self.path())
            .env("CANOPY_WORKSPACE", self.workspace())
            .env("CANOPY_BARE_ROOT", self.bare_root())
            .env_remove("CANOPY_CACHE_FILE");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs git in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Canopy Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Stages everything in `dir` and commits it.
pub fn commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_manifests_are_valid_yaml() {
        let with_deps = manifests::with_dependencies(&["/srv/a", "/srv/b"]);
        for manifest in [with_deps.as_str(), manifests::WITH_SETUP] {
            serde_yaml::from_str::<serde_yaml::Value>(manifest)
                .expect("Manifest should be valid YAML");
        }
    }
}
