//! In-process stand-in for git used by unit tests.
//!
//! Worktrees are plain directories whose `.git` file holds a small JSON
//! marker (remote URL, commit, branch). Bare stores are directories holding
//! an `origin` file with the remote URL. Remotes are registered up front with
//! their branches and the manifest every checkout receives.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::RepositoryIdentity;
use crate::manifest::{MANIFEST_DIR, MANIFEST_FILE};
use crate::repository::RepositoryBackend;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Marker {
    url: String,
    commit: String,
    branch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MockRemote {
    pub default_branch: String,
    /// Branch name to commit hash.
    pub branches: BTreeMap<String, String>,
    pub manifest: Option<String>,
}

impl MockRemote {
    pub fn new(manifest: Option<&str>) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert("main".to_string(), "1111111111".to_string());
        branches.insert("develop".to_string(), "2222222222".to_string());
        Self {
            default_branch: "main".to_string(),
            branches,
            manifest: manifest.map(str::to_string),
        }
    }
}

#[derive(Default)]
pub struct MockBackend {
    remotes: Mutex<BTreeMap<RepositoryIdentity, MockRemote>>,
    pub clones: Mutex<Vec<PathBuf>>,
    pub adds: Mutex<Vec<PathBuf>>,
    pub local_branches: Mutex<Vec<String>>,
    pub moves: Mutex<Vec<(PathBuf, PathBuf)>>,
    pub removes: Mutex<Vec<PathBuf>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a remote whose checkouts receive `manifest`.
    pub fn with_remote(self, url: &str, manifest: Option<&str>) -> Self {
        self.set_remote(url, MockRemote::new(manifest));
        self
    }

    pub fn set_remote(&self, url: &str, remote: MockRemote) {
        let identity = RepositoryIdentity::parse(url).unwrap();
        self.remotes.lock().unwrap().insert(identity, remote);
    }

    pub fn clone_count(&self) -> usize {
        self.clones.lock().unwrap().len()
    }

    pub fn add_count(&self) -> usize {
        self.adds.lock().unwrap().len()
    }

    /// Plants a worktree directly on disk, bypassing the backend.
    pub fn plant_worktree(path: &Path, url: &str, commit: &str, branch: Option<&str>) {
        fs::create_dir_all(path).unwrap();
        let marker = Marker {
            url: url.to_string(),
            commit: commit.to_string(),
            branch: branch.map(str::to_string),
        };
        fs::write(path.join(".git"), serde_json::to_string(&marker).unwrap()).unwrap();
    }

    fn marker(path: &Path) -> Result<Marker> {
        let content = fs::read_to_string(path.join(".git"))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn bare_url(bare: &Path) -> Result<String> {
        Ok(fs::read_to_string(bare.join("origin"))?)
    }

    fn remote_for(&self, bare: &Path) -> Result<(String, MockRemote)> {
        let url = Self::bare_url(bare)?;
        let identity = RepositoryIdentity::parse(&url)?;
        let remote = self
            .remotes
            .lock()
            .unwrap()
            .get(&identity)
            .cloned()
            .ok_or_else(|| Error::BareClone {
                url: url.clone(),
                message: "repository not found".to_string(),
            })?;
        Ok((url, remote))
    }

    fn check_out(&self, path: &Path, url: &str, remote: &MockRemote, commit: &str, branch: Option<&str>) -> Result<()> {
        if path.exists() {
            return Err(Error::GitCommand {
                command: "worktree add".to_string(),
                dir: path.to_path_buf(),
                stderr: format!("'{}' already exists", path.display()),
            });
        }
        Self::plant_worktree(path, url, commit, branch);
        if let Some(manifest) = &remote.manifest {
            fs::create_dir_all(path.join(MANIFEST_DIR))?;
            fs::write(path.join(MANIFEST_DIR).join(MANIFEST_FILE), manifest)?;
        }
        self.adds.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

impl RepositoryBackend for MockBackend {
    fn remote_url(&self, worktree: &Path) -> Result<Option<String>> {
        Ok(Self::marker(worktree).ok().map(|m| m.url))
    }

    fn current_commit(&self, worktree: &Path) -> Result<String> {
        Ok(Self::marker(worktree)?.commit)
    }

    fn current_branch(&self, worktree: &Path) -> Result<Option<String>> {
        Ok(Self::marker(worktree)?.branch)
    }

    fn default_branch(&self, bare: &Path) -> Result<String> {
        Ok(self.remote_for(bare)?.1.default_branch)
    }

    fn clone_bare(&self, url: &str, bare: &Path) -> Result<()> {
        let identity = RepositoryIdentity::parse(url)?;
        if !self.remotes.lock().unwrap().contains_key(&identity) {
            return Err(Error::BareClone {
                url: url.to_string(),
                message: "repository not found".to_string(),
            });
        }
        if bare.exists() {
            return Err(Error::BareClone {
                url: url.to_string(),
                message: format!("destination path '{}' already exists", bare.display()),
            });
        }
        fs::create_dir_all(bare)?;
        fs::write(bare.join("origin"), url)?;
        self.clones.lock().unwrap().push(bare.to_path_buf());
        Ok(())
    }

    fn prune_worktrees(&self, _bare: &Path) -> Result<()> {
        Ok(())
    }

    fn add_detached_worktree(&self, bare: &Path, path: &Path, commit: &str) -> Result<()> {
        let (url, remote) = self.remote_for(bare)?;
        self.check_out(path, &url, &remote, commit, None)
    }

    fn add_branch_worktree(
        &self,
        bare: &Path,
        path: &Path,
        local_branch: &str,
        upstream: &str,
    ) -> Result<()> {
        let (url, remote) = self.remote_for(bare)?;
        let commit = remote.branches.get(upstream).cloned().ok_or_else(|| Error::GitCommand {
            command: "worktree add".to_string(),
            dir: bare.to_path_buf(),
            stderr: format!("invalid reference: {}", upstream),
        })?;
        self.check_out(path, &url, &remote, &commit, Some(local_branch))?;
        self.local_branches
            .lock()
            .unwrap()
            .push(local_branch.to_string());
        Ok(())
    }

    fn move_worktree(&self, _bare: &Path, from: &Path, to: &Path) -> Result<()> {
        if to.exists() {
            return Err(Error::GitCommand {
                command: "worktree move".to_string(),
                dir: to.to_path_buf(),
                stderr: "destination exists".to_string(),
            });
        }
        fs::rename(from, to)?;
        self.moves
            .lock()
            .unwrap()
            .push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn remove_worktree(&self, _bare: &Path, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)?;
        }
        self.removes.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
