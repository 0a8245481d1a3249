//! # Repository Backend
//!
//! The resolution engine never talks to git directly. Everything it needs
//! from a version-control tool is expressed by the [`RepositoryBackend`]
//! trait: read a working copy's remote, commit and branch, and create, move
//! or remove worktrees of a bare store.
//!
//! [`GitBackend`] is the production implementation, delegating to the
//! wrappers in [`crate::git`]. Tests substitute a backend that simulates
//! worktrees on disk, so the resolver logic can be exercised without git.

use std::path::Path;
use std::sync::Arc;

use crate::command::{CommandRunner, SystemRunner};
use crate::error::Result;

/// Capabilities the resolver needs from a version-control tool.
pub trait RepositoryBackend: Send + Sync {
    /// Whether `dir` is the root of a working copy.
    fn is_worktree(&self, dir: &Path) -> bool {
        dir.join(".git").exists()
    }

    /// Remote URL of the working copy at `worktree`, if it has one.
    fn remote_url(&self, worktree: &Path) -> Result<Option<String>>;

    /// Checked-out commit hash.
    fn current_commit(&self, worktree: &Path) -> Result<String>;

    /// Checked-out local branch, `None` when detached.
    fn current_branch(&self, worktree: &Path) -> Result<Option<String>>;

    /// Default branch of a bare store.
    fn default_branch(&self, bare: &Path) -> Result<String>;

    /// Clones `url` as a bare store at `bare`.
    fn clone_bare(&self, url: &str, bare: &Path) -> Result<()>;

    /// Forgets worktrees whose directories no longer exist.
    fn prune_worktrees(&self, bare: &Path) -> Result<()>;

    /// Creates a detached worktree on `commit`.
    fn add_detached_worktree(&self, bare: &Path, path: &Path, commit: &str) -> Result<()>;

    /// Creates a worktree on a new `local_branch` tracking `upstream`.
    fn add_branch_worktree(
        &self,
        bare: &Path,
        path: &Path,
        local_branch: &str,
        upstream: &str,
    ) -> Result<()>;

    /// Moves a worktree; the parent of `to` must exist.
    fn move_worktree(&self, bare: &Path, from: &Path, to: &Path) -> Result<()>;

    /// Force-deregisters a worktree.
    fn remove_worktree(&self, bare: &Path, path: &Path) -> Result<()>;
}

/// [`RepositoryBackend`] backed by the system `git` command.
#[derive(Clone)]
pub struct GitBackend {
    runner: Arc<dyn CommandRunner>,
}

impl GitBackend {
    /// A backend running real processes.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    /// A backend running commands through `runner`.
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Default for GitBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryBackend for GitBackend {
    fn remote_url(&self, worktree: &Path) -> Result<Option<String>> {
        crate::git::remote_url(self.runner.as_ref(), worktree)
    }

    fn current_commit(&self, worktree: &Path) -> Result<String> {
        crate::git::current_commit(self.runner.as_ref(), worktree)
    }

    fn current_branch(&self, worktree: &Path) -> Result<Option<String>> {
        crate::git::current_branch(self.runner.as_ref(), worktree)
    }

    fn default_branch(&self, bare: &Path) -> Result<String> {
        crate::git::default_branch(self.runner.as_ref(), bare)
    }

    fn clone_bare(&self, url: &str, bare: &Path) -> Result<()> {
        crate::git::clone_bare(self.runner.as_ref(), url, bare)
    }

    fn prune_worktrees(&self, bare: &Path) -> Result<()> {
        crate::git::prune_worktrees(self.runner.as_ref(), bare)
    }

    fn add_detached_worktree(&self, bare: &Path, path: &Path, commit: &str) -> Result<()> {
        crate::git::add_detached_worktree(self.runner.as_ref(), bare, path, commit)
    }

    fn add_branch_worktree(
        &self,
        bare: &Path,
        path: &Path,
        local_branch: &str,
        upstream: &str,
    ) -> Result<()> {
        crate::git::add_branch_worktree(self.runner.as_ref(), bare, path, local_branch, upstream)
    }

    fn move_worktree(&self, bare: &Path, from: &Path, to: &Path) -> Result<()> {
        crate::git::move_worktree(self.runner.as_ref(), bare, from, to)
    }

    fn remove_worktree(&self, bare: &Path, path: &Path) -> Result<()> {
        crate::git::remove_worktree(self.runner.as_ref(), bare, path)
    }
}
