//! Creating, moving and removing worktrees at canonical paths.
//!
//! A repository's worktree lives at `<parent>/<repository name>`. [`WorktreePlacer::add`]
//! is idempotent: asking for a worktree that already exists returns it, so a
//! resolution pass can call it unconditionally.
//!
//! Nothing here deletes a checkout of the requested repository. One found at
//! another version (a switched branch, commits on a detached pin) is kept
//! as it is and reported.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use super::locator::WorktreeLocator;
use super::{local_branch_name, timestamp_token};
use crate::error::{Error, Result};
use crate::identity::RepositoryIdentity;
use crate::record::Commitish;
use crate::repository::RepositoryBackend;

/// Prefix of the scratch directories used by [`WorktreePlacer::move_worktree`].
pub const MOVE_DIR_PREFIX: &str = ".canopy-move-";

pub struct WorktreePlacer {
    backend: Arc<dyn RepositoryBackend>,
    locator: WorktreeLocator,
    workspace_root: PathBuf,
}

impl WorktreePlacer {
    pub fn new(backend: Arc<dyn RepositoryBackend>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            locator: WorktreeLocator::new(backend.clone()),
            backend,
            workspace_root: workspace_root.into(),
        }
    }

    pub fn locator(&self) -> &WorktreeLocator {
        &self.locator
    }

    /// Ensures a worktree of `identity` at `commitish` exists directly under
    /// `target_parent` and returns its path.
    pub fn add(
        &self,
        bare: &Path,
        identity: &RepositoryIdentity,
        commitish: &Commitish,
        target_parent: &Path,
    ) -> Result<PathBuf> {
        if let Some(existing) = self.locator.find(target_parent, identity, commitish, 1) {
            debug!("reusing worktree {} for {}", existing.display(), identity);
            return Ok(existing);
        }

        let target = target_parent.join(identity.name());
        if self.holds(&target, identity, commitish) {
            return Ok(target);
        }
        if target.exists() {
            self.clear_target(identity, &target)?;
        }

        fs::create_dir_all(target_parent)?;
        self.backend.prune_worktrees(bare)?;

        match commitish {
            Commitish::Commit(sha) => {
                info!("placing {} at commit {} in {}", identity, sha, target.display());
                self.backend.add_detached_worktree(bare, &target, sha)?;
            }
            Commitish::Branch(upstream) => self.add_branch(bare, identity, &target, upstream)?,
            Commitish::Unset => {
                let upstream = self.backend.default_branch(bare)?;
                self.add_branch(bare, identity, &target, &upstream)?;
            }
        }

        let located = self.locator.find(target_parent, identity, commitish, 1);
        if located.as_deref() != Some(target.as_path()) {
            return Err(Error::PlacementInconsistency {
                expected: target,
                actual: located,
            });
        }
        Ok(target)
    }

    /// Whether `path` is a worktree of `identity`. A checkout at another
    /// version than `commitish` counts too, with a warning.
    pub fn holds(&self, path: &Path, identity: &RepositoryIdentity, commitish: &Commitish) -> bool {
        if self.locator.find(path, identity, commitish, 0).is_some() {
            return true;
        }
        if self.locator.find(path, identity, &Commitish::Unset, 0).is_none() {
            return false;
        }
        warn!(
            "{} holds {} at another version than {}; keeping it as it is",
            path.display(),
            identity,
            commitish
        );
        true
    }

    fn add_branch(
        &self,
        bare: &Path,
        identity: &RepositoryIdentity,
        target: &Path,
        upstream: &str,
    ) -> Result<()> {
        let local = local_branch_name(upstream);
        info!(
            "placing {} on {} (tracking {}) in {}",
            identity,
            local,
            upstream,
            target.display()
        );
        self.backend
            .add_branch_worktree(bare, target, &local, upstream)
    }

    /// Makes room at `target`, which is not a worktree of `identity`. Only an
    /// empty directory is removed; anything else is a conflict.
    fn clear_target(&self, identity: &RepositoryIdentity, target: &Path) -> Result<()> {
        let actual = if self.backend.is_worktree(target) {
            self.backend
                .remote_url(target)?
                .unwrap_or_else(|| "a worktree without remote".to_string())
        } else if fs::read_dir(target)?.next().is_none() {
            fs::remove_dir(target)?;
            return Ok(());
        } else {
            "a directory that is not a worktree".to_string()
        };
        Err(Error::WorktreeConflict {
            path: target.to_path_buf(),
            expected: identity.to_string(),
            actual,
        })
    }

    /// Moves the worktree at `from` to `to` through a scratch directory under
    /// the workspace root, so `to` may lie inside `from` or the other way round.
    pub fn move_worktree(&self, bare: &Path, from: &Path, to: &Path) -> Result<()> {
        if to.exists() {
            return Err(Error::WorktreeConflict {
                path: to.to_path_buf(),
                expected: from.display().to_string(),
                actual: "an existing path".to_string(),
            });
        }

        info!("moving worktree {} to {}", from.display(), to.display());
        let scratch = self
            .workspace_root
            .join(format!("{}{}", MOVE_DIR_PREFIX, timestamp_token()));
        fs::create_dir_all(&scratch)?;

        let result = self.move_via(bare, from, to, &scratch);
        if let Err(e) = fs::remove_dir_all(&scratch) {
            warn!("could not remove {}: {}", scratch.display(), e);
        }
        result
    }

    fn move_via(&self, bare: &Path, from: &Path, to: &Path, scratch: &Path) -> Result<()> {
        let parked = scratch.join("worktree");
        self.backend.move_worktree(bare, from, &parked)?;
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        self.backend.move_worktree(bare, &parked, to)
    }

    /// Force-deregisters the worktree at `path`.
    pub fn remove(&self, bare: &Path, path: &Path) -> Result<()> {
        info!("removing worktree {}", path.display());
        self.backend.remove_worktree(bare, path)
    }
}
