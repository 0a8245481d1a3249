//! Searching a directory tree for an existing worktree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use walkdir::{DirEntry, WalkDir};

use super::logical_branch_name;
use crate::identity::RepositoryIdentity;
use crate::record::Commitish;
use crate::repository::RepositoryBackend;

/// Search depth meaning "no limit".
pub const UNBOUNDED: i32 = -1;

pub struct WorktreeLocator {
    backend: Arc<dyn RepositoryBackend>,
}

impl WorktreeLocator {
    pub fn new(backend: Arc<dyn RepositoryBackend>) -> Self {
        Self { backend }
    }

    /// First worktree under `search_root` (in file-name order) whose remote is
    /// `identity` and whose checkout satisfies `commitish`.
    ///
    /// Depth 0 is `search_root` itself; [`UNBOUNDED`] removes the limit.
    /// Directories that vanish or cannot be queried mid-walk are skipped.
    pub fn find(
        &self,
        search_root: &Path,
        identity: &RepositoryIdentity,
        commitish: &Commitish,
        max_depth: i32,
    ) -> Option<PathBuf> {
        let mut walker = WalkDir::new(search_root).min_depth(0).sort_by_file_name();
        if max_depth >= 0 {
            walker = walker.max_depth(max_depth as usize);
        }

        walker
            .into_iter()
            .filter_entry(|entry| !is_git_dir(entry))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .map(DirEntry::into_path)
            .find(|dir| self.is_match(dir, identity, commitish))
    }

    fn is_match(&self, dir: &Path, identity: &RepositoryIdentity, commitish: &Commitish) -> bool {
        if !self.backend.is_worktree(dir) {
            return false;
        }
        let remote = match self.backend.remote_url(dir) {
            Ok(Some(url)) => url,
            _ => return false,
        };
        if !identity.matches(&remote) {
            return false;
        }

        let matched = match commitish {
            Commitish::Unset => true,
            Commitish::Commit(pin) => self
                .backend
                .current_commit(dir)
                .map(|head| head.starts_with(pin.as_str()))
                .unwrap_or(false),
            Commitish::Branch(target) => matches!(
                self.backend.current_branch(dir),
                Ok(Some(local)) if logical_branch_name(&local) == target
            ),
        };
        debug!(
            "worktree {} of {} {} {}",
            dir.display(),
            identity,
            if matched { "matches" } else { "does not match" },
            commitish
        );
        matched
    }
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name == ".git" || name.ends_with(".git"))
            .unwrap_or(false)
}
