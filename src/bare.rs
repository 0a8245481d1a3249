//! Local bare clones of remotes.
//!
//! Each remote gets exactly one bare store at `<root>/<host>/<path>.git`;
//! all worktrees of that repository hang off it.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::identity::RepositoryIdentity;
use crate::repository::RepositoryBackend;

pub struct BareRepositoryStore {
    root: PathBuf,
    backend: Arc<dyn RepositoryBackend>,
}

impl BareRepositoryStore {
    /// A store rooted at `root`; a relative root is anchored at the current
    /// directory now, so later clones do not depend on where they run.
    pub fn new(root: impl Into<PathBuf>, backend: Arc<dyn RepositoryBackend>) -> Self {
        let root = root.into();
        Self {
            root: std::path::absolute(&root).unwrap_or(root),
            backend,
        }
    }

    /// Deterministic bare store location for `identity`.
    pub fn path_for(&self, identity: &RepositoryIdentity) -> PathBuf {
        let mut path = self.root.join(identity.relative_path());
        path.set_file_name(format!("{}.git", identity.name()));
        path
    }

    /// Returns the bare store of `identity`, cloning it first if needed.
    ///
    /// Losing a clone race ("already exists") is fine; ending up without the
    /// directory is not.
    pub fn get_or_create(&self, identity: &RepositoryIdentity) -> Result<PathBuf> {
        let path = self.path_for(identity);
        if path.is_dir() {
            debug!("bare store for {} present at {}", identity, path.display());
            return Ok(path);
        }

        info!("cloning {} into {}", identity, path.display());
        match self.backend.clone_bare(identity.clone_url(), &path) {
            Ok(()) => {}
            Err(Error::BareClone { message, .. }) if message.contains("already exists") => {
                debug!("bare store for {} appeared concurrently", identity);
            }
            Err(e) => return Err(e),
        }

        if !path.is_dir() {
            return Err(Error::BareClone {
                url: identity.to_string(),
                message: format!("{} does not exist after cloning", path.display()),
            });
        }
        Ok(path)
    }
}
