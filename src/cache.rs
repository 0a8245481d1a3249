//! The persisted workspace document.
//!
//! One JSON file records what was resolved last time: the root request, every
//! repository record keyed by identity, and the manifest-folder baselines of
//! the change detector. It is always rewritten wholesale, via a temporary file
//! renamed over the old one, so readers never see a partial document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::change::ChangeDetector;
use crate::error::{Error, Result};
use crate::identity::RepositoryIdentity;
use crate::record::{RepositoryRecord, RootRequest};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceCache {
    #[serde(default)]
    pub root: Option<RootRequest>,
    #[serde(default)]
    pub repositories: BTreeMap<RepositoryIdentity, RepositoryRecord>,
    #[serde(default)]
    pub config_states: ChangeDetector,
}

impl WorkspaceCache {
    /// Reads the cache at `path`. A missing or unreadable document yields an
    /// empty cache, which makes the next resolution start from scratch.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no workspace cache at {}", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("cannot read workspace cache {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(e) => {
                warn!("discarding corrupt workspace cache {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Atomically replaces the document at `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let cache_error = |message: String| Error::Cache { message };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| cache_error(format!("create {}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = Path::new(&tmp);
        fs::write(tmp, json).map_err(|e| cache_error(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(tmp, path)
            .map_err(|e| cache_error(format!("replace {}: {}", path.display(), e)))?;
        debug!("wrote workspace cache {}", path.display());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Records in identity order.
    pub fn records(&self) -> impl Iterator<Item = &RepositoryRecord> {
        self.repositories.values()
    }
}
