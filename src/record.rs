//! Resolved-workspace records.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::identity::RepositoryIdentity;
use crate::manifest::RepositoryConfig;

/// Version pin of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitish {
    Branch(String),
    Commit(String),
    /// Follows the bare store's default branch.
    #[default]
    Unset,
}

impl fmt::Display for Commitish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commitish::Branch(name) => write!(f, "branch {}", name),
            Commitish::Commit(sha) => write!(f, "commit {}", sha),
            Commitish::Unset => f.write_str("default branch"),
        }
    }
}

/// Everything known about one repository of the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub identity: RepositoryIdentity,
    #[serde(default)]
    pub commitish: Commitish,
    /// The repository's own manifest with `overlay` merged on top.
    #[serde(default)]
    pub config: RepositoryConfig,
    /// Overlay supplied by the dependent that introduced this repository.
    #[serde(default, skip_serializing_if = "RepositoryConfig::is_empty")]
    pub overlay: RepositoryConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bare_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_parent: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<PathBuf>,
    #[serde(default)]
    pub resolved: bool,
}

impl RepositoryRecord {
    /// A freshly discovered, unresolved record.
    pub fn new(identity: RepositoryIdentity, commitish: Commitish, overlay: RepositoryConfig) -> Self {
        Self {
            identity,
            commitish,
            config: RepositoryConfig::default(),
            overlay,
            bare_path: None,
            worktree_parent: None,
            worktree_path: None,
            resolved: false,
        }
    }
}

/// What the caller asked to resolve: the root repository, its version and
/// an optional overlay onto its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRequest {
    pub url: RepositoryIdentity,
    #[serde(default)]
    pub commitish: Commitish,
    #[serde(default, skip_serializing_if = "RepositoryConfig::is_empty")]
    pub configs: RepositoryConfig,
}

impl RootRequest {
    pub fn new(url: RepositoryIdentity, commitish: Commitish) -> Self {
        Self {
            url,
            commitish,
            configs: RepositoryConfig::default(),
        }
    }

    /// The unresolved record the resolution starts from.
    pub fn to_record(&self) -> RepositoryRecord {
        RepositoryRecord::new(self.url.clone(), self.commitish.clone(), self.configs.clone())
    }
}

/// A dependency discovered while resolving a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDescriptor {
    pub identity: RepositoryIdentity,
    pub commitish: Commitish,
    pub overlay: RepositoryConfig,
    /// The repository whose manifest declared this dependency.
    pub declared_by: RepositoryIdentity,
}

impl DependencyDescriptor {
    pub fn into_record(self) -> RepositoryRecord {
        RepositoryRecord::new(self.identity, self.commitish, self.overlay)
    }
}
