//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `canopy`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! The `execute` function is the main entry point for the command and is
//! responsible for calling into the `canopy` library to perform the core logic.

pub mod list;
pub mod resolve;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use canopy::cache::WorkspaceCache;
use canopy::defaults;

/// Workspace location flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct WorkspaceArgs {
    /// Root directory of the workspace (defaults to the current directory).
    #[arg(short, long, value_name = "DIR", env = "CANOPY_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Workspace cache file (defaults to `<workspace>/.canopy/workspace.json`).
    #[arg(long, value_name = "FILE", env = "CANOPY_CACHE_FILE")]
    pub cache_file: Option<PathBuf>,
}

impl WorkspaceArgs {
    /// The absolute workspace root, created if missing.
    pub fn workspace_root(&self) -> Result<PathBuf> {
        let root = match &self.workspace {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create workspace {}", root.display()))?;
        root.canonicalize()
            .with_context(|| format!("Failed to resolve workspace {}", root.display()))
    }

    pub fn cache_file(&self, workspace_root: &std::path::Path) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| defaults::default_cache_file(workspace_root))
    }

    /// Loads the workspace cache the previous `resolve` wrote.
    pub fn load_cache(&self) -> Result<(PathBuf, WorkspaceCache)> {
        let root = self.workspace_root()?;
        let cache = WorkspaceCache::load(&self.cache_file(&root));
        Ok((root, cache))
    }
}
