//! # Error Handling
//!
//! This module defines the centralized error type for `canopy`. It uses the
//! `thiserror` library to describe every failure the resolution engine can
//! run into, with enough context (paths, URLs, commands) to act on the
//! message without a debugger.
//!
//! Only [`Error::ManifestLoad`] is absorbed locally (by
//! [`crate::manifest::load`]); every other variant aborts the resolution call
//! that produced it.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for canopy operations
#[derive(Error, Debug)]
pub enum Error {
    /// A manifest file exists but could not be read or parsed.
    #[error("Manifest load error for {}: {message}", path.display())]
    ManifestLoad { path: PathBuf, message: String },

    /// The canonical worktree location already holds a worktree of another
    /// repository, or a move target is already occupied.
    #[error(
        "Worktree conflict at {}: expected {expected}, found {actual}",
        path.display()
    )]
    WorktreeConflict {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Re-locating a freshly created worktree did not land on the path it was
    /// created at.
    #[error(
        "Placement inconsistency: expected worktree at {}, located {}",
        expected.display(),
        actual.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "nothing".to_string())
    )]
    PlacementInconsistency {
        expected: PathBuf,
        actual: Option<PathBuf>,
    },

    /// Cloning the bare store failed and the target directory does not exist.
    #[error("Bare clone error for {url}: {message}")]
    BareClone { url: String, message: String },

    /// A flaky command kept producing empty output.
    #[error("Command `{command}` produced no output after {attempts} attempts: {message}")]
    TransientCommand {
        command: String,
        attempts: usize,
        message: String,
    },

    /// A git command exited unsuccessfully.
    #[error("Git command failed in {}: {command} - {stderr}", dir.display())]
    GitCommand {
        command: String,
        dir: PathBuf,
        stderr: String,
    },

    /// A repository URL could not be canonicalized.
    #[error("Invalid repository URL `{url}`: {message}")]
    InvalidUrl { url: String, message: String },

    /// The workspace cache could not be written.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// A lifecycle block command exited unsuccessfully.
    #[error("Lifecycle command `{command}` in block `{block}` failed with exit code {exit_code}: {output}")]
    LifecycleCommand {
        block: String,
        command: String,
        exit_code: i32,
        output: String,
    },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// A worker pool could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
