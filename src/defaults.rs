//! Default values for canopy configuration.
//!
//! This module provides centralized default values used by the resolver
//! options and the command-line flags, ensuring consistency between them.

use std::path::{Path, PathBuf};

/// Directory under the workspace root holding canopy's own state.
pub const STATE_DIR: &str = ".canopy";

/// File name of the workspace cache inside [`STATE_DIR`].
pub const CACHE_FILE_NAME: &str = "workspace.json";

/// Returns the default root of the bare repository stores.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/canopy/bare` (XDG Base Directory)
/// - macOS: `~/Library/Caches/canopy/bare`
/// - Windows: `{FOLDERID_LocalAppData}\canopy\bare`
///
/// Falls back to `.canopy-cache/canopy/bare` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--bare-root` CLI flag or the
/// `CANOPY_BARE_ROOT` environment variable.
pub fn default_bare_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".canopy-cache"))
        .join("canopy")
        .join("bare")
}

/// Returns the default workspace cache file for `workspace_root`:
/// `<workspace_root>/.canopy/workspace.json`.
pub fn default_cache_file(workspace_root: &Path) -> PathBuf {
    workspace_root.join(STATE_DIR).join(CACHE_FILE_NAME)
}

/// Number of resolver workers: the available parallelism, at least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
