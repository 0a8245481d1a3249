//! Working copies of bare stores.
//!
//! [`locator`] finds an existing worktree for a repository and version,
//! [`placer`] creates, moves and removes them at canonical paths.
//!
//! Branch worktrees never check out the upstream branch itself: each gets a
//! unique local branch `<upstream>__canopy__<timestamp>`, so any number of
//! worktrees can follow one upstream. The part before the separator is the
//! branch's logical name.

pub mod locator;
pub mod placer;

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

pub use locator::WorktreeLocator;
pub use placer::WorktreePlacer;

/// Separates the upstream name from the uniqueness suffix in local branch names.
pub const BRANCH_SEPARATOR: &str = "__canopy__";

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(i64::MIN);

/// A UTC timestamp strictly greater than every one previously returned in
/// this process.
pub(crate) fn unique_timestamp() -> DateTime<Utc> {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX - 1);
    let next = |last: i64| now.max(last.saturating_add(1));
    let previous = match LAST_TIMESTAMP.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(next(last))
    }) {
        Ok(previous) | Err(previous) => previous,
    };
    DateTime::from_timestamp_nanos(next(previous))
}

/// Timestamp rendered with every non-alphanumeric character replaced by `_`.
pub(crate) fn timestamp_token() -> String {
    unique_timestamp()
        .format("%Y-%m-%dT%H:%M:%S%.9fZ")
        .to_string()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// A fresh local branch name for a worktree following `upstream`.
pub fn local_branch_name(upstream: &str) -> String {
    format!("{}{}{}", upstream, BRANCH_SEPARATOR, timestamp_token())
}

/// The upstream a local branch follows: the name with its uniqueness suffix stripped.
pub fn logical_branch_name(local: &str) -> &str {
    local
        .split_once(BRANCH_SEPARATOR)
        .map(|(logical, _)| logical)
        .unwrap_or(local)
}
