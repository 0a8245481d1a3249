//! Detecting edits to manifest folders between runs.
//!
//! A folder's state is the modification time of every file below it. The
//! detector keeps the last recorded state per folder; it is serialized into
//! the workspace cache so the comparison spans process runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// Modification times of a folder and every file beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFolderState {
    pub modified: SystemTime,
    pub files: BTreeMap<PathBuf, SystemTime>,
}

impl ConfigFolderState {
    /// Whether `current` differs from this baseline in file set or file times.
    /// The folder's own time is informational only.
    fn differs_from(&self, current: &ConfigFolderState) -> bool {
        self.files.len() != current.files.len()
            || self
                .files
                .iter()
                .any(|(path, time)| current.files.get(path) != Some(time))
    }
}

fn differs(baseline: &Option<ConfigFolderState>, current: &Option<ConfigFolderState>) -> bool {
    match (baseline, current) {
        (None, None) => false,
        (Some(before), Some(now)) => before.differs_from(now),
        _ => true,
    }
}

/// Current state of `folder`, `None` when it does not exist.
///
/// Files that disappear during the walk are left out.
pub fn snapshot(folder: &Path) -> Option<ConfigFolderState> {
    let modified = folder.metadata().ok().filter(|m| m.is_dir())?.modified().ok()?;
    let files = WalkDir::new(folder)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let time = entry.metadata().ok()?.modified().ok()?;
            Some((entry.into_path(), time))
        })
        .collect();
    Some(ConfigFolderState { modified, files })
}

/// Baselines per folder; `None` records that the folder was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeDetector {
    states: BTreeMap<PathBuf, Option<ConfigFolderState>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `folder` changed since its baseline was recorded. A folder
    /// without a baseline counts as changed.
    pub fn changed(&self, folder: &Path) -> bool {
        let Some(baseline) = self.states.get(folder) else {
            debug!("no baseline for {}", folder.display());
            return true;
        };
        let changed = differs(baseline, &snapshot(folder));
        if changed {
            debug!("{} changed since last run", folder.display());
        }
        changed
    }

    /// Records the current state of `folder` as its baseline. Returns whether
    /// the baseline changed in a way [`ChangeDetector::changed`] would report.
    pub fn update_state(&mut self, folder: &Path) -> bool {
        let current = snapshot(folder);
        let previous = self.states.insert(folder.to_path_buf(), current.clone());
        previous.map_or(true, |before| differs(&before, &current))
    }

    /// Drops baselines of folders not in `keep`. Returns whether any were dropped.
    pub fn retain(&mut self, keep: &[PathBuf]) -> bool {
        let before = self.states.len();
        self.states.retain(|folder, _| keep.contains(folder));
        before != self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
