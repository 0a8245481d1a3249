//! # Dependency Resolution
//!
//! [`DependencyResolver::resolve`] turns a root request into a workspace
//! holding one worktree per repository of the transitive dependency closure.
//!
//! ## Passes
//!
//! Resolution is a fixpoint over a map of records keyed by identity:
//!
//! 1. **Seed**: reuse the cached records (all marked unresolved) when the
//!    cache belongs to the same root request and no manifest folder changed;
//!    otherwise start from the root record alone.
//! 2. **Resolve a batch** in parallel: every unresolved record gets its bare
//!    store, a verified or freshly placed worktree and its merged manifest.
//!    Declared dependencies go to a shared buffer; workers never touch the map.
//! 3. **Merge** single-threaded: worker records replace their entries and
//!    buffered dependencies not yet in the map become new unresolved records.
//!
//! Steps 2 and 3 repeat until a pass admits no new identity. Map membership
//! is the only admission gate, so dependency cycles terminate.
//!
//! Manifest problems are absorbed (logged, empty manifest). Any placement
//! failure aborts the call once all in-flight workers of the pass have finished.
//! The cache is written only if something changed.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::bare::BareRepositoryStore;
use crate::cache::WorkspaceCache;
use crate::change::ChangeDetector;
use crate::defaults;
use crate::error::{Error, Result};
use crate::identity::RepositoryIdentity;
use crate::manifest::{self, RepositoryConfig, SubstitutionContext};
use crate::record::{DependencyDescriptor, RepositoryRecord, RootRequest};
use crate::repository::RepositoryBackend;
use crate::worktree::WorktreePlacer;

/// Where and how a resolution runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    pub workspace_root: PathBuf,
    pub bare_root: PathBuf,
    pub cache_file: PathBuf,
    pub workers: usize,
}

impl ResolverOptions {
    /// Options for `workspace_root` with every other knob at its default.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            cache_file: defaults::default_cache_file(&workspace_root),
            bare_root: defaults::default_bare_root(),
            workers: defaults::default_workers(),
            workspace_root,
        }
    }

    pub fn with_bare_root(mut self, bare_root: impl Into<PathBuf>) -> Self {
        self.bare_root = bare_root.into();
        self
    }

    pub fn with_cache_file(mut self, cache_file: impl Into<PathBuf>) -> Self {
        self.cache_file = cache_file.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Outcome of one [`DependencyResolver::resolve`] call.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub repositories: BTreeMap<RepositoryIdentity, RepositoryRecord>,
    /// Number of batches resolved.
    pub passes: usize,
    pub state_changed: bool,
    pub cache_written: bool,
    /// Manifest loads per repository during this call.
    pub loads: BTreeMap<RepositoryIdentity, usize>,
}

/// Dependencies reported by workers during one pass, one per identity.
#[derive(Default)]
struct DescriptorBuffer {
    entries: Mutex<BTreeMap<RepositoryIdentity, DependencyDescriptor>>,
}

impl DescriptorBuffer {
    /// Keeps the first descriptor per identity; of two dependents, the one
    /// with the smaller identity wins regardless of worker timing.
    fn offer(&self, descriptor: DependencyDescriptor) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Error::LockPoisoned {
            context: "dependency buffer".to_string(),
        })?;
        match entries.entry(descriptor.identity.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(descriptor);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().commitish != descriptor.commitish {
                    warn!(
                        "{} is requested at {} by {} and at {} by {}",
                        descriptor.identity,
                        slot.get().commitish,
                        slot.get().declared_by,
                        descriptor.commitish,
                        descriptor.declared_by
                    );
                }
                if descriptor.declared_by < slot.get().declared_by {
                    slot.insert(descriptor);
                }
            }
        }
        Ok(())
    }

    fn into_descriptors(self) -> Result<Vec<DependencyDescriptor>> {
        let entries = self.entries.into_inner().map_err(|_| Error::LockPoisoned {
            context: "dependency buffer".to_string(),
        })?;
        Ok(entries.into_values().collect())
    }
}

/// What a worker hands back for one record.
struct Resolved {
    record: RepositoryRecord,
    /// The cached worktree was unusable and had to be placed again.
    rebuilt: bool,
}

pub struct DependencyResolver {
    options: ResolverOptions,
    bare: BareRepositoryStore,
    placer: WorktreePlacer,
    pool: rayon::ThreadPool,
}

impl DependencyResolver {
    pub fn new(options: ResolverOptions, backend: Arc<dyn RepositoryBackend>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers.max(1))
            .thread_name(|i| format!("canopy-resolve-{}", i))
            .build()?;
        Ok(Self {
            bare: BareRepositoryStore::new(&options.bare_root, backend.clone()),
            placer: WorktreePlacer::new(backend, &options.workspace_root),
            options,
            pool,
        })
    }

    /// Resolves `request` into a complete workspace.
    pub fn resolve(&self, request: &RootRequest) -> Result<Resolution> {
        let cache = WorkspaceCache::load(&self.options.cache_file);
        let mut detector = cache.config_states.clone();

        let (mut records, mut state_changed) = if self.can_reuse(&cache, request) {
            info!("re-verifying {} cached repositories", cache.repositories.len());
            let mut records = cache.repositories.clone();
            for record in records.values_mut() {
                record.resolved = false;
            }
            (records, false)
        } else {
            info!("resolving {} from scratch", request.url);
            let mut records = BTreeMap::new();
            records.insert(request.url.clone(), request.to_record());
            (records, true)
        };

        let mut passes = 0;
        let mut loads: BTreeMap<RepositoryIdentity, usize> = BTreeMap::new();
        loop {
            let batch: Vec<RepositoryRecord> = records
                .values()
                .filter(|record| !record.resolved)
                .cloned()
                .collect();
            if batch.is_empty() {
                break;
            }
            passes += 1;
            info!("pass {}: resolving {} repositories", passes, batch.len());

            let buffer = DescriptorBuffer::default();
            let outcomes: Vec<Result<Resolved>> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|record| self.resolve_one(record, &buffer))
                    .collect()
            });

            let mut finished = Vec::with_capacity(outcomes.len());
            for outcome in outcomes {
                finished.push(outcome?);
            }

            for Resolved { record, rebuilt } in finished {
                *loads.entry(record.identity.clone()).or_default() += 1;
                state_changed |= rebuilt;
                let previous = records.insert(record.identity.clone(), record.clone());
                if previous.map(|mut p| {
                    p.resolved = true;
                    p
                }) != Some(record)
                {
                    state_changed = true;
                }
            }

            let mut admitted = 0;
            for descriptor in buffer.into_descriptors()? {
                match records.get(&descriptor.identity) {
                    Some(existing) => {
                        if existing.commitish != descriptor.commitish {
                            warn!(
                                "{} requests {} at {}; keeping {}",
                                descriptor.declared_by,
                                descriptor.identity,
                                descriptor.commitish,
                                existing.commitish
                            );
                        }
                    }
                    None => {
                        debug!(
                            "admitting {} (declared by {})",
                            descriptor.identity, descriptor.declared_by
                        );
                        records.insert(descriptor.identity.clone(), descriptor.into_record());
                        admitted += 1;
                    }
                }
            }
            if admitted > 0 {
                state_changed = true;
            }
        }

        if update_baselines(&mut detector, &records) {
            state_changed = true;
        }

        let mut cache_written = false;
        if state_changed {
            let cache = WorkspaceCache {
                root: Some(request.clone()),
                repositories: records.clone(),
                config_states: detector,
            };
            cache.save(&self.options.cache_file)?;
            cache_written = true;
            info!(
                "resolved {} repositories in {} passes",
                records.len(),
                passes
            );
        } else {
            info!("workspace unchanged ({} repositories)", records.len());
        }

        Ok(Resolution {
            repositories: records,
            passes,
            state_changed,
            cache_written,
            loads,
        })
    }

    /// A cache is reused only for the same root request with every cached
    /// manifest folder untouched.
    fn can_reuse(&self, cache: &WorkspaceCache, request: &RootRequest) -> bool {
        if cache.is_empty() {
            return false;
        }
        if cache.root.as_ref() != Some(request) {
            info!("root request changed; discarding cached workspace");
            return false;
        }
        let changed = cache
            .records()
            .filter_map(|record| record.worktree_path.as_deref())
            .map(manifest::manifest_dir)
            .find(|folder| cache.config_states.changed(folder));
        if let Some(folder) = changed {
            info!("{} changed; re-resolving the whole workspace", folder.display());
            return false;
        }
        true
    }

    fn resolve_one(&self, record: &RepositoryRecord, buffer: &DescriptorBuffer) -> Result<Resolved> {
        let identity = &record.identity;
        let workspace_root = self.options.workspace_root.as_path();
        let bare = self.bare.get_or_create(identity)?;

        let cached = record
            .worktree_path
            .as_deref()
            .filter(|path| self.placer.holds(path, identity, &record.commitish));
        let rebuilt = record.worktree_path.is_some() && cached.is_none();
        let mut path = match cached {
            Some(path) => path.to_path_buf(),
            None => {
                if rebuilt {
                    warn!("cached worktree of {} is gone or foreign; placing it again", identity);
                }
                let local_path = if record.config.local_path.is_empty() {
                    &record.overlay.local_path
                } else {
                    &record.config.local_path
                };
                let parent = confine(workspace_root, identity, local_path);
                self.placer.add(&bare, identity, &record.commitish, &parent)?
            }
        };

        let mut config = self.load_config(record, &path);
        let parent = confine(workspace_root, identity, &config.local_path);
        let expected = parent.join(identity.name());
        if path != expected {
            self.relocate(&bare, identity, record, &path, &expected)?;
            path = expected;
            // `$$REPO_PATH$$` must name the new location.
            config = self.load_config(record, &path);
        }

        for (raw_url, spec) in &config.dependencies {
            let dependency = match RepositoryIdentity::parse(raw_url) {
                Ok(dependency) => dependency,
                Err(e) => {
                    warn!("{} declares an unusable dependency: {}", identity, e);
                    continue;
                }
            };
            buffer.offer(DependencyDescriptor {
                identity: dependency,
                commitish: spec.commitish(),
                overlay: spec.configs.clone(),
                declared_by: identity.clone(),
            })?;
        }

        Ok(Resolved {
            record: RepositoryRecord {
                identity: identity.clone(),
                commitish: record.commitish.clone(),
                config,
                overlay: record.overlay.clone(),
                bare_path: Some(bare),
                worktree_parent: Some(parent),
                worktree_path: Some(path),
                resolved: true,
            },
            rebuilt,
        })
    }

    /// The repository's manifest at `path` with the record's overlay merged on top.
    fn load_config(&self, record: &RepositoryRecord, path: &Path) -> RepositoryConfig {
        let context = SubstitutionContext::for_repository(
            &record.identity,
            Some(path),
            Some(&self.options.workspace_root),
        );
        let own = manifest::load(path, &context);
        let merged = manifest::merge(&own, &record.overlay);
        manifest::substitute(&merged, &context).unwrap_or_else(|e| {
            warn!("substitution failed for {}: {}", record.identity, e);
            merged
        })
    }

    /// Brings the worktree at `current` to `expected` after its local path moved.
    fn relocate(
        &self,
        bare: &Path,
        identity: &RepositoryIdentity,
        record: &RepositoryRecord,
        current: &Path,
        expected: &Path,
    ) -> Result<()> {
        if self.placer.holds(expected, identity, &record.commitish) {
            warn!(
                "{} already has a worktree at {}; {} is no longer used and can be removed",
                identity,
                expected.display(),
                current.display()
            );
            return Ok(());
        }
        self.placer.move_worktree(bare, current, expected)
    }
}

/// Directory under `workspace_root` for a manifest's `local path`. Absolute
/// paths and `..` segments would leave the workspace, so they fall back to
/// the workspace root.
fn confine(workspace_root: &Path, identity: &RepositoryIdentity, local_path: &str) -> PathBuf {
    let relative = Path::new(local_path);
    let inside = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !inside {
        warn!(
            "{} asks for local path `{}` outside {}; placing it at the workspace root",
            identity,
            local_path,
            workspace_root.display()
        );
        return workspace_root.to_path_buf();
    }
    if local_path.is_empty() {
        workspace_root.to_path_buf()
    } else {
        workspace_root.join(relative)
    }
}

/// Records the manifest folders of every record as the new baselines.
/// Returns whether any baseline changed.
fn update_baselines(
    detector: &mut ChangeDetector,
    records: &BTreeMap<RepositoryIdentity, RepositoryRecord>,
) -> bool {
    let folders: Vec<PathBuf> = records
        .values()
        .filter_map(|record| record.worktree_path.as_deref())
        .map(manifest::manifest_dir)
        .collect();
    let mut changed = detector.retain(&folders);
    for folder in &folders {
        changed |= detector.update_state(folder);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{MANIFEST_DIR, MANIFEST_FILE};
    use crate::record::Commitish;
    use crate::test_support::MockBackend;
    use std::fs;
    use tempfile::TempDir;

    const A: &str = "https://example.com/org/a";
    const B: &str = "https://example.com/org/b";
    const C: &str = "https://example.com/org/c";
    const D: &str = "https://example.com/org/d";

    struct Fixture {
        _temp: TempDir,
        options: ResolverOptions,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let ws = temp.path().join("ws");
            fs::create_dir_all(&ws).unwrap();
            let options = ResolverOptions::new(&ws)
                .with_bare_root(temp.path().join("bare"))
                .with_workers(4);
            Self { _temp: temp, options }
        }

        fn ws(&self) -> &Path {
            &self.options.workspace_root
        }

        fn resolver(&self, backend: &Arc<MockBackend>) -> DependencyResolver {
            DependencyResolver::new(self.options.clone(), backend.clone()).unwrap()
        }
    }

    fn id(url: &str) -> RepositoryIdentity {
        RepositoryIdentity::parse(url).unwrap()
    }

    fn request(url: &str) -> RootRequest {
        RootRequest::new(id(url), Commitish::Unset)
    }

    fn deps(urls: &[&str]) -> String {
        let mut yaml = String::from("dependencies:\n");
        for url in urls {
            yaml.push_str(&format!("  {}:\n    branch: main\n    configs:\n      local path: deps\n", url));
        }
        yaml
    }

    #[test]
    fn test_acyclic_chain_resolves_each_once() {
        let f = Fixture::new();
        let backend = Arc::new(
            MockBackend::new()
                .with_remote(A, Some(&deps(&[B])))
                .with_remote(B, Some(&deps(&[C])))
                .with_remote(C, Some(&deps(&[D])))
                .with_remote(D, None),
        );

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert_eq!(resolution.repositories.len(), 4);
        assert!(resolution.passes <= 4);
        assert!(resolution.loads.values().all(|&n| n == 1));
        assert_eq!(backend.clone_count(), 4);
        assert!(resolution.repositories.values().all(|r| r.resolved));
        assert_eq!(
            resolution.repositories[&id(D)].worktree_path,
            Some(f.ws().join("deps/d"))
        );
        assert!(resolution.cache_written);
    }

    #[test]
    fn test_cycle_terminates() {
        let f = Fixture::new();
        let backend = Arc::new(
            MockBackend::new()
                .with_remote(A, Some(&deps(&[B])))
                .with_remote(B, Some(&deps(&[A]))),
        );

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        let ids: Vec<_> = resolution.repositories.keys().cloned().collect();
        assert_eq!(ids, vec![id(A), id(B)]);
        assert_eq!(resolution.loads[&id(A)], 1);
        assert_eq!(resolution.loads[&id(B)], 1);
        assert_eq!(backend.add_count(), 2);
    }

    #[test]
    fn test_shared_dependency_loaded_once() {
        let f = Fixture::new();
        let backend = Arc::new(
            MockBackend::new()
                .with_remote(A, Some(&deps(&[B, C])))
                .with_remote(B, Some(&deps(&[C])))
                .with_remote(C, None),
        );

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        let ids: Vec<_> = resolution.repositories.keys().cloned().collect();
        assert_eq!(ids, vec![id(A), id(B), id(C)]);
        assert_eq!(resolution.loads[&id(C)], 1);
        assert_eq!(resolution.passes, 2);
    }

    #[test]
    fn test_second_resolution_does_not_write_cache() {
        let f = Fixture::new();
        let backend = Arc::new(
            MockBackend::new()
                .with_remote(A, Some(&deps(&[B])))
                .with_remote(B, None),
        );

        let first = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert!(first.cache_written);
        let written = fs::read_to_string(&f.options.cache_file).unwrap();

        let second = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert!(!second.state_changed);
        assert!(!second.cache_written);
        assert_eq!(second.passes, 1);
        assert_eq!(second.repositories, first.repositories);
        assert_eq!(fs::read_to_string(&f.options.cache_file).unwrap(), written);
        assert_eq!(backend.add_count(), 2);
    }

    #[test]
    fn test_manifest_edit_forces_full_resolution() {
        let f = Fixture::new();
        let backend = Arc::new(
            MockBackend::new()
                .with_remote(A, Some(&deps(&[B])))
                .with_remote(B, None)
                .with_remote(C, None),
        );
        let first = f.resolver(&backend).resolve(&request(A)).unwrap();

        let manifest = first.repositories[&id(A)]
            .worktree_path
            .as_ref()
            .unwrap()
            .join(MANIFEST_DIR)
            .join(MANIFEST_FILE);
        fs::write(&manifest, deps(&[C])).unwrap();
        let file = fs::File::options().write(true).open(&manifest).unwrap();
        file.set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(60))
            .unwrap();

        let second = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert!(second.state_changed);
        assert!(second.cache_written);
        let ids: Vec<_> = second.repositories.keys().cloned().collect();
        assert_eq!(ids, vec![id(A), id(C)]);
    }

    #[test]
    fn test_different_root_request_discards_cache() {
        let f = Fixture::new();
        let backend = Arc::new(MockBackend::new().with_remote(A, None).with_remote(B, None));
        f.resolver(&backend).resolve(&request(A)).unwrap();

        let other = f.resolver(&backend).resolve(&request(B)).unwrap();
        let ids: Vec<_> = other.repositories.keys().cloned().collect();
        assert_eq!(ids, vec![id(B)]);
        assert!(other.cache_written);
    }

    #[test]
    fn test_missing_worktree_is_placed_again() {
        let f = Fixture::new();
        let backend = Arc::new(MockBackend::new().with_remote(A, None));
        let first = f.resolver(&backend).resolve(&request(A)).unwrap();
        let path = first.repositories[&id(A)].worktree_path.clone().unwrap();

        fs::remove_dir_all(&path).unwrap();
        let second = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert!(second.state_changed);
        assert!(path.join(".git").exists());
        assert_eq!(backend.add_count(), 2);
    }

    #[test]
    fn test_placement_conflict_is_fatal() {
        let f = Fixture::new();
        let backend = Arc::new(MockBackend::new().with_remote(A, Some(&deps(&[B]))).with_remote(B, None));
        MockBackend::plant_worktree(&f.ws().join("deps/b"), "https://example.com/elsewhere/b", "abc", None);

        let err = f.resolver(&backend).resolve(&request(A)).unwrap_err();
        assert!(matches!(err, Error::WorktreeConflict { .. }));
        assert!(!f.options.cache_file.exists());
    }

    #[test]
    fn test_corrupt_manifest_is_absorbed() {
        let f = Fixture::new();
        let backend = Arc::new(MockBackend::new().with_remote(A, Some("dependencies: [unclosed")));

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert_eq!(resolution.repositories.len(), 1);
        assert!(resolution.repositories[&id(A)].config.dependencies.is_empty());
    }

    #[test]
    fn test_invalid_dependency_url_is_skipped() {
        let f = Fixture::new();
        let manifest = "dependencies:\n  \"ftp://example.com/org/x\": {}\n  https://example.com/org/b: {}\n";
        let backend = Arc::new(MockBackend::new().with_remote(A, Some(manifest)).with_remote(B, None));

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        let ids: Vec<_> = resolution.repositories.keys().cloned().collect();
        assert_eq!(ids, vec![id(A), id(B)]);
    }

    #[test]
    fn test_local_path_change_moves_worktree() {
        let f = Fixture::new();
        let backend = Arc::new(MockBackend::new().with_remote(A, Some("local path: apps\n")));

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        let record = &resolution.repositories[&id(A)];
        assert_eq!(record.worktree_path, Some(f.ws().join("apps/a")));
        assert!(!f.ws().join("a").exists());
        assert_eq!(backend.moves.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_switched_checkout_keeps_local_work() {
        let f = Fixture::new();
        let backend = Arc::new(
            MockBackend::new()
                .with_remote(A, Some(&deps(&[B])))
                .with_remote(B, None),
        );
        let first = f.resolver(&backend).resolve(&request(A)).unwrap();
        let b_path = first.repositories[&id(B)].worktree_path.clone().unwrap();

        MockBackend::plant_worktree(&b_path, B, "9999999999", Some("feature__canopy__1"));
        fs::write(b_path.join("uncommitted.c"), "int wip;").unwrap();

        let second = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert!(backend.removes.lock().unwrap().is_empty());
        assert!(b_path.join("uncommitted.c").exists());
        assert_eq!(second.repositories[&id(B)].worktree_path, Some(b_path));
        assert_eq!(backend.add_count(), 2);
        assert!(!second.cache_written);
    }

    #[test]
    fn test_local_path_outside_workspace_stays_at_root() {
        let f = Fixture::new();
        let backend = Arc::new(MockBackend::new().with_remote(A, Some("local path: ../outside\n")));

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        let record = &resolution.repositories[&id(A)];
        assert_eq!(record.worktree_path, Some(f.ws().join("a")));
        assert_eq!(record.worktree_parent.as_deref(), Some(f.ws()));
        assert!(!f.ws().parent().unwrap().join("outside").exists());
        assert!(backend.moves.lock().unwrap().is_empty());
    }

    #[test]
    fn test_confine_keeps_paths_inside_workspace() {
        let root = Path::new("/ws");
        let a = id(A);
        assert_eq!(confine(root, &a, "deps/x"), PathBuf::from("/ws/deps/x"));
        assert_eq!(confine(root, &a, "./deps"), PathBuf::from("/ws/deps"));
        assert_eq!(confine(root, &a, ""), root);
        assert_eq!(confine(root, &a, "../outside"), root);
        assert_eq!(confine(root, &a, "deps/../../x"), root);
        assert_eq!(confine(root, &a, "/elsewhere"), root);
    }

    #[test]
    fn test_relocation_onto_existing_worktree_leaves_old_one() {
        let f = Fixture::new();
        let backend = Arc::new(MockBackend::new().with_remote(A, Some("local path: apps\n")));
        let existing = f.ws().join("apps/a");
        MockBackend::plant_worktree(&existing, A, "1111111111", Some("main__canopy__0"));
        fs::create_dir_all(existing.join(MANIFEST_DIR)).unwrap();
        fs::write(existing.join(MANIFEST_DIR).join(MANIFEST_FILE), "local path: apps\n").unwrap();

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert_eq!(resolution.repositories[&id(A)].worktree_path, Some(existing));
        assert!(f.ws().join("a/.git").exists());
        assert!(backend.moves.lock().unwrap().is_empty());
        assert!(backend.removes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_smaller_dependent_wins_overlay() {
        let f = Fixture::new();
        let a = format!("dependencies:\n  {}: {{}}\n  {}: {{}}\n", B, C);
        let b = format!("dependencies:\n  {}:\n    configs:\n      local path: from-b\n", D);
        let c = format!("dependencies:\n  {}:\n    configs:\n      local path: from-c\n", D);
        let backend = Arc::new(
            MockBackend::new()
                .with_remote(A, Some(&a))
                .with_remote(B, Some(&b))
                .with_remote(C, Some(&c))
                .with_remote(D, None),
        );

        let resolution = f.resolver(&backend).resolve(&request(A)).unwrap();
        assert_eq!(
            resolution.repositories[&id(D)].worktree_path,
            Some(f.ws().join("from-b/d"))
        );
    }
}
