//! # Repository Manifests
//!
//! Every repository may carry a manifest at `configs/config.yaml` declaring
//! where it wants to live in the workspace, its header directories, flags,
//! lifecycle command blocks and its own dependencies:
//!
//! ```yaml
//! local path: libs
//! public headers: [headers]
//! flags: [no auto build]
//! dependencies:
//!   https://example.com/org/dep:
//!     branch: main
//!     configs:
//!       local path: deps
//! setup:
//!   fetch tools:
//!     condition to proceed: "test -d tools"
//!     commands: ["./get-tools.sh"]
//! ```
//!
//! ## Loading
//!
//! [`load`] never fails: a missing manifest is an empty [`RepositoryConfig`],
//! a corrupt one is logged and treated as empty. Before the document is
//! deserialized, `$$NAME$$` tokens are substituted through every nested map
//! and sequence. The `dependencies` subtree is the exception: each entry is
//! substituted with the context of the dependency it describes. Tokens without
//! a value are left in place so they can be filled in once the dependency's
//! own context is known ([`substitute`]).
//!
//! Header lists left empty are auto-detected from a fixed list of
//! conventional directories, keeping the first one that exists on disk.
//!
//! ## Merging
//!
//! [`merge`] lays a dependent's overlay onto a dependency's own manifest:
//! any non-empty overlay field replaces the base field, anything else keeps
//! the base value. An overlay cannot express "clear this field".

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::identity::RepositoryIdentity;
use crate::record::Commitish;

/// Folder holding the manifest, relative to the repository root.
pub const MANIFEST_DIR: &str = "configs";
/// Manifest file name inside [`MANIFEST_DIR`].
pub const MANIFEST_FILE: &str = "config.yaml";

const DEPENDENCIES_KEY: &str = "dependencies";
const VARIABLE_PATTERN: &str = r"\$\$([A-Za-z_][A-Za-z0-9_]*)\$\$";

/// Conventional public header directories, highest priority first.
pub const PUBLIC_HEADER_CANDIDATES: &[&str] = &["headers", "code/headers", "include", "inc"];
/// Conventional private header directories, highest priority first.
pub const PRIVATE_HEADER_CANDIDATES: &[&str] = &["code/private_headers", "private_headers", "src"];
/// Conventional test header directories, highest priority first.
pub const TEST_HEADER_CANDIDATES: &[&str] = &["tests/headers", "test/headers", "tests/inc", "tests"];

/// A condition-gated list of shell commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandBlock {
    /// Shell expression; the block runs only if it prints nothing.
    #[serde(
        rename = "condition to proceed",
        alias = "condition-to-proceed",
        skip_serializing_if = "String::is_empty"
    )]
    pub condition: String,
    /// Commands run in order.
    pub commands: Vec<String>,
}

/// A dependency as declared in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Overlay merged onto the dependency's own manifest.
    #[serde(skip_serializing_if = "RepositoryConfig::is_empty")]
    pub configs: RepositoryConfig,
}

impl DependencySpec {
    /// The version pin. A commit wins over a branch when both are given.
    pub fn commitish(&self) -> Commitish {
        match (&self.commit, &self.branch) {
            (Some(commit), _) if !commit.trim().is_empty() => Commitish::Commit(commit.trim().to_string()),
            (_, Some(branch)) if !branch.trim().is_empty() => Commitish::Branch(branch.trim().to_string()),
            _ => Commitish::Unset,
        }
    }
}

/// Typed manifest contents, also used as the overlay type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Parent directory of the worktree, relative to the workspace root.
    #[serde(rename = "local path", skip_serializing_if = "String::is_empty")]
    pub local_path: String,
    #[serde(rename = "public headers", skip_serializing_if = "Vec::is_empty")]
    pub public_headers: Vec<String>,
    #[serde(rename = "private headers", skip_serializing_if = "Vec::is_empty")]
    pub private_headers: Vec<String>,
    #[serde(rename = "test headers", skip_serializing_if = "Vec::is_empty")]
    pub test_headers: Vec<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<String>,
    /// Declared dependencies keyed by URL as written.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, DependencySpec>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub setup: BTreeMap<String, CommandBlock>,
    #[serde(rename = "before build", skip_serializing_if = "BTreeMap::is_empty")]
    pub before_build: BTreeMap<String, CommandBlock>,
    #[serde(rename = "after build", skip_serializing_if = "BTreeMap::is_empty")]
    pub after_build: BTreeMap<String, CommandBlock>,
}

impl RepositoryConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `flag` is set.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}

/// Values available to `$$NAME$$` tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionContext {
    vars: BTreeMap<String, String>,
}

impl SubstitutionContext {
    /// Context for one repository. Unknown paths simply leave their tokens unresolved.
    pub fn for_repository(
        identity: &RepositoryIdentity,
        repo_path: Option<&Path>,
        workspace_root: Option<&Path>,
    ) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("REPO_NAME".to_string(), identity.name().to_string());
        vars.insert("REPO_URL".to_string(), identity.as_str().to_string());
        if let Some(path) = repo_path {
            vars.insert("REPO_PATH".to_string(), path.display().to_string());
        }
        if let Some(root) = workspace_root {
            vars.insert("WORKSPACE_ROOT".to_string(), root.display().to_string());
        }
        Self { vars }
    }

    /// Adds or replaces a variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    fn workspace_root(&self) -> Option<PathBuf> {
        self.vars.get("WORKSPACE_ROOT").map(PathBuf::from)
    }
}

/// Path of the manifest folder of the repository at `repo_path`.
pub fn manifest_dir(repo_path: &Path) -> PathBuf {
    repo_path.join(MANIFEST_DIR)
}

/// Loads the manifest of the repository checked out at `repo_path`.
///
/// Never fails: missing data degrades to defaults and load errors are logged.
pub fn load(repo_path: &Path, context: &SubstitutionContext) -> RepositoryConfig {
    let mut config = match try_load(repo_path, context) {
        Ok(Some(config)) => config,
        Ok(None) => {
            debug!("no manifest under {}", repo_path.display());
            RepositoryConfig::default()
        }
        Err(e) => {
            warn!("{}; continuing with an empty manifest", e);
            RepositoryConfig::default()
        }
    };
    detect_headers(repo_path, &mut config);
    config
}

/// Strict form of [`load`]: `Ok(None)` when there is no manifest file.
///
/// Header auto-detection is not applied.
pub fn try_load(
    repo_path: &Path,
    context: &SubstitutionContext,
) -> Result<Option<RepositoryConfig>> {
    let path = manifest_dir(repo_path).join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(None);
    }

    let load_error = |message: String| Error::ManifestLoad {
        path: path.clone(),
        message,
    };

    let content = fs::read_to_string(&path).map_err(|e| load_error(e.to_string()))?;
    parse(&content, context)
        .map(Some)
        .map_err(|e| load_error(e.to_string()))
}

/// Parses manifest text, substituting variables first.
pub fn parse(content: &str, context: &SubstitutionContext) -> Result<RepositoryConfig> {
    let value: Value = serde_yaml::from_str(content)?;
    if value.is_null() {
        return Ok(RepositoryConfig::default());
    }
    let value = substitute_document(value, context)?;
    Ok(serde_yaml::from_value(value)?)
}

/// Substitutes `$$NAME$$` tokens through an already-typed config.
///
/// Used after [`merge`], once the repository's full context is known.
pub fn substitute(
    config: &RepositoryConfig,
    context: &SubstitutionContext,
) -> Result<RepositoryConfig> {
    let value = serde_yaml::to_value(config)?;
    let value = substitute_document(value, context)?;
    Ok(serde_yaml::from_value(value)?)
}

/// Lays `overlay` onto `base`: non-empty overlay fields win.
pub fn merge(base: &RepositoryConfig, overlay: &RepositoryConfig) -> RepositoryConfig {
    RepositoryConfig {
        local_path: pick(&base.local_path, &overlay.local_path),
        public_headers: pick(&base.public_headers, &overlay.public_headers),
        private_headers: pick(&base.private_headers, &overlay.private_headers),
        test_headers: pick(&base.test_headers, &overlay.test_headers),
        flags: pick(&base.flags, &overlay.flags),
        dependencies: pick(&base.dependencies, &overlay.dependencies),
        setup: pick(&base.setup, &overlay.setup),
        before_build: pick(&base.before_build, &overlay.before_build),
        after_build: pick(&base.after_build, &overlay.after_build),
    }
}

/// Fills empty header lists from the conventional directories present under `repo_path`.
pub fn detect_headers(repo_path: &Path, config: &mut RepositoryConfig) {
    if config.public_headers.is_empty() {
        config.public_headers = first_existing(repo_path, PUBLIC_HEADER_CANDIDATES);
    }
    if config.private_headers.is_empty() {
        config.private_headers = first_existing(repo_path, PRIVATE_HEADER_CANDIDATES);
    }
    if config.test_headers.is_empty() {
        config.test_headers = first_existing(repo_path, TEST_HEADER_CANDIDATES);
    }
}

fn first_existing(repo_path: &Path, candidates: &[&str]) -> Vec<String> {
    candidates
        .iter()
        .find(|candidate| repo_path.join(candidate).is_dir())
        .map(|candidate| vec![candidate.to_string()])
        .unwrap_or_default()
}

trait Emptiness {
    fn is_blank(&self) -> bool;
}

impl Emptiness for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl<T> Emptiness for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Emptiness for BTreeSet<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Emptiness for BTreeMap<K, V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

fn pick<T: Emptiness + Clone>(base: &T, overlay: &T) -> T {
    if overlay.is_blank() {
        base.clone()
    } else {
        overlay.clone()
    }
}

fn substitute_document(value: Value, context: &SubstitutionContext) -> Result<Value> {
    let pattern = Regex::new(VARIABLE_PATTERN)?;
    let workspace_root = context.workspace_root();

    let Value::Mapping(mut mapping) = value else {
        return Ok(substitute_value(value, context, &pattern));
    };

    let dependencies = mapping.remove(DEPENDENCIES_KEY);
    let mut mapping = substitute_mapping(mapping, context, &pattern);

    if let Some(dependencies) = dependencies {
        let dependencies = match dependencies {
            Value::Mapping(entries) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(key, entry)| {
                        let entry = match key.as_str().and_then(|url| RepositoryIdentity::parse(url).ok()) {
                            Some(identity) => {
                                let dep_context = SubstitutionContext::for_repository(
                                    &identity,
                                    None,
                                    workspace_root.as_deref(),
                                );
                                substitute_value(entry, &dep_context, &pattern)
                            }
                            None => entry,
                        };
                        (key, entry)
                    })
                    .collect(),
            ),
            other => other,
        };
        mapping.insert(Value::String(DEPENDENCIES_KEY.to_string()), dependencies);
    }

    Ok(Value::Mapping(mapping))
}

fn substitute_value(value: Value, context: &SubstitutionContext, pattern: &Regex) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(&s, context, pattern)),
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| substitute_value(item, context, pattern))
                .collect(),
        ),
        Value::Mapping(entries) => Value::Mapping(substitute_mapping(entries, context, pattern)),
        Value::Tagged(mut tagged) => {
            let inner = std::mem::take(&mut tagged.value);
            tagged.value = substitute_value(inner, context, pattern);
            Value::Tagged(tagged)
        }
        other => other,
    }
}

fn substitute_mapping(entries: Mapping, context: &SubstitutionContext, pattern: &Regex) -> Mapping {
    entries
        .into_iter()
        .map(|(key, entry)| (key, substitute_value(entry, context, pattern)))
        .collect()
}

fn substitute_str(s: &str, context: &SubstitutionContext, pattern: &Regex) -> String {
    pattern
        .replace_all(s, |caps: &regex::Captures| {
            context
                .get(&caps[1])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
