//! # Canopy Library
//!
//! This library provides the dependency resolution and workspace placement
//! engine behind the `canopy` command-line tool. A project is assembled from
//! many independently versioned repositories, each declaring its own
//! dependencies in a manifest; canopy materializes the transitive closure as
//! a workspace of worktrees sharing local bare clones of their remotes.
//!
//! ## Quick Example
//!
//! ```
//! use canopy::identity::RepositoryIdentity;
//! use canopy::manifest::{self, SubstitutionContext};
//!
//! // Different spellings of one remote are one identity
//! let a = RepositoryIdentity::parse("git@github.com:org/lib.git").unwrap();
//! let b = RepositoryIdentity::parse("https://GitHub.com/org/lib/").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.name(), "lib");
//!
//! // A dependent's overlay is laid over the dependency's own manifest
//! let ctx = SubstitutionContext::for_repository(&a, None, None);
//! let own = manifest::parse("local path: libs\nflags: []\n", &ctx).unwrap();
//! let overlay = manifest::parse("flags: [no auto build]\n", &ctx).unwrap();
//! let merged = manifest::merge(&own, &overlay);
//! assert_eq!(merged.local_path, "libs");
//! assert!(merged.has_flag("no auto build"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Identities (`identity`)**: canonical remote URLs, the only key under
//!   which repositories are compared and stored.
//! - **Manifests (`manifest`)**: the typed `configs/config.yaml` schema, its
//!   loading, `$$NAME$$` substitution and overlay merge.
//! - **Repository Backend (`repository`, `git`, `command`)**: everything the
//!   engine needs from git, behind a trait so tests can simulate it.
//! - **Placement (`bare`, `worktree`)**: one bare store per remote and one
//!   worktree per repository at `<workspace>/<local path>/<name>`.
//! - **State (`cache`, `change`)**: the persisted workspace document and the
//!   manifest-folder baselines deciding when it can be reused.
//! - **Resolution (`resolver`)**: the parallel fixpoint tying it together.
//! - **Lifecycle (`lifecycle`)**: a repository's condition-gated command blocks.
//!
//! ## Execution Flow
//!
//! [`resolver::DependencyResolver::resolve`] runs the following steps:
//!
//! 1.  **Seed**: reuse the cached workspace or start from the root alone.
//! 2.  **Resolve**: for each outstanding repository in parallel, ensure its
//!     bare store, verify or place its worktree and load its manifest.
//! 3.  **Admit**: newly declared dependencies join the next pass.
//! 4.  **Persist**: record manifest baselines and write the cache if anything
//!     changed.

pub mod bare;
pub mod cache;
pub mod change;
pub mod command;
pub mod defaults;
pub mod error;
pub mod git;
pub mod identity;
pub mod lifecycle;
pub mod manifest;
pub mod record;
pub mod repository;
pub mod resolver;
pub mod worktree;

#[cfg(test)]
mod identity_proptest;
#[cfg(test)]
pub(crate) mod test_support;
