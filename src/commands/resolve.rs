//! Resolve command implementation
//!
//! Resolves a root repository and its transitive dependencies into the
//! workspace, reusing the cached workspace when nothing changed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use canopy::defaults;
use canopy::identity::RepositoryIdentity;
use canopy::record::{Commitish, RootRequest};
use canopy::repository::GitBackend;
use canopy::resolver::{DependencyResolver, ResolverOptions};

use super::WorkspaceArgs;

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// URL of the root repository
    #[arg(value_name = "URL")]
    pub url: String,

    /// Branch of the root repository to follow
    #[arg(short, long, value_name = "BRANCH", conflicts_with = "commit")]
    pub branch: Option<String>,

    /// Commit of the root repository to check out
    #[arg(short, long, value_name = "SHA")]
    pub commit: Option<String>,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Root directory of the bare repository stores.
    ///
    /// Defaults to the system cache directory (`~/.cache/canopy/bare` on Linux,
    /// `~/Library/Caches/canopy/bare` on macOS).
    #[arg(long, value_name = "DIR", env = "CANOPY_BARE_ROOT")]
    pub bare_root: Option<PathBuf>,

    /// Number of parallel workers (defaults to the available parallelism)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs) -> Result<()> {
    let start_time = Instant::now();

    let url = RepositoryIdentity::parse(&args.url)
        .with_context(|| format!("Invalid repository URL: {}", args.url))?;
    let commitish = match (args.commit, args.branch) {
        (Some(sha), _) => Commitish::Commit(sha),
        (None, Some(branch)) => Commitish::Branch(branch),
        (None, None) => Commitish::Unset,
    };
    let request = RootRequest::new(url, commitish);

    let workspace_root = args.workspace.workspace_root()?;
    let options = ResolverOptions::new(&workspace_root)
        .with_cache_file(args.workspace.cache_file(&workspace_root))
        .with_bare_root(args.bare_root.unwrap_or_else(defaults::default_bare_root))
        .with_workers(args.jobs.unwrap_or_else(defaults::default_workers));

    let resolver = DependencyResolver::new(options, Arc::new(GitBackend::new()))
        .context("Failed to set up the resolver")?;

    let spinner = spinner(format!("Resolving {}", request.url))?;
    let result = resolver.resolve(&request);
    spinner.finish_and_clear();
    let resolution =
        result.with_context(|| format!("Failed to resolve {}", request.url))?;

    for record in resolution.repositories.values() {
        let path = record
            .worktree_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!("{}  {}  {}", record.identity, record.commitish, path);
    }
    println!(
        "Resolved {} repositories in {} passes ({:.2}s){}",
        resolution.repositories.len(),
        resolution.passes,
        start_time.elapsed().as_secs_f64(),
        if resolution.cache_written {
            ""
        } else {
            ", workspace unchanged"
        }
    );
    Ok(())
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
