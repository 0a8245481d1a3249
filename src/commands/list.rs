//! # List Command Implementation
//!
//! Lists the repositories recorded by the last `resolve` in the workspace.
//! This command is read-only: it never touches git or the filesystem beyond
//! reading the workspace cache.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::WorkspaceArgs;

/// List the repositories of the resolved workspace
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Print the records as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Entry<'a> {
    url: &'a str,
    version: String,
    path: Option<&'a std::path::Path>,
    flags: Vec<&'a str>,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs) -> Result<()> {
    let (root, cache) = args.workspace.load_cache()?;

    let entries: Vec<Entry> = cache
        .records()
        .map(|record| Entry {
            url: record.identity.as_str(),
            version: record.commitish.to_string(),
            path: record.worktree_path.as_deref(),
            flags: record.config.flags.iter().map(String::as_str).collect(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No repositories resolved in {}", root.display());
        return Ok(());
    }

    for entry in &entries {
        let path = entry
            .path
            .map(|p| p.strip_prefix(&root).unwrap_or(p).display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {}  {}", path, entry.url, entry.version);
    }
    println!("{} repositories", entries.len());
    Ok(())
}
