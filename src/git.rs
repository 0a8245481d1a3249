//! Thin wrappers over the system `git` command.
//!
//! Using the system binary means SSH keys, credential helpers and anything
//! configured in `~/.gitconfig` just work. Every call goes through a
//! [`CommandRunner`] so the process layer can be replaced in tests.

use std::fs;
use std::path::Path;

use crate::command::{run_checked, run_query, CommandRunner, DEFAULT_ATTEMPTS};
use crate::error::{Error, Result};

fn git(runner: &dyn CommandRunner, dir: &Path, args: &[&str]) -> Result<()> {
    let mut argv = vec!["git"];
    argv.extend_from_slice(args);
    run_checked(runner, &argv, dir).map(|_| ())
}

fn git_query(runner: &dyn CommandRunner, dir: &Path, args: &[&str]) -> Result<String> {
    let mut argv = vec!["git"];
    argv.extend_from_slice(args);
    run_query(runner, &argv, dir, DEFAULT_ATTEMPTS)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Clone `url` as a bare repository at `bare_path`.
pub fn clone_bare(runner: &dyn CommandRunner, url: &str, bare_path: &Path) -> Result<()> {
    let parent = bare_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    // Runs inside `parent`, so the target is named relative to it.
    let target = bare_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_arg(bare_path));
    let output = runner.run(&["git", "clone", "--bare", url, &target], parent)?;
    if output.success() {
        return Ok(());
    }

    let stderr = output.stderr.trim();
    let message = if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        format!(
            "Authentication failed. Make sure you have access to the repository.\n\
            For private repos, ensure you have:\n\
            - SSH key added to ssh-agent\n\
            - Git credentials configured\n\
            - Personal access token set up\n\
            Error: {}",
            stderr
        )
    } else {
        stderr.to_string()
    };

    Err(Error::BareClone {
        url: url.to_string(),
        message,
    })
}

/// Branch the bare store's `HEAD` points at.
pub fn default_branch(runner: &dyn CommandRunner, bare_path: &Path) -> Result<String> {
    git_query(runner, bare_path, &["symbolic-ref", "--short", "HEAD"])
}

/// URL of the `origin` remote, `None` when there is no such remote.
pub fn remote_url(runner: &dyn CommandRunner, worktree: &Path) -> Result<Option<String>> {
    match git_query(runner, worktree, &["config", "--get", "remote.origin.url"]) {
        Ok(url) => Ok(Some(url)),
        Err(Error::GitCommand { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Full hash of the checked-out commit.
pub fn current_commit(runner: &dyn CommandRunner, worktree: &Path) -> Result<String> {
    git_query(runner, worktree, &["rev-parse", "HEAD"])
}

/// Checked-out local branch, `None` when `HEAD` is detached.
pub fn current_branch(runner: &dyn CommandRunner, worktree: &Path) -> Result<Option<String>> {
    let branch = git_query(runner, worktree, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(if branch == "HEAD" { None } else { Some(branch) })
}

/// Drop registrations of worktrees whose directories are gone.
pub fn prune_worktrees(runner: &dyn CommandRunner, bare_path: &Path) -> Result<()> {
    git(runner, bare_path, &["worktree", "prune"])
}

/// Create a detached worktree at `path` on `commit`.
pub fn add_detached_worktree(
    runner: &dyn CommandRunner,
    bare_path: &Path,
    path: &Path,
    commit: &str,
) -> Result<()> {
    let target = path_arg(path);
    git(runner, bare_path, &["worktree", "add", "--detach", &target, commit])
}

/// Create a worktree at `path` on a new `local_branch` started from
/// `upstream`, tracking `origin/<upstream>`.
///
/// Branch switches re-establish tracking, pulls rebase with auto-stash and
/// pushes go to the tracked branch.
pub fn add_branch_worktree(
    runner: &dyn CommandRunner,
    bare_path: &Path,
    path: &Path,
    local_branch: &str,
    upstream: &str,
) -> Result<()> {
    let target = path_arg(path);
    git(
        runner,
        bare_path,
        &["worktree", "add", "-b", local_branch, &target, upstream],
    )?;

    let remote_key = format!("branch.{}.remote", local_branch);
    let merge_key = format!("branch.{}.merge", local_branch);
    let merge_ref = format!("refs/heads/{}", upstream);
    for (key, value) in [
        (remote_key.as_str(), "origin"),
        (merge_key.as_str(), merge_ref.as_str()),
        ("branch.autoSetupMerge", "always"),
        ("pull.rebase", "true"),
        ("rebase.autoStash", "true"),
        ("push.default", "upstream"),
    ] {
        git(runner, bare_path, &["config", key, value])?;
    }
    Ok(())
}

/// Move a registered worktree.
pub fn move_worktree(
    runner: &dyn CommandRunner,
    bare_path: &Path,
    from: &Path,
    to: &Path,
) -> Result<()> {
    let (from, to) = (path_arg(from), path_arg(to));
    git(runner, bare_path, &["worktree", "move", &from, &to])
}

/// Force-deregister a worktree, deleting its directory.
pub fn remove_worktree(runner: &dyn CommandRunner, bare_path: &Path, path: &Path) -> Result<()> {
    let target = path_arg(path);
    match git(runner, bare_path, &["worktree", "remove", "--force", &target]) {
        Err(_) if !path.exists() => prune_worktrees(runner, bare_path),
        other => other,
    }
}
