//! Running a repository's `setup`, `before build` and `after build` blocks.
//!
//! Each block is a named list of shell commands with an optional
//! `condition to proceed`. The condition is itself a shell command: the block
//! runs only if it prints nothing. Blocks run in name order inside the
//! repository's worktree and stop at the first failing command.

use std::fmt;
use std::path::Path;

use log::{debug, info, warn};

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::manifest::CommandBlock;
use crate::record::RepositoryRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    BeforeBuild,
    AfterBuild,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Setup => "setup",
            Stage::BeforeBuild => "before build",
            Stage::AfterBuild => "after build",
        })
    }
}

/// What happened to one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Ran(String),
    Skipped(String),
}

/// Runs every block of `stage` declared by `record`.
pub fn run_stage(
    record: &RepositoryRecord,
    stage: Stage,
    runner: &dyn CommandRunner,
) -> Result<Vec<BlockOutcome>> {
    let blocks = match stage {
        Stage::Setup => &record.config.setup,
        Stage::BeforeBuild => &record.config.before_build,
        Stage::AfterBuild => &record.config.after_build,
    };
    if blocks.is_empty() {
        return Ok(Vec::new());
    }

    let Some(dir) = record.worktree_path.as_deref() else {
        warn!("{} has no worktree; skipping its {} blocks", record.identity, stage);
        return Ok(blocks
            .keys()
            .map(|name| BlockOutcome::Skipped(name.clone()))
            .collect());
    };

    let mut outcomes = Vec::with_capacity(blocks.len());
    for (name, block) in blocks {
        if should_proceed(block, dir, runner)? {
            info!("{}: running {} block `{}`", record.identity, stage, name);
            run_block(name, block, dir, runner)?;
            outcomes.push(BlockOutcome::Ran(name.clone()));
        } else {
            debug!("{}: condition of `{}` not met", record.identity, name);
            outcomes.push(BlockOutcome::Skipped(name.clone()));
        }
    }
    Ok(outcomes)
}

fn should_proceed(block: &CommandBlock, dir: &Path, runner: &dyn CommandRunner) -> Result<bool> {
    let condition = block.condition.trim();
    if condition.is_empty() {
        return Ok(true);
    }
    let output = runner.run(&["sh", "-c", condition], dir)?;
    Ok(output.output.trim().is_empty())
}

fn run_block(name: &str, block: &CommandBlock, dir: &Path, runner: &dyn CommandRunner) -> Result<()> {
    for command in &block.commands {
        let output = runner.run(&["sh", "-c", command], dir)?;
        if !output.success() {
            return Err(Error::LifecycleCommand {
                block: name.to_string(),
                command: command.clone(),
                exit_code: output.exit_code,
                output: format!("{}{}", output.output, output.stderr).trim().to_string(),
            });
        }
    }
    Ok(())
}
