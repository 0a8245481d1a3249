//! Run command implementation
//!
//! Runs one lifecycle stage of every repository in the resolved workspace,
//! in identity order, stopping at the first failing command.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use canopy::command::SystemRunner;
use canopy::lifecycle::{self, BlockOutcome, Stage};

use super::WorkspaceArgs;

/// Lifecycle stages selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StageArg {
    /// The `setup` blocks
    Setup,
    /// The `before build` blocks
    BeforeBuild,
    /// The `after build` blocks
    AfterBuild,
}

impl From<StageArg> for Stage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Setup => Stage::Setup,
            StageArg::BeforeBuild => Stage::BeforeBuild,
            StageArg::AfterBuild => Stage::AfterBuild,
        }
    }
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stage to run
    #[arg(value_enum)]
    pub stage: StageArg,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

/// Execute the run command
pub fn execute(args: RunArgs) -> Result<()> {
    let stage = Stage::from(args.stage);
    let (root, cache) = args.workspace.load_cache()?;
    if cache.is_empty() {
        anyhow::bail!(
            "No resolved workspace in {}; run `canopy resolve` first",
            root.display()
        );
    }

    let mut ran = 0;
    for record in cache.records() {
        let outcomes = lifecycle::run_stage(record, stage, &SystemRunner)
            .with_context(|| format!("{} failed for {}", stage, record.identity))?;
        for outcome in outcomes {
            match outcome {
                BlockOutcome::Ran(name) => {
                    ran += 1;
                    println!("{}: ran `{}`", record.identity.name(), name);
                }
                BlockOutcome::Skipped(name) => {
                    println!("{}: skipped `{}`", record.identity.name(), name);
                }
            }
        }
    }
    println!("{} {} blocks ran", ran, stage);
    Ok(())
}
