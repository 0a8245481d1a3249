//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;

/// Canopy - Materialize a repository and its dependencies as a workspace
#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a repository and its dependencies into the workspace
    Resolve(commands::resolve::ResolveArgs),

    /// List the repositories of the resolved workspace
    List(commands::list::ListArgs),

    /// Run a lifecycle stage of every repository in the workspace
    Run(commands::run::RunArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level);

        match self.command {
            Commands::Resolve(args) => commands::resolve::execute(args),
            Commands::List(args) => commands::list::execute(args),
            Commands::Run(args) => commands::run::execute(args),
        }
    }
}

/// `RUST_LOG` still refines individual modules on top of `--log-level`.
fn init_logging(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}
