//! Process execution behind a narrow interface.
//!
//! Everything that shells out (git queries, worktree plumbing, lifecycle
//! blocks) goes through [`CommandRunner`], so tests can swap in a fake and
//! the retry policy for flaky thin wrappers lives in one place.

use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};

/// How many times a flaky query is attempted before its last error surfaces.
pub const DEFAULT_ATTEMPTS: usize = 3;

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output.
    pub output: String,
    /// Captured standard error.
    pub stderr: String,
    /// Exit code, `-1` when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a command in a working directory.
pub trait CommandRunner: Send + Sync {
    /// Runs `argv[0]` with the remaining arguments inside `working_dir`.
    ///
    /// Failing to spawn the process is an error; a non-zero exit is not.
    fn run(&self, argv: &[&str], working_dir: &Path) -> Result<CommandOutput>;
}

/// The default runner, backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[&str], working_dir: &Path) -> Result<CommandOutput> {
        let (program, args) = argv.split_first().ok_or_else(|| Error::GitCommand {
            command: String::new(),
            dir: working_dir.to_path_buf(),
            stderr: "empty command line".to_string(),
        })?;

        debug!("running `{}` in {}", argv.join(" "), working_dir.display());
        let output = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()?;

        Ok(CommandOutput {
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Runs a query whose output must be non-empty, retrying up to `attempts` times.
///
/// Empty output surfaces as [`Error::TransientCommand`], a non-zero exit as
/// [`Error::GitCommand`]; whichever happened last is returned. The trimmed
/// output is returned on success.
pub fn run_query(
    runner: &dyn CommandRunner,
    argv: &[&str],
    working_dir: &Path,
    attempts: usize,
) -> Result<String> {
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        let result = runner.run(argv, working_dir)?;
        if !result.success() {
            last_error = Some(Error::GitCommand {
                command: argv.join(" "),
                dir: working_dir.to_path_buf(),
                stderr: result.stderr.trim().to_string(),
            });
        } else if result.output.trim().is_empty() {
            last_error = Some(Error::TransientCommand {
                command: argv.join(" "),
                attempts,
                message: "empty output".to_string(),
            });
        } else {
            return Ok(result.output.trim().to_string());
        }
        debug!("attempt {}/{} of `{}` failed", attempt, attempts, argv.join(" "));
    }

    Err(last_error.unwrap_or_else(|| Error::TransientCommand {
        command: argv.join(" "),
        attempts,
        message: "no attempt made".to_string(),
    }))
}

/// Runs a command that must succeed, returning its output.
pub fn run_checked(
    runner: &dyn CommandRunner,
    argv: &[&str],
    working_dir: &Path,
) -> Result<CommandOutput> {
    let result = runner.run(argv, working_dir)?;
    if !result.success() {
        return Err(Error::GitCommand {
            command: argv.join(" "),
            dir: working_dir.to_path_buf(),
            stderr: result.stderr.trim().to_string(),
        });
    }
    Ok(result)
}
