//! External process execution in a fixed working directory
//!
//! Two modes:
//! - [`Executor::command`] runs to completion with output captured
//! - [`Executor::process`] hands the terminal to the child (stdin, stdout and
//!   stderr inherited) so it can prompt for passwords and subject fields
//!
//! Neither mode imposes a timeout; an unanswered prompt blocks indefinitely.

use crate::error::{Result, SetupError};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct Executor {
    cwd: PathBuf,
}

impl Executor {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Run `program` to completion, capturing its output.
    ///
    /// # Returns
    /// * `Ok(String)` - Captured stdout (lossy UTF-8)
    /// * `Err(SetupError::CommandExecution)` - Spawn failure or non-zero exit
    pub async fn command<S: AsRef<OsStr>>(&self, program: impl AsRef<OsStr>, args: &[S]) -> Result<String> {
        let program = program.as_ref();
        tracing::debug!(
            program = %program.to_string_lossy(),
            args = %display_args(args),
            cwd = %self.cwd.display(),
            "running command"
        );

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(exit_error(program, args, output.status, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run `program` with the standard streams connected to this terminal.
    ///
    /// Blocks until the child exits. Nothing is relayed through this process,
    /// so there is no pipe to detach afterwards.
    pub async fn process<S: AsRef<OsStr>>(&self, program: impl AsRef<OsStr>, args: &[S]) -> Result<()> {
        let program = program.as_ref();
        tracing::debug!(
            program = %program.to_string_lossy(),
            args = %display_args(args),
            cwd = %self.cwd.display(),
            "starting interactive process"
        );

        let status = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| spawn_error(program, e))?;

        if !status.success() {
            return Err(exit_error(program, args, status, ""));
        }

        Ok(())
    }
}

fn display_args<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn spawn_error(program: &OsStr, e: std::io::Error) -> SetupError {
    SetupError::CommandExecution(format!(
        "Failed to execute {}: {e}",
        program.to_string_lossy()
    ))
}

fn exit_error<S: AsRef<OsStr>>(program: &OsStr, args: &[S], status: ExitStatus, stderr: &str) -> SetupError {
    let mut message = format!(
        "`{} {}` exited with {status}",
        program.to_string_lossy(),
        display_args(args)
    );
    if !stderr.is_empty() {
        message.push_str(": ");
        message.push_str(stderr);
    }
    SetupError::CommandExecution(message)
}
