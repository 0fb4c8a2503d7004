//! External command execution for build and scheduler invocations.

use std::fmt;
use thiserror::Error;
use tokio::process::Command;

/// Outcome of one external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Shell-like rendering of the command that ran
    pub command: String,
    /// Process exit code (-1 when terminated by a signal)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` returned {}", self.command, self.exit_code)
    }
}

/// Error type for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to execute {command}: {error}")]
    Execution { command: String, error: String },
    #[error("Command {0}")]
    Failed(CommandResult),
}

impl CommandError {
    /// The captured result, when the command ran far enough to produce one.
    pub fn result(&self) -> Option<&CommandResult> {
        match self {
            Self::Failed(result) => Some(result),
            Self::Execution { .. } => None,
        }
    }

    /// The rendered command line.
    pub fn command(&self) -> &str {
        match self {
            Self::Failed(result) => &result.command,
            Self::Execution { command, .. } => command,
        }
    }
}

/// Render a command as it would be typed in a shell.
///
/// A working directory set on the command is shown as a leading `cd`.
pub fn describe(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    let mut parts = vec![std_cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(std_cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    let line = parts.join(" ");

    match std_cmd.get_current_dir() {
        Some(dir) => format!("cd {} && {}", dir.display(), line),
        None => line,
    }
}

/// Execute a command and capture its result.
///
/// A non-zero exit is returned as [`CommandError::Failed`] carrying the full
/// result. The child is killed if the returned future is dropped, so an
/// in-flight query can be abandoned on cancellation.
pub async fn run_command(cmd: &mut Command) -> Result<CommandResult, CommandError> {
    let command = describe(cmd);
    tracing::debug!(%command, "running command");

    let output = cmd
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| CommandError::Execution {
            command: command.clone(),
            error: e.to_string(),
        })?;

    let result = CommandResult {
        command,
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !result.success() {
        tracing::debug!(command = %result.command, exit_code = result.exit_code, "command failed");
        return Err(CommandError::Failed(result));
    }

    Ok(result)
}
