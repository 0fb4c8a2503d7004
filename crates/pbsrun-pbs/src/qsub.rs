//! Submit job scripts via qsub.

use pbsrun_parsers::{run_command, CommandError, CommandResult};
use std::path::Path;
use tokio::process::Command;

/// Submit a job script.
///
/// qsub is run from `work_dir` when given; PBS writes the job's output
/// files into the directory the job was submitted from.
pub async fn submit(
    program: &str,
    script: &Path,
    work_dir: Option<&Path>,
) -> Result<CommandResult, CommandError> {
    let mut cmd = Command::new(program);
    cmd.arg(script);
    if let Some(dir) = work_dir {
        cmd.current_dir(dir);
    }
    run_command(&mut cmd).await
}

/// Extract the job identifier qsub prints on success.
pub fn parse_job_id(stdout: &str) -> Option<String> {
    let id = stdout.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}
