//! Cancel jobs via qdel.

use pbsrun_parsers::{run_command, CommandError, CommandResult};
use tokio::process::Command;

/// Delete a job from the queue.
pub async fn cancel(program: &str, job_id: &str) -> Result<CommandResult, CommandError> {
    let mut cmd = Command::new(program);
    cmd.arg(job_id);
    run_command(&mut cmd).await
}
