//! Scheduler gateway: the three commands the job lifecycle needs.

use crate::{qdel, qstat, qsub};
use pbsrun_parsers::{CommandError, CommandResult};
use std::path::{Path, PathBuf};

/// Synchronous-per-call access to a batch scheduler.
///
/// Every call is one external invocation; a non-zero exit is returned as
/// [`CommandError::Failed`] and is never retried here.
#[allow(async_fn_in_trait)]
pub trait Scheduler {
    /// Submit a job script. On success the trimmed stdout is the job id.
    async fn submit(&self, script: &Path) -> Result<CommandResult, CommandError>;

    /// Fetch the whole queue listing.
    async fn query_all(&self) -> Result<CommandResult, CommandError>;

    /// Cancel a job. Callers pass the id without its server qualifier.
    async fn cancel(&self, job_id: &str) -> Result<CommandResult, CommandError>;
}

/// Process-backed PBS gateway.
#[derive(Debug, Clone)]
pub struct PbsGateway {
    submit_program: String,
    status_program: String,
    cancel_program: String,
    work_dir: Option<PathBuf>,
}

impl PbsGateway {
    pub fn new(
        submit_program: impl Into<String>,
        status_program: impl Into<String>,
        cancel_program: impl Into<String>,
    ) -> Self {
        Self {
            submit_program: submit_program.into(),
            status_program: status_program.into(),
            cancel_program: cancel_program.into(),
            work_dir: None,
        }
    }

    /// Directory qsub is run from.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}

impl Default for PbsGateway {
    fn default() -> Self {
        Self::new("qsub", "qstat", "qdel")
    }
}

impl Scheduler for PbsGateway {
    async fn submit(&self, script: &Path) -> Result<CommandResult, CommandError> {
        qsub::submit(&self.submit_program, script, self.work_dir.as_deref()).await
    }

    async fn query_all(&self) -> Result<CommandResult, CommandError> {
        qstat::query_qstat(&self.status_program).await
    }

    async fn cancel(&self, job_id: &str) -> Result<CommandResult, CommandError> {
        qdel::cancel(&self.cancel_program, job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gateway_uses_configured_programs() {
        let gateway = PbsGateway::new("true", "echo", "false");
        let listing = gateway.query_all().await.unwrap();
        assert_eq!(listing.command, "echo");

        let err = gateway.cancel("123").await.unwrap_err();
        assert_eq!(err.command(), "false 123");
    }

    #[test]
    fn test_default_programs() {
        let gateway = PbsGateway::default();
        assert_eq!(gateway.submit_program, "qsub");
        assert_eq!(gateway.status_program, "qstat");
        assert_eq!(gateway.cancel_program, "qdel");
        assert!(gateway.work_dir.is_none());
    }
}
