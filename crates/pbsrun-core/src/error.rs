//! Terminal failures of a run.

use crate::collect::CollectError;
use crate::job::PhaseError;
use crate::script::ScriptError;
use pbsrun_parsers::{CommandError, CommandResult};
use std::time::Duration;
use thiserror::Error;

/// Why a run ended in `Failed`.
///
/// Command failures carry the full [`CommandResult`] where one exists.
/// None of these are retried.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Build failed")]
    Build(#[source] CommandError),
    #[error("Cannot prepare job script")]
    TemplateIo(#[from] ScriptError),
    #[error("Job submission failed")]
    Submit(#[source] CommandError),
    #[error("Submission printed no job id ({0})")]
    MissingJobId(CommandResult),
    #[error("Queue query failed")]
    Query(#[source] CommandError),
    #[error("Cancelling job {job_id} failed")]
    Cancel {
        job_id: String,
        #[source]
        source: CommandError,
    },
    #[error("Job {job_id} still in the queue after {}s", .waited.as_secs())]
    PollTimeout { job_id: String, waited: Duration },
    #[error("Collecting job output failed")]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Phase(#[from] PhaseError),
}
