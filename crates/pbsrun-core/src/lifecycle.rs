//! Job lifecycle controller: submit, watch the queue, cancel on request.
//!
//! PBS only offers point-in-time queue snapshots, so the controller polls
//! qstat at a fixed interval. Every wait races the cancellation token;
//! a cancelled token makes the controller issue exactly one qdel.

use crate::error::RunError;
use crate::job::{Job, Phase, PhaseError};
use crate::report::{Reporter, StatusLine};
use crate::settings::PollingSettings;
use camino::Utf8Path;
use pbsrun_pbs::{find_job, job_id_prefix, parse_job_id, parse_qstat, PbsJobState, Scheduler};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How polling ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job left the queue (exiting, completed or no longer listed).
    Finished,
    /// The job was cancelled on request.
    Aborted,
}

/// What one queue snapshot said about the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    Listed(PbsJobState),
    Missing,
}

pub struct JobController<'a, S, R> {
    scheduler: &'a S,
    reporter: &'a mut R,
    settings: &'a PollingSettings,
    cancel: CancellationToken,
}

impl<'a, S: Scheduler, R: Reporter> JobController<'a, S, R> {
    pub fn new(
        scheduler: &'a S,
        reporter: &'a mut R,
        settings: &'a PollingSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            scheduler,
            reporter,
            settings,
            cancel,
        }
    }

    /// Submit the job script and record the scheduler's job id.
    pub async fn submit(&mut self, job: &mut Job, script: &Utf8Path) -> Result<(), RunError> {
        if job.phase() != Phase::Submitting {
            return Err(PhaseError::InvalidTransition {
                from: job.phase(),
                to: Phase::Polling,
            }
            .into());
        }

        self.reporter.step_started(&format!(
            "Submit job on {} node{} with {} process{}",
            job.node_count,
            if job.node_count > 1 { "s" } else { "" },
            job.process_count,
            if job.process_count > 1 { "es" } else { "" },
        ));

        let result = match self.scheduler.submit(script.as_std_path()).await {
            Ok(result) => result,
            Err(e) => {
                self.reporter.step_finished(false);
                self.reporter.command_failed(&e);
                job.fail();
                return Err(RunError::Submit(e));
            }
        };

        let Some(job_id) = parse_job_id(&result.stdout) else {
            self.reporter.step_finished(false);
            self.reporter.error("the scheduler did not print a job id");
            job.fail();
            return Err(RunError::MissingJobId(result));
        };

        job.record_submission(job_id)?;
        self.reporter.step_finished(true);
        Ok(())
    }

    /// Poll the queue until the job leaves it, fails, or is cancelled.
    pub async fn poll(&mut self, job: &mut Job) -> Result<PollOutcome, RunError> {
        let job_id = job
            .scheduler_job_id()
            .ok_or(PhaseError::NotSubmitted)?
            .to_string();
        let scheduler = self.scheduler;
        let cancel = self.cancel.clone();
        let interval = self.settings.interval();
        let missing_limit = self.settings.missing_polls.max(1);
        let started = Instant::now();

        let mut status_line = StatusLine::new();
        let mut misses = 0;
        self.reporter.tracking(&job_id);

        loop {
            let queried = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = scheduler.query_all() => Some(result),
            };
            let Some(result) = queried else {
                return self.abort(job, &job_id).await;
            };

            let listing = match result {
                Ok(listing) => listing,
                Err(e) => {
                    self.reporter.polling_finished();
                    self.reporter.command_failed(&e);
                    job.fail();
                    return Err(RunError::Query(e));
                }
            };

            let rows = parse_qstat(&listing.stdout);
            let observation = match find_job(&rows, &job_id) {
                Some(row) => {
                    if let Some(usage) = &row.resource_usage {
                        job.record_resource_usage(usage.clone())?;
                    }
                    Observation::Listed(row.state)
                }
                None => Observation::Missing,
            };

            let mut finished = false;
            match observation {
                Observation::Listed(PbsJobState::Undefined) | Observation::Missing => {
                    if let Observation::Listed(state) = observation {
                        job.observe_status(state);
                    }
                    misses += 1;
                    tracing::debug!(%job_id, misses, "job not listed with a known status");
                    if misses >= missing_limit {
                        tracing::info!(%job_id, "job left the queue");
                        finished = true;
                    }
                }
                Observation::Listed(state) => {
                    misses = 0;
                    job.observe_status(state);
                    tracing::debug!(%job_id, %state, "queue status");
                    finished = state.is_finished();
                }
            }

            let text = if misses > 0 {
                "job is not listed"
            } else {
                job.last_known_status()
                    .map(|s| s.describe())
                    .unwrap_or("job is not listed")
            };
            let line = status_line.render(text);
            self.reporter.status(&line);

            if finished {
                break;
            }

            if let Some(max_wait) = self.settings.max_wait() {
                let waited = started.elapsed();
                if waited >= max_wait {
                    self.reporter.polling_finished();
                    job.fail();
                    return Err(RunError::PollTimeout { job_id, waited });
                }
            }

            let slept = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = tokio::time::sleep(interval) => true,
            };
            if !slept {
                return self.abort(job, &job_id).await;
            }
        }

        self.reporter.polling_finished();
        job.advance(Phase::ExitingObserved)?;
        Ok(PollOutcome::Finished)
    }

    async fn abort(&mut self, job: &mut Job, job_id: &str) -> Result<PollOutcome, RunError> {
        self.reporter.interrupted();
        tracing::info!(%job_id, "cancellation requested");

        match self.scheduler.cancel(job_id_prefix(job_id)).await {
            Ok(_) => {
                job.advance(Phase::Aborted)?;
                self.reporter.aborted(job_id);
                Ok(PollOutcome::Aborted)
            }
            Err(e) => {
                self.reporter.command_failed(&e);
                job.fail();
                Err(RunError::Cancel {
                    job_id: job_id.to_string(),
                    source: e,
                })
            }
        }
    }
}
