//! The job being launched and its lifecycle phases.

use chrono::{DateTime, Utc};
use pbsrun_pbs::PbsJobState;
use thiserror::Error;

/// Lifecycle phase of a job.
///
/// Phases only move forward:
/// `Building -> Submitting -> Polling -> ExitingObserved -> Collecting -> Done`,
/// with `Polling -> Aborted` on cancellation and any non-terminal phase
/// able to drop to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Building,
    Submitting,
    Polling,
    ExitingObserved,
    Collecting,
    Done,
    Aborted,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted | Self::Failed)
    }

    /// Whether `next` is an edge of the phase graph from `self`.
    pub fn can_advance_to(&self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (Building, Submitting)
            | (Submitting, Polling)
            | (Polling, ExitingObserved)
            | (Polling, Aborted)
            | (ExitingObserved, Collecting)
            | (Collecting, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PhaseError {
    #[error("Invalid phase transition {from:?} -> {to:?}")]
    InvalidTransition { from: Phase, to: Phase },
    #[error("Job already submitted as {0}")]
    AlreadySubmitted(String),
    #[error("Resource usage already recorded as {0}")]
    UsageRecorded(String),
    #[error("Job has not been submitted")]
    NotSubmitted,
}

/// One job, from build to collected output.
#[derive(Debug, Clone)]
pub struct Job {
    /// Project directory and executable name
    pub project_name: String,
    /// Nodes requested
    pub node_count: u32,
    /// Processes per node requested
    pub process_count: u32,
    /// Arguments passed to the executable
    pub input_args: Vec<String>,

    scheduler_job_id: Option<String>,
    phase: Phase,
    last_known_status: Option<PbsJobState>,
    resource_usage: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(
        project_name: impl Into<String>,
        node_count: u32,
        process_count: u32,
        input_args: Vec<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            node_count,
            process_count,
            input_args,
            scheduler_job_id: None,
            phase: Phase::Building,
            last_known_status: None,
            resource_usage: None,
            submitted_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Identifier assigned by the scheduler at submission.
    pub fn scheduler_job_id(&self) -> Option<&str> {
        self.scheduler_job_id.as_deref()
    }

    /// Status decoded from the most recent queue row for this job.
    pub fn last_known_status(&self) -> Option<PbsJobState> {
        self.last_known_status
    }

    /// Usage captured when the job was seen exiting.
    pub fn resource_usage(&self) -> Option<&str> {
        self.resource_usage.as_deref()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Wall time since submission.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.submitted_at.map(|at| Utc::now() - at)
    }

    /// Move to the next phase.
    pub fn advance(&mut self, next: Phase) -> Result<(), PhaseError> {
        if !self.phase.can_advance_to(next) {
            return Err(PhaseError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::info!(project = %self.project_name, from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
        Ok(())
    }

    /// Drop to `Failed` unless the job already reached a terminal phase.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            tracing::info!(project = %self.project_name, from = ?self.phase, "job failed");
            self.phase = Phase::Failed;
        }
    }

    /// Record the scheduler's job id and start polling.
    pub fn record_submission(&mut self, job_id: impl Into<String>) -> Result<(), PhaseError> {
        if let Some(existing) = &self.scheduler_job_id {
            return Err(PhaseError::AlreadySubmitted(existing.clone()));
        }
        self.advance(Phase::Polling)?;
        self.scheduler_job_id = Some(job_id.into());
        self.submitted_at = Some(Utc::now());
        Ok(())
    }

    pub fn observe_status(&mut self, status: PbsJobState) {
        self.last_known_status = Some(status);
    }

    /// Record usage reported with the exiting status. Only the first value is kept.
    pub fn record_resource_usage(&mut self, usage: impl Into<String>) -> Result<(), PhaseError> {
        if let Some(existing) = &self.resource_usage {
            return Err(PhaseError::UsageRecorded(existing.clone()));
        }
        self.resource_usage = Some(usage.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("demo", 2, 4, vec!["a".to_string()])
    }

    #[test]
    fn test_new_job_is_building() {
        let job = job();
        assert_eq!(job.phase(), Phase::Building);
        assert!(job.scheduler_job_id().is_none());
        assert!(job.last_known_status().is_none());
        assert!(job.resource_usage().is_none());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = job();
        job.advance(Phase::Submitting).unwrap();
        job.record_submission("123.head").unwrap();
        assert_eq!(job.phase(), Phase::Polling);
        job.advance(Phase::ExitingObserved).unwrap();
        job.advance(Phase::Collecting).unwrap();
        job.advance(Phase::Done).unwrap();
        assert!(job.phase().is_terminal());
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut job = job();
        job.advance(Phase::Submitting).unwrap();
        let err = job.advance(Phase::Building).unwrap_err();
        assert_eq!(
            err,
            PhaseError::InvalidTransition {
                from: Phase::Submitting,
                to: Phase::Building
            }
        );
    }

    #[test]
    fn test_abort_only_from_polling() {
        assert!(Phase::Polling.can_advance_to(Phase::Aborted));
        assert!(!Phase::Building.can_advance_to(Phase::Aborted));
        assert!(!Phase::Collecting.can_advance_to(Phase::Aborted));
    }

    #[test]
    fn test_fail_is_sticky_for_terminal_phases() {
        let mut job = job();
        job.fail();
        assert_eq!(job.phase(), Phase::Failed);
        assert!(job.advance(Phase::Submitting).is_err());
        job.fail();
        assert_eq!(job.phase(), Phase::Failed);
    }

    #[test]
    fn test_job_id_set_once() {
        let mut job = job();
        job.advance(Phase::Submitting).unwrap();
        job.record_submission("123.head").unwrap();
        assert_eq!(
            job.record_submission("456.head"),
            Err(PhaseError::AlreadySubmitted("123.head".to_string()))
        );
        assert_eq!(job.scheduler_job_id(), Some("123.head"));
        assert!(job.submitted_at().is_some());
    }

    #[test]
    fn test_submission_requires_submitting_phase() {
        let mut job = job();
        assert!(job.record_submission("123.head").is_err());
        assert!(job.scheduler_job_id().is_none());
    }

    #[test]
    fn test_resource_usage_never_overwritten() {
        let mut job = job();
        job.record_resource_usage("00:05").unwrap();
        assert!(job.record_resource_usage("00:09").is_err());
        assert_eq!(job.resource_usage(), Some("00:05"));
    }
}
