//! PBS job types.

use std::fmt;

/// PBS job status, decoded from the single-letter `S` column of qstat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PbsJobState {
    /// C - Job is completed after having run
    Completed,
    /// E - Job is exiting after having run
    Exiting,
    /// H - Job is held
    Held,
    /// Q - Job is queued, eligible to run or be routed
    Queued,
    /// R - Job is running
    Running,
    /// T - Job is being moved to a new location
    Moving,
    /// W - Job is waiting for its execution time
    Waiting,
    /// S - Job is suspended
    Suspended,
    /// Any code outside the known vocabulary
    Undefined,
}

impl PbsJobState {
    /// Decode a qstat status code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "C" => Self::Completed,
            "E" => Self::Exiting,
            "H" => Self::Held,
            "Q" => Self::Queued,
            "R" => Self::Running,
            "T" => Self::Moving,
            "W" => Self::Waiting,
            "S" => Self::Suspended,
            _ => Self::Undefined,
        }
    }

    /// Short status name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Exiting => "exiting",
            Self::Held => "held",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Moving => "moving",
            Self::Waiting => "waiting",
            Self::Suspended => "suspended",
            Self::Undefined => "undefined",
        }
    }

    /// Sentence shown on the interactive status line.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Completed => "job is completed",
            Self::Exiting => "job is exiting",
            Self::Held => "job is held",
            Self::Queued => "job is queued",
            Self::Running => "job is running",
            Self::Moving => "job is being moved",
            Self::Waiting => "job is waiting",
            Self::Suspended => "job is suspended",
            Self::Undefined => "job state is undefined",
        }
    }

    /// Whether the scheduler considers the job finished.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Exiting)
    }
}

impl fmt::Display for PbsJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Job identifier without its server qualifier (`123.host` -> `123`).
pub fn job_id_prefix(job_id: &str) -> &str {
    job_id.split('.').next().unwrap_or(job_id)
}
