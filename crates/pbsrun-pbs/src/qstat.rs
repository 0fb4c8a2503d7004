//! Query the PBS queue via qstat.

use crate::types::{job_id_prefix, PbsJobState};
use pbsrun_parsers::{is_time_value, non_empty_string, run_command, CommandError, CommandResult};
use tokio::process::Command;

/// One job row of a qstat listing.
///
/// Rows are positional from the end of the line because the leading
/// columns (name, user, queue) vary between PBS flavours:
///
/// - default layout: `Job-ID Name User Time-Use S Queue`
/// - `qstat -a` layout: `Job-ID User Queue Name SessID NDS TSK Mem Time S Elap`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    /// Job identifier as printed (possibly host-qualified or truncated)
    pub job_id: String,
    /// Decoded status column
    pub state: PbsJobState,
    /// CPU/elapsed time, only captured for exiting jobs
    pub resource_usage: Option<String>,
}

/// Parse a single line of qstat output.
///
/// Returns None for headers, separators and rows too short to carry a
/// status column.
pub fn parse_qstat_line(line: &str) -> Option<QueueRow> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if !fields.first()?.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if fields.len() < 3 {
        tracing::warn!(%line, "skipping malformed queue row");
        return None;
    }

    let state = PbsJobState::from_code(fields[fields.len() - 2]);
    let resource_usage = if state == PbsJobState::Exiting {
        usage_field(&fields)
    } else {
        None
    };

    Some(QueueRow {
        job_id: fields[0].to_string(),
        state,
        resource_usage,
    })
}

/// Pick the time column adjacent to the status code.
///
/// Clock values win; otherwise the column before the status is taken as
/// printed (Torque shows `0` for a job with no CPU time yet).
fn usage_field(fields: &[&str]) -> Option<String> {
    let before_status = fields[fields.len() - 3];
    let after_status = fields[fields.len() - 1];

    if is_time_value(before_status) {
        non_empty_string(before_status)
    } else if is_time_value(after_status) {
        non_empty_string(after_status)
    } else {
        non_empty_string(before_status)
    }
}

/// Parse a full qstat listing, skipping lines that are not job rows.
pub fn parse_qstat(stdout: &str) -> Vec<QueueRow> {
    stdout.lines().filter_map(parse_qstat_line).collect()
}

/// Find the row for a job.
///
/// Identifiers are compared on their numeric prefix so that `123.host` and
/// a truncated `123.ho` name the same job.
pub fn find_job<'a>(rows: &'a [QueueRow], job_id: &str) -> Option<&'a QueueRow> {
    let wanted = job_id_prefix(job_id);
    if wanted.is_empty() {
        return None;
    }
    rows.iter().find(|row| job_id_prefix(&row.job_id) == wanted)
}

/// Query the full queue listing.
pub async fn query_qstat(program: &str) -> Result<CommandResult, CommandError> {
    let mut cmd = Command::new(program);
    run_command(&mut cmd).await
}
