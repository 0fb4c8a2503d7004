//! Scripted scheduler and recording reporter for lifecycle tests.

use crate::collect::CollectedOutput;
use crate::report::Reporter;
use pbsrun_parsers::{CommandError, CommandResult};
use pbsrun_pbs::Scheduler;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Exit code and output for one scripted invocation.
#[derive(Debug, Clone)]
pub struct Reply {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn fail(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn into_result(self, command: String) -> Result<CommandResult, CommandError> {
        let result = CommandResult {
            command,
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
        };
        if result.success() {
            Ok(result)
        } else {
            Err(CommandError::Failed(result))
        }
    }
}

/// Scheduler that replays canned replies and records calls.
pub struct FakeScheduler {
    submit_reply: Reply,
    listings: Mutex<VecDeque<Reply>>,
    cancel_reply: Reply,
    cancel_on_query: Option<(usize, CancellationToken)>,
    pub submits: Mutex<Vec<String>>,
    pub queries: Mutex<usize>,
    pub cancels: Mutex<Vec<String>>,
}

impl FakeScheduler {
    /// Listings are returned in order; once exhausted the queue is empty.
    pub fn new(job_id: &str, listings: Vec<Reply>) -> Self {
        Self {
            submit_reply: Reply::ok(&format!("{job_id}\n")),
            listings: Mutex::new(listings.into()),
            cancel_reply: Reply::ok(""),
            cancel_on_query: None,
            submits: Mutex::new(Vec::new()),
            queries: Mutex::new(0),
            cancels: Mutex::new(Vec::new()),
        }
    }

    pub fn with_submit_reply(mut self, reply: Reply) -> Self {
        self.submit_reply = reply;
        self
    }

    pub fn with_cancel_reply(mut self, reply: Reply) -> Self {
        self.cancel_reply = reply;
        self
    }

    /// Cancel `token` while answering the `n`th query (1-based).
    pub fn cancel_on_query(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_on_query = Some((n, token));
        self
    }

    pub fn query_count(&self) -> usize {
        *self.queries.lock().unwrap()
    }

    pub fn cancel_calls(&self) -> Vec<String> {
        self.cancels.lock().unwrap().clone()
    }
}

impl Scheduler for FakeScheduler {
    async fn submit(&self, script: &Path) -> Result<CommandResult, CommandError> {
        self.submits
            .lock()
            .unwrap()
            .push(script.display().to_string());
        self.submit_reply
            .clone()
            .into_result(format!("qsub {}", script.display()))
    }

    async fn query_all(&self) -> Result<CommandResult, CommandError> {
        let count = {
            let mut queries = self.queries.lock().unwrap();
            *queries += 1;
            *queries
        };
        if let Some((n, token)) = &self.cancel_on_query
            && *n == count
        {
            token.cancel();
        }
        let reply = self
            .listings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::ok(""));
        reply.into_result("qstat".to_string())
    }

    async fn cancel(&self, job_id: &str) -> Result<CommandResult, CommandError> {
        self.cancels.lock().unwrap().push(job_id.to_string());
        self.cancel_reply.clone().into_result(format!("qdel {job_id}"))
    }
}

/// Reporter that records every call as a short string.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<String>,
}

impl RecordingReporter {
    pub fn statuses(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| e.strip_prefix("status:"))
            .collect()
    }

    pub fn has(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

impl Reporter for RecordingReporter {
    fn step_started(&mut self, label: &str) {
        self.events.push(format!("step:{label}"));
    }

    fn step_finished(&mut self, ok: bool) {
        self.events.push(if ok { "ok" } else { "fail" }.to_string());
    }

    fn command_failed(&mut self, error: &CommandError) {
        self.events.push(format!("command_failed:{}", error.command()));
    }

    fn error(&mut self, message: &str) {
        self.events.push(format!("error:{message}"));
    }

    fn tracking(&mut self, job_id: &str) {
        self.events.push(format!("tracking:{job_id}"));
    }

    fn status(&mut self, line: &str) {
        self.events.push(format!("status:{line}"));
    }

    fn polling_finished(&mut self) {
        self.events.push("polling_finished".to_string());
    }

    fn interrupted(&mut self) {
        self.events.push("interrupted".to_string());
    }

    fn aborted(&mut self, job_id: &str) {
        self.events.push(format!("aborted:{job_id}"));
    }

    fn summary(&mut self, resource_usage: Option<&str>, _elapsed: Option<&str>) {
        self.events
            .push(format!("summary:{}", resource_usage.unwrap_or("-")));
    }

    fn output(&mut self, output: &CollectedOutput) {
        self.events.push(format!("output:{}", output.stdout.trim()));
    }
}
