//! Reporting seam between the lifecycle and the interactive display.

use crate::collect::CollectedOutput;
use pbsrun_parsers::CommandError;

/// Progress glyphs appended when the status has not changed.
pub const SPINNER_FRAMES: [&str; 4] = ["▌", "▀", "▐", "▄"];

/// Receives lifecycle progress for display.
pub trait Reporter {
    /// A named step began (compile, make script, submit).
    fn step_started(&mut self, label: &str);
    /// The step that last started finished.
    fn step_finished(&mut self, ok: bool);
    /// An external command failed; show everything it printed.
    fn command_failed(&mut self, error: &CommandError);
    /// A non-command failure worth showing to the user.
    fn error(&mut self, message: &str);
    /// Polling begins for this job.
    fn tracking(&mut self, job_id: &str);
    /// Current status line, already deduplicated by [`StatusLine`].
    fn status(&mut self, line: &str);
    /// Polling ended normally.
    fn polling_finished(&mut self);
    /// Cancellation was requested while polling.
    fn interrupted(&mut self);
    /// The job was removed from the queue after cancellation.
    fn aborted(&mut self, job_id: &str);
    /// Usage summary once the job has left the queue.
    fn summary(&mut self, resource_usage: Option<&str>, elapsed: Option<&str>);
    /// Collected stdout and stderr of the job.
    fn output(&mut self, output: &CollectedOutput);
}

/// Builds status lines, marking repeats with a rotating spinner.
///
/// A line identical to the previous one gets the next spinner frame
/// appended so a stalled display can be told apart from an idle job.
#[derive(Debug, Default)]
pub struct StatusLine {
    last: Option<String>,
    frame: usize,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, status: &str) -> String {
        let line = format!("  - status: {status}");
        if self.last.as_deref() == Some(line.as_str()) {
            let glyph = SPINNER_FRAMES[self.frame];
            self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
            format!("{line}{glyph}")
        } else {
            self.last = Some(line.clone());
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_gets_spinner_suffix() {
        let mut status = StatusLine::new();
        let first = status.render("job is running");
        let second = status.render("job is running");
        assert_eq!(first, "  - status: job is running");
        assert_eq!(second, format!("{first}{}", SPINNER_FRAMES[0]));
    }

    #[test]
    fn test_spinner_cycles_four_frames() {
        let mut status = StatusLine::new();
        status.render("job is queued");
        let glyphs: Vec<String> = (0..5)
            .map(|_| {
                status
                    .render("job is queued")
                    .trim_start_matches("  - status: job is queued")
                    .to_string()
            })
            .collect();
        assert_eq!(glyphs, vec!["▌", "▀", "▐", "▄", "▌"]);
    }

    #[test]
    fn test_new_status_resets_line() {
        let mut status = StatusLine::new();
        status.render("job is queued");
        status.render("job is queued");
        assert_eq!(status.render("job is running"), "  - status: job is running");
    }
}
