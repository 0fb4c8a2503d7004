//! Terminal rendering of a run.

use crate::theme::Theme;
use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::{execute, queue};
use crossterm::terminal::{Clear, ClearType};
use pbsrun_core::{CollectedOutput, Reporter};
use pbsrun_parsers::{CommandError, CommandResult};
use std::io::{self, Write};

/// Clear the terminal and move the cursor home.
pub fn clear_screen(out: &mut impl Write) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}

/// Frame a finished command: CMD, STDOUT and STDERR sections, each line
/// prefixed with `| `.
pub fn frame_result(result: &CommandResult, theme: &Theme) -> String {
    let mut frame = String::new();
    frame.push_str(&format!(
        "|{}\n",
        Theme::paint("------- CMD ------", theme.header)
    ));
    frame.push_str(&format!(
        "| {}\n| -> returned: {}\n",
        Theme::paint(&result.command, theme.header),
        Theme::paint(&result.exit_code.to_string(), theme.header)
    ));
    frame.push_str(&format!(
        "|{}\n",
        Theme::paint("----- STDOUT -----", theme.success)
    ));
    push_prefixed(&mut frame, &result.stdout);
    frame.push_str(&format!(
        "|{}\n",
        Theme::paint("----- STDERR -----", theme.error)
    ));
    push_prefixed(&mut frame, &result.stderr);
    frame.push_str("|------------------\n");
    frame
}

/// Frame a command failure, including commands that never started.
pub fn frame_error(error: &CommandError, theme: &Theme) -> String {
    match error {
        CommandError::Failed(result) => frame_result(result, theme),
        CommandError::Execution { command, error } => {
            let mut frame = format!(
                "|{}\n| {}\n",
                Theme::paint("------- CMD ------", theme.header),
                Theme::paint(command, theme.header)
            );
            frame.push_str(&format!(
                "| -> failed to start: {}\n",
                Theme::paint(error, theme.error)
            ));
            frame.push_str("|------------------\n");
            frame
        }
    }
}

fn push_prefixed(frame: &mut String, text: &str) {
    for line in text.trim().split('\n') {
        frame.push_str("| ");
        frame.push_str(line);
        frame.push('\n');
    }
}

/// Interactive reporter writing to a terminal.
pub struct ConsoleReporter<W: Write> {
    out: W,
    theme: Theme,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), Theme::colored())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self { out, theme }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Opening banner of a run.
    pub fn start(&mut self) {
        let line = Theme::paint("----- Start submit -----", self.theme.success);
        self.emit(&format!("{line}\n"));
    }

    /// Project listing for `getList`.
    pub fn projects(&mut self, names: &[String]) {
        let mut text = String::from("Your projects are:\n");
        for (index, name) in names.iter().enumerate() {
            text.push_str(&format!("  {index}) {name}\n"));
        }
        self.emit(&text);
    }

    fn emit(&mut self, text: &str) {
        let written = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn step_started(&mut self, label: &str) {
        let label = Theme::paint(&format!("- {label}"), self.theme.warning);
        self.emit(&format!("{label} -> "));
    }

    fn step_finished(&mut self, ok: bool) {
        let verdict = if ok {
            Theme::paint("OK", self.theme.success)
        } else {
            Theme::paint("FAIL", self.theme.error)
        };
        self.emit(&format!("{verdict}\n"));
    }

    fn command_failed(&mut self, error: &CommandError) {
        let frame = frame_error(error, &self.theme);
        self.emit(&format!("{frame}\n"));
    }

    fn error(&mut self, message: &str) {
        let line = Theme::paint(&format!("!!! Error: {message}"), self.theme.error);
        self.emit(&format!("{line}\n"));
    }

    fn tracking(&mut self, job_id: &str) {
        let line = Theme::paint(&format!("- Processing job -> {job_id}"), self.theme.warning);
        self.emit(&format!("{line}\n"));
    }

    /// Rewrite the status line in place, erasing whatever a longer
    /// previous line left behind.
    fn status(&mut self, line: &str) {
        let line = Theme::paint(line, self.theme.warning);
        let written = queue!(
            self.out,
            Print(format!("\r{line}")),
            Clear(ClearType::UntilNewLine)
        )
        .and_then(|_| self.out.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }

    fn polling_finished(&mut self) {
        let line = Theme::paint("\n  - done", self.theme.warning);
        self.emit(&format!("{line}\n"));
    }

    fn interrupted(&mut self) {
        let line = Theme::paint("!!! REQUESTED INTERRUPT !!!", self.theme.header);
        self.emit(&format!("\r{line}\n"));
    }

    fn aborted(&mut self, job_id: &str) {
        let line = Theme::paint(&format!("!!! Job {job_id} aborted !!!"), self.theme.header);
        self.emit(&format!("{line}\n"));
    }

    fn summary(&mut self, resource_usage: Option<&str>, elapsed: Option<&str>) {
        let mut text = Theme::paint(
            &format!("-> CPU USED: {} <-", resource_usage.unwrap_or("")),
            self.theme.success,
        );
        text.push('\n');
        if let Some(elapsed) = elapsed {
            text.push_str(&Theme::paint(
                &format!("-> WALL TIME: {elapsed} <-"),
                self.theme.success,
            ));
            text.push('\n');
        }
        text.push_str(&Theme::paint("------ End submit ------", self.theme.success));
        self.emit(&format!("{text}\n\n"));
    }

    fn output(&mut self, output: &CollectedOutput) {
        let log_dir = output
            .stdout_path
            .parent()
            .map(|p| p.as_str())
            .unwrap_or(".");
        let ok = self.theme.success;
        let err = self.theme.error;
        let text = format!(
            "{}\n{}\n\n{}\n{}\n{}\n{}\n{}\n{}\n",
            Theme::paint(&format!("!!! Output files moved in {log_dir} !!!"), ok),
            Theme::paint("@ Results: ", ok),
            Theme::paint("----- STDOUT -----", ok),
            output.stdout,
            Theme::paint("----- END STDOUT -----", ok),
            Theme::paint("----- STDERR -----", err),
            output.stderr,
            Theme::paint("----- END STDERR -----", err),
        );
        self.emit(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pbsrun_core::{StatusLine, SPINNER_FRAMES};

    fn reporter() -> ConsoleReporter<Vec<u8>> {
        ConsoleReporter::new(Vec::new(), Theme::plain())
    }

    fn text(reporter: ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    fn clear_line() -> String {
        let mut seq = String::new();
        crossterm::Command::write_ansi(&Clear(ClearType::UntilNewLine), &mut seq).unwrap();
        seq
    }

    /// What a terminal shows after replaying `\r` and erase-to-end-of-line.
    fn visible_last_line(out: &str) -> String {
        let clear = clear_line();
        let mut line = String::new();
        for segment in out.split('\r').skip(1) {
            let (text, erase) = match segment.split_once(clear.as_str()) {
                Some((text, _)) => (text, true),
                None => (segment, false),
            };
            let rest: String = if erase {
                String::new()
            } else {
                line.chars().skip(text.chars().count()).collect()
            };
            line = format!("{text}{rest}");
        }
        line
    }

    #[test]
    fn test_frame_result_prefixes_every_line() {
        let result = CommandResult {
            command: "qsub cur_sub.sh".to_string(),
            exit_code: 1,
            stdout: String::new(),
            stderr: "qsub: no such queue\nsecond line\n".to_string(),
        };
        let frame = frame_result(&result, &Theme::plain());
        assert_eq!(
            frame,
            "|------- CMD ------\n\
             | qsub cur_sub.sh\n\
             | -> returned: 1\n\
             |----- STDOUT -----\n\
             | \n\
             |----- STDERR -----\n\
             | qsub: no such queue\n\
             | second line\n\
             |------------------\n"
        );
    }

    #[test]
    fn test_frame_error_for_missing_program() {
        let error = CommandError::Execution {
            command: "mpicc demo.c".to_string(),
            error: "No such file or directory".to_string(),
        };
        let frame = frame_error(&error, &Theme::plain());
        assert!(frame.contains("| mpicc demo.c\n"));
        assert!(frame.contains("| -> failed to start: No such file or directory\n"));
    }

    #[test]
    fn test_step_and_status_rendering() {
        let mut r = reporter();
        r.step_started("Compile source");
        r.step_finished(true);
        r.step_started("Submit job on 1 node with 1 process");
        r.step_finished(false);
        r.status("  - status: job is queued");
        r.polling_finished();
        assert_eq!(
            text(r),
            format!(
                "- Compile source -> OK\n\
                 - Submit job on 1 node with 1 process -> FAIL\n\
                 \r  - status: job is queued{}\n  - done\n",
                clear_line()
            )
        );
    }

    #[test]
    fn test_shorter_status_erases_spinner() {
        let mut status_line = StatusLine::new();
        let mut r = reporter();
        for status in ["job is running", "job is running", "job is exiting"] {
            r.status(&status_line.render(status));
        }
        let out = text(r);
        assert!(out.contains(&format!("job is running{}", SPINNER_FRAMES[0])));
        assert_eq!(visible_last_line(&out), "  - status: job is exiting");
    }

    #[test]
    fn test_interrupt_and_summary() {
        let mut r = reporter();
        r.interrupted();
        r.aborted("123.host");
        r.summary(Some("00:05"), None);
        let out = text(r);
        assert!(out.starts_with("\r!!! REQUESTED INTERRUPT !!!\n"));
        assert!(out.contains("!!! Job 123.host aborted !!!\n"));
        assert!(out.contains("-> CPU USED: 00:05 <-\n------ End submit ------\n\n"));
        assert!(!out.contains("WALL TIME"));
    }

    #[test]
    fn test_output_sections() {
        let mut r = reporter();
        r.output(&CollectedOutput {
            stdout_path: Utf8PathBuf::from("work/log/demo.o123"),
            stderr_path: Utf8PathBuf::from("work/log/demo.e123"),
            stdout: "rank 0 done".to_string(),
            stderr: String::new(),
        });
        let out = text(r);
        assert!(out.starts_with("!!! Output files moved in work/log !!!\n"));
        assert!(out.contains("----- STDOUT -----\nrank 0 done\n----- END STDOUT -----\n"));
        assert!(out.contains("----- STDERR -----\n\n----- END STDERR -----\n"));
    }

    #[test]
    fn test_project_listing() {
        let mut r = reporter();
        r.projects(&["alpha".to_string(), "beta".to_string()]);
        assert_eq!(text(r), "Your projects are:\n  0) alpha\n  1) beta\n");
    }
}
