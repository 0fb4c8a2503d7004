//! End-to-end run of one project: compile, script, submit, poll, collect.

use crate::build::BuildStep;
use crate::collect::{CollectedOutput, OutputCollector};
use crate::error::RunError;
use crate::job::{Job, Phase, PhaseError};
use crate::lifecycle::{JobController, PollOutcome};
use crate::project::Project;
use crate::report::Reporter;
use crate::script::{write_script, ScriptVars};
use crate::settings::{Settings, SCRIPT_FILE_NAME};
use camino::Utf8Path;
use pbsrun_parsers::format_duration;
use pbsrun_pbs::Scheduler;
use tokio_util::sync::CancellationToken;

/// Result of a finished job.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub job_id: String,
    pub resource_usage: Option<String>,
    pub output: CollectedOutput,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(RunSummary),
    Aborted { job_id: String },
}

pub struct Pipeline<'a, S, R> {
    settings: &'a Settings,
    scheduler: &'a S,
    reporter: &'a mut R,
    cancel: CancellationToken,
}

impl<'a, S: Scheduler, R: Reporter> Pipeline<'a, S, R> {
    pub fn new(
        settings: &'a Settings,
        scheduler: &'a S,
        reporter: &'a mut R,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            scheduler,
            reporter,
            cancel,
        }
    }

    pub async fn run(&mut self, project: &Project, job: &mut Job) -> Result<Outcome, RunError> {
        self.compile(project, job).await?;
        job.advance(Phase::Submitting)?;
        self.make_script(project, job)?;

        let outcome = {
            let mut controller = JobController::new(
                self.scheduler,
                &mut *self.reporter,
                &self.settings.polling,
                self.cancel.clone(),
            );
            controller
                .submit(job, Utf8Path::new(SCRIPT_FILE_NAME))
                .await?;
            controller.poll(job).await?
        };

        let job_id = job
            .scheduler_job_id()
            .ok_or(PhaseError::NotSubmitted)?
            .to_string();
        if outcome == PollOutcome::Aborted {
            return Ok(Outcome::Aborted { job_id });
        }

        let elapsed = job
            .elapsed()
            .map(|d| format_duration(d.num_seconds().max(0) as u64));
        self.reporter
            .summary(job.resource_usage(), elapsed.as_deref());

        job.advance(Phase::Collecting)?;
        let collector = OutputCollector::new(
            self.settings.work_dir.clone(),
            self.settings.log_dir(),
            self.settings.artifacts.clone(),
            self.cancel.clone(),
        );
        let output = match collector.collect(&job.project_name, &job_id).await {
            Ok(output) => output,
            Err(e) => {
                self.reporter.error(&e.to_string());
                job.fail();
                return Err(e.into());
            }
        };
        self.reporter.output(&output);
        job.advance(Phase::Done)?;

        Ok(Outcome::Completed(RunSummary {
            job_id,
            resource_usage: job.resource_usage().map(str::to_string),
            output,
        }))
    }

    async fn compile(&mut self, project: &Project, job: &mut Job) -> Result<(), RunError> {
        self.reporter.step_started("Compile source");
        match BuildStep::new(&self.settings.build).run(project).await {
            Ok(_) => {
                self.reporter.step_finished(true);
                Ok(())
            }
            Err(e) => {
                self.reporter.step_finished(false);
                self.reporter.command_failed(&e);
                job.fail();
                Err(RunError::Build(e))
            }
        }
    }

    fn make_script(&mut self, project: &Project, job: &mut Job) -> Result<(), RunError> {
        self.reporter.step_started("Make submit command");
        let vars = ScriptVars {
            exe_path: project.executable_path().into_string(),
            job_name: job.project_name.clone(),
            nodes: job.node_count,
            processes: job.process_count,
            input_args: job.input_args.clone(),
        };
        let result = write_script(
            &self.settings.template_path(),
            &self.settings.script_path(),
            &vars,
        );
        match result {
            Ok(()) => {
                self.reporter.step_finished(true);
                Ok(())
            }
            Err(e) => {
                self.reporter.step_finished(false);
                self.reporter.error(&e.to_string());
                job.fail();
                Err(e.into())
            }
        }
    }
}
