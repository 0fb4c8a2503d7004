//! pbsrun - compile an MPI project and follow it through a PBS queue.

mod logging;
mod shutdown;

use camino::Utf8Path;
use clap::Parser;
use miette::{miette, IntoDiagnostic, Result};
use pbsrun_cli::{Args, Command};
use pbsrun_console::{clear_screen, ConsoleReporter};
use pbsrun_core::settings::{default_config_path, set_source_dir};
use pbsrun_core::{
    list_projects, resolve_project, Job, Outcome, Pipeline, Reporter, RunError, Settings,
    SettingsError,
};
use pbsrun_pbs::PbsGateway;

/// Exit status when the source directory cannot be used.
const EXIT_NO_SOURCES: i32 = -1;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Command::SetSource(dir) = args.command() {
        let dir = dir.ok_or_else(|| miette!("usage: pbsrun setSource /path/of/your/sources"))?;
        return set_source(&args, Utf8Path::new(dir));
    }

    let settings = Settings::load(args.config.as_deref())?;
    let projects = match settings
        .source_dir()
        .map_err(miette::Report::new)
        .and_then(|dir| list_projects(dir).map_err(miette::Report::new))
    {
        Ok(projects) => projects,
        Err(report) => {
            eprintln!("{report:?}");
            std::process::exit(EXIT_NO_SOURCES);
        }
    };
    let source_dir = settings.source_dir()?;

    let mut reporter = ConsoleReporter::stdout();
    let Command::Run(selector) = args.command() else {
        reporter.projects(&projects);
        return Ok(());
    };

    let project = match resolve_project(source_dir, &projects, selector) {
        Ok(project) => project,
        Err(e) => {
            reporter.start();
            reporter.error(&e.to_string());
            return Ok(());
        }
    };

    let cancel = shutdown::install_interrupt_handler();
    clear_screen(&mut std::io::stdout()).into_diagnostic()?;
    reporter.start();

    let gateway = PbsGateway::new(
        &settings.scheduler.submit,
        &settings.scheduler.status,
        &settings.scheduler.cancel,
    )
    .with_work_dir(settings.work_dir.as_std_path());
    let mut job = Job::new(
        project.name.clone(),
        args.nodes,
        args.processes,
        args.input_args.clone(),
    );

    let result = Pipeline::new(&settings, &gateway, &mut reporter, cancel)
        .run(&project, &mut job)
        .await;

    match result {
        Ok(Outcome::Completed(summary)) => {
            tracing::info!(job_id = %summary.job_id, phase = ?job.phase(), "run completed");
        }
        Ok(Outcome::Aborted { job_id }) => {
            tracing::info!(%job_id, "run aborted");
        }
        Err(e) => {
            tracing::warn!(error = ?e, phase = ?job.phase(), "run failed");
            if matches!(e, RunError::PollTimeout { .. } | RunError::Phase(_)) {
                reporter.error(&e.to_string());
            }
        }
    }

    Ok(())
}

fn set_source(args: &Args, dir: &Utf8Path) -> Result<()> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path().ok_or(SettingsError::NoConfigDir)?,
    };
    set_source_dir(&config_path, dir)?;
    println!("Source directory set to {dir} in {config_path}");
    Ok(())
}
