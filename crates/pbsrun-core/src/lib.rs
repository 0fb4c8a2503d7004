//! Job lifecycle for pbsrun.
//!
//! Compiles a project, renders its job script, submits it to PBS,
//! follows it through the queue and collects its output.

pub mod build;
pub mod collect;
pub mod error;
pub mod job;
pub mod lifecycle;
pub mod pipeline;
pub mod project;
pub mod report;
pub mod script;
pub mod settings;

#[cfg(test)]
mod testing;

pub use collect::{CollectError, CollectedOutput, OutputCollector};
pub use error::RunError;
pub use job::{Job, Phase, PhaseError};
pub use lifecycle::{JobController, PollOutcome};
pub use pipeline::{Outcome, Pipeline, RunSummary};
pub use project::{list_projects, resolve_project, Project, ProjectError};
pub use report::{Reporter, StatusLine, SPINNER_FRAMES};
pub use settings::{Settings, SettingsError};
