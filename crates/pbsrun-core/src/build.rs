//! Compile a project before it is submitted.

use crate::project::Project;
use crate::settings::BuildSettings;
use pbsrun_parsers::{run_command, CommandError, CommandResult};
use tokio::process::Command;

/// One compiler invocation: `<compiler> P.c <flags> -o P.run` inside the project dir.
#[derive(Debug, Clone)]
pub struct BuildStep {
    compiler: String,
    flags: Vec<String>,
}

impl BuildStep {
    pub fn new(settings: &BuildSettings) -> Self {
        Self {
            compiler: settings.compiler.clone(),
            flags: settings.flags.clone(),
        }
    }

    fn command(&self, project: &Project) -> Command {
        let mut cmd = Command::new(&self.compiler);
        cmd.arg(project.source_file())
            .args(&self.flags)
            .arg("-o")
            .arg(project.executable_name())
            .current_dir(&project.dir);
        cmd
    }

    /// Run the compiler. Any non-zero exit is a build failure.
    pub async fn run(&self, project: &Project) -> Result<CommandResult, CommandError> {
        run_command(&mut self.command(project)).await
    }
}
