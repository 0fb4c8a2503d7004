//! CLI argument parsing for pbsrun.

use camino::Utf8PathBuf;
use clap::Parser;

/// Pseudo-project that lists the available projects.
pub const LIST_COMMAND: &str = "getList";
/// Pseudo-project that stores the source directory in the config file.
pub const SET_SOURCE_COMMAND: &str = "setSource";

#[derive(Parser, Debug)]
#[command(name = "pbsrun")]
#[command(about = "Compile an MPI project and run it on a PBS cluster")]
#[command(after_help = "Use `pbsrun getList` to see your projects and \
`pbsrun setSource /path/of/your/sources` to change the source directory.")]
pub struct Args {
    /// Project name or number, or one of getList / setSource
    pub project: String,

    /// Arguments passed to the project executable
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub input_args: Vec<String>,

    /// Number of nodes needed
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u32).range(1..))]
    pub nodes: u32,

    /// Number of processes per node
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub processes: u32,

    /// Settings file (default: <config dir>/pbsrun/pbsrun.toml)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Log debug events to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the positional arguments ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    List,
    SetSource(Option<&'a str>),
    Run(&'a str),
}

impl Args {
    pub fn command(&self) -> Command<'_> {
        match self.project.as_str() {
            LIST_COMMAND => Command::List,
            SET_SOURCE_COMMAND => Command::SetSource(self.input_args.first().map(String::as_str)),
            project => Command::Run(project),
        }
    }
}
