//! Projects available under the configured source directory.

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ProjectError {
    #[error("Cannot read source directory {path}")]
    #[diagnostic(help("configure the source folder with `pbsrun setSource /path/of/your/sources`"))]
    SourceDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Project {0} does not exist")]
    NotFound(String),
}

/// A compilable project: `<source_dir>/<name>/<name>.c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub dir: Utf8PathBuf,
}

impl Project {
    pub fn new(source_dir: &Utf8Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            dir: source_dir.join(&name),
            name,
        }
    }

    /// Source file name, relative to the project directory.
    pub fn source_file(&self) -> String {
        format!("{}.c", self.name)
    }

    /// Executable name, relative to the project directory.
    pub fn executable_name(&self) -> String {
        format!("{}.run", self.name)
    }

    pub fn executable_path(&self) -> Utf8PathBuf {
        self.dir.join(self.executable_name())
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }
}

/// List project names under `source_dir`, sorted.
pub fn list_projects(source_dir: &Utf8Path) -> Result<Vec<String>, ProjectError> {
    let to_err = |source| ProjectError::SourceDir {
        path: source_dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in source_dir.read_dir_utf8().map_err(to_err)? {
        let entry = entry.map_err(to_err)?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            names.push(entry.file_name().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Resolve a project by index into `projects` or by name.
///
/// Names are checked against the filesystem, so a project created after
/// listing still resolves.
pub fn resolve_project(
    source_dir: &Utf8Path,
    projects: &[String],
    selector: &str,
) -> Result<Project, ProjectError> {
    if let Ok(index) = selector.parse::<usize>()
        && let Some(name) = projects.get(index)
    {
        return Ok(Project::new(source_dir, name.as_str()));
    }

    let project = Project::new(source_dir, selector);
    if selector.is_empty() || selector.contains('/') || !project.exists() {
        return Err(ProjectError::NotFound(selector.to_string()));
    }
    Ok(project)
}
