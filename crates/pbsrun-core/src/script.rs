//! Job script generation from the user's template.

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[A-Z][A-Z_]*%").expect("placeholder pattern is valid"));

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read template {path}")]
    ReadTemplate {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write job script {path}")]
    WriteScript {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Values substituted into the template.
#[derive(Debug, Clone)]
pub struct ScriptVars {
    pub exe_path: String,
    pub job_name: String,
    pub nodes: u32,
    pub processes: u32,
    pub input_args: Vec<String>,
}

/// Substitute `%EXE_PATH%`, `%JOB_NAME%`, `%NODES%`, `%PROCESSES%` and
/// `%INPUTARGS%` verbatim.
pub fn render_script(template: &str, vars: &ScriptVars) -> String {
    template
        .replace("%EXE_PATH%", &vars.exe_path)
        .replace("%JOB_NAME%", &vars.job_name)
        .replace("%NODES%", &vars.nodes.to_string())
        .replace("%PROCESSES%", &vars.processes.to_string())
        .replace("%INPUTARGS%", &vars.input_args.join(" "))
}

/// Placeholder-looking tokens left in a rendered script.
pub fn unresolved_placeholders(script: &str) -> Vec<&str> {
    PLACEHOLDER.find_iter(script).map(|m| m.as_str()).collect()
}

/// Render `template_path` into `script_path`.
pub fn write_script(
    template_path: &Utf8Path,
    script_path: &Utf8Path,
    vars: &ScriptVars,
) -> Result<(), ScriptError> {
    let template = fs::read_to_string(template_path).map_err(|source| ScriptError::ReadTemplate {
        path: template_path.to_path_buf(),
        source,
    })?;

    let script = render_script(&template, vars);
    for token in unresolved_placeholders(&script) {
        tracing::warn!(%token, template = %template_path, "unresolved template placeholder");
    }

    fs::write(script_path, script).map_err(|source| ScriptError::WriteScript {
        path: script_path.to_path_buf(),
        source,
    })?;
    tracing::debug!(script = %script_path, "job script written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE: &str = "\
#!/bin/bash
#PBS -N %JOB_NAME%
#PBS -l nodes=%NODES%:ppn=%PROCESSES%
mpirun %EXE_PATH% %INPUTARGS%
";

    fn vars() -> ScriptVars {
        ScriptVars {
            exe_path: "/x/run".to_string(),
            job_name: "demo".to_string(),
            nodes: 2,
            processes: 4,
            input_args: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[test]
    fn test_render_replaces_every_placeholder_once() {
        let script = render_script(TEMPLATE, &vars());
        for token in ["%EXE_PATH%", "%JOB_NAME%", "%NODES%", "%PROCESSES%", "%INPUTARGS%"] {
            assert!(!script.contains(token), "{token} left in script");
        }
        for value in ["/x/run", "demo", "2", "4", "a b"] {
            assert_eq!(script.matches(value).count(), 1, "value {value}");
        }
        assert!(unresolved_placeholders(&script).is_empty());
    }

    #[test]
    fn test_unresolved_placeholders() {
        let script = render_script("%JOB_NAME% %QUEUE% 50%", &vars());
        assert_eq!(unresolved_placeholders(&script), vec!["%QUEUE%"]);
    }

    #[test]
    fn test_write_script() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        let template = dir.join("sub_template.sh");
        let script = dir.join("cur_sub.sh");
        fs::write(&template, TEMPLATE).unwrap();

        write_script(&template, &script, &vars()).unwrap();
        let contents = fs::read_to_string(&script).unwrap();
        assert!(contents.contains("mpirun /x/run a b"));
    }

    #[test]
    fn test_write_script_missing_template() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        let err = write_script(&dir.join("missing.sh"), &dir.join("out.sh"), &vars()).unwrap_err();
        assert!(matches!(err, ScriptError::ReadTemplate { .. }));
    }
}
