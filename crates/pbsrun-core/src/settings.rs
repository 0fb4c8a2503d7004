//! User settings loaded from `pbsrun.toml`.

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use thiserror::Error;

const APP_DIR_NAME: &str = "pbsrun";
const CONFIG_FILE_NAME: &str = "pbsrun.toml";
const TEMPLATE_FILE_NAME: &str = "sub_template.sh";
/// Rendered job script, submitted from `work_dir`.
pub const SCRIPT_FILE_NAME: &str = "cur_sub.sh";

#[derive(Error, Debug, Diagnostic)]
pub enum SettingsError {
    #[error("Config file not found at {0}")]
    #[diagnostic(help("create the file or drop --config to use the default location"))]
    NotFound(Utf8PathBuf),
    #[error("Failed to read config file {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to write config file {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("No source directory configured")]
    #[diagnostic(help("set one with `pbsrun setSource /path/of/your/sources`"))]
    NoSourceDir,
    #[error("Could not determine the user config directory")]
    NoConfigDir,
}

/// Compiler invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub compiler: String,
    pub flags: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            compiler: "mpicc".to_string(),
            flags: vec!["-O3".to_string()],
        }
    }
}

/// Scheduler program names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub submit: String,
    pub status: String,
    pub cancel: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            submit: "qsub".to_string(),
            status: "qstat".to_string(),
            cancel: "qdel".to_string(),
        }
    }
}

/// Queue polling behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Delay between qstat calls
    pub interval_ms: u64,
    /// Give up waiting on the queue after this long (unset waits forever)
    pub max_wait_secs: Option<u64>,
    /// Consecutive listings without the job before it counts as gone
    pub missing_polls: u32,
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: 150,
            max_wait_secs: None,
            missing_polls: 2,
        }
    }
}

/// Waiting for the job's output files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactSettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub timeout_secs: u64,
    /// Pause after both files appear, before moving them
    pub settle_ms: u64,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 2000,
            timeout_secs: 120,
            settle_ms: 1500,
        }
    }
}

/// Settings for one run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Project root; every sub-directory is a project
    pub source_dir: Option<Utf8PathBuf>,
    /// Job script template
    pub template: Option<Utf8PathBuf>,
    /// Where the job is submitted from and its output files appear
    pub work_dir: Utf8PathBuf,
    /// Collected output directory, relative to `work_dir`
    pub log_dir: Utf8PathBuf,
    pub build: BuildSettings,
    pub scheduler: SchedulerSettings,
    pub polling: PollingSettings,
    pub artifacts: ArtifactSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_dir: None,
            template: None,
            work_dir: Utf8PathBuf::from("."),
            log_dir: Utf8PathBuf::from("log"),
            build: BuildSettings::default(),
            scheduler: SchedulerSettings::default(),
            polling: PollingSettings::default(),
            artifacts: ArtifactSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, SettingsError> {
        let (path, required) = match path {
            Some(p) => (Some(expand(p)), true),
            None => (default_config_path(), false),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            if required {
                return Err(SettingsError::NotFound(path));
            }
            tracing::debug!(%path, "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| SettingsError::Parse { path, source })
    }

    /// Parse settings from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Self = toml::from_str(contents)?;
        settings.source_dir = settings.source_dir.as_deref().map(expand);
        settings.template = settings.template.as_deref().map(expand);
        settings.work_dir = expand(&settings.work_dir);
        Ok(settings)
    }

    pub fn source_dir(&self) -> Result<&Utf8Path, SettingsError> {
        self.source_dir.as_deref().ok_or(SettingsError::NoSourceDir)
    }

    /// Template path, defaulting to `sub_template.sh` next to the config file.
    pub fn template_path(&self) -> Utf8PathBuf {
        match &self.template {
            Some(path) => path.clone(),
            None => default_config_dir()
                .map(|dir| dir.join(TEMPLATE_FILE_NAME))
                .unwrap_or_else(|| Utf8PathBuf::from(TEMPLATE_FILE_NAME)),
        }
    }

    /// Rendered job script location.
    pub fn script_path(&self) -> Utf8PathBuf {
        self.work_dir.join(SCRIPT_FILE_NAME)
    }

    pub fn log_dir(&self) -> Utf8PathBuf {
        self.work_dir.join(&self.log_dir)
    }
}

/// Write `source_dir` into the config file, keeping every other key.
pub fn set_source_dir(config_path: &Utf8Path, source_dir: &Utf8Path) -> Result<(), SettingsError> {
    let mut table = if config_path.exists() {
        let contents = fs::read_to_string(config_path).map_err(|source| SettingsError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str::<toml::Table>(&contents).map_err(|source| SettingsError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?
    } else {
        toml::Table::new()
    };

    table.insert(
        "source_dir".to_string(),
        toml::Value::String(source_dir.to_string()),
    );

    let write_err = |source| SettingsError::Write {
        path: config_path.to_path_buf(),
        source,
    };
    if let Some(parent) = config_path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(config_path, toml::to_string_pretty(&table)?).map_err(write_err)?;
    Ok(())
}

pub fn default_config_dir() -> Option<Utf8PathBuf> {
    dirs::config_dir()
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .map(|dir| dir.join(APP_DIR_NAME))
}

pub fn default_config_path() -> Option<Utf8PathBuf> {
    default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn expand(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(shellexpand::tilde(path.as_str()).as_ref())
}
