//! Collect the job's stdout/stderr files once it has left the queue.
//!
//! PBS copies `<name>.o<id>` and `<name>.e<id>` into the submission
//! directory some time after the job disappears from qstat, so the files
//! are polled for with exponential backoff before being moved into the
//! log directory and read back.

use crate::settings::ArtifactSettings;
use camino::{Utf8Path, Utf8PathBuf};
use pbsrun_pbs::job_id_prefix;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Failed to create log directory {path}")]
    LogDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Output files did not appear within {}s: {}", .waited.as_secs(), join_paths(.missing))]
    Timeout {
        missing: Vec<Utf8PathBuf>,
        waited: Duration,
    },
    #[error("Interrupted while waiting for output files")]
    Interrupted,
    #[error("Failed to move {from} to {to}")]
    Move {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_paths(paths: &[Utf8PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Output of a finished job, after relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedOutput {
    pub stdout_path: Utf8PathBuf,
    pub stderr_path: Utf8PathBuf,
    pub stdout: String,
    pub stderr: String,
}

/// File names PBS uses for a job's output: `<project>.o<id>` and `<project>.e<id>`.
pub fn artifact_names(project_name: &str, job_id: &str) -> (String, String) {
    let prefix = job_id_prefix(job_id);
    (
        format!("{project_name}.o{prefix}"),
        format!("{project_name}.e{prefix}"),
    )
}

/// Moves job output from the submission directory into the log directory.
#[derive(Debug, Clone)]
pub struct OutputCollector {
    work_dir: Utf8PathBuf,
    log_dir: Utf8PathBuf,
    settings: ArtifactSettings,
    cancel: CancellationToken,
}

impl OutputCollector {
    /// Waits end early with [`CollectError::Interrupted`] once `cancel` fires.
    pub fn new(
        work_dir: Utf8PathBuf,
        log_dir: Utf8PathBuf,
        settings: ArtifactSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            work_dir,
            log_dir,
            settings,
            cancel,
        }
    }

    pub fn log_dir(&self) -> &Utf8Path {
        &self.log_dir
    }

    /// Create the log directory. An existing directory is left untouched.
    pub async fn ensure_log_dir(&self) -> Result<(), CollectError> {
        fs::create_dir_all(&self.log_dir)
            .await
            .map_err(|source| CollectError::LogDir {
                path: self.log_dir.clone(),
                source,
            })
    }

    async fn missing(paths: &[Utf8PathBuf]) -> Vec<Utf8PathBuf> {
        let mut missing = Vec::new();
        for path in paths {
            if !fs::try_exists(path).await.unwrap_or(false) {
                missing.push(path.clone());
            }
        }
        missing
    }

    /// Wait until every path exists, then let writers settle.
    pub async fn wait_for(&self, paths: &[Utf8PathBuf]) -> Result<(), CollectError> {
        let timeout = Duration::from_secs(self.settings.timeout_secs);
        let max_delay = Duration::from_millis(self.settings.max_delay_ms);
        let mut delay = Duration::from_millis(self.settings.initial_delay_ms);
        let started = Instant::now();

        loop {
            let missing = Self::missing(paths).await;
            if missing.is_empty() {
                break;
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(CollectError::Timeout { missing, waited });
            }
            tracing::debug!(missing = %join_paths(&missing), ?delay, "waiting for output files");
            self.sleep(delay.min(timeout - waited)).await?;
            delay = (delay * 2).min(max_delay);
        }

        self.sleep(Duration::from_millis(self.settings.settle_ms)).await
    }

    async fn sleep(&self, duration: Duration) -> Result<(), CollectError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::info!("output wait interrupted");
                Err(CollectError::Interrupted)
            }
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Wait for, relocate and read a job's output files.
    pub async fn collect(
        &self,
        project_name: &str,
        job_id: &str,
    ) -> Result<CollectedOutput, CollectError> {
        let (stdout_name, stderr_name) = artifact_names(project_name, job_id);
        let sources = [
            self.work_dir.join(&stdout_name),
            self.work_dir.join(&stderr_name),
        ];

        self.ensure_log_dir().await?;
        self.wait_for(&sources).await?;

        let stdout_path = self.log_dir.join(&stdout_name);
        let stderr_path = self.log_dir.join(&stderr_name);
        move_file(&sources[0], &stdout_path).await?;
        move_file(&sources[1], &stderr_path).await?;
        tracing::info!(log_dir = %self.log_dir, "output files moved");

        Ok(CollectedOutput {
            stdout: read(&stdout_path).await?,
            stderr: read(&stderr_path).await?,
            stdout_path,
            stderr_path,
        })
    }
}

/// Rename, falling back to copy and delete across filesystems.
async fn move_file(from: &Utf8Path, to: &Utf8Path) -> Result<(), CollectError> {
    let to_err = |source| CollectError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if let Err(e) = fs::rename(from, to).await {
        tracing::debug!(%from, %to, error = %e, "rename failed, copying instead");
        fs::copy(from, to).await.map_err(to_err)?;
        fs::remove_file(from).await.map_err(to_err)?;
    }
    Ok(())
}

async fn read(path: &Utf8Path) -> Result<String, CollectError> {
    let bytes = fs::read(path).await.map_err(|source| CollectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
