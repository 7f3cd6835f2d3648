// ── Backup orchestration ──
//
// One run, in order, without rollback:
//   1. platform export      (best-effort by default)
//   2. endpoint resolution  (aborts by default)
//   3. stack enumeration    (aborts by default)
//   4. per-stack extraction (always isolated per stack)
//   5. retention cleanup    (when configured; failures only warn)

use std::path::PathBuf;
use std::time::{Instant, SystemTime};

use chrono::{Local, NaiveDate};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use stackvault_api::PlatformClient;
use tracing::{error, info, warn};

use crate::config::BackupConfig;
use crate::endpoints::resolve_endpoints;
use crate::error::CoreError;
use crate::extract::extract_stack;
use crate::model::{EndpointDirectory, Stack, StackArtifact};
use crate::policy::{OnFailure, Step};
use crate::retention;
use crate::stacks::list_stacks;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Run layout ───────────────────────────────────────────────────────

/// Where one run writes. Runs on the same day share a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRun {
    pub date: NaiveDate,
    pub output_root: PathBuf,
}

impl BackupRun {
    pub fn new(output_root: impl Into<PathBuf>, date: NaiveDate) -> Self {
        Self {
            date,
            output_root: output_root.into(),
        }
    }

    /// A run dated with the local calendar day.
    pub fn today(output_root: impl Into<PathBuf>) -> Self {
        Self::new(output_root, Local::now().date_naive())
    }

    pub fn date_label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// `<root>/<YYYY-MM-DD>`
    pub fn dir(&self) -> PathBuf {
        self.output_root.join(self.date_label())
    }

    /// `<root>/<YYYY-MM-DD>/portainer-backup_<YYYY-MM-DD>.tar.gz`
    pub fn archive_path(&self) -> PathBuf {
        self.dir()
            .join(format!("portainer-backup_{}.tar.gz", self.date_label()))
    }
}

// ── Run report ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum PlatformBackupOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Failed { error: String },
}

/// Result of extracting one stack.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum StackOutcome {
    Saved(StackArtifact),
    /// Local write failure; the run carried on with the next stack.
    Failed {
        stack_id: i64,
        stack_name: String,
        endpoint: String,
        error: String,
    },
}

impl StackOutcome {
    pub fn stack_id(&self) -> i64 {
        match self {
            Self::Saved(artifact) => artifact.stack_id,
            Self::Failed { stack_id, .. } => *stack_id,
        }
    }
}

/// Everything a finished run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub date: String,
    pub platform_backup: PlatformBackupOutcome,
    pub endpoint_count: usize,
    /// Ordered by stack id.
    pub stacks: Vec<StackOutcome>,
    /// Run directories deleted by retention cleanup.
    pub removed: Vec<PathBuf>,
    pub cleanup_error: Option<String>,
    pub elapsed_secs: f64,
}

impl RunReport {
    pub fn saved_count(&self) -> usize {
        self.stacks
            .iter()
            .filter(|o| matches!(o, StackOutcome::Saved(_)))
            .count()
    }

    /// Stacks whose compose file was written.
    pub fn content_count(&self) -> usize {
        self.stacks
            .iter()
            .filter(|o| matches!(o, StackOutcome::Saved(a) if a.has_content()))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.stacks.len() - self.saved_count()
    }

    pub fn platform_backup_saved(&self) -> bool {
        matches!(self.platform_backup, PlatformBackupOutcome::Saved { .. })
    }
}

// ── Service ──────────────────────────────────────────────────────────

/// Runs backups against one platform.
pub struct BackupService {
    client: PlatformClient,
    config: BackupConfig,
}

impl BackupService {
    /// Validate the config and build the HTTP client.
    pub fn new(config: BackupConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let client =
            PlatformClient::from_api_key(config.url.as_str(), &config.api_key, &config.transport())?;
        Ok(Self { client, config })
    }

    /// Use a pre-built client (tests, custom transports).
    pub fn with_client(client: PlatformClient, config: BackupConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    pub fn client(&self) -> &PlatformClient {
        &self.client
    }

    /// Run a backup dated today under the configured output directory.
    pub async fn run(&self) -> Result<RunReport, CoreError> {
        self.run_at(&BackupRun::today(&self.config.output_dir)).await
    }

    /// Run a backup into the given run layout.
    pub async fn run_at(&self, run: &BackupRun) -> Result<RunReport, CoreError> {
        let started = Instant::now();
        let run_dir = run.dir();
        tokio::fs::create_dir_all(&run_dir)
            .await
            .map_err(|e| CoreError::io(&run_dir, e))?;
        info!(dir = %run_dir.display(), "starting backup run");

        let platform_backup = self.platform_backup(run).await?;
        let directory = self.endpoints().await?;
        let stacks = self.stacks().await?;
        let outcomes = self.extract_all(&stacks, &directory, &run_dir).await;

        let (removed, cleanup_error) = if let Some(policy) = self.config.retention {
            let now = SystemTime::now();
            match retention::clean(&run.output_root, policy, now, Some(&run_dir), false).await {
                Ok(removed) => (removed, None),
                Err(e) => {
                    warn!(error = %e, "retention cleanup failed");
                    (Vec::new(), Some(e.to_string()))
                }
            }
        } else {
            (Vec::new(), None)
        };

        let report = RunReport {
            run_dir,
            date: run.date_label(),
            platform_backup,
            endpoint_count: directory.len(),
            stacks: outcomes,
            removed,
            cleanup_error,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        info!(
            stacks = report.stacks.len(),
            with_content = report.content_count(),
            failed = report.failed_count(),
            removed = report.removed.len(),
            "backup run finished"
        );
        Ok(report)
    }

    /// Resolve endpoints, applying the failure policy.
    pub async fn endpoints(&self) -> Result<EndpointDirectory, CoreError> {
        match resolve_endpoints(&self.client).await {
            Ok(directory) => Ok(directory),
            Err(e) => {
                self.step_failed(Step::ResolveEndpoints, e)?;
                Ok(EndpointDirectory::default())
            }
        }
    }

    /// Enumerate stacks, applying the failure policy.
    pub async fn stacks(&self) -> Result<Vec<Stack>, CoreError> {
        match list_stacks(&self.client).await {
            Ok(stacks) => Ok(stacks),
            Err(e) => {
                self.step_failed(Step::ListStacks, e)?;
                Ok(Vec::new())
            }
        }
    }

    // ── Steps ────────────────────────────────────────────────────────

    async fn platform_backup(&self, run: &BackupRun) -> Result<PlatformBackupOutcome, CoreError> {
        let path = run.archive_path();
        info!(path = %path.display(), "requesting platform backup");

        match self
            .client
            .download_backup(self.config.backup_password.as_ref(), &path)
            .await
        {
            Ok(bytes) => {
                info!(bytes, path = %path.display(), "saved platform backup");
                Ok(PlatformBackupOutcome::Saved { path, bytes })
            }
            Err(e) => {
                let message = e.to_string();
                self.step_failed(Step::PlatformBackup, e)?;
                Ok(PlatformBackupOutcome::Failed { error: message })
            }
        }
    }

    async fn extract_all(
        &self,
        stacks: &[Stack],
        directory: &EndpointDirectory,
        run_dir: &std::path::Path,
    ) -> Vec<StackOutcome> {
        let client = &self.client;

        let mut outcomes: Vec<StackOutcome> = stream::iter(stacks)
            .map(|stack| async move {
                let endpoint = directory.name_for(stack.endpoint_id);
                match extract_stack(client, stack, &endpoint, run_dir).await {
                    Ok(artifact) => StackOutcome::Saved(artifact),
                    Err(e) => {
                        warn!(stack = %stack.name, id = stack.id, error = %e, "failed to save stack");
                        StackOutcome::Failed {
                            stack_id: stack.id,
                            stack_name: stack.name.clone(),
                            endpoint: endpoint.into_owned(),
                            error: e.to_string(),
                        }
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        outcomes.sort_by_key(StackOutcome::stack_id);
        outcomes
    }

    /// Log a failed step and turn it into an error if the policy says abort.
    fn step_failed(&self, step: Step, err: stackvault_api::Error) -> Result<(), CoreError> {
        match self.config.failure_policy.on_failure(step) {
            OnFailure::Warn => {
                warn!(%step, error = %err, "step failed, continuing");
                Ok(())
            }
            OnFailure::Abort => {
                error!(%step, error = %err, "step failed, aborting run");
                Err(CoreError::Step { step, source: err })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn run_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let run = BackupRun::new("/backups", date);
        assert_eq!(run.dir(), PathBuf::from("/backups/2024-03-09"));
        assert_eq!(
            run.archive_path(),
            PathBuf::from("/backups/2024-03-09/portainer-backup_2024-03-09.tar.gz")
        );
    }
}
