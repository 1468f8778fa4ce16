//! Durable state: check definitions and per-check result history as JSON
//! files under a data directory.
//!
//! Configuration writes (`save_check`/`delete_check`) surface I/O errors to
//! the caller. Telemetry writes (`save_result`) never do: a monitoring loop
//! must keep ticking through a full disk or a bad mount, so those failures
//! are logged and dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use super::types::{CheckConfig, CheckConfigError, CheckResult};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidConfig(#[from] CheckConfigError),
}

/// Persistence contract for check definitions and result history.
#[async_trait]
pub trait CheckStore: Send + Sync {
    async fn list_checks(&self) -> Vec<CheckConfig>;
    /// Upsert by id. Rejects invalid definitions so the scheduler can assume
    /// well-formed input.
    async fn save_check(&self, check: &CheckConfig) -> Result<(), StoreError>;
    /// Removes the definition and its result history.
    ///
    /// An in-flight tick that started before the deletion may complete and
    /// recreate the result file afterwards. Such an orphan holds at most one
    /// tick's worth of data and is inert: nothing schedules or reads a
    /// deleted check id again.
    async fn delete_check(&self, id: &str) -> Result<(), StoreError>;
    /// Append-then-prune. Infallible by contract; failures are logged.
    async fn save_result(&self, result: &CheckResult);
    /// Result history, newest first. A read failure degrades to "no history".
    async fn get_results(&self, check_id: &str) -> Vec<CheckResult>;
    async fn get_last_result(&self, check_id: &str) -> Option<CheckResult> {
        self.get_results(check_id).await.into_iter().next()
    }
}

/// [`CheckStore`] backed by `<data_dir>/checks.json` and
/// `<data_dir>/results/<check_id>.json`.
pub struct JsonFileStore {
    data_dir: PathBuf,
    retention: Duration,
    // Serializes read-modify-write cycles on checks.json. Result files are
    // keyed per check id and need no cross-check lock.
    checks_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>, retention_days: i64) -> Result<Arc<Self>, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(data_dir.join("results"))?;
        Ok(Arc::new(Self {
            data_dir,
            retention: Duration::days(retention_days),
            checks_lock: Mutex::new(()),
        }))
    }

    fn checks_path(&self) -> PathBuf {
        self.data_dir.join("checks.json")
    }

    fn results_path(&self, check_id: &str) -> PathBuf {
        let safe_id = check_id.replace(['/', '\\'], "_");
        self.data_dir.join("results").join(format!("{safe_id}.json"))
    }

    async fn read_array<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Vec<T> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read store file; treating as empty.");
                return Vec::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse store file; treating as empty.");
                Vec::new()
            }
        }
    }

    async fn write_array<T: serde::Serialize>(
        &self,
        path: &Path,
        items: &[T],
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(items)?;
        // Write-then-rename so a crash mid-write never truncates the file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl CheckStore for JsonFileStore {
    async fn list_checks(&self) -> Vec<CheckConfig> {
        self.read_array(&self.checks_path()).await
    }

    async fn save_check(&self, check: &CheckConfig) -> Result<(), StoreError> {
        check.validate()?;
        let _guard = self.checks_lock.lock().await;
        let mut checks: Vec<CheckConfig> = self.read_array(&self.checks_path()).await;
        match checks.iter_mut().find(|c| c.id == check.id) {
            Some(existing) => *existing = check.clone(),
            None => checks.push(check.clone()),
        }
        self.write_array(&self.checks_path(), &checks).await
    }

    async fn delete_check(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.checks_lock.lock().await;
        let mut checks: Vec<CheckConfig> = self.read_array(&self.checks_path()).await;
        checks.retain(|c| c.id != id);
        self.write_array(&self.checks_path(), &checks).await?;
        match tokio::fs::remove_file(self.results_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_result(&self, result: &CheckResult) {
        let path = self.results_path(&result.check_id);
        let mut results: Vec<CheckResult> = self.read_array(&path).await;
        results.insert(0, result.clone());
        let cutoff = Utc::now() - self.retention;
        results.retain(|r| r.timestamp > cutoff);
        // Overlapping ticks of the same check can interleave writes; the
        // newest-first ordering consumers rely on comes from the timestamp,
        // not from write order.
        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Err(e) = self.write_array(&path, &results).await {
            warn!(check_id = %result.check_id, error = %e, "Failed to persist check result.");
        }
    }

    async fn get_results(&self, check_id: &str) -> Vec<CheckResult> {
        self.read_array(&self.results_path(check_id)).await
    }
}
