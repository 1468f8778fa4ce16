//! Seeding of default checks at startup.
//!
//! The discovery heuristics that decide *what* to seed (default gateway
//! detection, managed service scans) are external producers of check
//! definitions; the engine only offers the hook they plug into.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::monitor::store::{CheckStore, StoreError};
use crate::monitor::types::CheckConfig;

/// Invoked once from `Scheduler::start`, before the first reconciliation.
#[async_trait]
pub trait CheckSeeder: Send + Sync {
    /// Returns the number of checks newly created.
    async fn seed(&self, store: &dyn CheckStore) -> Result<usize, StoreError>;
}

pub struct NoopSeeder;

#[async_trait]
impl CheckSeeder for NoopSeeder {
    async fn seed(&self, _store: &dyn CheckStore) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// Seeds checks from a JSON array on disk. Existing ids are left untouched,
/// so user edits survive restarts.
pub struct FileSeeder {
    path: std::path::PathBuf,
}

impl FileSeeder {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CheckSeeder for FileSeeder {
    async fn seed(&self, store: &dyn CheckStore) -> Result<usize, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Seed file not found; skipping.");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };
        let seeds: Vec<CheckConfig> = serde_json::from_slice(&bytes)?;

        let existing: std::collections::HashSet<String> =
            store.list_checks().await.into_iter().map(|c| c.id).collect();

        let mut created = 0;
        for check in seeds {
            if existing.contains(&check.id) {
                continue;
            }
            store.save_check(&check).await?;
            created += 1;
        }
        if created > 0 {
            info!(count = created, "Seeded default checks.");
        }
        Ok(created)
    }
}
