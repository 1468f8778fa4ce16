//! Uniform probe execution: dispatch, timing, persistence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;

use crate::probes::{ProbeOutcome, ProbeRegistry};

use super::store::CheckStore;
use super::types::{CheckConfig, CheckResult, CheckStatus};

/// Runs one check to completion and records the outcome.
///
/// `run` has no error channel on purpose: every way a probe can go wrong is
/// folded into a `fail` result, so the scheduler can tick any check without
/// per-call error handling.
pub struct CheckRunner {
    registry: ProbeRegistry,
    store: Arc<dyn CheckStore>,
    probe_timeout: Duration,
}

impl CheckRunner {
    pub fn new(registry: ProbeRegistry, store: Arc<dyn CheckStore>, probe_timeout: Duration) -> Self {
        Self {
            registry,
            store,
            probe_timeout,
        }
    }

    pub async fn run(&self, check: &CheckConfig) -> CheckResult {
        let started = Instant::now();

        let outcome = match self.registry.get(check.kind) {
            Some(strategy) => {
                // Strategies bound their own wall clock; this outer deadline
                // is the hard guarantee, with a grace second so the
                // strategy's more specific timeout message wins the race.
                let deadline = self.probe_timeout + Duration::from_secs(1);
                match tokio::time::timeout(deadline, strategy.probe(check)).await {
                    Ok(outcome) => outcome,
                    Err(_) => ProbeOutcome::fail(format!(
                        "Probe timed out after {}s",
                        deadline.as_secs()
                    )),
                }
            }
            None => ProbeOutcome::fail(format!("No probe registered for type '{}'", check.kind)),
        };

        let (status, message) = match outcome {
            ProbeOutcome::Ok { message } => (CheckStatus::Ok, message),
            ProbeOutcome::Fail { message } => (CheckStatus::Fail, Some(message)),
        };

        let result = CheckResult {
            check_id: check.id.clone(),
            timestamp: Utc::now(),
            status,
            latency: started.elapsed().as_millis() as u64,
            message,
        };

        debug!(
            check_id = %check.id,
            check_name = %check.name,
            status = ?result.status,
            latency_ms = result.latency,
            "Check executed."
        );
        self.store.save_result(&result).await;
        result
    }
}
