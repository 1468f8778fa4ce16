//! Edge-triggered alert evaluation.
//!
//! Health is an explicit three-state machine rather than an inference over
//! array indices, so "no alert on the first observation" and "no repeat
//! alert while still down" hold structurally.

use std::sync::Arc;

use tracing::{error, info};

use crate::monitor::store::CheckStore;
use crate::monitor::types::{CheckConfig, CheckResult, CheckStatus};
use crate::notifications::broadcaster::EventBroadcaster;
use crate::notifications::AlertNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// No prior observation; the first result establishes the baseline.
    Unknown,
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Failure,
    Recovery,
}

impl HealthState {
    pub fn from_status(status: Option<CheckStatus>) -> Self {
        match status {
            None => HealthState::Unknown,
            Some(CheckStatus::Ok) => HealthState::Healthy,
            Some(CheckStatus::Fail) => HealthState::Unhealthy,
        }
    }

    /// Feeds one observation into the machine. The output alert is the only
    /// place alert decisions are made.
    pub fn transition(self, observed: CheckStatus) -> (HealthState, Option<AlertKind>) {
        match (self, observed) {
            (HealthState::Unknown, CheckStatus::Ok) => (HealthState::Healthy, None),
            (HealthState::Unknown, CheckStatus::Fail) => (HealthState::Unhealthy, None),
            (HealthState::Healthy, CheckStatus::Ok) => (HealthState::Healthy, None),
            (HealthState::Healthy, CheckStatus::Fail) => {
                (HealthState::Unhealthy, Some(AlertKind::Failure))
            }
            (HealthState::Unhealthy, CheckStatus::Fail) => (HealthState::Unhealthy, None),
            (HealthState::Unhealthy, CheckStatus::Ok) => {
                (HealthState::Healthy, Some(AlertKind::Recovery))
            }
        }
    }
}

/// Compares each fresh result against the immediately preceding stored one
/// and drives the notification sinks.
pub struct AlertEvaluator {
    store: Arc<dyn CheckStore>,
    broadcaster: EventBroadcaster,
    notifier: Arc<dyn AlertNotifier>,
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<dyn CheckStore>,
        broadcaster: EventBroadcaster,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            store,
            broadcaster,
            notifier,
        }
    }

    /// Evaluates a result that has already been written to the store.
    /// History is newest-first, so the previous status lives at index 1.
    pub async fn evaluate(&self, check: &CheckConfig, result: &CheckResult) {
        self.broadcaster.send_update(&check.id, result);

        let history = self.store.get_results(&check.id).await;
        let previous = HealthState::from_status(history.get(1).map(|r| r.status));
        let (_, alert) = previous.transition(result.status);

        let Some(kind) = alert else {
            return;
        };

        let detail = result.message.as_deref().unwrap_or("no details");
        let (alert_type, title, message) = match kind {
            AlertKind::Failure => (
                "error",
                format!("Check failed: {}", check.name),
                format!("'{}' ({}) failed: {detail}", check.name, check.target),
            ),
            AlertKind::Recovery => (
                "success",
                format!("Check recovered: {}", check.name),
                format!("'{}' ({}) is healthy again", check.name, check.target),
            ),
        };

        info!(check_id = %check.id, check_name = %check.name, kind = ?kind, "Health state transition.");
        self.broadcaster.send_alert(alert_type, &title, &message);

        // Fire-and-forget contract: a broken sink is logged, never propagated
        // back into the scheduling path.
        if let Err(e) = self.notifier.send_alert(&title, &message).await {
            error!(check_id = %check.id, error = %e, "Failed to deliver alert notification.");
        }
    }
}
