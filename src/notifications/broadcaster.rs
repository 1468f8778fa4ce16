//! Real-time event fan-out for live status consumers.
//!
//! Every probe execution produces a `monitoring:update`; alerts additionally
//! produce a `monitoring:alert`. Update cardinality therefore equals the
//! number of executions, alert cardinality the number of state transitions.

use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::monitor::types::CheckResult;

pub type BroadcastMsg = String;

#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<BroadcastMsg>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMsg> {
        self.tx.subscribe()
    }

    fn send_message(&self, message_type: &str, payload: serde_json::Value) {
        let envelope = json!({
            "type": message_type,
            "payload": payload,
        });
        match serde_json::to_string(&envelope) {
            Ok(text) => {
                // A send error only means there are no subscribers right now.
                if self.tx.send(text).is_err() {
                    debug!(message_type, "No subscribers for broadcast message.");
                }
            }
            Err(e) => {
                warn!(message_type, error = %e, "Failed to serialize broadcast message.");
            }
        }
    }

    /// Sent on every tick, regardless of transitions.
    pub fn send_update(&self, check_id: &str, result: &CheckResult) {
        self.send_message(
            "monitoring:update",
            json!({
                "checkId": check_id,
                "result": result,
            }),
        );
    }

    /// Sent only on ok→fail and fail→ok edges.
    pub fn send_alert(&self, alert_type: &str, title: &str, message: &str) {
        self.send_message(
            "monitoring:alert",
            json!({
                "type": alert_type,
                "title": title,
                "message": message,
            }),
        );
    }
}
