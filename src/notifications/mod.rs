//! Outbound notification sinks.
//!
//! The engine talks to sinks through [`AlertNotifier`]; delivery transports
//! (SMTP relays, chat gateways) live behind that trait outside the engine.

use async_trait::async_trait;
use thiserror::Error;

pub mod broadcaster;
pub mod webhook;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
    #[error("invalid notifier configuration: {0}")]
    InvalidConfiguration(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Fire-and-forget alert delivery. Callers log failures and move on; an
/// unreachable sink must never stall or crash the evaluation path.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn send_alert(&self, subject: &str, body: &str) -> Result<(), NotifierError>;
}

/// Notifier used when no sink is configured.
pub struct NoopNotifier;

#[async_trait]
impl AlertNotifier for NoopNotifier {
    async fn send_alert(&self, _subject: &str, _body: &str) -> Result<(), NotifierError> {
        Ok(())
    }
}
