//! Webhook-backed alert sink.
//!
//! Posts `{subject, body}` as JSON to a configured URL. This is the shipped
//! transport for alert delivery; mail gateways and chat bridges sit behind
//! the same [`AlertNotifier`] trait on the receiving end of the webhook.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{AlertNotifier, NotifierError};

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap(); // Should not fail with default settings
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    async fn send_alert(&self, subject: &str, body: &str) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "subject": subject,
                "body": body,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::SendFailed(format!(
                "webhook returned status {status}"
            )));
        }
        Ok(())
    }
}
