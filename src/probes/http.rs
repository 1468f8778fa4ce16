//! HTTP endpoint probe.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::monitor::types::{BodyMatchMode, CheckConfig, HttpCheckConfig};

use super::{ProbeOutcome, ProbeStrategy};

pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap(); // Should not fail with default settings
        Self { client }
    }

    fn check_body(body: &str, options: &HttpCheckConfig) -> Result<(), String> {
        let Some(pattern) = options.body_match.as_deref() else {
            return Ok(());
        };
        let matched = match options.body_match_mode {
            BodyMatchMode::Contains => body.contains(pattern),
            BodyMatchMode::Regex => match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(body),
                Err(e) => return Err(format!("Invalid body match pattern: {e}")),
            },
        };
        if matched {
            Ok(())
        } else {
            Err(format!("Response body did not match '{pattern}'"))
        }
    }
}

#[async_trait]
impl ProbeStrategy for HttpProbe {
    async fn probe(&self, check: &CheckConfig) -> ProbeOutcome {
        let response = match self.client.get(&check.target).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return ProbeOutcome::fail("Request timed out");
            }
            Err(e) => return ProbeOutcome::fail(format!("Request failed: {e}")),
        };

        let status = response.status();
        let options = check.http_config.clone().unwrap_or_default();

        let status_ok = match options.expected_status {
            Some(expected) => status.as_u16() == expected,
            None => status.is_success(),
        };
        if !status_ok {
            return ProbeOutcome::fail(format!("HTTP Status {}", status.as_u16()));
        }

        if options.body_match.is_some() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => return ProbeOutcome::fail(format!("Failed to read body: {e}")),
            };
            if let Err(message) = Self::check_body(&body, &options) {
                return ProbeOutcome::fail(message);
            }
        }

        debug!(target = %check.target, status = status.as_u16(), "HTTP probe passed.");
        ProbeOutcome::ok_with(format!("HTTP Status {}", status.as_u16()))
    }
}
