//! FRITZ!Box internet gateway probe via the TR-064/UPnP `GetStatusInfo`
//! SOAP action.

use std::time::Duration;

use async_trait::async_trait;

use crate::monitor::types::CheckConfig;

use super::{ProbeOutcome, ProbeStrategy};

const SOAP_ACTION: &str = "urn:schemas-upnp-org:service:WANIPConnection:1#GetStatusInfo";

const SOAP_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:GetStatusInfo xmlns:u="urn:schemas-upnp-org:service:WANIPConnection:1"/>
  </s:Body>
</s:Envelope>"#;

pub struct FritzBoxProbe {
    client: reqwest::Client,
}

impl FritzBoxProbe {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap(); // Should not fail with default settings
        Self { client }
    }

    fn extract_tag<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        let start = body.find(&open)? + open.len();
        let end = body[start..].find(&close)? + start;
        Some(body[start..end].trim())
    }

    fn format_uptime(seconds: u64) -> String {
        let days = seconds / 86_400;
        let hours = (seconds % 86_400) / 3_600;
        let minutes = (seconds % 3_600) / 60;
        format!("{days}d {hours}h {minutes}m")
    }

    fn evaluate(body: &str) -> ProbeOutcome {
        match Self::extract_tag(body, "NewConnectionStatus") {
            Some("Connected") => {
                let uptime = Self::extract_tag(body, "NewUptime")
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Self::format_uptime);
                match uptime {
                    Some(uptime) => ProbeOutcome::ok_with(format!("Connected, uptime {uptime}")),
                    None => ProbeOutcome::ok_with("Connected"),
                }
            }
            Some(other) => ProbeOutcome::fail(format!("Connection status: {other}")),
            None => ProbeOutcome::fail("Gateway response did not contain a connection status"),
        }
    }
}

#[async_trait]
impl ProbeStrategy for FritzBoxProbe {
    async fn probe(&self, check: &CheckConfig) -> ProbeOutcome {
        let host = check
            .fritzbox_config
            .as_ref()
            .map(|c| c.host.as_str())
            .unwrap_or(check.target.as_str());
        let url = format!("http://{host}:49000/igdupnp/control/WANIPConn1");

        let response = match self
            .client
            .post(&url)
            .header("Content-Type", r#"text/xml; charset="utf-8""#)
            .header("SoapAction", SOAP_ACTION)
            .body(SOAP_BODY)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return ProbeOutcome::fail("Gateway request timed out"),
            Err(e) => return ProbeOutcome::fail(format!("Gateway unreachable: {e}")),
        };

        match response.status().as_u16() {
            401 => ProbeOutcome::fail("Gateway requires authentication for UPnP status queries"),
            500 => ProbeOutcome::fail(
                "Gateway rejected the status query (UPnP action unsupported or disabled)",
            ),
            _ => match response.text().await {
                Ok(body) => Self::evaluate(&body),
                Err(e) => ProbeOutcome::fail(format!("Failed to read gateway response: {e}")),
            },
        }
    }
}
