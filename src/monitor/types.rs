//! Core data model: check definitions and observed results.
//!
//! The serialized shapes are a compatibility surface: `checks.json` holds an
//! array of [`CheckConfig`] and each `results/<id>.json` an array of
//! [`CheckResult`] (newest first), both in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The probe kind a check dispatches to. Immutable after creation; changing
/// the kind of an existing check is modeled as delete + create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Http,
    Ping,
    Script,
    Podman,
    Service,
    Systemd,
    Fritzbox,
    Node,
    Agent,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckKind::Http => "http",
            CheckKind::Ping => "ping",
            CheckKind::Script => "script",
            CheckKind::Podman => "podman",
            CheckKind::Service => "service",
            CheckKind::Systemd => "systemd",
            CheckKind::Fritzbox => "fritzbox",
            CheckKind::Node => "node",
            CheckKind::Agent => "agent",
        };
        f.write_str(s)
    }
}

/// How an HTTP body match pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMatchMode {
    #[default]
    Contains,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpCheckConfig {
    /// Expected response status. `None` accepts any 2xx.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_match: Option<String>,
    #[serde(default)]
    pub body_match_mode: BodyMatchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FritzBoxConfig {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Declarative definition of one monitored target.
///
/// `PartialEq` is derived on purpose: the scheduler compares the stored
/// config against its last-known copy by value to decide whether a running
/// timer must be torn down and rebuilt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CheckKind,
    /// Interpretation depends on `kind`: URL, hostname, container name,
    /// unit name, script source, node name.
    pub target: String,
    /// Probe period in seconds. Must be at least 1.
    pub interval: u64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    /// Which execution context runs the probe. Absent or "Local" means the
    /// engine's own host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_config: Option<HttpCheckConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fritzbox_config: Option<FritzBoxConfig>,
}

#[derive(Debug, Error)]
pub enum CheckConfigError {
    #[error("check '{0}' has an invalid interval; must be at least 1 second")]
    InvalidInterval(String),
}

impl CheckConfig {
    pub fn new(name: impl Into<String>, kind: CheckKind, target: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            target: target.into(),
            interval: 60,
            enabled: true,
            created_at: Utc::now(),
            node_name: None,
            http_config: None,
            fritzbox_config: None,
        }
    }

    /// Rejects definitions the scheduler must never see. Invalid intervals
    /// are a configuration-time error, not a schedule-time one.
    pub fn validate(&self) -> Result<(), CheckConfigError> {
        if self.interval == 0 {
            return Err(CheckConfigError::InvalidInterval(self.id.clone()));
        }
        Ok(())
    }

    /// True when the probe runs on the engine's own host.
    pub fn is_local(&self) -> bool {
        match self.node_name.as_deref() {
            None => true,
            Some(name) => name.is_empty() || name.eq_ignore_ascii_case("local"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Fail,
}

/// One observation of one check. Immutable once written; destroyed only by
/// retention pruning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub check_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: CheckStatus,
    /// Wall-clock duration of the probe, in milliseconds.
    pub latency: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_config_round_trips_with_wire_names() {
        let mut check = CheckConfig::new("homepage", CheckKind::Http, "https://example.com");
        check.http_config = Some(HttpCheckConfig {
            expected_status: Some(200),
            body_match: Some("Welcome".into()),
            body_match_mode: BodyMatchMode::Contains,
        });

        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["type"], "http");
        assert_eq!(json["createdAt"], serde_json::to_value(check.created_at).unwrap());
        assert_eq!(json["httpConfig"]["expectedStatus"], 200);
        assert!(json.get("nodeName").is_none());

        let back: CheckConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, check);
    }

    #[test]
    fn result_serializes_status_lowercase() {
        let result = CheckResult {
            check_id: "abc".into(),
            timestamp: Utc::now(),
            status: CheckStatus::Fail,
            latency: 12,
            message: Some("HTTP Status 500".into()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["checkId"], "abc");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut check = CheckConfig::new("bad", CheckKind::Ping, "router");
        check.interval = 0;
        assert!(check.validate().is_err());
    }

    #[test]
    fn local_node_detection() {
        let mut check = CheckConfig::new("c", CheckKind::Podman, "db");
        assert!(check.is_local());
        check.node_name = Some("Local".into());
        assert!(check.is_local());
        check.node_name = Some("nas".into());
        assert!(!check.is_local());
    }
}
