//! Probe strategies: one execution routine per check kind.
//!
//! Strategies never return errors. Anything that goes wrong (a refused
//! connection, a DNS failure, a dead container) is a failed health check,
//! expressed as [`ProbeOutcome::Fail`] with a human-readable message.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::executor::Executor;
use crate::monitor::types::{CheckConfig, CheckKind};

pub mod fritzbox;
pub mod http;
pub mod node;
pub mod ping;
pub mod podman;
pub mod script;
pub mod systemd;

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Ok { message: Option<String> },
    Fail { message: String },
}

impl ProbeOutcome {
    pub fn ok() -> Self {
        ProbeOutcome::Ok { message: None }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        ProbeOutcome::Ok {
            message: Some(message.into()),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ProbeOutcome::Fail {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Ok { .. })
    }
}

/// Type-specific pass/fail logic for one check invocation.
///
/// Every implementation bounds its own wall clock so a hung target can never
/// stall the scheduler; the runner adds a hard outer deadline on top.
#[async_trait]
pub trait ProbeStrategy: Send + Sync {
    async fn probe(&self, check: &CheckConfig) -> ProbeOutcome;
}

/// Maps check kinds to strategies. New kinds are added here, not in the
/// runner.
pub struct ProbeRegistry {
    strategies: HashMap<CheckKind, Arc<dyn ProbeStrategy>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// All built-in strategies, sharing one executor and one probe timeout.
    pub fn with_defaults(executor: Arc<dyn Executor>, probe_timeout: Duration) -> Self {
        let mut registry = Self::new();
        registry.register(CheckKind::Http, Arc::new(http::HttpProbe::new(probe_timeout)));
        registry.register(
            CheckKind::Ping,
            Arc::new(ping::PingProbe::new(executor.clone(), probe_timeout)),
        );
        registry.register(
            CheckKind::Podman,
            Arc::new(podman::PodmanProbe::new(executor.clone())),
        );
        registry.register(
            CheckKind::Service,
            Arc::new(systemd::SystemdProbe::user_scope(executor.clone())),
        );
        registry.register(
            CheckKind::Systemd,
            Arc::new(systemd::SystemdProbe::system_scope(executor.clone())),
        );
        registry.register(
            CheckKind::Fritzbox,
            Arc::new(fritzbox::FritzBoxProbe::new(probe_timeout)),
        );
        registry.register(
            CheckKind::Script,
            Arc::new(script::ScriptProbe::new(probe_timeout)),
        );
        let connectivity = Arc::new(node::NodeProbe::new(executor));
        registry.register(CheckKind::Node, connectivity.clone());
        registry.register(CheckKind::Agent, connectivity);
        registry
    }

    pub fn register(&mut self, kind: CheckKind, strategy: Arc<dyn ProbeStrategy>) {
        self.strategies.insert(kind, strategy);
    }

    pub fn get(&self, kind: CheckKind) -> Option<Arc<dyn ProbeStrategy>> {
        self.strategies.get(&kind).cloned()
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
