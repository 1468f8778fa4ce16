//! Remote node connectivity probe.
//!
//! Covers both the `node` and `agent` check kinds: the target names an
//! execution context and the executor decides whether it is reachable. The
//! engine only interprets the verdict, not the transport.

use std::sync::Arc;

use async_trait::async_trait;

use crate::executor::Executor;
use crate::monitor::types::CheckConfig;

use super::{ProbeOutcome, ProbeStrategy};

pub struct NodeProbe {
    executor: Arc<dyn Executor>,
}

impl NodeProbe {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ProbeStrategy for NodeProbe {
    async fn probe(&self, check: &CheckConfig) -> ProbeOutcome {
        match self.executor.check_connectivity(&check.target).await {
            Ok(()) => ProbeOutcome::ok_with(format!("Node '{}' is reachable", check.target)),
            Err(e) => ProbeOutcome::fail(format!("Node '{}' is unreachable: {e}", check.target)),
        }
    }
}
