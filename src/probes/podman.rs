//! Podman container probe: running, and healthy if a health check exists.

use std::sync::Arc;

use async_trait::async_trait;

use crate::executor::Executor;
use crate::monitor::types::CheckConfig;

use super::{ProbeOutcome, ProbeStrategy};

// Yields "<state>|<health>", with "none" when the container defines no
// health check.
const INSPECT_FORMAT: &str =
    "{{.State.Status}}|{{if .State.Health}}{{.State.Health.Status}}{{else}}none{{end}}";

pub struct PodmanProbe {
    executor: Arc<dyn Executor>,
}

impl PodmanProbe {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    fn evaluate(container: &str, stdout: &str) -> ProbeOutcome {
        let line = stdout.trim();
        let (state, health) = line.split_once('|').unwrap_or((line, "none"));
        if state != "running" {
            return ProbeOutcome::fail(format!("Container '{container}' is {state}"));
        }
        match health {
            "none" | "" | "healthy" => {
                ProbeOutcome::ok_with(format!("Container '{container}' is running"))
            }
            other => ProbeOutcome::fail(format!("Container '{container}' is running but {other}")),
        }
    }
}

#[async_trait]
impl ProbeStrategy for PodmanProbe {
    async fn probe(&self, check: &CheckConfig) -> ProbeOutcome {
        let args = ["inspect", "--format", INSPECT_FORMAT, check.target.as_str()];
        match self
            .executor
            .exec(check.node_name.as_deref(), "podman", &args)
            .await
        {
            Ok(out) if out.success() => Self::evaluate(&check.target, &out.stdout),
            Ok(out) => {
                let detail = out.stderr.trim();
                if detail.is_empty() {
                    ProbeOutcome::fail(format!("Container '{}' not found", check.target))
                } else {
                    ProbeOutcome::fail(format!("Inspect failed: {detail}"))
                }
            }
            Err(e) => ProbeOutcome::fail(format!("Inspect failed: {e}")),
        }
    }
}
