//! Systemd unit probe, covering both the per-user and the system scope.

use std::sync::Arc;

use async_trait::async_trait;

use crate::executor::Executor;
use crate::monitor::types::CheckConfig;

use super::{ProbeOutcome, ProbeStrategy};

pub struct SystemdProbe {
    executor: Arc<dyn Executor>,
    user_scope: bool,
}

impl SystemdProbe {
    /// `systemctl --user is-active`, the `service` check kind.
    pub fn user_scope(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            user_scope: true,
        }
    }

    /// `systemctl is-active`, the `systemd` check kind.
    pub fn system_scope(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            user_scope: false,
        }
    }

    fn unit_name(target: &str) -> String {
        const UNIT_SUFFIXES: [&str; 11] = [
            ".service",
            ".socket",
            ".timer",
            ".target",
            ".mount",
            ".automount",
            ".path",
            ".slice",
            ".scope",
            ".device",
            ".swap",
        ];
        if UNIT_SUFFIXES.iter().any(|s| target.ends_with(s)) {
            target.to_string()
        } else {
            format!("{target}.service")
        }
    }
}

#[async_trait]
impl ProbeStrategy for SystemdProbe {
    async fn probe(&self, check: &CheckConfig) -> ProbeOutcome {
        let unit = Self::unit_name(&check.target);
        let mut args: Vec<&str> = Vec::new();
        if self.user_scope {
            args.push("--user");
        }
        args.extend(["is-active", unit.as_str()]);

        match self
            .executor
            .exec(check.node_name.as_deref(), "systemctl", &args)
            .await
        {
            Ok(out) => {
                let state = out.stdout.trim();
                if out.success() && state == "active" {
                    ProbeOutcome::ok_with(format!("Unit '{unit}' is active"))
                } else {
                    let state = if state.is_empty() { "unknown" } else { state };
                    ProbeOutcome::fail(format!("Unit '{unit}' is {state}"))
                }
            }
            Err(e) => ProbeOutcome::fail(format!("systemctl failed: {e}")),
        }
    }
}
