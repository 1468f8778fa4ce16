//! ICMP reachability probe via the system `ping` binary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::executor::Executor;
use crate::monitor::types::CheckConfig;

use super::{ProbeOutcome, ProbeStrategy};

pub struct PingProbe {
    executor: Arc<dyn Executor>,
    deadline_secs: u64,
}

impl PingProbe {
    pub fn new(executor: Arc<dyn Executor>, timeout: Duration) -> Self {
        Self {
            executor,
            deadline_secs: timeout.as_secs().max(1),
        }
    }

    /// Pulls the `time=1.23 ms` detail out of ping's reply line, if present.
    fn extract_rtt(stdout: &str) -> Option<&str> {
        let start = stdout.find("time=")?;
        let rest = &stdout[start + 5..];
        let end = rest.find(' ').unwrap_or(rest.len());
        Some(rest[..end].trim())
    }
}

#[async_trait]
impl ProbeStrategy for PingProbe {
    async fn probe(&self, check: &CheckConfig) -> ProbeOutcome {
        let deadline = self.deadline_secs.to_string();
        let args = ["-c", "1", "-W", deadline.as_str(), check.target.as_str()];
        match self
            .executor
            .exec(check.node_name.as_deref(), "ping", &args)
            .await
        {
            Ok(out) if out.success() => match Self::extract_rtt(&out.stdout) {
                Some(rtt) => ProbeOutcome::ok_with(format!("Reply in {rtt} ms")),
                None => ProbeOutcome::ok(),
            },
            Ok(out) => {
                let detail = if out.stderr.trim().is_empty() {
                    format!("exit code {}", out.exit_code)
                } else {
                    out.stderr.trim().to_string()
                };
                ProbeOutcome::fail(format!("Ping failed: {detail}"))
            }
            Err(e) => ProbeOutcome::fail(format!("Ping failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecError, ExecOutput};
    use crate::monitor::types::CheckKind;

    struct FixedExecutor(ExecOutput);

    #[async_trait]
    impl Executor for FixedExecutor {
        async fn exec(
            &self,
            _node: Option<&str>,
            _program: &str,
            _args: &[&str],
        ) -> Result<ExecOutput, ExecError> {
            Ok(self.0.clone())
        }

        async fn check_connectivity(&self, _node: &str) -> Result<(), ExecError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_echo_reports_rtt() {
        let probe = PingProbe::new(
            Arc::new(FixedExecutor(ExecOutput {
                exit_code: 0,
                stdout: "64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.42 ms\n".into(),
                stderr: String::new(),
            })),
            Duration::from_secs(2),
        );
        let check = CheckConfig::new("gw", CheckKind::Ping, "10.0.0.1");
        match probe.probe(&check).await {
            ProbeOutcome::Ok { message } => assert_eq!(message.as_deref(), Some("Reply in 0.42 ms")),
            outcome => panic!("expected ok, got {outcome:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_is_ping_failed() {
        let probe = PingProbe::new(
            Arc::new(FixedExecutor(ExecOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: String::new(),
            })),
            Duration::from_secs(2),
        );
        let check = CheckConfig::new("gw", CheckKind::Ping, "failhost");
        match probe.probe(&check).await {
            ProbeOutcome::Fail { message } => assert!(message.contains("Ping failed")),
            outcome => panic!("expected fail, got {outcome:?}"),
        }
    }
}
