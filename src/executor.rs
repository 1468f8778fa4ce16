//! Command execution boundary.
//!
//! Probes that shell out (ping, podman inspect, systemctl, scripts) never
//! spawn processes themselves; they go through an [`Executor`] keyed by the
//! check's node name. The engine ships only the local implementation; a
//! remote transport (SSH, agent) plugs in behind the same trait.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a command on the execution context named by `node_name`
/// (`None`/"Local" is the engine's own host). The executor owns the timeout
/// discipline; callers get an `ExecError::Timeout`, never a hang.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn exec(
        &self,
        node_name: Option<&str>,
        program: &str,
        args: &[&str],
    ) -> Result<ExecOutput, ExecError>;

    /// Verifies the named execution context is reachable at all.
    async fn check_connectivity(&self, node_name: &str) -> Result<(), ExecError>;
}

pub struct LocalExecutor {
    timeout: Duration,
}

impl LocalExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn is_local(node_name: Option<&str>) -> bool {
        match node_name {
            None => true,
            Some(name) => name.is_empty() || name.eq_ignore_ascii_case("local"),
        }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<ExecOutput, ExecError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn()?;
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::Timeout(self.timeout))??;

        Ok(ExecOutput {
            // Signal-killed children report no code; fold that into a
            // generic failure exit.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn exec(
        &self,
        node_name: Option<&str>,
        program: &str,
        args: &[&str],
    ) -> Result<ExecOutput, ExecError> {
        if !Self::is_local(node_name) {
            return Err(ExecError::UnknownNode(node_name.unwrap_or_default().to_string()));
        }
        self.run(program, args).await
    }

    async fn check_connectivity(&self, node_name: &str) -> Result<(), ExecError> {
        if Self::is_local(Some(node_name)) {
            Ok(())
        } else {
            Err(ExecError::UnknownNode(node_name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_exec_captures_exit_code_and_output() {
        let executor = LocalExecutor::new(Duration::from_secs(5));
        let out = executor
            .exec(None, "sh", &["-c", "echo hello; exit 3"])
            .await
            .unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "hello");
        assert!(!out.success());
    }

    #[tokio::test]
    async fn exec_times_out_on_hung_command() {
        let executor = LocalExecutor::new(Duration::from_millis(200));
        let err = executor.exec(None, "sleep", &["30"]).await.unwrap_err();
        assert!(matches!(err, ExecError::Timeout(_)));
    }

    #[tokio::test]
    async fn remote_nodes_are_rejected() {
        let executor = LocalExecutor::new(Duration::from_secs(1));
        let err = executor.exec(Some("nas"), "true", &[]).await.unwrap_err();
        assert!(matches!(err, ExecError::UnknownNode(_)));
        assert!(executor.check_connectivity("Local").await.is_ok());
        assert!(executor.check_connectivity("nas").await.is_err());
    }
}
