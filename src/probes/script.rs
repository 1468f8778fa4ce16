//! User-supplied script probe.
//!
//! Scripts are untrusted. They run as a shell subprocess with CPU and
//! address-space rlimits applied before exec, and the child is hard-killed
//! when the wall-clock deadline passes. A script that never returns becomes
//! a `fail` result within the timeout bound, never a stuck timer.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::monitor::types::CheckConfig;

use super::{ProbeOutcome, ProbeStrategy};

const ADDRESS_SPACE_LIMIT_BYTES: u64 = 256 * 1024 * 1024;

pub struct ScriptProbe {
    timeout: Duration,
}

impl ScriptProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn first_line(text: &str) -> Option<String> {
        text.lines().next().map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
    }
}

#[async_trait]
impl ProbeStrategy for ScriptProbe {
    async fn probe(&self, check: &CheckConfig) -> ProbeOutcome {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&check.target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        {
            let cpu_secs = self.timeout.as_secs().max(1);
            unsafe {
                command.pre_exec(move || {
                    use nix::sys::resource::{setrlimit, Resource};
                    setrlimit(Resource::RLIMIT_CPU, cpu_secs, cpu_secs)
                        .map_err(std::io::Error::from)?;
                    setrlimit(
                        Resource::RLIMIT_AS,
                        ADDRESS_SPACE_LIMIT_BYTES,
                        ADDRESS_SPACE_LIMIT_BYTES,
                    )
                    .map_err(std::io::Error::from)?;
                    Ok(())
                });
            }
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return ProbeOutcome::fail(format!("Failed to start script: {e}")),
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if output.status.success() {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    match Self::first_line(&stdout) {
                        Some(line) => ProbeOutcome::ok_with(line),
                        None => ProbeOutcome::ok(),
                    }
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let code = output.status.code().unwrap_or(-1);
                    match Self::first_line(&stderr) {
                        Some(line) => {
                            ProbeOutcome::fail(format!("Script exited with code {code}: {line}"))
                        }
                        None => ProbeOutcome::fail(format!("Script exited with code {code}")),
                    }
                }
            }
            Ok(Err(e)) => ProbeOutcome::fail(format!("Script execution failed: {e}")),
            // wait_with_output consumed the child; kill_on_drop reaps it.
            Err(_) => ProbeOutcome::fail(format!(
                "Script timed out after {}s",
                self.timeout.as_secs_f64()
            )),
        }
    }
}
