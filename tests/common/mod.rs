//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use nodewatch::executor::{ExecError, ExecOutput, Executor};
use nodewatch::monitor::types::CheckConfig;
use nodewatch::notifications::{AlertNotifier, NotifierError};
use nodewatch::probes::{ProbeOutcome, ProbeStrategy};

/// Records every alert instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().await.clone()
    }
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    async fn send_alert(&self, subject: &str, body: &str) -> Result<(), NotifierError> {
        self.alerts
            .lock()
            .await
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Replays a queue of canned command outputs, repeating the last one when
/// the queue runs dry.
pub struct ScriptedExecutor {
    outputs: Mutex<VecDeque<ExecOutput>>,
    last: Mutex<Option<ExecOutput>>,
}

impl ScriptedExecutor {
    pub fn new(outputs: Vec<ExecOutput>) -> Arc<Self> {
        Arc::new(Self {
            outputs: Mutex::new(outputs.into()),
            last: Mutex::new(None),
        })
    }

    pub fn output(exit_code: i32, stdout: &str, stderr: &str) -> ExecOutput {
        ExecOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn exec(
        &self,
        _node: Option<&str>,
        _program: &str,
        _args: &[&str],
    ) -> Result<ExecOutput, ExecError> {
        let mut outputs = self.outputs.lock().await;
        match outputs.pop_front() {
            Some(out) => {
                *self.last.lock().await = Some(out.clone());
                Ok(out)
            }
            None => self
                .last
                .lock()
                .await
                .clone()
                .ok_or_else(|| ExecError::UnknownNode("no scripted output".into())),
        }
    }

    async fn check_connectivity(&self, _node: &str) -> Result<(), ExecError> {
        Ok(())
    }
}

/// Always-ok probe that counts how many times it ran.
#[derive(Default)]
pub struct CountingProbe {
    runs: AtomicUsize,
}

impl CountingProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProbeStrategy for CountingProbe {
    async fn probe(&self, _check: &CheckConfig) -> ProbeOutcome {
        self.runs.fetch_add(1, Ordering::SeqCst);
        ProbeOutcome::ok()
    }
}

/// Polls `condition` until it holds or the timeout elapses.
pub async fn wait_for<F, Fut>(mut condition: F, timeout: std::time::Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
