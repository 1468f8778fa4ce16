//! End-to-end alert scenarios: probe → runner → store → evaluator → sinks.

mod common;

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use common::{RecordingNotifier, ScriptedExecutor};
use nodewatch::alerting::AlertEvaluator;
use nodewatch::monitor::runner::CheckRunner;
use nodewatch::monitor::store::{CheckStore, JsonFileStore};
use nodewatch::monitor::types::{CheckConfig, CheckKind, CheckStatus, HttpCheckConfig};
use nodewatch::notifications::broadcaster::EventBroadcaster;
use nodewatch::probes::{http::HttpProbe, ping::PingProbe, podman::PodmanProbe, ProbeRegistry};

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<JsonFileStore>,
    runner: CheckRunner,
    evaluator: AlertEvaluator,
    notifier: Arc<RecordingNotifier>,
    broadcaster: EventBroadcaster,
}

impl Harness {
    fn new(registry: ProbeRegistry) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), 7).unwrap();
        let runner = CheckRunner::new(registry, store.clone(), Duration::from_secs(5));
        let broadcaster = EventBroadcaster::new(64);
        let notifier = RecordingNotifier::new();
        let evaluator = AlertEvaluator::new(store.clone(), broadcaster.clone(), notifier.clone());
        Self {
            _dir: dir,
            store,
            runner,
            evaluator,
            notifier,
            broadcaster,
        }
    }

    async fn tick(&self, check: &CheckConfig) -> CheckStatus {
        let result = self.runner.run(check).await;
        self.evaluator.evaluate(check, &result).await;
        result.status
    }
}

/// HTTP server whose response status can be flipped mid-test.
async fn switchable_server(status: Arc<AtomicU16>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let code = status.load(Ordering::SeqCst);
            let reason = if code == 200 { "OK" } else { "Internal Server Error" };
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {code} {reason}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nhi"
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn http_check_alerts_once_per_transition() {
    let status = Arc::new(AtomicU16::new(200));
    let url = switchable_server(status.clone()).await;

    let mut registry = ProbeRegistry::new();
    registry.register(CheckKind::Http, Arc::new(HttpProbe::new(Duration::from_secs(2))));
    let harness = Harness::new(registry);
    let mut events = harness.broadcaster.subscribe();

    let mut check = CheckConfig::new("example", CheckKind::Http, url);
    check.http_config = Some(HttpCheckConfig {
        expected_status: Some(200),
        ..Default::default()
    });
    harness.store.save_check(&check).await.unwrap();

    assert_eq!(harness.tick(&check).await, CheckStatus::Ok);
    assert!(harness.notifier.alerts().await.is_empty());

    status.store(500, Ordering::SeqCst);
    assert_eq!(harness.tick(&check).await, CheckStatus::Fail);
    let last = harness.store.get_last_result(&check.id).await.unwrap();
    assert!(last.message.unwrap().contains("HTTP Status 500"));

    // Still down: no repeat alert.
    assert_eq!(harness.tick(&check).await, CheckStatus::Fail);

    let alerts = harness.notifier.alerts().await;
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].0.contains("Check failed: example"));

    // Three ticks, three updates, one alert envelope.
    let mut updates = 0;
    let mut alert_events = 0;
    while let Ok(raw) = events.try_recv() {
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        match value["type"].as_str().unwrap() {
            "monitoring:update" => updates += 1,
            "monitoring:alert" => alert_events += 1,
            other => panic!("unexpected event type {other}"),
        }
    }
    assert_eq!(updates, 3);
    assert_eq!(alert_events, 1);
}

#[tokio::test]
async fn ping_failure_carries_ping_failed_message() {
    let executor = ScriptedExecutor::new(vec![ScriptedExecutor::output(1, "", "")]);
    let mut registry = ProbeRegistry::new();
    registry.register(
        CheckKind::Ping,
        Arc::new(PingProbe::new(executor, Duration::from_secs(2))),
    );
    let harness = Harness::new(registry);

    let check = CheckConfig::new("gateway", CheckKind::Ping, "failhost");
    assert_eq!(harness.tick(&check).await, CheckStatus::Fail);
    let last = harness.store.get_last_result(&check.id).await.unwrap();
    assert!(last.message.unwrap().contains("Ping failed"));
}

#[tokio::test]
async fn podman_recovery_emits_exactly_one_recovery_alert() {
    let executor = ScriptedExecutor::new(vec![
        ScriptedExecutor::output(0, "running|healthy\n", ""),
        ScriptedExecutor::output(0, "exited|none\n", ""),
        ScriptedExecutor::output(0, "running|healthy\n", ""),
        ScriptedExecutor::output(0, "running|healthy\n", ""),
    ]);
    let mut registry = ProbeRegistry::new();
    registry.register(CheckKind::Podman, Arc::new(PodmanProbe::new(executor)));
    let harness = Harness::new(registry);

    let check = CheckConfig::new("db", CheckKind::Podman, "db");
    assert_eq!(harness.tick(&check).await, CheckStatus::Ok);
    assert_eq!(harness.tick(&check).await, CheckStatus::Fail);
    assert_eq!(harness.tick(&check).await, CheckStatus::Ok);
    assert_eq!(harness.tick(&check).await, CheckStatus::Ok);

    let alerts = harness.notifier.alerts().await;
    assert_eq!(alerts.len(), 2);
    assert!(alerts[0].0.contains("Check failed: db"));
    assert!(alerts[1].0.contains("Check recovered: db"));
    let recoveries = alerts.iter().filter(|(s, _)| s.contains("recovered")).count();
    assert_eq!(recoveries, 1);
}
