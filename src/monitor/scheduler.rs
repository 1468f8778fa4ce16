//! Timer ownership and reconciliation.
//!
//! One spawned task per enabled check, each with its own interval timer and
//! oneshot shutdown. A reconciliation pass periodically diffs the running
//! task set against the stored check list, so runtime edits take effect
//! without a restart.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::alerting::AlertEvaluator;
use crate::bootstrap::CheckSeeder;

use super::runner::CheckRunner;
use super::store::CheckStore;
use super::types::CheckConfig;

struct ScheduledTask {
    handle: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
    /// Last-known configuration, compared by value against the store on
    /// every reconcile pass.
    config: CheckConfig,
}

pub struct Scheduler {
    store: Arc<dyn CheckStore>,
    runner: Arc<CheckRunner>,
    evaluator: Arc<AlertEvaluator>,
    seeder: Arc<dyn CheckSeeder>,
    reconcile_interval: Duration,
    tasks: Mutex<HashMap<String, ScheduledTask>>,
    started: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn CheckStore>,
        runner: Arc<CheckRunner>,
        evaluator: Arc<AlertEvaluator>,
        seeder: Arc<dyn CheckSeeder>,
        reconcile_interval: Duration,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            store,
            runner,
            evaluator,
            seeder,
            reconcile_interval,
            tasks: Mutex::new(HashMap::new()),
            started: AtomicBool::new(false),
            shutdown_tx,
        })
    }

    /// Seeds default checks, runs an initial reconcile, and arms the
    /// periodic reconciliation loop. Idempotent.
    pub async fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already started; ignoring.");
            return;
        }

        match self.seeder.seed(self.store.as_ref()).await {
            Ok(0) => {}
            Ok(count) => info!(count, "Default checks seeded."),
            Err(e) => error!(error = %e, "Check seeding failed; continuing with stored checks."),
        }

        self.reconcile().await;

        let scheduler = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        info!("Shutdown signal received, stopping reconciliation loop.");
                        break;
                    }
                    _ = tokio::time::sleep(scheduler.reconcile_interval) => {
                        scheduler.reconcile().await;
                    }
                }
            }
        });
        info!(
            reconcile_interval_secs = self.reconcile_interval.as_secs(),
            "Scheduler started."
        );
    }

    /// Aligns running timers with the stored check list: stops timers for
    /// removed or disabled checks, starts timers for new ones, restarts
    /// timers whose configuration changed by value. Idempotent when the
    /// store is unchanged.
    pub async fn reconcile(&self) {
        let desired: HashMap<String, CheckConfig> = self
            .store
            .list_checks()
            .await
            .into_iter()
            .filter(|c| c.enabled)
            .map(|c| (c.id.clone(), c))
            .collect();

        let mut tasks = self.tasks.lock().await;

        let running_ids: HashSet<String> = tasks.keys().cloned().collect();
        let desired_ids: HashSet<String> = desired.keys().cloned().collect();
        for id in running_ids.difference(&desired_ids) {
            if let Some(task) = tasks.remove(id) {
                info!(check_id = %id, check_name = %task.config.name, "Stopping timer for removed or disabled check.");
                Self::stop_task(task);
            }
        }

        for (id, check) in desired {
            match tasks.get(&id) {
                Some(task) if task.config == check => {}
                Some(_) => {
                    info!(check_id = %id, check_name = %check.name, "Check configuration changed, rescheduling.");
                    if let Some(task) = tasks.remove(&id) {
                        Self::stop_task(task);
                    }
                    tasks.insert(id, self.schedule_check(check));
                }
                None => {
                    info!(check_id = %id, check_name = %check.name, interval = check.interval, "Scheduling check.");
                    tasks.insert(id, self.schedule_check(check));
                }
            }
        }
    }

    /// Spawns the per-check timer task. The first tick fires immediately so
    /// a new check produces its first observation without waiting a full
    /// interval.
    fn schedule_check(&self, check: CheckConfig) -> ScheduledTask {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let runner = self.runner.clone();
        let evaluator = self.evaluator.clone();
        let task_check = check.clone();

        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(task_check.interval.max(1)));
            loop {
                tokio::select! {
                    biased;

                    _ = &mut shutdown_rx => {
                        break;
                    }
                    _ = interval.tick() => {
                        let result = runner.run(&task_check).await;
                        evaluator.evaluate(&task_check, &result).await;
                    }
                }
            }
        });

        ScheduledTask {
            handle,
            shutdown_tx,
            config: check,
        }
    }

    fn stop_task(task: ScheduledTask) {
        // A send error means the task already finished; the in-flight tick,
        // if any, is allowed to complete.
        if task.shutdown_tx.send(()).is_err() {
            task.handle.abort();
        }
    }

    /// Cancels every timer and the reconciliation loop. Used for graceful
    /// shutdown and test teardown.
    pub async fn stop_all(&self) {
        let _ = self.shutdown_tx.send(true);
        let mut tasks = self.tasks.lock().await;
        let count = tasks.len();
        for (_, task) in tasks.drain() {
            Self::stop_task(task);
        }
        info!(count, "All check timers stopped.");
    }

    /// Ids of checks with an active timer, for introspection and tests.
    pub async fn active_check_ids(&self) -> Vec<String> {
        let tasks = self.tasks.lock().await;
        let mut ids: Vec<String> = tasks.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The interval the named check is currently scheduled at, if any.
    pub async fn scheduled_interval(&self, check_id: &str) -> Option<u64> {
        let tasks = self.tasks.lock().await;
        tasks.get(check_id).map(|t| t.config.interval)
    }
}
