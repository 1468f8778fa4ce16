use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nodewatch::alerting::AlertEvaluator;
use nodewatch::bootstrap::{CheckSeeder, FileSeeder, NoopSeeder};
use nodewatch::config::EngineConfig;
use nodewatch::executor::LocalExecutor;
use nodewatch::monitor::runner::CheckRunner;
use nodewatch::monitor::scheduler::Scheduler;
use nodewatch::monitor::store::JsonFileStore;
use nodewatch::notifications::broadcaster::EventBroadcaster;
use nodewatch::notifications::webhook::WebhookNotifier;
use nodewatch::notifications::{AlertNotifier, NoopNotifier};
use nodewatch::probes::ProbeRegistry;

#[derive(Parser, Debug)]
#[command(name = "nodewatch", about = "Monitoring and alerting engine")]
struct Cli {
    /// Path to the engine configuration file.
    #[arg(long, default_value = "nodewatch.toml")]
    config: PathBuf,
}

fn init_logging() {
    // File: JSON, daily rotation. Stdout: human-readable.
    let file_appender = rolling::daily("logs", "nodewatch.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = EngineConfig::load(&cli.config)?;
    info!(data_dir = %config.data_dir.display(), "Starting nodewatch.");

    let probe_timeout = Duration::from_secs(config.probe_timeout_seconds);
    let store = JsonFileStore::new(&config.data_dir, config.retention_days)?;
    let executor = Arc::new(LocalExecutor::new(probe_timeout));
    let registry = ProbeRegistry::with_defaults(executor, probe_timeout);
    let runner = Arc::new(CheckRunner::new(registry, store.clone(), probe_timeout));

    let broadcaster = EventBroadcaster::new(256);
    let notifier: Arc<dyn AlertNotifier> = match &config.alert_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone(), probe_timeout)),
        None => Arc::new(NoopNotifier),
    };
    let evaluator = Arc::new(AlertEvaluator::new(
        store.clone(),
        broadcaster.clone(),
        notifier,
    ));

    let seeder: Arc<dyn CheckSeeder> = match &config.seed_file {
        Some(path) => Arc::new(FileSeeder::new(path)),
        None => Arc::new(NoopSeeder),
    };

    let scheduler = Scheduler::new(
        store,
        runner,
        evaluator,
        seeder,
        Duration::from_secs(config.reconcile_interval_seconds),
    );
    scheduler.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");
    scheduler.stop_all().await;
    Ok(())
}
