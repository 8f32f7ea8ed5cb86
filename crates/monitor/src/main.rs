use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kube_medic_monitor::{
    agent::{create_provider, DiagnosisClient, SafetyValidator},
    config::{Config, ExecutionMode},
    executor::ProcessRunner,
    kubernetes::LogCollector,
    metrics,
    notify::Notifier,
    runner::{Monitor, Pipeline},
    server::Server,
    Error, Result,
};

#[derive(Parser, Debug)]
#[command(
    name = "kube-medic",
    about = "Diagnose pod log errors with an LLM and apply vetted fixes"
)]
struct Args {
    /// Namespace to monitor (overrides KUBE_NAMESPACE)
    #[arg(long)]
    namespace: Option<String>,

    /// Seconds between monitor cycles (overrides POLL_INTERVAL_SECS)
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Execution mode (overrides EXECUTION_MODE)
    #[arg(long, value_enum)]
    mode: Option<ExecutionMode>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load()?;
    if let Some(namespace) = args.namespace {
        config.monitor.namespace = namespace;
    }
    if let Some(interval_secs) = args.interval_secs {
        config.monitor.interval_secs = interval_secs;
    }
    if let Some(mode) = args.mode {
        config.execution.mode = mode;
    }
    if config.monitor.interval_secs == 0 {
        return Err(Error::Config(
            "--interval-secs must be greater than zero".to_string(),
        ));
    }
    info!(
        namespace = %config.monitor.namespace,
        mode = ?config.execution.mode,
        interval_secs = config.monitor.interval_secs,
        "Loaded configuration"
    );

    metrics::register_metrics();

    let client = kube::Client::try_default()
        .await
        .map_err(|e| Error::Kubernetes(e.to_string()))?;
    let collector = LogCollector::new(
        client,
        config.monitor.namespace.clone(),
        config.monitor.filter_keywords.clone(),
        config.monitor.tail_lines,
    );

    let provider = create_provider(&config.llm).map_err(|e| Error::Config(e.to_string()))?;
    let pipeline = Pipeline::new(
        DiagnosisClient::new(provider),
        SafetyValidator::default(),
        Arc::new(ProcessRunner::default()),
        Notifier::from_config(&config.notify),
        config.execution.mode,
    );
    let monitor = Monitor::new(
        collector,
        pipeline,
        Duration::from_secs(config.monitor.interval_secs),
    );

    let addr = config.server.addr.clone();
    tokio::spawn(async move {
        if let Err(e) = Server::serve(&addr).await {
            error!(error = %e, "Observability server exited");
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    monitor.run(shutdown_rx).await;
    info!("Monitor stopped");
    Ok(())
}
