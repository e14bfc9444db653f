use std::sync::Arc;

use clap::Parser;
use metrics_sentinel::{
    alerts::AlertHandler, config::read_config_file, monitor::ThresholdMonitor,
    runner::MonitorLoop,
};
use tokio::sync::mpsc;
use tracing::{debug, error, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("metrics_sentinel", LevelFilter::TRACE),
        ("sentinel", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    // An unsupported backend identifier is fatal here, before any cycle runs.
    let handler = Arc::new(AlertHandler::new(&config.storage).await?);
    debug!("storage backend: {}", handler.backend_kind().await);

    let mut monitor = ThresholdMonitor::new(config.threshold);
    monitor.subscribe(handler);

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {e}");
        }
        let _ = shutdown_tx.send(()).await;
    });

    let mut monitor_loop = MonitorLoop::new(&config, monitor);
    monitor_loop.run_forever(shutdown_rx).await;

    Ok(())
}
