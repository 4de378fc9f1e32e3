//! Desk Wellness Monitor - Main Entry Point

use anyhow::{Context, Result};
use camera_capture::ImageSequenceSource;
use monitor::{init_logging, LogSink, MonitorBuilder, MonitorConfig};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = MonitorConfig::load(config_path.as_deref()).context("loading configuration")?;

    init_logging(&config.logging).context("initialising logging")?;
    info!("=== Wellness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Configuration loaded from {}", path.display());
    }

    let source = ImageSequenceSource::from_config(&config.source);
    let mut monitor = MonitorBuilder::new(config)
        .source(source)
        .sink(LogSink::new())
        .with_configured_probes()
        .context("setting up detectors")?
        .build()
        .context("starting monitoring loop")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Shutdown requested");
        ctrl_c.cancel();
    });

    let stats = monitor.run(cancel).await;
    info!(
        "Session summary: {} ticks, {} skipped, {} blinks, {} notifications",
        stats.ticks, stats.skipped_ticks, stats.blinks, stats.notifications
    );

    Ok(())
}
