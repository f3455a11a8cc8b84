use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use cashtrack::{AppConfig, ReportProcessor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db_path = config.database_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }
    let pool = cashtrack_storage::create_db(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    tracing::info!("Database: {}", db_path.display());

    // ── Report processor ──────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let processor = ReportProcessor::new(pool.clone());
    let interval = config.poll_interval();
    let worker = tokio::spawn(async move {
        processor.run(interval, shutdown_rx).await;
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested, waiting for the processor to finish");

    // The loop may already have exited if the receiver was dropped.
    let _ = shutdown_tx.send(true);
    worker.await.context("Report processor task panicked")?;
    pool.close().await;

    Ok(())
}
