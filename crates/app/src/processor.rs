//! Background conversion of uploaded reports into transactions.
//!
//! Each pending report is parsed and its transactions replaced inside one
//! database transaction that also marks the report processed. Any failure
//! rolls that back and marks the report failed with the error text instead.
//!
//! Only one processor may run against a database at a time; report status
//! transitions are not guarded against concurrent runners.

use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use cashtrack_core::{Report, ReportStatus};
use cashtrack_import::{parse_statement, ParseError};
use cashtrack_storage::{self as storage, DbPool};

use crate::ingest::{self, IngestError};

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Outcome of one pass over the pending reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub failed: usize,
}

pub struct ReportProcessor {
    pool: DbPool,
}

impl ReportProcessor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Processes every pending report once, oldest first.
    ///
    /// A report that fails is marked failed and does not stop the pass. Only
    /// errors reading the queue or recording a failure are returned.
    pub async fn process_pending_reports(&self) -> Result<RunStats, ProcessorError> {
        let reports = storage::list_pending_reports(&self.pool).await?;
        let mut stats = RunStats::default();

        for report in reports {
            match self.process_report(&report).await {
                Ok(count) => {
                    tracing::info!(
                        report_id = report.id.0,
                        filename = %report.filename,
                        transactions = count,
                        "Report processed"
                    );
                    stats.processed += 1;
                }
                Err(e) => {
                    tracing::error!(
                        report_id = report.id.0,
                        filename = %report.filename,
                        "Report failed: {e}"
                    );
                    let message = e.to_string();
                    storage::update_report_status(
                        &self.pool,
                        report.user_id,
                        report.id,
                        ReportStatus::Failed,
                        Some(&message),
                    )
                    .await?;
                    stats.failed += 1;
                }
            }
        }
        Ok(stats)
    }

    async fn process_report(&self, report: &Report) -> Result<usize, ProcessorError> {
        let parsed = parse_statement(&report.content, &report.filename)?;

        let mut tx = self.pool.begin().await?;
        let count =
            ingest::replace_for_report(&mut tx, report.user_id, report.id, &parsed.transactions)
                .await?;
        let description = format!("transactions: {count}");
        storage::update_report_status(
            &mut *tx,
            report.user_id,
            report.id,
            ReportStatus::Processed,
            Some(&description),
        )
        .await?;
        tx.commit().await?;
        Ok(count)
    }

    /// Polls for pending reports every `interval` until `shutdown` turns true
    /// or its sender is dropped. A report in flight always finishes first.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        tracing::info!("Report processor started, polling every {:?}", interval);
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.process_pending_reports().await {
                Ok(stats) if stats.processed + stats.failed > 0 => {
                    tracing::info!(
                        processed = stats.processed,
                        failed = stats.failed,
                        "Processed pending reports"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Failed to process pending reports: {e}"),
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {}
            }
        }
        tracing::info!("Report processor stopped");
    }
}
