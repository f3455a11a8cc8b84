use sqlx::SqliteConnection;
use thiserror::Error;

use cashtrack_core::filter::non_blank;
use cashtrack_core::{CategorySource, Money, MoneyError, ParsedTransaction, ReportId, UserId};
use cashtrack_import::CategoryRuleEngine;
use cashtrack_storage::{self as storage, DbPool, NewTransaction};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid amount {amount:?} on row {row}: {source}")]
    InvalidAmount {
        row: usize,
        amount: String,
        #[source]
        source: MoneyError,
    },
}

/// Replaces every transaction of `report_id` with `records`, categorizing each
/// with the user's current rules.
///
/// Runs on the caller's connection so it can share a database transaction; on
/// error nothing is committed here and the caller is expected to roll back.
pub async fn replace_for_report(
    conn: &mut SqliteConnection,
    user_id: UserId,
    report_id: ReportId,
    records: &[ParsedTransaction],
) -> Result<usize, IngestError> {
    let removed = storage::delete_transactions_for_report(&mut *conn, user_id, report_id).await?;
    if records.is_empty() {
        tracing::debug!(report_id = report_id.0, removed, "report has no transactions");
        return Ok(0);
    }

    let rules = storage::list_category_rules(&mut *conn, user_id).await?;
    let engine = CategoryRuleEngine::new(rules);

    for record in records {
        let amount = Money::parse(&record.amount).map_err(|source| IngestError::InvalidAmount {
            row: record.row,
            amount: record.amount.clone(),
            source,
        })?;
        let category_id = engine.find_category(&record.description);

        let row = NewTransaction {
            user_id,
            report_id,
            row: record.row as i64,
            parser_name: record.parser_name.clone(),
            posted_date: record.posted_date,
            description: record.description.clone(),
            amount,
            currency: record.currency.trim().to_uppercase(),
            transaction_id: non_blank(Some(record.transaction_id.as_str())).map(str::to_string),
            entry_type: record.entry_type,
            account_number: non_blank(Some(record.account_number.as_str())).map(str::to_string),
            card_number: non_blank(record.card_number.as_deref()).map(str::to_string),
            category_id,
            category_source: category_id.map(|_| CategorySource::Rule),
            metadata: record.metadata.clone(),
        };
        storage::insert_transaction(&mut *conn, &row).await?;
    }

    tracing::debug!(
        report_id = report_id.0,
        removed,
        inserted = records.len(),
        "replaced report transactions"
    );
    Ok(records.len())
}

/// [`replace_for_report`] in its own database transaction.
pub async fn replace_transactions(
    pool: &DbPool,
    user_id: UserId,
    report_id: ReportId,
    records: &[ParsedTransaction],
) -> Result<usize, IngestError> {
    let mut tx = pool.begin().await?;
    let inserted = replace_for_report(&mut tx, user_id, report_id, records).await?;
    tx.commit().await?;
    Ok(inserted)
}

/// Re-runs the user's rules over stored transactions and returns how many rows
/// changed. Manually categorized rows are left alone unless `include_manual`.
pub async fn apply_category_rules(
    pool: &DbPool,
    user_id: UserId,
    include_manual: bool,
) -> Result<u64, IngestError> {
    let mut tx = pool.begin().await?;
    let rules = storage::list_category_rules(&mut *tx, user_id).await?;
    let engine = CategoryRuleEngine::new(rules);
    let candidates = storage::list_rule_candidates(&mut *tx, user_id, include_manual).await?;

    let mut updated = 0;
    for candidate in candidates {
        let category_id = engine.find_category(&candidate.description);
        let source = category_id.map(|_| CategorySource::Rule);
        if candidate.category_id == category_id && candidate.category_source == source {
            continue;
        }
        updated += storage::update_transaction_category(
            &mut *tx,
            user_id,
            candidate.id,
            category_id,
            source,
        )
        .await?;
    }
    tx.commit().await?;

    tracing::info!(user_id = user_id.0, updated, include_manual, "applied category rules");
    Ok(updated)
}
