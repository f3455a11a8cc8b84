use thiserror::Error;

use cashtrack_core::transaction::account_key;
use cashtrack_core::{SummaryAccumulator, TransactionFilter, TransactionSummary, UserId};
use cashtrack_storage::{self as storage, DbPool};

use crate::currency::{CurrencyConverter, RateError, RateSource};

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Currency conversion failed: {0}")]
    Conversion(#[from] RateError),
}

/// Totals over every transaction matching `filter`, converted to the
/// reporting currency at each transaction's posted date.
///
/// A single missing rate fails the whole summary.
pub async fn summarize<S: RateSource>(
    pool: &DbPool,
    converter: &CurrencyConverter<S>,
    user_id: UserId,
    filter: &TransactionFilter,
) -> Result<TransactionSummary, SummaryError> {
    let rows = storage::list_summary_rows(pool, user_id, filter).await?;

    let mut acc = SummaryAccumulator::default();
    for row in &rows {
        let amount = converter
            .convert(row.amount().as_decimal(), &row.currency, row.posted_date)
            .await?;
        let key = account_key(row.account_number.as_deref(), row.card_number.as_deref());
        acc.push(amount, row.posted_date, key);
    }
    Ok(acc.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::test_support::{CountingSource, FailingSource};
    use crate::ingest::replace_transactions;
    use crate::ingest::test_support::{parsed, temp_db};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn single_debit_summary() {
        let (_dir, pool) = temp_db().await;
        let user = UserId(1);
        let report = storage::insert_report(&pool, user, "a.csv", b"x", None).await.unwrap();
        replace_transactions(&pool, user, report, &[parsed(1, "Coffee", "-5.90", "CHF")])
            .await
            .unwrap();

        let converter = CurrencyConverter::new(pool.clone(), FailingSource);
        let summary = summarize(&pool, &converter, user, &TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total_cents, -590);
        assert_eq!(summary.average_cents, -590);
        assert_eq!(summary.median_cents, -590);
        assert_eq!(summary.unique_accounts, 1);
        assert_eq!(summary.currency, "CHF");
    }

    #[tokio::test]
    async fn empty_selection_is_zero_summary() {
        let (_dir, pool) = temp_db().await;
        let converter = CurrencyConverter::new(pool.clone(), FailingSource);
        let summary = summarize(&pool, &converter, UserId(1), &TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(summary, TransactionSummary::empty());
    }

    #[tokio::test]
    async fn foreign_amounts_are_converted() {
        let (_dir, pool) = temp_db().await;
        let user = UserId(1);
        let report = storage::insert_report(&pool, user, "a.csv", b"x", None).await.unwrap();
        let records = vec![
            parsed(1, "Amazon EU", "-45.90", "EUR"),
            parsed(2, "Salary", "5250.00", "CHF"),
            parsed(3, "Migros", "-10.00", "CHF"),
        ];
        replace_transactions(&pool, user, report, &records).await.unwrap();

        let converter = CurrencyConverter::new(pool.clone(), CountingSource::new(dec!(0.9473)));
        let summary = summarize(&pool, &converter, user, &TransactionFilter::default())
            .await
            .unwrap();

        // -45.90 EUR * 0.9473 = -43.481070 CHF
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_cents, 525000 - 4348 - 1000);
        assert_eq!(summary.average_cents, -2674);
        assert_eq!(summary.median_cents, -2674);
        assert_eq!(summary.date_range_start, NaiveDate::from_ymd_opt(2026, 1, 21));
        assert_eq!(summary.date_range_end, NaiveDate::from_ymd_opt(2026, 1, 23));

        let credits_only = TransactionFilter {
            entry_type: Some(cashtrack_core::EntryType::Credit),
            ..Default::default()
        };
        let summary = summarize(&pool, &converter, user, &credits_only).await.unwrap();
        assert_eq!(summary.total_cents, 525000);
        assert_eq!(summary.average_cents, 0);
    }

    #[tokio::test]
    async fn missing_rate_fails_whole_summary() {
        let (_dir, pool) = temp_db().await;
        let user = UserId(1);
        let report = storage::insert_report(&pool, user, "a.csv", b"x", None).await.unwrap();
        let records = vec![
            parsed(1, "Migros", "-10.00", "CHF"),
            parsed(2, "Amazon EU", "-45.90", "EUR"),
        ];
        replace_transactions(&pool, user, report, &records).await.unwrap();

        let converter = CurrencyConverter::new(pool.clone(), FailingSource);
        let err = summarize(&pool, &converter, user, &TransactionFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::Conversion(_)));
    }
}
