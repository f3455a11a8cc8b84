use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite};

use crate::db::decode_error;

/// Stored rate converting one unit of `base` into `target` on `date`.
pub async fn get_exchange_rate<'e, E>(
    executor: E,
    date: NaiveDate,
    base: &str,
    target: &str,
) -> Result<Option<Decimal>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rate: Option<String> = sqlx::query_scalar(
        "SELECT rate FROM exchange_rates WHERE rate_date = ? AND base_currency = ? AND target_currency = ?",
    )
    .bind(date)
    .bind(base)
    .bind(target)
    .fetch_optional(executor)
    .await?;

    rate.map(|text| {
        Decimal::from_str(&text).map_err(|e| decode_error(format!("exchange rate {text:?}: {e}")))
    })
    .transpose()
}

pub async fn upsert_exchange_rate<'e, E>(
    executor: E,
    date: NaiveDate,
    base: &str,
    target: &str,
    rate: Decimal,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO exchange_rates (rate_date, base_currency, target_currency, rate) VALUES (?, ?, ?, ?) \
         ON CONFLICT (rate_date, base_currency, target_currency) \
         DO UPDATE SET rate = excluded.rate, fetched_at = datetime('now')",
    )
    .bind(date)
    .bind(base)
    .bind(target)
    .bind(rate.normalize().to_string())
    .execute(executor)
    .await?;
    Ok(())
}
