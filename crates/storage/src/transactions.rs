use chrono::NaiveDate;
use sqlx::{Executor, QueryBuilder, Sqlite};

use cashtrack_core::filter::non_blank;
use cashtrack_core::{
    CategoryId, CategorySource, EntryType, Money, ReportId, Transaction, TransactionFilter, UserId,
};

use crate::db::{decode_error, DbPool};

/// A canonical row ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub report_id: ReportId,
    pub row: i64,
    pub parser_name: String,
    pub posted_date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub entry_type: EntryType,
    pub account_number: Option<String>,
    pub card_number: Option<String>,
    pub category_id: Option<CategoryId>,
    pub category_source: Option<CategorySource>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    user_id: i64,
    report_id: i64,
    source_row: i64,
    parser_name: String,
    posted_date: NaiveDate,
    description: String,
    amount_cents: i64,
    currency: String,
    transaction_id: Option<String>,
    entry_type: String,
    account_number: Option<String>,
    card_number: Option<String>,
    category_id: Option<i64>,
    category_source: Option<String>,
    parser_meta: Option<String>,
    created_at: String,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = sqlx::Error;

    fn try_from(r: TransactionRow) -> Result<Self, Self::Error> {
        let category_source = r
            .category_source
            .as_deref()
            .map(str::parse::<CategorySource>)
            .transpose()
            .map_err(decode_error)?;
        let metadata = r
            .parser_meta
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|e| decode_error(format!("parser_meta: {e}")))?;

        Ok(Transaction {
            id: r.id,
            user_id: UserId(r.user_id),
            report_id: ReportId(r.report_id),
            row: r.source_row,
            parser_name: r.parser_name,
            posted_date: r.posted_date,
            description: r.description,
            amount: Money::from_cents(r.amount_cents),
            currency: r.currency,
            transaction_id: r.transaction_id,
            entry_type: r.entry_type.parse().map_err(decode_error)?,
            account_number: r.account_number,
            card_number: r.card_number,
            category_id: r.category_id.map(CategoryId),
            category_source,
            metadata,
            created_at: r.created_at,
        })
    }
}

const TRANSACTION_COLUMNS: &str = "id, user_id, report_id, source_row, parser_name, posted_date, \
     description, amount_cents, currency, transaction_id, entry_type, account_number, \
     card_number, category_id, category_source, parser_meta, created_at";

pub async fn insert_transaction<'e, E>(executor: E, tx: &NewTransaction) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO transactions (user_id, report_id, source_row, parser_name, posted_date, \
         description, amount_cents, currency, transaction_id, entry_type, account_number, \
         card_number, category_id, category_source, parser_meta) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(tx.user_id.0)
    .bind(tx.report_id.0)
    .bind(tx.row)
    .bind(&tx.parser_name)
    .bind(tx.posted_date)
    .bind(&tx.description)
    .bind(tx.amount.to_cents())
    .bind(&tx.currency)
    .bind(&tx.transaction_id)
    .bind(tx.entry_type.as_str())
    .bind(&tx.account_number)
    .bind(&tx.card_number)
    .bind(tx.category_id.map(|c| c.0))
    .bind(tx.category_source.map(CategorySource::as_str))
    .bind(tx.metadata.as_ref().map(|m| m.to_string()))
    .fetch_one(executor)
    .await?;
    Ok(id)
}

pub async fn delete_transactions_for_report<'e, E>(
    executor: E,
    user_id: UserId,
    report_id: ReportId,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM transactions WHERE user_id = ? AND report_id = ?")
        .bind(user_id.0)
        .bind(report_id.0)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_transactions_for_report<'e, E>(
    executor: E,
    user_id: UserId,
    report_id: ReportId,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE user_id = ? AND report_id = ?")
        .bind(user_id.0)
        .bind(report_id.0)
        .fetch_one(executor)
        .await
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, user_id: UserId, filter: &TransactionFilter) {
    qb.push(" WHERE user_id = ").push_bind(user_id.0);
    if let Some(from) = filter.from_date {
        qb.push(" AND posted_date >= ").push_bind(from);
    }
    if let Some(to) = filter.to_date {
        qb.push(" AND posted_date <= ").push_bind(to);
    }
    if let Some(report_id) = filter.report_id {
        qb.push(" AND report_id = ").push_bind(report_id.0);
    }
    if let Some(entry_type) = filter.entry_type {
        qb.push(" AND entry_type = ").push_bind(entry_type.as_str());
    }
    if let Some(text) = non_blank(filter.search_text.as_deref()) {
        // instr() keeps user input free of LIKE wildcards.
        qb.push(" AND instr(LOWER(description), ")
            .push_bind(text.to_lowercase())
            .push(") > 0");
    }
    if let Some(account) = non_blank(filter.account_number.as_deref()) {
        qb.push(" AND account_number = ").push_bind(account.to_string());
    }
    if let Some(card) = non_blank(filter.card_number.as_deref()) {
        qb.push(" AND card_number = ").push_bind(card.to_string());
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id.0);
    }
}

/// Filtered page of a user's transactions, newest first.
pub async fn list_transactions(
    pool: &DbPool,
    user_id: UserId,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut qb =
        QueryBuilder::<Sqlite>::new(format!("SELECT {TRANSACTION_COLUMNS} FROM transactions"));
    push_filter(&mut qb, user_id, filter);
    qb.push(" ORDER BY posted_date DESC, id DESC LIMIT ")
        .push_bind(i64::from(filter.effective_limit()))
        .push(" OFFSET ")
        .push_bind(i64::from(filter.effective_offset()));

    let rows: Vec<TransactionRow> = qb.build_query_as().fetch_all(pool).await?;
    rows.into_iter().map(Transaction::try_from).collect()
}

/// The columns a summary needs, in source currency.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SummaryRow {
    pub amount_cents: i64,
    pub currency: String,
    pub posted_date: NaiveDate,
    pub account_number: Option<String>,
    pub card_number: Option<String>,
}

impl SummaryRow {
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Every row matching the filter. Limit and offset are ignored.
pub async fn list_summary_rows(
    pool: &DbPool,
    user_id: UserId,
    filter: &TransactionFilter,
) -> Result<Vec<SummaryRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT amount_cents, currency, posted_date, account_number, card_number FROM transactions",
    );
    push_filter(&mut qb, user_id, filter);
    qb.push(" ORDER BY posted_date, id");
    qb.build_query_as().fetch_all(pool).await
}

/// A transaction as seen by a rule re-application pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCandidate {
    pub id: i64,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub category_source: Option<CategorySource>,
}

/// Rows eligible for rule re-application. Manually categorized rows are
/// only returned when `include_manual` is set.
pub async fn list_rule_candidates<'e, E>(
    executor: E,
    user_id: UserId,
    include_manual: bool,
) -> Result<Vec<RuleCandidate>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = if include_manual {
        "SELECT id, description, category_id, category_source FROM transactions \
         WHERE user_id = ? ORDER BY id"
    } else {
        "SELECT id, description, category_id, category_source FROM transactions \
         WHERE user_id = ? AND (category_source IS NULL OR category_source = 'rule') ORDER BY id"
    };
    let rows: Vec<(i64, String, Option<i64>, Option<String>)> =
        sqlx::query_as(sql).bind(user_id.0).fetch_all(executor).await?;

    rows.into_iter()
        .map(|(id, description, category_id, source)| {
            Ok::<_, sqlx::Error>(RuleCandidate {
                id,
                description,
                category_id: category_id.map(CategoryId),
                category_source: source
                    .as_deref()
                    .map(str::parse::<CategorySource>)
                    .transpose()
                    .map_err(decode_error)?,
            })
        })
        .collect()
}

pub async fn update_transaction_category<'e, E>(
    executor: E,
    user_id: UserId,
    transaction_id: i64,
    category_id: Option<CategoryId>,
    source: Option<CategorySource>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE transactions SET category_id = ?, category_source = ? WHERE id = ? AND user_id = ?",
    )
    .bind(category_id.map(|c| c.0))
    .bind(source.map(CategorySource::as_str))
    .bind(transaction_id)
    .bind(user_id.0)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Pins a category chosen by the user. Clearing the category also clears its source.
pub async fn set_manual_category<'e, E>(
    executor: E,
    user_id: UserId,
    transaction_id: i64,
    category_id: Option<CategoryId>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let source = category_id.map(|_| CategorySource::Manual);
    update_transaction_category(executor, user_id, transaction_id, category_id, source).await
}
