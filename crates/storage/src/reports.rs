use cashtrack_core::{Report, ReportId, ReportStatus, UserId};
use sqlx::{Executor, Sqlite};

use crate::db::decode_error;

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: i64,
    user_id: i64,
    filename: String,
    content: Vec<u8>,
    content_type: Option<String>,
    status: String,
    status_description: Option<String>,
    uploaded_at: String,
}

impl TryFrom<ReportRow> for Report {
    type Error = sqlx::Error;

    fn try_from(r: ReportRow) -> Result<Self, Self::Error> {
        Ok(Report {
            id: ReportId(r.id),
            user_id: UserId(r.user_id),
            filename: r.filename,
            content: r.content,
            content_type: r.content_type,
            status: r.status.parse().map_err(decode_error)?,
            status_description: r.status_description,
            uploaded_at: r.uploaded_at,
        })
    }
}

const REPORT_COLUMNS: &str =
    "id, user_id, filename, content, content_type, status, status_description, uploaded_at";

/// Stores an uploaded file as a pending report.
pub async fn insert_report<'e, E>(
    executor: E,
    user_id: UserId,
    filename: &str,
    content: &[u8],
    content_type: Option<&str>,
) -> Result<ReportId, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO reports (user_id, filename, content, content_type, status) VALUES (?, ?, ?, ?, 'pending') RETURNING id",
    )
    .bind(user_id.0)
    .bind(filename)
    .bind(content)
    .bind(content_type)
    .fetch_one(executor)
    .await?;
    Ok(ReportId(id))
}

pub async fn get_report<'e, E>(
    executor: E,
    user_id: UserId,
    report_id: ReportId,
) -> Result<Option<Report>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE id = ? AND user_id = ?"
    ))
    .bind(report_id.0)
    .bind(user_id.0)
    .fetch_optional(executor)
    .await?;
    row.map(Report::try_from).transpose()
}

/// All pending reports across users, oldest upload first.
pub async fn list_pending_reports<'e, E>(executor: E) -> Result<Vec<Report>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE status = 'pending' ORDER BY uploaded_at, id"
    ))
    .fetch_all(executor)
    .await?;
    rows.into_iter().map(Report::try_from).collect()
}

/// A blank description is stored as NULL.
pub async fn update_report_status<'e, E>(
    executor: E,
    user_id: UserId,
    report_id: ReportId,
    status: ReportStatus,
    description: Option<&str>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let description = description.filter(|d| !d.trim().is_empty());
    let result = sqlx::query(
        "UPDATE reports SET status = ?, status_description = ? WHERE id = ? AND user_id = ?",
    )
    .bind(status.as_str())
    .bind(description)
    .bind(report_id.0)
    .bind(user_id.0)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Queues a report for a full reprocess.
pub async fn reset_report<'e, E>(
    executor: E,
    user_id: UserId,
    report_id: ReportId,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    update_report_status(executor, user_id, report_id, ReportStatus::Pending, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;

    #[tokio::test]
    async fn insert_and_fetch_report() {
        let (_dir, pool) = temp_db().await;
        let id = insert_report(&pool, UserId(7), "statement.csv", b"a;b\n", Some("text/csv"))
            .await
            .unwrap();

        let report = get_report(&pool, UserId(7), id).await.unwrap().unwrap();
        assert_eq!(report.filename, "statement.csv");
        assert_eq!(report.content, b"a;b\n");
        assert_eq!(report.content_type.as_deref(), Some("text/csv"));
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.status_description, None);
        assert!(!report.uploaded_at.is_empty());
    }

    #[tokio::test]
    async fn reports_are_scoped_to_owner() {
        let (_dir, pool) = temp_db().await;
        let id = insert_report(&pool, UserId(1), "a.csv", b"x", None).await.unwrap();
        assert!(get_report(&pool, UserId(2), id).await.unwrap().is_none());
        let updated = update_report_status(&pool, UserId(2), id, ReportStatus::Failed, Some("x"))
            .await
            .unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn status_transitions_and_reset() {
        let (_dir, pool) = temp_db().await;
        let user = UserId(1);
        let first = insert_report(&pool, user, "a.csv", b"x", None).await.unwrap();
        let second = insert_report(&pool, user, "b.csv", b"y", None).await.unwrap();

        let pending = list_pending_reports(&pool).await.unwrap();
        assert_eq!(pending.iter().map(|r| r.id).collect::<Vec<_>>(), vec![first, second]);

        update_report_status(&pool, user, first, ReportStatus::Failed, Some("no parser available"))
            .await
            .unwrap();
        update_report_status(&pool, user, second, ReportStatus::Processed, Some("  "))
            .await
            .unwrap();
        assert!(list_pending_reports(&pool).await.unwrap().is_empty());

        let failed = get_report(&pool, user, first).await.unwrap().unwrap();
        assert_eq!(failed.status, ReportStatus::Failed);
        assert_eq!(failed.status_description.as_deref(), Some("no parser available"));
        let processed = get_report(&pool, user, second).await.unwrap().unwrap();
        assert_eq!(processed.status_description, None);

        reset_report(&pool, user, first).await.unwrap();
        let reset = get_report(&pool, user, first).await.unwrap().unwrap();
        assert_eq!(reset.status, ReportStatus::Pending);
        assert_eq!(reset.status_description, None);
    }
}
