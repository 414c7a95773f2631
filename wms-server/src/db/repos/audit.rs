//! Audit trail repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use wms_core::model::AuditAction;

use super::DbError;

/// Audit record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub scan_record_id: i64,
    pub action_type: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub changed_by: String,
    pub change_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub scan_record_id: i64,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub changed_by: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub scan_record_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub changed_by: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct AuditSummary {
    pub total: i64,
    pub updates: i64,
    pub deletes: i64,
    pub distinct_users: i64,
    pub distinct_records: i64,
}

/// Write one audit entry on an open connection or transaction.
pub(crate) async fn insert_entry(
    conn: &mut PgConnection,
    entry: &NewAuditEntry,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs
            (scan_record_id, action_type, old_values, new_values, changed_by, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entry.scan_record_id)
    .bind(entry.action.as_str())
    .bind(&entry.old_values)
    .bind(&entry.new_values)
    .bind(&entry.changed_by)
    .bind(&entry.notes)
    .execute(conn)
    .await?;
    Ok(())
}

/// Audit trail repository
pub struct AuditRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: &NewAuditEntry) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        insert_entry(&mut conn, entry).await
    }

    /// Entries matching the filter, newest first.
    pub async fn query(&self, filter: &AuditQuery) -> Result<Vec<AuditEntry>, DbError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT id, scan_record_id, action_type, old_values, new_values,
                   changed_by, change_date, notes
            FROM audit_logs
            WHERE TRUE
            "#,
        );

        if let Some(id) = filter.scan_record_id {
            qb.push(" AND scan_record_id = ").push_bind(id);
        }
        if let Some(action) = filter.action {
            qb.push(" AND action_type = ").push_bind(action.as_str());
        }
        if let Some(user) = &filter.changed_by {
            qb.push(" AND changed_by = ").push_bind(user.clone());
        }
        if let Some(start) = filter.start {
            qb.push(" AND change_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end {
            qb.push(" AND change_date < ").push_bind(end);
        }
        qb.push(" ORDER BY change_date DESC, id DESC LIMIT ")
            .push_bind(filter.limit);

        let rows = qb.build_query_as::<AuditEntry>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Totals for `[start, end)`.
    pub async fn summary(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AuditSummary, DbError> {
        let summary = sqlx::query_as::<_, AuditSummary>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE action_type = 'UPDATE') AS updates,
                   COUNT(*) FILTER (WHERE action_type = 'DELETE') AS deletes,
                   COUNT(DISTINCT changed_by) AS distinct_users,
                   COUNT(DISTINCT scan_record_id) AS distinct_records
            FROM audit_logs
            WHERE change_date >= $1 AND change_date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(self.pool)
        .await?;
        Ok(summary)
    }
}
