//! Report queries
//!
//! All ranges are half-open `[start, end)` in UTC; callers compute them
//! from site-local days.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::scan_logs::{contains_pattern, ScanRow};
use super::DbError;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobMonthlyCount {
    pub job_id: Option<i64>,
    pub job_name: String,
    pub scan_count: i64,
    pub distinct_barcodes: i64,
    pub distinct_users: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserActivity {
    pub user_id: String,
    pub total_scans: i64,
    pub distinct_barcodes: i64,
    pub active_days: i64,
    pub first_scan: DateTime<Utc>,
    pub last_scan: DateTime<Utc>,
}

pub struct ReportRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Scans for one job (optionally one sub job) in a window, newest first.
    pub async fn daily(
        &self,
        job_id: i64,
        sub_job_id: Option<i64>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        notes_contains: Option<&str>,
    ) -> Result<Vec<ScanRow>, DbError> {
        let rows = sqlx::query_as::<_, ScanRow>(
            r#"
            SELECT s.id, s.barcode, s.scan_date,
                   COALESCE(j.job_name, s.job_type) AS job_type,
                   s.user_id, s.job_id, s.sub_job_id, sj.sub_job_name, s.notes
            FROM scan_logs s
            LEFT JOIN job_types j ON j.id = s.job_id
            LEFT JOIN sub_job_types sj ON sj.id = s.sub_job_id
            WHERE s.job_id = $1
              AND ($2::bigint IS NULL OR s.sub_job_id = $2)
              AND s.scan_date >= $3 AND s.scan_date < $4
              AND ($5::text IS NULL OR s.notes ILIKE $5)
            ORDER BY s.scan_date DESC, s.id DESC
            "#,
        )
        .bind(job_id)
        .bind(sub_job_id)
        .bind(start)
        .bind(end)
        .bind(notes_contains.map(contains_pattern))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Per-job counts in a window, busiest job first.
    pub async fn per_job(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<JobMonthlyCount>, DbError> {
        let rows = sqlx::query_as::<_, JobMonthlyCount>(
            r#"
            SELECT s.job_id,
                   COALESCE(j.job_name, s.job_type) AS job_name,
                   COUNT(*) AS scan_count,
                   COUNT(DISTINCT s.barcode) AS distinct_barcodes,
                   COUNT(DISTINCT s.user_id) AS distinct_users
            FROM scan_logs s
            LEFT JOIN job_types j ON j.id = s.job_id
            WHERE s.scan_date >= $1 AND s.scan_date < $2
            GROUP BY s.job_id, COALESCE(j.job_name, s.job_type)
            ORDER BY scan_count DESC, job_name
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Distinct barcodes and users across every job in a window.
    pub async fn window_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(i64, i64, i64), DbError> {
        let totals = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(DISTINCT barcode), COUNT(DISTINCT user_id)
            FROM scan_logs
            WHERE scan_date >= $1 AND scan_date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(self.pool)
        .await?;
        Ok(totals)
    }

    /// Per-user activity in a window. Active days are counted in `tz`.
    pub async fn user_activity(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        tz: &str,
    ) -> Result<Vec<UserActivity>, DbError> {
        let rows = sqlx::query_as::<_, UserActivity>(
            r#"
            SELECT user_id,
                   COUNT(*) AS total_scans,
                   COUNT(DISTINCT barcode) AS distinct_barcodes,
                   COUNT(DISTINCT (scan_date AT TIME ZONE $3)::date) AS active_days,
                   MIN(scan_date) AS first_scan,
                   MAX(scan_date) AS last_scan
            FROM scan_logs
            WHERE scan_date >= $1 AND scan_date < $2
            GROUP BY user_id
            ORDER BY total_scans DESC, user_id
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(tz)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
