//! Job dependency repository
//!
//! Edge `(job_id, required_job_id)`: scanning under `job_id` needs a prior
//! scan under `required_job_id` for the same barcode.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use wms_core::rules::RequiredJob;

use super::DbError;

/// Dependency edge with both job names
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DependencyEdge {
    pub id: i64,
    pub job_id: i64,
    pub job_name: String,
    pub required_job_id: i64,
    pub required_job_name: String,
    pub created_at: DateTime<Utc>,
}

/// Required job with the number of matching scans in a window
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequiredJobCount {
    pub job_id: i64,
    pub job_name: String,
    pub scan_count: i64,
}

/// Job dependency repository
pub struct DependencyRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> DependencyRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Jobs that must be scanned before `job_id`, by name.
    pub async fn required_jobs(&self, job_id: i64) -> Result<Vec<RequiredJob>, DbError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT j.id, j.job_name
            FROM job_dependencies d
            JOIN job_types j ON j.id = d.required_job_id
            WHERE d.job_id = $1
            ORDER BY j.job_name
            "#,
        )
        .bind(job_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(job_id, job_name)| RequiredJob { job_id, job_name })
            .collect())
    }

    /// Required jobs with scan counts inside `[start, end)`, or all time
    /// when no bounds are given.
    pub async fn required_jobs_with_counts(
        &self,
        job_id: i64,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<RequiredJobCount>, DbError> {
        let (start, end) = bounds.map_or((None, None), |(s, e)| (Some(s), Some(e)));
        let rows = sqlx::query_as::<_, RequiredJobCount>(
            r#"
            SELECT j.id AS job_id, j.job_name, COUNT(s.id) AS scan_count
            FROM job_dependencies d
            JOIN job_types j ON j.id = d.required_job_id
            LEFT JOIN scan_logs s
                ON s.job_id = j.id
               AND ($2::timestamptz IS NULL OR s.scan_date >= $2)
               AND ($3::timestamptz IS NULL OR s.scan_date < $3)
            WHERE d.job_id = $1
            GROUP BY j.id, j.job_name
            ORDER BY j.job_name
            "#,
        )
        .bind(job_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Every edge with both job names.
    pub async fn list_all(&self) -> Result<Vec<DependencyEdge>, DbError> {
        let rows = sqlx::query_as::<_, DependencyEdge>(
            r#"
            SELECT d.id, d.job_id, j.job_name, d.required_job_id,
                   r.job_name AS required_job_name, d.created_at
            FROM job_dependencies d
            JOIN job_types j ON j.id = d.job_id
            JOIN job_types r ON r.id = d.required_job_id
            ORDER BY j.job_name, r.job_name
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Bare `(job_id, required_job_id)` pairs, for cycle checks.
    pub async fn edges(&self) -> Result<Vec<(i64, i64)>, DbError> {
        let rows = sqlx::query_as("SELECT job_id, required_job_id FROM job_dependencies")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Add an edge. Returns false when it already existed.
    pub async fn add(&self, job_id: i64, required_job_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO job_dependencies (job_id, required_job_id)
            VALUES ($1, $2)
            ON CONFLICT (job_id, required_job_id) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(required_job_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove an edge. Returns false when there was none.
    pub async fn remove(&self, job_id: i64, required_job_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            "DELETE FROM job_dependencies WHERE job_id = $1 AND required_job_id = $2",
        )
        .bind(job_id)
        .bind(required_job_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace every edge of `job_id` in one transaction.
    pub async fn replace(&self, job_id: i64, required_job_ids: &[i64]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM job_dependencies WHERE job_id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        for required_job_id in required_job_ids {
            sqlx::query(
                r#"
                INSERT INTO job_dependencies (job_id, required_job_id)
                VALUES ($1, $2)
                ON CONFLICT (job_id, required_job_id) DO NOTHING
                "#,
            )
            .bind(job_id)
            .bind(required_job_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::JobTypeRepo;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn replace_swaps_edge_set() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrate");

        let jobs = JobTypeRepo::new(&pool);
        let suffix = uuid::Uuid::new_v4();
        let a = jobs.create(&format!("a-{suffix}")).await.expect("a");
        let b = jobs.create(&format!("b-{suffix}")).await.expect("b");
        let c = jobs.create(&format!("c-{suffix}")).await.expect("c");

        let repo = DependencyRepo::new(&pool);
        assert!(repo.add(c.id, a.id).await.expect("add"));
        assert!(!repo.add(c.id, a.id).await.expect("re-add"));

        repo.replace(c.id, &[b.id]).await.expect("replace");
        let required = repo.required_jobs(c.id).await.expect("required");
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].job_id, b.id);

        for job in [a, b, c] {
            jobs.delete(job.id).await.expect("cleanup");
        }
    }
}
