//! Job type repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

/// Job type record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobType {
    pub id: i64,
    pub job_name: String,
    pub created_at: DateTime<Utc>,
}

/// Job type repository
pub struct JobTypeRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> JobTypeRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All job types, ordered by name.
    pub async fn list(&self) -> Result<Vec<JobType>, DbError> {
        let jobs = sqlx::query_as::<_, JobType>(
            "SELECT id, job_name, created_at FROM job_types ORDER BY job_name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn find(&self, id: i64) -> Result<Option<JobType>, DbError> {
        let job = sqlx::query_as::<_, JobType>(
            "SELECT id, job_name, created_at FROM job_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(job)
    }

    pub async fn get(&self, id: i64) -> Result<JobType, DbError> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("job type", id))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<JobType>, DbError> {
        let job = sqlx::query_as::<_, JobType>(
            "SELECT id, job_name, created_at FROM job_types WHERE job_name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;
        Ok(job)
    }

    /// Insert a job type. A taken name surfaces as a unique violation.
    pub async fn create(&self, name: &str) -> Result<JobType, DbError> {
        let job = sqlx::query_as::<_, JobType>(
            r#"
            INSERT INTO job_types (job_name) VALUES ($1)
            RETURNING id, job_name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;
        Ok(job)
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<JobType, DbError> {
        sqlx::query_as::<_, JobType>(
            r#"
            UPDATE job_types SET job_name = $2 WHERE id = $1
            RETURNING id, job_name, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("job type", id))
    }

    /// Delete a job type. Sub jobs and dependency edges cascade.
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM job_types WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of scans recorded under the job.
    pub async fn scan_count(&self, id: i64) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scan_logs WHERE job_id = $1")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_types")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Run with: DATABASE_URL=... cargo test -p wms-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_rejects_duplicate_name() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrate");

        let repo = JobTypeRepo::new(&pool);
        let name = format!("test-{}", uuid::Uuid::new_v4());
        let job = repo.create(&name).await.expect("first insert");

        let err = repo.create(&name).await.unwrap_err();
        assert!(err.is_unique_violation());

        assert!(repo.delete(job.id).await.expect("delete"));
    }
}
