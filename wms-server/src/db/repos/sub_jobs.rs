//! Sub job type repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

const COLUMNS: &str = r#"
    s.id, s.main_job_id, j.job_name AS main_job_name, s.sub_job_name,
    s.description, s.is_active, s.created_at, s.updated_at
"#;

/// Sub job type with its parent job name
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubJobType {
    pub id: i64,
    pub main_job_id: i64,
    pub main_job_name: String,
    pub sub_job_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sub job type repository
pub struct SubJobRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SubJobRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Sub jobs of one main job, by name. Inactive ones only when asked.
    pub async fn list_by_job(
        &self,
        main_job_id: i64,
        include_inactive: bool,
    ) -> Result<Vec<SubJobType>, DbError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM sub_job_types s
            JOIN job_types j ON j.id = s.main_job_id
            WHERE s.main_job_id = $1 AND ($2 OR s.is_active)
            ORDER BY s.sub_job_name
            "#
        );
        let rows = sqlx::query_as::<_, SubJobType>(&sql)
            .bind(main_job_id)
            .bind(include_inactive)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Every sub job, active or not.
    pub async fn list_all(&self) -> Result<Vec<SubJobType>, DbError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM sub_job_types s
            JOIN job_types j ON j.id = s.main_job_id
            ORDER BY j.job_name, s.sub_job_name
            "#
        );
        let rows = sqlx::query_as::<_, SubJobType>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find(&self, id: i64) -> Result<Option<SubJobType>, DbError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM sub_job_types s
            JOIN job_types j ON j.id = s.main_job_id
            WHERE s.id = $1
            "#
        );
        let row = sqlx::query_as::<_, SubJobType>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Result<SubJobType, DbError> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("sub job type", id))
    }

    /// Insert a sub job. A name taken under the same main job surfaces as a
    /// unique violation.
    pub async fn create(
        &self,
        main_job_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<SubJobType, DbError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sub_job_types (main_job_id, sub_job_name, description)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(main_job_id)
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await?;
        self.get(id).await
    }

    pub async fn update(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<SubJobType, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE sub_job_types
            SET sub_job_name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("sub job type", id));
        }
        self.get(id).await
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<SubJobType, DbError> {
        let result = sqlx::query(
            "UPDATE sub_job_types SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("sub job type", id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM sub_job_types WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn scan_count(&self, id: i64) -> Result<i64, DbError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM scan_logs WHERE sub_job_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sub_job_types")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
