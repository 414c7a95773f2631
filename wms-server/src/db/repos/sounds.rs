//! Sound setting repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

const COLUMNS: &str = "id, job_id, sub_job_id, event_type, sound_file, volume, is_enabled, updated_at";

/// Sound setting from database. Both ids NULL is the site-wide default.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SoundSetting {
    pub id: i64,
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub event_type: String,
    pub sound_file: String,
    pub volume: f32,
    pub is_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSoundSetting {
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub event_type: String,
    pub sound_file: String,
    pub volume: f32,
    pub is_enabled: bool,
}

/// Sound setting repository
pub struct SoundRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SoundRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<SoundSetting>, DbError> {
        let rows = sqlx::query_as::<_, SoundSetting>(&format!(
            "SELECT {COLUMNS} FROM sound_settings ORDER BY event_type, job_id NULLS FIRST, sub_job_id NULLS FIRST"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Enabled settings for an event that could apply to `(job, sub job)`:
    /// the sub job's own, the job's own, and the site default.
    pub async fn candidates(
        &self,
        job_id: Option<i64>,
        sub_job_id: Option<i64>,
        event_type: &str,
    ) -> Result<Vec<SoundSetting>, DbError> {
        let rows = sqlx::query_as::<_, SoundSetting>(&format!(
            r#"
            SELECT {COLUMNS} FROM sound_settings
            WHERE event_type = $3 AND is_enabled
              AND ((sub_job_id IS NOT NULL AND sub_job_id = $2::bigint)
                OR (sub_job_id IS NULL AND job_id IS NOT NULL AND job_id = $1::bigint)
                OR (sub_job_id IS NULL AND job_id IS NULL))
            "#
        ))
        .bind(job_id)
        .bind(sub_job_id)
        .bind(event_type)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert or replace the setting for `(job, sub job, event)`.
    pub async fn upsert(&self, new: &NewSoundSetting) -> Result<SoundSetting, DbError> {
        let row = sqlx::query_as::<_, SoundSetting>(&format!(
            r#"
            INSERT INTO sound_settings
                (job_id, sub_job_id, event_type, sound_file, volume, is_enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT ((COALESCE(job_id, 0)), (COALESCE(sub_job_id, 0)), event_type)
            DO UPDATE SET sound_file = EXCLUDED.sound_file,
                          volume = EXCLUDED.volume,
                          is_enabled = EXCLUDED.is_enabled,
                          updated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.job_id)
        .bind(new.sub_job_id)
        .bind(&new.event_type)
        .bind(&new.sound_file)
        .bind(new.volume)
        .bind(new.is_enabled)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM sound_settings WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn toggle(&self, id: i64) -> Result<SoundSetting, DbError> {
        sqlx::query_as::<_, SoundSetting>(&format!(
            r#"
            UPDATE sound_settings SET is_enabled = NOT is_enabled, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("sound setting", id))
    }
}
