//! Per-barcode popup notification repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

const COLUMNS: &str =
    "id, barcode, event_type, popup_type, title, message, is_enabled, created_date, created_by";

/// Notification rule from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub barcode: String,
    pub event_type: String,
    pub popup_type: String,
    pub title: Option<String>,
    pub message: String,
    pub is_enabled: bool,
    pub created_date: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub barcode: String,
    pub event_type: String,
    pub popup_type: String,
    pub title: Option<String>,
    pub message: String,
    pub created_by: String,
}

/// Notification repository
pub struct NotificationRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest enabled rule for a barcode.
    pub async fn for_barcode(&self, barcode: &str) -> Result<Option<Notification>, DbError> {
        let row = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {COLUMNS} FROM notification_data
            WHERE barcode = $1 AND is_enabled
            ORDER BY created_date DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(barcode)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<Notification>, DbError> {
        let rows = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {COLUMNS} FROM notification_data ORDER BY created_date DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, new: &NewNotification) -> Result<Notification, DbError> {
        let row = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notification_data
                (barcode, event_type, popup_type, title, message, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&new.barcode)
        .bind(&new.event_type)
        .bind(&new.popup_type)
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.created_by)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM notification_data WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip `is_enabled` and return the updated rule.
    pub async fn toggle(&self, id: i64) -> Result<Notification, DbError> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notification_data SET is_enabled = NOT is_enabled
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("notification", id))
    }

    /// Remove every rule. Returns how many were deleted.
    pub async fn clear(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM notification_data")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Replace all rules with `rules` in one transaction.
    pub async fn replace_all(&self, rules: &[NewNotification]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM notification_data")
            .execute(&mut *tx)
            .await?;

        let mut written = 0;
        for rule in rules {
            let result = sqlx::query(
                r#"
                INSERT INTO notification_data
                    (barcode, event_type, popup_type, title, message, created_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&rule.barcode)
            .bind(&rule.event_type)
            .bind(&rule.popup_type)
            .bind(&rule.title)
            .bind(&rule.message)
            .bind(&rule.created_by)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }
}
