//! Scan ledger repository
//!
//! Edits and deletions write their audit entry inside the same transaction
//! as the change itself.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use wms_core::model::AuditAction;

use super::audit::{insert_entry, NewAuditEntry};
use super::DbError;

const SELECT_ROW: &str = r#"
    SELECT s.id, s.barcode, s.scan_date, s.job_type, s.user_id,
           s.job_id, s.sub_job_id, sj.sub_job_name, s.notes
    FROM scan_logs s
    LEFT JOIN sub_job_types sj ON sj.id = s.sub_job_id
"#;

/// One scan with its sub job name resolved
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ScanRow {
    pub id: i64,
    pub barcode: String,
    pub scan_date: DateTime<Utc>,
    /// Job name as it was when scanned
    pub job_type: String,
    pub user_id: String,
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub sub_job_name: Option<String>,
    pub notes: Option<String>,
}

/// Scan to insert
#[derive(Debug, Clone)]
pub struct NewScan {
    pub barcode: String,
    pub job_type: String,
    pub user_id: String,
    pub job_id: i64,
    pub sub_job_id: Option<i64>,
    pub notes: Option<String>,
}

/// History filter with day bounds already resolved to UTC
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub barcode_contains: Option<String>,
    pub notes_contains: Option<String>,
    pub user_id: Option<String>,
    pub limit: i64,
}

/// `%term%` for ILIKE with wildcards in the term escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Scan ledger repository
pub struct ScanLogRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ScanLogRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: i64) -> Result<Option<ScanRow>, DbError> {
        let row = sqlx::query_as::<_, ScanRow>(&format!("{SELECT_ROW} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Result<ScanRow, DbError> {
        self.find(id).await?.ok_or_else(|| DbError::not_found("scan", id))
    }

    /// Which of `job_ids` the barcode has ever been scanned under.
    pub async fn scanned_job_ids(
        &self,
        barcode: &str,
        job_ids: &[i64],
    ) -> Result<HashSet<i64>, DbError> {
        if job_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT job_id FROM scan_logs
            WHERE barcode = $1 AND job_id = ANY($2)
            "#,
        )
        .bind(barcode)
        .bind(job_ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn insert(&self, scan: &NewScan) -> Result<ScanRow, DbError> {
        let mut tx = self.pool.begin().await?;
        let row = insert_row(&mut tx, scan).await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Insert `scan` unless the same barcode, job and sub job was scanned
    /// at or after `since`.
    ///
    /// Check and insert share a transaction holding an advisory lock on the
    /// barcode, so concurrent identical scans are serialized.
    pub async fn insert_unless_duplicate(
        &self,
        scan: &NewScan,
        since: DateTime<Utc>,
    ) -> Result<ScanInsert, DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&scan.barcode)
            .execute(&mut *tx)
            .await?;

        let existing =
            latest_since(&mut *tx, &scan.barcode, scan.job_id, scan.sub_job_id, since).await?;
        if let Some(existing) = existing {
            tx.rollback().await?;
            return Ok(ScanInsert::Duplicate(existing));
        }

        let row = insert_row(&mut tx, scan).await?;
        tx.commit().await?;
        Ok(ScanInsert::Inserted(row))
    }

    /// Insert many scans atomically. Returns the number written.
    pub async fn insert_many(&self, scans: &[NewScan]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for scan in scans {
            let result = sqlx::query(
                r#"
                INSERT INTO scan_logs (barcode, job_type, user_id, job_id, sub_job_id, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&scan.barcode)
            .bind(&scan.job_type)
            .bind(&scan.user_id)
            .bind(scan.job_id)
            .bind(scan.sub_job_id)
            .bind(&scan.notes)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    /// Filtered history, newest first.
    pub async fn history(&self, query: &HistoryQuery) -> Result<Vec<ScanRow>, DbError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_ROW);
        qb.push(" WHERE TRUE");

        if let Some(start) = query.start {
            qb.push(" AND s.scan_date >= ").push_bind(start);
        }
        if let Some(end) = query.end {
            qb.push(" AND s.scan_date < ").push_bind(end);
        }
        if let Some(job_id) = query.job_id {
            qb.push(" AND s.job_id = ").push_bind(job_id);
        }
        if let Some(sub_job_id) = query.sub_job_id {
            qb.push(" AND s.sub_job_id = ").push_bind(sub_job_id);
        }
        if let Some(term) = &query.barcode_contains {
            qb.push(" AND s.barcode ILIKE ")
                .push_bind(contains_pattern(term));
        }
        if let Some(term) = &query.notes_contains {
            qb.push(" AND s.notes ILIKE ").push_bind(contains_pattern(term));
        }
        if let Some(user) = &query.user_id {
            qb.push(" AND s.user_id = ").push_bind(user.clone());
        }

        qb.push(" ORDER BY s.scan_date DESC, s.id DESC LIMIT ")
            .push_bind(query.limit);

        let rows = qb.build_query_as::<ScanRow>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Count scans for a job (and sub job) inside `[start, end)`.
    pub async fn count(
        &self,
        job_id: i64,
        sub_job_id: Option<i64>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        notes_contains: Option<&str>,
    ) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM scan_logs
            WHERE job_id = $1
              AND ($2::bigint IS NULL OR sub_job_id = $2)
              AND scan_date >= $3 AND scan_date < $4
              AND ($5::text IS NULL OR notes ILIKE $5)
            "#,
        )
        .bind(job_id)
        .bind(sub_job_id)
        .bind(start)
        .bind(end)
        .bind(notes_contains.map(contains_pattern))
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ScanRow>, DbError> {
        let rows = sqlx::query_as::<_, ScanRow>(&format!(
            "{SELECT_ROW} ORDER BY s.scan_date DESC, s.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Replace the notes of a scan and record an UPDATE audit entry.
    pub async fn update_notes(
        &self,
        id: i64,
        notes: Option<&str>,
        changed_by: &str,
    ) -> Result<ScanRow, DbError> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, ScanRow>(&format!(
            "{SELECT_ROW} WHERE s.id = $1 FOR UPDATE OF s"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("scan", id))?;

        sqlx::query("UPDATE scan_logs SET notes = $2 WHERE id = $1")
            .bind(id)
            .bind(notes)
            .execute(&mut *tx)
            .await?;

        let new = ScanRow {
            notes: notes.map(str::to_owned),
            ..old.clone()
        };
        insert_entry(
            &mut *tx,
            &NewAuditEntry {
                scan_record_id: id,
                action: AuditAction::Update,
                old_values: Some(serde_json::json!({ "notes": old.notes })),
                new_values: Some(serde_json::json!({ "notes": new.notes })),
                changed_by: changed_by.to_owned(),
                notes: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(new)
    }

    /// Delete a scan and record a DELETE audit entry holding the old row.
    pub async fn delete(&self, id: i64, changed_by: &str) -> Result<ScanRow, DbError> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, ScanRow>(&format!(
            "{SELECT_ROW} WHERE s.id = $1 FOR UPDATE OF s"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("scan", id))?;

        insert_entry(
            &mut *tx,
            &NewAuditEntry {
                scan_record_id: id,
                action: AuditAction::Delete,
                old_values: Some(serde_json::json!(old)),
                new_values: None,
                changed_by: changed_by.to_owned(),
                notes: None,
            },
        )
        .await?;

        sqlx::query("DELETE FROM scan_logs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(old)
    }
}

/// Outcome of [`ScanLogRepo::insert_unless_duplicate`]
#[derive(Debug, Clone)]
pub enum ScanInsert {
    Inserted(ScanRow),
    /// The earlier scan inside the window
    Duplicate(ScanRow),
}

/// Most recent scan with the same key at or after `since`.
///
/// A missing sub job matches only scans without one.
async fn latest_since<'e, E>(
    executor: E,
    barcode: &str,
    job_id: i64,
    sub_job_id: Option<i64>,
    since: DateTime<Utc>,
) -> Result<Option<ScanRow>, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ScanRow>(&format!(
        r#"{SELECT_ROW}
        WHERE s.barcode = $1
          AND s.job_id = $2
          AND s.sub_job_id IS NOT DISTINCT FROM $3::bigint
          AND s.scan_date >= $4
        ORDER BY s.scan_date DESC
        LIMIT 1
        "#
    ))
    .bind(barcode)
    .bind(job_id)
    .bind(sub_job_id)
    .bind(since)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

async fn insert_row(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    scan: &NewScan,
) -> Result<ScanRow, DbError> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO scan_logs (barcode, job_type, user_id, job_id, sub_job_id, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&scan.barcode)
    .bind(&scan.job_type)
    .bind(&scan.user_id)
    .bind(scan.job_id)
    .bind(scan.sub_job_id)
    .bind(&scan.notes)
    .fetch_one(&mut **tx)
    .await?;

    let row = sqlx::query_as::<_, ScanRow>(&format!("{SELECT_ROW} WHERE s.id = $1"))
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("BC"), "%BC%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn null_sub_job_matches_only_null() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrate");

        let job = crate::db::repos::JobTypeRepo::new(&pool)
            .create(&format!("dup-{}", uuid::Uuid::new_v4()))
            .await
            .expect("job");
        let repo = ScanLogRepo::new(&pool);
        let barcode = format!("BC-{}", uuid::Uuid::new_v4());
        let scan = repo
            .insert(&NewScan {
                barcode: barcode.clone(),
                job_type: job.job_name.clone(),
                user_id: "tester".into(),
                job_id: job.id,
                sub_job_id: None,
                notes: None,
            })
            .await
            .expect("insert");

        let since = Utc::now() - chrono::Duration::hours(1);
        let hit = latest_since(&pool, &barcode, job.id, None, since).await.expect("query");
        assert_eq!(hit.map(|r| r.id), Some(scan.id));

        let miss = latest_since(&pool, &barcode, job.id, Some(i64::MAX), since)
            .await
            .expect("query");
        assert!(miss.is_none());

        repo.delete(scan.id, "tester").await.expect("delete");
        crate::db::repos::JobTypeRepo::new(&pool)
            .delete(job.id)
            .await
            .expect("cleanup");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_identical_scans_insert_once() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrate");

        let job = crate::db::repos::JobTypeRepo::new(&pool)
            .create(&format!("race-{}", uuid::Uuid::new_v4()))
            .await
            .expect("job");
        let scan = NewScan {
            barcode: format!("BC-{}", uuid::Uuid::new_v4()),
            job_type: job.job_name.clone(),
            user_id: "tester".into(),
            job_id: job.id,
            sub_job_id: None,
            notes: None,
        };
        let since = Utc::now() - chrono::Duration::hours(1);

        let first = ScanLogRepo::new(&pool);
        let second = ScanLogRepo::new(&pool);
        let (a, b) = tokio::join!(
            first.insert_unless_duplicate(&scan, since),
            second.insert_unless_duplicate(&scan, since)
        );
        let outcomes = [a.expect("first"), b.expect("second")];

        let inserted: Vec<&ScanRow> = outcomes
            .iter()
            .filter_map(|o| match o {
                ScanInsert::Inserted(row) => Some(row),
                ScanInsert::Duplicate(_) => None,
            })
            .collect();
        assert_eq!(inserted.len(), 1);
        let kept = inserted[0].id;
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, ScanInsert::Duplicate(row) if row.id == kept)));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scan_logs WHERE barcode = $1")
            .bind(&scan.barcode)
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count.0, 1);

        first.delete(kept, "tester").await.expect("delete");
        crate::db::repos::JobTypeRepo::new(&pool)
            .delete(job.id)
            .await
            .expect("cleanup");
    }
}
