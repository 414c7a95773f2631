//! Scan processing
//!
//! A scan passes, in order: barcode validation, job lookup, sub job
//! ownership, the dependency check and the duplicate check. Only then is
//! it written to the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use wms_core::messages;
use wms_core::model::{Barcode, Notes, SoundEvent};
use wms_core::rules::{missing_requirements, parse_date, DateRange, ScanStatus};

use super::sounds::{ResolvedSound, SoundService};
use super::{clamp_limit, MissingDependencies, ServiceContext, ServiceError};
use crate::db::repos::{
    DependencyRepo, HistoryQuery, JobTypeRepo, NewScan, Notification, NotificationRepo,
    ScanInsert, ScanLogRepo, ScanRow, SubJobRepo,
};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 10_000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    pub barcode: String,
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub notes: Option<String>,
}

/// An accepted scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub message: String,
    pub record: ScanRow,
    pub scan_date_local: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<ResolvedSound>,
}

/// The earlier scan that blocks a duplicate
#[derive(Debug, Clone, Serialize)]
pub struct ExistingScan {
    pub id: i64,
    pub scan_date: DateTime<Utc>,
    pub scan_date_local: String,
    pub job_name: String,
    pub sub_job_name: String,
    pub user_id: String,
}

/// A scan refused as a duplicate
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateScan {
    pub message: String,
    pub existing: ExistingScan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<ResolvedSound>,
}

/// History query parameters as sent by clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    pub limit: Option<i64>,
    pub today_only: Option<bool>,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub barcode: Option<String>,
    pub notes: Option<String>,
    pub user_id: Option<String>,
}

/// One history row with its freshness label
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub scan: ScanRow,
    pub scan_date_local: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodaySummary {
    pub date: NaiveDate,
    pub job_id: i64,
    pub job_name: String,
    pub sub_job_id: Option<i64>,
    pub sub_job_name: String,
    pub note_filter: Option<String>,
    pub count: i64,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Turn the date-related fields of a filter into UTC bounds.
///
/// Precedence: explicit range, then `date`, then today (unless
/// `today_only` is false).
pub(crate) fn history_window(
    ctx: &ServiceContext<'_>,
    filter: &HistoryFilter,
    now: DateTime<Utc>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ServiceError> {
    let start = non_blank(&filter.start_date);
    let end = non_blank(&filter.end_date);

    let range = match (start, end, non_blank(&filter.date)) {
        (Some(s), Some(e), _) => Some(DateRange::parse(s, e)?),
        (Some(d), None, _) | (None, Some(d), _) => Some(DateRange::single(parse_date(d)?)),
        (None, None, Some(d)) => Some(DateRange::single(parse_date(d)?)),
        (None, None, None) if filter.today_only.unwrap_or(true) => {
            Some(DateRange::single(ctx.calendar.today(now)))
        }
        (None, None, None) => None,
    };

    Ok(match range {
        Some(r) => {
            let (s, e) = ctx.calendar.range_bounds(&r);
            (Some(s), Some(e))
        }
        None => (None, None),
    })
}

pub struct ScanService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> ScanService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    /// Validate, check and record one scan.
    pub async fn process(&self, req: &ScanRequest, user: &str) -> Result<ScanOutcome, ServiceError> {
        let barcode = Barcode::new(&req.barcode)?;
        let notes = Notes::new(req.notes.as_deref())?;
        let job_id = req
            .job_id
            .ok_or_else(|| ServiceError::bad_input(messages::NO_JOB_SELECTED))?;

        let job = JobTypeRepo::new(self.ctx.pool)
            .find(job_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::job_not_found(job_id)))?;

        let sub_job = match req.sub_job_id {
            None => None,
            Some(sub_id) => {
                let sub = SubJobRepo::new(self.ctx.pool)
                    .find(sub_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(messages::sub_job_not_found(sub_id)))?;
                if sub.main_job_id != job.id {
                    return Err(ServiceError::bad_input(messages::SUB_JOB_MISMATCH));
                }
                if !sub.is_active {
                    return Err(ServiceError::bad_input(messages::sub_job_inactive(sub_id)));
                }
                Some(sub)
            }
        };
        let sub_job_id = sub_job.as_ref().map(|s| s.id);
        let sounds = SoundService::new(self.ctx);

        // Dependencies: every required job needs a prior scan of this barcode
        let required = DependencyRepo::new(self.ctx.pool).required_jobs(job.id).await?;
        if !required.is_empty() {
            let ids: Vec<i64> = required.iter().map(|r| r.job_id).collect();
            let scanned = ScanLogRepo::new(self.ctx.pool)
                .scanned_job_ids(barcode.as_str(), &ids)
                .await?;
            let missing = missing_requirements(&required, &scanned);
            if !missing.is_empty() {
                tracing::info!(
                    barcode = %barcode,
                    job_id = job.id,
                    sub_job_id = ?sub_job_id,
                    user,
                    missing = missing.len(),
                    "scan rejected: dependencies not met"
                );
                let sound = sounds
                    .resolve_or_default(Some(job.id), sub_job_id, SoundEvent::Error)
                    .await;
                return Err(ServiceError::MissingDependencies(Box::new(
                    MissingDependencies::new(missing, sound),
                )));
            }
        }

        // Duplicates: same barcode, job and sub job inside the window.
        // The check and the insert run under one per-barcode lock.
        let now = Utc::now();
        let cutoff = self.ctx.config.scanning.duplicate_window().cutoff(now);
        let inserted = ScanLogRepo::new(self.ctx.pool)
            .insert_unless_duplicate(
                &NewScan {
                    barcode: barcode.as_str().to_string(),
                    job_type: job.job_name.clone(),
                    user_id: user.to_string(),
                    job_id: job.id,
                    sub_job_id,
                    notes: notes.into_inner(),
                },
                cutoff,
            )
            .await?;

        let record = match inserted {
            ScanInsert::Inserted(record) => record,
            ScanInsert::Duplicate(existing) => {
                let sub_name = existing
                    .sub_job_name
                    .clone()
                    .unwrap_or_else(|| messages::NO_SUB_JOB.to_string());
                tracing::info!(
                    barcode = %barcode,
                    job_id = job.id,
                    sub_job_id = ?sub_job_id,
                    user,
                    existing_id = existing.id,
                    "scan rejected: duplicate"
                );
                let sound = sounds
                    .resolve_or_default(Some(job.id), sub_job_id, SoundEvent::Duplicate)
                    .await;
                return Err(ServiceError::Duplicate(Box::new(DuplicateScan {
                    message: messages::duplicate_scan(
                        barcode.as_str(),
                        &existing.job_type,
                        &sub_name,
                    ),
                    existing: ExistingScan {
                        id: existing.id,
                        scan_date: existing.scan_date,
                        scan_date_local: self.ctx.calendar.format_local(existing.scan_date),
                        job_name: existing.job_type,
                        sub_job_name: sub_name,
                        user_id: existing.user_id,
                    },
                    sound,
                })));
            }
        };

        tracing::info!(
            barcode = %barcode,
            job_id = job.id,
            sub_job_id = ?sub_job_id,
            user,
            id = record.id,
            "scan recorded"
        );

        let notification = match NotificationRepo::new(self.ctx.pool)
            .for_barcode(barcode.as_str())
            .await
        {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, barcode = %barcode, "notification lookup failed");
                None
            }
        };
        let sound = sounds
            .resolve_or_default(Some(job.id), sub_job_id, SoundEvent::Success)
            .await;

        Ok(ScanOutcome {
            message: messages::scan_ok(barcode.as_str()),
            scan_date_local: self.ctx.calendar.format_local(record.scan_date),
            record,
            notification,
            sound,
        })
    }

    pub async fn history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>, ServiceError> {
        let now = Utc::now();
        let (start, end) = history_window(&self.ctx, filter, now)?;

        let query = HistoryQuery {
            start,
            end,
            job_id: filter.job_id,
            sub_job_id: filter.sub_job_id,
            barcode_contains: non_blank(&filter.barcode).map(str::to_owned),
            notes_contains: non_blank(&filter.notes).map(str::to_owned),
            user_id: non_blank(&filter.user_id).map(str::to_owned),
            limit: clamp_limit(filter.limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT),
        };

        let rows = ScanLogRepo::new(self.ctx.pool).history(&query).await?;
        Ok(rows
            .into_iter()
            .map(|scan| HistoryEntry {
                scan_date_local: self.ctx.calendar.format_local(scan.scan_date),
                status: ScanStatus::of(scan.scan_date, now).label(),
                scan,
            })
            .collect())
    }

    /// Today's count for a job (and sub job) in the site time zone.
    pub async fn today_summary(
        &self,
        job_id: i64,
        sub_job_id: Option<i64>,
        note_filter: Option<&str>,
    ) -> Result<TodaySummary, ServiceError> {
        let job = JobTypeRepo::new(self.ctx.pool)
            .find(job_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::job_not_found(job_id)))?;

        let sub_job_name = match sub_job_id {
            Some(id) => {
                let sub = SubJobRepo::new(self.ctx.pool)
                    .find(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(messages::sub_job_not_found(id)))?;
                if sub.main_job_id != job.id {
                    return Err(ServiceError::bad_input(messages::SUB_JOB_MISMATCH));
                }
                sub.sub_job_name
            }
            None => messages::ALL_SUB_JOBS.to_string(),
        };

        let note_filter = note_filter.map(str::trim).filter(|s| !s.is_empty());
        let today = self.ctx.calendar.today(Utc::now());
        let (start, end) = self.ctx.calendar.day_bounds(today);
        let count = ScanLogRepo::new(self.ctx.pool)
            .count(job.id, sub_job_id, start, end, note_filter)
            .await?;

        Ok(TodaySummary {
            date: today,
            job_id: job.id,
            job_name: job.job_name,
            sub_job_id,
            sub_job_name,
            note_filter: note_filter.map(str::to_owned),
            count,
        })
    }

    /// Replace a scan's notes. Writes an UPDATE audit entry.
    pub async fn update_notes(
        &self,
        id: i64,
        notes: Option<&str>,
        user: &str,
    ) -> Result<ScanRow, ServiceError> {
        let notes = Notes::new(notes)?;
        let row = ScanLogRepo::new(self.ctx.pool)
            .update_notes(id, notes.as_deref(), user)
            .await?;
        tracing::info!(id, user, "scan notes updated");
        Ok(row)
    }

    /// Delete a scan. Writes a DELETE audit entry holding the old row.
    pub async fn delete(&self, id: i64, user: &str) -> Result<ScanRow, ServiceError> {
        let row = ScanLogRepo::new(self.ctx.pool).delete(id, user).await?;
        tracing::info!(id, user, barcode = %row.barcode, "scan deleted");
        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Result<ScanRow, ServiceError> {
        Ok(ScanLogRepo::new(self.ctx.pool).get(id).await?)
    }

    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<ScanRow>, ServiceError> {
        let limit = clamp_limit(limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT);
        Ok(ScanLogRepo::new(self.ctx.pool).recent(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::postgres::PgPoolOptions;
    use wms_core::WmsConfig;

    fn with_ctx<F: FnOnce(ServiceContext<'_>)>(f: F) {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .expect("lazy pool");
        let config = WmsConfig::default();
        let ctx = ServiceContext::new(&pool, &config).expect("ctx");
        f(ctx);
    }

    #[tokio::test]
    async fn history_defaults_to_today_in_bangkok() {
        with_ctx(|ctx| {
            let now = Utc.with_ymd_and_hms(2024, 3, 14, 18, 0, 0).unwrap();
            let (start, end) = history_window(&ctx, &HistoryFilter::default(), now).unwrap();
            assert_eq!(start, Some(Utc.with_ymd_and_hms(2024, 3, 14, 17, 0, 0).unwrap()));
            assert_eq!(end, Some(Utc.with_ymd_and_hms(2024, 3, 15, 17, 0, 0).unwrap()));
        });
    }

    #[tokio::test]
    async fn history_without_today_is_unbounded() {
        with_ctx(|ctx| {
            let filter = HistoryFilter {
                today_only: Some(false),
                ..Default::default()
            };
            let window = history_window(&ctx, &filter, Utc::now()).unwrap();
            assert_eq!(window, (None, None));
        });
    }

    #[tokio::test]
    async fn explicit_range_wins_over_date() {
        with_ctx(|ctx| {
            let filter = HistoryFilter {
                date: Some("2024-01-01".into()),
                start_date: Some("2024-02-01".into()),
                end_date: Some("2024-02-03".into()),
                ..Default::default()
            };
            let (start, end) = history_window(&ctx, &filter, Utc::now()).unwrap();
            assert_eq!(start, Some(Utc.with_ymd_and_hms(2024, 1, 31, 17, 0, 0).unwrap()));
            assert_eq!(end, Some(Utc.with_ymd_and_hms(2024, 2, 3, 17, 0, 0).unwrap()));
        });
    }

    #[tokio::test]
    async fn reversed_range_rejected() {
        with_ctx(|ctx| {
            let filter = HistoryFilter {
                start_date: Some("2024-02-03".into()),
                end_date: Some("2024-02-01".into()),
                ..Default::default()
            };
            let err = history_window(&ctx, &filter, Utc::now()).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        });
    }

    #[tokio::test]
    async fn empty_barcode_rejected_before_database() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .expect("lazy pool");
        let config = WmsConfig::default();
        let ctx = ServiceContext::new(&pool, &config).expect("ctx");

        let req = ScanRequest {
            barcode: "   ".into(),
            job_id: Some(1),
            ..Default::default()
        };
        let err = ScanService::new(ctx).process(&req, "tester").await.unwrap_err();
        assert_eq!(err.to_string(), messages::EMPTY_BARCODE);
    }

    #[tokio::test]
    async fn missing_job_rejected_before_database() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .expect("lazy pool");
        let config = WmsConfig::default();
        let ctx = ServiceContext::new(&pool, &config).expect("ctx");

        let req = ScanRequest {
            barcode: "BC001".into(),
            ..Default::default()
        };
        let err = ScanService::new(ctx).process(&req, "tester").await.unwrap_err();
        assert_eq!(err.to_string(), messages::NO_JOB_SELECTED);
    }
}
