//! Audit trail queries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use wms_core::model::AuditAction;
use wms_core::rules::parse_date;

use super::{clamp_limit, ServiceContext, ServiceError};
use crate::db::repos::{AuditEntry, AuditQuery, AuditRepo, AuditSummary};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    pub scan_record_id: Option<i64>,
    pub action: Option<String>,
    pub changed_by: Option<String>,
    pub date: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryView {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub change_date_local: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyAuditSummary {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: AuditSummary,
}

pub struct AuditService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> AuditService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn history(&self, filter: &AuditFilter) -> Result<Vec<AuditEntryView>, ServiceError> {
        let action = filter
            .action
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<AuditAction>)
            .transpose()?;

        let (start, end) = match filter.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let (s, e) = self.ctx.calendar.day_bounds(parse_date(raw)?);
                (Some(s), Some(e))
            }
            None => (None, None),
        };

        let query = AuditQuery {
            scan_record_id: filter.scan_record_id,
            action,
            changed_by: filter
                .changed_by
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            start,
            end,
            limit: clamp_limit(filter.limit, DEFAULT_LIMIT, MAX_LIMIT),
        };

        let entries = AuditRepo::new(self.ctx.pool).query(&query).await?;
        Ok(entries
            .into_iter()
            .map(|entry| AuditEntryView {
                change_date_local: self.ctx.calendar.format_local(entry.change_date),
                entry,
            })
            .collect())
    }

    /// Totals for one site-local day; today when `date` is absent.
    pub async fn daily_summary(&self, date: Option<&str>) -> Result<DailyAuditSummary, ServiceError> {
        let date = match date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_date(raw)?,
            None => self.ctx.calendar.today(chrono::Utc::now()),
        };
        let (start, end) = self.ctx.calendar.day_bounds(date);
        let totals = AuditRepo::new(self.ctx.pool).summary(start, end).await?;
        Ok(DailyAuditSummary { date, totals })
    }
}
