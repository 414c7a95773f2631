//! Reports and their CSV exports

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use wms_core::import::csv_bytes;
use wms_core::messages;
use wms_core::rules::{parse_date, validate_year_month, DateRange};

use super::{ServiceContext, ServiceError};
use crate::db::repos::{JobMonthlyCount, JobTypeRepo, ReportRepo, SubJobRepo};

#[derive(Debug, Clone, Deserialize)]
pub struct DailyReportRequest {
    pub date: Option<String>,
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub note_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub barcode: String,
    pub scan_date: DateTime<Utc>,
    pub scan_date_local: String,
    pub job_type_name: String,
    pub sub_job_type_name: String,
    pub user_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub date: NaiveDate,
    pub job_id: i64,
    pub job_name: String,
    pub sub_job_name: String,
    pub note_filter: Option<String>,
    pub total_count: usize,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub message: String,
    pub summary: ReportSummary,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub jobs: Vec<JobMonthlyCount>,
    pub total_scans: i64,
    pub distinct_barcodes: i64,
    pub distinct_users: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserActivityRow {
    pub user_id: String,
    pub total_scans: i64,
    pub distinct_barcodes: i64,
    pub active_days: i64,
    pub first_scan: String,
    pub last_scan: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserActivityReport {
    pub range: DateRange,
    pub users: Vec<UserActivityRow>,
}

pub struct ReportService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> ReportService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn daily(&self, req: &DailyReportRequest) -> Result<DailyReport, ServiceError> {
        let date_text = req
            .date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServiceError::bad_input(messages::NO_DATE))?;
        let date = parse_date(date_text)?;
        let job_id = req
            .job_id
            .ok_or_else(|| ServiceError::bad_input(messages::NO_JOB_SELECTED))?;

        let job = JobTypeRepo::new(self.ctx.pool)
            .find(job_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(messages::job_not_found(job_id)))?;

        let sub_job_name = match req.sub_job_id {
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

        let note_filter = req
            .note_filter
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let (start, end) = self.ctx.calendar.day_bounds(date);
        let scans = ReportRepo::new(self.ctx.pool)
            .daily(job.id, req.sub_job_id, start, end, note_filter)
            .await?;

        let rows: Vec<ReportRow> = scans
            .into_iter()
            .map(|s| ReportRow {
                scan_date_local: self.ctx.calendar.format_local(s.scan_date),
                barcode: s.barcode,
                scan_date: s.scan_date,
                job_type_name: s.job_type,
                sub_job_type_name: s
                    .sub_job_name
                    .unwrap_or_else(|| messages::NO_SUB_JOB.to_string()),
                user_id: s.user_id,
                notes: s.notes,
            })
            .collect();

        tracing::info!(%date, job_id = job.id, sub_job_id = ?req.sub_job_id, rows = rows.len(), "daily report");
        Ok(DailyReport {
            message: messages::report_ok(rows.len()),
            summary: ReportSummary {
                date,
                job_id: job.id,
                job_name: job.job_name,
                sub_job_name,
                note_filter: note_filter.map(str::to_owned),
                total_count: rows.len(),
                generated_at: self.ctx.calendar.format_local(Utc::now()),
            },
            rows,
        })
    }

    pub async fn monthly(&self, year: i32, month: u32) -> Result<MonthlyReport, ServiceError> {
        validate_year_month(year, month)
            .map_err(|_| ServiceError::bad_input(messages::INVALID_YEAR_MONTH))?;
        let (start, end) = self.ctx.calendar.month_bounds(year, month)?;

        let repo = ReportRepo::new(self.ctx.pool);
        let jobs = repo.per_job(start, end).await?;
        let (total_scans, distinct_barcodes, distinct_users) =
            repo.window_totals(start, end).await?;

        Ok(MonthlyReport {
            year,
            month,
            jobs,
            total_scans,
            distinct_barcodes,
            distinct_users,
        })
    }

    pub async fn user_activity(
        &self,
        start: &str,
        end: &str,
    ) -> Result<UserActivityReport, ServiceError> {
        let range = DateRange::parse(start, end)?;
        let (from, to) = self.ctx.calendar.range_bounds(&range);
        let tz = self.ctx.calendar.tz().name();

        let users = ReportRepo::new(self.ctx.pool)
            .user_activity(from, to, tz)
            .await?
            .into_iter()
            .map(|u| UserActivityRow {
                first_scan: self.ctx.calendar.format_local(u.first_scan),
                last_scan: self.ctx.calendar.format_local(u.last_scan),
                user_id: u.user_id,
                total_scans: u.total_scans,
                distinct_barcodes: u.distinct_barcodes,
                active_days: u.active_days,
            })
            .collect();

        Ok(UserActivityReport { range, users })
    }
}

pub fn daily_csv(report: &DailyReport) -> Result<Vec<u8>, ServiceError> {
    if report.rows.is_empty() {
        return Err(ServiceError::bad_input(messages::NO_EXPORT_DATA));
    }
    let rows = report.rows.iter().map(|r| {
        vec![
            r.barcode.clone(),
            r.scan_date_local.clone(),
            r.job_type_name.clone(),
            r.sub_job_type_name.clone(),
            r.user_id.clone(),
            r.notes.clone().unwrap_or_default(),
        ]
    });
    Ok(csv_bytes(
        &["บาร์โค้ด", "วันที่สแกน", "ประเภทงานหลัก", "ประเภทงานย่อย", "ผู้ใช้", "หมายเหตุ"],
        rows,
    )?)
}

pub fn monthly_csv(report: &MonthlyReport) -> Result<Vec<u8>, ServiceError> {
    if report.jobs.is_empty() {
        return Err(ServiceError::bad_input(messages::NO_EXPORT_DATA));
    }
    let rows = report.jobs.iter().map(|j| {
        vec![
            j.job_name.clone(),
            j.scan_count.to_string(),
            j.distinct_barcodes.to_string(),
            j.distinct_users.to_string(),
        ]
    });
    Ok(csv_bytes(
        &["ประเภทงาน", "จำนวนสแกน", "บาร์โค้ดไม่ซ้ำ", "ผู้ใช้"],
        rows,
    )?)
}

pub fn user_activity_csv(report: &UserActivityReport) -> Result<Vec<u8>, ServiceError> {
    if report.users.is_empty() {
        return Err(ServiceError::bad_input(messages::NO_EXPORT_DATA));
    }
    let rows = report.users.iter().map(|u| {
        vec![
            u.user_id.clone(),
            u.total_scans.to_string(),
            u.distinct_barcodes.to_string(),
            u.active_days.to_string(),
            u.first_scan.clone(),
            u.last_scan.clone(),
        ]
    });
    Ok(csv_bytes(
        &["ผู้ใช้", "จำนวนสแกน", "บาร์โค้ดไม่ซ้ำ", "จำนวนวันทำงาน", "สแกนแรก", "สแกนล่าสุด"],
        rows,
    )?)
}

/// ASCII file name for a downloaded daily report, e.g.
/// `report_4.Loading_2024-03-15.csv`.
pub fn daily_csv_filename(summary: &ReportSummary) -> String {
    let safe: String = summary
        .job_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("report_{}_{}.csv", safe, summary.date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(rows: Vec<ReportRow>) -> DailyReport {
        DailyReport {
            message: messages::report_ok(rows.len()),
            summary: ReportSummary {
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                job_id: 4,
                job_name: "4.Loading".into(),
                sub_job_name: messages::ALL_SUB_JOBS.into(),
                note_filter: None,
                total_count: rows.len(),
                generated_at: "2024-03-15 10:00:00".into(),
            },
            rows,
        }
    }

    #[test]
    fn empty_report_has_nothing_to_export() {
        let err = daily_csv(&report(vec![])).unwrap_err();
        assert_eq!(err.to_string(), messages::NO_EXPORT_DATA);
    }

    #[test]
    fn daily_csv_has_thai_header_and_row() {
        let bytes = daily_csv(&report(vec![ReportRow {
            barcode: "BC1".into(),
            scan_date: Utc::now(),
            scan_date_local: "2024-03-15 09:00:00".into(),
            job_type_name: "4.Loading".into(),
            sub_job_type_name: "โหลดรถปกติ".into(),
            user_id: "somchai".into(),
            notes: None,
        }]))
        .unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("บาร์โค้ด,"));
        assert_eq!(
            lines.next().unwrap(),
            "BC1,2024-03-15 09:00:00,4.Loading,โหลดรถปกติ,somchai,"
        );
    }

    #[test]
    fn filename_is_filesystem_safe() {
        let mut r = report(vec![]);
        r.summary.job_name = "4.Loading/x".into();
        assert_eq!(daily_csv_filename(&r.summary), "report_4.Loading_x_2024-03-15.csv");

        r.summary.job_name = "โหลดรถ".into();
        assert!(daily_csv_filename(&r.summary).is_ascii());
    }
}
