//! Bulk scan import from CSV

use std::collections::HashMap;

use serde::Serialize;
use wms_core::import::{
    read_scan_rows, template_csv, validate_row, CatalogSnapshot, RowOutcome, SubJobEntry,
    ValidatedRow, TEMPLATE_COLUMNS, TemplateColumn,
};
use wms_core::messages;

use super::{ServiceContext, ServiceError};
use crate::db::repos::{JobType, JobTypeRepo, NewScan, ScanLogRepo, SubJobRepo, SubJobType};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub message: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub rows: Vec<RowOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub message: String,
    pub imported: u64,
    pub failed: usize,
    pub errors: Vec<RowOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportTemplate {
    pub columns: Vec<TemplateColumn>,
    pub jobs: Vec<JobType>,
    pub sub_jobs: Vec<SubJobType>,
    #[serde(skip)]
    pub csv: Vec<u8>,
}

pub struct ImportService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> ImportService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    async fn catalog(&self) -> Result<CatalogSnapshot, ServiceError> {
        let jobs = JobTypeRepo::new(self.ctx.pool).list().await?;
        let sub_jobs = SubJobRepo::new(self.ctx.pool).list_all().await?;
        Ok(snapshot(&jobs, &sub_jobs))
    }

    /// Split the file into rows that would import and rows that would not.
    async fn check(&self, bytes: &[u8]) -> Result<(Vec<ValidatedRow>, Vec<RowOutcome>), ServiceError> {
        let rows = read_scan_rows(bytes)?;
        if rows.is_empty() {
            return Err(ServiceError::bad_input(messages::NO_IMPORT_DATA));
        }
        let catalog = self.catalog().await?;

        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        for row in &rows {
            match validate_row(row, &catalog) {
                Ok(v) => valid.push(v),
                Err(outcome) => invalid.push(outcome),
            }
        }
        Ok((valid, invalid))
    }

    pub async fn validate(&self, bytes: &[u8]) -> Result<ValidationReport, ServiceError> {
        let (valid, invalid) = self.check(bytes).await?;
        let (valid_rows, invalid_rows) = (valid.len(), invalid.len());

        let mut rows: Vec<RowOutcome> = valid.iter().map(RowOutcome::from).chain(invalid).collect();
        rows.sort_by_key(|r| r.line);

        Ok(ValidationReport {
            message: messages::validation_complete(valid_rows, invalid_rows),
            total_rows: rows.len(),
            valid_rows,
            invalid_rows,
            rows,
        })
    }

    /// Insert every valid row in one transaction. Dependency and duplicate
    /// rules do not apply to bulk loads.
    pub async fn import(&self, bytes: &[u8], user: &str) -> Result<ImportReport, ServiceError> {
        let (valid, invalid) = self.check(bytes).await?;
        if valid.is_empty() {
            return Err(ServiceError::bad_input(messages::NO_VALID_DATA));
        }

        let scans: Vec<NewScan> = valid
            .into_iter()
            .map(|row| NewScan {
                barcode: row.barcode.into_string(),
                job_type: row.main_job_name,
                user_id: user.to_string(),
                job_id: row.main_job_id,
                sub_job_id: Some(row.sub_job_id),
                notes: row.notes.into_inner(),
            })
            .collect();

        let imported = ScanLogRepo::new(self.ctx.pool).insert_many(&scans).await?;
        tracing::info!(imported, failed = invalid.len(), user, "bulk import finished");

        Ok(ImportReport {
            message: messages::import_complete(imported as usize, invalid.len()),
            imported,
            failed: invalid.len(),
            errors: invalid,
        })
    }

    /// Template file plus the catalog an operator needs to fill it in.
    pub async fn template(&self) -> Result<ImportTemplate, ServiceError> {
        let jobs = JobTypeRepo::new(self.ctx.pool).list().await?;
        let sub_jobs: Vec<SubJobType> = SubJobRepo::new(self.ctx.pool)
            .list_all()
            .await?
            .into_iter()
            .filter(|s| s.is_active)
            .collect();

        let (main, sub) = sub_jobs
            .first()
            .map(|s| (s.main_job_id, s.id))
            .or_else(|| jobs.first().map(|j| (j.id, 1)))
            .unwrap_or((1, 1));

        Ok(ImportTemplate {
            columns: TEMPLATE_COLUMNS.to_vec(),
            csv: template_csv(main, sub)?,
            jobs,
            sub_jobs,
        })
    }
}

fn snapshot(jobs: &[JobType], sub_jobs: &[SubJobType]) -> CatalogSnapshot {
    let jobs: HashMap<i64, String> = jobs.iter().map(|j| (j.id, j.job_name.clone())).collect();
    let sub_jobs = sub_jobs
        .iter()
        .map(|s| {
            (
                s.id,
                SubJobEntry {
                    main_job_id: s.main_job_id,
                    name: s.sub_job_name.clone(),
                    is_active: s.is_active,
                },
            )
        })
        .collect();
    CatalogSnapshot { jobs, sub_jobs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn snapshot_keeps_inactive_sub_jobs() {
        let now = Utc::now();
        let jobs = vec![JobType {
            id: 1,
            job_name: "1.Release".into(),
            created_at: now,
        }];
        let subs = vec![SubJobType {
            id: 10,
            main_job_id: 1,
            main_job_name: "1.Release".into(),
            sub_job_name: "รับสินค้าด่วน".into(),
            description: None,
            is_active: false,
            created_at: now,
            updated_at: now,
        }];
        let snap = snapshot(&jobs, &subs);
        assert_eq!(snap.jobs[&1], "1.Release");
        assert!(!snap.sub_jobs[&10].is_active);
    }
}
