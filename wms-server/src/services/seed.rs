//! Sample catalog for a fresh database

use serde::Serialize;

use super::ServiceError;
use crate::db::repos::{JobTypeRepo, SubJobRepo};
use sqlx::PgPool;

/// Job names with their two sample sub jobs
pub const SAMPLE_CATALOG: [(&str, [&str; 2]); 6] = [
    ("1.Release", ["รับสินค้าปกติ", "รับสินค้าด่วน"]),
    ("2.Inprocess", ["จัดส่งภายในประเทศ", "จัดส่งต่างประเทศ"]),
    ("3.Outbound", ["ส่งออกปกติ", "ส่งออกด่วน"]),
    ("4.Loading", ["โหลดรถปกติ", "โหลดรถด่วน"]),
    ("5.Return", ["คืนสินค้าปกติ", "คืนสินค้าด่วน"]),
    ("6.Repack", ["แพ็คใหม่", "แพ็คซ่อม"]),
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub jobs_created: usize,
    pub sub_jobs_created: usize,
    /// The catalog already had jobs, so nothing was written
    pub skipped: bool,
}

/// Insert the sample catalog when no job types exist.
pub async fn seed_catalog(pool: &PgPool) -> Result<SeedReport, ServiceError> {
    let jobs = JobTypeRepo::new(pool);
    if jobs.count().await? > 0 {
        tracing::info!("catalog not empty, skipping seed");
        return Ok(SeedReport {
            skipped: true,
            ..Default::default()
        });
    }

    let sub_jobs = SubJobRepo::new(pool);
    let mut report = SeedReport::default();
    for (job_name, subs) in SAMPLE_CATALOG {
        let job = jobs.create(job_name).await?;
        report.jobs_created += 1;
        for sub in subs {
            sub_jobs.create(job.id, sub, None).await?;
            report.sub_jobs_created += 1;
        }
    }

    tracing::info!(
        jobs = report.jobs_created,
        sub_jobs = report.sub_jobs_created,
        "sample catalog seeded"
    );
    Ok(report)
}
