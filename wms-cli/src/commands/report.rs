//! Report commands with optional CSV export

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use wms_server::services::reports::{
    daily_csv, daily_csv_filename, monthly_csv, user_activity_csv, DailyReportRequest,
};
use wms_server::services::ReportService;

use super::Context;
use crate::output::{or_dash, truncate};

#[derive(Parser, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Every scan of one job on one day
    Daily {
        /// Main job id
        #[arg(long, short = 'j')]
        job: i64,
        /// Sub job id (default: all sub jobs)
        #[arg(long, short = 's')]
        sub_job: Option<i64>,
        /// Day, YYYY-MM-DD (default: today in the site time zone)
        #[arg(long, short = 'd')]
        date: Option<String>,
        /// Only scans whose notes contain this text
        #[arg(long, short = 'n')]
        notes: Option<String>,
        /// Write CSV here; a directory gets the standard file name, `-` is stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Per-job totals for a calendar month
    Monthly {
        year: i32,
        month: u32,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Per-operator activity over a date range
    Users {
        /// Range start, YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// Range end, YYYY-MM-DD
        #[arg(long)]
        to: String,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
}

pub async fn run_report(args: ReportArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    let reports = ReportService::new(services);

    match args.command {
        ReportCommand::Daily {
            job,
            sub_job,
            date,
            notes,
            out,
        } => {
            let date = date.unwrap_or_else(|| services.calendar.today(Utc::now()).to_string());
            let report = reports
                .daily(&DailyReportRequest {
                    date: Some(date),
                    job_id: Some(job),
                    sub_job_id: sub_job,
                    note_filter: notes,
                })
                .await?;

            if let Some(out) = out {
                let path = if out.is_dir() {
                    out.join(daily_csv_filename(&report.summary))
                } else {
                    out
                };
                return write_csv(&path, &daily_csv(&report)?);
            }

            ctx.out.emit(&report, |r| {
                let s = &r.summary;
                println!("{} > {}  {}", s.job_name, s.sub_job_name, s.date);
                if let Some(filter) = &s.note_filter {
                    println!("notes contain: {}", filter);
                }
                for row in &r.rows {
                    println!(
                        "{:<19}  {:<24}  {:<20}  {:<10}  {}",
                        row.scan_date_local,
                        truncate(&row.barcode, 24),
                        truncate(&row.sub_job_type_name, 20),
                        truncate(&row.user_id, 10),
                        or_dash(row.notes.as_deref())
                    );
                }
                println!("{}", r.message);
            })?;
        }
        ReportCommand::Monthly { year, month, out } => {
            let report = reports.monthly(year, month).await?;
            if let Some(out) = out {
                return write_csv(&out, &monthly_csv(&report)?);
            }
            ctx.out.emit(&report, |r| {
                println!("{}-{:02}", r.year, r.month);
                println!("{:<24}  {:>8}  {:>8}  {:>6}", "JOB", "SCANS", "BARCODES", "USERS");
                for j in &r.jobs {
                    println!(
                        "{:<24}  {:>8}  {:>8}  {:>6}",
                        truncate(&j.job_name, 24),
                        j.scan_count,
                        j.distinct_barcodes,
                        j.distinct_users
                    );
                }
                println!(
                    "{:<24}  {:>8}  {:>8}  {:>6}",
                    "total", r.total_scans, r.distinct_barcodes, r.distinct_users
                );
            })?;
        }
        ReportCommand::Users { from, to, out } => {
            let report = reports.user_activity(&from, &to).await?;
            if let Some(out) = out {
                return write_csv(&out, &user_activity_csv(&report)?);
            }
            ctx.out.emit(&report, |r| {
                println!(
                    "{:<12}  {:>7}  {:>8}  {:>4}  {:<19}  LAST",
                    "USER", "SCANS", "BARCODES", "DAYS", "FIRST"
                );
                for u in &r.users {
                    println!(
                        "{:<12}  {:>7}  {:>8}  {:>4}  {:<19}  {}",
                        truncate(&u.user_id, 12),
                        u.total_scans,
                        u.distinct_barcodes,
                        u.active_days,
                        u.first_scan,
                        u.last_scan
                    );
                }
            })?;
        }
    }
    Ok(())
}

fn write_csv(path: &Path, bytes: &[u8]) -> Result<()> {
    if path == Path::new("-") {
        std::io::stdout().write_all(bytes)?;
        return Ok(());
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("✅ Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
