//! Scan history listing

use anyhow::Result;
use clap::Parser;
use wms_server::services::scan::HistoryFilter;
use wms_server::services::ScanService;

use super::Context;
use crate::output::{or_dash, truncate};

#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Maximum rows (1-10000)
    #[arg(long, short = 'l', default_value_t = 50)]
    pub limit: i64,

    /// Include every day instead of only today
    #[arg(long, short = 'a', conflicts_with_all = ["date", "from", "to"])]
    pub all: bool,

    /// One day, YYYY-MM-DD (site time zone)
    #[arg(long, short = 'd')]
    pub date: Option<String>,

    /// Range start, YYYY-MM-DD
    #[arg(long)]
    pub from: Option<String>,

    /// Range end, YYYY-MM-DD
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long, short = 'j')]
    pub job: Option<i64>,

    #[arg(long, short = 's')]
    pub sub_job: Option<i64>,

    /// Barcode contains
    #[arg(long, short = 'b')]
    pub barcode: Option<String>,

    /// Notes contain
    #[arg(long, short = 'n')]
    pub notes: Option<String>,

    /// Exact operator
    #[arg(long, short = 'u')]
    pub user: Option<String>,
}

impl From<HistoryArgs> for HistoryFilter {
    fn from(args: HistoryArgs) -> Self {
        HistoryFilter {
            limit: Some(args.limit),
            today_only: Some(!args.all),
            date: args.date,
            start_date: args.from,
            end_date: args.to,
            job_id: args.job,
            sub_job_id: args.sub_job,
            barcode: args.barcode,
            notes: args.notes,
            user_id: args.user,
        }
    }
}

pub async fn run_history(args: HistoryArgs, ctx: &Context) -> Result<()> {
    let entries = ScanService::new(ctx.services()?)
        .history(&args.into())
        .await?;

    ctx.out.emit(&entries, |entries| {
        if entries.is_empty() {
            println!("No scans found");
            return;
        }
        println!(
            "{:>7}  {:<19}  {:<24}  {:<16}  {:<20}  {:<10}  {:<4}  NOTES",
            "ID", "SCANNED", "BARCODE", "JOB", "SUB JOB", "USER", ""
        );
        for e in entries {
            println!(
                "{:>7}  {:<19}  {:<24}  {:<16}  {:<20}  {:<10}  {:<4}  {}",
                e.scan.id,
                e.scan_date_local,
                truncate(&e.scan.barcode, 24),
                truncate(&e.scan.job_type, 16),
                truncate(or_dash(e.scan.sub_job_name.as_deref()), 20),
                truncate(&e.scan.user_id, 10),
                e.status,
                or_dash(e.scan.notes.as_deref())
            );
        }
        println!("{} scan(s)", entries.len());
    })
}
