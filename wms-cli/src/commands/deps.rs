//! Job dependency commands

use anyhow::Result;
use clap::{Parser, Subcommand};
use wms_server::services::DependencyService;

use super::Context;

#[derive(Parser, Debug)]
pub struct DepsArgs {
    #[command(subcommand)]
    pub command: DepsCommand,
}

#[derive(Subcommand, Debug)]
pub enum DepsCommand {
    /// List dependencies: every edge, or the jobs one job requires
    List {
        /// Show only what this job requires
        #[arg(long, short = 'j')]
        job: Option<i64>,
        /// With --job: count scans of each required job (today unless --all-time)
        #[arg(long, short = 's')]
        status: bool,
        /// With --status: count scans over all time
        #[arg(long)]
        all_time: bool,
    },
    /// Require JOB's scans to be preceded by a scan in REQUIRED
    Add { job: i64, required: i64 },
    /// Drop one requirement
    Remove { job: i64, required: i64 },
    /// Replace the full set of jobs JOB requires (none clears it)
    Set {
        job: i64,
        #[arg(value_delimiter = ',')]
        required: Vec<i64>,
    },
}

pub async fn run_deps(args: DepsArgs, ctx: &Context) -> Result<()> {
    let deps = DependencyService::new(ctx.services()?);

    match args.command {
        DepsCommand::List {
            job: Some(job),
            status,
            all_time,
        } => {
            let required = deps.required_jobs(job, status, !all_time).await?;
            ctx.out.emit(&required, |list| {
                if list.is_empty() {
                    println!("Job {} has no requirements", job);
                }
                for r in list {
                    match r.scan_count {
                        Some(n) => {
                            let mark = if n > 0 { "✓" } else { "✗" };
                            println!("{} {:>5}  {}  ({} scans)", mark, r.job_id, r.job_name, n)
                        }
                        None => println!("{:>5}  {}", r.job_id, r.job_name),
                    }
                }
            })?;
        }
        DepsCommand::List { job: None, .. } => {
            let edges = deps.list_all().await?;
            ctx.out.emit(&edges, |edges| {
                if edges.is_empty() {
                    println!("No dependencies defined");
                }
                for e in edges {
                    println!(
                        "{} ({}) requires {} ({})",
                        e.job_name, e.job_id, e.required_job_name, e.required_job_id
                    );
                }
            })?;
        }
        DepsCommand::Add { job, required } => {
            deps.add(job, required).await?;
            ctx.out.emit(
                &serde_json::json!({ "job_id": job, "required_job_id": required }),
                |_| println!("✅ Job {} now requires job {}", job, required),
            )?;
        }
        DepsCommand::Remove { job, required } => {
            deps.remove(job, required).await?;
            ctx.out.emit(
                &serde_json::json!({ "job_id": job, "removed": required }),
                |_| println!("✅ Job {} no longer requires job {}", job, required),
            )?;
        }
        DepsCommand::Set { job, required } => {
            let outcome = deps.replace(job, &required).await?;
            ctx.out.emit(&outcome, |o| {
                println!(
                    "✅ Job {} requires {} job(s): {:?}",
                    o.job_id,
                    o.applied.len(),
                    o.applied
                );
                for err in &o.errors {
                    println!("  ✗ {}: {}", err.required_job_id, err.message);
                }
            })?;
        }
    }
    Ok(())
}
