//! Job catalog commands: main job types and their sub jobs

use anyhow::Result;
use clap::{Parser, Subcommand};
use wms_server::services::jobs::{SubJobInput, SubJobRemoval, SubJobUpdate};
use wms_server::services::JobService;

use super::Context;
use crate::output::{or_dash, truncate};

#[derive(Parser, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// List main job types
    List,
    /// Create a main job type
    Add {
        /// Job name, e.g. "7.Inspect"
        name: String,
    },
    /// Rename a main job type
    Rename { id: i64, name: String },
    /// Delete a main job type (refused while scans reference it)
    Delete { id: i64 },
}

#[derive(Parser, Debug)]
pub struct SubJobsArgs {
    #[command(subcommand)]
    pub command: SubJobsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubJobsCommand {
    /// List sub jobs, for one main job or all of them
    List {
        /// Main job id
        #[arg(long, short = 'j')]
        job: Option<i64>,
        /// Include deactivated sub jobs
        #[arg(long, short = 'a')]
        all: bool,
    },
    /// Create a sub job under a main job
    Add {
        /// Main job id
        #[arg(long, short = 'j')]
        job: i64,
        name: String,
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Rename a sub job or change its description
    Update {
        id: i64,
        name: String,
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Delete a sub job; one referenced by scans is deactivated instead
    Delete { id: i64 },
    /// Re-enable a deactivated sub job
    Activate { id: i64 },
}

pub async fn run_jobs(args: JobsArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services()?;
    let jobs = JobService::new(services);

    match args.command {
        JobsCommand::List => {
            let list = jobs.list().await?;
            ctx.out.emit(&list, |list| {
                if list.is_empty() {
                    println!("No job types. Run `wms db seed` for a sample catalog.");
                    return;
                }
                println!("{:>5}  {:<30}  CREATED", "ID", "NAME");
                for job in list {
                    println!(
                        "{:>5}  {:<30}  {}",
                        job.id,
                        truncate(&job.job_name, 30),
                        services.calendar.format_local(job.created_at)
                    );
                }
            })?;
        }
        JobsCommand::Add { name } => {
            let job = jobs.create(&name).await?;
            ctx.out
                .emit(&job, |j| println!("✅ Created job type {} (id {})", j.job_name, j.id))?;
        }
        JobsCommand::Rename { id, name } => {
            let job = jobs.rename(id, &name).await?;
            ctx.out
                .emit(&job, |j| println!("✅ Job type {} is now {}", j.id, j.job_name))?;
        }
        JobsCommand::Delete { id } => {
            jobs.delete(id).await?;
            ctx.out.emit(&serde_json::json!({ "deleted": id }), |_| {
                println!("✅ Deleted job type {}", id)
            })?;
        }
    }
    Ok(())
}

pub async fn run_subjobs(args: SubJobsArgs, ctx: &Context) -> Result<()> {
    let jobs = JobService::new(ctx.services()?);

    match args.command {
        SubJobsCommand::List { job, all } => {
            let list = match job {
                Some(id) => jobs.sub_jobs(id, all).await?,
                None => {
                    let mut subs = jobs.all_sub_jobs().await?;
                    subs.retain(|s| all || s.is_active);
                    subs
                }
            };
            ctx.out.emit(&list, |list| {
                println!(
                    "{:>5}  {:<20}  {:<30}  {:<6}  DESCRIPTION",
                    "ID", "MAIN JOB", "SUB JOB", "ACTIVE"
                );
                for sub in list {
                    println!(
                        "{:>5}  {:<20}  {:<30}  {:<6}  {}",
                        sub.id,
                        truncate(&sub.main_job_name, 20),
                        truncate(&sub.sub_job_name, 30),
                        if sub.is_active { "yes" } else { "no" },
                        or_dash(sub.description.as_deref())
                    );
                }
            })?;
        }
        SubJobsCommand::Add {
            job,
            name,
            description,
        } => {
            let sub = jobs
                .create_sub_job(&SubJobInput {
                    main_job_id: job,
                    sub_job_name: name,
                    description,
                })
                .await?;
            ctx.out.emit(&sub, |s| {
                println!(
                    "✅ Created sub job {} > {} (id {})",
                    s.main_job_name, s.sub_job_name, s.id
                )
            })?;
        }
        SubJobsCommand::Update {
            id,
            name,
            description,
        } => {
            let sub = jobs
                .update_sub_job(
                    id,
                    &SubJobUpdate {
                        sub_job_name: name,
                        description,
                    },
                )
                .await?;
            ctx.out
                .emit(&sub, |s| println!("✅ Sub job {} is now {}", s.id, s.sub_job_name))?;
        }
        SubJobsCommand::Delete { id } => {
            let removal = jobs.delete_sub_job(id).await?;
            ctx.out.emit(&removal, |r| match r {
                SubJobRemoval::Deleted => println!("✅ Deleted sub job {}", id),
                SubJobRemoval::Deactivated => {
                    println!("Sub job {} has scans; it was deactivated instead", id)
                }
            })?;
        }
        SubJobsCommand::Activate { id } => {
            let sub = jobs.activate_sub_job(id).await?;
            ctx.out
                .emit(&sub, |s| println!("✅ Sub job {} is active again", s.sub_job_name))?;
        }
    }
    Ok(())
}
