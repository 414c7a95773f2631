//! Database administration: schema and sample catalog

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use wms_server::db::migrations;
use wms_server::services::seed::seed_catalog;

use super::Context;

#[derive(Parser, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Create tables and indexes (safe to run repeatedly)
    Migrate,
    /// Insert the sample job catalog if no job types exist
    Seed,
}

pub async fn run_db(args: DbArgs, ctx: &Context) -> Result<()> {
    match args.command {
        DbCommand::Migrate => {
            migrations::run(&ctx.pool)
                .await
                .context("Failed to apply database schema")?;
            ctx.out
                .emit(&serde_json::json!({ "migrated": true }), |_| {
                    println!("✅ Schema is up to date")
                })?;
        }
        DbCommand::Seed => {
            let report = seed_catalog(&ctx.pool).await?;
            ctx.out.emit(&report, |r| {
                if r.skipped {
                    println!("Catalog already has job types, nothing seeded");
                } else {
                    println!(
                        "✅ Seeded {} job types and {} sub job types",
                        r.jobs_created, r.sub_jobs_created
                    );
                }
            })?;
        }
    }
    Ok(())
}
