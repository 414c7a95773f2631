//! Bulk CSV import and its template

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use wms_core::import::RowOutcome;
use wms_server::services::ImportService;

use super::Context;

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// CSV file (UTF-8, header row; see `wms template`)
    pub file: PathBuf,

    /// Validate only, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Operator recorded on imported scans (default: scanning.default_user)
    #[arg(long, short = 'u', env = "WMS_USER")]
    pub user: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TemplateArgs {
    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

pub async fn run_import(args: ImportArgs, ctx: &Context) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let import = ImportService::new(ctx.services()?);

    if args.dry_run {
        let report = import.validate(&bytes).await?;
        return ctx.out.emit(&report, |r| {
            for row in r.rows.iter().filter(|row| !row.valid) {
                print_row_errors(row);
            }
            println!("{}", r.message);
        });
    }

    let user = ctx.user(args.user.as_deref());
    let report = import.import(&bytes, user).await?;
    ctx.out.emit(&report, |r| {
        for row in &r.errors {
            print_row_errors(row);
        }
        println!("{}", r.message);
    })
}

pub async fn run_template(args: TemplateArgs, ctx: &Context) -> Result<()> {
    let template = ImportService::new(ctx.services()?).template().await?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, &template.csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✅ Wrote import template to {}", path.display());
            Ok(())
        }
        None if ctx.out.is_json() => ctx.out.emit(&template, |_| {}),
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&template.csv)?;
            Ok(())
        }
    }
}

fn print_row_errors(row: &RowOutcome) {
    println!("✗ line {} ({}): {}", row.line, row.barcode, row.errors.join("; "));
}
