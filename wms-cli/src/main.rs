//! wms CLI - Warehouse barcode scanning
//!
//! Entry point for the `wms` command-line tool, which provides:
//! - The HTTP API server (`serve`)
//! - Database schema and sample catalog (`db`)
//! - Job catalog and dependency administration (`jobs`, `subjobs`, `deps`)
//! - A terminal scan station (`scan`) and scan history (`history`)
//! - Daily, monthly and per-user reports with CSV export (`report`)
//! - Bulk CSV import and its template (`import`, `template`)

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use wms_core::WmsConfig;

mod commands;
mod config;
mod output;
mod tracing_setup;

use output::Output;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "wms",
    author,
    version,
    about = "Warehouse barcode scanning: scan ledger, job dependencies, reports",
    long_about = "Record warehouse barcode scans against job types, enforce job \
                  dependencies and duplicate rules, and report on the scan ledger."
)]
struct Cli {
    /// Config file (default: $WMS_CONFIG or ~/.wms/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (needs the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Database schema and sample data (migrate, seed)
    Db(commands::db::DbArgs),
    /// Manage main job types (list, add, rename, delete)
    Jobs(commands::jobs::JobsArgs),
    /// Manage sub job types (list, add, delete, activate)
    Subjobs(commands::jobs::SubJobsArgs),
    /// Manage job dependencies (list, add, remove, set)
    Deps(commands::deps::DepsArgs),
    /// Scan barcodes: one-shot or interactive station
    Scan(commands::scan::ScanArgs),
    /// Show scan history
    History(commands::history::HistoryArgs),
    /// Run reports (daily, monthly, users) and export CSV
    Report(commands::report::ReportArgs),
    /// Import scans from a CSV file
    Import(commands::import::ImportArgs),
    /// Write the CSV import template
    Template(commands::import::TemplateArgs),
    /// Manage wms configuration (init, show, path)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let out = Output::new(cli.json);

    // Neither needs a config or a database
    let command = match cli.command {
        Commands::Completions(args) => return run_completions(args),
        Commands::Config(args) => return config::run_config(args, cli.config.as_ref()),
        other => other,
    };

    let config = WmsConfig::load(cli.config.as_deref())?;
    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
        level: config.logging.level.clone(),
    })
    .ok();

    let result = dispatch(command, config, out).await;
    tracing_setup::shutdown_otel();
    result
}

async fn dispatch(command: Commands, config: WmsConfig, out: Output) -> Result<()> {
    use commands::Context;

    match command {
        Commands::Serve(args) => commands::run_serve(args, config).await,
        Commands::Db(args) => commands::run_db(args, &Context::connect(config, out).await?).await,
        Commands::Jobs(args) => commands::run_jobs(args, &Context::connect(config, out).await?).await,
        Commands::Subjobs(args) => {
            commands::run_subjobs(args, &Context::connect(config, out).await?).await
        }
        Commands::Deps(args) => commands::run_deps(args, &Context::connect(config, out).await?).await,
        Commands::Scan(args) => commands::run_scan(args, &Context::connect(config, out).await?).await,
        Commands::History(args) => {
            commands::run_history(args, &Context::connect(config, out).await?).await
        }
        Commands::Report(args) => {
            commands::run_report(args, &Context::connect(config, out).await?).await
        }
        Commands::Import(args) => {
            commands::run_import(args, &Context::connect(config, out).await?).await
        }
        Commands::Template(args) => {
            commands::run_template(args, &Context::connect(config, out).await?).await
        }
        Commands::Config(_) | Commands::Completions(_) => Ok(()),
    }
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["wms", "jobs", "list", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Jobs(_)));
    }
}
