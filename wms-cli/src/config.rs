use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use wms_core::WmsConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a config file with every default filled in
    Init(InitArgs),
    /// Print the effective config (file, then environment overrides)
    Show,
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

/// Path the config commands act on: `--config`, then `WMS_CONFIG`, then the default.
fn target_path(explicit: Option<&PathBuf>) -> PathBuf {
    explicit
        .cloned()
        .or_else(|| std::env::var_os("WMS_CONFIG").map(PathBuf::from))
        .unwrap_or_else(WmsConfig::config_path)
}

pub fn run_config(args: ConfigArgs, explicit: Option<&PathBuf>) -> Result<()> {
    match args.command {
        ConfigCommands::Init(init) => run_init(init, explicit),
        ConfigCommands::Show => run_show(explicit),
        ConfigCommands::Path => {
            println!("{}", target_path(explicit).display());
            Ok(())
        }
    }
}

fn run_init(args: InitArgs, explicit: Option<&PathBuf>) -> Result<()> {
    let config_path = target_path(explicit);

    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    WmsConfig::default()
        .save(&config_path)
        .context("Failed to write default config")?;

    println!("✅ Created config at: {:?}", config_path);
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {:?}", config_path);
    println!("  2. Set database.url (or export DATABASE_URL)");
    println!("  3. Run: wms db migrate && wms db seed");

    Ok(())
}

fn run_show(explicit: Option<&PathBuf>) -> Result<()> {
    let config = WmsConfig::load(explicit.map(PathBuf::as_path))?;
    print!("{}", config.masked().to_toml_string()?);
    Ok(())
}
