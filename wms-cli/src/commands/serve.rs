//! HTTP server command
//!
//! Runs the JSON API with every route: scanning, catalog, dependencies,
//! reports, import, audit, notifications and sounds.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;

use wms_core::config::mask_url_password;
use wms_core::WmsConfig;
use wms_server::db::{migrations, pool::create_lazy_pool};
use wms_server::http::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: server.bind from config, 127.0.0.1:5000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Apply the schema before accepting requests
    #[arg(long)]
    pub migrate: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut config: WmsConfig) -> Result<()> {
    if let Some(url) = args.database_url.filter(|u| !u.is_empty()) {
        config.database.url = url;
    }

    let mut server = ServerConfig::from_section(&config.server)?;
    if let Some(bind) = args.bind {
        server.bind_addr = bind;
    }
    server.cors_permissive |= args.cors_permissive;

    tracing::info!(
        bind = %server.bind_addr,
        database = %mask_url_password(&config.database.url),
        "Starting wms server"
    );

    // Lazy so the server comes up (and /health reports it) while the database is down
    let pool = create_lazy_pool(&config.database.url, config.database.max_connections)
        .context("Invalid database URL")?;

    if args.migrate {
        migrations::run(&pool)
            .await
            .context("Failed to apply database schema")?;
    }

    // Run server (blocks until shutdown)
    run_server(pool, config, server)
        .await
        .context("Server error")?;

    Ok(())
}
