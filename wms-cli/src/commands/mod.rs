//! Command implementations for the wms CLI

pub mod db;
pub mod deps;
pub mod history;
pub mod import;
pub mod jobs;
pub mod report;
pub mod scan;
pub mod serve;

use anyhow::{Context as _, Result};
use sqlx::PgPool;
use wms_core::config::mask_url_password;
use wms_core::WmsConfig;
use wms_server::db::create_pool_with_options;
use wms_server::ServiceContext;

use crate::output::Output;

// Re-export dispatcher functions for flat access from main.rs
pub use db::run_db;
pub use deps::run_deps;
pub use history::run_history;
pub use import::{run_import, run_template};
pub use jobs::{run_jobs, run_subjobs};
pub use report::run_report;
pub use scan::run_scan;
pub use serve::run_serve;

/// A connected pool plus the loaded config, shared by the database commands
pub struct Context {
    pub pool: PgPool,
    pub config: WmsConfig,
    pub out: Output,
}

impl Context {
    pub async fn connect(config: WmsConfig, out: Output) -> Result<Self> {
        let pool = create_pool_with_options(&config.database.url, config.database.max_connections)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to {}",
                    mask_url_password(&config.database.url)
                )
            })?;
        Ok(Self { pool, config, out })
    }

    pub fn services(&self) -> Result<ServiceContext<'_>> {
        Ok(ServiceContext::new(&self.pool, &self.config)?)
    }

    /// User recorded on writes when `--user` is not given.
    pub fn user<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.config.scanning.default_user)
    }
}
