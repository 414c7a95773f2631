//! Service layer: input validation and orchestration
//!
//! Both the HTTP handlers and the `wms` CLI call these. Each service
//! borrows a [`ServiceContext`] the way repositories borrow the pool.

pub mod audit;
pub mod dependencies;
pub mod import;
pub mod jobs;
pub mod notifications;
pub mod reports;
pub mod scan;
pub mod seed;
pub mod sounds;

use serde::Serialize;
use sqlx::PgPool;
use wms_core::messages;
use wms_core::rules::{RequiredJob, SiteCalendar};
use wms_core::{ValidationError, WmsConfig, WmsError};

use crate::db::DbError;

pub use audit::AuditService;
pub use dependencies::DependencyService;
pub use import::ImportService;
pub use jobs::JobService;
pub use notifications::NotificationService;
pub use reports::ReportService;
pub use scan::{DuplicateScan, ScanService};
pub use sounds::{ResolvedSound, SoundService};

/// Everything a service needs, borrowed from the caller's state.
#[derive(Clone, Copy)]
pub struct ServiceContext<'a> {
    pub pool: &'a PgPool,
    pub config: &'a WmsConfig,
    pub calendar: SiteCalendar,
}

impl<'a> ServiceContext<'a> {
    pub fn new(pool: &'a PgPool, config: &'a WmsConfig) -> Result<Self, ServiceError> {
        let calendar = config.scanning.calendar()?;
        Ok(Self {
            pool,
            config,
            calendar,
        })
    }
}

/// A scan refused because required jobs were never scanned
#[derive(Debug, Clone, Serialize)]
pub struct MissingDependencies {
    pub message: String,
    pub missing: Vec<RequiredJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<ResolvedSound>,
}

impl MissingDependencies {
    pub fn new(missing: Vec<RequiredJob>, sound: Option<ResolvedSound>) -> Self {
        let names: Vec<&str> = missing.iter().map(|r| r.job_name.as_str()).collect();
        Self {
            message: messages::missing_dependencies(&names),
            missing,
            sound,
        }
    }
}

/// Service error type. `Display` is the Thai text shown to the operator.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Input is well-formed but unusable (wrong sub job, empty file)
    #[error("{message}")]
    BadInput { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{}", .0.message)]
    Duplicate(Box<DuplicateScan>),

    #[error("{}", .0.message)]
    MissingDependencies(Box<MissingDependencies>),

    #[error("database error: {0}")]
    Db(DbError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInput {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound {
                message: messages::record_not_found(resource, &id),
            },
            other => Self::Db(other),
        }
    }
}

impl From<WmsError> for ServiceError {
    fn from(e: WmsError) -> Self {
        match e {
            WmsError::Validation(v) => Self::Validation(v),
            WmsError::Import { reason } => Self::BadInput { message: reason },
            WmsError::Csv(e) => Self::BadInput {
                message: format!("CSV: {}", e),
            },
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Clamp a requested row limit to `1..=max`, with `default` when absent.
pub(crate) fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}
