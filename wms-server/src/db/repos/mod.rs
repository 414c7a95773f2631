//! Repository implementations for database access
//!
//! Each repository borrows the pool and maps rows to plain structs.
//! Uniqueness is left to database constraints; callers inspect
//! [`DbError::is_unique_violation`] instead of checking first.

pub mod audit;
pub mod dependencies;
pub mod job_types;
pub mod notifications;
pub mod reports;
pub mod scan_logs;
pub mod sounds;
pub mod sub_jobs;

pub use audit::{AuditEntry, AuditQuery, AuditRepo, AuditSummary, NewAuditEntry};
pub use dependencies::{DependencyEdge, DependencyRepo, RequiredJobCount};
pub use job_types::{JobType, JobTypeRepo};
pub use notifications::{NewNotification, Notification, NotificationRepo};
pub use reports::{JobMonthlyCount, ReportRepo, UserActivity};
pub use scan_logs::{HistoryQuery, NewScan, ScanInsert, ScanLogRepo, ScanRow};
pub use sounds::{NewSoundSetting, SoundRepo, SoundSetting};
pub use sub_jobs::{SubJobRepo, SubJobType};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Insert or update hit a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }

    /// Insert referenced a row that does not exist.
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(e)) => e.is_foreign_key_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = DbError::not_found("scan", 42);
        assert_eq!(err.to_string(), "not found: scan '42'");
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn pool_errors_are_not_constraint_violations() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }
}
