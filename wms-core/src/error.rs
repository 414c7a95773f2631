/// Structured error types for wms-core.
///
/// Library consumers get composable `thiserror` errors; the `wms` binary
/// wraps them in `anyhow` with context.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::ValidationError;

/// Main error type for wms-core operations
#[derive(Error, Debug)]
pub enum WmsError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Configuration file could not be parsed or holds an invalid value
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Config file missing at the expected location
    #[error("Config not found at {path:?}")]
    ConfigNotFound { path: PathBuf },

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input failed validation
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Import file is structurally unusable (missing required columns)
    #[error("Import failed: {reason}")]
    Import { reason: String },
}

/// Result type alias for wms-core operations
pub type Result<T> = std::result::Result<T, WmsError>;

impl WmsError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create an import error
    pub fn import(reason: impl Into<String>) -> Self {
        Self::Import {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WmsError::config("timezone 'Mars/Olympus' is not a valid IANA name");
        assert_eq!(
            err.to_string(),
            "Configuration error: timezone 'Mars/Olympus' is not a valid IANA name"
        );

        let err = WmsError::import("missing column barcode");
        assert!(err.to_string().contains("missing column barcode"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let wms_err: WmsError = io_err.into();

        assert!(matches!(wms_err, WmsError::Io { .. }));
    }

    #[test]
    fn validation_error_passes_message_through() {
        let err: WmsError = ValidationError::Empty { field: "barcode" }.into();
        assert_eq!(err.to_string(), ValidationError::Empty { field: "barcode" }.to_string());
    }
}
