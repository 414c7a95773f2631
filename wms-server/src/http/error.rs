//! API error types with IntoResponse
//!
//! Errors are converted to the JSON envelope with `success: false` and an
//! HTTP status matching the failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use wms_core::messages;
use wms_core::ValidationError;

use crate::db::DbError;
use crate::services::scan::DuplicateScan;
use crate::services::{MissingDependencies, ServiceError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Well-formed but unusable input (400)
    BadRequest { message: String },

    /// No valid session (401)
    Unauthorized { message: String },

    /// Resource not found (404)
    NotFound { message: String },

    /// Name taken, record in use (409)
    Conflict { message: String },

    /// Barcode already scanned for this job (409)
    Duplicate(Box<DuplicateScan>),

    /// Required jobs not scanned yet (422)
    MissingDependencies(Box<MissingDependencies>),

    /// Too many requests from this client (429)
    RateLimited,

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            message: messages::LOGIN_REQUIRED.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::MissingDependencies(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Duplicate(_) => "duplicate_scan",
            Self::MissingDependencies(_) => "missing_dependencies",
            Self::RateLimited => "rate_limited",
            Self::Database(_) | Self::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let (message, data): (String, Option<Value>) = match self {
            Self::Validation(e) => (e.to_string(), None),
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::NotFound { message }
            | Self::Conflict { message } => (message, None),
            Self::Duplicate(dup) => (dup.message.clone(), serde_json::to_value(&*dup).ok()),
            Self::MissingDependencies(missing) => (
                missing.message.clone(),
                serde_json::to_value(&*missing).ok(),
            ),
            Self::RateLimited => (messages::RATE_LIMITED.to_string(), None),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (messages::INTERNAL_ERROR.to_string(), None)
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (messages::INTERNAL_ERROR.to_string(), None)
            }
        };

        let mut body = json!({
            "success": false,
            "error": kind,
            "message": message,
        });
        if let Some(data) = data {
            body["data"] = data;
        }

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        ServiceError::from(e).into()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(v) => Self::Validation(v),
            ServiceError::BadInput { message } => Self::BadRequest { message },
            ServiceError::NotFound { message } => Self::NotFound { message },
            ServiceError::Conflict { message } => Self::Conflict { message },
            ServiceError::Duplicate(dup) => Self::Duplicate(dup),
            ServiceError::MissingDependencies(missing) => Self::MissingDependencies(missing),
            ServiceError::Db(db) => Self::Database(db),
            ServiceError::Internal(message) => Self::Internal { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use wms_core::rules::RequiredJob;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "บาร์โค้ด" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], messages::EMPTY_BARCODE);
    }

    #[tokio::test]
    async fn missing_dependencies_is_422_with_jobs() {
        let err: ApiError = ServiceError::MissingDependencies(Box::new(MissingDependencies::new(
            vec![RequiredJob {
                job_id: 1,
                job_name: "1.Release".into(),
            }],
            None,
        )))
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["data"]["missing"][0]["job_name"], "1.Release");
    }

    #[tokio::test]
    async fn db_not_found_is_404() {
        let err: ApiError = DbError::not_found("scan", 9).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn database_error_hides_details() {
        let err: ApiError = DbError::from(sqlx::Error::PoolTimedOut).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], messages::INTERNAL_ERROR);
    }

    #[test]
    fn rate_limited_is_429() {
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
