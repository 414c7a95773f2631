//! CSV import endpoints. The request body is the raw file.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, routing::post, Router};

use super::reports::FormatParams;
use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::response::{csv_attachment, ApiResponse};
use crate::http::server::AppState;
use crate::services::import::{ImportReport, ValidationReport};
use crate::services::ImportService;

/// POST /api/import/validate
async fn validate(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    body: Bytes,
) -> Result<ApiResponse<ValidationReport>, ApiError> {
    let report = ImportService::new(state.services()).validate(&body).await?;
    Ok(ApiResponse::with_message(report.message.clone(), report))
}

/// POST /api/import
async fn import(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Result<ApiResponse<ImportReport>, ApiError> {
    let report = ImportService::new(state.services())
        .import(&body, &user)
        .await?;
    Ok(ApiResponse::with_message(report.message.clone(), report))
}

/// GET /api/import/template
///
/// CSV by default; `?format=json` returns the columns and catalog instead.
async fn template(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Query(params): Query<FormatParams>,
) -> Result<Response, ApiError> {
    let template = ImportService::new(state.services()).template().await?;
    let json = params
        .format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        return Ok(ApiResponse::ok(template).into_response());
    }
    Ok(csv_attachment("import_template.csv", template.csv))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/import/validate", post(validate))
        .route("/api/import", post(import))
        .route("/api/import/template", get(template))
}

#[cfg(test)]
mod tests {
    use crate::http::build_router;
    use crate::http::server::tests::{body_json, offline_state};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use wms_core::{messages, WmsConfig};

    #[tokio::test]
    async fn header_only_file_has_nothing_to_import() {
        let state = offline_state(WmsConfig::default());
        let session = state.sessions.open("admin");

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/import/validate")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .header("content-type", "text/csv")
                    .body(Body::from("barcode,main_job_id,sub_job_id,notes\n"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], messages::NO_IMPORT_DATA);
    }

    #[tokio::test]
    async fn missing_required_column_is_bad_request() {
        let state = offline_state(WmsConfig::default());
        let session = state.sessions.open("admin");

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/import")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .body(Body::from("barcode,notes\nBC1,x\n"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
