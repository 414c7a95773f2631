//! Scan, history and today-summary endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::get, routing::post, Json, Router};
use serde::Deserialize;
use wms_core::messages;

use crate::db::repos::ScanRow;
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, OptionalUser};
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::services::scan::{HistoryEntry, HistoryFilter, ScanRequest, TodaySummary};
use crate::services::ScanService;

#[derive(Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct TodaySummaryParams {
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub note_filter: Option<String>,
}

/// POST /api/scan
async fn scan(
    State(state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    Json(req): Json<ScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = ScanService::new(state.services()).process(&req, &user).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(outcome.message.clone(), outcome),
    ))
}

/// GET /api/scan/{id}
async fn get_scan(
    State(state): State<Arc<AppState>>,
    OptionalUser(_): OptionalUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<ScanRow>, ApiError> {
    let row = ScanService::new(state.services()).get(id).await?;
    Ok(ApiResponse::ok(row))
}

/// PUT /api/scan/{id}
async fn update_notes(
    State(state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateNotesRequest>,
) -> Result<ApiResponse<ScanRow>, ApiError> {
    let row = ScanService::new(state.services())
        .update_notes(id, req.notes.as_deref(), &user)
        .await?;
    Ok(ApiResponse::with_message(messages::UPDATE_OK, row))
}

/// DELETE /api/scan/{id}
async fn delete_scan(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<ScanRow>, ApiError> {
    let row = ScanService::new(state.services()).delete(id, &user).await?;
    Ok(ApiResponse::with_message(messages::DELETE_OK, row))
}

/// GET /api/history
async fn history(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<HistoryFilter>,
) -> Result<ApiResponse<Vec<HistoryEntry>>, ApiError> {
    let rows = ScanService::new(state.services()).history(&filter).await?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/today_summary
async fn today_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TodaySummaryParams>,
) -> Result<ApiResponse<TodaySummary>, ApiError> {
    let job_id = params
        .job_id
        .ok_or_else(|| ApiError::bad_request(messages::NO_JOB_SELECTED))?;
    let summary = ScanService::new(state.services())
        .today_summary(job_id, params.sub_job_id, params.note_filter.as_deref())
        .await?;
    Ok(ApiResponse::ok(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/scan", post(scan))
        .route(
            "/api/scan/{id}",
            get(get_scan).put(update_notes).delete(delete_scan),
        )
        .route("/api/history", get(history))
        .route("/api/today_summary", get(today_summary))
}

#[cfg(test)]
mod tests {
    use crate::http::build_router;
    use crate::http::server::tests::{body_json, offline_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use wms_core::{messages, WmsConfig};

    fn post_scan(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/scan")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn blank_barcode_is_rejected_before_database() {
        let app = build_router(offline_state(WmsConfig::default()));
        let response = app
            .oneshot(post_scan(r#"{"barcode":"   ","job_id":1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], messages::EMPTY_BARCODE);
    }

    #[tokio::test]
    async fn scan_without_job_is_rejected() {
        let app = build_router(offline_state(WmsConfig::default()));
        let response = app
            .oneshot(post_scan(r#"{"barcode":"BC001"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], messages::NO_JOB_SELECTED);
    }

    #[tokio::test]
    async fn delete_requires_session() {
        let app = build_router(offline_state(WmsConfig::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/scan/5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn history_rejects_bad_date() {
        let app = build_router(offline_state(WmsConfig::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/history?date=15-03-2024")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
