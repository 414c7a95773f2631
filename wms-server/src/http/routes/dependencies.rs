//! Job dependency endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::get, routing::post, Json, Router};
use serde::Deserialize;
use wms_core::messages;

use crate::db::repos::DependencyEdge;
use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::services::dependencies::{ReplaceOutcome, RequiredJobView};
use crate::services::DependencyService;

#[derive(Deserialize)]
pub struct RequiredJobsParams {
    #[serde(default)]
    pub with_scan_status: bool,
    #[serde(default = "default_true")]
    pub today_only: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct ReplaceRequest {
    pub required_job_ids: Vec<i64>,
}

/// GET /api/dependencies
async fn list_all(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
) -> Result<ApiResponse<Vec<DependencyEdge>>, ApiError> {
    Ok(ApiResponse::ok(
        DependencyService::new(state.services()).list_all().await?,
    ))
}

/// GET /api/dependencies/{job_id}
async fn required_jobs(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(job_id): Path<i64>,
    Query(params): Query<RequiredJobsParams>,
) -> Result<ApiResponse<Vec<RequiredJobView>>, ApiError> {
    let jobs = DependencyService::new(state.services())
        .required_jobs(job_id, params.with_scan_status, params.today_only)
        .await?;
    Ok(ApiResponse::ok(jobs))
}

/// PUT /api/dependencies/{job_id}
async fn replace(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(job_id): Path<i64>,
    Json(req): Json<ReplaceRequest>,
) -> Result<ApiResponse<ReplaceOutcome>, ApiError> {
    let outcome = DependencyService::new(state.services())
        .replace(job_id, &req.required_job_ids)
        .await?;
    Ok(ApiResponse::with_message(messages::UPDATE_OK, outcome))
}

/// POST /api/dependencies/{job_id}/{required_id}
async fn add(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path((job_id, required_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    DependencyService::new(state.services())
        .add(job_id, required_id)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::message(messages::UPDATE_OK)))
}

/// DELETE /api/dependencies/{job_id}/{required_id}
async fn remove(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path((job_id, required_id)): Path<(i64, i64)>,
) -> Result<ApiResponse<()>, ApiError> {
    DependencyService::new(state.services())
        .remove(job_id, required_id)
        .await?;
    Ok(ApiResponse::message(messages::DELETE_OK))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dependencies", get(list_all))
        .route("/api/dependencies/{job_id}", get(required_jobs).put(replace))
        .route(
            "/api/dependencies/{job_id}/{required_id}",
            post(add).delete(remove),
        )
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
    async fn self_dependency_is_rejected() {
        let state = offline_state(WmsConfig::default());
        let session = state.sessions.open("admin");

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/dependencies/4/4")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], messages::DEPENDENCY_SELF);
    }
}
