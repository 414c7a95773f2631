//! Job type and sub job type endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::get, routing::post, routing::put, Json, Router};
use serde::Deserialize;
use wms_core::messages;

use crate::db::repos::{JobType, SubJobType};
use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::services::jobs::{SubJobInput, SubJobRemoval, SubJobUpdate};
use crate::services::JobService;

#[derive(Deserialize)]
pub struct JobNameRequest {
    pub job_name: String,
}

#[derive(Deserialize, Default)]
pub struct SubJobListParams {
    #[serde(default)]
    pub include_inactive: bool,
}

/// GET /api/job_types
async fn list_jobs(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
) -> Result<ApiResponse<Vec<JobType>>, ApiError> {
    Ok(ApiResponse::ok(JobService::new(state.services()).list().await?))
}

/// POST /api/job_types
async fn create_job(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Json(req): Json<JobNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = JobService::new(state.services()).create(&req.job_name).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(job)))
}

/// PUT /api/job_types/{id}
async fn rename_job(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<JobNameRequest>,
) -> Result<ApiResponse<JobType>, ApiError> {
    let job = JobService::new(state.services()).rename(id, &req.job_name).await?;
    Ok(ApiResponse::with_message(messages::UPDATE_OK, job))
}

/// DELETE /api/job_types/{id}
async fn delete_job(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    JobService::new(state.services()).delete(id).await?;
    Ok(ApiResponse::message(messages::DELETE_OK))
}

/// GET /api/sub_job_types
async fn list_all_sub_jobs(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
) -> Result<ApiResponse<Vec<SubJobType>>, ApiError> {
    Ok(ApiResponse::ok(
        JobService::new(state.services()).all_sub_jobs().await?,
    ))
}

/// GET /api/sub_job_types/{job_id}
async fn list_sub_jobs(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(job_id): Path<i64>,
    Query(params): Query<SubJobListParams>,
) -> Result<ApiResponse<Vec<SubJobType>>, ApiError> {
    let subs = JobService::new(state.services())
        .sub_jobs(job_id, params.include_inactive)
        .await?;
    Ok(ApiResponse::ok(subs))
}

/// POST /api/sub_job_types
async fn create_sub_job(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Json(input): Json<SubJobInput>,
) -> Result<impl IntoResponse, ApiError> {
    let sub = JobService::new(state.services()).create_sub_job(&input).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(sub)))
}

/// PUT /api/sub_job_types/{id}
async fn update_sub_job(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
    Json(update): Json<SubJobUpdate>,
) -> Result<ApiResponse<SubJobType>, ApiError> {
    let sub = JobService::new(state.services())
        .update_sub_job(id, &update)
        .await?;
    Ok(ApiResponse::with_message(messages::UPDATE_OK, sub))
}

/// DELETE /api/sub_job_types/{id}
async fn delete_sub_job(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<SubJobRemoval>, ApiError> {
    let removal = JobService::new(state.services()).delete_sub_job(id).await?;
    Ok(ApiResponse::with_message(messages::DELETE_OK, removal))
}

/// POST /api/sub_job_types/{id}/activate
async fn activate_sub_job(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<SubJobType>, ApiError> {
    let sub = JobService::new(state.services()).activate_sub_job(id).await?;
    Ok(ApiResponse::with_message(messages::UPDATE_OK, sub))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/job_types", get(list_jobs).post(create_job))
        .route("/api/job_types/{id}", put(rename_job).delete(delete_job))
        .route(
            "/api/sub_job_types",
            get(list_all_sub_jobs).post(create_sub_job),
        )
        // GET takes the main job id; PUT and DELETE take the sub job id
        .route(
            "/api/sub_job_types/{id}",
            get(list_sub_jobs).put(update_sub_job).delete(delete_sub_job),
        )
        .route("/api/sub_job_types/{id}/activate", post(activate_sub_job))
}
