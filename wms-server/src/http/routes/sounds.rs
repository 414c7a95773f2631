//! Sound setting endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{routing::delete, routing::get, routing::put, Json, Router};
use serde::Deserialize;
use wms_core::messages;
use wms_core::model::SoundEvent;

use crate::db::repos::SoundSetting;
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, OptionalUser};
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::services::sounds::SoundSettingInput;
use crate::services::{ResolvedSound, SoundService};

#[derive(Deserialize)]
pub struct ResolveParams {
    pub event: String,
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
}

/// GET /api/sounds
async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
) -> Result<ApiResponse<Vec<SoundSetting>>, ApiError> {
    Ok(ApiResponse::ok(SoundService::new(state.services()).list().await?))
}

/// POST /api/sounds
async fn upsert(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Json(input): Json<SoundSettingInput>,
) -> Result<ApiResponse<SoundSetting>, ApiError> {
    let setting = SoundService::new(state.services()).upsert(input).await?;
    Ok(ApiResponse::with_message(messages::UPDATE_OK, setting))
}

/// DELETE /api/sounds/{id}
async fn delete_one(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    SoundService::new(state.services()).delete(id).await?;
    Ok(ApiResponse::message(messages::DELETE_OK))
}

/// PUT /api/sounds/{id}/toggle
async fn toggle(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<SoundSetting>, ApiError> {
    let setting = SoundService::new(state.services()).toggle(id).await?;
    Ok(ApiResponse::with_message(messages::UPDATE_OK, setting))
}

/// GET /api/sounds/resolve
async fn resolve(
    State(state): State<Arc<AppState>>,
    OptionalUser(_): OptionalUser,
    Query(params): Query<ResolveParams>,
) -> Result<ApiResponse<Option<ResolvedSound>>, ApiError> {
    let event: SoundEvent = params.event.parse()?;
    let sound = SoundService::new(state.services())
        .resolve(params.job_id, params.sub_job_id, event)
        .await?;
    Ok(ApiResponse::ok(sound))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sounds", get(list).post(upsert))
        .route("/api/sounds/resolve", get(resolve))
        .route("/api/sounds/{id}", delete(delete_one))
        .route("/api/sounds/{id}/toggle", put(toggle))
}

#[cfg(test)]
mod tests {
    use crate::http::build_router;
    use crate::http::server::tests::{body_json, offline_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use wms_core::WmsConfig;

    #[tokio::test]
    async fn resolve_is_empty_when_sound_disabled() {
        let mut config = WmsConfig::default();
        config.sound.enabled = false;

        let response = build_router(offline_state(config))
            .oneshot(
                Request::builder()
                    .uri("/api/sounds/resolve?event=success&job_id=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn resolve_rejects_unknown_event() {
        let response = build_router(offline_state(WmsConfig::default()))
            .oneshot(
                Request::builder()
                    .uri("/api/sounds/resolve?event=explosion")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
