//! Popup notification endpoints

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::delete, routing::get, routing::post, routing::put, Json, Router};
use wms_core::messages;

use crate::db::repos::Notification;
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, OptionalUser};
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::services::notifications::NotificationInput;
use crate::services::NotificationService;

/// GET /api/notifications
async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
) -> Result<ApiResponse<Vec<Notification>>, ApiError> {
    Ok(ApiResponse::ok(
        NotificationService::new(state.services()).list().await?,
    ))
}

/// POST /api/notifications
async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NotificationInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = NotificationService::new(state.services())
        .create(input, &user)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(created)))
}

/// DELETE /api/notifications
async fn clear(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<u64>, ApiError> {
    let removed = NotificationService::new(state.services()).clear().await?;
    tracing::info!(user, removed, "notifications cleared via API");
    Ok(ApiResponse::with_message(messages::DELETE_OK, removed))
}

/// DELETE /api/notifications/{id}
async fn delete_one(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    NotificationService::new(state.services()).delete(id).await?;
    Ok(ApiResponse::message(messages::DELETE_OK))
}

/// PUT /api/notifications/{id}/toggle
async fn toggle(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Notification>, ApiError> {
    let updated = NotificationService::new(state.services()).toggle(id).await?;
    Ok(ApiResponse::with_message(messages::UPDATE_OK, updated))
}

/// POST /api/notifications/import
async fn import(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Result<ApiResponse<u64>, ApiError> {
    let inserted = NotificationService::new(state.services())
        .import_csv(&body, &user)
        .await?;
    Ok(ApiResponse::with_message(
        messages::import_complete(inserted as usize, 0),
        inserted,
    ))
}

/// GET /api/notifications/barcode/{barcode}
async fn for_barcode(
    State(state): State<Arc<AppState>>,
    OptionalUser(_): OptionalUser,
    Path(barcode): Path<String>,
) -> Result<ApiResponse<Option<Notification>>, ApiError> {
    let found = NotificationService::new(state.services())
        .for_barcode(&barcode)
        .await?;
    Ok(ApiResponse::ok(found))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list).post(create).delete(clear))
        .route("/api/notifications/import", post(import))
        .route("/api/notifications/{id}", delete(delete_one))
        .route("/api/notifications/{id}/toggle", put(toggle))
        .route("/api/notifications/barcode/{barcode}", get(for_barcode))
}

#[cfg(test)]
mod tests {
    use crate::http::build_router;
    use crate::http::server::tests::{body_json, offline_state};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use wms_core::WmsConfig;

    #[tokio::test]
    async fn create_rejects_unknown_popup_type() {
        let state = offline_state(WmsConfig::default());
        let session = state.sessions.open("admin");

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/notifications")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"barcode":"BC1","popup_type":"blink","message":"x"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
    }
}
