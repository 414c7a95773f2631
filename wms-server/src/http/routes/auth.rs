//! Login, logout and connection status
//!
//! Login succeeds when the database accepts the supplied credentials.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::{routing::get, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wms_core::messages;

use crate::db::pool::{ping, verify_credentials};
use crate::http::error::ApiError;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::http::session::{expired_cookie, session_cookie, token_from_headers};

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub database_connected: bool,
    pub auth_required: bool,
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub timezone: &'static str,
}

/// POST /api/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request(messages::LOGIN_INCOMPLETE));
    }

    if let Err(e) = verify_credentials(&state.config.database.url, username, &req.password).await {
        tracing::warn!(username, error = %e, "login rejected");
        return Err(ApiError::Unauthorized {
            message: messages::LOGIN_FAILED.to_string(),
        });
    }

    let session = state.sessions.open(username);
    let cookie = session_cookie(&session.token, state.config.auth.session_ttl_minutes);
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::with_message(
            messages::LOGIN_OK,
            LoginResponse {
                token: session.token,
                username: session.username,
                expires_at: session.expires_at,
            },
        ),
    ))
}

/// POST /api/logout
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.close(&token);
    }
    (
        [(header::SET_COOKIE, expired_cookie())],
        ApiResponse::message(messages::LOGOUT_OK),
    )
}

/// GET /api/status
async fn status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResponse<StatusResponse> {
    let session = token_from_headers(&headers).and_then(|t| state.sessions.touch(&t));
    let database_connected = match ping(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "status: database unreachable");
            false
        }
    };
    ApiResponse::ok(StatusResponse {
        database_connected,
        auth_required: state.config.auth.required,
        logged_in: session.is_some(),
        username: session.map(|s| s.username),
        timezone: state.calendar.tz().name(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/status", get(status))
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
    async fn login_requires_both_fields() {
        let app = build_router(offline_state(WmsConfig::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/login")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username":"somchai"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], messages::LOGIN_INCOMPLETE);
    }

    #[tokio::test]
    async fn logout_closes_bearer_session() {
        let state = offline_state(WmsConfig::default());
        let session = state.sessions.open("somchai");

        let response = build_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/logout")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
        assert!(state.sessions.is_empty());
    }
}
