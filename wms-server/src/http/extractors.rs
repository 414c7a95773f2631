//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::ApiError;
use super::server::AppState;
use super::session::{token_from_headers, Session};

fn session_of(parts: &Parts, state: &AppState) -> Option<Session> {
    token_from_headers(&parts.headers).and_then(|token| state.sessions.touch(&token))
}

/// Operator for endpoints that require a login.
///
/// Rejects with 401 when `auth.required` is set and no live session is
/// presented; otherwise falls back to the configured default user.
pub struct CurrentUser(pub String);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match session_of(parts, state) {
            Some(session) => Ok(Self(session.username)),
            None if state.config.auth.required => Err(ApiError::unauthorized()),
            None => Ok(Self(state.config.scanning.default_user.clone())),
        }
    }
}

/// Operator for attribution only; anonymous callers become the default user.
pub struct OptionalUser(pub String);

impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = session_of(parts, state)
            .map(|s| s.username)
            .unwrap_or_else(|| state.config.scanning.default_user.clone());
        Ok(Self(user))
    }
}
