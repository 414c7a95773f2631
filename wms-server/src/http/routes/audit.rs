//! Audit trail endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{routing::get, Router};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::services::audit::{AuditEntryView, AuditFilter, DailyAuditSummary};
use crate::services::AuditService;

#[derive(Deserialize)]
pub struct SummaryParams {
    pub date: Option<String>,
}

/// GET /api/audit
async fn history(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Query(filter): Query<AuditFilter>,
) -> Result<ApiResponse<Vec<AuditEntryView>>, ApiError> {
    let entries = AuditService::new(state.services()).history(&filter).await?;
    Ok(ApiResponse::ok(entries))
}

/// GET /api/audit/summary
async fn summary(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Query(params): Query<SummaryParams>,
) -> Result<ApiResponse<DailyAuditSummary>, ApiError> {
    let summary = AuditService::new(state.services())
        .daily_summary(params.date.as_deref())
        .await?;
    Ok(ApiResponse::ok(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/audit", get(history))
        .route("/api/audit/summary", get(summary))
}

#[cfg(test)]
mod tests {
    use crate::http::build_router;
    use crate::http::server::tests::offline_state;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use wms_core::WmsConfig;

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let state = offline_state(WmsConfig::default());
        let session = state.sessions.open("admin");

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/audit?action=INSERT")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
