//! Report endpoints, JSON or CSV

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, routing::post, Json, Router};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::response::{csv_attachment, ApiResponse};
use crate::http::server::AppState;
use crate::services::reports::{
    daily_csv, daily_csv_filename, monthly_csv, user_activity_csv, DailyReport,
    DailyReportRequest,
};
use crate::services::ReportService;

#[derive(Deserialize, Default)]
pub struct FormatParams {
    pub format: Option<String>,
}

impl FormatParams {
    fn csv(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("csv"))
    }
}

#[derive(Deserialize)]
pub struct UserActivityParams {
    pub start_date: String,
    pub end_date: String,
    pub format: Option<String>,
}

/// POST /api/report
async fn daily(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Json(req): Json<DailyReportRequest>,
) -> Result<ApiResponse<DailyReport>, ApiError> {
    let report = ReportService::new(state.services()).daily(&req).await?;
    Ok(ApiResponse::with_message(report.message.clone(), report))
}

/// POST /api/report/export
async fn daily_export(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<DailyReportRequest>,
) -> Result<Response, ApiError> {
    let report = ReportService::new(state.services()).daily(&req).await?;
    let bytes = daily_csv(&report)?;
    tracing::info!(user, rows = report.rows.len(), "daily report exported");
    Ok(csv_attachment(&daily_csv_filename(&report.summary), bytes))
}

/// GET /api/report/monthly/{year}/{month}
async fn monthly(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path((year, month)): Path<(i32, u32)>,
    Query(params): Query<FormatParams>,
) -> Result<Response, ApiError> {
    let report = ReportService::new(state.services())
        .monthly(year, month)
        .await?;
    if params.csv() {
        let filename = format!("monthly_{}_{:02}.csv", year, month);
        return Ok(csv_attachment(&filename, monthly_csv(&report)?));
    }
    Ok(ApiResponse::ok(report).into_response())
}

/// GET /api/report/user_activity
async fn user_activity(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Query(params): Query<UserActivityParams>,
) -> Result<Response, ApiError> {
    let report = ReportService::new(state.services())
        .user_activity(&params.start_date, &params.end_date)
        .await?;
    let format = FormatParams {
        format: params.format,
    };
    if format.csv() {
        let filename = format!(
            "user_activity_{}_{}.csv",
            report.range.start, report.range.end
        );
        return Ok(csv_attachment(&filename, user_activity_csv(&report)?));
    }
    Ok(ApiResponse::ok(report).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/report", post(daily))
        .route("/api/report/export", post(daily_export))
        .route("/api/report/monthly/{year}/{month}", get(monthly))
        .route("/api/report/user_activity", get(user_activity))
}

#[cfg(test)]
mod tests {
    use super::FormatParams;
    use crate::http::build_router;
    use crate::http::server::tests::{body_json, offline_state};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use wms_core::{messages, WmsConfig};

    #[test]
    fn csv_format_flag() {
        assert!(FormatParams {
            format: Some("CSV".into())
        }
        .csv());
        assert!(!FormatParams::default().csv());
    }

    #[tokio::test]
    async fn monthly_rejects_month_13() {
        let state = offline_state(WmsConfig::default());
        let session = state.sessions.open("admin");

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/report/monthly/2024/13")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], messages::INVALID_YEAR_MONTH);
    }

    #[tokio::test]
    async fn daily_report_requires_date() {
        let state = offline_state(WmsConfig::default());
        let session = state.sessions.open("admin");

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/report")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"job_id":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], messages::NO_DATE);
    }
}
