//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Rate limiting middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::{middleware, Router};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wms_core::config::ServerSection;
use wms_core::rules::SiteCalendar;
use wms_core::{WmsConfig, WmsError};

use super::rate_limit::{limit_requests, RateLimiters};
use super::routes;
use super::session::SessionStore;
use crate::services::ServiceContext;

/// How often expired sessions and idle limiter buckets are dropped
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cors_permissive: false,
        }
    }
}

impl ServerConfig {
    pub fn from_section(section: &ServerSection) -> Result<Self, ServerError> {
        let bind_addr = section
            .bind
            .parse()
            .map_err(|_| ServerError::InvalidBind {
                addr: section.bind.clone(),
            })?;
        Ok(Self {
            bind_addr,
            cors_permissive: section.cors_permissive,
        })
    }
}

/// Shared application state
pub struct AppState {
    pub pool: PgPool,
    pub config: WmsConfig,
    pub calendar: SiteCalendar,
    pub sessions: SessionStore,
    pub limiter: RateLimiters,
}

impl AppState {
    pub fn new(pool: PgPool, config: WmsConfig) -> Result<Self, ServerError> {
        let calendar = config.scanning.calendar()?;
        Ok(Self {
            sessions: SessionStore::new(config.auth.session_ttl_minutes),
            limiter: RateLimiters::new(&config.rate_limits),
            calendar,
            pool,
            config,
        })
    }

    /// Borrowed context for the service layer.
    pub fn services(&self) -> ServiceContext<'_> {
        ServiceContext {
            pool: &self.pool,
            config: &self.config,
            calendar: self.calendar,
        }
    }
}

fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }
    // Localhost only
    CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
            HeaderValue::from_static("http://127.0.0.1:5000"),
        ])
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Every route with middleware and state attached.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.server.cors_permissive);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::scan::router())
        .merge(routes::jobs::router())
        .merge(routes::dependencies::router())
        .merge(routes::reports::router())
        .merge(routes::import::router())
        .merge(routes::audit::router())
        .merge(routes::notifications::router())
        .merge(routes::sounds::router())
        .layer(middleware::from_fn_with_state(state.clone(), limit_requests))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&config.database.url).await?;
/// let server = ServerConfig::from_section(&config.server)?;
/// run_server(pool, config, server).await?;
/// ```
pub async fn run_server(
    pool: PgPool,
    app_config: WmsConfig,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let mut app_config = app_config;
    app_config.server.cors_permissive = config.cors_permissive;

    let state = Arc::new(AppState::new(pool, app_config)?);
    tracing::info!(
        timezone = %state.calendar.tz().name(),
        auth_required = state.config.auth.required,
        "application state ready"
    );

    let cleanup = tokio::spawn(cleanup_loop(state.clone()));
    let app = build_router(state);

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cleanup.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn cleanup_loop(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
    loop {
        ticker.tick().await;
        let expired = state.sessions.purge_expired();
        if expired > 0 {
            tracing::debug!(expired, "expired sessions removed");
        }
        state.limiter.retain_recent();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Config(#[from] WmsError),

    #[error("invalid bind address '{addr}'")]
    InvalidBind { addr: String },
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    /// State over a pool that never connects; enough for routes that
    /// fail before touching the database.
    pub(crate) fn offline_state(config: WmsConfig) -> Arc<AppState> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .expect("lazy pool");
        Arc::new(AppState::new(pool, config).expect("state"))
    }

    pub(crate) async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 5000);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn bind_address_is_parsed() {
        let section = ServerSection {
            bind: "0.0.0.0:8080".into(),
            cors_permissive: true,
        };
        let config = ServerConfig::from_section(&section).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.cors_permissive);

        let bad = ServerSection {
            bind: "not-an-address".into(),
            cors_permissive: false,
        };
        assert!(matches!(
            ServerConfig::from_section(&bad),
            Err(ServerError::InvalidBind { .. })
        ));
    }

    #[tokio::test]
    async fn protected_route_requires_session() {
        let app = build_router(offline_state(WmsConfig::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/job_types")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_router(offline_state(WmsConfig::default()));
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_is_rate_limited() {
        let mut config = WmsConfig::default();
        config.rate_limits.login = 1;
        let state = offline_state(config);

        let login = || {
            Request::builder()
                .method("POST")
                .uri("/api/login")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"username":"","password":""}"#))
                .unwrap()
        };

        let first = build_router(state.clone()).oneshot(login()).await.unwrap();
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);

        let second = build_router(state).oneshot(login()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
