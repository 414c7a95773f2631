//! HTTP server layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing
//! - Per-client rate limiting by route group
//! - In-memory login sessions
//! - Graceful shutdown
//! - JSON envelope `{success, message?, data?}` for every response

pub mod error;
pub mod extractors;
pub mod rate_limit;
pub mod response;
pub mod routes;
pub mod server;
pub mod session;

pub use error::ApiError;
pub use response::ApiResponse;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
