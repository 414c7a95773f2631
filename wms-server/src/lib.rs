//! wms-server: storage, scan services and HTTP API
//!
//! Layering, top to bottom:
//! - `http`: axum routes, sessions, rate limiting, JSON envelope
//! - `services`: validation and orchestration of every operation
//! - `db`: connection pool, schema, one repository per table

pub mod db;
pub mod http;
pub mod services;

pub use http::{run_server, AppState, ServerConfig};
pub use services::{ServiceContext, ServiceError};
