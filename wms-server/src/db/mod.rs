//! Database layer - connection pool, schema and repositories
//!
//! # Design Principles
//!
//! - One shared PgPool, no per-request connections
//! - Parameterized SQL only
//! - Multi-statement writes run in a transaction

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::DbError;
