//! wms-core: domain rules for the warehouse barcode scanner
//!
//! Everything in this crate is free of database and HTTP concerns:
//! - configuration loading (`config`)
//! - validated value types (`model`)
//! - the scan rules: dependency evaluation, duplicate window, site calendar (`rules`)
//! - the CSV import/export template (`import`)
//! - user-facing Thai message text (`messages`)

pub mod config;
pub mod error;
pub mod import;
pub mod messages;
pub mod model;
pub mod rules;

pub use config::WmsConfig;
pub use error::{Result, WmsError};
pub use model::ValidationError;
