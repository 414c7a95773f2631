//! Route handlers organized by resource

pub mod audit;
pub mod auth;
pub mod dependencies;
pub mod health;
pub mod import;
pub mod jobs;
pub mod notifications;
pub mod reports;
pub mod scan;
pub mod sounds;
