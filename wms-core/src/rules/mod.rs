//! Scan rules that need no database
//!
//! The repositories fetch facts; these functions decide.

pub mod calendar;
pub mod dependency;
pub mod duplicate;

pub use calendar::{parse_date, validate_year_month, DateRange, ScanStatus, SiteCalendar};
pub use dependency::{missing_requirements, would_create_cycle, RequiredJob};
pub use duplicate::DuplicateWindow;
