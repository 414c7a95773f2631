//! Value types with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod barcode;
pub mod kinds;
pub mod names;
pub mod validation;

pub use barcode::Barcode;
pub use kinds::{AuditAction, PopupType, SoundEvent};
pub use names::{Description, JobName, Notes, SubJobName};
pub use validation::ValidationError;
