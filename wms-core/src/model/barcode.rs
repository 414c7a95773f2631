//! Barcode validation
//!
//! Scanners type the code followed by Enter, so surrounding whitespace is
//! stripped before any check runs.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for a barcode, in characters
pub const MAX_BARCODE_LEN: usize = 100;

/// Control characters never come from a scanner
static CONTROL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Cc}").expect("invalid control-char regex"));

/// Validated, trimmed barcode
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Barcode(String);

impl Barcode {
    /// Create a barcode from raw scanner input.
    ///
    /// # Rules
    /// - Leading/trailing whitespace removed
    /// - Must not be empty after trimming
    /// - Max 100 characters
    /// - No control characters
    ///
    /// # Example
    /// ```
    /// use wms_core::model::Barcode;
    ///
    /// assert_eq!(Barcode::new("  BC001\n").unwrap().as_str(), "BC001");
    /// assert!(Barcode::new("   ").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let s = raw.trim();

        if s.is_empty() {
            return Err(ValidationError::Empty { field: "บาร์โค้ด" });
        }

        if s.chars().count() > MAX_BARCODE_LEN {
            return Err(ValidationError::TooLong {
                field: "บาร์โค้ด",
                max: MAX_BARCODE_LEN,
            });
        }

        if CONTROL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "บาร์โค้ด",
                reason: "มีอักขระควบคุมที่ไม่อนุญาต",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Barcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Barcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages;

    #[test]
    fn trims_scanner_input() {
        assert_eq!(Barcode::new("\tBC-001 \r\n").unwrap().as_str(), "BC-001");
    }

    #[test]
    fn rejects_empty() {
        let err = Barcode::new("  ").unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
        assert_eq!(err.to_string(), messages::EMPTY_BARCODE);
    }

    #[test]
    fn max_length_counts_characters() {
        assert!(Barcode::new(&"ก".repeat(100)).is_ok());

        let err = Barcode::new(&"1".repeat(101)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 100, .. }));
    }

    #[test]
    fn rejects_embedded_control_chars() {
        let err = Barcode::new("BC\u{7}001").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }
}
