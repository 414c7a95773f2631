//! Field-level input errors

use thiserror::Error;

/// Rejected input. `field` is the Thai label shown to the operator, so
/// `Display` output can go straight to the scan station or API response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("กรุณากรอก{field}")]
    Empty { field: &'static str },

    #[error("{field}ยาวเกิน {max} ตัวอักษร")]
    TooLong { field: &'static str, max: usize },

    #[error("{field}: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Number or date outside the accepted range
    #[error("{field}ไม่ถูกต้อง: {value}")]
    OutOfRange { field: &'static str, value: String },

    /// Unknown event, popup or audit action name
    #[error("ค่า{field}ไม่ถูกต้อง: '{value}'")]
    InvalidVariant { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thai_labels_render_inline() {
        let err = ValidationError::TooLong {
            field: "ชื่องาน",
            max: 100,
        };
        assert_eq!(err.to_string(), "ชื่องานยาวเกิน 100 ตัวอักษร");

        let err = ValidationError::Empty { field: "บาร์โค้ด" };
        assert_eq!(err.to_string(), crate::messages::EMPTY_BARCODE);
    }

    #[test]
    fn variant_value_is_quoted() {
        let err = ValidationError::InvalidVariant {
            field: "ประเภทเหตุการณ์",
            value: "beep".into(),
        };
        assert_eq!(err.to_string(), "ค่าประเภทเหตุการณ์ไม่ถูกต้อง: 'beep'");
    }
}
