//! Closed sets of string-valued kinds stored in the database

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Audit trail action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for AuditAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(ValidationError::InvalidVariant {
                field: "ประเภทการกระทำ",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event that triggers a sound on the scan station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundEvent {
    Success,
    Error,
    Duplicate,
    Warning,
}

impl SoundEvent {
    pub const ALL: [SoundEvent; 4] = [Self::Success, Self::Error, Self::Duplicate, Self::Warning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Duplicate => "duplicate",
            Self::Warning => "warning",
        }
    }
}

impl FromStr for SoundEvent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "duplicate" => Ok(Self::Duplicate),
            "warning" => Ok(Self::Warning),
            other => Err(ValidationError::InvalidVariant {
                field: "เหตุการณ์เสียง",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual style of a barcode popup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupType {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

impl PopupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

impl FromStr for PopupType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "success" => Ok(Self::Success),
            other => Err(ValidationError::InvalidVariant {
                field: "ประเภทป๊อปอัพ",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for PopupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("update".parse::<AuditAction>().unwrap(), AuditAction::Update);
        assert_eq!("Duplicate".parse::<SoundEvent>().unwrap(), SoundEvent::Duplicate);
        assert_eq!(" WARNING ".parse::<PopupType>().unwrap(), PopupType::Warning);
    }

    #[test]
    fn rejects_unknown_variant() {
        let err = "beep".parse::<SoundEvent>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariant { .. }));
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&AuditAction::Delete).unwrap(), "\"DELETE\"");
        assert_eq!(serde_json::to_string(&PopupType::Info).unwrap(), "\"info\"");
    }
}
