//! Catalog names and free-text fields

use super::ValidationError;

pub const MAX_JOB_NAME_LEN: usize = 100;
pub const MAX_SUB_JOB_NAME_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_NOTES_LEN: usize = 1000;

fn trimmed_bounded(
    raw: &str,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if s.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(s.to_owned())
}

/// Validated job type name (e.g. `1.Release`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobName(String);

impl JobName {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        trimmed_bounded(raw, "ชื่อประเภทงาน", MAX_JOB_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated sub job type name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubJobName(String);

impl SubJobName {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        trimmed_bounded(raw, "ชื่องานย่อย", MAX_SUB_JOB_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Optional description; blank input means "no description".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(Option<String>);

impl Description {
    pub fn new(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self(None)),
            Some(s) if s.chars().count() > MAX_DESCRIPTION_LEN => Err(ValidationError::TooLong {
                field: "คำอธิบาย",
                max: MAX_DESCRIPTION_LEN,
            }),
            Some(s) => Ok(Self(Some(s.to_owned()))),
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

/// Scan notes. Trimmed; empty becomes NULL in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notes(Option<String>);

impl Notes {
    pub fn new(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self(None)),
            Some(s) if s.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
                field: "หมายเหตุ",
                max: MAX_NOTES_LEN,
            }),
            Some(s) => Ok(Self(Some(s.to_owned()))),
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_name_trimmed() {
        assert_eq!(JobName::new(" 4.Loading ").unwrap().as_str(), "4.Loading");
    }

    #[test]
    fn job_name_limits() {
        assert!(matches!(
            JobName::new("").unwrap_err(),
            ValidationError::Empty { .. }
        ));
        assert!(JobName::new(&"x".repeat(100)).is_ok());
        assert!(matches!(
            JobName::new(&"x".repeat(101)).unwrap_err(),
            ValidationError::TooLong { max: 100, .. }
        ));
    }

    #[test]
    fn sub_job_name_allows_thai() {
        let name = SubJobName::new("รับสินค้าปกติ").unwrap();
        assert_eq!(name.as_str(), "รับสินค้าปกติ");
    }

    #[test]
    fn blank_notes_become_none() {
        assert_eq!(Notes::new(Some("   ")).unwrap().as_deref(), None);
        assert_eq!(Notes::new(None).unwrap().as_deref(), None);
        assert_eq!(Notes::new(Some(" pallet 3 ")).unwrap().as_deref(), Some("pallet 3"));
    }

    #[test]
    fn description_too_long() {
        let long = "d".repeat(501);
        assert!(Description::new(Some(&long)).is_err());
    }
}
