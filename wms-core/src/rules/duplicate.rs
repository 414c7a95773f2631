//! Duplicate scan window

use chrono::{DateTime, Duration, Utc};

/// One year, the window the warehouse has always run with
pub const DEFAULT_WINDOW_HOURS: u32 = 24 * 365;

/// How far back a scan with the same `(barcode, job, sub job)` key blocks a
/// new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateWindow {
    hours: u32,
}

impl DuplicateWindow {
    /// Zero is raised to one hour; a zero window would never match.
    pub fn from_hours(hours: u32) -> Self {
        Self {
            hours: hours.max(1),
        }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// Earliest scan time that still counts as a duplicate.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(i64::from(self.hours))
    }

    pub fn contains(&self, scanned_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        scanned_at >= self.cutoff(now)
    }
}

impl Default for DuplicateWindow {
    fn default() -> Self {
        Self::from_hours(DEFAULT_WINDOW_HOURS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_is_one_year() {
        assert_eq!(DuplicateWindow::default().hours(), 8760);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let window = DuplicateWindow::from_hours(24);

        let edge = Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap();
        assert!(window.contains(edge, now));
        assert!(!window.contains(edge - Duration::seconds(1), now));
    }

    #[test]
    fn zero_hours_raised_to_one() {
        assert_eq!(DuplicateWindow::from_hours(0).hours(), 1);
    }
}
