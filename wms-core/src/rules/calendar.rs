//! Site calendar: "today", day and month bounds, date parsing
//!
//! Scan times are stored in UTC. Reports ask about calendar days at the
//! warehouse, so every day boundary is computed in the site time zone.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::messages;
use crate::model::ValidationError;

/// Scans younger than this show as new in history views
pub const NEW_SCAN_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy)]
pub struct SiteCalendar {
    tz: Tz,
}

impl SiteCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA zone name such as `Asia/Bangkok`.
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| ValidationError::InvalidVariant {
                field: "เขตเวลา",
                value: name.to_owned(),
            })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Calendar date at the site for an instant.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.date_of(now)
    }

    /// `[start, end)` in UTC for one site-local day.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.local_midnight(date);
        let end = date
            .succ_opt()
            .map(|next| self.local_midnight(next))
            .unwrap_or(start + Duration::days(1));
        (start, end)
    }

    /// `[start, end)` in UTC for an inclusive range of site-local days.
    pub fn range_bounds(&self, range: &DateRange) -> (DateTime<Utc>, DateTime<Utc>) {
        let (start, _) = self.day_bounds(range.start);
        let (_, end) = self.day_bounds(range.end);
        (start, end)
    }

    /// `[start, end)` in UTC for one site-local month.
    pub fn month_bounds(
        &self,
        year: i32,
        month: u32,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let first = month_start(year, month)?;
        let next = if month == 12 {
            month_start(year + 1, 1)?
        } else {
            month_start(year, month + 1)?
        };
        Ok((self.local_midnight(first), self.local_midnight(next)))
    }

    /// Format an instant as site-local `YYYY-MM-DD HH:MM:SS`.
    pub fn format_local(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(chrono::NaiveTime::MIN);
        // A DST jump can skip midnight; the day then starts at the first
        // local minute after the gap.
        (0..=MAX_GAP_MINUTES)
            .find_map(|m| {
                self.tz
                    .from_local_datetime(&(naive + Duration::minutes(m)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

/// Longest DST gap searched when local midnight does not exist
const MAX_GAP_MINUTES: i64 = 24 * 60;

impl Default for SiteCalendar {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Bangkok)
    }
}

fn month_start(year: i32, month: u32) -> Result<NaiveDate, ValidationError> {
    if !(1900..=2101).contains(&year) || !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "ปี/เดือน",
            value: format!("{}-{:02}", year, month),
        });
    }
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| ValidationError::OutOfRange {
        field: "ปี/เดือน",
        value: format!("{}-{:02}", year, month),
    })
}

/// Check a report year/month pair: year 1900..=2100, month 1..=12.
pub fn validate_year_month(year: i32, month: u32) -> Result<(), ValidationError> {
    if (1900..=2100).contains(&year) && (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: "ปี/เดือน",
            value: format!("{}-{:02}", year, month),
        })
    }
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty { field: "วันที่" });
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: "วันที่",
        reason: messages::INVALID_DATE_FORMAT,
    })
}

/// Inclusive range of calendar days, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "ช่วงวันที่",
                reason: messages::DATE_RANGE_INVALID,
            });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Freshness label shown next to each history row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    New,
    Normal,
}

impl ScanStatus {
    pub fn of(scanned_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now.signed_duration_since(scanned_at) <= Duration::minutes(NEW_SCAN_MINUTES) {
            Self::New
        } else {
            Self::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => messages::STATUS_NEW,
            Self::Normal => messages::STATUS_NORMAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bangkok_day_starts_at_17_utc() {
        let cal = SiteCalendar::default();
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = cal.day_bounds(day);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 14, 17, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 15, 17, 0, 0).unwrap());
    }

    #[test]
    fn skipped_midnight_starts_day_after_gap() {
        // Santiago springs forward at 00:00 local on 2024-09-08
        let cal = SiteCalendar::new(chrono_tz::America::Santiago);
        let day = NaiveDate::from_ymd_opt(2024, 9, 8).unwrap();
        let (start, _) = cal.day_bounds(day);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());
        assert_eq!(cal.date_of(start), day);

        let (_, prev_end) = cal.day_bounds(day.pred_opt().unwrap());
        assert_eq!(prev_end, start);
        assert_eq!(
            cal.date_of(prev_end - Duration::seconds(1)),
            NaiveDate::from_ymd_opt(2024, 9, 7).unwrap()
        );
    }

    #[test]
    fn today_uses_site_zone() {
        let cal = SiteCalendar::default();
        // 18:30 UTC is already the next morning in Bangkok
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 18, 30, 0).unwrap();
        assert_eq!(cal.today(now), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let cal = SiteCalendar::from_name("UTC").unwrap();
        let (start, end) = cal.month_bounds(2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_bad_month() {
        assert!(validate_year_month(2024, 13).is_err());
        assert!(validate_year_month(1899, 1).is_err());
        assert!(validate_year_month(2100, 12).is_ok());
    }

    #[test]
    fn unknown_zone_rejected() {
        assert!(SiteCalendar::from_name("Mars/Olympus").is_err());
    }

    #[test]
    fn parse_date_format() {
        assert_eq!(
            parse_date(" 2024-02-29 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        let err = parse_date("29/02/2024").unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
        assert!(matches!(parse_date("").unwrap_err(), ValidationError::Empty { .. }));
    }

    #[test]
    fn range_must_be_ordered() {
        assert!(DateRange::parse("2024-01-02", "2024-01-01").is_err());
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(range.days(), 31);
    }

    #[test]
    fn status_new_within_five_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(ScanStatus::of(now - Duration::minutes(4), now), ScanStatus::New);
        assert_eq!(ScanStatus::of(now - Duration::minutes(6), now), ScanStatus::Normal);
        assert_eq!(ScanStatus::Normal.label(), "ปกติ");
    }
}
