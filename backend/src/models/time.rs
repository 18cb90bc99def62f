//! Calendar dates and time-of-day ranges.
//!
//! Dates travel as `YYYY-MM-DD` and times of day as `HH:MM`. A slot's time
//! range always lies within a single calendar day.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ScheduleError, ScheduleResult};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format for times of day.
pub const TIME_FORMAT: &str = "%H:%M";

/// Weekdays in the order templates are listed.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Weekday names in the order templates are listed.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Parse a `YYYY-MM-DD` date; `field` names the input in the error message.
pub fn parse_date(raw: &str, field: &str) -> ScheduleResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ScheduleError::validation(format!("{} is required", field)));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        ScheduleError::validation(format!("invalid {} '{}' (use YYYY-MM-DD): {}", field, raw, e))
    })
}

/// Parse an `HH:MM` time of day; `field` names the input in the error message.
pub fn parse_time_of_day(raw: &str, field: &str) -> ScheduleResult<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ScheduleError::validation(format!("{} is required", field)));
    }
    NaiveTime::parse_from_str(raw, TIME_FORMAT).map_err(|e| {
        ScheduleError::validation(format!("invalid {} '{}' (use HH:MM): {}", field, raw, e))
    })
}

/// Parse an inclusive `[start, end]` date range.
pub fn parse_date_range(start: &str, end: &str) -> ScheduleResult<(NaiveDate, NaiveDate)> {
    let start = parse_date(start, "start date")?;
    let end = parse_date(end, "end date")?;
    if end < start {
        return Err(ScheduleError::validation(format!(
            "end date {} is before start date {}",
            end, start
        )));
    }
    Ok((start, end))
}

/// Every date in `[start, end]`, in order.
pub fn dates_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Lowercase weekday name (`monday` … `sunday`).
pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}

/// Parse a lowercase (or mixed-case) weekday name.
pub fn parse_weekday_name(raw: &str) -> Option<Weekday> {
    let lowered = raw.trim().to_lowercase();
    WEEKDAY_NAMES
        .iter()
        .position(|name| *name == lowered)
        .map(|idx| WEEKDAYS[idx])
}

/// Half-open time-of-day interval `[start, end)` within one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Create a range; `end` must be strictly after `start`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> ScheduleResult<Self> {
        if end <= start {
            return Err(ScheduleError::validation(format!(
                "end time {} must be after start time {}",
                end.format(TIME_FORMAT),
                start.format(TIME_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Create a range from a start time and a duration in minutes.
    ///
    /// The range may not cross midnight.
    pub fn from_start(start: NaiveTime, duration_minutes: u32) -> ScheduleResult<Self> {
        if duration_minutes == 0 {
            return Err(ScheduleError::validation(
                "duration must be greater than 0",
            ));
        }
        let (end, wrapped_secs) =
            start.overflowing_add_signed(Duration::minutes(i64::from(duration_minutes)));
        if wrapped_secs != 0 {
            return Err(ScheduleError::validation(format!(
                "slot starting at {} with duration {} min crosses midnight",
                start.format(TIME_FORMAT),
                duration_minutes
            )));
        }
        Self::new(start, end)
    }

    /// Length of the range in whole minutes.
    pub fn duration_minutes(&self) -> u32 {
        let secs = self.end.num_seconds_from_midnight() - self.start.num_seconds_from_midnight();
        secs / 60
    }

    /// Standard half-open overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Whether any endpoint of `self` equals any endpoint of `other`.
    pub fn shares_endpoint(&self, other: &TimeRange) -> bool {
        self.start == other.start
            || self.start == other.end
            || self.end == other.start
            || self.end == other.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_date_valid() {
        let d = parse_date("2025-03-10", "date").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn test_parse_date_invalid_and_empty() {
        assert!(matches!(
            parse_date("10/03/2025", "date"),
            Err(ScheduleError::Validation(_))
        ));
        let err = parse_date("  ", "start date").unwrap_err();
        assert!(err.to_string().contains("start date is required"));
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("09:30", "start_time").unwrap(), hm(9, 30));
        assert!(parse_time_of_day("9h30", "start_time").is_err());
    }

    #[test]
    fn test_parse_date_range_rejects_inverted() {
        assert!(parse_date_range("2025-03-10", "2025-03-16").is_ok());
        assert!(parse_date_range("2025-03-16", "2025-03-10").is_err());
    }

    #[test]
    fn test_dates_inclusive_counts_both_ends() {
        let start = NaiveDate::from_ymd_opt(2025, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let dates: Vec<_> = dates_inclusive(start, end).collect();
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[0], start);
        assert_eq!(dates[3], end);
    }

    #[test]
    fn test_weekday_names_round_trip() {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(weekday_name(monday.weekday()), "monday");
        assert_eq!(parse_weekday_name("Sunday"), Some(Weekday::Sun));
        assert_eq!(parse_weekday_name("funday"), None);
    }

    #[test]
    fn test_range_from_start() {
        let range = TimeRange::from_start(hm(9, 0), 30).unwrap();
        assert_eq!(range.end, hm(9, 30));
        assert_eq!(range.duration_minutes(), 30);
        assert_eq!(range.to_string(), "09:00-09:30");
    }

    #[test]
    fn test_range_rejects_zero_duration_and_midnight_wrap() {
        assert!(TimeRange::from_start(hm(9, 0), 0).is_err());
        assert!(TimeRange::from_start(hm(23, 30), 45).is_err());
        assert!(TimeRange::from_start(hm(23, 30), 29).is_ok());
    }

    #[test]
    fn test_overlap_and_endpoints() {
        let a = TimeRange::new(hm(9, 0), hm(9, 30)).unwrap();
        let b = TimeRange::new(hm(9, 30), hm(10, 0)).unwrap();
        let c = TimeRange::new(hm(9, 15), hm(9, 45)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.shares_endpoint(&b));
        assert!(a.overlaps(&c));
        assert!(!a.shares_endpoint(&c));
    }
}
