//! # Temporal Types
//!
//! UTC timestamps for batch bookkeeping, plus the calendar arithmetic of a
//! reporting year: the selection window, the nominal year end, and the
//! regulator's reference periods used to apportion study load.
//!
//! ## Window Bounds
//!
//! A module belongs to academic year `y` when its start date falls in
//! `[1 Aug y, 1 Aug y+1)`. Consecutive windows tile the calendar, so
//! every dated module lands in exactly one return. The *year end* used
//! for engagement and session end dates is 31 July.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::AcademicYear;

/// A UTC timestamp truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp {
                input: s.to_string(),
                reason: "timestamp must use Z suffix".to_string(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| CoreError::InvalidTimestamp {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

// ─── Date Spans ──────────────────────────────────────────────────────

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    /// First day.
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
}

impl DateSpan {
    /// Build a span. An `end` before `start` yields a zero-length span.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days covered, counting both ends. Zero if inverted.
    pub fn days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    /// Days shared with `other`. Never negative.
    pub fn overlap_days(&self, other: &DateSpan) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        DateSpan::new(start, end).days()
    }
}

// ─── Reporting Window ────────────────────────────────────────────────

/// Calendar boundaries of one academic year's return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    /// The academic year.
    pub year: AcademicYear,
    /// First admissible module start date (1 Aug).
    pub start: NaiveDate,
    /// Exclusive upper bound on module start date (1 Aug following).
    pub end_exclusive: NaiveDate,
    /// Nominal end of the year (31 Jul following).
    pub year_end: NaiveDate,
}

impl ReportingWindow {
    /// The window for `year`.
    pub fn for_year(year: AcademicYear) -> Self {
        let y = year.value();
        Self {
            year,
            start: calendar_date(y, 8, 1),
            end_exclusive: calendar_date(y + 1, 8, 1),
            year_end: calendar_date(y + 1, 7, 31),
        }
    }

    /// Whether a module starting on `date` belongs to this return.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end_exclusive
    }

    /// The three regulator reference periods, in code order.
    pub fn reference_periods(&self) -> [ReferencePeriod; 3] {
        let y = self.year.value();
        [
            ReferencePeriod {
                code: "01",
                span: DateSpan::new(calendar_date(y, 8, 1), calendar_date(y, 11, 15)),
            },
            ReferencePeriod {
                code: "02",
                span: DateSpan::new(calendar_date(y, 11, 16), calendar_date(y + 1, 3, 15)),
            },
            ReferencePeriod {
                code: "03",
                span: DateSpan::new(calendar_date(y + 1, 3, 16), calendar_date(y + 1, 7, 31)),
            },
        ]
    }
}

/// A regulator-defined sub-window of the reporting year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferencePeriod {
    /// Two-digit REFPERIOD code.
    pub code: &'static str,
    /// Inclusive dates.
    pub span: DateSpan,
}

// Fixed month/day pairs in a validated year are always representable.
fn calendar_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // ── Timestamp ────────────────────────────────────────────────────

    #[test]
    fn test_timestamp_truncates_and_formats() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(5).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:30:45Z");
        assert_eq!(Timestamp::parse(&ts.to_iso8601()).unwrap(), ts);
    }

    #[test]
    fn test_timestamp_rejects_offsets() {
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("yesterday").is_err());
    }

    // ── Window ───────────────────────────────────────────────────────

    #[test]
    fn test_window_bounds() {
        let w = ReportingWindow::for_year(AcademicYear::new(2022).unwrap());
        assert!(!w.contains(d(2022, 7, 31)));
        assert!(w.contains(d(2022, 8, 1)));
        assert!(w.contains(d(2023, 7, 31)));
        assert!(!w.contains(d(2023, 8, 1)));
        assert_eq!(w.year_end, d(2023, 7, 31));
    }

    #[test]
    fn test_consecutive_windows_do_not_overlap_or_gap() {
        let a = ReportingWindow::for_year(AcademicYear::new(2022).unwrap());
        let b = ReportingWindow::for_year(AcademicYear::new(2023).unwrap());
        assert_eq!(a.end_exclusive, b.start);
    }

    #[test]
    fn test_reference_periods_tile_the_year() {
        let w = ReportingWindow::for_year(AcademicYear::new(2022).unwrap());
        let periods = w.reference_periods();
        assert_eq!(periods[0].span.start, w.start);
        assert_eq!(periods[2].span.end, w.year_end);
        let total: i64 = periods.iter().map(|p| p.span.days()).sum();
        assert_eq!(total, 365);
    }

    // ── Spans ────────────────────────────────────────────────────────

    #[test]
    fn test_overlap_clamped_to_zero() {
        let a = DateSpan::new(d(2022, 8, 1), d(2022, 8, 10));
        let b = DateSpan::new(d(2022, 9, 1), d(2022, 9, 10));
        assert_eq!(a.overlap_days(&b), 0);
        assert_eq!(b.overlap_days(&a), 0);
    }

    #[test]
    fn test_overlap_partial_and_inverted() {
        let a = DateSpan::new(d(2022, 11, 10), d(2022, 11, 20));
        let b = DateSpan::new(d(2022, 8, 1), d(2022, 11, 15));
        assert_eq!(a.overlap_days(&b), 6);
        assert_eq!(DateSpan::new(d(2022, 1, 2), d(2022, 1, 1)).days(), 0);
    }
}
