//! Calendar and timezone helpers
//!
//! Day-boundary arithmetic for the wallet: daily transfer caps reset when
//! the calendar date changes in the wallet's business timezone, and
//! recurring payments advance by whole calendar units rather than fixed
//! durations.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Business timezone for calendar-day semantics
///
/// Wraps chrono_tz::Tz with custom serialization support. All "same day"
/// decisions (daily limit resets, statement day boundaries) are made in
/// this timezone, not in UTC and not in elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessTimezone(pub Tz);

impl Serialize for BusinessTimezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for BusinessTimezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s)
            .map(BusinessTimezone)
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl BusinessTimezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Returns the calendar date of the given instant in this timezone
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.0).date_naive()
    }

    /// Returns true if both instants fall on the same calendar date
    pub fn same_local_date(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.local_date(a) == self.local_date(b)
    }

    /// Gets the start of day (00:00:00) in this timezone as UTC
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        date.and_hms_opt(0, 0, 0)
            .unwrap()
            .and_local_timezone(self.0)
            .single()
            .expect("Invalid timezone conversion")
            .with_timezone(&Utc)
    }
}

impl Default for BusinessTimezone {
    fn default() -> Self {
        Self(chrono_tz::Asia::Kolkata)
    }
}

/// Adds whole calendar months, clamping the day-of-month to the target
/// month's length (Jan 31 + 1 month = Feb 28/29).
pub fn add_months_clamped(at: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let total = at.month0() + months;
    let year = at.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    let day = at.day().min(days_in_month(year, month));

    at.with_day(1)
        .and_then(|d| d.with_year(year))
        .and_then(|d| d.with_month(month))
        .and_then(|d| d.with_day(day))
        .expect("Clamped date is always valid")
}

/// Adds whole calendar days
pub fn add_days(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    at + Duration::days(days)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .expect("Month bounds are valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_same_local_date_across_utc_midnight() {
        // 20:00 and 22:00 UTC are both the following day in Kolkata (UTC+5:30)
        let tz = BusinessTimezone::default();
        let a = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 3, 10, 22, 0, 0).unwrap();
        assert!(tz.same_local_date(a, b));
        assert_eq!(tz.local_date(a), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn test_local_date_rollover() {
        let tz = BusinessTimezone::default();
        let before = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 10, 19, 0, 0).unwrap();
        // Kolkata midnight is 18:30 UTC
        assert!(!tz.same_local_date(before, after));
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        let jan31 = Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap();
        let next = add_months_clamped(jan31, 1);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn test_add_months_leap_year() {
        let jan31 = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        let next = add_months_clamped(jan31, 1);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_add_months_crosses_year() {
        let nov30 = Utc.with_ymd_and_hms(2024, 11, 30, 9, 0, 0).unwrap();
        let next = add_months_clamped(nov30, 2);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 30).unwrap());
    }

    #[test]
    fn test_add_months_preserves_time_of_day() {
        let at = Utc.with_ymd_and_hms(2024, 5, 15, 7, 45, 0).unwrap();
        let next = add_months_clamped(at, 1);
        assert_eq!(next.time(), at.time());
    }
}
