//! Time utilities for geoattend
//!
//! All attendance decisions are made against local wall-clock time in a
//! single timezone. Policy boundaries are times of day (`NaiveTime`) and
//! records are keyed by calendar day (`NaiveDate`).
//!
//! # Mock Time for Development
//!
//! In debug builds, the `GEOATTEND_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is
//! useful for exercising check-in deadlines and the absence sweep without
//! waiting for the real clock.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 09:30:00`)
//!
//! Example:
//! ```bash
//! GEOATTEND_MOCK_TIME="2025-12-25 10:05:00" geoattendd
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "GEOATTEND_MOCK_TIME";

/// Format used for mock time and full timestamps
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // Wraps Local::now() for the offset computation
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, DATETIME_FORMAT) {
                    Ok(naive_dt) => {
                        if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                            let offset = mock_dt.signed_duration_since(chrono::Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = DATETIME_FORMAT,
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)]
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Parse an `HH:MM` time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    let (hour, minute) = s
        .split_once(':')
        .ok_or_else(|| "Expected HH:MM format".to_string())?;

    let hour: u32 = hour.trim().parse().map_err(|_| "Invalid hour".to_string())?;
    let minute: u32 = minute
        .trim()
        .parse()
        .map_err(|_| "Invalid minute".to_string())?;

    if hour >= 24 {
        return Err("Hour must be 0-23".into());
    }
    if minute >= 60 {
        return Err("Minute must be 0-59".into());
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| "Invalid time".to_string())
}

/// Format a time of day as `HH:MM`, the form used in caller-facing messages.
pub fn format_time_of_day(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Format a DateTime with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Subtract minutes from a time of day without wrapping past midnight.
///
/// `00:10 - 15m` yields `00:00`, not `23:55`: policy windows never span days.
pub fn minus_minutes_clamped(t: NaiveTime, minutes: u32) -> NaiveTime {
    let (shifted, wrapped) = t.overflowing_sub_signed(TimeDelta::minutes(i64::from(minutes)));
    if wrapped != 0 { NaiveTime::MIN } else { shifted }
}

/// Add minutes to a time of day without wrapping past midnight.
pub fn plus_minutes_clamped(t: NaiveTime, minutes: u32) -> NaiveTime {
    let (shifted, wrapped) = t.overflowing_add_signed(TimeDelta::minutes(i64::from(minutes)));
    if wrapped != 0 { last_instant_of_day() } else { shifted }
}

fn last_instant_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Resolve a calendar day and time of day to a local timestamp.
///
/// Returns the earlier instant when the local time is ambiguous and `None`
/// when it does not exist (inside a DST gap).
pub fn local_datetime(day: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&day.and_time(time)).earliest()
}

/// Number of calendar days in the inclusive range `[start, end]`.
///
/// Returns 0 when `end` is before `start`.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> i64 {
    let days = (end - start).num_days() + 1;
    days.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("14:30").unwrap(), t(14, 30));
        assert_eq!(parse_time_of_day("00:00").unwrap(), t(0, 0));
        assert_eq!(parse_time_of_day("23:59").unwrap(), t(23, 59));
        assert_eq!(parse_time_of_day("9:05").unwrap(), t(9, 5));

        assert!(parse_time_of_day("24:00").is_err());
        assert!(parse_time_of_day("12:60").is_err());
        assert!(parse_time_of_day("invalid").is_err());
        assert!(parse_time_of_day("").is_err());
    }

    #[test]
    fn test_format_time_of_day() {
        assert_eq!(format_time_of_day(t(8, 45)), "08:45");
        assert_eq!(format_time_of_day(t(18, 0)), "18:00");
    }

    #[test]
    fn test_minus_minutes() {
        assert_eq!(minus_minutes_clamped(t(9, 0), 15), t(8, 45));
        assert_eq!(minus_minutes_clamped(t(9, 0), 0), t(9, 0));
        // Never wraps to the previous evening
        assert_eq!(minus_minutes_clamped(t(0, 10), 15), NaiveTime::MIN);
    }

    #[test]
    fn test_plus_minutes() {
        assert_eq!(plus_minutes_clamped(t(9, 0), 120), t(11, 0));
        let clamped = plus_minutes_clamped(t(23, 0), 120);
        assert_eq!(clamped.hour(), 23);
        assert_eq!(clamped.minute(), 59);
    }

    #[test]
    fn test_days_in_range() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(days_in_range(start, end), 31);
        assert_eq!(days_in_range(start, start), 1);
        assert_eq!(days_in_range(end, start), 0);
    }

    #[test]
    fn test_local_datetime_keeps_wall_clock() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let dt = local_datetime(day, t(18, 0)).unwrap();
        assert_eq!(dt.date_naive(), day);
        assert_eq!(dt.time(), t(18, 0));
    }

    #[test]
    fn test_format_datetime_full() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        assert_eq!(format_datetime_full(&dt), "2025-12-25 14:30:45");
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_parse_mock_time_format() {
        for s in ["2025-12-25 14:30:00", "2025-01-01 00:00:00", "2025-12-31 23:59:59"] {
            assert!(NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).is_ok(), "{s}");
        }
        for s in ["2025-12-25", "14:30:00", "2025-12-25T14:30:00", ""] {
            assert!(NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).is_err(), "{s}");
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    fn test_is_mock_time_active_in_debug() {
        // OnceLock makes the env var fixed per process; only check it doesn't panic
        let _ = is_mock_time_active();
    }
}
