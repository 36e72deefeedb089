//! Parsing of human-readable publish times
//!
//! Accepted forms, tried in order:
//! - Relative durations: "2h", "30m", "1day 4h"
//! - RFC 3339: "2026-11-20T15:00:00Z"
//! - Natural language: "tomorrow 9am", "next friday 10:30"

use chrono::{DateTime, Duration, Utc};

use crate::error::{CrosscastError, Result};

/// Parse a schedule string into a future instant
///
/// # Errors
///
/// Returns `CrosscastError::InvalidInput` when the input is empty, cannot be
/// parsed, or lies in the past.
pub fn parse_schedule(input: &str) -> Result<DateTime<Utc>> {
    parse_schedule_at(input, Utc::now())
}

/// Same as [`parse_schedule`], relative to `now`
pub fn parse_schedule_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CrosscastError::InvalidInput(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    let offset = match parse_duration(input) {
        Some(duration) => Some(now.checked_add_signed(duration).ok_or_else(|| {
            CrosscastError::InvalidInput(format!("Schedule '{}' is too far in the future", input))
        })?),
        None => None,
    };

    let at = offset
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|at| at.with_timezone(&Utc))
        })
        .or_else(|| chrono_english::parse_date_string(input, now, chrono_english::Dialect::Us).ok())
        .ok_or_else(|| {
            CrosscastError::InvalidInput(format!(
                "Invalid schedule '{}'. Use a duration like \"2h\", an RFC 3339 time, or \"tomorrow 9am\"",
                input
            ))
        })?;

    if at <= now {
        return Err(CrosscastError::InvalidInput(format!(
            "Scheduled time {} is in the past",
            at.to_rfc3339()
        )));
    }

    Ok(at)
}

fn parse_duration(input: &str) -> Option<Duration> {
    let std_duration = humantime::parse_duration(input).ok()?;
    Duration::from_std(std_duration).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_duration_minutes() {
        let at = parse_schedule_at("30m", now()).unwrap();
        assert_eq!(at - now(), Duration::minutes(30));
    }

    #[test]
    fn test_parse_duration_hours_with_space() {
        let at = parse_schedule_at("  2h ", now()).unwrap();
        assert_eq!(at - now(), Duration::hours(2));
    }

    #[test]
    fn test_parse_compound_duration() {
        let at = parse_schedule_at("1day 4h", now()).unwrap();
        assert_eq!(at - now(), Duration::hours(28));
    }

    #[test]
    fn test_parse_rfc3339() {
        let at = parse_schedule_at("2026-03-11T09:30:00+02:00", now()).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 11, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_tomorrow() {
        let at = parse_schedule_at("tomorrow", now()).unwrap();
        assert!(at > now());
        assert!(at - now() <= Duration::days(2));
    }

    #[test]
    fn test_past_time_rejected() {
        let err = parse_schedule_at("2026-03-09T12:00:00Z", now()).unwrap_err();
        assert!(matches!(err, CrosscastError::InvalidInput(_)));
        assert!(err.to_string().contains("in the past"));
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(matches!(
            parse_schedule("   "),
            Err(CrosscastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_invalid_format() {
        let err = parse_schedule_at("whenever you like", now()).unwrap_err();
        assert!(err.to_string().contains("Invalid schedule"));
    }

    #[test]
    fn test_parse_out_of_range_duration() {
        let err = parse_schedule_at("300000years", now()).unwrap_err();
        assert!(matches!(err, CrosscastError::InvalidInput(_)));
        assert!(err.to_string().contains("too far in the future"));
    }

    #[test]
    fn test_parse_schedule_uses_current_time() {
        let at = parse_schedule("1h").unwrap();
        assert!(at > Utc::now());
    }
}
