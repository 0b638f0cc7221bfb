//! Millisecond-epoch helpers shared by the ledger, reports and CLI

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::{PaperbotError, Result};

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Current time as a millisecond epoch timestamp.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a millisecond timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_ms(timestamp_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("<invalid timestamp {}>", timestamp_ms),
    }
}

/// Parse a user-supplied time argument: either a raw millisecond epoch or
/// `YYYY-MM-DD HH:MM:SS` (interpreted as UTC).
pub fn parse_time_arg(input: &str) -> Result<i64> {
    let trimmed = input.trim();

    if let Ok(ms) = trimmed.parse::<i64>() {
        return Ok(ms);
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc().timestamp_millis())
        .map_err(|_| {
            PaperbotError::Validation(format!(
                "invalid time '{}': expected milliseconds or YYYY-MM-DD HH:MM:SS",
                input
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_millis() {
        assert_eq!(parse_time_arg("1700000000000").unwrap(), 1_700_000_000_000);
    }

    #[test]
    fn test_parse_datetime_round_trips() {
        let ms = parse_time_arg("2024-01-15 08:30:00").unwrap();
        assert_eq!(format_ms(ms), "2024-01-15 08:30:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_time_arg("yesterday").is_err());
    }
}
