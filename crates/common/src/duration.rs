//! Minute arithmetic over contest timestamps

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Timestamp format used throughout contest documents (`yyyy-MM-dd HH:mm`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parse a contest timestamp
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|_| {
        Error::InvalidTimestamp {
            value: value.to_string(),
        }
    })
}

/// Whole minutes from `start` to `end`.
///
/// The result is negative when `end` precedes `start`; ordering is checked by
/// the validator, not here.
pub fn minutes(start: &str, end: &str) -> Result<i64> {
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    Ok((end - start).num_minutes())
}

/// Calendar fields of a timestamp, as the contest and site forms take them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFields {
    pub hour: u32,
    pub minute: u32,
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

pub fn date_fields(value: &str) -> Result<DateFields> {
    let at = parse_timestamp(value)?;
    Ok(DateFields {
        hour: at.hour(),
        minute: at.minute(),
        day: at.day(),
        month: at.month(),
        year: at.year(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2024-03-01 10:00", "2024-03-01 10:00", 0 ; "same instant")]
    #[test_case("2024-03-01 10:00", "2024-03-01 15:00", 300 ; "five hours")]
    #[test_case("2024-02-28 23:30", "2024-03-01 00:15", 1485 ; "across leap day")]
    #[test_case("2024-03-01 15:00", "2024-03-01 10:00", -300 ; "reversed is negative")]
    fn test_minutes(start: &str, end: &str, expected: i64) {
        assert_eq!(minutes(start, end).unwrap(), expected);
    }

    #[test]
    fn test_date_fields() {
        assert_eq!(
            date_fields("2024-03-01 09:05").unwrap(),
            DateFields {
                hour: 9,
                minute: 5,
                day: 1,
                month: 3,
                year: 2024,
            }
        );
    }

    #[test]
    fn test_rejects_other_formats() {
        let err = minutes("01/03/2024 10:00", "2024-03-01 11:00").unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { value } if value == "01/03/2024 10:00"));
        assert!(parse_timestamp("2024-03-01").is_err());
    }
}
