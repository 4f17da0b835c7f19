//! Scenario dates
//!
//! A date is an `i32` day count from 1900-01-01; −1 marks "never"/"unset".

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{Error, Result};

/// Day count from the zero date.
pub type Day = i32;

/// Sentinel for dates that have not happened.
pub const NEVER: Day = -1;

fn zero_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

/// Parse a configured date with a chrono format string (e.g. `%Y-%m-%d`).
pub fn parse_day(value: &str, format: &str) -> Result<Day> {
    let date = NaiveDate::parse_from_str(value.trim(), format).map_err(|_| Error::BadDate {
        value: value.to_string(),
        format: format.to_string(),
    })?;
    Ok((date - zero_date()).num_days() as Day)
}

/// Calendar year a day count falls in.
pub fn year_of(day: Day) -> i32 {
    (zero_date() + Duration::days(i64::from(day))).year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_year() {
        let day = parse_day("2005-03-01", "%Y-%m-%d").unwrap();
        assert!(day > 0);
        assert_eq!(year_of(day), 2005);
        assert_eq!(parse_day("1900-01-01", "%Y-%m-%d").unwrap(), 0);
        assert_eq!(year_of(0), 1900);
    }

    #[test]
    fn test_parse_respects_format() {
        let a = parse_day("01/03/2005", "%d/%m/%Y").unwrap();
        let b = parse_day("2005-03-01", "%Y-%m-%d").unwrap();
        assert_eq!(a, b);
        assert!(parse_day("2005-03-01", "%d/%m/%Y").is_err());
    }

    #[test]
    fn test_day_arithmetic_crosses_years() {
        let end_of_year = parse_day("2004-12-31", "%Y-%m-%d").unwrap();
        assert_eq!(year_of(end_of_year), 2004);
        assert_eq!(year_of(end_of_year + 1), 2005);
    }
}
