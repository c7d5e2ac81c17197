//! Date parsing and `MM/DD/YYYY` formatting

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{MoneyTextError, Result};

/// Accepted date-time layouts (besides RFC 3339)
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-like date
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, RFC 3339 timestamps and naive
/// `YYYY-MM-DDTHH:MM:SS` timestamps. The calendar date is taken as written;
/// no timezone conversion is applied.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y/%m/%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.date());
        }
    }

    Err(MoneyTextError::InvalidDate(text.to_string()))
}

/// Format a date as `MM/DD/YYYY`
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use money_text::format_us_date;
/// let date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
/// assert_eq!(format_us_date(date), "01/07/2025");
/// ```
pub fn format_us_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Format text as `MM/DD/YYYY`, returning the input unchanged when it is not
/// a recognizable date
pub fn format_date_text(text: &str) -> String {
    match parse_date(text) {
        Ok(date) => format_us_date(date),
        Err(_) => text.to_string(),
    }
}
