//! Money Text - currency, number and date formatting
//!
//! This crate provides:
//! - Lenient amount parsing (`"$1,234.5"` -> `1234.5`)
//! - US currency formatting (`$1,234.50`)
//! - Pattern-based number formatting (`#,###.##`)
//! - Fixed `MM/DD/YYYY` date formatting from ISO-like input
//!
//! The `format_*_text` functions are total: input that cannot be parsed is
//! returned unchanged, which is what template helpers want.
//!
//! # Example
//!
//! ```
//! use money_text::{format_currency, format_currency_text, format_date_text};
//!
//! assert_eq!(format_currency(1234.5), "$1,234.50");
//! assert_eq!(format_currency_text("10000"), "$10,000.00");
//! assert_eq!(format_currency_text("abc"), "abc");
//! assert_eq!(format_date_text("2024-03-05"), "03/05/2024");
//! ```

mod dates;
mod formatter;

pub use dates::{format_date_text, format_us_date, parse_date};
pub use formatter::MoneyFormatter;

// Re-export commonly used formatting functions
pub use formatter::{
    format_currency, format_currency_text, format_number_text, parse_amount, render_float,
};

use thiserror::Error;

/// Errors that can occur while parsing amounts and dates
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyTextError {
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for money text operations
pub type Result<T> = std::result::Result<T, MoneyTextError>;
