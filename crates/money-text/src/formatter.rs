//! Currency and number formatting

use crate::{MoneyTextError, Result};

/// Pattern used for currency amounts
const CURRENCY_PATTERN: &str = "#,###.##";

/// Currency symbol prefixed to formatted amounts
const CURRENCY_SYMBOL: &str = "$";

/// Money formatting utilities
pub struct MoneyFormatter;

impl MoneyFormatter {
    /// Format an amount as US currency
    pub fn currency(amount: f64) -> String {
        format_currency(amount)
    }

    /// Format free text as currency, passing unparsable text through
    pub fn currency_text(text: &str) -> String {
        format_currency_text(text)
    }

    /// Format free text as a thousands-separated number
    pub fn number_text(text: &str) -> String {
        format_number_text(text)
    }
}

/// Parse an amount leniently
///
/// Every character other than ASCII digits, `.` and `-` is stripped before
/// parsing, so `"$1,234.50"` and `"USD 1234.5"` both parse.
///
/// # Examples
/// ```
/// use money_text::parse_amount;
/// assert_eq!(parse_amount("$1,234.50"), Ok(1234.5));
/// assert!(parse_amount("abc").is_err());
/// ```
pub fn parse_amount(text: &str) -> Result<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(MoneyTextError::InvalidNumber(text.to_string()));
    }

    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(MoneyTextError::InvalidNumber(text.to_string())),
    }
}

/// Format an amount as US currency (e.g., "$1,234.50")
///
/// # Examples
/// ```
/// use money_text::format_currency;
/// assert_eq!(format_currency(1234.5), "$1,234.50");
/// assert_eq!(format_currency(-5.0), "-$5.00");
/// ```
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return render_float(CURRENCY_PATTERN, amount);
    }

    let body = render_float(CURRENCY_PATTERN, amount.abs());
    // Amounts that round to zero cents never carry a sign
    let negative = amount < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0');

    if negative {
        format!("-{CURRENCY_SYMBOL}{body}")
    } else {
        format!("{CURRENCY_SYMBOL}{body}")
    }
}

/// Format text as currency, returning the input unchanged when it does not
/// parse as an amount
pub fn format_currency_text(text: &str) -> String {
    match parse_amount(text) {
        Ok(n) => format_currency(n),
        Err(_) => text.to_string(),
    }
}

/// Format text as a `#,###.##` number, returning the input unchanged when it
/// does not parse as an amount
pub fn format_number_text(text: &str) -> String {
    match parse_amount(text) {
        Ok(n) => render_float(CURRENCY_PATTERN, n),
        Err(_) => text.to_string(),
    }
}

/// Render a float with a `#,###.##`-style pattern
///
/// The number of `#`/`0` characters after the last `.` sets the decimal
/// places; a `,` anywhere turns on thousands grouping. An empty pattern means
/// `#,###.##`.
pub fn render_float(format: &str, n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        return format!("{sign}Infinity");
    }

    NumberPattern::parse(format).render(n)
}

/// Most decimal places a pattern may ask for
const MAX_DECIMALS: u32 = 10;

/// Decimal places and grouping parsed from a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumberPattern {
    decimals: u32,
    grouped: bool,
}

impl NumberPattern {
    fn parse(format: &str) -> Self {
        if format.is_empty() {
            return Self {
                decimals: 2,
                grouped: true,
            };
        }

        let decimals = format.rfind('.').map_or(0, |pos| {
            format[pos + 1..]
                .chars()
                .filter(|c| matches!(c, '#' | '0'))
                .count()
        });

        Self {
            decimals: u32::try_from(decimals).unwrap_or(u32::MAX).min(MAX_DECIMALS),
            grouped: format.contains(','),
        }
    }

    fn render(self, n: f64) -> String {
        let digits = self.fixed_digits(n.abs());
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

        let mut text = String::new();
        if n < 0.0 && digits.bytes().any(|b| matches!(b, b'1'..=b'9')) {
            text.push('-');
        }
        if self.grouped {
            text.push_str(&group_thousands(whole));
        } else {
            text.push_str(whole);
        }
        if !fraction.is_empty() {
            text.push('.');
            text.push_str(fraction);
        }

        text
    }

    /// Plain digits of a non-negative value rounded half away from zero
    ///
    /// Values too large for scaled integer rounding fall back to the float's
    /// exact decimal expansion.
    fn fixed_digits(self, n: f64) -> String {
        let width = self.decimals as usize;
        let Some(scale) = 10_u64.checked_pow(self.decimals) else {
            return format!("{n:.width$}");
        };

        let scaled = (n * scale as f64).round();
        if scaled >= u64::MAX as f64 {
            return format!("{n:.width$}");
        }

        let scaled = scaled as u64;
        if width == 0 {
            scaled.to_string()
        } else {
            format!("{}.{:0>width$}", scaled / scale, scaled % scale)
        }
    }
}

/// Insert `,` between every group of three digits
fn group_thousands(digits: &str) -> String {
    let len = digits.len();

    digits
        .chars()
        .enumerate()
        .fold(String::with_capacity(len + len / 3), |mut out, (i, c)| {
            if i > 0 && (len - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
            out
        })
}
