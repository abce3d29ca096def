//! Typed coercion of sanitized cell text.
//!
//! The [`MISSING`] sentinel is the only token accepted as "no value" by every
//! coercion path. Anything else that does not parse is a hard
//! [`ExtractError::Format`], never a silent default.

use crate::error::{ExtractError, Result};
use crate::sanitize::{MISSING, is_missing};
use chrono::NaiveDate;
use derive_more::Display;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractional digits kept for money and ratio values.
pub const DECIMAL_SCALE: u32 = 2;

/// Upper bound on significant digits of a coerced decimal.
pub const DECIMAL_MAX_DIGITS: usize = 22;

/// Declared type of a configured field or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ValueType {
    /// Free text, passed through after sanitization
    #[display("text")]
    Text,
    /// Fixed-precision decimal
    #[display("decimal")]
    Decimal,
    /// Decimal with an optional trailing `%`, kept in percent units
    #[display("percent")]
    Percent,
    /// Calendar date in `YYYYMMDD` or `YYYY-MM-DD` form
    #[display("date")]
    Date,
}

/// A coerced cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// The source cell carried the missing-value sentinel
    Missing,
    /// Text value
    Text(String),
    /// Decimal value at [`DECIMAL_SCALE`]
    Decimal(Decimal),
    /// Calendar date
    Date(NaiveDate),
}

impl Value {
    /// Returns true for [`Value::Missing`].
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// The decimal payload, if any.
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// The date payload, if any.
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// The text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str(MISSING),
            Self::Text(s) => f.write_str(s),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Coerce sanitized text into a value of the declared type.
pub fn coerce(ty: ValueType, text: &str) -> Result<Value> {
    if is_missing(text) {
        return Ok(Value::Missing);
    }

    match ty {
        ValueType::Text => Ok(Value::Text(text.to_string())),
        ValueType::Decimal => parse_decimal(text).map(Value::Decimal),
        ValueType::Percent => {
            let number = text.strip_suffix('%').unwrap_or(text);
            parse_decimal(number)
                .map(Value::Decimal)
                .map_err(|_| ExtractError::format(text, "percent"))
        }
        ValueType::Date => parse_date(text).map(Value::Date),
    }
}

/// Parse a decimal, rounding half away from zero to [`DECIMAL_SCALE`].
///
/// Thousands separators are accepted in the integer part when every group
/// after the first holds exactly three digits. The result always carries
/// exactly [`DECIMAL_SCALE`] fractional digits, so `"100"` renders as `"100.00"`.
pub fn parse_decimal(text: &str) -> Result<Decimal> {
    let plain = ungroup(text).ok_or_else(|| ExtractError::format(text, "decimal"))?;
    let parsed =
        Decimal::from_str(&plain).map_err(|_| ExtractError::format(text, "decimal"))?;

    let mut value =
        parsed.round_dp_with_strategy(DECIMAL_SCALE, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(DECIMAL_SCALE);

    if significant_digits(&value) > DECIMAL_MAX_DIGITS {
        return Err(ExtractError::format(text, "decimal"));
    }

    Ok(value)
}

/// Parse a date in exactly `YYYYMMDD` or `YYYY-MM-DD` form.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let bytes = text.as_bytes();
    let format = if bytes.len() == 8 && bytes.iter().all(u8::is_ascii_digit) {
        "%Y%m%d"
    } else if bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
    {
        "%Y-%m-%d"
    } else {
        return Err(ExtractError::format(text, "date"));
    };

    NaiveDate::parse_from_str(text, format).map_err(|_| ExtractError::format(text, "date"))
}

/// Drop well-formed thousands separators, `None` for any other grouping.
fn ungroup(text: &str) -> Option<String> {
    if text.contains('_') {
        return None;
    }
    if !text.contains(',') {
        return Some(text.to_string());
    }

    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if fraction.contains(',') {
        return None;
    }

    let is_digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    let mut groups = integer.split(',');
    let lead = groups.next()?;
    if lead.is_empty() || lead.len() > 3 || !is_digits(lead) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && is_digits(g)) {
        return None;
    }
    Some(text.replace(',', ""))
}

fn significant_digits(value: &Decimal) -> usize {
    let mantissa = value.mantissa().unsigned_abs();
    if mantissa == 0 {
        1
    } else {
        mantissa.to_string().len()
    }
}
