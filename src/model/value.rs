//! Scalar cell values as read from a workbook sheet.
//!
//! A `Value` is what a single spreadsheet cell holds after ingestion. The reconciliation core
//! never fails on a strange cell: arithmetic goes through [`Value::numeric_or_zero`] or
//! [`Value::as_f64`], and anything that is not a number counts as zero.

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The contents of a single cell.
///
/// Equality of numbers is by value and not by scale, so `10` equals `10.0`.
///
/// # Examples
///
/// ```
/// # use mis_checker::model::Value;
/// let v = Value::parse("1,250.50");
/// assert_eq!(v.to_string(), "1250.5");
/// assert_eq!(Value::parse("  ").numeric_or_zero().to_string(), "0");
/// assert_eq!(Value::parse("event").numeric_or_zero().to_string(), "0");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    /// A blank cell, or a column that the row does not have.
    #[default]
    Empty,
    Number(Decimal),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// Creates a `Number` from anything convertible into a `Decimal`.
    pub fn number(n: impl Into<Decimal>) -> Self {
        Value::Number(n.into())
    }

    /// Creates a `Text` value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Interprets the text of a cell from an untyped source such as a CSV file.
    ///
    /// - Blank or whitespace-only text is `Empty`.
    /// - Decimal literals are `Number`. Thousands separators, a leading `$` or `₹` and a trailing
    ///   `%` are accepted; `12.5%` is read as `0.125`.
    /// - Anything else is kept verbatim as `Text`.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Value::Empty;
        }
        match parse_number(trimmed) {
            Some(n) => Value::Number(n),
            None => Value::Text(s.to_string()),
        }
    }

    /// Converts a floating point cell. `NaN` and infinities are treated as blank cells.
    ///
    /// The number keeps the shortest decimal digits that identify `n`, so
    /// [`Value::as_f64`] gives back exactly `n`.
    pub fn from_f64(n: f64) -> Self {
        if !n.is_finite() {
            return Value::Empty;
        }
        Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| Decimal::from_f64(n))
            .map(Value::Number)
            .unwrap_or_default()
    }

    /// Returns the number held by this cell, or zero for blanks, text and dates.
    pub fn numeric_or_zero(&self) -> Decimal {
        self.as_number().unwrap_or(Decimal::ZERO)
    }

    /// Returns the number held by this cell, if it holds one.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The number held by this cell as the nearest `f64`. This is the inverse of
    /// [`Value::from_f64`].
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number()
            .and_then(|n| f64::from_str(&n.to_string()).ok())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// True for blank cells and numeric zero. Any non-empty text is considered non-zero.
    pub fn is_blank_or_zero(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Number(n) => n.is_zero(),
            Value::Text(s) => s.is_empty(),
            Value::Date(_) => false,
        }
    }

    /// Lower-cases and trims text. Text that trims to nothing becomes `Empty`. Other values are
    /// returned unchanged.
    pub fn normalized(self) -> Self {
        match self {
            Value::Text(s) => {
                let s = s.trim().to_lowercase();
                if s.is_empty() {
                    Value::Empty
                } else {
                    Value::Text(s)
                }
            }
            other => other,
        }
    }
}

fn parse_number(trimmed: &str) -> Option<Decimal> {
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(after_minus) => (true, after_minus),
        None => (false, trimmed),
    };
    let rest = rest
        .strip_prefix('$')
        .or_else(|| rest.strip_prefix('₹'))
        .unwrap_or(rest);
    let (percent, rest) = match rest.strip_suffix('%') {
        Some(before_percent) => (true, before_percent.trim_end()),
        None => (false, rest),
    };

    let without_commas = rest.replace(',', "");
    if !without_commas.chars().any(|c| c.is_ascii_digit())
        || !without_commas
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }

    let mut value = Decimal::from_str(&without_commas).ok()?;
    if percent {
        value = value.checked_div(Decimal::ONE_HUNDRED)?;
    }
    Some(if negative { -value } else { value })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Empty => serializer.serialize_none(),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}
