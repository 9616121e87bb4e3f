//! Tagged field values.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single field value.
///
/// Inputs may arrive loosely typed (a date as an ISO string, a currency as an
/// integer); the store coerces them to the variant matching the declared
/// field type before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Free text.
    String(String),
    /// Integer.
    Int(i64),
    /// Non-monetary floating-point number.
    Float(f64),
    /// Fixed-point money amount.
    Currency(Decimal),
    /// Calendar date.
    Date(NaiveDate),
    /// Enum option.
    Enum(String),
    /// Primary key of a linked document.
    Link(String),
    /// Boolean flag.
    Check(bool),
}

impl Value {
    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text content of `String`, `Enum` and `Link` values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) | Self::Link(s) => Some(s),
            _ => None,
        }
    }

    /// Exact decimal form of numeric values.
    ///
    /// Floats that cannot be represented (NaN, infinities) yield `None`.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Currency(d) => Some(*d),
            Self::Int(i) => Some(Decimal::from(*i)),
            Self::Float(f) => Decimal::try_from(*f).ok(),
            _ => None,
        }
    }

    /// Date content.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Flag content.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Check(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer content.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float content.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Orders two values the way the database orders their columns.
    ///
    /// Numbers compare by exact decimal value, text by bytes, dates
    /// chronologically and flags `false < true`. `Null` and mismatched
    /// kinds are unordered.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Check(a), Self::Check(b)) => Some(a.cmp(b)),
            _ => {
                if let (Some(a), Some(b)) = (self.as_str(), other.as_str()) {
                    return Some(a.cmp(b));
                }
                match (self.as_decimal(), other.as_decimal()) {
                    (Some(a), Some(b)) => Some(a.cmp(&b)),
                    _ => None,
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::String(s) | Self::Enum(s) | Self::Link(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Currency(d) => write!(f, "{d}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Check(b) => write!(f, "{}", u8::from(*b)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Currency(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Check(b)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_numeric_compare_across_kinds() {
        assert_eq!(
            Value::Int(5).compare(&Value::Currency(dec!(5.00))),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Float(2.5).compare(&Value::Int(3)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Currency(dec!(10.01)).compare(&Value::Currency(dec!(10))),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_text_compare_across_kinds() {
        assert_eq!(
            Value::Link("Cash".into()).compare(&Value::from("Cash")),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::from("B").compare(&Value::from("a")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_null_and_mismatch_are_unordered() {
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::Int(1).compare(&Value::Null), None);
        assert_eq!(Value::from("1").compare(&Value::Int(1)), None);
        assert_eq!(Value::Float(f64::NAN).compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-03-01");
        assert_eq!(Value::Check(true).to_string(), "1");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Currency(dec!(12.50)).to_string(), "12.50");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }
}
