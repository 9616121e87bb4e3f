//! Value encoding for document tables.
//!
//! Currency amounts are stored as integer minor units so comparisons and
//! sorting push down exactly. Dates are ISO text, checks are integers.

use chrono::NaiveDate;
use folio_core::currency::{from_minor_units, to_minor_units};
use folio_core::document::{ValidationError, Value};
use folio_core::schema::FieldType;
use sea_orm::{DbErr, QueryResult, Value as SqlValue};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encodes a coerced value for a column of `field_type`.
pub(crate) fn encode(
    schema: &str,
    field: &str,
    field_type: &FieldType,
    value: &Value,
) -> Result<SqlValue, ValidationError> {
    let unsupported = || ValidationError::new(schema, field, format!("cannot store {value:?}"));
    Ok(match (field_type, value) {
        (_, Value::Null) => null(field_type),
        (
            FieldType::String | FieldType::Enum { .. } | FieldType::Link { .. },
            Value::String(s) | Value::Enum(s) | Value::Link(s),
        ) => SqlValue::from(s.clone()),
        (FieldType::Int, Value::Int(i)) => SqlValue::from(*i),
        (FieldType::Float, Value::Float(f)) => SqlValue::from(*f),
        (FieldType::Currency { precision }, Value::Currency(amount)) => {
            let units = to_minor_units(*amount, *precision).ok_or_else(|| {
                ValidationError::new(schema, field, format!("{amount} is out of range"))
            })?;
            SqlValue::from(units)
        }
        (FieldType::Date, Value::Date(date)) => SqlValue::from(date.format(DATE_FORMAT).to_string()),
        (FieldType::Check, Value::Check(b)) => SqlValue::from(*b),
        _ => return Err(unsupported()),
    })
}

fn null(field_type: &FieldType) -> SqlValue {
    match field_type {
        FieldType::Int | FieldType::Currency { .. } => SqlValue::BigInt(None),
        FieldType::Float => SqlValue::Double(None),
        FieldType::Check => SqlValue::Bool(None),
        _ => SqlValue::String(None),
    }
}

/// Decodes column `column` of a result row.
pub(crate) fn decode(
    field_type: &FieldType,
    row: &QueryResult,
    column: &str,
) -> Result<Value, DbErr> {
    let value = match field_type {
        FieldType::String => row
            .try_get::<Option<String>>("", column)?
            .map_or(Value::Null, Value::String),
        FieldType::Enum { .. } => row
            .try_get::<Option<String>>("", column)?
            .map_or(Value::Null, Value::Enum),
        FieldType::Link { .. } => row
            .try_get::<Option<String>>("", column)?
            .map_or(Value::Null, Value::Link),
        FieldType::Int => row
            .try_get::<Option<i64>>("", column)?
            .map_or(Value::Null, Value::Int),
        FieldType::Float => row
            .try_get::<Option<f64>>("", column)?
            .map_or(Value::Null, Value::Float),
        FieldType::Currency { precision } => row
            .try_get::<Option<i64>>("", column)?
            .map_or(Value::Null, |units| {
                Value::Currency(from_minor_units(units, *precision))
            }),
        FieldType::Date => match row.try_get::<Option<String>>("", column)? {
            None => Value::Null,
            Some(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|e| DbErr::Type(format!("column {column}: {text:?} is not a date: {e}")))?,
        },
        FieldType::Check => row
            .try_get::<Option<bool>>("", column)?
            .map_or(Value::Null, Value::Check),
        FieldType::Table { .. } => Value::Null,
    };
    Ok(value)
}
