//! Input validation against a schema.
//!
//! Everything here runs before the store touches the database: values are
//! coerced to their declared type, unknown fields are rejected and required
//! fields are checked. Constraints that need stored data (uniqueness, link
//! targets) are checked by the store.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::currency::{from_minor_units, to_minor_units};
use crate::schema::{FieldType, Schema, SchemaSet};

use super::model::{DocumentInput, FieldMap};
use super::query::{Condition, Filter, Query};
use super::value::Value;

/// A field constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for {schema}.{field}: {reason}")]
pub struct ValidationError {
    /// Schema of the offending document.
    pub schema: String,
    /// Offending field.
    pub field: String,
    /// What is wrong with the value.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(schema: &str, field: &str, reason: impl Into<String>) -> Self {
        Self {
            schema: schema.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ValidationError> for folio_shared::AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Coerced field values and child rows, ready to be written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validated {
    /// Coerced header values.
    pub fields: FieldMap,
    /// Coerced child rows per table field.
    pub tables: BTreeMap<String, Vec<FieldMap>>,
}

/// Coerces `value` to the variant matching `field_type`.
///
/// # Errors
///
/// Returns `ValidationError` when the value cannot represent the type, e.g.
/// a currency amount with more decimal places than the field's precision.
pub fn coerce(
    schema: &str,
    field: &str,
    field_type: &FieldType,
    value: Value,
) -> Result<Value, ValidationError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let invalid = |reason: String| ValidationError::new(schema, field, reason);
    let mismatch = |v: &Value| invalid(format!("expected {}, got {v:?}", type_name(field_type)));

    match (field_type, value) {
        (FieldType::String, Value::String(s) | Value::Enum(s) | Value::Link(s)) => {
            Ok(Value::String(s))
        }
        (FieldType::Int, Value::Int(i)) => Ok(Value::Int(i)),
        (FieldType::Int, Value::String(s)) => s
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| invalid(format!("{s:?} is not an integer"))),
        (FieldType::Float, Value::Float(f)) if f.is_finite() => Ok(Value::Float(f)),
        #[allow(clippy::cast_precision_loss)]
        (FieldType::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (FieldType::Float, Value::Currency(d)) => f64::try_from(d)
            .map(Value::Float)
            .map_err(|_| invalid(format!("{d} is not a finite number"))),
        (FieldType::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(|| invalid(format!("{s:?} is not a number"))),
        (FieldType::Currency { precision }, v) => {
            let amount = decimal_operand(&v).ok_or_else(|| mismatch(&v))?;
            currency_amount(amount, *precision).map_err(&invalid)
        }
        (FieldType::Date, Value::Date(d)) => Ok(Value::Date(d)),
        (FieldType::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| invalid(format!("{s:?} is not a YYYY-MM-DD date"))),
        (FieldType::Enum { options }, Value::Enum(s) | Value::String(s)) => {
            if options.contains(&s) {
                Ok(Value::Enum(s))
            } else {
                Err(invalid(format!("{s:?} is not one of {}", options.join(", "))))
            }
        }
        (FieldType::Link { .. }, Value::Link(s) | Value::String(s)) => {
            if s.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Link(s))
            }
        }
        (FieldType::Check, Value::Check(b)) => Ok(Value::Check(b)),
        (FieldType::Check, Value::Int(0)) => Ok(Value::Check(false)),
        (FieldType::Check, Value::Int(1)) => Ok(Value::Check(true)),
        (FieldType::Table { .. }, _) => Err(invalid("table fields take rows".into())),
        (_, v) => Err(mismatch(&v)),
    }
}

fn decimal_operand(value: &Value) -> Option<Decimal> {
    match value {
        Value::Currency(d) => Some(*d),
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Float(f) => Decimal::try_from(*f).ok(),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn currency_amount(amount: Decimal, precision: u32) -> Result<Value, String> {
    if amount.round_dp(precision) != amount {
        return Err(format!(
            "{amount} has more than {precision} decimal places"
        ));
    }
    if to_minor_units(amount, precision).is_none() {
        return Err(format!("{amount} is out of range"));
    }
    let mut amount = amount;
    amount.rescale(precision);
    Ok(Value::Currency(amount))
}

const fn type_name(field_type: &FieldType) -> &'static str {
    match field_type {
        FieldType::String => "String",
        FieldType::Int => "Int",
        FieldType::Float => "Float",
        FieldType::Currency { .. } => "Currency",
        FieldType::Date => "Date",
        FieldType::Enum { .. } => "Enum",
        FieldType::Link { .. } => "Link",
        FieldType::Table { .. } => "Table",
        FieldType::Check => "Check",
    }
}

/// Coerces every provided field of `input` and its child rows.
///
/// Required fields are not checked here: an update only carries the fields
/// that change. Child rows are always complete and are checked in full.
///
/// # Errors
///
/// Returns `ValidationError` for unknown fields, uncoercible values, table
/// rows for non-table fields and incomplete child rows.
pub fn validate_input(
    schemas: &SchemaSet,
    schema: &Schema,
    input: &DocumentInput,
) -> Result<Validated, ValidationError> {
    let fields = coerce_fields(schema, &input.fields)?;

    let mut tables = BTreeMap::new();
    for (table, rows) in &input.tables {
        let child = match schema.field(table).map(|f| &f.field_type) {
            Some(FieldType::Table { child }) => schemas
                .get(child)
                .map_err(|e| ValidationError::new(schema.name(), table, e.to_string()))?,
            Some(_) => {
                return Err(ValidationError::new(
                    schema.name(),
                    table,
                    "not a table field",
                ));
            }
            None => return Err(ValidationError::new(schema.name(), table, "unknown field")),
        };

        let mut coerced = Vec::with_capacity(rows.len());
        for row in rows {
            let row = coerce_fields(child, row)?;
            check_required(child, &row)?;
            coerced.push(row);
        }
        tables.insert(table.clone(), coerced);
    }

    Ok(Validated { fields, tables })
}

/// Validates a complete new document: coercion plus required fields.
///
/// # Errors
///
/// See [`validate_input`] and [`check_required`].
pub fn validate_create(
    schemas: &SchemaSet,
    schema: &Schema,
    input: &DocumentInput,
) -> Result<Validated, ValidationError> {
    let validated = validate_input(schemas, schema, input)?;
    check_required(schema, &validated.fields)?;
    Ok(validated)
}

fn coerce_fields(schema: &Schema, values: &FieldMap) -> Result<FieldMap, ValidationError> {
    let mut out = FieldMap::new();
    for (name, value) in values {
        let Some(field) = schema.field(name) else {
            return Err(ValidationError::new(schema.name(), name, "unknown field"));
        };
        if !field.field_type.is_column() {
            return Err(ValidationError::new(
                schema.name(),
                name,
                "table fields take rows",
            ));
        }
        let value = coerce(schema.name(), name, &field.field_type, value.clone())?;
        out.insert(name.clone(), value);
    }
    Ok(out)
}

/// Checks that every required column field holds a non-null value.
///
/// # Errors
///
/// Returns `ValidationError` naming the first missing field.
pub fn check_required(schema: &Schema, values: &FieldMap) -> Result<(), ValidationError> {
    for field in schema.column_fields().filter(|f| f.required) {
        let present = values.get(&field.name).is_some_and(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        });
        if !present {
            return Err(ValidationError::new(
                schema.name(),
                &field.name,
                "value is required",
            ));
        }
    }
    Ok(())
}

/// Checks a query against a schema and coerces its operands to the column
/// types, so the store and [`Filter::matches`] see the same values.
/// Currency operands finer than the column precision are snapped to an
/// equivalent stored amount rather than rejected.
///
/// # Errors
///
/// Returns `ValidationError` for unknown columns, uncoercible operands and
/// `like` on non-text columns.
pub fn normalize_query(schema: &Schema, query: &Query) -> Result<Query, ValidationError> {
    let column = |name: &str| {
        schema
            .column_type(name)
            .ok_or_else(|| ValidationError::new(schema.name(), name, "unknown column"))
    };

    let mut filters = Vec::with_capacity(query.filters.len());
    for filter in &query.filters {
        let field_type = column(&filter.field)?;
        let operand = |v: &Value| coerce(schema.name(), &filter.field, &field_type, v.clone());
        let condition = match &field_type {
            FieldType::Currency { precision } => snap_currency(&filter.condition, *precision),
            _ => filter.condition.clone(),
        };
        let condition = match &condition {
            Condition::Eq(v) => Condition::Eq(operand(v)?),
            Condition::Ne(v) => Condition::Ne(operand(v)?),
            Condition::Gt(v) => Condition::Gt(operand(v)?),
            Condition::Lt(v) => Condition::Lt(operand(v)?),
            Condition::Ge(v) => Condition::Ge(operand(v)?),
            Condition::Le(v) => Condition::Le(operand(v)?),
            Condition::In(vs) => Condition::In(vs.iter().map(&operand).collect::<Result<_, _>>()?),
            Condition::Like(p) => {
                if !field_type.is_text() {
                    return Err(ValidationError::new(
                        schema.name(),
                        &filter.field,
                        "like is only supported on text fields",
                    ));
                }
                Condition::Like(p.clone())
            }
        };
        filters.push(Filter::new(filter.field.clone(), condition));
    }

    if let Some(fields) = &query.fields {
        for field in fields {
            column(field)?;
        }
    }
    for sort in &query.sort {
        column(&sort.field)?;
    }

    Ok(Query {
        filters,
        fields: query.fields.clone(),
        sort: query.sort.clone(),
        page: query.page,
    })
}

/// Rewrites comparisons against amounts finer than the column precision
/// into comparisons against stored amounts with the same result.
///
/// Stored amounts are multiples of `10^-precision`, so `> 100.005` holds
/// exactly when `> 100.00` does and `>= 100.005` exactly when `>= 100.01`.
/// No stored amount equals an off-grid operand: `=` matches nothing and
/// `!=` every non-null amount.
fn snap_currency(condition: &Condition, precision: u32) -> Condition {
    let off_grid = |v: &Value| decimal_operand(v).filter(|d| d.round_dp(precision) != *d);
    let floor = |d: Decimal| {
        Value::Currency(d.round_dp_with_strategy(precision, RoundingStrategy::ToNegativeInfinity))
    };
    let ceil = |d: Decimal| {
        Value::Currency(d.round_dp_with_strategy(precision, RoundingStrategy::ToPositiveInfinity))
    };

    let amount = match condition {
        Condition::In(values) => {
            let on_grid = values.iter().filter(|&v| off_grid(v).is_none());
            return Condition::In(on_grid.cloned().collect());
        }
        Condition::Like(_) => None,
        Condition::Eq(v)
        | Condition::Ne(v)
        | Condition::Gt(v)
        | Condition::Lt(v)
        | Condition::Ge(v)
        | Condition::Le(v) => off_grid(v),
    };
    let Some(amount) = amount else {
        return condition.clone();
    };

    match condition {
        Condition::Eq(_) => Condition::In(Vec::new()),
        Condition::Ne(_) => Condition::Ge(Value::Currency(from_minor_units(i64::MIN, precision))),
        Condition::Gt(_) => Condition::Gt(floor(amount)),
        Condition::Le(_) => Condition::Le(floor(amount)),
        Condition::Ge(_) => Condition::Ge(ceil(amount)),
        _ => Condition::Lt(ceil(amount)),
    }
}
