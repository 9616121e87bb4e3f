//! Documents, rows and create/update inputs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value::Value;

/// Field values of one document keyed by field name.
pub type FieldMap = BTreeMap<String, Value>;

/// A flat query result row: column name to value.
pub type Row = BTreeMap<String, Value>;

static NULL: Value = Value::Null;

/// Builds a [`FieldMap`] from `(field, value)` pairs.
#[must_use]
pub fn fields<const N: usize>(pairs: [(&str, Value); N]) -> FieldMap {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Lifecycle state of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    /// Freely editable.
    #[default]
    Draft,
    /// Posted; only `allow_on_submit` fields may change.
    Submitted,
    /// Reversed; immutable.
    Cancelled,
}

impl DocStatus {
    /// Derives the status from the persisted flag columns.
    #[must_use]
    pub const fn from_flags(submitted: bool, cancelled: bool) -> Self {
        match (submitted, cancelled) {
            (_, true) => Self::Cancelled,
            (true, false) => Self::Submitted,
            (false, false) => Self::Draft,
        }
    }

    /// Persisted `(submitted, cancelled)` flags.
    #[must_use]
    pub const fn flags(self) -> (bool, bool) {
        match self {
            Self::Draft => (false, false),
            Self::Submitted => (true, false),
            Self::Cancelled => (true, true),
        }
    }
}

impl std::fmt::Display for DocStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Submitted => write!(f, "submitted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Position of a child row inside its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// Owner's primary key.
    pub parent: String,
    /// Owner's table field.
    pub parent_field: String,
    /// Zero-based position in the collection.
    pub idx: i64,
}

/// A stored document with its child rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Schema the document belongs to.
    pub schema_name: String,
    /// Primary key.
    pub name: String,
    /// Lifecycle state. Always `Draft` for child rows.
    pub status: DocStatus,
    /// Declared column values.
    pub fields: FieldMap,
    /// Child rows per table field, ordered by `idx`.
    pub children: BTreeMap<String, Vec<Document>>,
    /// Owner of a child row.
    pub parent: Option<ParentRef>,
}

impl Document {
    /// Value of a field, `Null` when unset.
    #[must_use]
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Text of a string, enum or link field.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).as_str().filter(|s| !s.is_empty())
    }

    /// Amount of a currency (or integer) field.
    #[must_use]
    pub fn currency(&self, field: &str) -> Option<Decimal> {
        self.get(field).as_decimal()
    }

    /// Date field.
    #[must_use]
    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        self.get(field).as_date()
    }

    /// Check field; unset reads as false.
    #[must_use]
    pub fn check(&self, field: &str) -> bool {
        self.get(field).as_bool().unwrap_or(false)
    }

    /// Float field.
    #[must_use]
    pub fn float(&self, field: &str) -> Option<f64> {
        self.get(field).as_f64()
    }

    /// Child rows of a table field.
    #[must_use]
    pub fn rows(&self, table: &str) -> &[Self] {
        self.children.get(table).map_or(&[], Vec::as_slice)
    }

    /// Whether the document has been submitted (and possibly cancelled since).
    #[must_use]
    pub const fn submitted(&self) -> bool {
        matches!(self.status, DocStatus::Submitted | DocStatus::Cancelled)
    }

    /// Whether the document has been cancelled.
    #[must_use]
    pub const fn cancelled(&self) -> bool {
        matches!(self.status, DocStatus::Cancelled)
    }
}

/// Values for a create or update call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Explicit primary key, used by manual naming.
    pub name: Option<String>,
    /// Field values to set.
    pub fields: FieldMap,
    /// Replacement child rows per table field.
    pub tables: BTreeMap<String, Vec<FieldMap>>,
}

impl DocumentInput {
    /// Creates an empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primary key for manually named schemas.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets one field.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Appends a child row to a table field.
    #[must_use]
    pub fn row(mut self, table: &str, row: FieldMap) -> Self {
        self.tables.entry(table.to_string()).or_default().push(row);
        self
    }

    /// Replaces a table field with the given rows (possibly none).
    #[must_use]
    pub fn table(mut self, table: &str, rows: Vec<FieldMap>) -> Self {
        self.tables.insert(table.to_string(), rows);
        self
    }
}
