//! Schema definition types.
//!
//! A [`SchemaDef`] is the serialized declaration of one entity shape. After
//! the registry checks a set of definitions each one becomes a [`Schema`],
//! which adds a field index and the system columns every table carries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Primary key column present on every table.
pub const NAME_COLUMN: &str = "name";
/// Status flag columns present on every top-level table.
pub const SUBMITTED_COLUMN: &str = "submitted";
/// See [`SUBMITTED_COLUMN`].
pub const CANCELLED_COLUMN: &str = "cancelled";
/// Owning document of a child row.
pub const PARENT_COLUMN: &str = "parent";
/// Table field of the owner that holds a child row.
pub const PARENT_FIELD_COLUMN: &str = "parent_field";
/// Position of a child row within its collection.
pub const IDX_COLUMN: &str = "idx";

/// Column names managed by the store; declared fields may not reuse them.
pub const SYSTEM_COLUMNS: [&str; 6] = [
    NAME_COLUMN,
    SUBMITTED_COLUMN,
    CANCELLED_COLUMN,
    PARENT_COLUMN,
    PARENT_FIELD_COLUMN,
    IDX_COLUMN,
];

/// Largest precision accepted for a currency field.
pub const MAX_CURRENCY_PRECISION: u32 = 12;

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    /// Free text.
    String,
    /// 64-bit signed integer.
    Int,
    /// Non-monetary floating-point number (quantities, rates).
    Float,
    /// Fixed-point money amount.
    Currency {
        /// Decimal places kept for the amount.
        #[serde(default = "default_currency_precision")]
        precision: u32,
    },
    /// Calendar date.
    Date,
    /// One of a closed set of strings.
    Enum {
        /// Accepted values.
        options: Vec<String>,
    },
    /// Primary key of a document of another schema.
    Link {
        /// Referenced schema.
        target: String,
    },
    /// Ordered collection of child rows.
    Table {
        /// Child schema of the rows.
        child: String,
    },
    /// Boolean flag.
    Check,
}

const fn default_currency_precision() -> u32 {
    2
}

impl FieldType {
    /// Returns true for types stored as text and accepted by `like`.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::String | Self::Enum { .. } | Self::Link { .. })
    }

    /// Returns true for types backed by a column of their own.
    #[must_use]
    pub const fn is_column(&self) -> bool {
        !matches!(self, Self::Table { .. })
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Column name, `[a-z_][a-z0-9_]*`.
    pub name: String,
    /// Human readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// Value type.
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether a non-null value must be present on create.
    #[serde(default)]
    pub required: bool,
    /// Whether two documents may share a value.
    #[serde(default)]
    pub unique: bool,
    /// Whether the field stays editable after submission.
    #[serde(default)]
    pub allow_on_submit: bool,
}

impl FieldDef {
    /// Creates an optional field of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: None,
            field_type,
            required: false,
            unique: false,
            allow_on_submit: false,
        }
    }

    /// Marks the field required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Keeps the field editable after submission.
    #[must_use]
    pub const fn allow_on_submit(mut self) -> Self {
        self.allow_on_submit = true;
        self
    }
}

/// How a new document gets its primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Naming {
    /// Caller supplies the name.
    Manual,
    /// Value of the named required string field.
    Field(String),
    /// `PREFIX-00001` from a persisted counter.
    Series(String),
    /// Random UUID.
    #[default]
    Random,
}

/// Which posting rules a submittable schema follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherKind {
    /// Receivable debited, income credited.
    Sale,
    /// Expense debited, payable credited.
    Purchase,
}

impl std::fmt::Display for VoucherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sale => write!(f, "sale"),
            Self::Purchase => write!(f, "purchase"),
        }
    }
}

/// Serialized declaration of an entity shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Unique schema name, also the table name.
    pub name: String,
    /// Human readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// Declared fields in display order.
    pub fields: Vec<FieldDef>,
    /// Primary key policy.
    #[serde(default)]
    pub naming: Naming,
    /// Rows exist only inside a parent's table field.
    #[serde(default)]
    pub is_child: bool,
    /// Documents go through the draft/submitted/cancelled lifecycle.
    #[serde(default)]
    pub submittable: bool,
    /// Posting rules applied on submit.
    #[serde(default)]
    pub posting: Option<VoucherKind>,
}

impl SchemaDef {
    /// Creates a definition with random naming and no flags.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            label: None,
            fields,
            naming: Naming::default(),
            is_child: false,
            submittable: false,
            posting: None,
        }
    }
}

/// A checked schema.
#[derive(Debug, Clone)]
pub struct Schema {
    def: SchemaDef,
    index: HashMap<String, usize>,
}

impl Schema {
    pub(crate) fn new(def: SchemaDef) -> Self {
        let index = def
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self { def, index }
    }

    /// Schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.def.fields
    }

    /// Looks up a declared field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.index.get(name).map(|&i| &self.def.fields[i])
    }

    /// Primary key policy.
    #[must_use]
    pub const fn naming(&self) -> &Naming {
        &self.def.naming
    }

    /// Whether rows only exist inside a parent.
    #[must_use]
    pub const fn is_child(&self) -> bool {
        self.def.is_child
    }

    /// Whether documents follow the submit/cancel lifecycle.
    #[must_use]
    pub const fn submittable(&self) -> bool {
        self.def.submittable
    }

    /// Posting rules applied on submit, if any.
    #[must_use]
    pub const fn posting(&self) -> Option<VoucherKind> {
        self.def.posting
    }

    /// The underlying definition.
    #[must_use]
    pub const fn def(&self) -> &SchemaDef {
        &self.def
    }

    /// Declared fields that are backed by a column.
    pub fn column_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.def.fields.iter().filter(|f| f.field_type.is_column())
    }

    /// Declared table fields as `(field, child schema)` pairs.
    pub fn table_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.def.fields.iter().filter_map(|f| match &f.field_type {
            FieldType::Table { child } => Some((f.name.as_str(), child.as_str())),
            _ => None,
        })
    }

    /// Names of the system columns this table carries.
    #[must_use]
    pub fn system_columns(&self) -> &'static [&'static str] {
        if self.def.is_child {
            &[NAME_COLUMN, PARENT_COLUMN, PARENT_FIELD_COLUMN, IDX_COLUMN]
        } else {
            &[NAME_COLUMN, SUBMITTED_COLUMN, CANCELLED_COLUMN]
        }
    }

    /// Type of a queryable column, system columns included.
    ///
    /// Table fields have no column and return `None`.
    #[must_use]
    pub fn column_type(&self, name: &str) -> Option<FieldType> {
        if let Some(field) = self.field(name) {
            return field
                .field_type
                .is_column()
                .then(|| field.field_type.clone());
        }
        if !self.system_columns().contains(&name) {
            return None;
        }
        Some(match name {
            SUBMITTED_COLUMN | CANCELLED_COLUMN => FieldType::Check,
            IDX_COLUMN => FieldType::Int,
            _ => FieldType::String,
        })
    }
}
