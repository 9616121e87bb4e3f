//! Loading and integrity checking of schema sets.

use std::collections::{BTreeMap, HashSet};

use super::error::SchemaError;
use super::types::{
    FieldDef, FieldType, MAX_CURRENCY_PRECISION, Naming, SYSTEM_COLUMNS, Schema, SchemaDef,
};

/// Header fields the posting engine reads from a voucher.
pub const VOUCHER_ACCOUNT_FIELD: &str = "account";
/// See [`VOUCHER_ACCOUNT_FIELD`].
pub const VOUCHER_DATE_FIELD: &str = "date";
/// See [`VOUCHER_ACCOUNT_FIELD`].
pub const VOUCHER_TOTAL_FIELD: &str = "grand_total";
/// Table field holding the voucher lines.
pub const VOUCHER_ITEMS_FIELD: &str = "items";
/// Optional header field converting voucher amounts to base currency.
/// Must be a fixed-point `Currency` field when declared.
pub const VOUCHER_EXCHANGE_RATE_FIELD: &str = "exchange_rate";
/// Line field naming the account credited or debited by the line.
pub const LINE_ACCOUNT_FIELD: &str = "account";
/// Line field holding the line amount.
pub const LINE_AMOUNT_FIELD: &str = "amount";

const BUILTIN: &str = include_str!("builtin.json");

/// An immutable, checked set of schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaSet {
    /// Checks a list of definitions and builds the set.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Integrity` naming the first inconsistent schema.
    pub fn load(defs: Vec<SchemaDef>) -> Result<Self, SchemaError> {
        let mut schemas = BTreeMap::new();
        for def in defs {
            if schemas.contains_key(&def.name) {
                return Err(SchemaError::integrity(&def.name, "duplicate schema name"));
            }
            schemas.insert(def.name.clone(), Schema::new(def));
        }

        let set = Self { schemas };
        for schema in set.schemas.values() {
            set.check(schema)?;
        }
        Ok(set)
    }

    /// Parses a JSON array of definitions and loads it.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Parse` for malformed JSON and
    /// `SchemaError::Integrity` for inconsistent definitions.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let defs: Vec<SchemaDef> = serde_json::from_str(json)?;
        Self::load(defs)
    }

    /// The bundled accounting schemas: accounts, parties, items and
    /// sales/purchase invoices with their item rows.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled definitions are broken.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_json(BUILTIN)
    }

    /// Looks up a schema by name.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` for unknown names.
    pub fn get(&self, name: &str) -> Result<&Schema, SchemaError> {
        self.schemas
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    /// Whether a schema with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// All schemas, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Link fields across all schemas that point at `target`.
    #[must_use]
    pub fn links_to(&self, target: &str) -> Vec<(&Schema, &FieldDef)> {
        self.schemas
            .values()
            .flat_map(|schema| {
                schema.fields().iter().filter_map(move |field| match &field.field_type {
                    FieldType::Link { target: t } if t == target => Some((schema, field)),
                    _ => None,
                })
            })
            .collect()
    }

    fn check(&self, schema: &Schema) -> Result<(), SchemaError> {
        let name = schema.name();
        if !is_identifier(name, true) {
            return Err(SchemaError::integrity(name, "schema name must be alphanumeric"));
        }

        let mut seen = HashSet::new();
        for field in schema.fields() {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::integrity(
                    name,
                    format!("duplicate field {}", field.name),
                ));
            }
            if !is_identifier(&field.name, false) {
                return Err(SchemaError::integrity(
                    name,
                    format!("invalid field name {:?}", field.name),
                ));
            }
            if SYSTEM_COLUMNS.contains(&field.name.as_str()) {
                return Err(SchemaError::integrity(
                    name,
                    format!("field {} shadows a system column", field.name),
                ));
            }
            self.check_field_type(name, field)?;
        }

        if let Naming::Field(field_name) = schema.naming() {
            let ok = schema
                .field(field_name)
                .is_some_and(|f| f.required && f.field_type == FieldType::String);
            if !ok {
                return Err(SchemaError::integrity(
                    name,
                    format!("naming field {field_name} must be a required String field"),
                ));
            }
        }

        if schema.is_child() && (schema.submittable() || schema.posting().is_some()) {
            return Err(SchemaError::integrity(name, "child schemas cannot be submitted"));
        }

        if schema.posting().is_some() {
            self.check_voucher(schema)?;
        }
        Ok(())
    }

    fn check_field_type(&self, name: &str, field: &FieldDef) -> Result<(), SchemaError> {
        match &field.field_type {
            FieldType::Currency { precision } if *precision > MAX_CURRENCY_PRECISION => {
                Err(SchemaError::integrity(
                    name,
                    format!(
                        "field {} precision {precision} exceeds {MAX_CURRENCY_PRECISION}",
                        field.name
                    ),
                ))
            }
            FieldType::Enum { options } if options.is_empty() => Err(SchemaError::integrity(
                name,
                format!("enum field {} has no options", field.name),
            )),
            FieldType::Link { target } if !self.contains(target) => Err(SchemaError::integrity(
                name,
                format!("field {} links to unknown schema {target}", field.name),
            )),
            FieldType::Table { child } => match self.schemas.get(child) {
                Some(c) if c.is_child() => Ok(()),
                Some(_) => Err(SchemaError::integrity(
                    name,
                    format!("table field {} targets {child}, which is not a child schema", field.name),
                )),
                None => Err(SchemaError::integrity(
                    name,
                    format!("table field {} targets unknown schema {child}", field.name),
                )),
            },
            _ => Ok(()),
        }
    }

    fn check_voucher(&self, schema: &Schema) -> Result<(), SchemaError> {
        let name = schema.name();
        if !schema.submittable() {
            return Err(SchemaError::integrity(name, "posting schemas must be submittable"));
        }

        require(schema, VOUCHER_ACCOUNT_FIELD, |t| {
            matches!(t, FieldType::Link { .. } | FieldType::String)
        })?;
        require(schema, VOUCHER_DATE_FIELD, |t| *t == FieldType::Date)?;
        require(schema, VOUCHER_TOTAL_FIELD, |t| {
            matches!(t, FieldType::Currency { .. })
        })?;
        require(schema, VOUCHER_ITEMS_FIELD, |t| {
            matches!(t, FieldType::Table { .. })
        })?;
        if schema.field(VOUCHER_EXCHANGE_RATE_FIELD).is_some() {
            require(schema, VOUCHER_EXCHANGE_RATE_FIELD, |t| {
                matches!(t, FieldType::Currency { .. })
            })?;
        }

        for (field, child) in schema.table_fields() {
            if field != VOUCHER_ITEMS_FIELD {
                continue;
            }
            let child = self.get(child)?;
            require(child, LINE_ACCOUNT_FIELD, |t| {
                matches!(t, FieldType::Link { .. } | FieldType::String)
            })?;
            require(child, LINE_AMOUNT_FIELD, |t| {
                matches!(t, FieldType::Currency { .. })
            })?;
        }
        Ok(())
    }
}

fn require(
    schema: &Schema,
    field: &str,
    accepts: impl Fn(&FieldType) -> bool,
) -> Result<(), SchemaError> {
    match schema.field(field) {
        Some(f) if accepts(&f.field_type) => Ok(()),
        Some(_) => Err(SchemaError::integrity(
            schema.name(),
            format!("voucher field {field} has the wrong type"),
        )),
        None => Err(SchemaError::integrity(
            schema.name(),
            format!("voucher field {field} is missing"),
        )),
    }
}

/// Field names are `[a-z_][a-z0-9_]*`; schema names also allow upper case.
fn is_identifier(s: &str, allow_upper: bool) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let valid = |c: char| c.is_ascii_lowercase() || c == '_' || (allow_upper && c.is_ascii_uppercase());
    valid(first) && chars.all(|c| valid(c) || c.is_ascii_digit())
}
