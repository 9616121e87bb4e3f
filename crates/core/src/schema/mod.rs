//! Schema registry.
//!
//! Declares the shape of every document kind: fields and their types,
//! constraints, naming policy and lifecycle metadata. Pure data, no I/O.
//! A [`SchemaSet`] is checked once at load and is read-only afterwards.

pub mod error;
pub mod registry;
pub mod types;

pub use error::SchemaError;
pub use registry::SchemaSet;
pub use types::{FieldDef, FieldType, Naming, Schema, SchemaDef, VoucherKind};
