//! Document model.
//!
//! Tagged values, stored documents with their child rows, filter
//! predicates and the validation applied at the store boundary.

pub mod model;
pub mod query;
pub mod validation;
pub mod value;

pub use model::{DocStatus, Document, DocumentInput, FieldMap, ParentRef, Row, fields};
pub use query::{Condition, Filter, Query, Sort};
pub use validation::{
    Validated, ValidationError, check_required, coerce, normalize_query, validate_create,
    validate_input,
};
pub use value::Value;
