//! Document store errors.

use folio_core::document::ValidationError;
use folio_core::schema::SchemaError;
use folio_shared::AppError;
use sea_orm::DbErr;
use thiserror::Error;

/// Error types for document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown schema or broken schema definitions.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A value or query violated a field constraint; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No document with this key.
    #[error("{schema} {name} not found")]
    NotFound {
        /// Schema name.
        schema: String,
        /// Document key.
        name: String,
    },

    /// The document's lifecycle state forbids the change.
    #[error("{schema} {name} cannot be changed: {reason}")]
    ImmutableDocument {
        /// Schema name.
        schema: String,
        /// Document key.
        name: String,
        /// Why the change is refused.
        reason: String,
    },

    /// The document is still referenced.
    #[error("{schema} {name} is referenced by {referenced_by}")]
    ReferentialIntegrity {
        /// Schema name.
        schema: String,
        /// Document key.
        name: String,
        /// What refers to it, e.g. `ledger_entries` or `SalesInvoice.party`.
        referenced_by: String,
    },

    /// Status changes need a submittable schema.
    #[error("{0} is not submittable")]
    NotSubmittable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl StoreError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Schema(e) => e.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ImmutableDocument { .. } => "IMMUTABLE_DOCUMENT",
            Self::ReferentialIntegrity { .. } => "REFERENTIAL_INTEGRITY_ERROR",
            Self::NotSubmittable(_) => "NOT_SUBMITTABLE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    pub(crate) fn not_found(schema: &str, name: &str) -> Self {
        Self::NotFound {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn immutable(schema: &str, name: &str, reason: impl Into<String>) -> Self {
        Self::ImmutableDocument {
            schema: schema.to_string(),
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Schema(e) => e.into(),
            StoreError::Validation(e) => e.into(),
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::ImmutableDocument { .. } => Self::ImmutableDocument(err.to_string()),
            StoreError::ReferentialIntegrity { .. } => Self::ReferentialIntegrity(err.to_string()),
            StoreError::NotSubmittable(_) => Self::InvalidStateTransition(err.to_string()),
            StoreError::Database(e) => Self::Io(e.to_string()),
        }
    }
}
