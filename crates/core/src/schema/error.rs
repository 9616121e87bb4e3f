//! Schema registry errors.

use folio_shared::AppError;
use thiserror::Error;

/// Errors raised while loading or looking up schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No schema with this name was loaded.
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// Definitions are inconsistent.
    #[error("Schema {schema} is invalid: {reason}")]
    Integrity {
        /// Offending schema.
        schema: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Definitions are not valid JSON.
    #[error("Cannot parse schema definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn integrity(schema: &str, reason: impl Into<String>) -> Self {
        Self::Integrity {
            schema: schema.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "SCHEMA_NOT_FOUND",
            Self::Integrity { .. } | Self::Parse(_) => "SCHEMA_INTEGRITY_ERROR",
        }
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::NotFound(_) => Self::NotFound(err.to_string()),
            SchemaError::Integrity { .. } | SchemaError::Parse(_) => {
                Self::SchemaIntegrity(err.to_string())
            }
        }
    }
}
