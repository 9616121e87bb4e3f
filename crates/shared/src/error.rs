//! Application-wide error types.
//!
//! Every module of the core has its own error enum carrying diagnostic
//! context. They all collapse into [`AppError`], the flat taxonomy the
//! application layer reports to users.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// A field constraint was violated before anything was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Schema definitions are inconsistent; fatal at load time.
    #[error("Schema integrity error: {0}")]
    SchemaIntegrity(String),

    /// Requested document or schema does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document can no longer be changed.
    #[error("Immutable document: {0}")]
    ImmutableDocument(String),

    /// Document is still referenced by ledger entries or other documents.
    #[error("Referential integrity error: {0}")]
    ReferentialIntegrity(String),

    /// Posting debits and credits could not be balanced; nothing was committed.
    #[error("Unbalanced posting: {0}")]
    UnbalancedPosting(String),

    /// Illegal lifecycle transition (e.g. cancelling a draft).
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Persistence failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// Returns the stable error code reported to callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::SchemaIntegrity(_) => "SCHEMA_INTEGRITY_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ImmutableDocument(_) => "IMMUTABLE_DOCUMENT",
            Self::ReferentialIntegrity(_) => "REFERENTIAL_INTEGRITY_ERROR",
            Self::UnbalancedPosting(_) => "UNBALANCED_POSTING",
            Self::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Returns true if the caller may retry the same call.
    ///
    /// Only persistence failures qualify; the core never retries on its own.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
