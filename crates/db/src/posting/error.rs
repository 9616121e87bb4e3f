//! Posting service errors.

use folio_core::ledger::LedgerError;
use folio_shared::AppError;
use thiserror::Error;

use crate::store::StoreError;

/// Error types for submit and cancel.
///
/// Either way the enclosing transaction was rolled back and nothing was
/// written.
#[derive(Debug, Error)]
pub enum PostingError {
    /// The posting could not be built or the transition is illegal.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Reading or writing the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PostingError {
    /// Returns the stable error code of the underlying failure.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        match err {
            PostingError::Ledger(e) => e.into(),
            PostingError::Store(e) => e.into(),
        }
    }
}
