//! Report runner errors.

use folio_core::reports::ReportError;
use folio_shared::AppError;
use thiserror::Error;

use crate::store::StoreError;

/// Error types for report computation.
#[derive(Debug, Error)]
pub enum ReportRunError {
    /// The filters are invalid.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Fetching rows failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sea_orm::DbErr> for ReportRunError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Store(err.into())
    }
}

impl From<ReportRunError> for AppError {
    fn from(err: ReportRunError) -> Self {
        match err {
            ReportRunError::Report(e) => e.into(),
            ReportRunError::Store(e) => e.into(),
        }
    }
}
