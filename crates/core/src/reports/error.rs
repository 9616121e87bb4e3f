//! Report error types.

use chrono::NaiveDate;
use folio_shared::AppError;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Checks a half-open `[start, end)` range.
///
/// # Errors
///
/// Returns `ReportError::InvalidDateRange` when `start` is after `end`.
pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
    if start > end {
        return Err(ReportError::InvalidDateRange { start, end });
    }
    Ok(())
}
