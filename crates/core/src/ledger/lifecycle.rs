//! Voucher lifecycle: `Draft -> Submitted -> Cancelled`.

use super::error::LedgerError;
use crate::document::DocStatus;

/// Lifecycle state of a voucher.
pub type VoucherStatus = DocStatus;

impl DocStatus {
    /// Moves a draft to submitted.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidStateTransition` unless the status is
    /// `Draft`.
    pub fn submit(self) -> Result<Self, LedgerError> {
        match self {
            Self::Draft => Ok(Self::Submitted),
            from => Err(LedgerError::InvalidStateTransition {
                from,
                to: Self::Submitted,
            }),
        }
    }

    /// Moves a submitted voucher to cancelled.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidStateTransition` unless the status is
    /// `Submitted`.
    pub fn cancel(self) -> Result<Self, LedgerError> {
        match self {
            Self::Submitted => Ok(Self::Cancelled),
            from => Err(LedgerError::InvalidStateTransition {
                from,
                to: Self::Cancelled,
            }),
        }
    }
}
