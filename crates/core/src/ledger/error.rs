//! Ledger error types for posting and lifecycle errors.
//!
//! This module defines all errors that can occur while building, validating
//! and reversing postings, and while moving a voucher through its lifecycle.

use folio_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::document::DocStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// A posting must have at least 2 entries.
    #[error("Posting must have at least 2 entries")]
    InsufficientEntries,

    /// Debits and credits differ by more than the round-off tolerance.
    #[error(
        "Posting for {voucher} is not balanced. Debit: {debit}, Credit: {credit}, \
         residue {residue} exceeds tolerance {tolerance}"
    )]
    UnbalancedPosting {
        /// Voucher being posted.
        voucher: String,
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
        /// Debit minus credit.
        residue: Decimal,
        /// Largest residue a round-off entry may absorb.
        tolerance: Decimal,
    },

    /// Entry or voucher amount is negative.
    #[error("Amount {amount} of {field} on {voucher} cannot be negative")]
    InvalidAmount {
        /// Voucher carrying the amount.
        voucher: String,
        /// Field holding the amount.
        field: String,
        /// Offending amount.
        amount: Decimal,
    },

    /// The voucher cannot be posted as it stands.
    #[error("Voucher {voucher} cannot be posted: {reason}")]
    InvalidVoucher {
        /// Voucher name.
        voucher: String,
        /// What is missing or wrong.
        reason: String,
    },

    // ========== Account Errors ==========
    /// An account needed by the posting is not set.
    #[error("Voucher {voucher} has no {role} account")]
    MissingAccount {
        /// Voucher name.
        voucher: String,
        /// Which account is missing (header, discount, line 2, ...).
        role: String,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Group accounts only aggregate their children.
    #[error("Account {0} is a group account and cannot be posted to")]
    GroupAccount(String),

    // ========== Lifecycle Errors ==========
    /// Illegal lifecycle transition.
    #[error("Cannot move voucher from {from} to {to}")]
    InvalidStateTransition {
        /// Current status.
        from: DocStatus,
        /// Requested status.
        to: DocStatus,
    },

    /// Cancellation found no original entries to offset.
    #[error("No ledger entries to reverse for {0}")]
    NothingToReverse(String),
}

impl LedgerError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientEntries => "INSUFFICIENT_ENTRIES",
            Self::UnbalancedPosting { .. } => "UNBALANCED_POSTING",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvalidVoucher { .. } => "INVALID_VOUCHER",
            Self::MissingAccount { .. } => "MISSING_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::GroupAccount(_) => "GROUP_ACCOUNT",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::NothingToReverse(_) => "NOTHING_TO_REVERSE",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::InsufficientEntries | LedgerError::UnbalancedPosting { .. } => {
                Self::UnbalancedPosting(message)
            }
            LedgerError::AccountNotFound(_) => Self::NotFound(message),
            LedgerError::InvalidStateTransition { .. } | LedgerError::NothingToReverse(_) => {
                Self::InvalidStateTransition(message)
            }
            LedgerError::InvalidAmount { .. }
            | LedgerError::InvalidVoucher { .. }
            | LedgerError::MissingAccount { .. }
            | LedgerError::GroupAccount(_) => Self::Validation(message),
        }
    }
}
