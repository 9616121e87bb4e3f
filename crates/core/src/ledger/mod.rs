//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Ledger entries (debits and credits)
//! - Postings built in memory and validated before commit
//! - Voucher extraction from submitted documents
//! - The posting engine with exchange-rate conversion and round-off
//! - Reversal of committed postings on cancel
//! - The voucher lifecycle state machine
//! - Error types for ledger operations

pub mod balance;
pub mod engine;
pub mod entry;
pub mod error;
pub mod lifecycle;
pub mod posting;
pub mod reversal;
pub mod voucher;

#[cfg(test)]
mod posting_props;

pub use balance::AccountBalance;
pub use engine::{AccountInfo, PostingEngine};
pub use entry::{EntryType, LedgerEntry, PostingEntry};
pub use error::LedgerError;
pub use lifecycle::VoucherStatus;
pub use posting::Posting;
pub use reversal::ReversalService;
pub use voucher::{Voucher, VoucherLine};

/// Schema holding the chart of accounts.
pub const ACCOUNT_SCHEMA: &str = "Account";
/// Account field marking group accounts.
pub const ACCOUNT_IS_GROUP_FIELD: &str = "is_group";
/// Account field linking to the parent group.
pub const ACCOUNT_PARENT_FIELD: &str = "parent_account";
/// Schema holding customers and suppliers.
pub const PARTY_SCHEMA: &str = "Party";
/// Change-version key of the ledger entry collection.
pub const LEDGER_COLLECTION: &str = "ledger_entries";
