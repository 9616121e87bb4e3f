//! Ledger entry domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry (increases assets/expenses, decreases liabilities/equity/income).
    Debit,
    /// Credit entry (decreases assets/expenses, increases liabilities/equity/income).
    Credit,
}

impl EntryType {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// An entry of a posting that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingEntry {
    /// Account debited or credited.
    pub account: String,
    /// Party the amount is owed by or to.
    pub party: Option<String>,
    /// Debit amount (0 if credit).
    pub debit: Decimal,
    /// Credit amount (0 if debit).
    pub credit: Decimal,
    /// Whether the entry absorbs a rounding residue.
    pub is_round_off: bool,
    /// Entry this one offsets, for reversals.
    pub reverts: Option<i64>,
}

impl PostingEntry {
    /// Creates an entry on one side.
    #[must_use]
    pub fn new(account: &str, party: Option<&str>, side: EntryType, amount: Decimal) -> Self {
        let (debit, credit) = match side {
            EntryType::Debit => (amount, Decimal::ZERO),
            EntryType::Credit => (Decimal::ZERO, amount),
        };
        Self {
            account: account.to_string(),
            party: party.map(str::to_string),
            debit,
            credit,
            is_round_off: false,
            reverts: None,
        }
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// A committed, immutable ledger entry.
///
/// Corrections never update an entry; they append an offsetting entry whose
/// `reverts` points here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique, increasing identifier.
    pub id: i64,
    /// Account debited or credited.
    pub account: String,
    /// Party the amount is owed by or to.
    pub party: Option<String>,
    /// Debit amount (0 if credit).
    pub debit: Decimal,
    /// Credit amount (0 if debit).
    pub credit: Decimal,
    /// Schema of the voucher that produced the entry.
    pub reference_type: String,
    /// Name of the voucher that produced the entry.
    pub reference_name: String,
    /// Posting date.
    pub date: NaiveDate,
    /// Entry offset by this one.
    pub reverts: Option<i64>,
    /// Whether the entry absorbs a rounding residue.
    pub is_round_off: bool,
}

impl LedgerEntry {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Whether this entry offsets another one.
    #[must_use]
    pub const fn is_reversal(&self) -> bool {
        self.reverts.is_some()
    }
}
