//! Account balance accumulation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;

/// Debit and credit totals of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account name.
    pub account: String,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
        }
    }

    /// Adds a debit amount.
    pub fn add_debit(&mut self, amount: Decimal) {
        self.debit_total += amount;
    }

    /// Adds a credit amount.
    pub fn add_credit(&mut self, amount: Decimal) {
        self.credit_total += amount;
    }

    /// Adds both sides of an entry.
    pub fn apply(&mut self, entry: &LedgerEntry) {
        self.add_debit(entry.debit);
        self.add_credit(entry.credit);
    }

    /// Debit minus credit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit_total - self.credit_total
    }

    /// Folds entries into one balance per account, ordered by account name.
    #[must_use]
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Vec<Self> {
        let mut balances = std::collections::BTreeMap::<&str, Self>::new();
        for entry in entries {
            balances
                .entry(entry.account.as_str())
                .or_insert_with(|| Self::new(entry.account.clone()))
                .apply(entry);
        }
        balances.into_values().collect()
    }
}
