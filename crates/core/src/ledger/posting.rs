//! In-memory posting builder.
//!
//! A [`Posting`] accumulates the entries of one voucher before they are
//! written together. Nothing here touches storage; the caller commits a
//! validated posting in a single transaction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::{EntryType, PostingEntry};
use super::error::LedgerError;

/// Entries of one voucher awaiting commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Schema of the voucher.
    pub reference_type: String,
    /// Name of the voucher.
    pub reference_name: String,
    /// Posting date of every entry.
    pub date: NaiveDate,
    entries: Vec<PostingEntry>,
}

impl Posting {
    /// Creates an empty posting for a voucher.
    #[must_use]
    pub fn new(reference_type: &str, reference_name: &str, date: NaiveDate) -> Self {
        Self {
            reference_type: reference_type.to_string(),
            reference_name: reference_name.to_string(),
            date,
            entries: Vec::new(),
        }
    }

    /// Debits `account`. Zero amounts are skipped.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` for negative amounts.
    pub fn debit(
        &mut self,
        account: &str,
        party: Option<&str>,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.add(account, party, EntryType::Debit, amount)
    }

    /// Credits `account`. Zero amounts are skipped.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` for negative amounts.
    pub fn credit(
        &mut self,
        account: &str,
        party: Option<&str>,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.add(account, party, EntryType::Credit, amount)
    }

    /// Adds an entry on the given side. Zero amounts are skipped.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` for negative amounts.
    pub fn add(
        &mut self,
        account: &str,
        party: Option<&str>,
        side: EntryType,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(LedgerError::InvalidAmount {
                voucher: self.reference_name.clone(),
                field: account.to_string(),
                amount,
            });
        }
        if !amount.is_zero() {
            self.entries
                .push(PostingEntry::new(account, party, side, amount));
        }
        Ok(())
    }

    /// Appends a prepared entry as is.
    pub fn push(&mut self, entry: PostingEntry) {
        self.entries.push(entry);
    }

    /// Entries in the order they were added.
    #[must_use]
    pub fn entries(&self) -> &[PostingEntry] {
        &self.entries
    }

    /// Consumes the posting, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<PostingEntry> {
        self.entries
    }

    /// Sum of all debits.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.entries.iter().map(|e| e.debit).sum()
    }

    /// Sum of all credits.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.entries.iter().map(|e| e.credit).sum()
    }

    /// Debits minus credits.
    #[must_use]
    pub fn residue(&self) -> Decimal {
        self.total_debit() - self.total_credit()
    }

    /// Balances the posting with a round-off entry when the residue is
    /// within `tolerance`.
    ///
    /// A positive residue (debits exceed credits) credits the round-off
    /// account; a negative one debits it. Returns the absorbed residue, or
    /// `None` when the posting was already balanced.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnbalancedPosting` when the residue exceeds the
    /// tolerance or no round-off account is configured.
    pub fn make_round_off_entry(
        &mut self,
        round_off_account: Option<&str>,
        tolerance: Decimal,
    ) -> Result<Option<Decimal>, LedgerError> {
        let residue = self.residue();
        if residue.is_zero() {
            return Ok(None);
        }

        let account = match round_off_account {
            Some(account) if residue.abs() <= tolerance => account,
            _ => return Err(self.unbalanced(residue, tolerance)),
        };

        let side = if residue.is_sign_positive() {
            EntryType::Credit
        } else {
            EntryType::Debit
        };
        let mut entry = PostingEntry::new(account, None, side, residue.abs());
        entry.is_round_off = true;
        self.entries.push(entry);
        Ok(Some(residue))
    }

    /// Checks the posting can be committed: at least two entries, no
    /// negative amounts, debits exactly equal to credits.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as a `LedgerError`.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.entries.len() < 2 {
            return Err(LedgerError::InsufficientEntries);
        }

        for entry in &self.entries {
            for amount in [entry.debit, entry.credit] {
                if amount.is_sign_negative() && !amount.is_zero() {
                    return Err(LedgerError::InvalidAmount {
                        voucher: self.reference_name.clone(),
                        field: entry.account.clone(),
                        amount,
                    });
                }
            }
        }

        let residue = self.residue();
        if residue.is_zero() {
            Ok(())
        } else {
            Err(self.unbalanced(residue, Decimal::ZERO))
        }
    }

    fn unbalanced(&self, residue: Decimal, tolerance: Decimal) -> LedgerError {
        LedgerError::UnbalancedPosting {
            voucher: self.reference_name.clone(),
            debit: self.total_debit(),
            credit: self.total_credit(),
            residue,
            tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn posting() -> Posting {
        Posting::new(
            "SalesInvoice",
            "SINV-00001",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
    }

    #[test]
    fn test_zero_amounts_are_skipped() {
        let mut p = posting();
        p.debit("Debtors", Some("Acme"), dec!(0)).unwrap();
        p.credit("Sales", None, dec!(0.00)).unwrap();
        assert!(p.entries().is_empty());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut p = posting();
        let err = p.debit("Debtors", None, dec!(-1)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    }

    #[test]
    fn test_balanced_posting_validates() {
        let mut p = posting();
        p.debit("Debtors", Some("Acme"), dec!(100.00)).unwrap();
        p.credit("Sales", None, dec!(60.00)).unwrap();
        p.credit("Services", None, dec!(40.00)).unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.make_round_off_entry(Some("Rounded Off"), dec!(0.05)).unwrap(), None);
        assert_eq!(p.entries().len(), 3);
    }

    #[test]
    fn test_single_entry_rejected() {
        let mut p = posting();
        p.debit("Debtors", None, dec!(10)).unwrap();
        assert!(matches!(p.validate(), Err(LedgerError::InsufficientEntries)));
    }

    #[test]
    fn test_round_off_credits_positive_residue() {
        let mut p = posting();
        p.debit("Debtors", None, dec!(100.03)).unwrap();
        p.credit("Sales", None, dec!(100.00)).unwrap();
        let absorbed = p.make_round_off_entry(Some("Rounded Off"), dec!(0.05)).unwrap();
        assert_eq!(absorbed, Some(dec!(0.03)));

        let round_off = p.entries().last().unwrap();
        assert!(round_off.is_round_off);
        assert_eq!(round_off.account, "Rounded Off");
        assert_eq!(round_off.credit, dec!(0.03));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_round_off_debits_negative_residue() {
        let mut p = posting();
        p.debit("Debtors", None, dec!(99.96)).unwrap();
        p.credit("Sales", None, dec!(100.00)).unwrap();
        p.make_round_off_entry(Some("Rounded Off"), dec!(0.05)).unwrap();
        assert_eq!(p.entries().last().unwrap().debit, dec!(0.04));
        assert_eq!(p.total_debit(), p.total_credit());
    }

    #[test]
    fn test_round_off_at_exact_tolerance() {
        let mut p = posting();
        p.debit("Debtors", None, dec!(100.05)).unwrap();
        p.credit("Sales", None, dec!(100.00)).unwrap();
        assert!(p.make_round_off_entry(Some("Rounded Off"), dec!(0.05)).is_ok());
    }

    #[test]
    fn test_residue_above_tolerance_fails() {
        let mut p = posting();
        p.debit("Debtors", None, dec!(101.00)).unwrap();
        p.credit("Sales", None, dec!(100.00)).unwrap();
        let err = p
            .make_round_off_entry(Some("Rounded Off"), dec!(0.05))
            .unwrap_err();
        match err {
            LedgerError::UnbalancedPosting {
                voucher,
                debit,
                credit,
                residue,
                tolerance,
            } => {
                assert_eq!(voucher, "SINV-00001");
                assert_eq!(debit, dec!(101.00));
                assert_eq!(credit, dec!(100.00));
                assert_eq!(residue, dec!(1.00));
                assert_eq!(tolerance, dec!(0.05));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(p.entries().len(), 2);
    }

    #[test]
    fn test_no_round_off_account_fails() {
        let mut p = posting();
        p.debit("Debtors", None, dec!(100.01)).unwrap();
        p.credit("Sales", None, dec!(100.00)).unwrap();
        assert!(matches!(
            p.make_round_off_entry(None, dec!(0.05)),
            Err(LedgerError::UnbalancedPosting { .. })
        ));
    }
}
