//! Reversal of committed postings.
//!
//! Cancelling a voucher never deletes or edits its entries. Instead a
//! mirror posting is appended: every original entry gets an offsetting
//! entry with debit and credit swapped whose `reverts` points back at it.

use super::entry::{LedgerEntry, PostingEntry};
use super::error::LedgerError;
use super::posting::Posting;

/// Stateless service for creating reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Create reversing entries by swapping debits and credits.
    ///
    /// For each original (non-reversal) entry:
    /// - Debits become credits
    /// - Credits become debits
    /// - Account, party, date and reference are preserved
    /// - `reverts` is set to the original entry's id
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NothingToReverse` when there are no original
    /// entries, or the validation error of the mirror posting.
    pub fn reverse_entries(
        reference_type: &str,
        reference_name: &str,
        entries: &[LedgerEntry],
    ) -> Result<Posting, LedgerError> {
        let mut originals = entries.iter().filter(|e| !e.is_reversal()).peekable();
        let Some(first) = originals.peek() else {
            return Err(LedgerError::NothingToReverse(reference_name.to_string()));
        };

        let mut posting = Posting::new(reference_type, reference_name, first.date);
        for entry in originals {
            posting.push(PostingEntry {
                account: entry.account.clone(),
                party: entry.party.clone(),
                debit: entry.credit,
                credit: entry.debit,
                is_round_off: entry.is_round_off,
                reverts: Some(entry.id),
            });
        }

        posting.validate()?;
        Ok(posting)
    }
}
