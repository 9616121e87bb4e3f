//! Posting engine: turns a voucher into a balanced posting.
//!
//! This module provides the core business logic for building postings
//! before they are persisted. It is pure: accounts are resolved through a
//! caller-supplied lookup so the engine never touches storage.

use folio_shared::AccountingConfig;
use rust_decimal::Decimal;
use tracing::debug;

use super::entry::EntryType;
use super::error::LedgerError;
use super::posting::Posting;
use super::voucher::Voucher;
use crate::currency::convert_amount;
use crate::schema::VoucherKind;

/// Information about an account needed for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account name.
    pub name: String,
    /// Group accounts aggregate children and take no entries.
    pub is_group: bool,
}

/// Stateless posting builder.
pub struct PostingEngine;

impl PostingEngine {
    /// Builds the posting for a voucher.
    ///
    /// This function performs all validation and resolution steps:
    /// 1. Validates every referenced account (exists, not a group)
    /// 2. Posts the header on the voucher account with the party
    ///    (sale: debit, purchase: credit) and each non-zero line on the
    ///    opposite side
    /// 3. Posts a positive discount on the discount account, header side
    /// 4. Swaps every side for return vouchers
    /// 5. Converts amounts to base currency using Banker's Rounding
    /// 6. Absorbs a residue within tolerance with a round-off entry
    /// 7. Validates the posting (two entries, no negatives, exact balance)
    ///
    /// # Arguments
    ///
    /// * `voucher` - The voucher to post
    /// * `config` - Currency, round-off and discount settings
    /// * `account_lookup` - Function to resolve an account by name
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if validation fails; nothing has been written.
    pub fn build_posting<A>(
        voucher: &Voucher,
        config: &AccountingConfig,
        account_lookup: A,
    ) -> Result<Posting, LedgerError>
    where
        A: Fn(&str) -> Result<AccountInfo, LedgerError>,
    {
        let check_account = |name: &str| -> Result<(), LedgerError> {
            let info = account_lookup(name)?;
            if info.is_group {
                return Err(LedgerError::GroupAccount(info.name));
            }
            Ok(())
        };

        // 1. Validate accounts
        check_account(&voucher.account)?;
        for line in &voucher.lines {
            check_account(&line.account)?;
        }
        let discount_account = if voucher.discount_amount > Decimal::ZERO {
            let account = config.discount_account.as_deref().ok_or_else(|| {
                LedgerError::MissingAccount {
                    voucher: voucher.name.clone(),
                    role: "discount".into(),
                }
            })?;
            check_account(account)?;
            Some(account)
        } else {
            None
        };

        // 2-4. Sides
        let mut header_side = match voucher.kind {
            VoucherKind::Sale => EntryType::Debit,
            VoucherKind::Purchase => EntryType::Credit,
        };
        if voucher.is_return {
            header_side = header_side.opposite();
        }
        let line_side = header_side.opposite();

        // 5. Base currency amounts
        let precision = config.precision();
        let base = |amount: Decimal| convert_amount(amount, voucher.exchange_rate, precision);

        let mut posting = Posting::new(&voucher.reference_type, &voucher.name, voucher.date);
        posting.add(
            &voucher.account,
            voucher.party.as_deref(),
            header_side,
            base(voucher.grand_total),
        )?;
        for line in &voucher.lines {
            posting.add(&line.account, None, line_side, base(line.amount))?;
        }
        if let Some(account) = discount_account {
            posting.add(account, None, header_side, base(voucher.discount_amount))?;
        }

        // 6. Round-off
        let round_off_account = config.round_off_account.as_deref();
        if !posting.residue().is_zero()
            && let Some(account) = round_off_account
        {
            check_account(account)?;
        }
        if let Some(residue) =
            posting.make_round_off_entry(round_off_account, config.round_off_tolerance)?
        {
            debug!(voucher = %voucher.name, %residue, "absorbed round-off residue");
        }

        // 7. Final validation
        posting.validate()?;
        Ok(posting)
    }
}
