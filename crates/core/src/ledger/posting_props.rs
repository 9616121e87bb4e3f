//! Property-based tests for the posting engine and reversals.
//!
//! These tests validate the correctness properties of postings: every
//! committed posting balances and a reversal exactly mirrors its original.

use chrono::NaiveDate;
use folio_shared::AccountingConfig;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::engine::{AccountInfo, PostingEngine};
use super::entry::LedgerEntry;
use super::error::LedgerError;
use super::reversal::ReversalService;
use super::voucher::{Voucher, VoucherLine};
use crate::schema::VoucherKind;

/// Strategy for generating random non-negative amounts with 2 decimals.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating an exchange rate between 1 and 20 with 4 decimals.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (10_000i64..200_000i64).prop_map(|n| Decimal::new(n, 4))
}

fn lookup(name: &str) -> Result<AccountInfo, LedgerError> {
    Ok(AccountInfo {
        name: name.to_string(),
        is_group: false,
    })
}

fn voucher(
    kind: VoucherKind,
    is_return: bool,
    lines: &[Decimal],
    discount: Decimal,
    rate: Decimal,
    residue_cents: i64,
) -> Voucher {
    let gross: Decimal = lines.iter().sum();
    Voucher {
        name: "V-00001".into(),
        reference_type: "SalesInvoice".into(),
        kind,
        is_return,
        date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        party: Some("Acme".into()),
        account: "Debtors".into(),
        exchange_rate: rate,
        grand_total: (gross - discount + Decimal::new(residue_cents, 2)).max(Decimal::ZERO),
        discount_amount: discount,
        lines: lines
            .iter()
            .enumerate()
            .map(|(i, amount)| VoucherLine {
                account: format!("Income {i}"),
                amount: *amount,
            })
            .collect(),
    }
}

fn committed(posting: &super::Posting) -> Vec<LedgerEntry> {
    posting
        .entries()
        .iter()
        .zip(1..)
        .map(|(e, id)| LedgerEntry {
            id,
            account: e.account.clone(),
            party: e.party.clone(),
            debit: e.debit,
            credit: e.credit,
            reference_type: posting.reference_type.clone(),
            reference_name: posting.reference_name.clone(),
            date: posting.date,
            reverts: e.reverts,
            is_round_off: e.is_round_off,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: Every posting the engine returns balances exactly.
    ///
    /// *For any* sale or purchase, return or not, with any lines, any
    /// exchange rate and a grand total off by at most the tolerance, the
    /// built posting has total debit == total credit and no negative
    /// amounts.
    #[test]
    fn prop_posting_balances(
        is_sale in any::<bool>(),
        is_return in any::<bool>(),
        lines in prop::collection::vec(arb_amount(), 1..6),
        rate in arb_rate(),
        residue_cents in -1i64..=1i64,
    ) {
        let kind = if is_sale { VoucherKind::Sale } else { VoucherKind::Purchase };
        let voucher = voucher(kind, is_return, &lines, Decimal::ZERO, rate, residue_cents);
        let config = AccountingConfig {
            round_off_tolerance: Decimal::ONE,
            ..AccountingConfig::default()
        };

        match PostingEngine::build_posting(&voucher, &config, lookup) {
            Ok(posting) => {
                prop_assert_eq!(posting.total_debit(), posting.total_credit());
                for entry in posting.entries() {
                    prop_assert!(entry.debit >= Decimal::ZERO);
                    prop_assert!(entry.credit >= Decimal::ZERO);
                    prop_assert!(entry.debit.is_zero() || entry.credit.is_zero());
                }
            }
            // All-zero vouchers have nothing to post.
            Err(LedgerError::InsufficientEntries) => {
                prop_assert!(lines.iter().all(Decimal::is_zero));
            }
            Err(other) => return Err(TestCaseError::fail(format!("unexpected error {other:?}"))),
        }
    }

    /// Property 2: A residue above the tolerance is never absorbed.
    #[test]
    fn prop_residue_above_tolerance_fails(
        lines in prop::collection::vec(arb_amount(), 1..4),
        residue_cents in 6i64..10_000i64,
    ) {
        let voucher = voucher(VoucherKind::Sale, false, &lines, Decimal::ZERO, Decimal::ONE, residue_cents);
        let result = PostingEngine::build_posting(&voucher, &AccountingConfig::default(), lookup);
        let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedPosting { .. }));
        prop_assert!(is_unbalanced);
    }

    /// Property 3: A reversal mirrors the original posting.
    ///
    /// *For any* committed posting, Σ reversal debit == Σ original credit,
    /// Σ reversal credit == Σ original debit, and every reversal entry
    /// points at a distinct original entry on the same account.
    #[test]
    fn prop_reversal_mirrors_original(
        lines in prop::collection::vec(1i64..1_000_000i64, 1..6),
        discount_cents in 0i64..100i64,
    ) {
        let lines: Vec<Decimal> = lines.into_iter().map(|n| Decimal::new(n, 2)).collect();
        let discount = Decimal::new(discount_cents, 2).min(lines.iter().sum());
        let voucher = voucher(VoucherKind::Sale, false, &lines, discount, Decimal::ONE, 0);
        let posting = PostingEngine::build_posting(&voucher, &AccountingConfig::default(), lookup)
            .unwrap();
        let originals = committed(&posting);

        let reversal = ReversalService::reverse_entries(
            &posting.reference_type,
            &posting.reference_name,
            &originals,
        )
        .unwrap();

        prop_assert_eq!(reversal.total_debit(), posting.total_credit());
        prop_assert_eq!(reversal.total_credit(), posting.total_debit());
        prop_assert_eq!(reversal.entries().len(), originals.len());
        for (mirror, original) in reversal.entries().iter().zip(&originals) {
            prop_assert_eq!(mirror.reverts, Some(original.id));
            prop_assert_eq!(&mirror.account, &original.account);
            prop_assert_eq!(mirror.debit, original.credit);
            prop_assert_eq!(mirror.credit, original.debit);
        }
    }
}
