//! Integration tests for submitting and cancelling vouchers.

mod common;

use chrono::NaiveDate;
use common::{line, purchase_invoice, sales_invoice, seeded_store};
use folio_core::document::{DocStatus, DocumentInput};
use folio_core::ledger::{LEDGER_COLLECTION, LedgerEntry, LedgerError};
use folio_db::{DocumentStore, PostingError, PostingService, StoreError};
use folio_shared::AccountingConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::ConnectionTrait;

fn service() -> PostingService {
    PostingService::new(AccountingConfig::default())
}

async fn draft(store: &DocumentStore, input: DocumentInput) -> String {
    store.create("SalesInvoice", input).await.unwrap().name
}

fn totals(entries: &[LedgerEntry]) -> (Decimal, Decimal) {
    entries.iter().fold((Decimal::ZERO, Decimal::ZERO), |(d, c), e| {
        (d + e.debit, c + e.credit)
    })
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_submit_posts_balanced_entries() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice(
            "2026-01-10",
            dec!(150),
            vec![
                line("Widget", 1.0, dec!(100), "Sales"),
                line("Gadget", 2.0, dec!(50), "Sales"),
            ],
        ),
    )
    .await;
    let before = store.version(LEDGER_COLLECTION);

    let doc = service().submit(&store, "SalesInvoice", &name).await.unwrap();

    assert_eq!(doc.status, DocStatus::Submitted);
    let entries = store.ledger().by_reference("SalesInvoice", &name).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(totals(&entries), (dec!(150), dec!(150)));

    let receivable = &entries[0];
    assert_eq!(receivable.account, "Debtors");
    assert_eq!(receivable.party.as_deref(), Some("Acme"));
    assert_eq!(receivable.debit, dec!(150));
    assert_eq!(receivable.date, date("2026-01-10"));
    assert!(entries[1..].iter().all(|e| e.account == "Sales" && e.debit.is_zero()));
    assert!(store.version(LEDGER_COLLECTION) > before);
}

#[tokio::test]
async fn test_purchase_posts_payable_side() {
    let store = seeded_store().await;
    let name = store
        .create(
            "PurchaseInvoice",
            purchase_invoice(
                "2026-01-05",
                dec!(80),
                vec![line("Widget", 4.0, dec!(80), "Cost of Goods")],
            ),
        )
        .await
        .unwrap()
        .name;

    service().submit(&store, "PurchaseInvoice", &name).await.unwrap();

    let entries = store.ledger().by_reference("PurchaseInvoice", &name).await.unwrap();
    let payable = entries.iter().find(|e| e.account == "Creditors").unwrap();
    let expense = entries.iter().find(|e| e.account == "Cost of Goods").unwrap();
    assert_eq!(payable.credit, dec!(80));
    assert_eq!(payable.party.as_deref(), Some("Globex"));
    assert_eq!(expense.debit, dec!(80));
}

#[tokio::test]
async fn test_exchange_rate_converts_every_entry() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice(
            "2026-01-11",
            dec!(100),
            vec![
                line("Widget", 1.0, dec!(60), "Sales"),
                line("Gadget", 1.0, dec!(40), "Sales"),
            ],
        )
        .set("exchange_rate", "1.234567891"),
    )
    .await;

    let stored = store.get("SalesInvoice", &name).await.unwrap();
    assert_eq!(stored.currency("exchange_rate"), Some(dec!(1.234567891)));

    service().submit(&store, "SalesInvoice", &name).await.unwrap();

    let entries = store.ledger().by_reference("SalesInvoice", &name).await.unwrap();
    let receivable = entries.iter().find(|e| e.account == "Debtors").unwrap();
    assert_eq!(receivable.debit, dec!(123.46));
    // 74.07 + 49.38 leaves a residue of 0.01, absorbed as round-off.
    let round_off = entries.iter().find(|e| e.is_round_off).unwrap();
    assert_eq!(round_off.account, "Rounded Off");
    assert_eq!(round_off.credit, dec!(0.01));
    assert_eq!(totals(&entries), (dec!(123.46), dec!(123.46)));
}

#[tokio::test]
async fn test_over_precise_exchange_rate_rejected() {
    let store = seeded_store().await;

    let err = store
        .create(
            "SalesInvoice",
            sales_invoice("2026-01-11", dec!(10), vec![line("Widget", 1.0, dec!(10), "Sales")])
                .set("exchange_rate", "1.23456789012345678"),
        )
        .await
        .unwrap_err();

    match err {
        StoreError::Validation(e) => assert_eq!(e.field, "exchange_rate"),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_return_posts_opposite_sides() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-12", dec!(40), vec![line("Widget", 1.0, dec!(40), "Sales")])
            .set("is_return", true),
    )
    .await;

    service().submit(&store, "SalesInvoice", &name).await.unwrap();

    let entries = store.ledger().by_reference("SalesInvoice", &name).await.unwrap();
    let receivable = entries.iter().find(|e| e.account == "Debtors").unwrap();
    let income = entries.iter().find(|e| e.account == "Sales").unwrap();
    assert_eq!(receivable.credit, dec!(40));
    assert_eq!(income.debit, dec!(40));
}

#[tokio::test]
async fn test_discount_is_posted_on_header_side() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-12", dec!(90), vec![line("Widget", 1.0, dec!(100), "Sales")])
            .set("discount_amount", dec!(10)),
    )
    .await;

    service().submit(&store, "SalesInvoice", &name).await.unwrap();

    let entries = store.ledger().by_reference("SalesInvoice", &name).await.unwrap();
    let discount = entries.iter().find(|e| e.account == "Discounts").unwrap();
    assert_eq!(discount.debit, dec!(10));
    assert_eq!(totals(&entries), (dec!(100), dec!(100)));
    assert!(!entries.iter().any(|e| e.is_round_off));
}

#[tokio::test]
async fn test_residue_within_tolerance_is_rounded_off() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-10", dec!(100.03), vec![line("Widget", 1.0, dec!(100), "Sales")]),
    )
    .await;

    service().submit(&store, "SalesInvoice", &name).await.unwrap();

    let entries = store.ledger().by_reference("SalesInvoice", &name).await.unwrap();
    let round_off: Vec<_> = entries.iter().filter(|e| e.is_round_off).collect();
    assert_eq!(round_off.len(), 1);
    assert_eq!(round_off[0].account, "Rounded Off");
    assert_eq!(round_off[0].credit, dec!(0.03));
    assert_eq!(totals(&entries), (dec!(100.03), dec!(100.03)));
}

#[tokio::test]
async fn test_residue_above_tolerance_persists_nothing() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-10", dec!(101), vec![line("Widget", 1.0, dec!(100), "Sales")]),
    )
    .await;
    let before = store.version(LEDGER_COLLECTION);

    let err = service()
        .submit(&store, "SalesInvoice", &name)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PostingError::Ledger(LedgerError::UnbalancedPosting { .. })
    ));
    assert!(store
        .ledger()
        .by_reference("SalesInvoice", &name)
        .await
        .unwrap()
        .is_empty());
    let doc = store.get("SalesInvoice", &name).await.unwrap();
    assert_eq!(doc.status, DocStatus::Draft);
    assert_eq!(store.version(LEDGER_COLLECTION), before);
}

#[tokio::test]
async fn test_group_account_cannot_be_posted_to() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-10", dec!(10), vec![line("Widget", 1.0, dec!(10), "Income")]),
    )
    .await;

    let err = service()
        .submit(&store, "SalesInvoice", &name)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PostingError::Ledger(LedgerError::GroupAccount(ref a)) if a == "Income"
    ));
}

#[tokio::test]
async fn test_submit_twice_rejected() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-10", dec!(10), vec![line("Widget", 1.0, dec!(10), "Sales")]),
    )
    .await;
    service().submit(&store, "SalesInvoice", &name).await.unwrap();

    let err = service()
        .submit(&store, "SalesInvoice", &name)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PostingError::Ledger(LedgerError::InvalidStateTransition { .. })
    ));
    assert_eq!(
        store.ledger().by_reference("SalesInvoice", &name).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_cancel_appends_mirror_entries() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-10", dec!(100.02), vec![line("Widget", 1.0, dec!(100), "Sales")]),
    )
    .await;
    service().submit(&store, "SalesInvoice", &name).await.unwrap();
    let originals = store.ledger().by_reference("SalesInvoice", &name).await.unwrap();

    let doc = service().cancel(&store, "SalesInvoice", &name).await.unwrap();

    assert_eq!(doc.status, DocStatus::Cancelled);
    let entries = store.ledger().by_reference("SalesInvoice", &name).await.unwrap();
    assert_eq!(entries.len(), originals.len() * 2);
    for original in &originals {
        let mirror = entries
            .iter()
            .find(|e| e.reverts == Some(original.id))
            .unwrap();
        assert_eq!(mirror.account, original.account);
        assert_eq!(mirror.party, original.party);
        assert_eq!(mirror.debit, original.credit);
        assert_eq!(mirror.credit, original.debit);
        assert_eq!(mirror.date, original.date);
        assert_eq!(mirror.is_round_off, original.is_round_off);
    }

    let balances = store
        .ledger()
        .balances(date("2026-01-01"), date("2026-02-01"))
        .await
        .unwrap();
    assert!(balances.iter().all(|b| b.net().is_zero()));

    let err = service()
        .cancel(&store, "SalesInvoice", &name)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PostingError::Ledger(LedgerError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn test_cancel_draft_rejected() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-10", dec!(10), vec![line("Widget", 1.0, dec!(10), "Sales")]),
    )
    .await;

    let err = service()
        .cancel(&store, "SalesInvoice", &name)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PostingError::Ledger(LedgerError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn test_posted_documents_cannot_be_deleted() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-10", dec!(10), vec![line("Widget", 1.0, dec!(10), "Sales")]),
    )
    .await;
    service().submit(&store, "SalesInvoice", &name).await.unwrap();
    service().cancel(&store, "SalesInvoice", &name).await.unwrap();
    let entries = store.ledger().by_reference("SalesInvoice", &name).await.unwrap();
    let ledger_version = store.version(LEDGER_COLLECTION);

    for (schema, key) in [
        ("SalesInvoice", name.as_str()),
        ("Account", "Sales"),
        ("Party", "Acme"),
    ] {
        let before = store.get(schema, key).await.unwrap();
        let version = store.version(schema);

        let err = store.delete(schema, key).await.unwrap_err();
        match err {
            StoreError::ReferentialIntegrity { referenced_by, .. } => {
                assert_eq!(referenced_by, LEDGER_COLLECTION, "{schema} {key}");
            }
            other => panic!("expected ReferentialIntegrity for {schema}, got {other:?}"),
        }

        assert_eq!(store.get(schema, key).await.unwrap(), before, "{schema} {key}");
        assert_eq!(store.version(schema), version);
    }

    let invoice = store.get("SalesInvoice", &name).await.unwrap();
    assert_eq!(invoice.rows("items").len(), 1);
    assert_eq!(invoice.status, DocStatus::Cancelled);
    assert_eq!(
        store.ledger().by_reference("SalesInvoice", &name).await.unwrap(),
        entries
    );
    assert_eq!(entries.len(), 4);
    assert_eq!(store.version(LEDGER_COLLECTION), ledger_version);
}

#[tokio::test]
async fn test_ledger_is_append_only() {
    let store = seeded_store().await;
    let name = draft(
        &store,
        sales_invoice("2026-01-10", dec!(10), vec![line("Widget", 1.0, dec!(10), "Sales")]),
    )
    .await;
    service().submit(&store, "SalesInvoice", &name).await.unwrap();

    let conn = store.connection();
    assert!(conn
        .execute_unprepared("UPDATE ledger_entries SET debit = '0'")
        .await
        .is_err());
    assert!(conn
        .execute_unprepared("DELETE FROM ledger_entries")
        .await
        .is_err());
    assert_eq!(
        store.ledger().by_reference("SalesInvoice", &name).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_account_history_and_balances() {
    let store = seeded_store().await;
    for (day, total) in [("2026-01-10", dec!(10)), ("2026-02-10", dec!(25))] {
        let name = draft(
            &store,
            sales_invoice(day, total, vec![line("Widget", 1.0, total, "Sales")]),
        )
        .await;
        service().submit(&store, "SalesInvoice", &name).await.unwrap();
    }

    let january = store
        .ledger()
        .by_account("Debtors", date("2026-01-01"), date("2026-02-01"))
        .await
        .unwrap();
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].debit, dec!(10));

    let balances = store
        .ledger()
        .balances(date("2026-01-01"), date("2026-03-01"))
        .await
        .unwrap();
    let debtors = balances.iter().find(|b| b.account == "Debtors").unwrap();
    let sales = balances.iter().find(|b| b.account == "Sales").unwrap();
    assert_eq!(debtors.net(), dec!(35));
    assert_eq!(sales.net(), dec!(-35));
}
