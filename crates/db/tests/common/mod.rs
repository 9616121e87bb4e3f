//! Shared fixtures for the store, posting and report tests.

#![allow(dead_code)]

use std::sync::Arc;

use folio_core::document::{Document, DocumentInput, FieldMap, Value, fields};
use folio_core::schema::SchemaSet;
use folio_db::{DocumentStore, connect};
use folio_shared::DatabaseConfig;
use rust_decimal::Decimal;

/// Opens a fresh store on a private in-memory database.
pub async fn open_store() -> DocumentStore {
    let db = connect(&DatabaseConfig::in_memory()).await.unwrap();
    DocumentStore::new(db, Arc::new(SchemaSet::builtin().unwrap()))
        .await
        .unwrap()
}

/// Creates an account, optionally under a group.
pub async fn account(
    store: &DocumentStore,
    name: &str,
    account_type: &str,
    parent: Option<&str>,
    is_group: bool,
) -> Document {
    let mut input = DocumentInput::new()
        .set("account_name", name)
        .set("account_type", account_type)
        .set("is_group", is_group);
    if let Some(parent) = parent {
        input = input.set("parent_account", parent);
    }
    store.create("Account", input).await.unwrap()
}

/// Seeds a small chart of accounts with round-off and discount accounts.
///
/// ```text
/// Assets (group)        Income (group)      Expenses (group)
///   Debtors               Sales               Cost of Goods
///                                             Rounded Off
///                                             Discounts
/// Liabilities (group)
///   Creditors
/// ```
pub async fn seed_chart(store: &DocumentStore) {
    account(store, "Assets", "Asset", None, true).await;
    account(store, "Debtors", "Receivable", Some("Assets"), false).await;
    account(store, "Liabilities", "Liability", None, true).await;
    account(store, "Creditors", "Payable", Some("Liabilities"), false).await;
    account(store, "Income", "Income", None, true).await;
    account(store, "Sales", "Income", Some("Income"), false).await;
    account(store, "Expenses", "Expense", None, true).await;
    account(store, "Cost of Goods", "Expense", Some("Expenses"), false).await;
    account(store, "Rounded Off", "Round Off", Some("Expenses"), false).await;
    account(store, "Discounts", "Expense", Some("Expenses"), false).await;
}

/// Seeds one customer, one supplier and two items.
pub async fn seed_masters(store: &DocumentStore) {
    for (party, party_type) in [("Acme", "Customer"), ("Globex", "Supplier")] {
        store
            .create(
                "Party",
                DocumentInput::new()
                    .set("party_name", party)
                    .set("party_type", party_type),
            )
            .await
            .unwrap();
    }
    for item in ["Widget", "Gadget"] {
        store
            .create("Item", DocumentInput::new().set("item_name", item))
            .await
            .unwrap();
    }
}

/// Opens a store with the chart and master data in place.
pub async fn seeded_store() -> DocumentStore {
    let store = open_store().await;
    seed_chart(&store).await;
    seed_masters(&store).await;
    store
}

/// An invoice line: item, quantity, amount and account.
pub fn line(item: &str, quantity: f64, amount: Decimal, account: &str) -> FieldMap {
    fields([
        ("item", Value::from(item)),
        ("quantity", Value::from(quantity)),
        ("amount", Value::from(amount)),
        ("account", Value::from(account)),
    ])
}

/// A draft sales invoice to `Acme` on the `Debtors` account.
pub fn sales_invoice(date: &str, grand_total: Decimal, items: Vec<FieldMap>) -> DocumentInput {
    DocumentInput::new()
        .set("party", "Acme")
        .set("account", "Debtors")
        .set("date", date)
        .set("grand_total", grand_total)
        .table("items", items)
}

/// A draft purchase invoice from `Globex` on the `Creditors` account.
pub fn purchase_invoice(date: &str, grand_total: Decimal, items: Vec<FieldMap>) -> DocumentInput {
    DocumentInput::new()
        .set("party", "Globex")
        .set("account", "Creditors")
        .set("date", date)
        .set("grand_total", grand_total)
        .table("items", items)
}
