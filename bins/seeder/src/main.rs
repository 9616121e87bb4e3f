//! Sample books seeder for Folio development and testing.
//!
//! Seeds a small chart of accounts, a customer, a supplier and two items,
//! then posts a purchase, two sales and a sales return dated today and
//! logs the profit and loss and the trial balance for the current year.
//! Master data that already exists is left alone; vouchers are only posted
//! into empty books.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use folio_core::document::{DocumentInput, FieldMap, Query, Value, fields};
use folio_core::reports::{
    GeneralLedgerFilters, GroupBy, ProfitLossFilters, ReportData, TrialBalanceFilters,
};
use folio_core::schema::SchemaSet;
use folio_db::{
    DocumentStore, GeneralLedger, PostingService, ProfitAndLoss, ReportRunner, ReportSource,
    StoreError, TrialBalanceReport,
};
use folio_shared::{AppConfig, SchemaConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `(name, type, parent, is_group)`, parents first.
const CHART: &[(&str, &str, Option<&str>, bool)] = &[
    ("Assets", "Asset", None, true),
    ("Debtors", "Receivable", Some("Assets"), false),
    ("Cash", "Asset", Some("Assets"), false),
    ("Liabilities", "Liability", None, true),
    ("Creditors", "Payable", Some("Liabilities"), false),
    ("Income", "Income", None, true),
    ("Sales", "Income", Some("Income"), false),
    ("Expenses", "Expense", None, true),
    ("Cost of Goods", "Expense", Some("Expenses"), false),
    ("Rounded Off", "Round Off", Some("Expenses"), false),
    ("Discounts", "Expense", Some("Expenses"), false),
];

fn load_schemas(config: &SchemaConfig) -> anyhow::Result<SchemaSet> {
    let Some(path) = &config.path else {
        return Ok(SchemaSet::builtin()?);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read schema definitions from {path}"))?;
    Ok(SchemaSet::from_json(&json)?)
}

/// Creates the document unless one with this key exists.
async fn ensure(
    store: &DocumentStore,
    schema: &str,
    name: &str,
    input: DocumentInput,
) -> Result<(), StoreError> {
    match store.get(schema, name).await {
        Ok(_) => {
            info!(schema, name, "already exists, skipping");
            Ok(())
        }
        Err(StoreError::NotFound { .. }) => {
            store.create(schema, input).await?;
            info!(schema, name, "seeded");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

async fn seed_masters(store: &DocumentStore) -> Result<(), StoreError> {
    for (name, account_type, parent, is_group) in CHART {
        let mut input = DocumentInput::new()
            .set("account_name", *name)
            .set("account_type", *account_type)
            .set("is_group", *is_group);
        if let Some(parent) = parent {
            input = input.set("parent_account", *parent);
        }
        ensure(store, "Account", name, input).await?;
    }

    for (name, party_type) in [("Acme Retail", "Customer"), ("Globex Supply", "Supplier")] {
        let input = DocumentInput::new()
            .set("party_name", name)
            .set("party_type", party_type);
        ensure(store, "Party", name, input).await?;
    }

    for (name, rate) in [("Widget", dec!(25)), ("Gadget", dec!(12.50))] {
        let input = DocumentInput::new()
            .set("item_name", name)
            .set("rate", rate)
            .set("income_account", "Sales")
            .set("expense_account", "Cost of Goods");
        ensure(store, "Item", name, input).await?;
    }
    Ok(())
}

fn line(item: &str, quantity: f64, amount: Decimal, account: &str) -> FieldMap {
    fields([
        ("item", Value::from(item)),
        ("quantity", Value::from(quantity)),
        ("amount", Value::from(amount)),
        ("account", Value::from(account)),
    ])
}

async fn post(
    store: &DocumentStore,
    posting: &PostingService,
    schema: &str,
    input: DocumentInput,
) -> anyhow::Result<()> {
    let draft = store.create(schema, input).await?;
    let doc = posting.submit(store, schema, &draft.name).await?;
    info!(schema, name = %doc.name, status = %doc.status, "posted voucher");
    Ok(())
}

async fn seed_vouchers(
    store: &DocumentStore,
    posting: &PostingService,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let existing = store.query("SalesInvoice", &Query::new()).await?;
    if !existing.is_empty() {
        info!(invoices = existing.len(), "books already have vouchers, skipping");
        return Ok(());
    }

    post(
        store,
        posting,
        "PurchaseInvoice",
        DocumentInput::new()
            .set("party", "Globex Supply")
            .set("account", "Creditors")
            .set("date", today)
            .set("grand_total", dec!(200))
            .row("items", line("Widget", 10.0, dec!(150), "Cost of Goods"))
            .row("items", line("Gadget", 10.0, dec!(50), "Cost of Goods")),
    )
    .await?;

    let sale = |total: Decimal| {
        DocumentInput::new()
            .set("party", "Acme Retail")
            .set("account", "Debtors")
            .set("date", today)
            .set("grand_total", total)
    };
    post(
        store,
        posting,
        "SalesInvoice",
        sale(dec!(100.02))
            .row("items", line("Widget", 4.0, dec!(100), "Sales")),
    )
    .await?;
    post(
        store,
        posting,
        "SalesInvoice",
        sale(dec!(67.50))
            .set("discount_amount", dec!(7.50))
            .row("items", line("Gadget", 6.0, dec!(75), "Sales")),
    )
    .await?;
    post(
        store,
        posting,
        "SalesInvoice",
        sale(dec!(25))
            .set("is_return", true)
            .row("items", line("Widget", 1.0, dec!(25), "Sales")),
    )
    .await?;
    Ok(())
}

fn log_report(title: &str, data: &ReportData) {
    info!(report = title, rows = data.rows.len(), "report");
    for row in &data.rows {
        let cells: Vec<String> = data
            .columns
            .iter()
            .map(|column| {
                let value = row
                    .get(&column.fieldname)
                    .map_or("", |cell| cell.display.as_str());
                format!("{}={value}", column.label)
            })
            .collect();
        info!(report = title, depth = row.depth, "{}", cells.join("  "));
    }
}

async fn run<R: ReportSource>(
    store: &DocumentStore,
    runner: &ReportRunner<R>,
    title: &str,
) -> anyhow::Result<()> {
    let data = runner.get_data(store, false).await?;
    log_report(title, &data);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=debug,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let schemas = Arc::new(load_schemas(&config.schemas)?);
    let store = DocumentStore::open(&config.database, schemas).await?;
    info!(url = %config.database.url, "opened store");

    seed_masters(&store).await?;
    let posting = PostingService::new(config.accounting.clone());
    let today = Utc::now().date_naive();
    seed_vouchers(&store, &posting, today).await?;

    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).context("invalid year")?;
    let year_end = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).context("invalid year")?;

    let profit_loss = ReportRunner::new(
        ProfitAndLoss::new(config.accounting.clone()),
        ProfitLossFilters {
            from_date: year_start,
            to_date: year_end,
            group_by: GroupBy::Item,
        },
    );
    run(&store, &profit_loss, "Profit and Loss").await?;

    let trial_balance = ReportRunner::new(
        TrialBalanceReport::new(config.accounting.clone()),
        TrialBalanceFilters {
            from_date: year_start,
            to_date: year_end,
        },
    );
    run(&store, &trial_balance, "Trial Balance").await?;

    let debtors = ReportRunner::new(
        GeneralLedger::new(config.accounting.clone()),
        GeneralLedgerFilters {
            account: "Debtors".to_string(),
            from_date: year_start,
            to_date: year_end,
        },
    );
    run(&store, &debtors, "General Ledger").await?;

    info!("seeding complete");
    Ok(())
}
