//! Integration tests for the report sources and the cached runner.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{line, purchase_invoice, sales_invoice, seeded_store};
use folio_core::document::DocumentInput;
use folio_core::reports::{
    Cell, Column, ColumnType, GeneralLedgerFilters, GroupBy, ProfitLossFilters, ReportData,
    ReportRow, TrialBalanceFilters,
};
use folio_db::{
    DocumentStore, GeneralLedger, PostingService, ProfitAndLoss, ReportRunError, ReportRunner,
    ReportSource, TrialBalanceReport,
};
use folio_shared::AccountingConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Notify;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn january(group_by: GroupBy) -> ProfitLossFilters {
    ProfitLossFilters {
        from_date: date("2026-01-01"),
        to_date: date("2026-02-01"),
        group_by,
    }
}

fn row<'a>(data: &'a ReportData, field: &str, key: &str) -> &'a ReportRow {
    data.rows
        .iter()
        .find(|r| r.get(field).is_some_and(|c| c.display == key))
        .unwrap_or_else(|| panic!("no row {key}"))
}

fn number(row: &ReportRow, field: &str) -> Decimal {
    row.get(field).and_then(Cell::as_decimal).unwrap()
}

async fn post_sale(store: &DocumentStore, input: DocumentInput) -> String {
    let name = store.create("SalesInvoice", input).await.unwrap().name;
    PostingService::new(AccountingConfig::default())
        .submit(store, "SalesInvoice", &name)
        .await
        .unwrap();
    name
}

/// Purchases: Widget 4 @ 20, Gadget 10 @ 5.
/// Sales: Widget 2 for 100 and Gadget 3 for 30, then one Widget returned
/// for 50. A draft and a cancelled invoice must not count.
async fn books() -> DocumentStore {
    let store = seeded_store().await;
    let posting = PostingService::new(AccountingConfig::default());

    let purchase = store
        .create(
            "PurchaseInvoice",
            purchase_invoice(
                "2026-01-03",
                dec!(130),
                vec![
                    line("Widget", 4.0, dec!(80), "Cost of Goods"),
                    line("Gadget", 10.0, dec!(50), "Cost of Goods"),
                ],
            ),
        )
        .await
        .unwrap();
    posting
        .submit(&store, "PurchaseInvoice", &purchase.name)
        .await
        .unwrap();

    post_sale(
        &store,
        sales_invoice(
            "2026-01-10",
            dec!(130),
            vec![
                line("Widget", 2.0, dec!(100), "Sales"),
                line("Gadget", 3.0, dec!(30), "Sales"),
            ],
        ),
    )
    .await;
    post_sale(
        &store,
        sales_invoice("2026-01-20", dec!(50), vec![line("Widget", 1.0, dec!(50), "Sales")])
            .set("is_return", true),
    )
    .await;

    store
        .create(
            "SalesInvoice",
            sales_invoice("2026-01-21", dec!(999), vec![line("Widget", 9.0, dec!(999), "Sales")]),
        )
        .await
        .unwrap();
    let cancelled = post_sale(
        &store,
        sales_invoice("2026-01-22", dec!(500), vec![line("Gadget", 5.0, dec!(500), "Sales")]),
    )
    .await;
    posting
        .cancel(&store, "SalesInvoice", &cancelled)
        .await
        .unwrap();

    store
}

#[tokio::test]
async fn test_profit_and_loss_by_item() {
    let store = books().await;
    let runner = ReportRunner::new(
        ProfitAndLoss::new(AccountingConfig::default()),
        january(GroupBy::Item),
    );

    let data = runner.get_data(&store, false).await.unwrap();

    assert_eq!(data.rows.len(), 2);
    assert_eq!(data.columns[0].label, "Item");

    let widget = &data.rows[0];
    assert_eq!(widget.get("key").unwrap().display, "Widget");
    assert_eq!(number(widget, "quantity"), dec!(1));
    assert_eq!(number(widget, "revenue"), dec!(50));
    assert_eq!(number(widget, "cogs"), dec!(20));
    assert_eq!(number(widget, "profit"), dec!(30));
    assert_eq!(number(widget, "margin"), dec!(60.0));
    assert_eq!(number(widget, "contribution"), dec!(66.7));

    let gadget = row(&data, "key", "Gadget");
    assert_eq!(number(gadget, "revenue"), dec!(30));
    assert_eq!(number(gadget, "cogs"), dec!(15));
    assert_eq!(number(gadget, "profit"), dec!(15));
    assert_eq!(number(gadget, "margin"), dec!(50.0));
    assert_eq!(number(gadget, "contribution"), dec!(33.3));
}

#[tokio::test]
async fn test_profit_and_loss_grouped_by_party() {
    let store = books().await;
    let runner = ReportRunner::new(
        ProfitAndLoss::new(AccountingConfig::default()),
        january(GroupBy::Party),
    );

    let data = runner.get_data(&store, false).await.unwrap();

    assert_eq!(data.rows.len(), 1);
    let acme = row(&data, "key", "Acme");
    assert_eq!(number(acme, "revenue"), dec!(80));
    assert_eq!(number(acme, "profit"), dec!(45));
}

#[tokio::test]
async fn test_profit_and_loss_outside_range_is_empty() {
    let store = books().await;
    let runner = ReportRunner::new(
        ProfitAndLoss::new(AccountingConfig::default()),
        ProfitLossFilters {
            from_date: date("2026-03-01"),
            to_date: date("2026-04-01"),
            group_by: GroupBy::Item,
        },
    );

    let data = runner.get_data(&store, false).await.unwrap();

    assert!(data.rows.is_empty());
}

#[tokio::test]
async fn test_invalid_range_rejected() {
    let store = seeded_store().await;
    let runner = ReportRunner::new(
        ProfitAndLoss::new(AccountingConfig::default()),
        ProfitLossFilters {
            from_date: date("2026-02-01"),
            to_date: date("2026-01-01"),
            group_by: GroupBy::Item,
        },
    );

    let err = runner.get_data(&store, false).await.unwrap_err();

    assert!(matches!(err, ReportRunError::Report(_)));
}

#[tokio::test]
async fn test_cache_reused_until_watched_schema_changes() {
    let store = books().await;
    let runner = ReportRunner::new(
        ProfitAndLoss::new(AccountingConfig::default()),
        january(GroupBy::Item),
    );

    let first = runner.get_data(&store, false).await.unwrap();
    let second = runner.get_data(&store, false).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // Unwatched schema.
    store
        .create(
            "Party",
            DocumentInput::new()
                .set("party_name", "Initech")
                .set("party_type", "Customer"),
        )
        .await
        .unwrap();
    let third = runner.get_data(&store, false).await.unwrap();
    assert!(Arc::ptr_eq(&first, &third));

    post_sale(
        &store,
        sales_invoice("2026-01-25", dec!(40), vec![line("Gadget", 1.0, dec!(40), "Sales")]),
    )
    .await;
    let fourth = runner.get_data(&store, false).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &fourth));
    assert_eq!(number(row(&fourth, "key", "Gadget"), "revenue"), dec!(70));

    let forced = runner.get_data(&store, true).await.unwrap();
    assert!(!Arc::ptr_eq(&fourth, &forced));
    assert_eq!(forced.rows, fourth.rows);
}

#[tokio::test]
async fn test_changing_filters_recomputes() {
    let store = books().await;
    let runner = ReportRunner::new(
        ProfitAndLoss::new(AccountingConfig::default()),
        january(GroupBy::Item),
    );
    let by_item = runner.get_data(&store, false).await.unwrap();

    runner.set_filters(january(GroupBy::Account)).await;
    let by_account = runner.get_data(&store, false).await.unwrap();

    assert!(!Arc::ptr_eq(&by_item, &by_account));
    assert_eq!(by_account.rows.len(), 1);
    assert_eq!(runner.columns().await[0].label, "Account");
    assert_eq!(runner.filters().await.group_by, GroupBy::Account);
}

#[tokio::test]
async fn test_trial_balance_rolls_up_groups() {
    let store = books().await;
    let runner = ReportRunner::new(
        TrialBalanceReport::new(AccountingConfig::default()),
        TrialBalanceFilters {
            from_date: date("2026-01-01"),
            to_date: date("2026-02-01"),
        },
    );

    let data = runner.get_data(&store, false).await.unwrap();

    // Sales 130, return 50, cancelled sale nets to zero.
    let debtors = row(&data, "account", "Debtors");
    assert_eq!(number(debtors, "debit"), dec!(80));
    let assets = row(&data, "account", "Assets");
    assert_eq!(number(assets, "debit"), dec!(80));
    assert!(assets.bold);
    assert_eq!(debtors.depth, 1);

    let income = row(&data, "account", "Income");
    assert_eq!(number(income, "credit"), dec!(80));
    let expenses = row(&data, "account", "Expenses");
    assert_eq!(number(expenses, "debit"), dec!(130));
    let liabilities = row(&data, "account", "Liabilities");
    assert_eq!(number(liabilities, "credit"), dec!(130));

    let total = data.rows.last().unwrap();
    assert_eq!(total.get("account").unwrap().display, "Total");
    assert_eq!(number(total, "debit"), number(total, "credit"));
    assert_eq!(number(total, "debit"), dec!(210));
}

#[tokio::test]
async fn test_trial_balance_cache_follows_ledger() {
    let store = books().await;
    let runner = ReportRunner::new(
        TrialBalanceReport::new(AccountingConfig::default()),
        TrialBalanceFilters {
            from_date: date("2026-01-01"),
            to_date: date("2026-02-01"),
        },
    );
    let before = runner.get_data(&store, false).await.unwrap();

    post_sale(
        &store,
        sales_invoice("2026-01-26", dec!(20), vec![line("Widget", 1.0, dec!(20), "Sales")]),
    )
    .await;
    let after = runner.get_data(&store, false).await.unwrap();

    assert_eq!(number(row(&after, "account", "Debtors"), "debit"), dec!(100));
    assert!(!Arc::ptr_eq(&before, &after));
}

fn debtors_from(from: &str) -> GeneralLedgerFilters {
    GeneralLedgerFilters {
        account: "Debtors".to_string(),
        from_date: date(from),
        to_date: date("2026-02-01"),
    }
}

#[tokio::test]
async fn test_general_ledger_running_balance() {
    let store = books().await;
    let runner = ReportRunner::new(
        GeneralLedger::new(AccountingConfig::default()),
        debtors_from("2026-01-15"),
    );

    let data = runner.get_data(&store, false).await.unwrap();

    // Opening, the return, the cancelled sale and its reversal, total, closing.
    assert_eq!(data.rows.len(), 6);
    let opening = &data.rows[0];
    assert_eq!(opening.get("reference_type").unwrap().display, "Opening");
    assert_eq!(number(opening, "balance"), dec!(130));

    let balances: Vec<_> = data.rows[1..4]
        .iter()
        .map(|r| number(r, "balance"))
        .collect();
    assert_eq!(balances, [dec!(80), dec!(580), dec!(80)]);
    assert_eq!(data.rows[1].get("date").unwrap().display, "2026-01-20");
    assert_eq!(data.rows[1].get("party").unwrap().display, "Acme");
    assert_eq!(
        data.rows[2].get("reference_name").unwrap().display,
        data.rows[3].get("reference_name").unwrap().display
    );

    let total = row(&data, "reference_type", "Total");
    assert_eq!(number(total, "debit"), dec!(500));
    assert_eq!(number(total, "credit"), dec!(550));
    let closing = data.rows.last().unwrap();
    assert_eq!(closing.get("reference_type").unwrap().display, "Closing");
    assert_eq!(number(closing, "balance"), dec!(80));
}

#[tokio::test]
async fn test_general_ledger_cache_follows_ledger() {
    let store = books().await;
    let runner = ReportRunner::new(
        GeneralLedger::new(AccountingConfig::default()),
        debtors_from("2026-01-01"),
    );
    let before = runner.get_data(&store, false).await.unwrap();
    assert_eq!(number(&before.rows[0], "balance"), Decimal::ZERO);

    post_sale(
        &store,
        sales_invoice("2026-01-26", dec!(20), vec![line("Widget", 1.0, dec!(20), "Sales")]),
    )
    .await;
    let after = runner.get_data(&store, false).await.unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.rows.len(), before.rows.len() + 1);
    assert_eq!(number(after.rows.last().unwrap(), "balance"), dec!(100));
}

#[tokio::test]
async fn test_general_ledger_unused_account_is_empty() {
    let store = books().await;
    let runner = ReportRunner::new(
        GeneralLedger::new(AccountingConfig::default()),
        GeneralLedgerFilters {
            account: "Discounts".to_string(),
            from_date: date("2026-01-01"),
            to_date: date("2026-02-01"),
        },
    );

    let data = runner.get_data(&store, false).await.unwrap();

    assert_eq!(data.rows.len(), 3);
    assert_eq!(number(data.rows.last().unwrap(), "balance"), Decimal::ZERO);
}

/// Returns one text cell per call; the first call blocks until released.
struct SlowSource {
    calls: AtomicU64,
    release: Notify,
}

#[async_trait]
impl ReportSource for SlowSource {
    type Filters = u8;

    fn name(&self) -> &'static str {
        "slow"
    }

    fn watched(&self) -> Vec<String> {
        Vec::new()
    }

    fn columns(&self, _filters: &u8) -> Vec<Column> {
        vec![Column::new("Call", "call", ColumnType::Text, 80)]
    }

    async fn rows(
        &self,
        _store: &DocumentStore,
        _filters: &u8,
    ) -> Result<Vec<ReportRow>, ReportRunError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == 1 {
            self.release.notified().await;
        }
        Ok(vec![ReportRow::new().cell("call", Cell::text(call.to_string()))])
    }
}

#[tokio::test]
async fn test_superseded_computation_is_discarded() {
    let store = seeded_store().await;
    let runner = ReportRunner::new(
        SlowSource {
            calls: AtomicU64::new(0),
            release: Notify::new(),
        },
        0,
    );

    let slow = runner.get_data(&store, true);
    let fast = async {
        while runner.source().calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let data = runner.get_data(&store, true).await.unwrap();
        runner.source().release.notify_one();
        data
    };
    let (slow, fast) = tokio::join!(slow, fast);
    let slow = slow.unwrap();

    assert_eq!(fast.rows[0].get("call").unwrap().display, "2");
    assert!(Arc::ptr_eq(&slow, &fast));
    let cached = runner.get_data(&store, false).await.unwrap();
    assert!(Arc::ptr_eq(&cached, &fast));
}
