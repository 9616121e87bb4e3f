//! Profit and loss by item, party or account.
//!
//! Revenue comes from sales invoice lines; cost of goods sold is the sold
//! quantity priced at the item's average purchase cost. Return invoices
//! count negatively on both sides.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use folio_shared::AccountingConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{ReportError, check_range};
use super::types::{Cell, Column, ColumnType, ReportRow};
use crate::currency::round_amount;

/// Dimension the report groups sales by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Per item sold.
    #[default]
    Item,
    /// Per customer.
    Party,
    /// Per income account.
    Account,
}

/// Report filters. The date range is half-open: `[from_date, to_date)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfitLossFilters {
    /// First day included.
    pub from_date: NaiveDate,
    /// First day excluded.
    pub to_date: NaiveDate,
    /// Grouping dimension.
    #[serde(default)]
    pub group_by: GroupBy,
}

impl ProfitLossFilters {
    /// Checks the date range.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` when `from_date` is after
    /// `to_date`.
    pub fn validate(&self) -> Result<(), ReportError> {
        check_range(self.from_date, self.to_date)
    }
}

/// One invoice line joined with the header fields the report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    /// Invoice name.
    pub parent: String,
    /// Customer or supplier.
    pub party: Option<String>,
    /// Item sold or bought.
    pub item: String,
    /// Income or expense account.
    pub account: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Line amount.
    pub amount: Decimal,
    /// Whether the invoice is a return.
    pub is_return: bool,
}

impl InvoiceLine {
    const fn sign(&self) -> Decimal {
        if self.is_return {
            Decimal::NEGATIVE_ONE
        } else {
            Decimal::ONE
        }
    }

    fn key(&self, group_by: GroupBy) -> String {
        match group_by {
            GroupBy::Item => self.item.clone(),
            GroupBy::Party => self.party.clone().unwrap_or_default(),
            GroupBy::Account => self.account.clone().unwrap_or_default(),
        }
    }
}

/// One aggregated group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLossRow {
    /// Item, party or account.
    pub key: String,
    /// Net quantity sold.
    pub quantity: Decimal,
    /// Net revenue.
    pub revenue: Decimal,
    /// Cost of goods sold.
    pub cogs: Decimal,
    /// Revenue minus cost.
    pub profit: Decimal,
    /// Profit as a percentage of revenue.
    pub margin: Decimal,
    /// Share of total profit, in percent.
    pub contribution: Decimal,
}

/// Average purchase cost per item: `total_amount / total_quantity`,
/// rounded to `cost_precision`. Items with zero net quantity cost zero.
#[must_use]
pub fn average_costs(purchases: &[InvoiceLine], cost_precision: u32) -> BTreeMap<String, Decimal> {
    let mut totals: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for line in purchases {
        let (amount, quantity) = totals.entry(line.item.as_str()).or_default();
        *amount += line.sign() * line.amount;
        *quantity += line.sign() * line.quantity;
    }

    totals
        .into_iter()
        .map(|(item, (amount, quantity))| {
            let cost = if quantity.is_zero() {
                Decimal::ZERO
            } else {
                round_amount(amount / quantity, cost_precision)
            };
            (item.to_string(), cost)
        })
        .collect()
}

/// Groups sales lines and computes profit, margin and contribution.
///
/// Rows are ordered by profit descending, ties by key ascending.
#[must_use]
pub fn aggregate(
    sales: &[InvoiceLine],
    costs: &BTreeMap<String, Decimal>,
    group_by: GroupBy,
    config: &AccountingConfig,
) -> Vec<ProfitLossRow> {
    let precision = config.precision();
    let mut groups: BTreeMap<String, (Decimal, Decimal, Decimal)> = BTreeMap::new();
    for line in sales {
        let cost = costs.get(&line.item).copied().unwrap_or_default();
        let (quantity, revenue, cogs) = groups.entry(line.key(group_by)).or_default();
        *quantity += line.sign() * line.quantity;
        *revenue += line.sign() * line.amount;
        *cogs += line.sign() * round_amount(line.quantity * cost, precision);
    }

    let total_profit: Decimal = groups
        .values()
        .map(|(_, revenue, cogs)| *revenue - *cogs)
        .sum();

    let mut rows: Vec<ProfitLossRow> = groups
        .into_iter()
        .map(|(key, (quantity, revenue, cogs))| {
            let profit = round_amount(revenue - cogs, precision);
            ProfitLossRow {
                key,
                quantity,
                revenue: round_amount(revenue, precision),
                cogs: round_amount(cogs, precision),
                profit,
                margin: percent_of(profit, revenue),
                contribution: percent_of(profit, total_profit),
            }
        })
        .collect();

    rows.sort_by(|a, b| match b.profit.cmp(&a.profit) {
        Ordering::Equal => a.key.cmp(&b.key),
        other => other,
    });
    rows
}

/// `part / whole * 100` rounded to one decimal place; zero when `whole` is.
fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return round_amount(Decimal::ZERO, 1);
    }
    round_amount(part / whole * Decimal::ONE_HUNDRED, 1)
}

/// Column metadata for a grouping.
#[must_use]
pub fn columns(group_by: GroupBy) -> Vec<Column> {
    let key_label = match group_by {
        GroupBy::Item => "Item",
        GroupBy::Party => "Party",
        GroupBy::Account => "Account",
    };
    vec![
        Column::new(key_label, "key", ColumnType::Text, 200),
        Column::new("Quantity", "quantity", ColumnType::Number, 100),
        Column::new("Revenue", "revenue", ColumnType::Currency, 120),
        Column::new("COGS", "cogs", ColumnType::Currency, 120),
        Column::new("Profit", "profit", ColumnType::Currency, 120),
        Column::new("Margin", "margin", ColumnType::Percent, 90),
        Column::new("Contribution", "contribution", ColumnType::Percent, 110),
    ]
}

/// Formats aggregated groups as report rows.
#[must_use]
pub fn to_report_rows(rows: &[ProfitLossRow], config: &AccountingConfig) -> Vec<ReportRow> {
    rows.iter()
        .map(|row| {
            ReportRow::new()
                .cell("key", Cell::text(row.key.clone()))
                .cell("quantity", Cell::number(row.quantity))
                .cell("revenue", Cell::money(row.revenue, config.currency))
                .cell("cogs", Cell::money(row.cogs, config.currency))
                .cell("profit", Cell::money(row.profit, config.currency))
                .cell("margin", Cell::percent(row.margin))
                .cell("contribution", Cell::percent(row.contribution))
        })
        .collect()
}
