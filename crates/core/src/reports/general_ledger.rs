//! Account statement: the ledger entries of one account with a running
//! balance.
//!
//! Balances are signed, debit positive. The statement opens with the
//! balance of every entry dated before the range.

use chrono::NaiveDate;
use folio_shared::AccountingConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{ReportError, check_range};
use super::types::{Cell, Column, ColumnType, ReportRow};
use crate::ledger::LedgerEntry;

/// Report filters. The date range is half-open: `[from_date, to_date)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneralLedgerFilters {
    /// Account whose entries are listed.
    pub account: String,
    /// First day included.
    pub from_date: NaiveDate,
    /// First day excluded.
    pub to_date: NaiveDate,
}

impl GeneralLedgerFilters {
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

/// One entry of the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Posting date.
    pub date: NaiveDate,
    /// Schema of the voucher.
    pub reference_type: String,
    /// Name of the voucher.
    pub reference_name: String,
    /// Party, if any.
    pub party: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Balance after this entry.
    pub balance: Decimal,
}

/// Entries of an account with opening and closing balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatement {
    /// Balance before the first line.
    pub opening: Decimal,
    /// Lines in posting order.
    pub lines: Vec<StatementLine>,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Balance after the last line.
    pub closing: Decimal,
}

/// Builds the statement from entries already in posting order.
#[must_use]
pub fn build(opening: Decimal, entries: &[LedgerEntry]) -> AccountStatement {
    let mut balance = opening;
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    let lines = entries
        .iter()
        .map(|entry| {
            balance += entry.signed_amount();
            total_debit += entry.debit;
            total_credit += entry.credit;
            StatementLine {
                date: entry.date,
                reference_type: entry.reference_type.clone(),
                reference_name: entry.reference_name.clone(),
                party: entry.party.clone(),
                debit: entry.debit,
                credit: entry.credit,
                balance,
            }
        })
        .collect();

    AccountStatement {
        opening,
        lines,
        total_debit,
        total_credit,
        closing: balance,
    }
}

/// Column metadata.
#[must_use]
pub fn columns() -> Vec<Column> {
    vec![
        Column::new("Date", "date", ColumnType::Text, 100),
        Column::new("Voucher Type", "reference_type", ColumnType::Text, 140),
        Column::new("Voucher", "reference_name", ColumnType::Text, 160),
        Column::new("Party", "party", ColumnType::Text, 160),
        Column::new("Debit", "debit", ColumnType::Currency, 120),
        Column::new("Credit", "credit", ColumnType::Currency, 120),
        Column::new("Balance", "balance", ColumnType::Currency, 120),
    ]
}

/// Formats the statement: opening row, one row per entry, totals, closing.
#[must_use]
pub fn to_report_rows(statement: &AccountStatement, config: &AccountingConfig) -> Vec<ReportRow> {
    let money = |amount| Cell::money(amount, config.currency);
    let summary = |label: &str, balance: Decimal| {
        let mut row = ReportRow::new()
            .cell("reference_type", Cell::text(label))
            .cell("balance", money(balance));
        row.bold = true;
        row
    };

    let mut rows = Vec::with_capacity(statement.lines.len() + 3);
    rows.push(summary("Opening", statement.opening));
    rows.extend(statement.lines.iter().map(|line| {
        ReportRow::new()
            .cell("date", Cell::text(line.date.to_string()))
            .cell("reference_type", Cell::text(line.reference_type.clone()))
            .cell("reference_name", Cell::text(line.reference_name.clone()))
            .cell("party", Cell::text(line.party.clone().unwrap_or_default()))
            .cell("debit", money(line.debit))
            .cell("credit", money(line.credit))
            .cell("balance", money(line.balance))
    }));

    let mut total = ReportRow::new()
        .cell("reference_type", Cell::text("Total"))
        .cell("debit", money(statement.total_debit))
        .cell("credit", money(statement.total_credit));
    total.bold = true;
    rows.push(total);
    rows.push(summary("Closing", statement.closing));
    rows
}
