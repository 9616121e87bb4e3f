//! Report data types.
//!
//! Every numeric cell carries its raw `Decimal` next to the display string
//! so callers can re-sort or export without parsing formatted text.

use std::collections::BTreeMap;

use folio_shared::types::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::round_amount;

/// Kind of data in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Free text or a document name.
    Text,
    /// Money amount.
    Currency,
    /// Plain number (quantities).
    Number,
    /// Percentage with one decimal place.
    Percent,
}

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    /// Left aligned.
    Left,
    /// Right aligned.
    Right,
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Header text.
    pub label: String,
    /// Key of the cell in every row.
    pub fieldname: String,
    /// Kind of data.
    pub column_type: ColumnType,
    /// Alignment.
    pub align: Align,
    /// Relative width.
    pub width: u16,
}

impl Column {
    /// Creates a column; numbers align right, text left.
    #[must_use]
    pub fn new(label: &str, fieldname: &str, column_type: ColumnType, width: u16) -> Self {
        let align = match column_type {
            ColumnType::Text => Align::Left,
            ColumnType::Currency | ColumnType::Number | ColumnType::Percent => Align::Right,
        };
        Self {
            label: label.to_string(),
            fieldname: fieldname.to_string(),
            column_type,
            align,
            width,
        }
    }
}

/// Raw value of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(Decimal),
}

/// A cell: raw value plus formatted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Unformatted value.
    pub raw: CellValue,
    /// Formatted value.
    pub display: String,
}

impl Cell {
    /// Text cell.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            display: value.clone(),
            raw: CellValue::Text(value),
        }
    }

    /// Money cell, e.g. `1,000.00`.
    #[must_use]
    pub fn money(amount: Decimal, currency: Currency) -> Self {
        Self {
            raw: CellValue::Number(amount),
            display: Money::new(amount, currency).display(),
        }
    }

    /// Percent cell with one decimal place, e.g. `40.0%`.
    #[must_use]
    pub fn percent(value: Decimal) -> Self {
        Self {
            raw: CellValue::Number(value),
            display: format!("{}%", round_amount(value, 1)),
        }
    }

    /// Plain number cell.
    #[must_use]
    pub fn number(value: Decimal) -> Self {
        Self {
            raw: CellValue::Number(value),
            display: value.normalize().to_string(),
        }
    }

    /// Numeric raw value, if any.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match &self.raw {
            CellValue::Number(d) => Some(*d),
            CellValue::Text(_) => None,
        }
    }
}

/// One output row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Cells keyed by column fieldname.
    pub cells: BTreeMap<String, Cell>,
    /// Indentation level for tree reports.
    pub depth: usize,
    /// Whether the row is a total or group row.
    pub bold: bool,
}

impl ReportRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell.
    #[must_use]
    pub fn cell(mut self, fieldname: &str, cell: Cell) -> Self {
        self.cells.insert(fieldname.to_string(), cell);
        self
    }

    /// Looks up a cell.
    #[must_use]
    pub fn get(&self, fieldname: &str) -> Option<&Cell> {
        self.cells.get(fieldname)
    }
}

/// A computed report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportData {
    /// Column metadata.
    pub columns: Vec<Column>,
    /// Rows in display order.
    pub rows: Vec<ReportRow>,
}
