//! Report generation.
//!
//! This module provides pure business logic for the reports:
//! - Column and cell types with raw and display values
//! - Profit and loss by item, party or account
//! - Trial balance over the account tree
//! - Account statement with a running balance
//!
//! Fetching rows and caching results lives in `folio-db`.

pub mod error;
pub mod general_ledger;
pub mod profit_loss;
pub mod trial_balance;
pub mod types;

pub use error::ReportError;
pub use general_ledger::{AccountStatement, GeneralLedgerFilters, StatementLine};
pub use profit_loss::{GroupBy, InvoiceLine, ProfitLossFilters, ProfitLossRow};
pub use trial_balance::{AccountNode, TrialBalance, TrialBalanceFilters, TrialBalanceLine};
pub use types::{Align, Cell, CellValue, Column, ColumnType, ReportData, ReportRow};
