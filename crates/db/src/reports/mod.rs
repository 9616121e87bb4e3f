//! Report runner and the report sources over the document store.
//!
//! The aggregation itself is pure and lives in `folio-core::reports`; the
//! sources here fetch rows with pushed-down queries and the runner caches
//! results against the store's change versions.

pub mod error;
pub mod general_ledger;
pub mod profit_loss;
pub mod runner;
pub mod trial_balance;

pub use error::ReportRunError;
pub use general_ledger::GeneralLedger;
pub use profit_loss::ProfitAndLoss;
pub use runner::{ReportRunner, ReportSource};
pub use trial_balance::TrialBalanceReport;
