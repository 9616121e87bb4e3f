//! Account statement over the ledger.

use std::sync::Arc;

use async_trait::async_trait;
use folio_core::ledger::{ACCOUNT_SCHEMA, LEDGER_COLLECTION};
use folio_core::reports::general_ledger::{self, GeneralLedgerFilters};
use folio_core::reports::{Column, ReportRow};
use folio_shared::AccountingConfig;
use tracing::debug;

use super::error::ReportRunError;
use super::runner::ReportSource;
use crate::store::DocumentStore;

/// Entries of one account with a running balance.
///
/// Reversals are listed next to the entries they offset, so a cancelled
/// voucher shows both sides and nets to zero.
#[derive(Debug, Clone)]
pub struct GeneralLedger {
    config: Arc<AccountingConfig>,
}

impl GeneralLedger {
    /// Creates the report source.
    #[must_use]
    pub fn new(config: AccountingConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl ReportSource for GeneralLedger {
    type Filters = GeneralLedgerFilters;

    fn name(&self) -> &'static str {
        "general_ledger"
    }

    fn watched(&self) -> Vec<String> {
        vec![ACCOUNT_SCHEMA.to_string(), LEDGER_COLLECTION.to_string()]
    }

    fn columns(&self, _filters: &GeneralLedgerFilters) -> Vec<Column> {
        general_ledger::columns()
    }

    async fn rows(
        &self,
        store: &DocumentStore,
        filters: &GeneralLedgerFilters,
    ) -> Result<Vec<ReportRow>, ReportRunError> {
        filters.validate()?;
        let ledger = store.ledger();
        let opening = ledger
            .balance_before(&filters.account, filters.from_date)
            .await?;
        let entries = ledger
            .by_account(&filters.account, filters.from_date, filters.to_date)
            .await?;
        debug!(account = %filters.account, entries = entries.len(), "fetched account entries");

        let statement = general_ledger::build(opening, &entries);
        Ok(general_ledger::to_report_rows(&statement, &self.config))
    }
}
