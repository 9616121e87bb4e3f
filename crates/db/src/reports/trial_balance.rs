//! Trial balance over the chart of accounts.

use std::sync::Arc;

use async_trait::async_trait;
use folio_core::document::{Query, Value};
use folio_core::ledger::{
    ACCOUNT_IS_GROUP_FIELD, ACCOUNT_PARENT_FIELD, ACCOUNT_SCHEMA, LEDGER_COLLECTION,
};
use folio_core::reports::trial_balance::{self, AccountNode, TrialBalanceFilters};
use folio_core::reports::{Column, ReportRow};
use folio_core::schema::types::NAME_COLUMN;
use folio_shared::AccountingConfig;

use super::error::ReportRunError;
use super::runner::ReportSource;
use crate::store::DocumentStore;

/// Trial balance with group accounts rolled up from their descendants.
#[derive(Debug, Clone)]
pub struct TrialBalanceReport {
    config: Arc<AccountingConfig>,
}

impl TrialBalanceReport {
    /// Creates the report source.
    #[must_use]
    pub fn new(config: AccountingConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl ReportSource for TrialBalanceReport {
    type Filters = TrialBalanceFilters;

    fn name(&self) -> &'static str {
        "trial_balance"
    }

    fn watched(&self) -> Vec<String> {
        vec![ACCOUNT_SCHEMA.to_string(), LEDGER_COLLECTION.to_string()]
    }

    fn columns(&self, _filters: &TrialBalanceFilters) -> Vec<Column> {
        trial_balance::columns()
    }

    async fn rows(
        &self,
        store: &DocumentStore,
        filters: &TrialBalanceFilters,
    ) -> Result<Vec<ReportRow>, ReportRunError> {
        filters.validate()?;
        let accounts: Vec<AccountNode> = store
            .query(
                ACCOUNT_SCHEMA,
                &Query::new().select([NAME_COLUMN, ACCOUNT_PARENT_FIELD, ACCOUNT_IS_GROUP_FIELD]),
            )
            .await?
            .into_iter()
            .filter_map(|row| {
                let name = row.get(NAME_COLUMN).and_then(Value::as_str)?.to_string();
                Some(AccountNode {
                    name,
                    parent: row
                        .get(ACCOUNT_PARENT_FIELD)
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    is_group: row
                        .get(ACCOUNT_IS_GROUP_FIELD)
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                })
            })
            .collect();

        let balances = store
            .ledger()
            .balances(filters.from_date, filters.to_date)
            .await?;
        let report = trial_balance::build(&accounts, &balances);
        Ok(trial_balance::to_report_rows(&report, &self.config))
    }
}
