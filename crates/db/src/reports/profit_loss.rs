//! Profit and loss over submitted invoices.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use folio_core::document::{Filter, Query, Row, Value};
use folio_core::reports::profit_loss::{self, InvoiceLine, ProfitLossFilters};
use folio_core::reports::{Column, ReportRow};
use folio_core::schema::FieldType;
use folio_core::schema::registry::{
    LINE_ACCOUNT_FIELD, LINE_AMOUNT_FIELD, VOUCHER_DATE_FIELD, VOUCHER_ITEMS_FIELD,
};
use folio_core::schema::types::{
    CANCELLED_COLUMN, NAME_COLUMN, PARENT_COLUMN, PARENT_FIELD_COLUMN, SUBMITTED_COLUMN,
};
use folio_shared::AccountingConfig;
use rust_decimal::Decimal;
use tracing::debug;

use super::error::ReportRunError;
use super::runner::ReportSource;
use crate::store::{DocumentStore, StoreError};

/// Schema of sales invoices.
pub const SALES_INVOICE: &str = "SalesInvoice";
/// Schema of purchase invoices.
pub const PURCHASE_INVOICE: &str = "PurchaseInvoice";

const PARTY_FIELD: &str = "party";
const IS_RETURN_FIELD: &str = "is_return";
const ITEM_FIELD: &str = "item";
const QUANTITY_FIELD: &str = "quantity";

/// Profit and loss by item, party or account.
///
/// Only submitted, non-cancelled invoices dated inside the range count.
#[derive(Debug, Clone)]
pub struct ProfitAndLoss {
    config: Arc<AccountingConfig>,
}

impl ProfitAndLoss {
    /// Creates the report source.
    #[must_use]
    pub fn new(config: AccountingConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

fn text(row: &Row, field: &str) -> Option<String> {
    row.get(field).and_then(Value::as_str).map(str::to_string)
}

fn amount(row: &Row, field: &str) -> Decimal {
    row.get(field)
        .and_then(Value::as_decimal)
        .unwrap_or_default()
}

/// Fetches the lines of active invoices of one schema in the date range.
async fn invoice_lines(
    store: &DocumentStore,
    schema: &str,
    filters: &ProfitLossFilters,
) -> Result<Vec<InvoiceLine>, ReportRunError> {
    let definition = store.schemas().get(schema).map_err(StoreError::from)?;
    let Some(FieldType::Table { child }) = definition
        .field(VOUCHER_ITEMS_FIELD)
        .map(|field| &field.field_type)
    else {
        return Ok(Vec::new());
    };

    let headers = store
        .query(
            schema,
            &Query::new()
                .filter(Filter::eq(SUBMITTED_COLUMN, true))
                .filter(Filter::eq(CANCELLED_COLUMN, false))
                .filter(Filter::ge(VOUCHER_DATE_FIELD, filters.from_date))
                .filter(Filter::lt(VOUCHER_DATE_FIELD, filters.to_date))
                .select([NAME_COLUMN, PARTY_FIELD, IS_RETURN_FIELD]),
        )
        .await?;
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let invoices: HashMap<String, (Option<String>, bool)> = headers
        .iter()
        .filter_map(|row| {
            let name = text(row, NAME_COLUMN)?;
            let is_return = row
                .get(IS_RETURN_FIELD)
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Some((name, (text(row, PARTY_FIELD), is_return)))
        })
        .collect();

    let rows = store
        .query(
            child,
            &Query::new()
                .filter(Filter::is_in(PARENT_COLUMN, invoices.keys().cloned()))
                .filter(Filter::eq(PARENT_FIELD_COLUMN, VOUCHER_ITEMS_FIELD))
                .select([
                    PARENT_COLUMN,
                    ITEM_FIELD,
                    LINE_ACCOUNT_FIELD,
                    QUANTITY_FIELD,
                    LINE_AMOUNT_FIELD,
                ]),
        )
        .await?;

    let lines: Vec<InvoiceLine> = rows
        .iter()
        .filter_map(|row| {
            let parent = text(row, PARENT_COLUMN)?;
            let (party, is_return) = invoices.get(&parent)?.clone();
            Some(InvoiceLine {
                parent,
                party,
                item: text(row, ITEM_FIELD).unwrap_or_default(),
                account: text(row, LINE_ACCOUNT_FIELD),
                quantity: amount(row, QUANTITY_FIELD),
                amount: amount(row, LINE_AMOUNT_FIELD),
                is_return,
            })
        })
        .collect();
    debug!(
        schema,
        invoices = invoices.len(),
        lines = lines.len(),
        "fetched invoice lines"
    );
    Ok(lines)
}

#[async_trait]
impl ReportSource for ProfitAndLoss {
    type Filters = ProfitLossFilters;

    fn name(&self) -> &'static str {
        "profit_and_loss"
    }

    // Child rows only change through their parent, which touches them too.
    fn watched(&self) -> Vec<String> {
        vec![SALES_INVOICE.to_string(), PURCHASE_INVOICE.to_string()]
    }

    fn columns(&self, filters: &ProfitLossFilters) -> Vec<Column> {
        profit_loss::columns(filters.group_by)
    }

    async fn rows(
        &self,
        store: &DocumentStore,
        filters: &ProfitLossFilters,
    ) -> Result<Vec<ReportRow>, ReportRunError> {
        filters.validate()?;
        let sales = invoice_lines(store, SALES_INVOICE, filters).await?;
        let purchases = invoice_lines(store, PURCHASE_INVOICE, filters).await?;
        let costs = profit_loss::average_costs(&purchases, self.config.cost_precision);
        let rows = profit_loss::aggregate(&sales, &costs, filters.group_by, &self.config);
        Ok(profit_loss::to_report_rows(&rows, &self.config))
    }
}
