//! Posting service for submitting and cancelling vouchers.
//!
//! Submission builds the posting with the pure engine and appends it to
//! the ledger in the same transaction that marks the voucher submitted.
//! Cancellation appends the mirror posting and marks it cancelled. Any
//! failure rolls the whole transaction back, so a half-posted voucher is
//! never observable.

use std::collections::HashMap;
use std::sync::Arc;

use folio_core::document::Document;
use folio_core::ledger::{
    ACCOUNT_IS_GROUP_FIELD, ACCOUNT_SCHEMA, AccountInfo, LedgerError, PostingEngine,
    ReversalService, Voucher,
};
use folio_shared::AccountingConfig;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::error::PostingError;
use crate::store::{DocumentStore, DocumentTx, StoreError};

/// Submits and cancels vouchers.
///
/// Cheap to clone; clones share the configuration.
#[derive(Debug, Clone)]
pub struct PostingService {
    config: Arc<AccountingConfig>,
}

impl PostingService {
    /// Creates a new posting service.
    #[must_use]
    pub fn new(config: AccountingConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The accounting configuration postings are built with.
    #[must_use]
    pub fn config(&self) -> &AccountingConfig {
        &self.config
    }

    /// Submits a draft document in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`Self::submit_in`].
    pub async fn submit(
        &self,
        store: &DocumentStore,
        schema: &str,
        name: &str,
    ) -> Result<Document, PostingError> {
        let service = self.clone();
        let (schema, name) = (schema.to_string(), name.to_string());
        store
            .run_in_transaction::<_, _, PostingError>(|tx| {
                Box::pin(async move { service.submit_in(tx, &schema, &name).await })
            })
            .await
    }

    /// Cancels a submitted document in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`Self::cancel_in`].
    pub async fn cancel(
        &self,
        store: &DocumentStore,
        schema: &str,
        name: &str,
    ) -> Result<Document, PostingError> {
        let service = self.clone();
        let (schema, name) = (schema.to_string(), name.to_string());
        store
            .run_in_transaction::<_, _, PostingError>(|tx| {
                Box::pin(async move { service.cancel_in(tx, &schema, &name).await })
            })
            .await
    }

    /// Submits a draft document inside an open transaction.
    ///
    /// For posting schemas this re-reads the voucher, builds and validates
    /// the posting, and appends its entries before setting the status.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidStateTransition` unless the document is
    /// a draft, any error of [`Voucher::from_document`] or
    /// [`PostingEngine::build_posting`], and store errors.
    #[instrument(skip(self, tx))]
    pub async fn submit_in(
        &self,
        tx: &mut DocumentTx,
        schema: &str,
        name: &str,
    ) -> Result<Document, PostingError> {
        let doc = tx.get(schema, name).await?;
        let next = doc.status.submit()?;
        let kind = tx.schemas().get(schema).map_err(StoreError::from)?.posting();

        if let Some(kind) = kind {
            let voucher = Voucher::from_document(&doc, kind)?;
            let accounts = self.load_accounts(tx, &voucher).await?;
            let posting = PostingEngine::build_posting(&voucher, &self.config, |account| {
                accounts
                    .get(account)
                    .cloned()
                    .ok_or_else(|| LedgerError::AccountNotFound(account.to_string()))
            })?;
            let entries = tx.append_ledger(&posting).await?;
            info!(
                voucher = %name,
                entries = entries.len(),
                debit = %posting.total_debit(),
                "posted voucher"
            );
        }

        tx.set_status(schema, name, next).await?;
        Ok(tx.get(schema, name).await?)
    }

    /// Cancels a submitted document inside an open transaction.
    ///
    /// For posting schemas the original entries are offset by a mirror
    /// posting; nothing is deleted.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidStateTransition` unless the document is
    /// submitted, `LedgerError::NothingToReverse` if a posting voucher has
    /// no entries, and store errors.
    #[instrument(skip(self, tx))]
    pub async fn cancel_in(
        &self,
        tx: &mut DocumentTx,
        schema: &str,
        name: &str,
    ) -> Result<Document, PostingError> {
        let doc = tx.get(schema, name).await?;
        let next = doc.status.cancel()?;
        let is_posting = tx
            .schemas()
            .get(schema)
            .map_err(StoreError::from)?
            .posting()
            .is_some();

        if is_posting {
            let originals = tx.ledger_entries(schema, name).await?;
            let reversal = ReversalService::reverse_entries(schema, name, &originals)?;
            let entries = tx.append_ledger(&reversal).await?;
            info!(voucher = %name, entries = entries.len(), "reversed voucher");
        }

        tx.set_status(schema, name, next).await?;
        Ok(tx.get(schema, name).await?)
    }

    /// Reads every account the posting may touch. Unknown accounts are
    /// left out and fail the engine's lookup.
    async fn load_accounts(
        &self,
        tx: &DocumentTx,
        voucher: &Voucher,
    ) -> Result<HashMap<String, AccountInfo>, StoreError> {
        let mut names: Vec<&str> = vec![voucher.account.as_str()];
        names.extend(voucher.lines.iter().map(|line| line.account.as_str()));
        if voucher.discount_amount > Decimal::ZERO {
            names.extend(self.config.discount_account.as_deref());
        }
        names.extend(self.config.round_off_account.as_deref());

        let mut accounts = HashMap::new();
        for name in names {
            if accounts.contains_key(name) {
                continue;
            }
            if let Some(account) = tx.find(ACCOUNT_SCHEMA, name).await? {
                accounts.insert(
                    name.to_string(),
                    AccountInfo {
                        name: account.name.clone(),
                        is_group: account.check(ACCOUNT_IS_GROUP_FIELD),
                    },
                );
            }
        }
        Ok(accounts)
    }
}
