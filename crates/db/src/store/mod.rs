//! Schema-driven document store.
//!
//! One table per schema, created from the loaded [`SchemaSet`] when the
//! store opens. Reads run on the connection pool; every write goes through
//! [`DocumentStore::run_in_transaction`], serialized by a single writer
//! lock held from `BEGIN` until the change versions are bumped.
//!
//! # Usage
//!
//! ```ignore
//! let store = DocumentStore::open(&config.database, Arc::new(SchemaSet::builtin()?)).await?;
//!
//! let party = store
//!     .create("Party", DocumentInput::new().set("party_name", "Acme").set("party_type", "Customer"))
//!     .await?;
//!
//! store
//!     .run_in_transaction::<_, _, StoreError>(|tx| {
//!         Box::pin(async move {
//!             tx.update("Party", "Acme", &DocumentInput::new().set("email", "ap@acme.test")).await
//!         })
//!     })
//!     .await?;
//! ```

mod codec;
mod error;
mod ops;
mod sql;
mod versions;

pub use error::StoreError;
pub use versions::SchemaVersions;

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use folio_core::document::{DocStatus, Document, DocumentInput, Query, Row};
use folio_core::ledger::{LEDGER_COLLECTION, LedgerEntry, Posting};
use folio_core::schema::{Schema, SchemaSet};
use folio_shared::DatabaseConfig;
use folio_shared::types::PageRequest;
use futures::stream::{self, Stream, TryStreamExt};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use sea_orm_migration::MigratorTrait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::migration::Migrator;
use crate::repositories::{LedgerRepository, ledger};

/// Rows fetched per round trip by [`DocumentStore::stream`].
const STREAM_BATCH: u32 = 200;

/// Handle to an opened store. Cheap to clone; clones share the pool, the
/// writer lock and the change versions.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    db: DatabaseConnection,
    schemas: Arc<SchemaSet>,
    writer: Arc<Mutex<()>>,
    versions: Arc<SchemaVersions>,
}

impl DocumentStore {
    /// Connects to the configured database and opens the store on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, the migrations or the table sync
    /// fail.
    pub async fn open(config: &DatabaseConfig, schemas: Arc<SchemaSet>) -> Result<Self, StoreError> {
        let db = crate::connect(config).await?;
        Self::new(db, schemas).await
    }

    /// Opens the store on an existing connection: runs pending migrations
    /// and creates or extends one table per schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the migrations or the table sync fail.
    pub async fn new(db: DatabaseConnection, schemas: Arc<SchemaSet>) -> Result<Self, StoreError> {
        Migrator::up(&db, None).await?;
        ops::sync_tables(&db, &schemas).await?;
        info!(schemas = schemas.iter().count(), "document store ready");
        Ok(Self {
            db,
            schemas,
            writer: Arc::new(Mutex::new(())),
            versions: Arc::new(SchemaVersions::new()),
        })
    }

    /// The loaded schemas.
    #[must_use]
    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Read access to the ledger.
    #[must_use]
    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.db.clone())
    }

    /// Change version of a schema or of [`LEDGER_COLLECTION`]; 0 until the
    /// first committed write.
    #[must_use]
    pub fn version(&self, schema: &str) -> u64 {
        self.versions.get(schema)
    }

    /// Reads a document with its child rows.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such document.
    pub async fn get(&self, schema: &str, name: &str) -> Result<Document, StoreError> {
        ops::get(&self.db, &self.schemas, self.schemas.get(schema)?, name).await
    }

    /// Runs a query. Filters are pushed down to the database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for unknown columns, uncoercible
    /// operands or `like` on non-text columns.
    pub async fn query(&self, schema: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        ops::query(&self.db, self.schemas.get(schema)?, query).await
    }

    /// Yields the rows of `query` lazily, one batch per round trip.
    ///
    /// The query is re-run per batch with an advancing page, so the stream
    /// can be started again from the same `Query` value. A query that sets
    /// its own page yields just that page.
    pub fn stream<'a>(
        &'a self,
        schema: &'a str,
        query: &'a Query,
    ) -> impl Stream<Item = Result<Row, StoreError>> + Send + 'a {
        let batches = stream::try_unfold(Some(1_u32), move |page| async move {
            let Some(page) = page else {
                return Ok(None);
            };
            let schema = self.schemas.get(schema)?;
            if query.page.is_some() {
                let rows = ops::query(&self.db, schema, query).await?;
                return Ok(Some((rows, None)));
            }
            let mut batch = query.clone();
            batch.page = Some(PageRequest::new(page, STREAM_BATCH));
            let rows = ops::query(&self.db, schema, &batch).await?;
            let next = (rows.len() == STREAM_BATCH as usize).then_some(page + 1);
            Ok::<_, StoreError>(Some((rows, next)))
        });
        batches
            .map_ok(|rows| stream::iter(rows.into_iter().map(Ok)))
            .try_flatten()
    }

    /// Creates a document in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`DocumentTx::create`].
    pub async fn create(&self, schema: &str, input: DocumentInput) -> Result<Document, StoreError> {
        let schema = schema.to_string();
        self.run_in_transaction::<_, _, StoreError>(|tx| {
            Box::pin(async move { tx.create(&schema, &input).await })
        })
        .await
    }

    /// Updates a document in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`DocumentTx::update`].
    pub async fn update(
        &self,
        schema: &str,
        name: &str,
        input: DocumentInput,
    ) -> Result<Document, StoreError> {
        let (schema, name) = (schema.to_string(), name.to_string());
        self.run_in_transaction::<_, _, StoreError>(|tx| {
            Box::pin(async move { tx.update(&schema, &name, &input).await })
        })
        .await
    }

    /// Deletes a document and its child rows in one transaction.
    ///
    /// # Errors
    ///
    /// See [`DocumentTx::delete`].
    pub async fn delete(&self, schema: &str, name: &str) -> Result<(), StoreError> {
        let (schema, name) = (schema.to_string(), name.to_string());
        self.run_in_transaction::<_, _, StoreError>(|tx| {
            Box::pin(async move { tx.delete(&schema, &name).await })
        })
        .await
    }

    /// Runs `f` inside a database transaction under the writer lock.
    ///
    /// Commits if `f` returns `Ok`, rolls back otherwise. The versions of
    /// every schema `f` wrote are bumped after the commit, before the lock
    /// is released.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or a `StoreError` converted into `E` if the
    /// transaction cannot begin or commit.
    pub async fn run_in_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut DocumentTx) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: From<StoreError> + Send,
    {
        let _guard = self.writer.lock().await;
        let txn = self.db.begin().await.map_err(StoreError::from)?;
        let mut tx = DocumentTx {
            txn,
            schemas: Arc::clone(&self.schemas),
            touched: BTreeSet::new(),
        };

        match f(&mut tx).await {
            Ok(value) => {
                let touched = tx.commit().await?;
                if !touched.is_empty() {
                    debug!(?touched, "committed");
                }
                self.versions.bump(&touched);
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.txn.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// An open write transaction.
///
/// Offers the store's document operations plus ledger appends and status
/// changes. Nothing is visible to other readers until the enclosing
/// [`DocumentStore::run_in_transaction`] commits.
pub struct DocumentTx {
    txn: DatabaseTransaction,
    schemas: Arc<SchemaSet>,
    touched: BTreeSet<String>,
}

impl std::fmt::Debug for DocumentTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentTx")
            .field("touched", &self.touched)
            .finish_non_exhaustive()
    }
}

impl DocumentTx {
    /// The loaded schemas.
    #[must_use]
    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    fn schema(&self, name: &str) -> Result<&Schema, StoreError> {
        Ok(self.schemas.get(name)?)
    }

    /// Marks a schema and its child schemas as written.
    fn touch(&mut self, schema: &str) {
        if let Ok(s) = self.schemas.get(schema) {
            self.touched
                .extend(s.table_fields().map(|(_, child)| child.to_string()));
        }
        self.touched.insert(schema.to_string());
    }

    async fn commit(self) -> Result<BTreeSet<String>, StoreError> {
        self.txn.commit().await?;
        Ok(self.touched)
    }

    /// Validates and inserts a document.
    ///
    /// Required, type, link and unique constraints are checked before any
    /// write. The key follows the schema's naming policy.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` naming the offending field, e.g.
    /// `name` for a duplicate key.
    #[instrument(skip(self, input))]
    pub async fn create(&mut self, schema: &str, input: &DocumentInput) -> Result<Document, StoreError> {
        let doc = ops::create(&self.txn, &self.schemas, self.schema(schema)?, input).await?;
        self.touch(schema);
        Ok(doc)
    }

    /// Reads a document as seen by this transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such document.
    pub async fn get(&self, schema: &str, name: &str) -> Result<Document, StoreError> {
        ops::get(&self.txn, &self.schemas, self.schema(schema)?, name).await
    }

    /// Reads a document if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown schemas or database failures.
    pub async fn find(&self, schema: &str, name: &str) -> Result<Option<Document>, StoreError> {
        ops::fetch(&self.txn, &self.schemas, self.schema(schema)?, name).await
    }

    /// Merges field values into a document. A provided table replaces the
    /// whole child collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ImmutableDocument` for cancelled documents and
    /// for fields of submitted documents that are not `allow_on_submit`.
    #[instrument(skip(self, input))]
    pub async fn update(
        &mut self,
        schema: &str,
        name: &str,
        input: &DocumentInput,
    ) -> Result<Document, StoreError> {
        let doc = ops::update(&self.txn, &self.schemas, self.schema(schema)?, name, input).await?;
        self.touch(schema);
        Ok(doc)
    }

    /// Deletes a document and its child rows.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ReferentialIntegrity` while ledger entries or
    /// other documents refer to it.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, schema: &str, name: &str) -> Result<(), StoreError> {
        ops::delete(&self.txn, &self.schemas, self.schema(schema)?, name).await?;
        self.touch(schema);
        Ok(())
    }

    /// Runs a query inside the transaction.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::query`].
    pub async fn query(&self, schema: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        ops::query(&self.txn, self.schema(schema)?, query).await
    }

    /// Persists a lifecycle state. Transition rules are the caller's.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotSubmittable` for schemas without a lifecycle.
    pub async fn set_status(
        &mut self,
        schema: &str,
        name: &str,
        status: DocStatus,
    ) -> Result<(), StoreError> {
        ops::set_status(&self.txn, self.schema(schema)?, name, status).await?;
        self.touch(schema);
        Ok(())
    }

    /// Appends a validated posting to the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append_ledger(&mut self, posting: &Posting) -> Result<Vec<LedgerEntry>, StoreError> {
        let entries = ledger::insert_posting(&self.txn, posting).await?;
        self.touched.insert(LEDGER_COLLECTION.to_string());
        Ok(entries)
    }

    /// Ledger entries of one voucher, reversals included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn ledger_entries(
        &self,
        reference_type: &str,
        reference_name: &str,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(ledger::by_reference(&self.txn, reference_type, reference_name).await?)
    }
}
