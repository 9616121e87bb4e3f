//! Cached report runner.
//!
//! A result is reused until the filters change, a watched schema's change
//! version moves, or the caller forces a recomputation. Every computation
//! takes a generation number; one that finishes after a newer result was
//! stored is dropped in favour of the newer rows.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use folio_core::reports::{Column, ReportData, ReportRow};
use tokio::sync::Mutex;
use tracing::debug;

use super::error::ReportRunError;
use crate::store::DocumentStore;

/// A report the runner can compute and cache.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Filter values of the report.
    type Filters: Clone + PartialEq + std::fmt::Debug + Send + Sync;

    /// Report name used in logs.
    fn name(&self) -> &'static str;

    /// Schemas (or collections) whose writes invalidate a cached result.
    fn watched(&self) -> Vec<String>;

    /// Column metadata for the given filters.
    fn columns(&self, filters: &Self::Filters) -> Vec<Column>;

    /// Computes the rows.
    async fn rows(
        &self,
        store: &DocumentStore,
        filters: &Self::Filters,
    ) -> Result<Vec<ReportRow>, ReportRunError>;
}

struct Cached<F> {
    generation: u64,
    filters: F,
    versions: BTreeMap<String, u64>,
    data: Arc<ReportData>,
}

/// Runs a [`ReportSource`] and caches its result.
pub struct ReportRunner<R: ReportSource> {
    source: R,
    filters: Mutex<R::Filters>,
    cached: Mutex<Option<Cached<R::Filters>>>,
    generation: AtomicU64,
}

impl<R: ReportSource> ReportRunner<R> {
    /// Creates a runner with initial filters and an empty cache.
    pub fn new(source: R, filters: R::Filters) -> Self {
        Self {
            source,
            filters: Mutex::new(filters),
            cached: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// The report source.
    pub const fn source(&self) -> &R {
        &self.source
    }

    /// Current filters.
    pub async fn filters(&self) -> R::Filters {
        self.filters.lock().await.clone()
    }

    /// Replaces the filters and drops the cached result.
    pub async fn set_filters(&self, filters: R::Filters) {
        debug!(report = self.source.name(), ?filters, "filters changed");
        *self.filters.lock().await = filters;
        *self.cached.lock().await = None;
    }

    /// Column metadata for the current filters.
    pub async fn columns(&self) -> Vec<Column> {
        let filters = self.filters.lock().await;
        self.source.columns(&filters)
    }

    fn versions(&self, store: &DocumentStore) -> BTreeMap<String, u64> {
        self.source
            .watched()
            .into_iter()
            .map(|name| {
                let version = store.version(&name);
                (name, version)
            })
            .collect()
    }

    /// Returns the report for the current filters.
    ///
    /// The cached result is returned unless `force` is set, nothing is
    /// cached, or a watched schema changed since it was computed.
    ///
    /// # Errors
    ///
    /// Returns `ReportRunError` if the filters are invalid or fetching rows
    /// fails.
    pub async fn get_data(
        &self,
        store: &DocumentStore,
        force: bool,
    ) -> Result<Arc<ReportData>, ReportRunError> {
        let filters = self.filters.lock().await.clone();
        let versions = self.versions(store);
        if !force {
            let cached = self.cached.lock().await;
            if let Some(hit) = cached.as_ref()
                && hit.filters == filters
                && hit.versions == versions
            {
                return Ok(Arc::clone(&hit.data));
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(report = self.source.name(), generation, "computing report");
        let rows = self.source.rows(store, &filters).await?;
        let data = Arc::new(ReportData {
            columns: self.source.columns(&filters),
            rows,
        });

        let mut cached = self.cached.lock().await;
        if let Some(newer) = cached
            .as_ref()
            .filter(|c| c.generation > generation && c.filters == filters)
        {
            debug!(
                report = self.source.name(),
                generation,
                newer = newer.generation,
                "discarding superseded result"
            );
            return Ok(Arc::clone(&newer.data));
        }
        if *self.filters.lock().await == filters {
            *cached = Some(Cached {
                generation,
                filters,
                versions,
                data: Arc::clone(&data),
            });
        }
        Ok(data)
    }
}
