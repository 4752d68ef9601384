//! FILENAME: core/summary-engine/src/provider.rs
//! Result Provider - the boundary to the external aggregation engine.
//!
//! A provider returns, for one aggregation key, one row per distinct
//! combination of the key's group values: group cells in key order followed
//! by measure cells in key order. The engine trusts these numbers verbatim.
//!
//! Providers backed by asynchronous engines are resolved by the caller into
//! a `ResultSnapshot` before merging; merging never suspends.

use rustc_hash::FxHashMap;

use crate::error::ProviderError;
use crate::plan::{AggregationKey, QueryPlan};
use crate::value::CellValue;

/// Rows returned for one aggregation key.
pub type ResultRows = Vec<Vec<CellValue>>;

pub trait ResultProvider {
    fn provide(&self, key: &AggregationKey) -> Result<ResultRows, ProviderError>;
}

impl<F> ResultProvider for F
where
    F: Fn(&AggregationKey) -> Result<ResultRows, ProviderError>,
{
    fn provide(&self, key: &AggregationKey) -> Result<ResultRows, ProviderError> {
        self(key)
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// A complete set of provider outcomes for one plan, failures included.
#[derive(Debug, Clone, Default)]
pub struct ResultSnapshot {
    results: FxHashMap<AggregationKey, Result<ResultRows, ProviderError>>,
}

impl ResultSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `provider` once per plan key, in plan order.
    pub fn collect<P: ResultProvider + ?Sized>(plan: &QueryPlan, provider: &P) -> Self {
        let mut snapshot = Self::new();
        for key in plan.keys() {
            let result = provider.provide(&key);
            snapshot.insert(key, result);
        }
        snapshot
    }

    /// Records the outcome for `key`, replacing any earlier one.
    pub fn insert(&mut self, key: AggregationKey, result: Result<ResultRows, ProviderError>) {
        self.results.insert(key, result);
    }

    pub fn contains(&self, key: &AggregationKey) -> bool {
        self.results.contains_key(key)
    }

    /// True when every key of `plan` has a recorded outcome.
    pub fn is_complete_for(&self, plan: &QueryPlan) -> bool {
        plan.keys().iter().all(|key| self.contains(key))
    }
}

impl ResultProvider for ResultSnapshot {
    fn provide(&self, key: &AggregationKey) -> Result<ResultRows, ProviderError> {
        self.results.get(key).cloned().unwrap_or(Err(ProviderError::Missing))
    }
}

// ============================================================================
// DATASET-BACKED DETAIL LEVEL
// ============================================================================

/// Serves the full-detail key from rows the dataset already holds and
/// delegates every rollup key to `inner`.
pub struct DetailFromDataset<'a, P: ?Sized> {
    detail_key: AggregationKey,
    rows: ResultRows,
    inner: &'a P,
}

impl<'a, P: ResultProvider + ?Sized> DetailFromDataset<'a, P> {
    /// `rows` must already be projected to the key's layout
    /// (see `Dataset::project`).
    pub fn new(detail_key: AggregationKey, rows: ResultRows, inner: &'a P) -> Self {
        DetailFromDataset {
            detail_key,
            rows,
            inner,
        }
    }
}

impl<P: ResultProvider + ?Sized> ResultProvider for DetailFromDataset<'_, P> {
    fn provide(&self, key: &AggregationKey) -> Result<ResultRows, ProviderError> {
        if key == &self.detail_key {
            Ok(self.rows.clone())
        } else {
            self.inner.provide(key)
        }
    }
}
