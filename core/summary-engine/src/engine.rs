//! FILENAME: core/summary-engine/src/engine.rs
//! Summary Engine - the pipeline from settings to display model.
//!
//! Algorithm:
//! 1. Resolve column roles against the dataset by name
//! 2. Build the query plan (detail slice, enabled rollups, grand total)
//! 3. Obtain every slice from the provider (the only suspension point,
//!    handled by the caller through `ResultSnapshot`)
//! 4. Merge slices into tagged rows
//! 5. Order rows and compute merged group cells
//!
//! `compute_display_model` runs all steps at once. `SummaryTable` splits
//! step 3 out for asynchronous providers and refuses results computed for
//! inputs that have since been superseded.

use crate::definition::{Dataset, SummaryTableOptions};
use crate::error::{Diagnostic, SummaryError};
use crate::grouping::GroupingManager;
use crate::merger::merge;
use crate::plan::{build_plan, AggregationKey, QueryPlan};
use crate::provider::{DetailFromDataset, ResultProvider, ResultSnapshot};
use crate::resolver::{resolve, ResolvedColumns};
use crate::view::{DisplayColumn, DisplayColumnRole, DisplayModel};

// ============================================================================
// COMPUTATION
// ============================================================================

/// Column names and row count of the dataset a computation was prepared for.
#[derive(Debug, Clone, PartialEq)]
struct DatasetShape {
    columns: Vec<String>,
    rows: usize,
}

impl DatasetShape {
    fn of(dataset: &Dataset) -> Self {
        DatasetShape {
            columns: dataset.columns.iter().map(|c| c.name.clone()).collect(),
            rows: dataset.rows.len(),
        }
    }
}

/// Everything decided before results are fetched: resolved roles, the plan
/// and the display columns. Tied to the generation that created it.
#[derive(Debug, Clone)]
pub struct Computation {
    generation: u64,
    resolved: ResolvedColumns,
    plan: QueryPlan,
    columns: Vec<DisplayColumn>,
    pivot_columns: Vec<String>,
    max_levels: usize,
    source: DatasetShape,
    diagnostics: Vec<Diagnostic>,
}

impl Computation {
    pub fn prepare(generation: u64, dataset: &Dataset, options: &SummaryTableOptions) -> Self {
        log_enter!("ENGINE", "prepare", "generation={}", generation);

        let settings = options.effective_settings(&dataset.columns);
        let resolved = resolve(&settings, &dataset.columns);

        let group_names = resolved.group_names(&dataset.columns);
        let value_names = resolved.value_names(&dataset.columns);
        let plan = build_plan(
            &group_names,
            &resolved.show_totals,
            &value_names,
            options.show_grand_total,
        );

        let columns = resolved
            .groups
            .iter()
            .map(|&i| (i, DisplayColumnRole::Group))
            .chain(resolved.values.iter().map(|&i| (i, DisplayColumnRole::Value)))
            .map(|(i, role)| DisplayColumn {
                name: dataset.columns[i].name.clone(),
                label: dataset.columns[i].label().to_string(),
                role,
            })
            .collect();

        let computation = Computation {
            generation,
            pivot_columns: resolved.pivot_names(&dataset.columns),
            diagnostics: resolved.diagnostics.clone(),
            resolved,
            plan,
            columns,
            max_levels: options.max_grouping_levels,
            source: DatasetShape::of(dataset),
        };

        log_exit!(
            "ENGINE",
            "prepare",
            "hidden={} keys={}",
            computation.is_hidden(),
            computation.plan.keys().len()
        );
        computation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// True when the table has nothing to show and no results are needed.
    pub fn is_hidden(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Keys the caller must resolve before completing, in plan order.
    pub fn keys(&self) -> Vec<AggregationKey> {
        if self.is_hidden() {
            Vec::new()
        } else {
            self.plan.keys()
        }
    }

    /// Runs merge and grouping over fully resolved results.
    pub fn complete<P: ResultProvider + ?Sized>(&self, provider: &P) -> DisplayModel {
        self.complete_with(provider, Vec::new())
    }

    /// Serves the detail level from the dataset's own rows and fetches only
    /// the rollups from `rollups`. `dataset` must be the one this computation
    /// was prepared with.
    pub fn complete_from_dataset<P: ResultProvider + ?Sized>(
        &self,
        dataset: &Dataset,
        rollups: &P,
    ) -> Result<DisplayModel, SummaryError> {
        if DatasetShape::of(dataset) != self.source {
            log_warn!(
                "ENGINE",
                "generation={} dataset changed since prepare, refusing",
                self.generation
            );
            return Err(SummaryError::DatasetMismatch {
                generation: self.generation,
            });
        }

        // Without group columns the only key is the grand total.
        if self.plan.detail_level() == 0 {
            return Ok(self.complete_with(rollups, Vec::new()));
        }

        let (rows, diagnostics) = dataset.project(&self.resolved);
        let detail_key = AggregationKey::new(
            self.plan.detail_groups().cloned().unwrap_or_default(),
            self.plan.aggregations.clone(),
        );
        let provider = DetailFromDataset::new(detail_key, rows, rollups);
        Ok(self.complete_with(&provider, diagnostics))
    }

    fn complete_with<P: ResultProvider + ?Sized>(
        &self,
        provider: &P,
        extra: Vec<Diagnostic>,
    ) -> DisplayModel {
        let mut diagnostics = self.diagnostics.clone();
        diagnostics.extend(extra);

        if self.is_hidden() {
            log_debug!("ENGINE", "generation={} has no fields, hidden view", self.generation);
            return DisplayModel::all_fields_hidden(self.generation, diagnostics);
        }

        let merged = merge(&self.plan, provider);
        diagnostics.extend(merged.diagnostics);

        let group_columns: Vec<usize> = (0..self.plan.detail_level()).collect();
        let grouping = GroupingManager::new(self.max_levels, &group_columns, merged.rows);

        let model = DisplayModel::table(
            self.generation,
            self.columns.clone(),
            self.pivot_columns.clone(),
            grouping.into_output(),
            diagnostics,
        );

        log_info!(
            "ENGINE",
            "generation={} rows={} diagnostics={}",
            model.version,
            model.row_count(),
            model.diagnostics.len()
        );
        model
    }
}

/// Computes the display model in one pass. Pure: identical inputs give
/// identical output.
pub fn compute_display_model<P: ResultProvider + ?Sized>(
    dataset: &Dataset,
    options: &SummaryTableOptions,
    provider: &P,
) -> DisplayModel {
    let computation = Computation::prepare(0, dataset, options);
    if computation.is_hidden() {
        return computation.complete(&ResultSnapshot::new());
    }
    let snapshot = ResultSnapshot::collect(computation.plan(), provider);
    computation.complete(&snapshot)
}

// ============================================================================
// SESSION
// ============================================================================

/// Tracks which computation is current for one summary table. Each new input
/// (dataset or settings change) starts a new generation; results belonging
/// to an older generation are refused.
#[derive(Debug, Default)]
pub struct SummaryTable {
    generation: u64,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a computation for new inputs, superseding any in flight.
    pub fn begin(&mut self, dataset: &Dataset, options: &SummaryTableOptions) -> Computation {
        self.generation += 1;
        Computation::prepare(self.generation, dataset, options)
    }

    /// Completes `computation` with its resolved results if it is still the
    /// current one.
    pub fn finish(
        &self,
        computation: &Computation,
        snapshot: &ResultSnapshot,
    ) -> Result<DisplayModel, SummaryError> {
        self.ensure_current(computation)?;
        if !snapshot.is_complete_for(computation.plan()) && !computation.is_hidden() {
            log_warn!(
                "ENGINE",
                "generation={} finishing with an incomplete snapshot",
                computation.generation()
            );
        }
        Ok(computation.complete(snapshot))
    }

    /// Like `finish`, serving the detail level from the dataset.
    pub fn finish_from_dataset(
        &self,
        computation: &Computation,
        dataset: &Dataset,
        rollups: &ResultSnapshot,
    ) -> Result<DisplayModel, SummaryError> {
        self.ensure_current(computation)?;
        computation.complete_from_dataset(dataset, rollups)
    }

    fn ensure_current(&self, computation: &Computation) -> Result<(), SummaryError> {
        if computation.generation() != self.generation {
            log_warn!(
                "ENGINE",
                "discarding stale generation={} current={}",
                computation.generation,
                self.generation
            );
            return Err(SummaryError::StaleComputation {
                computed: computation.generation(),
                current: self.generation,
            });
        }
        Ok(())
    }
}
