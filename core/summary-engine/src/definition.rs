//! FILENAME: core/summary-engine/src/definition.rs
//! Summary Table Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a summary table:
//! - The dataset shape it is computed over (columns referenced by name)
//! - The user's column-role settings, as stored in visualization settings
//! - Engine options (grand total, nesting bound)

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::SummaryError;
use crate::value::CellValue;

/// Visualization settings key holding the column-role configuration.
pub const COLUMNS_SETTINGS: &str = "summaryTable.columns";

/// Visualization settings key for the grand-total toggle.
pub const GRAND_TOTAL_SETTINGS: &str = "summaryTable.grandTotal";

/// Visualization settings key bounding subtotal nesting depth.
pub const MAX_LEVELS_SETTINGS: &str = "summaryTable.maxGroupingLevels";

/// Default bound on grouping recursion depth.
pub const DEFAULT_MAX_GROUPING_LEVELS: usize = 30;

fn default_true() -> bool {
    true
}

// ============================================================================
// DATASET
// ============================================================================

/// How a column is exposed to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Normal,
    /// Only shown in record detail views, never offered as a table column.
    DetailsOnly,
}

/// A dataset column. Settings reference it by `name`, never by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub visibility: Visibility,

    /// Column-level default for subtotal visibility. Settings metadata wins.
    #[serde(default)]
    pub show_totals: Option<bool>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            display_name: None,
            visibility: Visibility::Normal,
            show_totals: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_show_totals(mut self, show_totals: bool) -> Self {
        self.show_totals = Some(show_totals);
        self
    }

    /// Label shown in headers.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Query output as handed to the visualization: ordered columns plus rows
/// aligned to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<CellValue>>) -> Self {
        Dataset { columns, rows }
    }

    /// Position of a column by exact (case-sensitive) name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Per-column options edited next to the role lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    #[serde(default = "default_true")]
    pub show_totals: bool,
}

impl Default for ColumnMetadata {
    fn default() -> Self {
        ColumnMetadata { show_totals: true }
    }
}

/// The column-role configuration produced by the settings editor.
/// Immutable from the engine's point of view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryTableSettings {
    /// Row hierarchy, outermost first.
    pub groups_sources: Vec<String>,

    /// Column hierarchy (cross-tab), outermost first. May be empty.
    pub columns_source: Vec<String>,

    /// Columns whose values are aggregated.
    pub values_sources: Vec<String>,

    /// Columns offered in the editor but not assigned to a role.
    pub unused_columns: Vec<String>,

    pub column_name_to_metadata: FxHashMap<String, ColumnMetadata>,
}

impl SummaryTableSettings {
    /// Default configuration for a dataset: every user-facing column is
    /// listed as unused, nothing is assigned to a role yet.
    pub fn default_for(columns: &[Column]) -> Self {
        SummaryTableSettings {
            unused_columns: columns
                .iter()
                .filter(|c| c.visibility != Visibility::DetailsOnly)
                .map(|c| c.name.clone())
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_groups<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.groups_sources = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pivots<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.columns_source = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_values<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.values_sources = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_show_totals(mut self, name: impl Into<String>, show_totals: bool) -> Self {
        self.column_name_to_metadata
            .insert(name.into(), ColumnMetadata { show_totals });
        self
    }

    /// Explicit per-column metadata, if the editor stored any.
    pub fn metadata(&self, name: &str) -> Option<&ColumnMetadata> {
        self.column_name_to_metadata.get(name)
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

/// Everything the engine reads from visualization settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTableOptions {
    /// `None` when the user has not configured the table yet.
    pub settings: Option<SummaryTableSettings>,

    pub show_grand_total: bool,

    /// Bound on subtotal nesting depth.
    pub max_grouping_levels: usize,
}

impl Default for SummaryTableOptions {
    fn default() -> Self {
        SummaryTableOptions {
            settings: None,
            show_grand_total: true,
            max_grouping_levels: DEFAULT_MAX_GROUPING_LEVELS,
        }
    }
}

impl SummaryTableOptions {
    pub fn new(settings: SummaryTableSettings) -> Self {
        SummaryTableOptions {
            settings: Some(settings),
            ..Default::default()
        }
    }

    pub fn with_grand_total(mut self, show_grand_total: bool) -> Self {
        self.show_grand_total = show_grand_total;
        self
    }

    pub fn with_max_grouping_levels(mut self, max_grouping_levels: usize) -> Self {
        self.max_grouping_levels = max_grouping_levels;
        self
    }

    /// Reads options from a visualization settings object keyed by
    /// dotted setting names. Absent keys fall back to defaults.
    pub fn from_visualization_settings(value: &serde_json::Value) -> Result<Self, SummaryError> {
        let mut options = SummaryTableOptions::default();

        if let Some(columns) = value.get(COLUMNS_SETTINGS).filter(|v| !v.is_null()) {
            options.settings = Some(serde_json::from_value(columns.clone())?);
        }
        if let Some(grand_total) = value.get(GRAND_TOTAL_SETTINGS).filter(|v| !v.is_null()) {
            options.show_grand_total = serde_json::from_value(grand_total.clone())?;
        }
        if let Some(max_levels) = value.get(MAX_LEVELS_SETTINGS).filter(|v| !v.is_null()) {
            options.max_grouping_levels = serde_json::from_value(max_levels.clone())?;
        }

        Ok(options)
    }

    /// The configured settings, or the defaults for the given columns.
    pub fn effective_settings(&self, columns: &[Column]) -> SummaryTableSettings {
        match &self.settings {
            Some(settings) => settings.clone(),
            None => SummaryTableSettings::default_for(columns),
        }
    }
}
