//! FILENAME: core/summary-engine/src/view.rs
//! Summary View - Renderable output for the frontend.
//!
//! The display model is the only artifact handed to rendering. It carries
//! ordered rows, their subtotal tags and per-group-column merge descriptors,
//! and nothing about styling or geometry.

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::grouping::{GroupingOutput, MergeDescriptor};
use crate::value::CellValue;

/// What the renderer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayState {
    Table,
    /// No group, pivot or value column resolved: show the
    /// "every field is hidden" placeholder instead of a table.
    AllFieldsHidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayColumnRole {
    Group,
    Value,
}

/// A column of the display model, in cell order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayColumn {
    pub name: String,
    pub label: String,
    pub role: DisplayColumnRole,
}

/// Row kinds, for renderers that style by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayRowType {
    Detail,
    Subtotal,
    GrandTotal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub cells: Vec<CellValue>,
    pub grouping_level: usize,
    pub is_subtotal: bool,
    pub is_grand_total: bool,

    /// One descriptor per group column.
    pub merges: Vec<MergeDescriptor>,
}

impl DisplayRow {
    pub fn row_type(&self) -> DisplayRowType {
        if self.is_grand_total {
            DisplayRowType::GrandTotal
        } else if self.is_subtotal {
            DisplayRowType::Subtotal
        } else {
            DisplayRowType::Detail
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayModel {
    /// Generation of the computation that produced this model.
    pub version: u64,

    pub state: DisplayState,

    /// Group columns first, then value columns.
    pub columns: Vec<DisplayColumn>,

    /// Cross-tab columns, passed through for the renderer.
    pub pivot_columns: Vec<String>,

    pub group_column_count: usize,

    pub rows: Vec<DisplayRow>,

    /// Recoverable problems met while computing the model.
    pub diagnostics: Vec<Diagnostic>,
}

impl DisplayModel {
    /// The placeholder model for a table with nothing to show.
    pub fn all_fields_hidden(version: u64, diagnostics: Vec<Diagnostic>) -> Self {
        DisplayModel {
            version,
            state: DisplayState::AllFieldsHidden,
            columns: Vec::new(),
            pivot_columns: Vec::new(),
            group_column_count: 0,
            rows: Vec::new(),
            diagnostics,
        }
    }

    pub fn table(
        version: u64,
        columns: Vec<DisplayColumn>,
        pivot_columns: Vec<String>,
        grouping: GroupingOutput,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let group_column_count = columns
            .iter()
            .filter(|c| c.role == DisplayColumnRole::Group)
            .count();

        let rows = grouping
            .rows_ordered
            .into_iter()
            .zip(grouping.merge_descriptors)
            .map(|(row, merges)| DisplayRow {
                cells: row.cells,
                grouping_level: row.grouping_level,
                is_subtotal: row.is_subtotal,
                is_grand_total: row.is_grand_total,
                merges,
            })
            .collect();

        DisplayModel {
            version,
            state: DisplayState::Table,
            columns,
            pivot_columns,
            group_column_count,
            rows,
            diagnostics,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.state == DisplayState::AllFieldsHidden
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
