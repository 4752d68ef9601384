//! FILENAME: core/summary-engine/src/grouping.rs
//! Grouping Manager - display order and merged group cells.
//!
//! Input is the merger's tagged sequence (details first, rollups after, in
//! plan order). Output is the display order:
//! 1. Rows are nested by their group values, groups in order of first
//!    appearance, detail rows in their natural order.
//! 2. Each group's subtotal rows follow its last row, before any subtotal of
//!    an enclosing group; grand-total rows come last.
//! 3. For every group column, consecutive rows sharing that column's value and
//!    every shallower value form one span; a subtotal row covering the column
//!    always sits in a span of its own.
//!
//! Nesting is bounded by `max_levels`; group columns past the bound behave
//! as plain detail (rows keep their natural order beneath the bound).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::merger::TaggedRow;
use crate::value::CellValue;

/// How one group cell is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MergeDescriptor {
    /// A span starts at this row and covers `height` rows.
    Start { height: usize },
    /// Covered by the span that starts at `start_row`.
    #[serde(rename_all = "camelCase")]
    Continuation { start_row: usize },
}

impl MergeDescriptor {
    /// Row span for rendering: the height at a span start, 0 when covered.
    pub fn row_span(&self) -> usize {
        match self {
            MergeDescriptor::Start { height } => *height,
            MergeDescriptor::Continuation { .. } => 0,
        }
    }
}

/// Ordered rows plus one descriptor per row and group column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupingOutput {
    pub rows_ordered: Vec<TaggedRow>,

    /// Indexed `[row][group column position]`.
    pub merge_descriptors: Vec<Vec<MergeDescriptor>>,
}

// ============================================================================
// GROUP TREE
// ============================================================================

#[derive(Debug, Default)]
struct GroupNode {
    children: Vec<GroupNode>,
    child_lookup: FxHashMap<CellValue, usize>,
    /// Rows at this node's depth, natural order.
    leaves: Vec<usize>,
    /// Rollup rows summarizing this node.
    totals: Vec<usize>,
}

impl GroupNode {
    fn descend(&mut self, path: &[CellValue]) -> &mut GroupNode {
        let mut node = self;
        for value in path {
            let index = match node.child_lookup.get(value) {
                Some(&index) => index,
                None => {
                    node.children.push(GroupNode::default());
                    let index = node.children.len() - 1;
                    node.child_lookup.insert(value.clone(), index);
                    index
                }
            };
            node = &mut node.children[index];
        }
        node
    }

    fn emit(&self, order: &mut Vec<usize>) {
        order.extend_from_slice(&self.leaves);
        for child in &self.children {
            child.emit(order);
        }
        order.extend_from_slice(&self.totals);
    }
}

// ============================================================================
// GROUPING MANAGER
// ============================================================================

pub struct GroupingManager {
    output: GroupingOutput,
}

impl GroupingManager {
    /// Orders `rows` and computes merge descriptors for the group columns at
    /// `group_column_indexes` (cell positions, outermost first).
    pub fn new(max_levels: usize, group_column_indexes: &[usize], rows: Vec<TaggedRow>) -> Self {
        GroupingManager {
            output: Self::order(rows, group_column_indexes, max_levels),
        }
    }

    pub fn rows_ordered(&self) -> &[TaggedRow] {
        &self.output.rows_ordered
    }

    pub fn merge_descriptors(&self) -> &[Vec<MergeDescriptor>] {
        &self.output.merge_descriptors
    }

    pub fn descriptor(&self, row: usize, position: usize) -> Option<MergeDescriptor> {
        self.output
            .merge_descriptors
            .get(row)
            .and_then(|descriptors| descriptors.get(position))
            .copied()
    }

    pub fn into_output(self) -> GroupingOutput {
        self.output
    }

    /// The ordering and span algorithm. Never fails; group column indexes
    /// outside the row width are skipped.
    pub fn order(
        rows: Vec<TaggedRow>,
        group_column_indexes: &[usize],
        max_levels: usize,
    ) -> GroupingOutput {
        let width = rows.iter().map(|r| r.cells.len()).min().unwrap_or(0);
        let columns: Vec<Option<usize>> = group_column_indexes
            .iter()
            .map(|&index| (index < width).then_some(index))
            .collect();

        if columns.iter().any(Option::is_none) {
            log_warn!(
                "GROUPING",
                "skipping group columns outside row width {}: {:?}",
                width,
                group_column_indexes
            );
        }

        let depth = columns.len().min(max_levels);
        let order = display_order(&rows, &columns, depth);

        let mut rank = vec![0usize; rows.len()];
        for (position, &row) in order.iter().enumerate() {
            rank[row] = position;
        }
        let mut ranked: Vec<(usize, TaggedRow)> = rank.into_iter().zip(rows).collect();
        ranked.sort_unstable_by_key(|(position, _)| *position);
        let rows_ordered: Vec<TaggedRow> = ranked.into_iter().map(|(_, row)| row).collect();

        let merge_descriptors = compute_spans(&rows_ordered, &columns);

        log_debug!(
            "GROUPING",
            "ordered {} rows over {} group columns (depth {})",
            rows_ordered.len(),
            columns.len(),
            depth
        );

        GroupingOutput {
            rows_ordered,
            merge_descriptors,
        }
    }
}

/// Value of the group column at `position`, or a constant for skipped columns.
fn group_value(row: &TaggedRow, column: Option<usize>) -> CellValue {
    column
        .and_then(|index| row.cells.get(index))
        .cloned()
        .unwrap_or(CellValue::NotApplicable)
}

fn display_order(rows: &[TaggedRow], columns: &[Option<usize>], depth: usize) -> Vec<usize> {
    let mut root = GroupNode::default();

    for (index, row) in rows.iter().enumerate() {
        let is_rollup = row.is_subtotal && row.grouping_level <= depth;
        let prefix_len = if is_rollup { row.grouping_level } else { depth };

        let path: Vec<CellValue> = columns[..prefix_len]
            .iter()
            .map(|&column| group_value(row, column))
            .collect();
        let node = root.descend(&path);

        if is_rollup {
            node.totals.push(index);
        } else {
            node.leaves.push(index);
        }
    }

    let mut order = Vec::with_capacity(rows.len());
    root.emit(&mut order);
    order
}

fn compute_spans(rows: &[TaggedRow], columns: &[Option<usize>]) -> Vec<Vec<MergeDescriptor>> {
    let mut descriptors = vec![vec![MergeDescriptor::Start { height: 1 }; columns.len()]; rows.len()];

    for (position, column) in columns.iter().enumerate() {
        if column.is_none() {
            continue;
        }

        let mut open: Option<usize> = None;
        for (index, row) in rows.iter().enumerate() {
            if row.is_total_for(position) {
                open = None;
                continue;
            }

            match open {
                Some(start) if same_prefix(&rows[index - 1], row, &columns[..=position]) => {
                    descriptors[index][position] = MergeDescriptor::Continuation { start_row: start };
                    if let MergeDescriptor::Start { height } = &mut descriptors[start][position] {
                        *height += 1;
                    }
                }
                _ => open = Some(index),
            }
        }
    }

    descriptors
}

fn same_prefix(previous: &TaggedRow, current: &TaggedRow, columns: &[Option<usize>]) -> bool {
    columns
        .iter()
        .flatten()
        .all(|&index| previous.cells.get(index) == current.cells.get(index))
}
