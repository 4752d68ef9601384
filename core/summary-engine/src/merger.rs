//! FILENAME: core/summary-engine/src/merger.rs
//! Row Merger - stitches per-key result sets into one tagged sequence.
//!
//! Every output row is full width: one slot per detail group column (in
//! configured order) followed by the measures. Slots a rollup row does not
//! cover hold `CellValue::NotApplicable`. Rows are appended strictly in plan
//! order; ordering for display is the grouping manager's job.

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::plan::{AggregationKey, QueryPlan};
use crate::provider::{ResultProvider, ResultRows};
use crate::value::CellValue;

/// A result row plus the tags the engine assigns to it. The tags live next
/// to the cells, never inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedRow {
    pub cells: Vec<CellValue>,

    /// Number of leading group columns that are active for this row.
    /// Full detail rows carry the maximum, the grand total carries 0.
    pub grouping_level: usize,

    pub is_subtotal: bool,

    pub is_grand_total: bool,
}

impl TaggedRow {
    pub fn detail(cells: Vec<CellValue>, level: usize) -> Self {
        TaggedRow {
            cells,
            grouping_level: level,
            is_subtotal: false,
            is_grand_total: false,
        }
    }

    pub fn subtotal(cells: Vec<CellValue>, level: usize) -> Self {
        TaggedRow {
            cells,
            grouping_level: level,
            is_subtotal: true,
            is_grand_total: level == 0,
        }
    }

    /// Whether this row summarizes over the group column at `position`.
    pub fn is_total_for(&self, position: usize) -> bool {
        self.is_subtotal && self.grouping_level <= position
    }
}

/// Merged rows plus the keys that had to be dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub rows: Vec<TaggedRow>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Fetches every key of `plan` from `provider` and concatenates the tagged
/// results. A key whose call fails, or which returns any row of the wrong
/// width, contributes nothing and yields a `ProviderFailure` diagnostic.
pub fn merge<P: ResultProvider + ?Sized>(plan: &QueryPlan, provider: &P) -> MergeOutcome {
    let detail_groups = plan.detail_groups().cloned().unwrap_or_default();
    let detail_level = detail_groups.len();
    let measure_count = plan.aggregations.len();

    let mut outcome = MergeOutcome::default();

    for key in plan.keys() {
        let rows = match provider.provide(&key) {
            Ok(rows) => rows,
            Err(e) => {
                drop_key(&mut outcome, key, e.to_string());
                continue;
            }
        };

        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != key.row_width())
        {
            let reason = format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                key.row_width()
            );
            drop_key(&mut outcome, key, reason);
            continue;
        }

        let slots: Vec<usize> = key
            .groups
            .iter()
            .filter_map(|name| detail_groups.names().iter().position(|n| n == name))
            .collect();
        let level = key.groups.len();
        let is_subtotal = level < detail_level;

        log_debug!("MERGE", "key={} rows={} level={}", key, rows.len(), level);

        outcome.rows.extend(
            widen(rows, &slots, detail_level, measure_count).map(|cells| {
                if is_subtotal {
                    TaggedRow::subtotal(cells, level)
                } else {
                    TaggedRow::detail(cells, level)
                }
            }),
        );
    }

    outcome
}

fn drop_key(outcome: &mut MergeOutcome, key: AggregationKey, reason: String) {
    let diagnostic = Diagnostic::ProviderFailure { key, reason };
    log_warn!("MERGE", "{}", diagnostic);
    outcome.diagnostics.push(diagnostic);
}

/// Places each row's group cells into their detail slots and fills the rest
/// with the sentinel.
fn widen(
    rows: ResultRows,
    slots: &[usize],
    detail_level: usize,
    measure_count: usize,
) -> impl Iterator<Item = Vec<CellValue>> + '_ {
    rows.into_iter().map(move |row| {
        let mut cells = vec![CellValue::NotApplicable; detail_level];
        cells.reserve(measure_count);

        let mut row = row.into_iter();
        for &slot in slots {
            if let Some(value) = row.next() {
                cells[slot] = value;
            }
        }
        cells.extend(row);
        cells
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::plan::build_plan;

    fn plan(show_grand_total: bool) -> QueryPlan {
        build_plan(
            &["Region".to_string(), "Product".to_string()],
            &[true, true],
            &["Sales".to_string()],
            show_grand_total,
        )
    }

    fn provider(key: &AggregationKey) -> Result<ResultRows, ProviderError> {
        Ok(match key.groups.len() {
            2 => vec![
                vec!["US".into(), "A".into(), 10.0.into()],
                vec!["US".into(), "B".into(), 20.0.into()],
            ],
            1 => vec![vec!["US".into(), 30.0.into()]],
            _ => vec![vec![30.0.into()]],
        })
    }

    #[test]
    fn test_merge_concatenates_in_plan_order() {
        let outcome = merge(&plan(true), &provider);

        assert!(outcome.diagnostics.is_empty());
        let levels: Vec<usize> = outcome.rows.iter().map(|r| r.grouping_level).collect();
        assert_eq!(levels, vec![2, 2, 1, 0]);

        assert!(!outcome.rows[0].is_subtotal);
        assert!(outcome.rows[2].is_subtotal);
        assert!(!outcome.rows[2].is_grand_total);
        assert!(outcome.rows[3].is_grand_total);
    }

    #[test]
    fn test_merge_fills_uncovered_slots_with_sentinel() {
        let outcome = merge(&plan(true), &provider);

        assert_eq!(
            outcome.rows[2].cells,
            vec![CellValue::text("US"), CellValue::NotApplicable, CellValue::Number(30.0)]
        );
        assert_eq!(
            outcome.rows[3].cells,
            vec![CellValue::NotApplicable, CellValue::NotApplicable, CellValue::Number(30.0)]
        );
    }

    #[test]
    fn test_failed_key_is_dropped_with_diagnostic() {
        let failing = |key: &AggregationKey| -> Result<ResultRows, ProviderError> {
            if key.groups.len() == 1 {
                Err(ProviderError::Failed("query timed out".into()))
            } else {
                provider(key)
            }
        };

        let outcome = merge(&plan(true), &failing);

        assert_eq!(outcome.rows.len(), 3);
        assert!(outcome.rows.iter().all(|r| r.grouping_level != 1));
        assert!(matches!(
            &outcome.diagnostics[..],
            [Diagnostic::ProviderFailure { key, .. }] if key.groups.len() == 1
        ));
    }

    #[test]
    fn test_malformed_rows_drop_their_key() {
        let malformed = |key: &AggregationKey| -> Result<ResultRows, ProviderError> {
            if key.groups.len() == 2 {
                Ok(vec![
                    vec!["US".into(), "A".into(), 10.0.into()],
                    vec!["US".into(), 20.0.into()],
                ])
            } else {
                provider(key)
            }
        };

        let outcome = merge(&plan(false), &malformed);

        assert_eq!(outcome.rows.len(), 1);
        assert!(outcome.rows[0].is_subtotal);
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn test_zero_group_columns_is_not_a_subtotal() {
        let plan = build_plan(&[], &[], &["Sales".to_string()], true);
        let outcome = merge(&plan, &provider);

        assert_eq!(outcome.rows.len(), 1);
        assert!(!outcome.rows[0].is_subtotal);
        assert!(!outcome.rows[0].is_grand_total);
    }

    #[test]
    fn test_merge_does_not_alias_provider_rows() {
        let snapshot_rows = vec![vec![CellValue::text("US"), CellValue::Number(1.0)]];
        let plan = build_plan(&["Region".to_string()], &[true], &["Sales".to_string()], false);
        let fixed = |_: &AggregationKey| -> Result<ResultRows, ProviderError> {
            Ok(snapshot_rows.clone())
        };

        let mut outcome = merge(&plan, &fixed);
        outcome.rows[0].cells[0] = CellValue::text("EU");

        assert_eq!(snapshot_rows[0][0], CellValue::text("US"));
    }
}
