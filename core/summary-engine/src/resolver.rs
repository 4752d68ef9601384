//! FILENAME: core/summary-engine/src/resolver.rs
//! Settings Resolver - maps column-role settings onto a concrete dataset.
//!
//! Settings name columns; datasets order them. Resolution is strict exact-name
//! matching, and a name that no longer exists is dropped as if it had never
//! been selected. The configured order is preserved because it is the
//! nesting order of the row and column hierarchies.

use rustc_hash::FxHashSet;

use crate::definition::{Column, Dataset, SummaryTableSettings};
use crate::error::{Diagnostic, Role};
use crate::value::CellValue;

/// Role assignments expressed as indexes into the dataset's column array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedColumns {
    pub groups: Vec<usize>,
    pub pivots: Vec<usize>,
    pub values: Vec<usize>,
    pub unused: Vec<usize>,

    /// "Show totals" flag per entry of `groups`.
    pub show_totals: Vec<bool>,

    /// Configured names that could not be resolved.
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedColumns {
    /// True when no column is assigned to a group, pivot or value role.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.pivots.is_empty() && self.values.is_empty()
    }

    pub fn group_names(&self, columns: &[Column]) -> Vec<String> {
        names_at(columns, &self.groups)
    }

    pub fn pivot_names(&self, columns: &[Column]) -> Vec<String> {
        names_at(columns, &self.pivots)
    }

    pub fn value_names(&self, columns: &[Column]) -> Vec<String> {
        names_at(columns, &self.values)
    }
}

fn names_at(columns: &[Column], indexes: &[usize]) -> Vec<String> {
    indexes.iter().map(|&i| columns[i].name.clone()).collect()
}

/// Resolves every role list of `settings` against `columns`. Never fails.
pub fn resolve(settings: &SummaryTableSettings, columns: &[Column]) -> ResolvedColumns {
    let mut diagnostics = Vec::new();

    let groups = resolve_role(&settings.groups_sources, columns, Role::Group, &mut diagnostics);
    let pivots = resolve_role(&settings.columns_source, columns, Role::Pivot, &mut diagnostics);
    let values = resolve_role(&settings.values_sources, columns, Role::Value, &mut diagnostics);
    let unused = resolve_role(&settings.unused_columns, columns, Role::Unused, &mut diagnostics);

    let show_totals = groups
        .iter()
        .map(|&i| {
            let column = &columns[i];
            settings
                .metadata(&column.name)
                .map(|m| m.show_totals)
                .or(column.show_totals)
                .unwrap_or(true)
        })
        .collect();

    for diagnostic in &diagnostics {
        log_warn!("RESOLVE", "{}", diagnostic);
    }
    log_debug!(
        "RESOLVE",
        "groups={:?} pivots={:?} values={:?} unused={:?}",
        groups,
        pivots,
        values,
        unused
    );

    ResolvedColumns {
        groups,
        pivots,
        values,
        unused,
        show_totals,
        diagnostics,
    }
}

fn resolve_role(
    names: &[String],
    columns: &[Column],
    role: Role,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<usize> {
    let mut seen = FxHashSet::default();
    let mut indexes = Vec::with_capacity(names.len());

    for name in names {
        match columns.iter().position(|c| &c.name == name) {
            Some(index) => {
                if seen.insert(index) {
                    indexes.push(index);
                }
            }
            None => diagnostics.push(Diagnostic::ConfigurationMismatch {
                role,
                column: name.clone(),
            }),
        }
    }

    indexes
}

/// Whether `settings` fit `columns` exactly: every configured name exists
/// and no column is claimed by two roles.
pub fn settings_are_valid(settings: &SummaryTableSettings, columns: &[Column]) -> bool {
    let mut claimed = FxHashSet::default();

    [
        &settings.groups_sources,
        &settings.columns_source,
        &settings.values_sources,
        &settings.unused_columns,
    ]
    .into_iter()
    .flat_map(|names| names.iter())
    .all(|name| columns.iter().any(|c| &c.name == name) && claimed.insert(name.as_str()))
}

impl Dataset {
    /// Projects rows onto the display column order (group columns, then value
    /// columns). Rows whose width disagrees with the column list are dropped.
    /// `resolved` must come from this dataset's columns.
    pub fn project(&self, resolved: &ResolvedColumns) -> (Vec<Vec<CellValue>>, Vec<Diagnostic>) {
        let expected = self.columns.len();
        let mut diagnostics = Vec::new();
        let mut rows = Vec::with_capacity(self.rows.len());

        for (row_index, row) in self.rows.iter().enumerate() {
            if row.len() != expected {
                let diagnostic = Diagnostic::MalformedRow {
                    row: row_index,
                    expected,
                    actual: row.len(),
                };
                log_warn!("RESOLVE", "{}", diagnostic);
                diagnostics.push(diagnostic);
                continue;
            }

            rows.push(
                resolved
                    .groups
                    .iter()
                    .chain(resolved.values.iter())
                    .map(|&i| row.get(i).cloned().unwrap_or(CellValue::NotApplicable))
                    .collect(),
            );
        }

        (rows, diagnostics)
    }
}
