//! FILENAME: tests/common/mod.rs
//! Fixtures for summary engine integration tests.

#![allow(dead_code)]

use summary_engine::{
    AggregationKey, CellValue, Column, Dataset, DisplayModel, MergeDescriptor, ProviderError,
    ResultRows,
};

/// Sales data: three regions, two products, two quarters.
pub struct SalesFixture;

impl SalesFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["Region", "Product", "Quarter", "Sales", "Quantity"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("North", "Widget", "Q1", 10000.0, 100.0),
            ("North", "Widget", "Q2", 12000.0, 120.0),
            ("North", "Gadget", "Q1", 8000.0, 80.0),
            ("North", "Gadget", "Q2", 9000.0, 90.0),
            ("South", "Widget", "Q1", 15000.0, 150.0),
            ("South", "Widget", "Q2", 14000.0, 140.0),
            ("South", "Gadget", "Q1", 11000.0, 110.0),
            ("South", "Gadget", "Q2", 13000.0, 130.0),
            ("East", "Widget", "Q1", 9000.0, 90.0),
            ("East", "Widget", "Q2", 11000.0, 110.0),
            ("East", "Gadget", "Q1", 7000.0, 70.0),
            ("East", "Gadget", "Q2", 8500.0, 85.0),
        ]
    }

    pub fn columns() -> Vec<Column> {
        Self::headers().into_iter().map(Column::new).collect()
    }

    pub fn dataset() -> Dataset {
        let rows = Self::data()
            .into_iter()
            .map(|(region, product, quarter, sales, quantity)| {
                vec![
                    CellValue::text(region),
                    CellValue::text(product),
                    CellValue::text(quarter),
                    CellValue::Number(sales),
                    CellValue::Number(quantity),
                ]
            })
            .collect();
        Dataset::new(Self::columns(), rows)
    }
}

/// Stand-in for the external aggregation engine: sums the fixture rows for
/// any key, groups in order of first appearance.
pub fn sum_provider(key: &AggregationKey) -> Result<ResultRows, ProviderError> {
    let dataset = SalesFixture::dataset();
    let index_of = |name: &str| {
        dataset
            .column_index(name)
            .ok_or_else(|| ProviderError::Failed(format!("unknown column {}", name)))
    };

    let group_indexes = key
        .groups
        .iter()
        .map(|n| index_of(n.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let value_indexes = key
        .aggregations
        .iter()
        .map(|n| index_of(n.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: Vec<(Vec<CellValue>, Vec<f64>)> = Vec::new();
    for row in &dataset.rows {
        let group: Vec<CellValue> = group_indexes.iter().map(|&i| row[i].clone()).collect();
        let position = match groups.iter().position(|(g, _)| *g == group) {
            Some(position) => position,
            None => {
                groups.push((group, vec![0.0; value_indexes.len()]));
                groups.len() - 1
            }
        };
        for (sum, &i) in groups[position].1.iter_mut().zip(&value_indexes) {
            if let CellValue::Number(n) = row[i] {
                *sum += n;
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|(mut cells, sums)| {
            cells.extend(sums.into_iter().map(CellValue::Number));
            cells
        })
        .collect())
}

/// Group cell as text, `-` for the uncovered-slot marker.
pub fn cell_label(cell: &CellValue) -> String {
    match cell {
        CellValue::NotApplicable => "-".to_string(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => n.to_string(),
        other => format!("{:?}", other),
    }
}

/// Compact textual form of a row: group cells joined by commas, `-` for
/// uncovered slots, `*` suffix for rollup rows.
pub fn row_label(model: &DisplayModel, row: usize) -> String {
    let display_row = &model.rows[row];
    let mut label = display_row.cells[..model.group_column_count]
        .iter()
        .map(cell_label)
        .collect::<Vec<_>>()
        .join(",");
    if display_row.is_subtotal {
        label.push('*');
    }
    label
}

pub fn row_labels(model: &DisplayModel) -> Vec<String> {
    (0..model.rows.len()).map(|r| row_label(model, r)).collect()
}

/// Assert that every group column's spans cover each row exactly once and
/// that continuations point back at a real span start.
pub fn assert_spans_partition_rows(model: &DisplayModel) {
    for position in 0..model.group_column_count {
        let mut covered = vec![0usize; model.rows.len()];
        for (row, display_row) in model.rows.iter().enumerate() {
            match display_row.merges[position] {
                MergeDescriptor::Start { height } => {
                    assert!(height >= 1, "empty span at row {}", row);
                    for c in &mut covered[row..row + height] {
                        *c += 1;
                    }
                }
                MergeDescriptor::Continuation { start_row } => {
                    assert!(start_row < row, "continuation at {} points forward", row);
                    assert!(matches!(
                        model.rows[start_row].merges[position],
                        MergeDescriptor::Start { height } if start_row + height > row
                    ));
                }
            }
        }
        assert!(
            covered.iter().all(|&c| c == 1),
            "column {} coverage {:?}",
            position,
            covered
        );
    }
}
