//! FILENAME: core/summary-engine/src/value.rs
//! PURPOSE: Cell values flowing through the summary pipeline.
//! CONTEXT: Group cells are used as hash keys when rows are partitioned, so
//! values need total equality and hashing (NaN equals NaN).

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A single cell value from the dataset or from an aggregated result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
    /// Group slot that a subtotal or grand-total row does not cover.
    NotApplicable,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, CellValue::NotApplicable)
    }

    fn discriminant(&self) -> u8 {
        match self {
            CellValue::Empty => 0,
            CellValue::Number(_) => 1,
            CellValue::Text(_) => 2,
            CellValue::Boolean(_) => 3,
            CellValue::Error(_) => 4,
            CellValue::NotApplicable => 5,
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::NotApplicable, CellValue::NotApplicable) => true,
            (CellValue::Number(a), CellValue::Number(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            (CellValue::Error(a), CellValue::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            CellValue::Number(n) => {
                if n.is_nan() {
                    u64::MAX.hash(state);
                } else if *n == 0.0 {
                    // -0.0 == 0.0, so both must hash alike
                    0u64.hash(state);
                } else {
                    n.to_bits().hash(state);
                }
            }
            CellValue::Text(s) | CellValue::Error(s) => s.hash(state),
            CellValue::Boolean(b) => b.hash(state),
            CellValue::Empty | CellValue::NotApplicable => {}
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_nan_values_are_equal_and_hash_alike() {
        let mut set = FxHashSet::default();
        set.insert(CellValue::Number(f64::NAN));
        set.insert(CellValue::Number(f64::NAN));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_signed_zero_collapses() {
        let mut set = FxHashSet::default();
        set.insert(CellValue::Number(0.0));
        set.insert(CellValue::Number(-0.0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_sentinel_differs_from_empty() {
        assert_ne!(CellValue::NotApplicable, CellValue::Empty);
        assert_ne!(CellValue::NotApplicable, CellValue::text(""));
    }
}
