//! FILENAME: core/summary-engine/src/error.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::AggregationKey;

/// The settings role a configured column name was listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Group,
    Pivot,
    Value,
    Unused,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Group => "group",
            Role::Pivot => "pivot",
            Role::Value => "value",
            Role::Unused => "unused",
        };
        f.write_str(name)
    }
}

/// Recoverable problems surfaced next to the display model.
/// None of these abort a computation.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    #[error("{role} column '{column}' is not present in the dataset")]
    ConfigurationMismatch { role: Role, column: String },

    #[error("results for {key} were dropped: {reason}")]
    ProviderFailure { key: AggregationKey, reason: String },

    #[error("row {row} has {actual} cells, expected {expected}")]
    MalformedRow { row: usize, expected: usize, actual: usize },
}

/// Errors returned by a `ResultProvider`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider failed: {0}")]
    Failed(String),

    #[error("no result available for this key")]
    Missing,
}

/// Caller-facing errors. Data problems are diagnostics, not errors.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Invalid visualization settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),

    #[error("Computation for generation {computed} is stale (current generation is {current})")]
    StaleComputation { computed: u64, current: u64 },

    #[error("Dataset does not match the one generation {generation} was prepared for")]
    DatasetMismatch { generation: u64 },
}
