//! FILENAME: core/summary-engine/src/lib.rs
//! Summary Table subsystem.
//!
//! This crate turns a dataset plus column-role settings into an ordered,
//! subtotal-annotated row sequence with row-span metadata for rendering.
//! Aggregation itself is delegated to a `ResultProvider`.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the summary table IS)
//! - `resolver`: Name-based column role resolution against a dataset
//! - `plan`: Which grouping/aggregation slices must be fetched
//! - `provider`: Boundary to the external aggregation engine
//! - `merger`: Stitching per-slice results into tagged rows
//! - `grouping`: Display order and merged cell spans
//! - `view`: Renderable output for the frontend (WHAT we display)
//! - `engine`: Pipeline orchestration (HOW we calculate)

#[macro_use]
pub mod logging;

pub mod value;
pub mod error;
pub mod definition;
pub mod resolver;
pub mod plan;
pub mod provider;
pub mod merger;
pub mod grouping;
pub mod view;
pub mod engine;

pub use value::*;
pub use error::{Diagnostic, ProviderError, Role, SummaryError};
pub use definition::*;
pub use resolver::{resolve, settings_are_valid, ResolvedColumns};
pub use plan::{build_plan, AggregationKey, Aggregations, Groups, QueryPlan};
pub use provider::{DetailFromDataset, ResultProvider, ResultRows, ResultSnapshot};
pub use merger::{merge, MergeOutcome, TaggedRow};
pub use grouping::{GroupingManager, GroupingOutput, MergeDescriptor};
pub use view::*;
pub use engine::{compute_display_model, Computation, SummaryTable};
