//! Dataset Module: From Simulation Runs to Point Clouds
//!
//! The external simulator turns each design sample into a table of named
//! output series. This module
//! - merges those tables into one record per sample (`merge`),
//! - reads and writes the unified dataset as text,
//! - extracts numeric point clouds for the topological analyses.
//!
//! Both analyses need the whole cloud at once (a global filtration or a
//! global cover), so `merge` must see a completeness-flagged outcome for
//! every sample before any cloud is built.

mod point_cloud;
mod table;
mod unifier;

pub use point_cloud::{build_point_cloud, Exclusion, ExclusionReason, PointCloud, Scaling};
pub use table::{read_dataset, write_dataset};
pub use unifier::{
    merge, CoverageGap, MetricValue, OutputTable, RunOutcome, RunStatus, UnifiedDataset, UnifiedRecord,
};
