//! Network Module: Structure of Mapper Graphs
//!
//! Component counts, degree statistics, clustering, diameter and
//! modularity-based communities of the graph of scenario clusters.

mod metrics;

pub use metrics::NetworkMetrics;
