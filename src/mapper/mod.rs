//! Mapper Module: Graph Summaries of Scenario Point Clouds
//!
//! The Mapper construction runs in two phases, each behind its own trait:
//!
//! 1. **Cover**: a [`Lens`] projects every point to ℝᵏ and the [`Cover`]
//!    splits the image into overlapping hypercubes.
//! 2. **Cluster**: a [`Clusterer`] partitions the preimage of each cube in
//!    the full feature space. Two branches of outcomes that share a lens
//!    value therefore end up in different nodes.
//!
//! Every cluster becomes a node; nodes whose preimages share samples are
//! joined by an edge weighted by the number of shared samples.

mod builder;
mod cluster;
mod cover;
mod graph;
mod lens;

pub use builder::MapperBuilder;
pub use cluster::{Clusterer, Dbscan, SingleLinkage, TrivialClusterer};
pub use cover::{Cover, Interval};
pub use graph::{MapperEdge, MapperGraph, MapperNode, MapperSettings};
pub use lens::{CentroidDistanceLens, ColumnLens, FnLens, Lens, PrincipalComponentLens};
