//! # Scenario-TDA
//!
//! Topological Summaries of Simulation Scenario Ensembles
//! via Persistent Homology and the Mapper Algorithm
//!
//! ## Workflow
//!
//! An integrated assessment model is run many times over a designed sample
//! of its uncertain inputs (climate sensitivity, discount rates, technology
//! costs, ...). The cloud of outcomes is then inspected for qualitative
//! structure: separated regimes of futures, transition boundaries, cyclic
//! trade-offs.
//!
//! 1. **Sampling**: a [`ParameterSpace`] plus a [`Strategy`] (Latin
//!    hypercube, orthogonal, Sobol, Halton, random) yields a reproducible
//!    [`Design`]
//!
//! 2. **Unification**: per-run output tables are merged with the design
//!    into a [`UnifiedDataset`], one record per sample, failures recorded
//!
//! 3. **Persistent Homology**: Vietoris-Rips filtration of a chosen
//!    [`PointCloud`], reduced to (birth, death) pairs per dimension
//!
//! 4. **Mapper**: lens → overlapping cover → clustering in feature space,
//!    giving a graph of scenario clusters with [`NetworkMetrics`]
//!
//! Every topological feature can be traced back to the sample ids that
//! produced it.
//!
//! ## Reproducibility
//!
//! All randomness is drawn from explicitly seeded generators. Persistence,
//! Mapper and the network metrics are deterministic functions of their
//! inputs.
//!
//! ## References
//!
//! - Edelsbrunner & Harer, "Computational Topology" (2010)
//! - Singh, Mémoli & Carlsson, "Topological Methods for the Analysis of
//!   High Dimensional Data Sets and 3D Object Recognition" (2007)
//! - McKay, Beckman & Conover, "A Comparison of Three Methods for Selecting
//!   Values of Input Variables" (1979)
//! - Joe & Kuo, "Constructing Sobol sequences with better two-dimensional
//!   projections" (2008)

pub mod config;
pub mod dataset;
pub mod diagnostic;
pub mod error;
pub mod export;
pub mod mapper;
pub mod network;
pub mod pipeline;
pub mod sampling;
pub mod topology;

mod tabular;

pub use diagnostic::Diagnostic;
pub use error::{Error, ErrorKind, Result};

// Re-exports from sampling
pub use sampling::{
    generate,
    generate_with_rng,
    Design,
    LhsCriterion,
    Parameter,
    ParameterKind,
    ParameterSpace,
    Sample,
    Strategy,
};

// Re-exports from dataset
pub use dataset::{
    build_point_cloud,
    merge,
    read_dataset,
    write_dataset,
    MetricValue,
    OutputTable,
    PointCloud,
    RunOutcome,
    RunStatus,
    UnifiedDataset,
};

// Re-exports from topology
pub use topology::{
    BettiCurve,
    BettiNumbers,
    Death,
    DistanceMetric,
    PersistenceAnalyzer,
    PersistenceDiagram,
    PersistencePair,
};

// Re-exports from mapper
pub use mapper::{
    Clusterer,
    Cover,
    Dbscan,
    Lens,
    MapperBuilder,
    MapperGraph,
};

pub use config::{AnalysisConfig, SamplingRequest};
pub use network::NetworkMetrics;
pub use pipeline::{analyze, AnalysisReport};
