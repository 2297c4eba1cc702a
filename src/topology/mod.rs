//! Topology Module: Persistent Homology of Scenario Ensembles
//!
//! - Distance metrics and the `FiltrationBuilder` proximity capability
//! - Exact persistence pairs from a Rips filtration
//! - Betti numbers and Betti curves read off the diagram
//!
//! ## Background
//!
//! Each simulation run is one point of a cloud X of outcomes. Filling in
//! every simplex whose points are pairwise within ε gives the nested Rips
//! complexes VR_ε(X); a feature is born at the ε where it first appears and dies
//! where it is filled in. Long-lived H₀ classes are well-separated regimes
//! of outcomes; long-lived H₁ classes are cyclic trade-offs.

mod analyzer;
mod betti;
mod distance;
mod filtration;
mod persistence;

pub use analyzer::{PersistenceAnalyzer, PersistenceResult, PersistenceSummary};
pub use betti::{BettiCurve, BettiNumbers};
pub use distance::DistanceMetric;
pub use filtration::{DistanceMatrix, FiltrationBuilder};
pub use persistence::{compute_persistence, Death, PersistenceDiagram, PersistencePair};
