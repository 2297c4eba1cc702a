//! Persistence analysis of scenario point clouds

use log::{info, warn};
use serde::Serialize;

use super::{compute_persistence, BettiNumbers, DistanceMatrix, DistanceMetric, PersistenceDiagram};
use crate::dataset::{PointCloud, UnifiedDataset};
use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};

/// Runs Vietoris-Rips persistence over point clouds
#[derive(Debug, Clone, Default)]
pub struct PersistenceAnalyzer {
    max_edge_length: Option<f64>,
}

/// Diagram plus the notes raised while computing it
#[derive(Debug, Clone, Serialize)]
pub struct PersistenceResult {
    pub diagram: PersistenceDiagram,
    pub metric: DistanceMetric,
    /// Row index → sample id of the analysed cloud
    pub sample_ids: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-dimension statistics of a diagram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistenceSummary {
    pub dimension: usize,
    pub pairs: usize,
    pub finite: usize,
    pub essential: usize,
    pub total_persistence: f64,
    pub max_persistence: f64,
    pub mean_persistence: f64,
    pub entropy: f64,
    /// βₐ at the requested threshold, if one was given
    pub betti_at_threshold: Option<usize>,
}

impl PersistenceAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the filtration at this scale
    pub fn with_max_edge_length(mut self, max_edge_length: f64) -> Self {
        self.max_edge_length = Some(max_edge_length);
        self
    }

    pub fn max_edge_length(&self) -> Option<f64> {
        self.max_edge_length
    }

    /// Extract the cloud to analyse; see [`PointCloud::build`]
    pub fn build_point_cloud(
        &self,
        dataset: &UnifiedDataset,
        columns: &[&str],
        standardize: bool,
    ) -> Result<PointCloud> {
        PointCloud::build(dataset, columns, standardize)
    }

    /// Persistence pairs of `cloud` in dimensions 0..=`max_dimension`
    pub fn compute(
        &self,
        cloud: &PointCloud,
        max_dimension: usize,
        metric: DistanceMetric,
    ) -> Result<PersistenceResult> {
        let n = cloud.n_points();
        if n < 2 {
            return Err(Error::InsufficientPoints { required: 2, actual: n });
        }
        if max_dimension >= n {
            return Err(Error::InvalidDimension { max_dimension, points: n });
        }
        let max_edge_length = match self.max_edge_length {
            Some(l) if l.is_nan() || l <= 0.0 => {
                return Err(Error::InvalidConfig(format!(
                    "max edge length must be positive, got {}",
                    l
                )))
            }
            Some(l) => l,
            None => f64::INFINITY,
        };

        let distances = DistanceMatrix::from_points(cloud.data(), metric);
        let mut diagnostics = cloud.diagnostics().to_vec();
        if distances.max_distance() == 0.0 {
            warn!("All {} points are identical", n);
            diagnostics.push(Diagnostic::IdenticalPoints { points: n });
        }

        let diagram = compute_persistence(&distances, max_dimension, max_edge_length);
        info!(
            "Persistence over {} points ({:?}): {} pairs up to H{}",
            n,
            metric,
            diagram.pairs().len(),
            max_dimension
        );

        Ok(PersistenceResult {
            diagram,
            metric,
            sample_ids: cloud.sample_ids().to_vec(),
            diagnostics,
        })
    }
}

impl PersistenceResult {
    pub fn betti_at(&self, scale: f64) -> BettiNumbers {
        BettiNumbers::at(&self.diagram, scale)
    }

    pub fn summaries(&self, threshold: Option<f64>) -> Vec<PersistenceSummary> {
        (0..=self.diagram.max_dimension())
            .map(|d| {
                let pairs = self.diagram.dim(d).len();
                let finite = self.diagram.finite(d).len();
                let total = self.diagram.total_persistence(d);
                PersistenceSummary {
                    dimension: d,
                    pairs,
                    finite,
                    essential: pairs - finite,
                    total_persistence: total,
                    max_persistence: self.diagram.max_persistence(d),
                    mean_persistence: if finite > 0 { total / finite as f64 } else { 0.0 },
                    entropy: self.diagram.persistence_entropy(d),
                    betti_at_threshold: threshold.map(|r| self.diagram.betti_at(d, r)),
                }
            })
            .collect()
    }
}
