//! Clustering of cover preimages in the full feature space
//!
//! Every clusterer returns a partition of its input rows: each row lands in
//! exactly one cluster, rows inside a cluster are ascending, and clusters
//! are ordered by their first row.

use ndarray::Array2;
use std::collections::VecDeque;

use crate::topology::{DistanceMatrix, DistanceMetric, FiltrationBuilder};

pub trait Clusterer {
    /// Partition the rows of `points` into clusters of row indices
    fn cluster(&self, points: &Array2<f64>) -> Vec<Vec<usize>>;

    fn name(&self) -> String;
}

fn groups_from_labels(labels: &[usize]) -> Vec<Vec<usize>> {
    let k = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut groups = vec![Vec::new(); k];
    for (row, &label) in labels.iter().enumerate() {
        groups[label].push(row);
    }
    groups.retain(|g| !g.is_empty());
    groups.sort_by_key(|g| g[0]);
    groups
}

/// Connected components of the graph joining points closer than `threshold`
#[derive(Debug, Clone)]
pub struct SingleLinkage {
    pub threshold: f64,
    pub metric: DistanceMetric,
}

impl SingleLinkage {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            metric: DistanceMetric::default(),
        }
    }
}

impl Clusterer for SingleLinkage {
    fn cluster(&self, points: &Array2<f64>) -> Vec<Vec<usize>> {
        let distances = DistanceMatrix::from_points(points, self.metric);
        groups_from_labels(&distances.component_labels(self.threshold))
    }

    fn name(&self) -> String {
        format!("single_linkage(threshold={})", self.threshold)
    }
}

/// Density-based clustering (DBSCAN)
///
/// A core point has at least `min_samples` points (itself included) within
/// `eps`. Clusters grow from core points in row order; border points join
/// the first cluster that reaches them. Noise points become singleton
/// clusters, so every preimage point ends up in some node.
#[derive(Debug, Clone)]
pub struct Dbscan {
    pub eps: f64,
    pub min_samples: usize,
    pub metric: DistanceMetric,
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples,
            metric: DistanceMetric::default(),
        }
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 3)
    }
}

impl Clusterer for Dbscan {
    fn cluster(&self, points: &Array2<f64>) -> Vec<Vec<usize>> {
        let distances = DistanceMatrix::from_points(points, self.metric);
        let n = distances.n_points();
        let neighbours: Vec<Vec<usize>> = (0..n).map(|i| distances.neighbors_within(i, self.eps)).collect();
        let is_core = |i: usize| neighbours[i].len() + 1 >= self.min_samples;

        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut next_label = 0;

        for seed in 0..n {
            if labels[seed].is_some() || !is_core(seed) {
                continue;
            }
            let label = next_label;
            next_label += 1;
            labels[seed] = Some(label);

            let mut queue: VecDeque<usize> = VecDeque::from([seed]);
            while let Some(p) = queue.pop_front() {
                if !is_core(p) {
                    continue;
                }
                for &q in &neighbours[p] {
                    if labels[q].is_none() {
                        labels[q] = Some(label);
                        queue.push_back(q);
                    }
                }
            }
        }

        // Noise
        let labels: Vec<usize> = labels
            .into_iter()
            .map(|l| {
                l.unwrap_or_else(|| {
                    next_label += 1;
                    next_label - 1
                })
            })
            .collect();
        groups_from_labels(&labels)
    }

    fn name(&self) -> String {
        format!("dbscan(eps={}, min_samples={})", self.eps, self.min_samples)
    }
}

/// One cluster per cover element
#[derive(Debug, Clone, Copy, Default)]
pub struct TrivialClusterer;

impl Clusterer for TrivialClusterer {
    fn cluster(&self, points: &Array2<f64>) -> Vec<Vec<usize>> {
        if points.nrows() == 0 {
            return Vec::new();
        }
        vec![(0..points.nrows()).collect()]
    }

    fn name(&self) -> String {
        "trivial".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_single_linkage() {
        let points = array![[0.0], [10.0], [0.4], [10.3], [0.8]];
        let clusters = SingleLinkage::new(0.5).cluster(&points);
        assert_eq!(clusters, vec![vec![0, 2, 4], vec![1, 3]]);
    }

    #[test]
    fn test_dbscan_noise_as_singletons() {
        let points = array![[0.0], [0.1], [0.2], [5.0], [9.0], [9.1], [9.2], [9.3]];
        let clusters = Dbscan::new(0.15, 3).cluster(&points);
        assert_eq!(clusters, vec![vec![0, 1, 2], vec![3], vec![4, 5, 6, 7]]);

        let covered: usize = clusters.iter().map(Vec::len).sum();
        assert_eq!(covered, points.nrows());
    }

    #[test]
    fn test_dbscan_border_point() {
        // Point 3 is within eps of core point 2 but has too few neighbours itself
        let points = array![[0.0], [0.1], [0.2], [0.3]];
        let clusters = Dbscan::new(0.11, 3).cluster(&points);
        assert_eq!(clusters, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_trivial() {
        let points = array![[0.0], [100.0]];
        assert_eq!(TrivialClusterer.cluster(&points), vec![vec![0, 1]]);
        assert!(TrivialClusterer.cluster(&Array2::zeros((0, 1))).is_empty());
    }
}
