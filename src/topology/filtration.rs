//! Vietoris-Rips Filtration Construction
//!
//! The Vietoris-Rips complex VR_ε(X) is a simplicial complex where:
//! - 0-simplices are the points in X
//! - A k-simplex [v₀, ..., vₖ] exists iff d(vᵢ, vⱼ) ≤ ε for all i,j
//!
//! Every simplex enters the filtration at its diameter (the longest of its
//! edges). Construction only needs proximity queries, expressed by the
//! [`FiltrationBuilder`] capability; [`DistanceMatrix`] answers them by
//! brute force over precomputed distances.

use ndarray::Array2;
use std::collections::HashMap;

use super::DistanceMetric;
use crate::error::{Error, Result};

/// Proximity queries needed to build a Rips filtration
pub trait FiltrationBuilder {
    /// Number of points
    fn n_points(&self) -> usize;

    /// Distance between points i and j
    fn distance(&self, i: usize, j: usize) -> f64;

    /// Indices j ≠ `point` with d(point, j) ≤ `radius`, in any order
    fn neighbors_within(&self, point: usize, radius: f64) -> Vec<usize>;

    /// Component label of every point in the ε-neighbourhood graph,
    /// numbered 0.. in order of each component's first point (Union-Find)
    fn component_labels(&self, radius: f64) -> Vec<usize> {
        let n = self.n_points();
        let mut parent: Vec<usize> = (0..n).collect();
        let mut rank = vec![0usize; n];

        fn find(parent: &mut [usize], i: usize) -> usize {
            if parent[i] != i {
                parent[i] = find(parent, parent[i]);
            }
            parent[i]
        }

        fn union(parent: &mut [usize], rank: &mut [usize], x: usize, y: usize) {
            let rx = find(parent, x);
            let ry = find(parent, y);
            if rx != ry {
                if rank[rx] < rank[ry] {
                    parent[rx] = ry;
                } else if rank[rx] > rank[ry] {
                    parent[ry] = rx;
                } else {
                    parent[ry] = rx;
                    rank[rx] += 1;
                }
            }
        }

        for i in 0..n {
            for j in self.neighbors_within(i, radius) {
                if j > i {
                    union(&mut parent, &mut rank, i, j);
                }
            }
        }

        let mut labels = vec![usize::MAX; n];
        let mut root_label = HashMap::new();
        for i in 0..n {
            let root = find(&mut parent, i);
            let next = root_label.len();
            labels[i] = *root_label.entry(root).or_insert(next);
        }
        labels
    }

    /// Count connected components of the ε-neighbourhood graph
    fn components_within(&self, radius: f64) -> usize {
        self.component_labels(radius)
            .into_iter()
            .max()
            .map_or(0, |m| m + 1)
    }
}

/// Precomputed pairwise distances
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    distances: Array2<f64>,
}

impl DistanceMatrix {
    /// Compute distances between the rows of `points`
    pub fn from_points(points: &Array2<f64>, metric: DistanceMetric) -> Self {
        Self {
            distances: metric.pairwise(points),
        }
    }

    /// Use a precomputed matrix; it must be square with finite entries
    pub fn from_matrix(distances: Array2<f64>) -> Result<Self> {
        if distances.nrows() != distances.ncols() {
            return Err(Error::DimensionMismatch {
                expected: distances.nrows(),
                actual: distances.ncols(),
            });
        }
        if distances.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(Error::MalformedDataset {
                line: 0,
                message: "distance matrix has negative or non-finite entries".into(),
            });
        }
        Ok(Self { distances })
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.distances
    }

    pub fn max_distance(&self) -> f64 {
        self.distances.iter().cloned().fold(0.0, f64::max)
    }
}

impl FiltrationBuilder for DistanceMatrix {
    fn n_points(&self) -> usize {
        self.distances.nrows()
    }

    fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances[[i, j]]
    }

    fn neighbors_within(&self, point: usize, radius: f64) -> Vec<usize> {
        self.distances
            .row(point)
            .iter()
            .enumerate()
            .filter(|&(j, &d)| j != point && d <= radius)
            .map(|(j, _)| j)
            .collect()
    }
}

/// A simplex in the filtration with its birth value
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilteredSimplex {
    /// Vertex indices (sorted)
    pub vertices: Vec<usize>,
    /// Filtration value when simplex appears
    pub birth: f64,
}

impl FilteredSimplex {
    pub fn dimension(&self) -> usize {
        self.vertices.len() - 1
    }
}

/// All Rips simplices of dimension ≤ `max_simplex_dim` with diameter ≤
/// `max_edge_length`, sorted by (birth, dimension, vertices)
pub(crate) fn rips_simplices<F: FiltrationBuilder + ?Sized>(
    builder: &F,
    max_edge_length: f64,
    max_simplex_dim: usize,
) -> Vec<FilteredSimplex> {
    let n = builder.n_points();

    // Upper neighbourhoods: j > i within range, sorted for binary search
    let upper: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            let mut up: Vec<usize> = builder
                .neighbors_within(i, max_edge_length)
                .into_iter()
                .filter(|&j| j > i)
                .collect();
            up.sort_unstable();
            up.dedup();
            up
        })
        .collect();

    let mut simplices = Vec::new();
    for v in 0..n {
        let vertex = FilteredSimplex {
            vertices: vec![v],
            birth: 0.0,
        };
        if max_simplex_dim > 0 {
            expand(builder, &upper, &vertex, &upper[v], max_simplex_dim, &mut simplices);
        }
        simplices.push(vertex);
    }

    simplices.sort_by(|a, b| {
        a.birth
            .total_cmp(&b.birth)
            .then(a.dimension().cmp(&b.dimension()))
            .then(a.vertices.cmp(&b.vertices))
    });
    simplices
}

/// Extend `simplex` by every candidate that is a common neighbour of all its vertices
fn expand<F: FiltrationBuilder + ?Sized>(
    builder: &F,
    upper: &[Vec<usize>],
    simplex: &FilteredSimplex,
    candidates: &[usize],
    max_simplex_dim: usize,
    out: &mut Vec<FilteredSimplex>,
) {
    for &c in candidates {
        let birth = simplex
            .vertices
            .iter()
            .map(|&u| builder.distance(u, c))
            .fold(simplex.birth, f64::max);
        let mut vertices = simplex.vertices.clone();
        vertices.push(c);
        let coface = FilteredSimplex { vertices, birth };

        if coface.dimension() < max_simplex_dim {
            let next: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&w| w > c && upper[c].binary_search(&w).is_ok())
                .collect();
            if !next.is_empty() {
                expand(builder, upper, &coface, &next, max_simplex_dim, out);
            }
        }
        out.push(coface);
    }
}
