//! Persistent Homology via Boundary Matrix Reduction
//!
//! ## Algorithm Overview
//!
//! 1. Build the filtered Rips complex up to dimension `max_dimension + 1`
//! 2. Sort simplices by (birth, dimension, vertices) so faces precede cofaces
//! 3. Reduce the boundary matrix over Z/2 with left-to-right column additions
//! 4. Read pairs off the pivots: low(j) = i pairs the creator σᵢ with the
//!    destroyer σⱼ; a zero column whose simplex is never a pivot is essential
//!
//! ## Conventions
//!
//! - Every point is a vertex at scale 0, so H₀ holds exactly one pair per
//!   point, zero-length pairs included.
//! - Zero-length pairs in dimensions ≥ 1 carry no information and are dropped.
//! - βₖ(r) counts the features of the complex made of simplices with
//!   diameter strictly below r (vertices are present from r = 0).
//!
//! ## Reference
//!
//! Edelsbrunner, Letscher, Zomorodian (2002). "Topological Persistence
//! and Simplification". Discrete & Computational Geometry.

use log::debug;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use super::filtration::{rips_simplices, FilteredSimplex, FiltrationBuilder};

/// When a feature dies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Death {
    Finite(f64),
    /// Never dies within the filtration
    Essential,
}

/// A (birth, death) pair in one homology dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersistencePair {
    pub dimension: usize,
    pub birth: f64,
    pub death: Death,
}

impl PersistencePair {
    /// death − birth, `None` for essential features
    pub fn persistence(&self) -> Option<f64> {
        match self.death {
            Death::Finite(d) => Some(d - self.birth),
            Death::Essential => None,
        }
    }

    pub fn is_essential(&self) -> bool {
        self.death == Death::Essential
    }

    /// Whether the feature is present in the complex at scale `r`
    pub fn alive_at(&self, r: f64) -> bool {
        let born = self.dimension == 0 || self.birth < r;
        let survives = match self.death {
            Death::Finite(d) => d >= r,
            Death::Essential => true,
        };
        born && survives
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistenceDiagram {
    max_dimension: usize,
    pairs: Vec<PersistencePair>,
}

impl PersistenceDiagram {
    /// Pairs are kept sorted by (dimension, birth, death) with essential deaths last
    pub fn new(max_dimension: usize, mut pairs: Vec<PersistencePair>) -> Self {
        pairs.sort_by(|a, b| {
            a.dimension
                .cmp(&b.dimension)
                .then(a.birth.total_cmp(&b.birth))
                .then(match (a.death, b.death) {
                    (Death::Finite(x), Death::Finite(y)) => x.total_cmp(&y),
                    (Death::Finite(_), Death::Essential) => std::cmp::Ordering::Less,
                    (Death::Essential, Death::Finite(_)) => std::cmp::Ordering::Greater,
                    (Death::Essential, Death::Essential) => std::cmp::Ordering::Equal,
                })
        });
        Self { max_dimension, pairs }
    }

    pub fn max_dimension(&self) -> usize {
        self.max_dimension
    }

    pub fn pairs(&self) -> &[PersistencePair] {
        &self.pairs
    }

    /// Get pairs for dimension d
    pub fn dim(&self, d: usize) -> Vec<&PersistencePair> {
        self.pairs.iter().filter(|p| p.dimension == d).collect()
    }

    /// Get finite pairs for dimension d
    pub fn finite(&self, d: usize) -> Vec<&PersistencePair> {
        self.pairs
            .iter()
            .filter(|p| p.dimension == d && !p.is_essential())
            .collect()
    }

    pub fn essential_count(&self, d: usize) -> usize {
        self.pairs
            .iter()
            .filter(|p| p.dimension == d && p.is_essential())
            .count()
    }

    /// βₐ at scale r
    pub fn betti_at(&self, d: usize, r: f64) -> usize {
        self.pairs
            .iter()
            .filter(|p| p.dimension == d && p.alive_at(r))
            .count()
    }

    fn lifetimes(&self, d: usize) -> impl Iterator<Item = f64> + '_ {
        self.pairs
            .iter()
            .filter(move |p| p.dimension == d)
            .filter_map(PersistencePair::persistence)
    }

    /// Sum of finite lifetimes in dimension d
    pub fn total_persistence(&self, d: usize) -> f64 {
        self.lifetimes(d).sum()
    }

    pub fn max_persistence(&self, d: usize) -> f64 {
        self.lifetimes(d).fold(0.0, f64::max)
    }

    /// Largest finite death in any dimension
    pub fn max_finite_death(&self) -> Option<f64> {
        self.pairs
            .iter()
            .filter_map(|p| match p.death {
                Death::Finite(d) => Some(d),
                Death::Essential => None,
            })
            .reduce(f64::max)
    }

    /// Persistent (Shannon) entropy of dimension d
    ///
    /// H_P = -Σᵢ pᵢ log(pᵢ),  pᵢ = lᵢ / L
    ///
    /// over the finite, positive lifetimes lᵢ with total L.
    pub fn persistence_entropy(&self, d: usize) -> f64 {
        let lifetimes: Vec<f64> = self.lifetimes(d).filter(|&l| l > 0.0).collect();
        let total: f64 = lifetimes.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }

        let mut entropy = 0.0;
        for l in lifetimes {
            let p = l / total;
            entropy -= p * p.ln();
        }
        entropy
    }
}

/// Sparse column of the boundary matrix
#[derive(Debug, Clone, Default)]
struct SparseColumn {
    rows: BTreeSet<usize>,
}

impl SparseColumn {
    fn is_zero(&self) -> bool {
        self.rows.is_empty()
    }

    /// Largest non-zero row index
    fn low(&self) -> Option<usize> {
        self.rows.iter().next_back().copied()
    }

    /// Addition in Z/2Z
    fn toggle(&mut self, row: usize) {
        if !self.rows.remove(&row) {
            self.rows.insert(row);
        }
    }

    fn add_assign(&mut self, other: &SparseColumn) {
        for &row in &other.rows {
            self.toggle(row);
        }
    }
}

/// Compute persistence pairs in dimensions 0..=`max_dimension`
///
/// Simplices with diameter above `max_edge_length` are never added, so
/// features still alive at that scale are reported as essential.
pub fn compute_persistence<F: FiltrationBuilder + ?Sized>(
    builder: &F,
    max_dimension: usize,
    max_edge_length: f64,
) -> PersistenceDiagram {
    let simplices = rips_simplices(builder, max_edge_length, max_dimension + 1);
    debug!(
        "Filtration: {} points, {} simplices up to dimension {}",
        builder.n_points(),
        simplices.len(),
        max_dimension + 1
    );

    let columns = reduce(&simplices);
    let m = simplices.len();
    let mut paired = vec![false; m];
    let mut pairs = Vec::new();

    for (col_idx, column) in columns.iter().enumerate() {
        if let Some(low_idx) = column.low() {
            let creator = &simplices[low_idx];
            let destroyer = &simplices[col_idx];
            paired[low_idx] = true;
            paired[col_idx] = true;

            let dimension = creator.dimension();
            if dimension == 0 || destroyer.birth > creator.birth {
                pairs.push(PersistencePair {
                    dimension,
                    birth: creator.birth,
                    death: Death::Finite(destroyer.birth),
                });
            }
        }
    }

    for (idx, simplex) in simplices.iter().enumerate() {
        if !paired[idx] && columns[idx].is_zero() && simplex.dimension() <= max_dimension {
            pairs.push(PersistencePair {
                dimension: simplex.dimension(),
                birth: simplex.birth,
                death: Death::Essential,
            });
        }
    }

    PersistenceDiagram::new(max_dimension, pairs)
}

fn reduce(simplices: &[FilteredSimplex]) -> Vec<SparseColumn> {
    let simplex_index: HashMap<&[usize], usize> = simplices
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.vertices.as_slice(), idx))
        .collect();

    let mut columns: Vec<SparseColumn> = Vec::with_capacity(simplices.len());
    let mut low_to_col: HashMap<usize, usize> = HashMap::new();

    for (col_idx, simplex) in simplices.iter().enumerate() {
        // ∂[v0, ..., vk] = Σ [v0, ..., v̂i, ..., vk]
        let mut boundary = SparseColumn::default();
        if simplex.dimension() > 0 {
            for i in 0..simplex.vertices.len() {
                let mut face = simplex.vertices.clone();
                face.remove(i);
                if let Some(&face_idx) = simplex_index.get(face.as_slice()) {
                    boundary.toggle(face_idx);
                }
            }
        }

        while let Some(low_idx) = boundary.low() {
            match low_to_col.get(&low_idx) {
                Some(&pivot_col) => boundary.add_assign(&columns[pivot_col]),
                None => break,
            }
        }

        if let Some(low_idx) = boundary.low() {
            low_to_col.insert(low_idx, col_idx);
        }
        columns.push(boundary);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::DistanceMatrix;
    use ndarray::array;

    fn matrix(dm: ndarray::Array2<f64>) -> DistanceMatrix {
        DistanceMatrix::from_matrix(dm).unwrap()
    }

    #[test]
    fn test_two_points() {
        let dm = matrix(array![[0.0, 1.0], [1.0, 0.0]]);
        let pd = compute_persistence(&dm, 0, f64::INFINITY);

        let h0 = pd.dim(0);
        assert_eq!(h0.len(), 2);
        assert_eq!(h0[0].death, Death::Finite(1.0));
        assert!(h0[1].is_essential());
    }

    #[test]
    fn test_triangle_fills_immediately() {
        let dm = matrix(array![[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]]);
        let pd = compute_persistence(&dm, 1, f64::INFINITY);

        assert_eq!(pd.finite(0).len(), 2);
        assert_eq!(pd.essential_count(0), 1);
        // The cycle is filled at the scale it appears
        assert!(pd.dim(1).is_empty());
    }

    #[test]
    fn test_square_cycle() {
        let s2 = 2.0_f64.sqrt();
        let dm = matrix(array![
            [0.0, 1.0, s2, 1.0],
            [1.0, 0.0, 1.0, s2],
            [s2, 1.0, 0.0, 1.0],
            [1.0, s2, 1.0, 0.0]
        ]);
        let pd = compute_persistence(&dm, 1, f64::INFINITY);

        let h1 = pd.dim(1);
        assert_eq!(h1.len(), 1);
        assert!((h1[0].birth - 1.0).abs() < 1e-10);
        assert_eq!(h1[0].death, Death::Finite(s2));

        assert_eq!(pd.betti_at(1, 1.0), 0);
        assert_eq!(pd.betti_at(1, 1.2), 1);
        assert_eq!(pd.betti_at(1, s2), 1);
        assert_eq!(pd.betti_at(1, 1.5), 0);

        assert_eq!(pd.betti_at(0, 0.5), 4);
        assert_eq!(pd.betti_at(0, 1.0), 4);
        assert_eq!(pd.betti_at(0, 1.01), 1);
    }

    #[test]
    fn test_truncation_makes_cycle_essential() {
        let s2 = 2.0_f64.sqrt();
        let dm = matrix(array![
            [0.0, 1.0, s2, 1.0],
            [1.0, 0.0, 1.0, s2],
            [s2, 1.0, 0.0, 1.0],
            [1.0, s2, 1.0, 0.0]
        ]);
        let pd = compute_persistence(&dm, 1, 1.2);
        assert_eq!(pd.essential_count(1), 1);
        assert_eq!(pd.essential_count(0), 1);
    }

    #[test]
    fn test_h0_pair_per_point() {
        let dm = matrix(array![
            [0.0, 0.0, 3.0],
            [0.0, 0.0, 3.0],
            [3.0, 3.0, 0.0]
        ]);
        let pd = compute_persistence(&dm, 1, f64::INFINITY);

        // Duplicate points still contribute a zero-length pair
        let h0 = pd.dim(0);
        assert_eq!(h0.len(), 3);
        assert_eq!(h0[0].persistence(), Some(0.0));
        assert_eq!(pd.betti_at(0, 0.0), 3);
        assert_eq!(pd.betti_at(0, 1.0), 2);
    }

    #[test]
    fn test_entropy_and_totals() {
        let pd = PersistenceDiagram::new(
            0,
            vec![
                PersistencePair { dimension: 0, birth: 0.0, death: Death::Finite(1.0) },
                PersistencePair { dimension: 0, birth: 0.0, death: Death::Finite(1.0) },
                PersistencePair { dimension: 0, birth: 0.0, death: Death::Essential },
            ],
        );
        assert_eq!(pd.total_persistence(0), 2.0);
        assert_eq!(pd.max_persistence(0), 1.0);
        assert!((pd.persistence_entropy(0) - 2f64.ln()).abs() < 1e-12);
        assert_eq!(pd.max_finite_death(), Some(1.0));
        assert!(pd.pairs().last().unwrap().is_essential());
    }
}
