//! Betti Numbers: Topological Invariants
//!
//! The k-th Betti number βₖ counts the number of k-dimensional
//! "holes" in a topological space:
//!
//! - β₀: Number of connected components (clusters of scenarios)
//! - β₁: Number of 1-dimensional loops/cycles
//! - β₂: Number of 2-dimensional voids/cavities
//!
//! They are read directly off a persistence diagram.

use serde::Serialize;

use super::PersistenceDiagram;

/// Betti numbers β₀..β_max at a specific scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BettiNumbers {
    pub scale: f64,
    pub betti: Vec<usize>,
}

impl BettiNumbers {
    pub fn at(diagram: &PersistenceDiagram, scale: f64) -> Self {
        let betti = (0..=diagram.max_dimension())
            .map(|d| diagram.betti_at(d, scale))
            .collect();
        Self { scale, betti }
    }

    /// βₖ, zero above the computed dimensions
    pub fn beta(&self, k: usize) -> usize {
        self.betti.get(k).copied().unwrap_or(0)
    }

    /// Total topological complexity
    pub fn total(&self) -> usize {
        self.betti.iter().sum()
    }

    /// Euler characteristic χ = Σ (−1)ᵏ βₖ
    pub fn euler_characteristic(&self) -> i64 {
        self.betti
            .iter()
            .enumerate()
            .map(|(k, &b)| if k % 2 == 0 { b as i64 } else { -(b as i64) })
            .sum()
    }
}

/// Betti curve: Betti numbers on an evenly spaced grid of scales
#[derive(Debug, Clone, Serialize)]
pub struct BettiCurve {
    pub values: Vec<BettiNumbers>,
}

impl BettiCurve {
    /// Sample `n_steps + 1` scales from 0 to `max_scale`
    pub fn compute(diagram: &PersistenceDiagram, max_scale: f64, n_steps: usize) -> Self {
        let n_steps = n_steps.max(1);
        let values = (0..=n_steps)
            .map(|step| BettiNumbers::at(diagram, max_scale * step as f64 / n_steps as f64))
            .collect();
        Self { values }
    }

    /// βₖ curve as (scale, βₖ)
    pub fn curve(&self, k: usize) -> Vec<(f64, usize)> {
        self.values.iter().map(|b| (b.scale, b.beta(k))).collect()
    }

    /// Integrated βₖ (trapezoidal area under curve)
    pub fn integrated(&self, k: usize) -> f64 {
        self.values
            .windows(2)
            .map(|w| {
                let de = w[1].scale - w[0].scale;
                de * (w[0].beta(k) + w[1].beta(k)) as f64 / 2.0
            })
            .sum()
    }
}
