//! Overlapping Interval Cover of the Lens Image
//!
//! Per lens coordinate with range [m, M] and k intervals:
//!
//!   w   = (M − m) / k
//!   pad = w·p / (2(1 − p))
//!   Iᵢ  = [m + i·w − pad, m + (i+1)·w + pad]
//!
//! so consecutive intervals share the fraction p of their length. The
//! intervals are closed, which puts boundary points in every interval that
//! touches them. Multi-dimensional lenses are covered by the product of
//! the per-coordinate intervals (hypercubes).

use ndarray::Array2;
use std::collections::BTreeMap;

use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cover {
    intervals: usize,
    overlap_percent: f64,
}

/// Cube index (one interval index per lens coordinate) → rows inside it
pub(crate) type CubeMembers = BTreeMap<Vec<usize>, Vec<usize>>;

impl Cover {
    pub fn new(intervals: usize, overlap_percent: f64) -> Result<Self> {
        if intervals < 1 {
            return Err(Error::InvalidCover("interval count must be at least 1".into()));
        }
        if !(0.0..100.0).contains(&overlap_percent) {
            return Err(Error::InvalidCover(format!(
                "overlap must be in [0, 100), got {}",
                overlap_percent
            )));
        }
        Ok(Self {
            intervals,
            overlap_percent,
        })
    }

    pub fn intervals(&self) -> usize {
        self.intervals
    }

    pub fn overlap_percent(&self) -> f64 {
        self.overlap_percent
    }

    /// Intervals covering [min, max]; a single degenerate interval when min == max
    pub fn intervals_over(&self, min: f64, max: f64) -> Vec<Interval> {
        let range = max - min;
        if range <= 0.0 {
            return vec![Interval { lower: min, upper: max }];
        }
        let k = self.intervals;
        let w = range / k as f64;
        let p = self.overlap_percent / 100.0;
        let pad = w * p / (2.0 * (1.0 - p));

        (0..k)
            .map(|i| {
                let lower = if i == 0 { min } else { min + i as f64 * w };
                let upper = if i + 1 == k { max } else { min + (i + 1) as f64 * w };
                Interval {
                    lower: lower - pad,
                    upper: upper + pad,
                }
            })
            .collect()
    }

    /// Group lens rows by the hypercubes that contain them
    pub(crate) fn assign(&self, lens: &Array2<f64>) -> (CubeMembers, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut per_dim: Vec<Vec<Interval>> = Vec::with_capacity(lens.ncols());

        for (j, column) in lens.columns().into_iter().enumerate() {
            let min = column.iter().copied().fold(f64::INFINITY, f64::min);
            let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max <= min {
                diagnostics.push(Diagnostic::FlatLens { lens_dimension: j });
            }
            per_dim.push(self.intervals_over(min, max));
        }

        let mut cubes = CubeMembers::new();
        for (row, point) in lens.rows().into_iter().enumerate() {
            // Cartesian product of the intervals containing each coordinate
            let mut cells: Vec<Vec<usize>> = vec![Vec::new()];
            for (j, &x) in point.iter().enumerate() {
                let hits: Vec<usize> = per_dim[j]
                    .iter()
                    .enumerate()
                    .filter(|(_, iv)| iv.contains(x))
                    .map(|(i, _)| i)
                    .collect();
                cells = cells
                    .into_iter()
                    .flat_map(|prefix| {
                        hits.iter().map(move |&i| {
                            let mut cell = prefix.clone();
                            cell.push(i);
                            cell
                        })
                    })
                    .collect();
            }
            for cell in cells {
                cubes.entry(cell).or_default().push(row);
            }
        }

        (cubes, diagnostics)
    }
}

impl Default for Cover {
    fn default() -> Self {
        Self {
            intervals: 10,
            overlap_percent: 50.0,
        }
    }
}
