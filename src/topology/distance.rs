//! Distance Metrics on Feature Space

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl DistanceMetric {
    pub fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let diffs = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs());
        match self {
            DistanceMetric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            DistanceMetric::Manhattan => diffs.sum(),
            DistanceMetric::Chebyshev => diffs.fold(0.0, f64::max),
        }
    }

    /// Symmetric pairwise distance matrix of the rows of `points`
    pub fn pairwise(&self, points: &Array2<f64>) -> Array2<f64> {
        let n = points.nrows();
        let mut dm = Array2::<f64>::zeros((n, n));

        for i in 0..n {
            for j in i + 1..n {
                let dist = self.distance(points.row(i), points.row(j));
                dm[[i, j]] = dist;
                dm[[j, i]] = dist;
            }
        }

        dm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_metrics() {
        let p = array![[0.0, 0.0], [3.0, -4.0]];
        assert_eq!(DistanceMetric::Euclidean.distance(p.row(0), p.row(1)), 5.0);
        assert_eq!(DistanceMetric::Manhattan.distance(p.row(0), p.row(1)), 7.0);
        assert_eq!(DistanceMetric::Chebyshev.distance(p.row(0), p.row(1)), 4.0);

        let dm = DistanceMetric::Euclidean.pairwise(&p);
        assert_eq!(dm, array![[0.0, 5.0], [5.0, 0.0]]);
    }
}
