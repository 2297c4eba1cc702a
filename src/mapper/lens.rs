//! Lens (Filter) Functions
//!
//! A lens f: X → ℝᵏ orders the point cloud; the cover is laid out over its
//! image. Lenses only decide which points are compared with each other.
//! Clustering itself always happens in the full feature space.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::dataset::PointCloud;
use crate::error::{Error, Result};
use crate::topology::DistanceMetric;

/// Projection of every point of a cloud to lens coordinates
pub trait Lens {
    /// One row per point, one column per lens coordinate
    fn project(&self, cloud: &PointCloud) -> Result<Array2<f64>>;

    fn name(&self) -> String;
}

/// Use selected columns of the cloud as lens coordinates
#[derive(Debug, Clone)]
pub struct ColumnLens {
    columns: Vec<String>,
}

impl ColumnLens {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Lens for ColumnLens {
    fn project(&self, cloud: &PointCloud) -> Result<Array2<f64>> {
        let indices = self
            .columns
            .iter()
            .map(|c| {
                cloud
                    .column_index(c)
                    .ok_or_else(|| Error::InvalidLens(format!("column '{}' is not in the point cloud", c)))
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(cloud.data().select(Axis(1), &indices))
    }

    fn name(&self) -> String {
        format!("columns({})", self.columns.join(","))
    }
}

/// Projection onto the leading principal axes
///
/// Axes come from power iteration with deflation on the covariance matrix.
/// Each axis is iterated from every coordinate with variance and the run
/// with the largest Rayleigh quotient wins, so the lens is a pure function
/// of the data. Each axis is oriented so that its largest
/// component is positive.
#[derive(Debug, Clone)]
pub struct PrincipalComponentLens {
    components: usize,
}

const POWER_ITERATIONS: usize = 500;
const POWER_TOLERANCE: f64 = 1e-12;

impl PrincipalComponentLens {
    pub fn new(components: usize) -> Self {
        Self { components }
    }

    pub fn components(&self) -> usize {
        self.components
    }
}

impl Default for PrincipalComponentLens {
    fn default() -> Self {
        Self::new(1)
    }
}

fn principal_axes(centred: &Array2<f64>, k: usize) -> Vec<Array1<f64>> {
    let n = centred.nrows().max(1) as f64;
    let mut cov = centred.t().dot(centred) / n;
    let mut axes = Vec::with_capacity(k);

    for _ in 0..k {
        // A start on an eigenvector never leaves it; try every coordinate
        let mut best: Option<(f64, Array1<f64>)> = None;
        for start in (0..cov.nrows()).filter(|&j| cov[[j, j]] > POWER_TOLERANCE) {
            let v = power_iterate(&cov, start);
            let rayleigh = v.dot(&cov.dot(&v));
            if best.as_ref().map_or(true, |(top, _)| rayleigh > *top) {
                best = Some((rayleigh, v));
            }
        }
        let Some((_, mut v)) = best else {
            // No variance left: the remaining coordinates are flat
            axes.push(Array1::zeros(cov.nrows()));
            continue;
        };

        let pivot = v
            .iter()
            .copied()
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if pivot < 0.0 {
            v.mapv_inplace(|x| -x);
        }

        // Deflate: C ← C − λ v vᵀ
        let lambda = v.dot(&cov.dot(&v));
        let outer = v
            .view()
            .insert_axis(Axis(1))
            .dot(&v.view().insert_axis(Axis(0)));
        cov = cov - outer * lambda;
        axes.push(v);
    }
    axes
}

fn power_iterate(cov: &Array2<f64>, start: usize) -> Array1<f64> {
    let mut v = Array1::<f64>::zeros(cov.nrows());
    v[start] = 1.0;
    for _ in 0..POWER_ITERATIONS {
        let w = cov.dot(&v);
        let norm = w.dot(&w).sqrt();
        if norm <= POWER_TOLERANCE {
            break;
        }
        let next = w / norm;
        let delta = (&next - &v).mapv(f64::abs).sum();
        v = next;
        if delta < POWER_TOLERANCE {
            break;
        }
    }
    v
}

impl Lens for PrincipalComponentLens {
    fn project(&self, cloud: &PointCloud) -> Result<Array2<f64>> {
        let d = cloud.n_features();
        if self.components == 0 || self.components > d {
            return Err(Error::InvalidLens(format!(
                "{} principal components requested from {} features",
                self.components, d
            )));
        }
        let data = cloud.data();
        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(d));
        let centred = data - &mean;

        let axes = principal_axes(&centred, self.components);
        let mut out = Array2::zeros((data.nrows(), self.components));
        for (j, axis) in axes.iter().enumerate() {
            out.column_mut(j).assign(&centred.dot(axis));
        }
        Ok(out)
    }

    fn name(&self) -> String {
        format!("pca({})", self.components)
    }
}

/// Distance of every point to the centroid of the cloud
#[derive(Debug, Clone, Default)]
pub struct CentroidDistanceLens {
    metric: DistanceMetric,
}

impl CentroidDistanceLens {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric }
    }
}

impl Lens for CentroidDistanceLens {
    fn project(&self, cloud: &PointCloud) -> Result<Array2<f64>> {
        let data = cloud.data();
        let centroid = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(cloud.n_features()));
        let values: Vec<f64> = data
            .rows()
            .into_iter()
            .map(|row| self.metric.distance(row, centroid.view()))
            .collect();
        Array2::from_shape_vec((values.len(), 1), values).map_err(|e| Error::InvalidLens(e.to_string()))
    }

    fn name(&self) -> String {
        format!("centroid_distance({:?})", self.metric)
    }
}

/// Lens from any per-point function
pub struct FnLens<F> {
    name: String,
    f: F,
}

impl<F> FnLens<F>
where
    F: Fn(ArrayView1<f64>) -> Vec<f64>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> Lens for FnLens<F>
where
    F: Fn(ArrayView1<f64>) -> Vec<f64>,
{
    fn project(&self, cloud: &PointCloud) -> Result<Array2<f64>> {
        let rows: Vec<Vec<f64>> = cloud.data().rows().into_iter().map(|r| (self.f)(r)).collect();
        let width = rows.first().map_or(1, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(Error::InvalidLens(format!(
                "lens '{}' returned {} values for point {}, expected {}",
                self.name,
                rows[bad].len(),
                bad,
                width
            )));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((cloud.n_points(), width), flat).map_err(|e| Error::InvalidLens(e.to_string()))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
