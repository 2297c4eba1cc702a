//! Point Clouds: Numeric Views of a Unified Dataset
//!
//! A point cloud selects a subset of parameter and metric columns and keeps
//! one row per usable sample, together with the row → sample id table that
//! makes every topological feature traceable back to simulation runs.
//!
//! Rows are never imputed: a record that did not succeed, or that lacks a
//! finite value for any selected column, is excluded and listed with the
//! reason.
//!
//! ## Standardization
//!
//! Distances are scale-sensitive, so columns can be z-scored:
//!
//!   z = (x − μ) / σ   (population σ)
//!
//! A zero-variance column maps to all zeros and is reported.

use log::{debug, warn};
use ndarray::{Array2, ArrayView1, Axis};
use serde::Serialize;

use super::{RunStatus, UnifiedDataset};
use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};

/// Relative spread below which a column counts as constant
const CONSTANT_TOLERANCE: f64 = 10.0 * f64::EPSILON;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    RunFailed,
    RunMissing,
    MissingValue { column: String },
    NonFinite { column: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    pub sample_id: usize,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// Per-column centring and scale applied by standardization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scaling {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    columns: Vec<String>,
    data: Array2<f64>,
    sample_ids: Vec<usize>,
    excluded: Vec<Exclusion>,
    scaling: Option<Scaling>,
    diagnostics: Vec<Diagnostic>,
}

impl PointCloud {
    /// Wrap an existing matrix; rows must be finite and match `sample_ids`
    pub fn from_array(columns: Vec<String>, data: Array2<f64>, sample_ids: Vec<usize>) -> Result<Self> {
        if data.ncols() != columns.len() {
            return Err(Error::DimensionMismatch {
                expected: columns.len(),
                actual: data.ncols(),
            });
        }
        if data.nrows() != sample_ids.len() {
            return Err(Error::DimensionMismatch {
                expected: sample_ids.len(),
                actual: data.nrows(),
            });
        }
        if let Some((row, col)) = data.indexed_iter().find(|(_, v)| !v.is_finite()).map(|(ix, _)| ix) {
            return Err(Error::MalformedDataset {
                line: row + 1,
                message: format!("non-finite value in column '{}'", columns[col]),
            });
        }
        Ok(Self {
            columns,
            data,
            sample_ids,
            excluded: Vec::new(),
            scaling: None,
            diagnostics: Vec::new(),
        })
    }

    /// Extract the selected columns of every usable record
    pub fn build(dataset: &UnifiedDataset, columns: &[&str], standardize: bool) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::InvalidConfig("no columns selected for the point cloud".into()));
        }
        if let Some(unknown) = columns.iter().find(|c| !dataset.has_column(c)) {
            return Err(Error::MissingColumn(unknown.to_string()));
        }

        let mut rows: Vec<f64> = Vec::with_capacity(dataset.len() * columns.len());
        let mut sample_ids = Vec::new();
        let mut excluded = Vec::new();

        'records: for record in dataset.records() {
            let reason = match &record.status {
                RunStatus::Succeeded => None,
                RunStatus::Failed { .. } => Some(ExclusionReason::RunFailed),
                RunStatus::Missing => Some(ExclusionReason::RunMissing),
            };
            if let Some(reason) = reason {
                excluded.push(Exclusion { sample_id: record.sample_id, reason });
                continue;
            }

            let mut values = Vec::with_capacity(columns.len());
            for &column in columns {
                let reason = match dataset.value(record, column) {
                    Some(v) if v.is_finite() => {
                        values.push(v);
                        continue;
                    }
                    Some(_) => ExclusionReason::NonFinite { column: column.to_string() },
                    None => ExclusionReason::MissingValue { column: column.to_string() },
                };
                excluded.push(Exclusion { sample_id: record.sample_id, reason });
                continue 'records;
            }
            rows.extend(values);
            sample_ids.push(record.sample_id);
        }

        if !excluded.is_empty() {
            warn!(
                "{} of {} samples excluded from point cloud over {:?}",
                excluded.len(),
                dataset.len(),
                columns
            );
        }

        let data = Array2::from_shape_vec((sample_ids.len(), columns.len()), rows)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let mut cloud = Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            data,
            sample_ids,
            excluded,
            scaling: None,
            diagnostics: Vec::new(),
        };
        if standardize {
            cloud.standardize();
        }
        debug!("Point cloud: {} x {}", cloud.n_points(), cloud.n_features());
        Ok(cloud)
    }

    fn standardize(&mut self) {
        let n = self.data.nrows();
        let mut mean = Vec::with_capacity(self.columns.len());
        let mut std = Vec::with_capacity(self.columns.len());

        for (j, mut column) in self.data.axis_iter_mut(Axis(1)).enumerate() {
            let (mu, sigma) = if n == 0 {
                (0.0, 0.0)
            } else {
                let mu = column.sum() / n as f64;
                let var = column.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / n as f64;
                (mu, var.sqrt())
            };
            // σ within rounding of the mean's magnitude is zero variance
            let sigma = if sigma <= CONSTANT_TOLERANCE * mu.abs().max(1.0) { 0.0 } else { sigma };
            if sigma > 0.0 {
                column.mapv_inplace(|x| (x - mu) / sigma);
            } else {
                column.fill(0.0);
                if n > 0 {
                    self.diagnostics.push(Diagnostic::ConstantColumn {
                        column: self.columns[j].clone(),
                    });
                }
            }
            mean.push(mu);
            std.push(sigma);
        }
        self.scaling = Some(Scaling { mean, std });
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    /// Row index → sample id
    pub fn sample_ids(&self) -> &[usize] {
        &self.sample_ids
    }

    pub fn n_points(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    pub fn excluded(&self) -> &[Exclusion] {
        &self.excluded
    }

    pub fn scaling(&self) -> Option<&Scaling> {
        self.scaling.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Sub-matrix of the given rows, in order
    pub fn select_rows(&self, rows: &[usize]) -> Array2<f64> {
        self.data.select(Axis(0), rows)
    }
}

/// Build a point cloud from a dataset; see [`PointCloud::build`]
pub fn build_point_cloud(dataset: &UnifiedDataset, columns: &[&str], standardize: bool) -> Result<PointCloud> {
    PointCloud::build(dataset, columns, standardize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{merge, MetricValue, OutputTable, RunOutcome};
    use crate::sampling::{generate, Parameter, ParameterSpace, Strategy};
    use std::collections::HashMap;

    fn dataset() -> UnifiedDataset {
        let space = ParameterSpace::from_parameters([
            Parameter::continuous("tax", 0.0, 100.0),
            Parameter::continuous("growth", 0.0, 0.05),
        ])
        .unwrap();
        let design = generate(&space, 6, Strategy::Sobol, 2).unwrap();
        let mut outputs = HashMap::new();
        for sample in design.samples() {
            let outcome = match sample.id {
                1 => RunOutcome::Failed { reason: "crash".into() },
                3 => continue,
                _ => {
                    let mut t = OutputTable::new();
                    let temp = if sample.id == 5 { f64::NAN } else { 1.5 + sample.values[0] / 100.0 };
                    t.insert("temperature".into(), MetricValue::Scalar(temp));
                    t.insert("flat".into(), MetricValue::Scalar(4.0));
                    RunOutcome::Completed(t)
                }
            };
            outputs.insert(sample.id, outcome);
        }
        merge(&design, outputs).unwrap()
    }

    #[test]
    fn test_exclusions_tracked() {
        let ds = dataset();
        let cloud = PointCloud::build(&ds, &["tax", "temperature"], false).unwrap();
        assert_eq!(cloud.sample_ids(), &[0, 2, 4]);
        assert_eq!(cloud.n_features(), 2);

        let reasons: Vec<(usize, ExclusionReason)> =
            cloud.excluded().iter().map(|e| (e.sample_id, e.reason.clone())).collect();
        assert_eq!(
            reasons,
            vec![
                (1, ExclusionReason::RunFailed),
                (3, ExclusionReason::RunMissing),
                (5, ExclusionReason::NonFinite { column: "temperature".into() }),
            ]
        );
    }

    #[test]
    fn test_unknown_column() {
        let ds = dataset();
        assert!(matches!(
            PointCloud::build(&ds, &["tax", "sea_level"], true),
            Err(Error::MissingColumn(c)) if c == "sea_level"
        ));
    }

    #[test]
    fn test_standardization() {
        let ds = dataset();
        let cloud = PointCloud::build(&ds, &["tax", "flat"], true).unwrap();
        let tax = cloud.data().column(0);
        let mean = tax.sum() / tax.len() as f64;
        let var = tax.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / tax.len() as f64;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);

        assert!(cloud.data().column(1).iter().all(|&x| x == 0.0));
        assert_eq!(
            cloud.diagnostics(),
            &[Diagnostic::ConstantColumn { column: "flat".into() }]
        );
        assert_eq!(cloud.scaling().unwrap().std[1], 0.0);
    }

    #[test]
    fn test_rounding_noise_is_constant() {
        for value in [0.7, 1.0 / 3.0, 0.1, -2.3e5] {
            for n in 2..=12 {
                let data = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { value } else { i as f64 });
                let mut cloud =
                    PointCloud::from_array(vec!["c".into(), "i".into()], data, (0..n).collect()).unwrap();
                cloud.standardize();

                assert!(cloud.data().column(0).iter().all(|&x| x == 0.0), "value={} n={}", value, n);
                assert_eq!(cloud.diagnostics(), &[Diagnostic::ConstantColumn { column: "c".into() }]);
                assert_eq!(cloud.scaling().unwrap().std[0], 0.0);
                assert!(cloud.scaling().unwrap().std[1] > 0.0);
            }
        }
    }

    #[test]
    fn test_from_array_checks() {
        let data = ndarray::array![[0.0, 1.0], [2.0, f64::INFINITY]];
        assert!(PointCloud::from_array(vec!["a".into(), "b".into()], data, vec![0, 1]).is_err());
        let data = ndarray::array![[0.0, 1.0]];
        assert!(matches!(
            PointCloud::from_array(vec!["a".into()], data, vec![0]),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
