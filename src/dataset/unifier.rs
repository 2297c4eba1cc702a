//! Output Unification: One Record per Sample
//!
//! Joins the per-run output tables of an ensemble into a single dataset
//! keyed by sample id. Failed or missing runs are kept as records with a
//! status so the audit trail is complete; they never abort the merge.
//!
//! ## Column Policy
//!
//! The metrics shared by every succeeded run form `common_metrics`.
//! A succeeded run lacking a metric that some other run reported is
//! listed in `coverage_gaps`; it is excluded only from point clouds that
//! select the absent metric.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::sampling::Design;

/// A single output metric: a scalar or a short numeric series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Series(Vec<f64>),
}

/// Named outputs of one simulation run
pub type OutputTable = BTreeMap<String, MetricValue>;

/// What the external simulation driver reports for one sample
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(OutputTable),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed { reason: String },
    Missing,
}

/// One dataset row: parameters, run status and metrics of a sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedRecord {
    pub sample_id: usize,
    pub parameters: Vec<f64>,
    pub status: RunStatus,
    pub metrics: OutputTable,
}

/// Split `name[k]` into (`name`, k)
pub(crate) fn series_selector(column: &str) -> Option<(&str, usize)> {
    let open = column.rfind('[')?;
    let index = column[open + 1..].strip_suffix(']')?.parse().ok()?;
    Some((&column[..open], index))
}

impl UnifiedRecord {
    pub fn is_succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// Scalar value of a metric column; `name[k]` addresses element k of a series
    pub fn metric(&self, column: &str) -> Option<f64> {
        match self.metrics.get(column) {
            Some(MetricValue::Scalar(v)) => Some(*v),
            Some(MetricValue::Series(_)) => None,
            None => {
                let (name, k) = series_selector(column)?;
                match self.metrics.get(name)? {
                    MetricValue::Series(values) => values.get(k).copied(),
                    MetricValue::Scalar(_) => None,
                }
            }
        }
    }

    /// Scalar column names this record can provide
    pub fn scalar_columns(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, value) in &self.metrics {
            match value {
                MetricValue::Scalar(_) => names.push(name.clone()),
                MetricValue::Series(values) => {
                    names.extend((0..values.len()).map(|k| format!("{}[{}]", name, k)))
                }
            }
        }
        names
    }
}

/// A succeeded run that lacks metrics reported by other runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageGap {
    pub sample_id: usize,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedDataset {
    parameter_names: Vec<String>,
    records: Vec<UnifiedRecord>,
    common_metrics: Vec<String>,
    coverage_gaps: Vec<CoverageGap>,
}

impl UnifiedDataset {
    /// Assemble a dataset from records ordered by sample id
    pub(crate) fn from_records(parameter_names: Vec<String>, records: Vec<UnifiedRecord>) -> Self {
        let succeeded: Vec<&UnifiedRecord> = records.iter().filter(|r| r.is_succeeded()).collect();

        let union: BTreeSet<&String> = succeeded.iter().flat_map(|r| r.metrics.keys()).collect();
        let common_metrics: Vec<String> = union
            .iter()
            .filter(|name| succeeded.iter().all(|r| r.metrics.contains_key(name.as_str())))
            .map(|name| name.to_string())
            .collect();

        let coverage_gaps: Vec<CoverageGap> = succeeded
            .iter()
            .filter_map(|r| {
                let missing: Vec<String> = union
                    .iter()
                    .filter(|name| !r.metrics.contains_key(name.as_str()))
                    .map(|name| name.to_string())
                    .collect();
                (!missing.is_empty()).then(|| CoverageGap {
                    sample_id: r.sample_id,
                    missing,
                })
            })
            .collect();

        Self {
            parameter_names,
            records,
            common_metrics,
            coverage_gaps,
        }
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn records(&self) -> &[UnifiedRecord] {
        &self.records
    }

    pub fn record(&self, sample_id: usize) -> Option<&UnifiedRecord> {
        self.records
            .binary_search_by_key(&sample_id, |r| r.sample_id)
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Metric names present in every succeeded run
    pub fn common_metrics(&self) -> &[String] {
        &self.common_metrics
    }

    pub fn coverage_gaps(&self) -> &[CoverageGap] {
        &self.coverage_gaps
    }

    pub fn succeeded_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_succeeded()).count()
    }

    pub fn failed_ids(&self) -> Vec<usize> {
        self.records
            .iter()
            .filter(|r| matches!(r.status, RunStatus::Failed { .. }))
            .map(|r| r.sample_id)
            .collect()
    }

    pub fn missing_ids(&self) -> Vec<usize> {
        self.records
            .iter()
            .filter(|r| r.status == RunStatus::Missing)
            .map(|r| r.sample_id)
            .collect()
    }

    /// Sorted union of scalar metric columns over all records
    pub fn metric_columns(&self) -> Vec<String> {
        let columns: BTreeSet<String> = self.records.iter().flat_map(|r| r.scalar_columns()).collect();
        columns.into_iter().collect()
    }

    pub fn parameter_index(&self, column: &str) -> Option<usize> {
        self.parameter_names.iter().position(|p| p == column)
    }

    /// Whether `column` names a parameter or a metric of any record
    pub fn has_column(&self, column: &str) -> bool {
        self.parameter_index(column).is_some() || self.records.iter().any(|r| r.metric(column).is_some())
    }

    /// Value of `column` in `record`: parameters first, then metrics
    pub fn value(&self, record: &UnifiedRecord, column: &str) -> Option<f64> {
        match self.parameter_index(column) {
            Some(j) => record.parameters.get(j).copied(),
            None => record.metric(column),
        }
    }

    /// Number of records usable in a point cloud over `columns`
    pub fn usable_count(&self, columns: &[&str]) -> usize {
        self.records
            .iter()
            .filter(|r| {
                r.is_succeeded()
                    && columns
                        .iter()
                        .all(|c| self.value(r, c).map_or(false, f64::is_finite))
            })
            .count()
    }
}

/// Join per-sample outputs with the design that produced them
pub fn merge(design: &Design, mut outputs: HashMap<usize, RunOutcome>) -> Result<UnifiedDataset> {
    if let Some(&unknown) = outputs.keys().filter(|&&id| id >= design.len()).min() {
        return Err(Error::UnknownSample(unknown));
    }

    let records: Vec<UnifiedRecord> = design
        .samples()
        .iter()
        .map(|sample| {
            let (status, metrics) = match outputs.remove(&sample.id) {
                Some(RunOutcome::Completed(table)) => (RunStatus::Succeeded, table),
                Some(RunOutcome::Failed { reason }) => {
                    warn!("Run for sample {} failed: {}", sample.id, reason);
                    (RunStatus::Failed { reason }, OutputTable::new())
                }
                None => {
                    warn!("No output for sample {}", sample.id);
                    (RunStatus::Missing, OutputTable::new())
                }
            };
            UnifiedRecord {
                sample_id: sample.id,
                parameters: sample.values.clone(),
                status,
                metrics,
            }
        })
        .collect();

    let dataset = UnifiedDataset::from_records(design.space().names(), records);

    for gap in dataset.coverage_gaps() {
        debug!("Sample {} lacks metrics {:?}", gap.sample_id, gap.missing);
    }
    info!(
        "Merged {} runs: {} succeeded, {} failed, {} missing, {} common metrics",
        dataset.len(),
        dataset.succeeded_count(),
        dataset.failed_ids().len(),
        dataset.missing_ids().len(),
        dataset.common_metrics().len()
    );

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{generate, Parameter, ParameterSpace, Strategy};

    fn design(n: usize) -> Design {
        let space = ParameterSpace::from_parameters([
            Parameter::continuous("a", 0.0, 1.0),
            Parameter::continuous("b", 0.0, 1.0),
        ])
        .unwrap();
        generate(&space, n, Strategy::default(), 17).unwrap()
    }

    fn table(pairs: &[(&str, f64)]) -> OutputTable {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), MetricValue::Scalar(*v)))
            .collect()
    }

    #[test]
    fn test_merge_with_failures() {
        let design = design(10);
        let mut outputs = HashMap::new();
        for id in 0..10 {
            let outcome = if id % 4 == 0 {
                RunOutcome::Failed { reason: "solver diverged".into() }
            } else {
                RunOutcome::Completed(table(&[("temperature", id as f64), ("gdp", 2.0)]))
            };
            outputs.insert(id, outcome);
        }
        let dataset = merge(&design, outputs).unwrap();

        assert_eq!(dataset.len(), 10);
        assert_eq!(dataset.failed_ids(), vec![0, 4, 8]);
        assert_eq!(dataset.usable_count(&["temperature", "gdp"]), 7);
        assert_eq!(dataset.common_metrics(), ["gdp".to_string(), "temperature".to_string()]);
        assert!(dataset.coverage_gaps().is_empty());
    }

    #[test]
    fn test_missing_runs_are_recorded() {
        let design = design(4);
        let mut outputs = HashMap::new();
        outputs.insert(1, RunOutcome::Completed(table(&[("x", 1.0)])));
        let dataset = merge(&design, outputs).unwrap();
        assert_eq!(dataset.missing_ids(), vec![0, 2, 3]);
        assert_eq!(dataset.record(2).unwrap().status, RunStatus::Missing);
        assert_eq!(dataset.record(2).unwrap().parameters.len(), 2);
    }

    #[test]
    fn test_unknown_sample_rejected() {
        let design = design(3);
        let mut outputs = HashMap::new();
        outputs.insert(7, RunOutcome::Completed(OutputTable::new()));
        assert!(matches!(merge(&design, outputs), Err(Error::UnknownSample(7))));
    }

    #[test]
    fn test_column_mismatch_reported() {
        let design = design(3);
        let mut outputs = HashMap::new();
        outputs.insert(0, RunOutcome::Completed(table(&[("x", 1.0), ("y", 2.0)])));
        outputs.insert(1, RunOutcome::Completed(table(&[("x", 1.5)])));
        outputs.insert(2, RunOutcome::Completed(table(&[("x", 0.5), ("y", 1.0)])));
        let dataset = merge(&design, outputs).unwrap();

        assert_eq!(dataset.common_metrics(), ["x".to_string()]);
        assert_eq!(
            dataset.coverage_gaps(),
            [CoverageGap { sample_id: 1, missing: vec!["y".into()] }]
        );
        // Sample 1 still counts for clouds that do not select y
        assert_eq!(dataset.usable_count(&["x"]), 3);
        assert_eq!(dataset.usable_count(&["x", "y"]), 2);
    }

    #[test]
    fn test_series_selector() {
        let mut metrics = OutputTable::new();
        metrics.insert("emissions".into(), MetricValue::Series(vec![10.0, 12.5, 9.0]));
        let record = UnifiedRecord {
            sample_id: 0,
            parameters: vec![],
            status: RunStatus::Succeeded,
            metrics,
        };
        assert_eq!(record.metric("emissions[1]"), Some(12.5));
        assert_eq!(record.metric("emissions[3]"), None);
        assert_eq!(record.metric("emissions"), None);
        assert_eq!(series_selector("gdp[2]"), Some(("gdp", 2)));
        assert_eq!(series_selector("gdp"), None);
        assert_eq!(record.scalar_columns().len(), 3);
    }
}
