//! End-to-end analysis of a unified dataset
//!
//! Builds the two point clouds named by the configuration, runs persistence
//! and Mapper on them independently and collects everything downstream
//! tools need into one serializable [`AnalysisReport`].

use log::info;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::dataset::{CoverageGap, Exclusion, PointCloud, UnifiedDataset};
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::export::{diagram_records, DiagramRecord, GraphExport};
use crate::mapper::{MapperBuilder, MapperGraph, MapperSettings};
use crate::network::NetworkMetrics;
use crate::topology::{BettiNumbers, PersistenceResult, PersistenceSummary};

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub samples: usize,
    pub succeeded: usize,
    pub failed: Vec<usize>,
    pub missing: Vec<usize>,
    pub common_metrics: Vec<String>,
    pub coverage_gaps: Vec<CoverageGap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistenceReport {
    pub columns: Vec<String>,
    pub points: usize,
    pub excluded: Vec<Exclusion>,
    pub summaries: Vec<PersistenceSummary>,
    pub betti_at_threshold: Option<BettiNumbers>,
    pub diagram: Vec<DiagramRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapperReport {
    pub columns: Vec<String>,
    pub points: usize,
    pub excluded: Vec<Exclusion>,
    pub settings: MapperSettings,
    pub graph: GraphExport,
    pub metrics: NetworkMetrics,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub dataset: DatasetSummary,
    pub persistence: PersistenceReport,
    pub mapper: MapperReport,
}

/// Metric columns every succeeded run reports, series expanded to `name[k]`
pub fn default_columns(dataset: &UnifiedDataset) -> Vec<String> {
    dataset
        .metric_columns()
        .into_iter()
        .filter(|c| {
            dataset
                .records()
                .iter()
                .filter(|r| r.is_succeeded())
                .all(|r| r.metric(c).is_some())
        })
        .collect()
}

fn select_columns(configured: &[String], dataset: &UnifiedDataset) -> Vec<String> {
    if configured.is_empty() {
        default_columns(dataset)
    } else {
        configured.to_vec()
    }
}

fn build_cloud(dataset: &UnifiedDataset, columns: &[String], standardize: bool) -> Result<PointCloud> {
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    PointCloud::build(dataset, &names, standardize)
}

pub fn persistence_report(cloud: &PointCloud, result: &PersistenceResult, threshold: Option<f64>) -> PersistenceReport {
    PersistenceReport {
        columns: cloud.columns().to_vec(),
        points: cloud.n_points(),
        excluded: cloud.excluded().to_vec(),
        summaries: result.summaries(threshold),
        betti_at_threshold: threshold.map(|r| result.betti_at(r)),
        diagram: diagram_records(&result.diagram),
        diagnostics: result.diagnostics.clone(),
    }
}

pub fn mapper_report(cloud: &PointCloud, graph: &MapperGraph) -> MapperReport {
    let mut diagnostics = cloud.diagnostics().to_vec();
    diagnostics.extend(graph.diagnostics().iter().cloned());
    MapperReport {
        columns: cloud.columns().to_vec(),
        points: cloud.n_points(),
        excluded: cloud.excluded().to_vec(),
        settings: graph.settings().clone(),
        graph: GraphExport::from_graph(graph),
        metrics: NetworkMetrics::analyze(graph),
        diagnostics,
    }
}

/// Run persistence, Mapper and network metrics over `dataset`
pub fn analyze(dataset: &UnifiedDataset, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    let pc = &config.persistence;
    let persistence_cloud = build_cloud(dataset, &select_columns(&pc.columns, dataset), pc.standardize)?;
    let result = pc
        .analyzer()
        .compute(&persistence_cloud, pc.max_dimension, pc.metric)?;
    let persistence = persistence_report(&persistence_cloud, &result, pc.betti_threshold);

    let mc = &config.mapper;
    let mapper_cloud = build_cloud(dataset, &select_columns(&mc.columns, dataset), mc.standardize)?;
    let lens = mc.lens.build();
    let clusterer = mc.clusterer.build()?;
    let graph = MapperBuilder::new().compute(&mapper_cloud, lens.as_ref(), &mc.cover()?, clusterer.as_ref())?;
    let mapper = mapper_report(&mapper_cloud, &graph);

    info!(
        "Analysis complete: {} persistence pairs, {} Mapper nodes",
        persistence.diagram.len(),
        mapper.graph.nodes.len()
    );

    Ok(AnalysisReport {
        dataset: DatasetSummary {
            samples: dataset.len(),
            succeeded: dataset.succeeded_count(),
            failed: dataset.failed_ids(),
            missing: dataset.missing_ids(),
            common_metrics: dataset.common_metrics().to_vec(),
            coverage_gaps: dataset.coverage_gaps().to_vec(),
        },
        persistence,
        mapper,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClustererSpec, LensSpec};
    use crate::dataset::{merge, MetricValue, OutputTable, RunOutcome};
    use crate::error::Error;
    use crate::sampling::{generate, Parameter, ParameterSpace, Strategy};
    use std::collections::HashMap;

    fn dataset() -> UnifiedDataset {
        let space = ParameterSpace::from_parameters([
            Parameter::continuous("carbon_tax", 0.0, 200.0),
            Parameter::continuous("ccs_efficiency", 0.85, 0.95),
        ])
        .unwrap();
        let design = generate(&space, 24, Strategy::Sobol, 11).unwrap();
        let mut outputs = HashMap::new();
        for s in design.samples() {
            if s.id == 3 {
                outputs.insert(s.id, RunOutcome::Failed { reason: "timeout".into() });
                continue;
            }
            let mut t = OutputTable::new();
            let tax = s.values[0];
            t.insert("temperature".into(), MetricValue::Scalar(3.5 - tax / 100.0));
            t.insert(
                "emissions".into(),
                MetricValue::Series(vec![40.0 - tax / 10.0, 30.0 - tax / 5.0 * s.values[1]]),
            );
            outputs.insert(s.id, RunOutcome::Completed(t));
        }
        merge(&design, outputs).unwrap()
    }

    #[test]
    fn test_default_columns_expand_series() {
        assert_eq!(
            default_columns(&dataset()),
            vec!["emissions[0]", "emissions[1]", "temperature"]
        );
    }

    #[test]
    fn test_analyze_report() {
        let ds = dataset();
        let mut config = AnalysisConfig::default();
        config.persistence.max_dimension = 1;
        config.persistence.betti_threshold = Some(0.5);
        config.mapper.lens = LensSpec::Columns { columns: vec!["temperature".into()] };
        config.mapper.clusterer = ClustererSpec::Trivial;
        config.mapper.intervals = 4;

        let report = analyze(&ds, &config).unwrap();
        assert_eq!(report.dataset.samples, 24);
        assert_eq!(report.dataset.failed, vec![3]);
        assert_eq!(report.persistence.points, 23);
        assert_eq!(report.persistence.excluded.len(), 1);

        // One H0 pair per point
        let h0 = report.persistence.diagram.iter().filter(|r| r.dimension == 0).count();
        assert_eq!(h0, 23);
        assert_eq!(report.persistence.summaries.len(), 2);

        assert_eq!(report.mapper.metrics.node_count, report.mapper.graph.nodes.len());
        assert_eq!(report.mapper.metrics.connected_components, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["mapper"]["metrics"]["modularity"].is_number());
    }

    #[test]
    fn test_unknown_column_surfaces() {
        let mut config = AnalysisConfig::default();
        config.persistence.columns = vec!["sea_level".into()];
        assert!(matches!(analyze(&dataset(), &config), Err(Error::MissingColumn(_))));
    }
}
