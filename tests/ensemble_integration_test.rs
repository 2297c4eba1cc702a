//! End-to-end tests: design → runs → unified dataset → topology

use std::collections::{BTreeSet, HashMap};

use scenario_tda::mapper::{ColumnLens, SingleLinkage};
use scenario_tda::topology::{DistanceMatrix, FiltrationBuilder};
use scenario_tda::*;

fn unit_square_space() -> ParameterSpace {
    ParameterSpace::from_parameters([
        Parameter::continuous("a", 0.0, 1.0),
        Parameter::continuous("b", 0.0, 1.0),
    ])
    .unwrap()
}

fn run_sum(design: &Design) -> HashMap<usize, RunOutcome> {
    design
        .samples()
        .iter()
        .map(|s| {
            let mut table = OutputTable::new();
            table.insert("sum".into(), MetricValue::Scalar(s.values[0] + s.values[1]));
            (s.id, RunOutcome::Completed(table))
        })
        .collect()
}

/// Longest edge of the Euclidean minimum spanning tree (Prim)
fn longest_mst_edge(points: &ndarray::Array2<f64>) -> f64 {
    let n = points.nrows();
    let dist = |i: usize, j: usize| {
        points
            .row(i)
            .iter()
            .zip(points.row(j).iter())
            .map(|(x, y)| (x - y).abs())
            .map(|d| d * d)
            .sum::<f64>()
            .sqrt()
    };

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    best[0] = 0.0;
    let mut longest: f64 = 0.0;
    for _ in 0..n {
        let v = (0..n)
            .filter(|&v| !in_tree[v])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]))
            .unwrap();
        in_tree[v] = true;
        longest = longest.max(best[v]);
        for w in 0..n {
            if !in_tree[w] {
                best[w] = best[w].min(dist(v, w));
            }
        }
    }
    longest
}

#[test]
fn test_betti0_drops_to_one_past_longest_mst_edge() {
    let strategy: Strategy = "stratified".parse().unwrap();
    let design = generate(&unit_square_space(), 20, strategy, 31).unwrap();
    let dataset = merge(&design, run_sum(&design)).unwrap();

    let analyzer = PersistenceAnalyzer::new();
    let cloud = analyzer.build_point_cloud(&dataset, &["a", "b", "sum"], false).unwrap();
    assert_eq!(cloud.n_points(), 20);

    let result = analyzer.compute(&cloud, 1, DistanceMetric::Euclidean).unwrap();
    let diagram = &result.diagram;
    let l = longest_mst_edge(cloud.data());

    let last_merge = diagram
        .finite(0)
        .iter()
        .filter_map(|p| p.persistence())
        .fold(0.0, f64::max);
    assert!((last_merge - l).abs() < 1e-12);
    assert!(diagram.betti_at(0, l * (1.0 - 1e-9)) >= 2);
    assert_eq!(diagram.betti_at(0, l * (1.0 + 1e-9)), 1);
    assert_eq!(diagram.betti_at(0, 0.0), 20);

    let dm = DistanceMatrix::from_points(cloud.data(), DistanceMetric::Euclidean);
    assert_eq!(dm.components_within(l * (1.0 + 1e-9)), 1);
    assert_eq!(dm.components_within(l * (1.0 - 1e-9)), 2);

    for pair in diagram.pairs() {
        if let Death::Finite(d) = pair.death {
            assert!(pair.birth <= d);
        }
    }
}

#[test]
fn test_identical_outcomes_are_trivial() {
    let design = generate(&unit_square_space(), 7, Strategy::Halton, 3).unwrap();
    let outputs: HashMap<usize, RunOutcome> = design
        .samples()
        .iter()
        .map(|s| {
            let mut table = OutputTable::new();
            table.insert("temperature".into(), MetricValue::Scalar(2.7));
            (s.id, RunOutcome::Completed(table))
        })
        .collect();
    let dataset = merge(&design, outputs).unwrap();

    let cloud = build_point_cloud(&dataset, &["temperature"], false).unwrap();
    let result = PersistenceAnalyzer::new()
        .compute(&cloud, 1, DistanceMetric::Euclidean)
        .unwrap();

    assert_eq!(result.diagram.betti_at(0, 0.0), 7);
    assert_eq!(result.diagram.betti_at(0, 1e-6), 1);
    assert!(result.diagnostics.contains(&Diagnostic::IdenticalPoints { points: 7 }));

    let graph = MapperBuilder::new()
        .compute(
            &cloud,
            &ColumnLens::new(["temperature"]),
            &Cover::default(),
            &Dbscan::default(),
        )
        .unwrap();
    assert_eq!(graph.node_count(), 1);
    assert_eq!(NetworkMetrics::analyze(&graph).connected_components, 1);
}

#[test]
fn test_failed_runs_reduce_usable_count() {
    let n = 16;
    let failed = [2, 9, 13];
    let design = generate(&unit_square_space(), n, Strategy::Sobol, 8).unwrap();
    let mut outputs = run_sum(&design);
    for id in failed {
        outputs.insert(id, RunOutcome::Failed { reason: "infeasible".into() });
    }
    let dataset = merge(&design, outputs).unwrap();

    assert_eq!(dataset.len(), n);
    assert_eq!(dataset.failed_ids(), failed.to_vec());
    assert_eq!(dataset.usable_count(&["sum"]), n - failed.len());

    let cloud = build_point_cloud(&dataset, &["a", "sum"], true).unwrap();
    assert_eq!(cloud.n_points(), n - failed.len());
    assert!(cloud.sample_ids().iter().all(|id| !failed.contains(id)));
}

#[test]
fn test_mapper_covers_every_usable_sample() {
    let design = generate(&unit_square_space(), 40, Strategy::Orthogonal, 12).unwrap();
    let dataset = merge(&design, run_sum(&design)).unwrap();
    let cloud = build_point_cloud(&dataset, &["a", "b", "sum"], true).unwrap();

    for (intervals, overlap) in [(1, 0.0), (5, 10.0), (12, 60.0)] {
        let graph = MapperBuilder::new()
            .compute(
                &cloud,
                &ColumnLens::new(["sum"]),
                &Cover::new(intervals, overlap).unwrap(),
                &SingleLinkage::new(0.7),
            )
            .unwrap();
        let expected: BTreeSet<usize> = cloud.sample_ids().iter().copied().collect();
        assert_eq!(graph.covered_samples(), expected);

        // Members of a node share one cube of the cover
        for node in graph.nodes() {
            assert!(!node.members.is_empty());
            assert_eq!(node.cube.len(), 1);
        }
    }
}

#[test]
fn test_dataset_file_round_trip_preserves_analysis() {
    let design = generate(&unit_square_space(), 12, Strategy::default(), 99).unwrap();
    let mut outputs = run_sum(&design);
    outputs.remove(&4);
    let dataset = merge(&design, outputs).unwrap();

    let mut buf = Vec::new();
    write_dataset(&dataset, &mut buf).unwrap();
    let restored = read_dataset(buf.as_slice()).unwrap();
    assert_eq!(restored.missing_ids(), vec![4]);

    let mut config = AnalysisConfig::default();
    config.persistence.max_dimension = 1;
    config.mapper.intervals = 3;
    let a = analyze(&dataset, &config).unwrap();
    let b = analyze(&restored, &config).unwrap();

    assert_eq!(a.persistence.diagram, b.persistence.diagram);
    assert_eq!(a.mapper.graph, b.mapper.graph);
    assert_eq!(a.persistence.points, 11);
}
