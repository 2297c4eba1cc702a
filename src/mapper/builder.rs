use log::{debug, info, warn};
use ndarray::{Array1, Axis};
use std::collections::BTreeMap;

use super::{Clusterer, Cover, Lens, MapperEdge, MapperGraph, MapperNode, MapperSettings};
use crate::dataset::PointCloud;
use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};

/// Assembles Mapper graphs from a lens, a cover and a clusterer
#[derive(Debug, Clone, Copy, Default)]
pub struct MapperBuilder;

impl MapperBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(
        &self,
        cloud: &PointCloud,
        lens: &dyn Lens,
        cover: &Cover,
        clusterer: &dyn Clusterer,
    ) -> Result<MapperGraph> {
        let n = cloud.n_points();
        if n == 0 {
            return Err(Error::InsufficientPoints { required: 1, actual: 0 });
        }

        let values = lens.project(cloud)?;
        if values.nrows() != n {
            return Err(Error::InvalidLens(format!(
                "lens '{}' produced {} rows for {} points",
                lens.name(),
                values.nrows(),
                n
            )));
        }
        if values.ncols() == 0 {
            return Err(Error::InvalidLens(format!("lens '{}' produced no coordinates", lens.name())));
        }
        if let Some(((row, _), _)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidLens(format!(
                "lens '{}' is not finite at sample {}",
                lens.name(),
                cloud.sample_ids()[row]
            )));
        }

        let (cubes, mut diagnostics) = cover.assign(&values);
        let ids = cloud.sample_ids();

        let data = cloud.data();
        let identical = n > 1 && data.rows().into_iter().all(|row| row == data.row(0));
        let mut nodes: Vec<MapperNode> = Vec::new();
        if identical {
            warn!("all {} points are identical; Mapper graph is a single node", n);
            diagnostics.push(Diagnostic::IdenticalPoints { points: n });
            let all: Vec<usize> = (0..n).collect();
            let cube = cubes
                .iter()
                .find(|(_, rows)| rows.len() == n)
                .or_else(|| cubes.iter().next())
                .map(|(cube, _)| cube.clone())
                .unwrap_or_default();
            let mut members = ids.to_vec();
            members.sort_unstable();
            nodes.push(MapperNode { id: 0, cube, members, centroid: centroid(cloud, &all) });
        } else {
            for (cube, rows) in cubes {
                let preimage = cloud.select_rows(&rows);
                let mut clusters: Vec<Vec<usize>> = clusterer
                    .cluster(&preimage)
                    .into_iter()
                    .map(|cluster| cluster.into_iter().map(|k| rows[k]).collect())
                    .collect();
                clusters.sort_by_key(|c: &Vec<usize>| c.iter().map(|&r| ids[r]).min());

                for cluster in clusters.into_iter().filter(|c| !c.is_empty()) {
                    let mut members: Vec<usize> = cluster.iter().map(|&r| ids[r]).collect();
                    members.sort_unstable();
                    nodes.push(MapperNode {
                        id: nodes.len(),
                        cube: cube.clone(),
                        members,
                        centroid: centroid(cloud, &cluster),
                    });
                }
            }
        }

        let edges = overlap_edges(&nodes);
        info!(
            "Mapper graph: {} nodes, {} edges from {} points ({}, {})",
            nodes.len(),
            edges.len(),
            n,
            lens.name(),
            clusterer.name()
        );

        Ok(MapperGraph {
            columns: cloud.columns().to_vec(),
            nodes,
            edges,
            settings: MapperSettings {
                lens: lens.name(),
                intervals: cover.intervals(),
                overlap_percent: cover.overlap_percent(),
                clusterer: clusterer.name(),
            },
            diagnostics,
        })
    }
}

/// Mean of the rows, mapped back through the cloud's standardization
fn centroid(cloud: &PointCloud, rows: &[usize]) -> Vec<f64> {
    let mean = cloud
        .select_rows(rows)
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(cloud.n_features()));
    match cloud.scaling() {
        Some(scaling) => mean
            .iter()
            .zip(scaling.mean.iter().zip(&scaling.std))
            .map(|(&z, (&mu, &sigma))| mu + z * sigma)
            .collect(),
        None => mean.to_vec(),
    }
}

fn overlap_edges(nodes: &[MapperNode]) -> Vec<MapperEdge> {
    let mut by_sample: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for node in nodes {
        for &s in &node.members {
            by_sample.entry(s).or_default().push(node.id);
        }
    }

    let mut shared: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for holders in by_sample.values() {
        for (i, &a) in holders.iter().enumerate() {
            for &b in &holders[i + 1..] {
                *shared.entry((a, b)).or_insert(0) += 1;
            }
        }
    }
    debug!("{} samples shared between nodes", by_sample.values().filter(|h| h.len() > 1).count());

    shared
        .into_iter()
        .map(|((source, target), weight)| MapperEdge { source, target, weight })
        .collect()
}
