use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostic::Diagnostic;

/// A cluster of one cover element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapperNode {
    pub id: usize,
    /// Interval index per lens coordinate
    pub cube: Vec<usize>,
    /// Sample ids in the preimage, ascending
    pub members: Vec<usize>,
    /// Mean of the members per column, in the dataset's units
    pub centroid: Vec<f64>,
}

/// Two nodes whose preimages intersect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapperEdge {
    pub source: usize,
    pub target: usize,
    /// Number of shared samples
    pub weight: usize,
}

/// How the graph was produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapperSettings {
    pub lens: String,
    pub intervals: usize,
    pub overlap_percent: f64,
    pub clusterer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapperGraph {
    pub(crate) columns: Vec<String>,
    pub(crate) nodes: Vec<MapperNode>,
    pub(crate) edges: Vec<MapperEdge>,
    pub(crate) settings: MapperSettings,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl MapperGraph {
    /// Column names the centroids refer to
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn nodes(&self) -> &[MapperNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[MapperEdge] {
        &self.edges
    }

    pub fn settings(&self) -> &MapperSettings {
        &self.settings
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes whose preimage contains `sample_id`
    pub fn nodes_of_sample(&self, sample_id: usize) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|n| n.members.binary_search(&sample_id).is_ok())
            .map(|n| n.id)
            .collect()
    }

    /// Union of all node preimages
    pub fn covered_samples(&self) -> BTreeSet<usize> {
        self.nodes.iter().flat_map(|n| n.members.iter().copied()).collect()
    }

    /// Sorted neighbour lists indexed by node id
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.nodes.len()];
        for e in &self.edges {
            adj[e.source].push(e.target);
            adj[e.target].push(e.source);
        }
        for list in &mut adj {
            list.sort_unstable();
        }
        adj
    }

    /// Edge weight lookup keyed by (min id, max id)
    pub fn edge_weights(&self) -> BTreeMap<(usize, usize), usize> {
        self.edges
            .iter()
            .map(|e| ((e.source.min(e.target), e.source.max(e.target)), e.weight))
            .collect()
    }
}
