//! Structural metrics of a Mapper graph
//!
//! Edges are weighted by the number of samples the two nodes share. Degrees,
//! distances and clustering use the unweighted structure; communities and
//! modularity use the weights.
//!
//! ## Modularity
//!
//!   Q = Σ_c [ L_c / m − (d_c / 2m)² ]
//!
//! with m the total edge weight, L_c the weight inside community c and d_c
//! the summed weighted degree of its nodes. Communities come from greedy
//! local moving (the first phase of Louvain), visiting nodes in id order so
//! the partition is a pure function of the graph.

use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

use crate::mapper::MapperGraph;

const MAX_PASSES: usize = 100;
const GAIN_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub connected_components: usize,
    pub degree_min: usize,
    pub degree_max: usize,
    pub degree_mean: f64,
    pub density: f64,
    /// Largest hop eccentricity over all components
    pub diameter: usize,
    pub average_clustering: f64,
    /// Node ids per community, ordered by first node
    pub communities: Vec<Vec<usize>>,
    pub modularity: f64,
}

impl NetworkMetrics {
    pub fn analyze(graph: &MapperGraph) -> Self {
        let n = graph.node_count();
        let adj = graph.adjacency();
        let degrees: Vec<usize> = adj.iter().map(Vec::len).collect();

        let components = components(&adj);
        let diameter = components
            .iter()
            .flat_map(|component| component.iter().map(|&v| eccentricity(&adj, v)))
            .max()
            .unwrap_or(0);

        let density = if n > 1 {
            2.0 * graph.edge_count() as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };

        let communities = detect_communities(graph);
        let modularity = modularity(graph, &communities);
        debug!(
            "Network: {} components, {} communities (Q = {:.4})",
            components.len(),
            communities.len(),
            modularity
        );

        Self {
            node_count: n,
            edge_count: graph.edge_count(),
            connected_components: components.len(),
            degree_min: degrees.iter().copied().min().unwrap_or(0),
            degree_max: degrees.iter().copied().max().unwrap_or(0),
            degree_mean: if n > 0 {
                degrees.iter().sum::<usize>() as f64 / n as f64
            } else {
                0.0
            },
            density,
            diameter,
            average_clustering: average_clustering(&adj),
            communities,
            modularity,
        }
    }

    /// Scalar metrics by name
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        [
            ("node_count", self.node_count as f64),
            ("edge_count", self.edge_count as f64),
            ("connected_components", self.connected_components as f64),
            ("degree_min", self.degree_min as f64),
            ("degree_max", self.degree_max as f64),
            ("degree_mean", self.degree_mean),
            ("density", self.density),
            ("diameter", self.diameter as f64),
            ("average_clustering", self.average_clustering),
            ("communities", self.communities.len() as f64),
            ("modularity", self.modularity),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

fn components(adj: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut seen = vec![false; adj.len()];
    let mut out = Vec::new();
    for start in 0..adj.len() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            for &w in &adj[v] {
                if !seen[w] {
                    seen[w] = true;
                    component.push(w);
                    queue.push_back(w);
                }
            }
        }
        component.sort_unstable();
        out.push(component);
    }
    out
}

/// Largest BFS distance from `source`
fn eccentricity(adj: &[Vec<usize>], source: usize) -> usize {
    let mut dist = vec![usize::MAX; adj.len()];
    dist[source] = 0;
    let mut queue = VecDeque::from([source]);
    let mut far = 0;
    while let Some(v) = queue.pop_front() {
        far = far.max(dist[v]);
        for &w in &adj[v] {
            if dist[w] == usize::MAX {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
        }
    }
    far
}

/// Mean local clustering coefficient; nodes of degree < 2 count as 0
fn average_clustering(adj: &[Vec<usize>]) -> f64 {
    if adj.is_empty() {
        return 0.0;
    }
    let total: f64 = adj
        .iter()
        .map(|nbrs| {
            let k = nbrs.len();
            if k < 2 {
                return 0.0;
            }
            let mut links = 0;
            for (i, &a) in nbrs.iter().enumerate() {
                for &b in &nbrs[i + 1..] {
                    if adj[a].binary_search(&b).is_ok() {
                        links += 1;
                    }
                }
            }
            2.0 * links as f64 / (k * (k - 1)) as f64
        })
        .sum();
    total / adj.len() as f64
}

fn weighted_adjacency(graph: &MapperGraph) -> Vec<Vec<(usize, f64)>> {
    let mut adj = vec![Vec::new(); graph.node_count()];
    for e in graph.edges() {
        adj[e.source].push((e.target, e.weight as f64));
        adj[e.target].push((e.source, e.weight as f64));
    }
    adj
}

fn detect_communities(graph: &MapperGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let adj = weighted_adjacency(graph);
    let k: Vec<f64> = adj.iter().map(|l| l.iter().map(|&(_, w)| w).sum()).collect();
    let two_m: f64 = k.iter().sum();

    let mut community: Vec<usize> = (0..n).collect();
    if two_m > 0.0 {
        let mut sigma_tot = k.clone();
        for pass in 0..MAX_PASSES {
            let mut moved = false;
            for i in 0..n {
                let current = community[i];
                sigma_tot[current] -= k[i];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, w) in &adj[i] {
                    *links.entry(community[j]).or_insert(0.0) += w;
                }

                let gain = |c: usize, w: f64| w - sigma_tot[c] * k[i] / two_m;
                let mut best = current;
                let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
                for (&c, &w) in &links {
                    let g = gain(c, w);
                    if g > best_gain + GAIN_EPSILON {
                        best = c;
                        best_gain = g;
                    }
                }

                sigma_tot[best] += k[i];
                if best != current {
                    community[i] = best;
                    moved = true;
                }
            }
            if !moved {
                debug!("Community detection converged after {} passes", pass + 1);
                break;
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (node, &c) in community.iter().enumerate() {
        groups.entry(c).or_default().push(node);
    }
    let mut out: Vec<Vec<usize>> = groups.into_values().collect();
    out.sort_by_key(|g| g[0]);
    out
}

fn modularity(graph: &MapperGraph, communities: &[Vec<usize>]) -> f64 {
    let m: f64 = graph.edges().iter().map(|e| e.weight as f64).sum();
    if m <= 0.0 {
        return 0.0;
    }

    let mut label = vec![0; graph.node_count()];
    for (c, members) in communities.iter().enumerate() {
        for &v in members {
            label[v] = c;
        }
    }

    let mut inside = vec![0.0; communities.len()];
    let mut degree = vec![0.0; communities.len()];
    for e in graph.edges() {
        let w = e.weight as f64;
        degree[label[e.source]] += w;
        degree[label[e.target]] += w;
        if label[e.source] == label[e.target] {
            inside[label[e.source]] += w;
        }
    }

    inside
        .iter()
        .zip(&degree)
        .map(|(l, d)| l / m - (d / (2.0 * m)).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{MapperEdge, MapperNode, MapperSettings};

    fn graph(n: usize, edges: &[(usize, usize)]) -> MapperGraph {
        MapperGraph {
            columns: vec!["x".into()],
            nodes: (0..n)
                .map(|id| MapperNode {
                    id,
                    cube: vec![id],
                    members: vec![id],
                    centroid: vec![0.0],
                })
                .collect(),
            edges: edges
                .iter()
                .map(|&(source, target)| MapperEdge { source, target, weight: 1 })
                .collect(),
            settings: MapperSettings {
                lens: "test".into(),
                intervals: n,
                overlap_percent: 0.0,
                clusterer: "trivial".into(),
            },
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_two_triangles() {
        let g = graph(6, &[(0, 1), (0, 2), (1, 2), (2, 3), (3, 4), (3, 5), (4, 5)]);
        let metrics = NetworkMetrics::analyze(&g);

        assert_eq!(metrics.node_count, 6);
        assert_eq!(metrics.edge_count, 7);
        assert_eq!(metrics.connected_components, 1);
        assert_eq!(metrics.degree_min, 2);
        assert_eq!(metrics.degree_max, 3);
        assert_eq!(metrics.diameter, 3);
        assert_eq!(metrics.communities, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert!((metrics.modularity - 5.0 / 14.0).abs() < 1e-12);
        assert!((metrics.density - 7.0 / 15.0).abs() < 1e-12);

        // Nodes 0, 1, 4, 5 have coefficient 1; the bridge ends 1/3
        let expected = (4.0 + 2.0 / 3.0) / 6.0;
        assert!((metrics.average_clustering - expected).abs() < 1e-12);
    }

    #[test]
    fn test_disconnected_and_isolated() {
        let g = graph(5, &[(0, 1), (1, 2)]);
        let metrics = NetworkMetrics::analyze(&g);
        assert_eq!(metrics.connected_components, 3);
        assert_eq!(metrics.degree_min, 0);
        assert_eq!(metrics.diameter, 2);
        assert_eq!(metrics.communities.len(), 3);
        assert_eq!(metrics.average_clustering, 0.0);
    }

    #[test]
    fn test_empty_graph_and_map() {
        let metrics = NetworkMetrics::analyze(&graph(0, &[]));
        assert_eq!(metrics.node_count, 0);
        assert_eq!(metrics.modularity, 0.0);

        let single = NetworkMetrics::analyze(&graph(1, &[]));
        let map = single.to_map();
        assert_eq!(map["node_count"], 1.0);
        assert_eq!(map["density"], 0.0);
        assert_eq!(map["communities"], 1.0);
        assert_eq!(map.len(), 11);
    }
}
