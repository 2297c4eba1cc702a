//! Export records for diagrams and Mapper graphs
//!
//! These are the flat shapes handed to plotting and interpretation tools:
//! essential deaths become `null` plus an `essential` flag, and node
//! centroids are keyed by column name.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::error::Result;
use crate::mapper::MapperGraph;
use crate::tabular::{format_float, write_row};
use crate::topology::{Death, PersistenceDiagram};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramRecord {
    pub dimension: usize,
    pub birth: f64,
    pub death: Option<f64>,
    pub essential: bool,
}

pub fn diagram_records(diagram: &PersistenceDiagram) -> Vec<DiagramRecord> {
    diagram
        .pairs()
        .iter()
        .map(|p| DiagramRecord {
            dimension: p.dimension,
            birth: p.birth,
            death: match p.death {
                Death::Finite(d) => Some(d),
                Death::Essential => None,
            },
            essential: p.is_essential(),
        })
        .collect()
}

/// `dimension,birth,death,essential` rows; essential deaths are left empty
pub fn write_diagram_csv<W: Write>(diagram: &PersistenceDiagram, writer: &mut W) -> Result<()> {
    write_row(writer, &["dimension", "birth", "death", "essential"])?;
    for r in diagram_records(diagram) {
        write_row(
            writer,
            &[
                r.dimension.to_string(),
                format_float(r.birth),
                r.death.map(format_float).unwrap_or_default(),
                r.essential.to_string(),
            ],
        )?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeExport {
    pub id: usize,
    pub members: Vec<usize>,
    pub centroid: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeExport {
    pub source: usize,
    pub target: usize,
    pub intersection: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

impl GraphExport {
    pub fn from_graph(graph: &MapperGraph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|n| NodeExport {
                id: n.id,
                members: n.members.clone(),
                centroid: graph.columns().iter().cloned().zip(n.centroid.iter().copied()).collect(),
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|e| EdgeExport {
                source: e.source,
                target: e.target,
                intersection: e.weight,
            })
            .collect();
        Self { nodes, edges }
    }
}

/// Pretty-printed JSON of any export record
pub fn write_json<W: Write, T: Serialize + ?Sized>(value: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PointCloud;
    use crate::mapper::{ColumnLens, Cover, MapperBuilder, TrivialClusterer};
    use crate::topology::PersistencePair;
    use ndarray::array;

    fn diagram() -> PersistenceDiagram {
        PersistenceDiagram::new(
            1,
            vec![
                PersistencePair { dimension: 0, birth: 0.0, death: Death::Finite(0.25) },
                PersistencePair { dimension: 0, birth: 0.0, death: Death::Essential },
                PersistencePair { dimension: 1, birth: 0.5, death: Death::Finite(0.75) },
            ],
        )
    }

    #[test]
    fn test_essential_flagged() {
        let records = diagram_records(&diagram());
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].death, None);
        assert!(records[1].essential);
        assert!(!records[0].essential);

        let mut buf = Vec::new();
        write_json(&records, &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert!(json[1]["death"].is_null());
        assert_eq!(json[2]["dimension"], 1);
    }

    #[test]
    fn test_diagram_csv() {
        let mut buf = Vec::new();
        write_diagram_csv(&diagram(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "dimension,birth,death,essential");
        assert_eq!(lines[1], "0,0,0.25,false");
        assert_eq!(lines[2], "0,0,,true");
    }

    #[test]
    fn test_graph_export() {
        let cloud = PointCloud::from_array(
            vec!["temperature".into()],
            array![[1.0], [2.0], [3.0]],
            vec![4, 5, 6],
        )
        .unwrap();
        let graph = MapperBuilder::new()
            .compute(&cloud, &ColumnLens::new(["temperature"]), &Cover::new(2, 50.0).unwrap(), &TrivialClusterer)
            .unwrap();
        let export = GraphExport::from_graph(&graph);

        assert_eq!(export.nodes.len(), 2);
        assert_eq!(export.nodes[0].members, vec![4, 5]);
        assert_eq!(export.nodes[0].centroid["temperature"], 1.5);
        assert_eq!(export.edges.len(), 1);
        assert_eq!(export.edges[0].intersection, 1);

        let mut buf = Vec::new();
        write_json(&export, &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["edges"][0]["intersection"], 1);
    }
}
