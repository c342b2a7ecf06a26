use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::ir::{Graph, Vertex, VertexId};
use crate::layout::{
    LayoutResult, LayoutState, Ordering, StructuralError, compute_ancestors,
    compute_vertical_levels,
};

/// Flat copy of the working graph: vertices in id order plus weighted edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub num_real: usize,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<(VertexId, VertexId, u32)>,
}

/// Persisted layout state. Restoring keeps virtual-vertex identity, so the
/// base graph is derived from the working graph rather than re-split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub working_graph: GraphSnapshot,
    pub ranks: Vec<usize>,
    pub order: Ordering,
    pub positions: Vec<f64>,
}

impl GraphSnapshot {
    pub fn capture(graph: &Graph) -> Self {
        Self {
            num_real: graph.num_real(),
            vertices: graph.vertices().to_vec(),
            edges: graph
                .edges()
                .map(|(from, to)| (from, to, graph.weight(from, to)))
                .collect(),
        }
    }

    pub fn restore(&self) -> LayoutResult<Graph> {
        let mut graph = Graph::new();
        for vertex in &self.vertices {
            graph.add_vertex(&vertex.name, vertex.kind, vertex.width)?;
        }
        if graph.num_real() != self.num_real {
            return Err(StructuralError::SnapshotMismatch {
                field: "numReal",
                expected: self.num_real,
                found: graph.num_real(),
            }
            .into());
        }
        for &(from, to, weight) in &self.edges {
            graph.add_edge(from, to, weight)?;
        }
        graph.validate()?;
        Ok(graph)
    }
}

impl Snapshot {
    pub fn capture(state: &LayoutState) -> Self {
        Self {
            working_graph: GraphSnapshot::capture(&state.graph),
            ranks: state.ranks.clone(),
            order: state.ordering.clone(),
            positions: state.positions.clone(),
        }
    }

    /// Rebuilds the full layout state; ancestors and vertical levels are
    /// recomputed since they derive from the stored arrays.
    pub fn restore(self) -> LayoutResult<LayoutState> {
        let graph = self.working_graph.restore()?;
        for (field, found) in [("ranks", self.ranks.len()), ("positions", self.positions.len())] {
            if found != graph.len() {
                return Err(StructuralError::SnapshotMismatch {
                    field,
                    expected: graph.len(),
                    found,
                }
                .into());
            }
        }
        let placed: usize = self.order.rows().iter().map(Vec::len).sum();
        if placed != graph.len() {
            return Err(StructuralError::SnapshotMismatch {
                field: "order",
                expected: graph.len(),
                found: placed,
            }
            .into());
        }

        check_order(&self.order, &self.ranks)?;

        let max_rank = self.ranks.iter().copied().max().unwrap_or(0);
        let mut ordering = self.order;
        ordering.ensure_ranks(max_rank + 1);
        let ancestors = compute_ancestors(&graph, &self.ranks);
        let mut state = LayoutState {
            graph,
            ranks: self.ranks,
            max_rank,
            ordering,
            positions: self.positions,
            vertical: Default::default(),
            ancestors,
        };
        state.vertical = compute_vertical_levels(&state);
        Ok(state)
    }

    /// The virtual-free graph the snapshot's working graph was split from.
    pub fn base_graph(&self) -> LayoutResult<Graph> {
        self.working_graph.restore()?.base_graph()
    }
}

/// Every vertex must sit exactly once in the order row of its own rank.
fn check_order(order: &Ordering, ranks: &[usize]) -> LayoutResult<()> {
    let mut seen = vec![false; ranks.len()];
    for (rank, row) in order.rows().iter().enumerate() {
        for &v in row {
            if v >= ranks.len() {
                return Err(StructuralError::SnapshotMismatch {
                    field: "order",
                    expected: ranks.len(),
                    found: v,
                }
                .into());
            }
            if seen[v] {
                return Err(StructuralError::SnapshotMismatch {
                    field: "order",
                    expected: 1,
                    found: 2,
                }
                .into());
            }
            seen[v] = true;
            if ranks[v] != rank {
                return Err(StructuralError::SnapshotMismatch {
                    field: "ranks",
                    expected: rank,
                    found: ranks[v],
                }
                .into());
            }
        }
    }
    Ok(())
}

pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let file = File::open(path)?;
    let snapshot = serde_json::from_reader(BufReader::new(file))?;
    Ok(snapshot)
}
