use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::ir::{Graph, VertexId, VertexKind};

use super::ancestors::AncestorSets;
use super::crossings::RankedGraph;
use super::error::LayoutResult;
use super::ordering::Ordering;
use super::vertical::VerticalLevels;

/// Everything the pipeline and the incremental editor work on.
///
/// `graph` is the working graph (virtual vertices included); every per-vertex
/// vector is indexed by its vertex ids. Rank 0 holds discarded vertices.
#[derive(Debug, Clone)]
pub struct LayoutState {
    pub graph: Graph,
    pub ranks: Vec<usize>,
    pub max_rank: usize,
    pub ordering: Ordering,
    pub positions: Vec<f64>,
    pub vertical: VerticalLevels,
    pub ancestors: AncestorSets,
}

#[derive(Debug, Clone)]
pub struct NodePlacement {
    pub id: VertexId,
    pub name: String,
    pub kind: VertexKind,
    pub rank: usize,
    pub order: usize,
    pub x: f64,
    pub width: f64,
    pub vertical_level: Option<u32>,
}

/// Renderer-facing view of a finished layout.
#[derive(Debug, Clone)]
pub struct PedigreeLayout {
    pub nodes: Vec<NodePlacement>,
    pub max_rank: usize,
    pub rank_vertical_levels: Vec<u32>,
    /// Extra vertical room above each rank, `vertical_level_step` per level
    /// stacked on the ranks above it.
    pub rank_offsets: Vec<f64>,
    pub ancestors: BTreeMap<VertexId, BTreeMap<VertexId, u32>>,
    pub consanguinity: Vec<VertexId>,
    pub crossings: f64,
}

impl LayoutState {
    pub(crate) fn view(&self) -> RankedGraph<'_> {
        RankedGraph::new(&self.graph, &self.ranks, self.max_rank)
    }

    pub fn crossings(&self) -> f64 {
        self.view().total_crossings(&self.ordering)
    }

    /// Ids of vertices that take part in the drawing (discarded ones excluded).
    pub fn live_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.graph.len()).filter(|&v| self.ranks[v] > 0 && !self.graph.is_detached(v))
    }

    pub fn to_layout(&self, config: &LayoutConfig) -> PedigreeLayout {
        let nodes = self
            .live_vertices()
            .map(|v| {
                let vertex = self.graph.vertex(v);
                let level = self.vertical.level(v);
                NodePlacement {
                    id: v,
                    name: vertex.name.clone(),
                    kind: vertex.kind,
                    rank: self.ranks[v],
                    order: self.ordering.position(v),
                    x: self.positions[v],
                    width: vertex.width,
                    vertical_level: (level > 0).then_some(level),
                }
            })
            .collect();
        PedigreeLayout {
            nodes,
            max_rank: self.max_rank,
            rank_vertical_levels: self.vertical.rank_max.clone(),
            rank_offsets: (0..=self.max_rank)
                .map(|rank| f64::from(self.vertical.rank_offset(rank)) * config.vertical_level_step)
                .collect(),
            ancestors: self.ancestors.ancestors.clone(),
            consanguinity: self.ancestors.consanguinity.iter().copied().collect(),
            crossings: self.crossings(),
        }
    }

    /// Makes sure `rank` exists in every per-rank structure.
    pub(crate) fn ensure_rank(&mut self, rank: usize) {
        if rank > self.max_rank {
            self.max_rank = rank;
        }
        self.ordering.ensure_ranks(self.max_rank + 1);
        self.vertical.ensure_ranks(self.max_rank + 1);
    }

    /// Moves every live vertex `count` ranks down, opening empty ranks at the top.
    pub(crate) fn shift_ranks_down(&mut self, count: usize) {
        for rank in self.ranks.iter_mut().filter(|r| **r > 0) {
            *rank += count;
        }
        self.ordering.ensure_ranks(self.max_rank + 1);
        self.ordering.insert_rows(1, count);
        self.max_rank += count;
        self.vertical.ensure_ranks(self.max_rank + 1);
    }

    /// Adds a real vertex on `rank` (not yet placed in the ordering) and keeps
    /// every id-indexed vector in step with the renumbered virtual suffix.
    pub(crate) fn insert_real_vertex(
        &mut self,
        name: &str,
        kind: VertexKind,
        width: f64,
        rank: usize,
    ) -> LayoutResult<VertexId> {
        let id = self.graph.insert_real_vertex(name, kind, width)?;
        self.ranks.insert(id, rank);
        self.positions.insert(id, 0.0);
        self.ordering.bump_ids_from(id);
        self.vertical.insert_vertex(id);
        self.ensure_rank(rank);
        Ok(id)
    }
}
