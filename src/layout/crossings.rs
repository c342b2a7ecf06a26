use crate::ir::{Graph, VertexId};

use super::ordering::Ordering;

/// Read-only view of the pieces crossing counts depend on.
#[derive(Clone, Copy)]
pub(crate) struct RankedGraph<'a> {
    pub graph: &'a Graph,
    pub ranks: &'a [usize],
    pub max_rank: usize,
}

impl<'a> RankedGraph<'a> {
    pub fn new(graph: &'a Graph, ranks: &'a [usize], max_rank: usize) -> Self {
        Self {
            graph,
            ranks,
            max_rank,
        }
    }

    /// Crossings charged to the edge `v -> w`.
    ///
    /// Cross-rank edges only count inversions against edges leaving vertices
    /// ordered after `v`, so summing over all edges counts each crossing once.
    /// Same-rank edges count the vertices strictly between their endpoints that
    /// have an incoming edge, halved: this is an approximation that the
    /// transposition pass corrects for most local cases.
    pub fn edge_crossing(&self, ordering: &Ordering, v: VertexId, w: VertexId) -> f64 {
        let rank_v = self.ranks[v];
        let rank_w = self.ranks[w];
        let row = ordering.rank(rank_v);
        let pos_v = ordering.position(v);
        let pos_w = ordering.position(w);

        if rank_v == rank_w {
            let (lo, hi) = (pos_v.min(pos_w), pos_v.max(pos_w));
            let between = row[lo + 1..hi]
                .iter()
                .filter(|&&u| !self.graph.in_edges(u).is_empty())
                .count();
            return between as f64 / 2.0;
        }

        let mut count = 0usize;
        for &u in &row[pos_v + 1..] {
            for &t in self.graph.out_edges(u) {
                if self.ranks[t] == rank_w && ordering.position(t) < pos_w {
                    count += 1;
                }
            }
        }
        count as f64
    }

    /// Crossings between edges leaving `rank` towards `rank + 1`.
    pub fn bilayer_crossings(&self, ordering: &Ordering, rank: usize) -> f64 {
        let mut total = 0.0;
        for &v in ordering.rank(rank) {
            for &w in self.graph.out_edges(v) {
                if self.ranks[w] == rank + 1 {
                    total += self.edge_crossing(ordering, v, w);
                }
            }
        }
        total
    }

    pub fn same_rank_crossings(&self, ordering: &Ordering, rank: usize) -> f64 {
        let mut total = 0.0;
        for &v in ordering.rank(rank) {
            for &w in self.graph.out_edges(v) {
                if self.ranks[w] == rank {
                    total += self.edge_crossing(ordering, v, w);
                }
            }
        }
        total
    }

    /// Crossings that depend on the order of `rank`.
    pub fn rank_crossings(&self, ordering: &Ordering, rank: usize) -> f64 {
        let mut total = self.same_rank_crossings(ordering, rank) + self.bilayer_crossings(ordering, rank);
        if rank > 1 {
            total += self.bilayer_crossings(ordering, rank - 1);
        }
        total
    }

    /// Crossings of every edge touching ranks `lo..=hi`.
    pub fn range_crossings(&self, ordering: &Ordering, lo: usize, hi: usize) -> f64 {
        let lo = lo.max(1);
        let hi = hi.min(self.max_rank);
        let mut total = 0.0;
        for rank in lo..=hi {
            total += self.same_rank_crossings(ordering, rank) + self.bilayer_crossings(ordering, rank);
        }
        if lo > 1 {
            total += self.bilayer_crossings(ordering, lo - 1);
        }
        total
    }

    pub fn total_crossings(&self, ordering: &Ordering) -> f64 {
        if self.max_rank == 0 {
            return 0.0;
        }
        self.range_crossings(ordering, 1, self.max_rank)
    }

    /// Edge-length terms that depend on the order of `rank`: distance from
    /// same-rank relationships to their parents, spread of the parents of
    /// relationships one rank below, and the span of each child hub's children.
    pub fn rank_edge_length(&self, ordering: &Ordering, rank: usize) -> f64 {
        let graph = self.graph;
        let mut score = 0.0;

        for &v in ordering.rank(rank) {
            if graph.is_relationship(v) {
                for &p in graph.in_edges(v) {
                    if self.ranks[p] == rank {
                        score += ordering.position(p).abs_diff(ordering.position(v)) as f64 - 1.0;
                    }
                }
            }
        }

        for &rel in ordering.rank(rank + 1) {
            if !graph.is_relationship(rel) {
                continue;
            }
            if let [a, b] = graph.in_edges(rel) {
                if self.ranks[*a] == rank && self.ranks[*b] == rank {
                    score += ordering.position(*a).abs_diff(ordering.position(*b)) as f64 - 1.0;
                }
            }
        }

        if rank > 1 {
            for &hub in ordering.rank(rank - 1) {
                if !graph.is_child_hub(hub) {
                    continue;
                }
                let positions: Vec<usize> = graph
                    .out_edges(hub)
                    .iter()
                    .filter(|&&c| self.ranks[c] == rank)
                    .map(|&c| ordering.position(c))
                    .collect();
                if let (Some(lo), Some(hi)) = (positions.iter().min(), positions.iter().max()) {
                    score += (hi - lo + 1 - positions.len()) as f64;
                }
            }
        }

        score
    }

    pub fn total_edge_length(&self, ordering: &Ordering) -> f64 {
        (1..=self.max_rank)
            .map(|rank| self.rank_edge_length(ordering, rank))
            .sum()
    }
}
