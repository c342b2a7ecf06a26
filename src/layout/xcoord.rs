use crate::config::LayoutConfig;
use crate::ir::{Graph, VertexId, VertexKind};

use super::long_edges::long_edge_chains;
use super::ordering::Ordering;
use super::types::LayoutState;

const EPS: f64 = 1e-6;
const SHIFT_PROBES: usize = 4;

/// Edge-length objective: the weighted total plus the per-rank breakdown used
/// to settle near-ties.
#[derive(Debug, Clone, PartialEq)]
pub struct XScore {
    pub total: f64,
    pub per_rank: Vec<f64>,
}

impl XScore {
    pub fn is_better_than(&self, other: &XScore) -> bool {
        if (self.total - other.total).abs() > EPS {
            return self.total < other.total;
        }
        for (mine, theirs) in self.per_rank.iter().zip(&other.per_rank) {
            if (mine - theirs).abs() > EPS {
                return mine < theirs;
            }
        }
        false
    }
}

struct Placer<'a> {
    graph: &'a Graph,
    ranks: &'a [usize],
    max_rank: usize,
    ordering: &'a Ordering,
    config: &'a LayoutConfig,
    chains: Vec<Vec<VertexId>>,
}

/// Assigns a center x to every vertex of the working graph.
///
/// Starts from a left-packed placement and improves it until an iteration no
/// longer lowers the score. Vertices on rank 0 are left at 0.
pub fn assign_positions(state: &LayoutState, config: &LayoutConfig) -> Vec<f64> {
    let placer = Placer::new(state, config);
    let mut x = placer.initial_positions();
    placer.improve(&mut x);
    x
}

pub fn score_positions(state: &LayoutState, config: &LayoutConfig, x: &[f64]) -> XScore {
    Placer::new(state, config).score(x)
}

/// Smallest center-to-center distance between `u` and its right neighbour `v`.
pub fn min_gap(graph: &Graph, config: &LayoutConfig, u: VertexId, v: VertexId) -> f64 {
    graph.half_width(u) + separation(graph, config, u, v) + graph.half_width(v)
}

fn separation(graph: &Graph, config: &LayoutConfig, u: VertexId, v: VertexId) -> f64 {
    let (ku, kv) = (graph.kind(u), graph.kind(v));
    match (ku, kv) {
        (VertexKind::VirtualEdge, VertexKind::VirtualEdge) => config.virtual_separation,
        (VertexKind::Person { .. }, VertexKind::Person { .. }) => config.person_separation,
        _ => config.relationship_separation,
    }
}

impl<'a> Placer<'a> {
    fn new(state: &'a LayoutState, config: &'a LayoutConfig) -> Self {
        Self {
            graph: &state.graph,
            ranks: &state.ranks,
            max_rank: state.max_rank,
            ordering: &state.ordering,
            config,
            chains: long_edge_chains(&state.graph)
                .into_iter()
                .filter(|chain| chain.len() > 1)
                .collect(),
        }
    }

    fn gap(&self, u: VertexId, v: VertexId) -> f64 {
        min_gap(self.graph, self.config, u, v)
    }

    fn initial_positions(&self) -> Vec<f64> {
        let mut x = vec![0.0; self.graph.len()];
        for rank in 1..=self.max_rank {
            let mut prev: Option<VertexId> = None;
            for &v in self.ordering.rank(rank) {
                x[v] = match prev {
                    None => self.graph.half_width(v),
                    Some(u) => x[u] + self.gap(u, v),
                };
                prev = Some(v);
            }
        }
        x
    }

    fn importance(&self, v: VertexId, w: VertexId) -> f64 {
        let importance = &self.config.xcoord;
        let graph = self.graph;
        if graph.is_virtual(v) && graph.is_virtual(w) {
            importance.virtual_importance
        } else if graph.is_relationship(w) {
            importance.relationship_importance
        } else if graph.is_relationship(v) {
            importance.child_hub_importance
        } else {
            importance.base_importance
        }
    }

    fn edge_cost(&self, x: &[f64], v: VertexId, w: VertexId) -> f64 {
        self.importance(v, w) * f64::from(self.graph.weight(v, w)) * (x[v] - x[w]).abs()
    }

    fn score(&self, x: &[f64]) -> XScore {
        let mut per_rank = vec![0.0; self.max_rank + 1];
        for (v, w) in self.graph.edges() {
            per_rank[self.ranks[v]] += self.edge_cost(x, v, w);
        }
        XScore {
            total: per_rank.iter().sum(),
            per_rank,
        }
    }

    /// Weighted median of the x of every neighbour of `v`.
    fn desired(&self, x: &[f64], v: VertexId) -> f64 {
        let graph = self.graph;
        let mut pulls: Vec<(f64, f64)> = graph
            .out_edges(v)
            .iter()
            .map(|&w| (x[w], self.importance(v, w) * f64::from(graph.weight(v, w))))
            .chain(
                graph
                    .in_edges(v)
                    .iter()
                    .map(|&u| (x[u], self.importance(u, v) * f64::from(graph.weight(u, v)))),
            )
            .collect();
        if pulls.is_empty() {
            return x[v];
        }
        pulls.sort_by(|a, b| a.0.total_cmp(&b.0));
        let half = pulls.iter().map(|p| p.1).sum::<f64>() / 2.0;
        let mut acc = 0.0;
        for (idx, &(pos, weight)) in pulls.iter().enumerate() {
            acc += weight;
            if (acc - half).abs() <= EPS {
                return match pulls.get(idx + 1) {
                    Some(&(next, _)) => (pos + next) / 2.0,
                    None => pos,
                };
            }
            if acc > half {
                return pos;
            }
        }
        x[v]
    }

    /// Furthest right `v` may go without moving its right neighbour.
    fn right_limit(&self, x: &[f64], v: VertexId) -> f64 {
        match self.ordering.right_of(self.ranks[v], v) {
            Some(u) => x[u] - self.gap(v, u),
            None => f64::INFINITY,
        }
    }

    fn left_limit(&self, x: &[f64], v: VertexId) -> f64 {
        match self.ordering.left_of(self.ranks[v], v) {
            Some(u) => x[u] + self.gap(u, v),
            None => f64::NEG_INFINITY,
        }
    }

    /// Moves `v` right by `amount`, pushing right neighbours just far enough.
    fn push_right(&self, x: &mut [f64], v: VertexId, amount: f64) {
        let rank = self.ranks[v];
        x[v] += amount;
        let mut prev = v;
        for &u in &self.ordering.rank(rank)[self.ordering.position(v) + 1..] {
            let need = x[prev] + self.gap(prev, u);
            if x[u] >= need {
                break;
            }
            x[u] = need;
            prev = u;
        }
    }

    fn shift_right_pass(&self, x: &mut Vec<f64>, ranks: &[usize]) {
        for &rank in ranks {
            for &v in self.ordering.rank(rank).iter().rev() {
                let target = self.desired(x, v);
                if target <= x[v] + EPS {
                    continue;
                }
                let full = target - x[v];
                let free = (self.right_limit(x, v) - x[v]).max(0.0).min(full);
                let current = self.score(x);

                let mut accepted = false;
                let mut hi = full;
                for _ in 0..=SHIFT_PROBES {
                    let mut trial = x.clone();
                    self.push_right(&mut trial, v, hi);
                    if self.score(&trial).is_better_than(&current) {
                        *x = trial;
                        accepted = true;
                        break;
                    }
                    hi = (free + hi) / 2.0;
                    if hi - free <= EPS {
                        break;
                    }
                }
                if !accepted && free > EPS {
                    let mut trial = x.clone();
                    trial[v] += free;
                    if self.score(&trial).is_better_than(&current) {
                        *x = trial;
                    }
                }
            }
        }
    }

    fn shift_left_pass(&self, x: &mut [f64], ranks: &[usize]) {
        for &rank in ranks {
            for &v in self.ordering.rank(rank) {
                let target = self.desired(x, v);
                if target >= x[v] - EPS {
                    continue;
                }
                let room = x[v] - self.left_limit(x, v);
                let amount = (x[v] - target).min(room);
                if amount <= EPS {
                    continue;
                }
                let current = self.score(x);
                let original = x[v];
                for step in [amount, amount / 2.0] {
                    x[v] = original - step;
                    if self.score(x).is_better_than(&current) {
                        break;
                    }
                    x[v] = original;
                }
            }
        }
    }

    /// Lines bent virtual chains up: every chain vertex moves to the x of the
    /// bottom (or else the top) of the chain when all of them fit there
    /// without disturbing a neighbour.
    fn straighten_pass(&self, x: &mut [f64]) {
        for chain in &self.chains {
            let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
                continue;
            };
            if chain.iter().all(|&v| (x[v] - x[first]).abs() <= EPS) {
                continue;
            }
            let current = self.score(x);
            for corridor in [x[last], x[first]] {
                let fits = chain.iter().all(|&v| {
                    self.left_limit(x, v) <= corridor + EPS && corridor <= self.right_limit(x, v) + EPS
                });
                if !fits {
                    continue;
                }
                let saved: Vec<f64> = chain.iter().map(|&v| x[v]).collect();
                for &v in chain {
                    x[v] = corridor;
                }
                if self.score(x).is_better_than(&current) {
                    break;
                }
                for (&v, &old) in chain.iter().zip(&saved) {
                    x[v] = old;
                }
            }
        }
    }

    /// Shifts everything so the leftmost live extent sits at 0.
    fn normalize(&self, x: &mut [f64]) {
        let left = (0..self.graph.len())
            .filter(|&v| self.ranks[v] > 0)
            .map(|v| x[v] - self.graph.half_width(v))
            .fold(f64::INFINITY, f64::min);
        if !left.is_finite() {
            return;
        }
        for v in 0..self.graph.len() {
            if self.ranks[v] > 0 {
                x[v] -= left;
            }
        }
    }

    fn improve(&self, x: &mut Vec<f64>) {
        let top_down: Vec<usize> = (1..=self.max_rank).collect();
        let bottom_up: Vec<usize> = top_down.iter().rev().copied().collect();

        let mut best = x.clone();
        let mut best_score = self.score(x);
        for iteration in 0..self.config.xcoord.iterations {
            self.shift_right_pass(x, &bottom_up);
            self.shift_right_pass(x, &top_down);
            self.shift_left_pass(x, &top_down);
            self.shift_left_pass(x, &bottom_up);
            self.straighten_pass(x);
            self.normalize(x);

            let score = self.score(x);
            if !score.is_better_than(&best_score) {
                tracing::trace!(iteration, score = score.total, "x-coordinates converged");
                break;
            }
            best = x.clone();
            best_score = score;
        }
        *x = best;
    }
}
