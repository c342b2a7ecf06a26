use std::collections::{HashSet, VecDeque};

use crate::ir::VertexId;

use super::types::LayoutState;

const EPS: f64 = 1e-6;

/// Vertical level of every child hub (1 = closest to its relationship) and the
/// deepest level used on each rank. Non-hub vertices sit at level 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerticalLevels {
    pub levels: Vec<u32>,
    pub rank_max: Vec<u32>,
}

impl VerticalLevels {
    pub fn level(&self, v: VertexId) -> u32 {
        self.levels.get(v).copied().unwrap_or(0)
    }

    /// Levels stacked above `rank`, for renderers that stretch ranks apart.
    pub fn rank_offset(&self, rank: usize) -> u32 {
        self.rank_max.iter().take(rank).sum()
    }

    pub(crate) fn ensure_ranks(&mut self, num_ranks: usize) {
        if self.rank_max.len() < num_ranks {
            self.rank_max.resize(num_ranks, 0);
        }
    }

    pub(crate) fn remove_rank(&mut self, rank: usize) {
        if rank < self.rank_max.len() {
            self.rank_max.remove(rank);
        }
    }

    pub(crate) fn insert_vertex(&mut self, id: VertexId) {
        if id <= self.levels.len() {
            self.levels.insert(id, 0);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    x: f64,
    lo: f64,
    hi: f64,
}

impl Span {
    fn overlaps(&self, other: &Span) -> bool {
        self.lo < other.hi - EPS && other.lo < self.hi - EPS
    }

    fn strictly_contains(&self, x: f64) -> bool {
        self.lo + EPS < x && x < self.hi - EPS
    }
}

/// Assigns child-hub levels so that overlapping sibling lines on one rank do
/// not collide.
///
/// A hub whose own x falls strictly inside another hub's span is drawn below
/// that hub; any other overlap puts the later hub in left-to-right order below.
pub fn compute_vertical_levels(state: &LayoutState) -> VerticalLevels {
    let graph = &state.graph;
    let mut result = VerticalLevels {
        levels: vec![0; graph.len()],
        rank_max: vec![0; state.max_rank + 1],
    };

    for rank in 1..=state.max_rank {
        let hubs: Vec<VertexId> = state
            .ordering
            .rank(rank)
            .iter()
            .copied()
            .filter(|&v| graph.is_child_hub(v))
            .collect();
        if hubs.is_empty() {
            continue;
        }

        let spans: Vec<Span> = hubs
            .iter()
            .map(|&hub| {
                let x = state.positions[hub];
                let (mut lo, mut hi) = (x, x);
                for &child in graph.out_edges(hub) {
                    lo = lo.min(state.positions[child]);
                    hi = hi.max(state.positions[child]);
                }
                Span { x, lo, hi }
            })
            .collect();

        let levels = pack_rank(&spans);
        for (&hub, &level) in hubs.iter().zip(&levels) {
            result.levels[hub] = level;
        }
        result.rank_max[rank] = levels.iter().copied().max().unwrap_or(0);
    }
    result
}

fn pack_rank(spans: &[Span]) -> Vec<u32> {
    let mut levels = vec![1u32; spans.len()];
    // below[i]: hubs that must sit strictly below hub i
    let mut below: Vec<Vec<usize>> = vec![Vec::new(); spans.len()];

    for b in 0..spans.len() {
        let mut raise_later = Vec::new();
        for a in 0..b {
            if !spans[a].overlaps(&spans[b]) {
                continue;
            }
            let a_inside_b = spans[b].strictly_contains(spans[a].x);
            let b_inside_a = spans[a].strictly_contains(spans[b].x);
            if a_inside_b && !b_inside_a {
                below[b].push(a);
                raise_later.push(a);
            } else {
                below[a].push(b);
                levels[b] = levels[b].max(levels[a] + 1);
            }
        }
        for a in raise_later {
            if levels[a] <= levels[b] {
                let level = levels[b] + 1;
                push_down(&mut levels, &below, a, level);
            }
        }
    }
    levels
}

fn push_down(levels: &mut [u32], below: &[Vec<usize>], start: usize, level: u32) {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([(start, level)]);
    while let Some((i, level)) = queue.pop_front() {
        if levels[i] >= level || !visited.insert(i) {
            continue;
        }
        levels[i] = level;
        for &j in &below[i] {
            if levels[j] <= level {
                queue.push_back((j, level + 1));
            }
        }
    }
}
