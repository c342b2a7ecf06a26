use std::collections::VecDeque;

use crate::ir::{Graph, VertexId};

use super::error::{LayoutResult, StructuralError};

/// Integer generation per vertex. Live ranks start at 1; rank 0 is reserved
/// for discarded vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub ranks: Vec<usize>,
    pub max_rank: usize,
}

pub fn rank_vertices(graph: &Graph) -> LayoutResult<Ranking> {
    let mut ranks = init_ranks_by_in_edge_scanning(graph)?;
    compress_ranks(graph, &mut ranks);
    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    Ok(Ranking { ranks, max_rank })
}

/// Scans vertices from the parentless ones, visiting a vertex once all of its
/// in-edges have been seen, and places it one rank below its lowest parent.
///
/// Every edge spans exactly one rank whatever its weight; weights only break
/// ties in [`compress_ranks`], ordering and x-coordinate scoring.
pub fn init_ranks_by_in_edge_scanning(graph: &Graph) -> LayoutResult<Vec<usize>> {
    let roots = graph.parentless();
    if roots.is_empty() {
        return Err(StructuralError::NoRoots.into());
    }

    let n = graph.len();
    let mut ranks = vec![0usize; n];
    let mut pending: Vec<usize> = (0..n).map(|v| graph.in_edges(v).len()).collect();
    let mut queue: VecDeque<VertexId> = VecDeque::new();
    for &root in &roots {
        ranks[root] = 1;
        queue.push_back(root);
    }

    let mut visited = 0usize;
    while let Some(v) = queue.pop_front() {
        visited += 1;
        for &t in graph.out_edges(v) {
            ranks[t] = ranks[t].max(ranks[v] + 1);
            pending[t] -= 1;
            if pending[t] == 0 {
                queue.push_back(t);
            }
        }
    }

    if visited < n {
        if let Some(v) = (0..n).find(|&v| pending[v] > 0) {
            return Err(StructuralError::Cycle(v).into());
        }
    }
    Ok(ranks)
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    length: usize,
    weight: u32,
}

/// Pulls components that are only linked by long edges together.
///
/// Components are built from edges spanning exactly one rank. Each component
/// records its shortest outgoing cross-component edge (heaviest on ties); the
/// component whose candidate is heaviest overall (shortest on ties) moves down
/// by `length - 1`, which merges it with its neighbour. Ranks only ever grow,
/// and only outgoing edges are considered, so no edge can become inverted.
pub fn compress_ranks(graph: &Graph, ranks: &mut [usize]) {
    loop {
        let (component, count) = unit_edge_components(graph, ranks);
        if count <= 1 {
            break;
        }

        let mut candidates: Vec<Option<Candidate>> = vec![None; count];
        for (from, to) in graph.edges() {
            let (cf, ct) = (component[from], component[to]);
            if cf == ct || ranks[to] <= ranks[from] {
                continue;
            }
            let found = Candidate {
                length: ranks[to] - ranks[from],
                weight: graph.weight(from, to),
            };
            let slot = &mut candidates[cf];
            let better = match slot {
                None => true,
                Some(best) => {
                    found.length < best.length
                        || (found.length == best.length && found.weight > best.weight)
                }
            };
            if better {
                *slot = Some(found);
            }
        }

        let mut chosen: Option<(usize, Candidate)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let Some(candidate) = *candidate else {
                continue;
            };
            let better = match chosen {
                None => true,
                Some((_, best)) => {
                    candidate.weight > best.weight
                        || (candidate.weight == best.weight && candidate.length < best.length)
                }
            };
            if better {
                chosen = Some((idx, candidate));
            }
        }

        let Some((target, candidate)) = chosen else {
            break;
        };
        let shift = candidate.length - 1;
        for v in 0..ranks.len() {
            if component[v] == target {
                ranks[v] += shift;
            }
        }
    }

    if let Some(min) = ranks.iter().copied().filter(|&r| r > 0).min() {
        for rank in ranks.iter_mut().filter(|r| **r > 0) {
            *rank -= min - 1;
        }
    }
}

fn unit_edge_components(graph: &Graph, ranks: &[usize]) -> (Vec<usize>, usize) {
    let n = graph.len();
    let mut component = vec![usize::MAX; n];
    let mut count = 0;
    for start in 0..n {
        if component[start] != usize::MAX || graph.is_detached(start) {
            continue;
        }
        component[start] = count;
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            let down = graph.out_edges(v).iter().filter(|&&t| ranks[t] == ranks[v] + 1);
            let up = graph.in_edges(v).iter().filter(|&&s| ranks[s] + 1 == ranks[v]);
            for &u in down.chain(up) {
                if component[u] == usize::MAX {
                    component[u] = count;
                    queue.push_back(u);
                }
            }
        }
        count += 1;
    }
    (component, count)
}
