use crate::ir::VertexId;

use super::error::LayoutResult;
use super::types::LayoutState;

/// Moves every relationship up onto its parents' rank.
///
/// Relationships whose parents are already side by side slot in between them;
/// the rest are placed next to one of their parents afterwards. Ranks left
/// without a real vertex are then collapsed away.
pub fn rerank_relationships(state: &mut LayoutState) -> LayoutResult<usize> {
    let relationships: Vec<VertexId> = (0..state.graph.num_real())
        .filter(|&v| state.graph.is_relationship(v))
        .collect();

    let mut pending = Vec::new();
    for rel in relationships {
        if !move_between_adjacent_parents(state, rel) {
            pending.push(rel);
        }
    }
    for rel in pending {
        move_beside_parent(state, rel);
    }
    collapse_empty_ranks(state)
}

fn parent_pair(state: &LayoutState, rel: VertexId) -> Option<(VertexId, VertexId)> {
    let &[a, b] = state.graph.in_edges(rel) else {
        return None;
    };
    if state.ordering.position(a) <= state.ordering.position(b) {
        Some((a, b))
    } else {
        Some((b, a))
    }
}

fn move_between_adjacent_parents(state: &mut LayoutState, rel: VertexId) -> bool {
    let Some((left, right)) = parent_pair(state, rel) else {
        return false;
    };
    let rank = state.ranks[left];
    if state.ranks[right] != rank {
        return false;
    }
    let (pl, pr) = (state.ordering.position(left), state.ordering.position(right));
    if pr != pl + 1 {
        return false;
    }
    state.ordering.move_to(state.ranks[rel], rel, rank, pr);
    state.ranks[rel] = rank;
    true
}

fn is_relationship_of(state: &LayoutState, v: VertexId, parent: VertexId) -> bool {
    state.graph.is_relationship(v) && state.graph.in_edges(v).contains(&parent)
}

fn move_beside_parent(state: &mut LayoutState, rel: VertexId) {
    let Some((left, right)) = parent_pair(state, rel) else {
        return;
    };
    let rank = state.ranks[left].max(state.ranks[right]);
    let graph = &state.graph;
    let ordering = &state.ordering;
    let (pl, pr) = (ordering.position(left), ordering.position(right));

    let index = match (graph.is_virtual(left), graph.is_virtual(right)) {
        // Anchor on the real parent, towards the virtual one, past the
        // relationships already hanging off the real parent.
        (false, true) => {
            let mut i = pl + 1;
            while ordering.at(rank, i).is_some_and(|u| is_relationship_of(state, u, left)) {
                i += 1;
            }
            i
        }
        (true, false) => {
            let mut i = pr;
            while i > 0 && ordering.at(rank, i - 1).is_some_and(|u| is_relationship_of(state, u, right)) {
                i -= 1;
            }
            i
        }
        (true, true) => pl + 1,
        (false, false) => {
            let left_busy = ordering.at(rank, pl + 1).is_some_and(|u| graph.is_relationship(u));
            let right_busy = pr > 0 && ordering.at(rank, pr - 1).is_some_and(|u| graph.is_relationship(u));
            match (left_busy, right_busy) {
                (_, false) => pr,
                (false, true) => pl + 1,
                (true, true) => (pl + 1..=pr)
                    .find(|&i| ordering.at(rank, i).is_some_and(|u| !graph.is_relationship(u)))
                    .unwrap_or(pr),
            }
        }
    };

    state.ordering.move_to(state.ranks[rel], rel, rank, index);
    state.ranks[rel] = rank;
}

/// Removes every rank that holds no real vertex.
///
/// The virtual vertices on such a rank are spliced out of their chains and
/// parked on rank 0; lower ranks move up. Running it again is a no-op.
pub fn collapse_empty_ranks(state: &mut LayoutState) -> LayoutResult<usize> {
    let empty: Vec<usize> = (1..=state.max_rank)
        .filter(|&rank| state.ordering.rank(rank).iter().all(|&v| state.graph.is_virtual(v)))
        .collect();
    if empty.is_empty() {
        return Ok(0);
    }

    for &rank in &empty {
        for v in state.ordering.rank(rank).to_vec() {
            state.graph.unplug_vertex(v)?;
            let parked = state.ordering.rank(0).len();
            state.ordering.move_to(rank, v, 0, parked);
            state.ranks[v] = 0;
        }
    }
    for &rank in empty.iter().rev() {
        state.ordering.remove_row(rank);
        state.vertical.remove_rank(rank);
    }
    for rank in state.ranks.iter_mut().filter(|r| **r > 0) {
        *rank -= empty.iter().filter(|&&gone| gone < *rank).count();
    }
    state.max_rank -= empty.len();
    Ok(empty.len())
}
