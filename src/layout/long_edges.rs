use crate::config::OrderingConfig;
use crate::ir::{Graph, VertexId};

use super::crossings::RankedGraph;
use super::ordering::Ordering;

/// Maximal runs of virtual vertices, top to bottom. Detached vertices are
/// skipped.
pub(crate) fn long_edge_chains(graph: &Graph) -> Vec<Vec<VertexId>> {
    let mut chains = Vec::new();
    for v in graph.num_real()..graph.len() {
        let &[parent] = graph.in_edges(v) else {
            continue;
        };
        if graph.is_virtual(parent) {
            continue;
        }
        let mut chain = vec![v];
        let mut cur = v;
        while let &[next] = graph.out_edges(cur) {
            if !graph.is_virtual(next) {
                break;
            }
            chain.push(next);
            cur = next;
        }
        chains.push(chain);
    }
    chains
}

/// Consecutive chain vertices sharing the same position index.
fn collinear_pieces(ordering: &Ordering, chain: &[VertexId]) -> Vec<Vec<VertexId>> {
    let mut pieces: Vec<Vec<VertexId>> = Vec::new();
    for &v in chain {
        match pieces.last_mut() {
            Some(piece) if ordering.position(piece[0]) == ordering.position(v) => piece.push(v),
            _ => pieces.push(vec![v]),
        }
    }
    pieces
}

/// Shifts pieces of long virtual chains sideways when that strictly reduces
/// crossings. Returns the number of accepted moves.
pub fn straighten_long_edges(
    view: RankedGraph<'_>,
    ordering: &mut Ordering,
    config: &OrderingConfig,
) -> usize {
    let mut moves = 0;
    for chain in long_edge_chains(view.graph) {
        if chain.len() > config.long_edge_max_chain {
            continue;
        }
        let pieces = collinear_pieces(ordering, &chain);
        let width = config.long_edge_pieces.clamp(1, pieces.len());
        for start in 0..=pieces.len() - width {
            if shift_pieces(view, ordering, &pieces[start..start + width], config.long_edge_window) {
                moves += 1;
            }
        }
    }
    moves
}

/// Tries every offset combination in `-window..=window` for each piece and
/// applies the one with the fewest crossings, if it beats the current order.
fn shift_pieces(
    view: RankedGraph<'_>,
    ordering: &mut Ordering,
    pieces: &[Vec<VertexId>],
    window: i64,
) -> bool {
    let (Some(first), Some(last)) = (pieces.first(), pieces.last()) else {
        return false;
    };
    let lo = view.ranks[first[0]];
    let hi = view.ranks[last[last.len() - 1]];
    let current = view.range_crossings(ordering, lo, hi);

    let apply = |target: &mut Ordering, offsets: &[i64]| {
        for (piece, &offset) in pieces.iter().zip(offsets) {
            for &v in piece {
                target.move_by(view.ranks[v], v, offset);
            }
        }
    };

    let mut best: Option<(f64, Vec<i64>)> = None;
    let mut offsets = vec![-window; pieces.len()];
    'combinations: loop {
        if offsets.iter().any(|&o| o != 0) {
            let mut trial = ordering.clone();
            apply(&mut trial, &offsets);
            let crossings = view.range_crossings(&trial, lo, hi);
            let bound = best.as_ref().map_or(current, |(c, _)| *c);
            if crossings < bound {
                best = Some((crossings, offsets.clone()));
            }
        }

        let mut idx = 0;
        loop {
            if idx == offsets.len() {
                break 'combinations;
            }
            offsets[idx] += 1;
            if offsets[idx] > window {
                offsets[idx] = -window;
                idx += 1;
            } else {
                break;
            }
        }
    }

    match best {
        Some((_, offsets)) => {
            apply(ordering, &offsets);
            true
        }
        None => false,
    }
}
