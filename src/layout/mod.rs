mod ancestors;
mod crossings;
pub mod error;
mod long_edges;
mod order;
pub mod ordering;
mod ranking;
mod rerank;
mod split;
pub(crate) mod types;
mod vertical;
mod xcoord;

pub use ancestors::{AncestorSets, compute_ancestors};
pub use error::{
    ConfigError, LayoutError, LayoutResult, LookupError, PreconditionError, StructuralError,
};
pub use order::{OrderStats, Traversal};
pub use ordering::Ordering;
pub use ranking::{Ranking, compress_ranks, init_ranks_by_in_edge_scanning, rank_vertices};
pub use rerank::collapse_empty_ranks;
pub use split::split_long_edges;
pub use types::*;
pub use vertical::{VerticalLevels, compute_vertical_levels};
pub use xcoord::{XScore, assign_positions, min_gap, score_positions};

pub(crate) use crossings::RankedGraph;

use crate::config::LayoutConfig;
use crate::ir::Graph;
use long_edges::straighten_long_edges;
use order::order_vertices;
use rerank::rerank_relationships;
use tracing::{debug, info};

/// Runs the whole pipeline on a validated pedigree graph.
///
/// rank -> split long edges -> order -> ancestors -> re-rank relationships ->
/// straighten -> x-coordinates -> vertical levels.
pub fn compute_layout(graph: &Graph, config: &LayoutConfig) -> LayoutResult<LayoutState> {
    config.validate()?;
    graph.validate()?;
    let _span = tracing::debug_span!("compute_layout", vertices = graph.len()).entered();

    let ranking = rank_vertices(graph)?;
    debug!(max_rank = ranking.max_rank, "ranks assigned");

    let (working, ranking) = split_long_edges(graph, &ranking, config)?;
    debug!(
        virtual_vertices = working.len() - working.num_real(),
        "long edges split"
    );

    let view = RankedGraph::new(&working, &ranking.ranks, ranking.max_rank);
    let (ordering, stats) = order_vertices(view, &config.ordering);
    debug!(
        seeds = stats.seeds_tried,
        seed_crossings = stats.seed_crossings,
        iterations = stats.iterations,
        long_edge_moves = stats.long_edge_moves,
        crossings = stats.crossings,
        "vertices ordered"
    );

    let ancestors = compute_ancestors(&working, &ranking.ranks);
    debug!(
        consanguineous = ancestors.consanguinity.len(),
        "ancestors analysed"
    );

    let positions = vec![0.0; working.len()];
    let mut state = LayoutState {
        graph: working,
        ranks: ranking.ranks,
        max_rank: ranking.max_rank,
        ordering,
        positions,
        vertical: VerticalLevels::default(),
        ancestors,
    };

    let collapsed = rerank_relationships(&mut state)?;
    let view = RankedGraph::new(&state.graph, &state.ranks, state.max_rank);
    let moves = straighten_long_edges(view, &mut state.ordering, &config.ordering);
    state.graph.validate()?;
    debug!(collapsed, long_edge_moves = moves, max_rank = state.max_rank, "relationships re-ranked");

    reposition(&mut state, config);
    info!(
        vertices = state.graph.num_real(),
        ranks = state.max_rank,
        crossings = state.crossings(),
        "layout computed"
    );
    Ok(state)
}

/// Recomputes x-coordinates and vertical levels, leaving ranks and order alone.
pub fn reposition(state: &mut LayoutState, config: &LayoutConfig) {
    state.positions = assign_positions(state, config);
    state.vertical = compute_vertical_levels(state);
    debug!(
        max_level = state.vertical.rank_max.iter().copied().max().unwrap_or(0),
        "positions assigned"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NodeDescriptor, build_graph};

    #[test]
    fn trio_layout_has_three_ranks_and_no_crossings() {
        let config = LayoutConfig::default();
        let descriptors = vec![
            NodeDescriptor::person("dad", "m").edge_to("r"),
            NodeDescriptor::person("mum", "f").edge_to("r"),
            NodeDescriptor::person("kid", "u"),
            NodeDescriptor::relationship("r").edge_to("kid"),
        ];
        let graph = build_graph(&descriptors, &config).unwrap();
        let state = compute_layout(&graph, &config).unwrap();
        assert_eq!(state.max_rank, 3);
        assert_eq!(state.crossings(), 0.0);
        let hub = state.graph.id_of("r_hub").unwrap();
        assert_eq!(state.vertical.level(hub), 1);
        assert_eq!(state.vertical.rank_max[2], 1);
    }

    #[test]
    fn invalid_config_fails_before_layout() {
        let mut config = LayoutConfig::default();
        config.ordering.seed_buckets = 0;
        let graph = Graph::new();
        assert!(matches!(
            compute_layout(&graph, &config),
            Err(LayoutError::Config(ConfigError::NoSeedBuckets))
        ));
    }
}
