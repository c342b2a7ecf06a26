use crate::config::LayoutConfig;
use crate::ir::{Graph, VertexKind};

use super::error::{LayoutResult, StructuralError};
use super::ranking::Ranking;

/// Rewrites a ranked graph so every edge spans exactly one rank.
///
/// Real vertices keep their ids; one virtual vertex per intermediate rank is
/// appended for each longer edge, every hop carrying the original weight.
pub fn split_long_edges(
    graph: &Graph,
    ranking: &Ranking,
    config: &LayoutConfig,
) -> LayoutResult<(Graph, Ranking)> {
    let ranks = &ranking.ranks;
    let mut working = Graph::new();
    for vertex in graph.vertices() {
        working.add_vertex(&vertex.name, vertex.kind, vertex.width)?;
    }
    let mut split_ranks = ranks.clone();

    for (from, to) in graph.edges() {
        let weight = graph.weight(from, to);
        let (from_rank, to_rank) = (ranks[from], ranks[to]);
        if to_rank <= from_rank {
            return Err(StructuralError::EdgeSpan {
                from,
                to,
                from_rank,
                to_rank,
            }
            .into());
        }
        if to_rank == from_rank + 1 {
            working.add_edge(from, to, weight)?;
            continue;
        }

        let mut prev = from;
        for rank in from_rank + 1..to_rank {
            let name = working.fresh_name(&format!("~{}>{}@{}", graph.name(from), graph.name(to), rank));
            let virt = working.add_vertex(&name, VertexKind::VirtualEdge, config.virtual_width)?;
            split_ranks.push(rank);
            working.add_edge(prev, virt, weight)?;
            prev = virt;
        }
        working.add_edge(prev, to, weight)?;
    }

    working.validate()?;
    Ok((
        working,
        Ranking {
            ranks: split_ranks,
            max_rank: ranking.max_rank,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NodeDescriptor, build_graph};
    use crate::layout::ranking::rank_vertices;

    #[test]
    fn long_edges_become_unit_hops() {
        // The uncle partners with his niece one generation down.
        let descriptors = vec![
            NodeDescriptor::person("dad", "m").edge_to("r"),
            NodeDescriptor::person("mum", "f").edge_to("r"),
            NodeDescriptor::person("kid", "u").edge_to("r2"),
            NodeDescriptor::person("uncle", "m").edge_to("r3"),
            NodeDescriptor::person("spouse", "f").edge_to("r2"),
            NodeDescriptor::person("grandkid", "f").edge_to("r3"),
            NodeDescriptor::person("great", "u"),
            NodeDescriptor::relationship("r").edge_to("kid").edge_to("uncle"),
            NodeDescriptor::relationship("r2").edge_to("grandkid"),
            NodeDescriptor::relationship("r3").edge_to("great"),
        ];
        let config = LayoutConfig::default();
        let graph = build_graph(&descriptors, &config).unwrap();
        let ranking = rank_vertices(&graph).unwrap();
        let (working, split) = split_long_edges(&graph, &ranking, &config).unwrap();

        let uncle = graph.id_of("uncle").unwrap();
        let r3 = graph.id_of("r3").unwrap();
        assert_eq!(ranking.ranks[r3] - ranking.ranks[uncle], 4);
        assert_eq!(working.len(), graph.len() + 3);
        for (from, to) in working.edges() {
            assert_eq!(split.ranks[to], split.ranks[from] + 1);
        }
        for v in working.num_real()..working.len() {
            assert_eq!(working.kind(v), VertexKind::VirtualEdge);
        }
        let base = working.base_graph().unwrap();
        assert_eq!(base.edges().count(), graph.edges().count());
    }
}
