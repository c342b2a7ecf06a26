use crate::config::LayoutConfig;
use crate::ir::VertexKind;
use crate::layout::LayoutState;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub max_rank: usize,
    pub crossings: f64,
    pub rank_vertical_levels: Vec<u32>,
    pub rank_offsets: Vec<f64>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub consanguinity: Vec<String>,
    pub ancestors: BTreeMap<String, BTreeMap<String, u32>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    pub rank: usize,
    pub order: usize,
    pub x: f64,
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_level: Option<u32>,
}

/// A base-graph edge with the `[x, rank]` waypoints of its virtual chain.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub weight: u32,
    pub consanguineous: bool,
    pub points: Vec<[f64; 2]>,
}

impl LayoutDump {
    /// Real vertices come from [`LayoutState::to_layout`]; edges are the base
    /// graph's, routed through their virtual chains.
    pub fn from_state(state: &LayoutState, config: &LayoutConfig) -> Self {
        let graph = &state.graph;
        let name = |v| graph.name(v).to_string();
        let layout = state.to_layout(config);

        let nodes = layout
            .nodes
            .iter()
            .filter(|placement| graph.is_real(placement.id))
            .map(|placement| {
                let sex = match placement.kind {
                    VertexKind::Person { sex } => Some(sex.as_token().to_string()),
                    _ => None,
                };
                NodeDump {
                    id: placement.name.clone(),
                    kind: placement.kind.label().to_string(),
                    sex,
                    rank: placement.rank,
                    order: placement.order,
                    x: placement.x,
                    width: placement.width,
                    vertical_level: placement.vertical_level,
                }
            })
            .collect();

        let mut edges = Vec::new();
        for from in 0..graph.num_real() {
            for &first in graph.out_edges(from) {
                let mut points = vec![[state.positions[from], state.ranks[from] as f64]];
                let mut cur = first;
                while graph.is_virtual(cur) {
                    points.push([state.positions[cur], state.ranks[cur] as f64]);
                    match graph.out_edges(cur).first() {
                        Some(&next) => cur = next,
                        None => break,
                    }
                }
                points.push([state.positions[cur], state.ranks[cur] as f64]);
                let consanguineous = state.ancestors.is_consanguineous(cur)
                    || state.ancestors.is_consanguineous(from);
                edges.push(EdgeDump {
                    from: name(from),
                    to: name(cur),
                    weight: graph.weight(from, first),
                    consanguineous,
                    points,
                });
            }
        }

        let ancestors = layout
            .ancestors
            .iter()
            .map(|(&person, map)| {
                let named = map.iter().map(|(&a, &d)| (name(a), d)).collect();
                (name(person), named)
            })
            .collect();

        LayoutDump {
            max_rank: layout.max_rank,
            crossings: layout.crossings,
            rank_vertical_levels: layout.rank_vertical_levels,
            rank_offsets: layout.rank_offsets,
            nodes,
            edges,
            consanguinity: layout.consanguinity.iter().map(|&r| name(r)).collect(),
            ancestors,
        }
    }
}

pub fn write_layout_dump(path: &Path, state: &LayoutState, config: &LayoutConfig) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_state(state, config);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

pub fn print_layout_dump(state: &LayoutState, config: &LayoutConfig) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    serde_json::to_writer_pretty(&mut writer, &LayoutDump::from_state(state, config))?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::input::{NodeDescriptor, build_graph};
    use crate::layout::compute_layout;

    #[test]
    fn dump_lists_real_nodes_and_base_edges() {
        let config = LayoutConfig::default();
        let descriptors = vec![
            NodeDescriptor::person("dad", "m").edge_to("r"),
            NodeDescriptor::person("mum", "f").edge_to("r"),
            NodeDescriptor::person("kid", "u"),
            NodeDescriptor::relationship("r").edge_to("kid"),
        ];
        let graph = build_graph(&descriptors, &config).unwrap();
        let state = compute_layout(&graph, &config).unwrap();
        let dump = LayoutDump::from_state(&state, &config);

        assert_eq!(dump.nodes.len(), 5);
        assert_eq!(dump.edges.len(), 4);
        assert!(dump.consanguinity.is_empty());
        let hub = dump.nodes.iter().find(|n| n.id == "r_hub").unwrap();
        assert_eq!(hub.kind, "child hub");
        assert_eq!(hub.vertical_level, Some(1));
        assert_eq!(dump.ancestors["kid"]["dad"], 1);

        let value = serde_json::to_value(&dump).unwrap();
        assert_eq!(value["maxRank"], 3);
        assert_eq!(dump.rank_offsets.len(), 4);
        assert_eq!(dump.rank_offsets[3], 10.0);
        assert!(value["nodes"][0].get("verticalLevel").is_none());
    }
}
