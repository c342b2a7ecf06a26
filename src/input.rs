use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::ir::{Graph, Sex, VertexId, VertexKind};
use crate::layout::error::LayoutResult;

/// One node as handed over by the graph-construction collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub name: String,
    #[serde(default, alias = "rel")]
    pub relationship: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default)]
    pub outedges: Vec<OutEdge>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutEdge {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl NodeDescriptor {
    pub fn person(name: &str, sex: &str) -> Self {
        Self {
            name: name.to_string(),
            sex: Some(sex.to_string()),
            ..Default::default()
        }
    }

    pub fn relationship(name: &str) -> Self {
        Self {
            name: name.to_string(),
            relationship: true,
            ..Default::default()
        }
    }

    pub fn edge_to(mut self, to: &str) -> Self {
        self.outedges.push(OutEdge {
            to: to.to_string(),
            weight: None,
        });
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptorDocument {
    List(Vec<NodeDescriptor>),
    Wrapped { nodes: Vec<NodeDescriptor> },
}

/// Accepts a bare JSON array of descriptors or `{ "nodes": [...] }`.
pub fn parse_descriptors(input: &str) -> serde_json::Result<Vec<NodeDescriptor>> {
    let document: DescriptorDocument = serde_json::from_str(input)?;
    Ok(match document {
        DescriptorDocument::List(nodes) | DescriptorDocument::Wrapped { nodes } => nodes,
    })
}

/// Builds and validates the pedigree graph.
///
/// Persons get the lowest ids (in input order), then relationships, then one
/// synthesized child hub per relationship. A relationship's declared
/// outgoing edges are rewired to leave from its child hub, and the
/// relationship -> hub edge carries the heaviest of those weights.
pub fn build_graph(descriptors: &[NodeDescriptor], config: &LayoutConfig) -> LayoutResult<Graph> {
    let mut graph = Graph::new();

    for node in descriptors.iter().filter(|node| !node.relationship) {
        let sex = node.sex.as_deref().map(Sex::from_token).unwrap_or_default();
        graph.add_vertex(
            &node.name,
            VertexKind::Person { sex },
            node.width.unwrap_or(config.person_width),
        )?;
    }

    let mut relationships: Vec<(VertexId, &NodeDescriptor)> = Vec::new();
    for node in descriptors.iter().filter(|node| node.relationship) {
        let id = graph.add_vertex(
            &node.name,
            VertexKind::Relationship,
            node.width.unwrap_or(config.relationship_width),
        )?;
        relationships.push((id, node));
    }

    let mut hubs = Vec::with_capacity(relationships.len());
    for (_, node) in &relationships {
        let name = graph.fresh_name(&format!("{}_hub", node.name));
        hubs.push(graph.add_vertex(&name, VertexKind::ChildHub, config.child_hub_width)?);
    }

    for node in descriptors.iter().filter(|node| !node.relationship) {
        let from = graph.id_of(&node.name)?;
        for edge in &node.outedges {
            let to = graph.id_of(&edge.to)?;
            graph.add_edge(from, to, edge.weight.unwrap_or(1))?;
        }
    }

    for ((rel, node), &hub) in relationships.iter().zip(&hubs) {
        let mut hub_weight = 1;
        for edge in &node.outedges {
            let to = graph.id_of(&edge.to)?;
            let weight = edge.weight.unwrap_or(1);
            hub_weight = hub_weight.max(weight);
            graph.add_edge(hub, to, weight)?;
        }
        graph.add_edge(*rel, hub, hub_weight)?;
    }

    graph.validate()?;
    Ok(graph)
}
