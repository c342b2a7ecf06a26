use std::collections::{BTreeMap, BTreeSet};

use crate::ir::{Graph, VertexId};

/// Generational ancestry of every person and the relationships whose partners
/// are blood relatives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorSets {
    /// person -> (ancestor -> generations up); every person lists itself at 0.
    pub ancestors: BTreeMap<VertexId, BTreeMap<VertexId, u32>>,
    pub consanguinity: BTreeSet<VertexId>,
}

impl AncestorSets {
    pub fn of(&self, person: VertexId) -> Option<&BTreeMap<VertexId, u32>> {
        self.ancestors.get(&person)
    }

    pub fn is_consanguineous(&self, relationship: VertexId) -> bool {
        self.consanguinity.contains(&relationship)
    }
}

/// Single pass over persons from the top rank down: each person inherits the
/// merged ancestor maps of its parents, one generation further away.
///
/// A key present in both parents' maps marks their relationship as
/// consanguineous. Distances keep the shorter path.
pub fn compute_ancestors(graph: &Graph, ranks: &[usize]) -> AncestorSets {
    let mut persons: Vec<VertexId> = (0..graph.num_real()).filter(|&v| graph.is_person(v)).collect();
    persons.sort_by_key(|&v| ranks[v]);

    let mut sets = AncestorSets::default();
    for person in persons {
        let mut merged: BTreeMap<VertexId, u32> = BTreeMap::from([(person, 0)]);
        if let Some(rel) = parent_relationship(graph, person) {
            let parents = graph.relationship_parents(rel);
            let mut first_side: Option<BTreeSet<VertexId>> = None;
            for parent in parents {
                let Some(inherited) = sets.ancestors.get(&parent) else {
                    continue;
                };
                if let Some(seen) = &first_side {
                    if inherited.keys().any(|a| seen.contains(a)) {
                        sets.consanguinity.insert(rel);
                    }
                } else {
                    first_side = Some(inherited.keys().copied().collect());
                }
                for (&ancestor, &distance) in inherited {
                    merged
                        .entry(ancestor)
                        .and_modify(|d| *d = (*d).min(distance + 1))
                        .or_insert(distance + 1);
                }
            }
        }
        sets.ancestors.insert(person, merged);
    }
    sets
}

/// person <- child hub <- relationship, looking through virtual chains.
fn parent_relationship(graph: &Graph, person: VertexId) -> Option<VertexId> {
    let &[above] = graph.in_edges(person) else {
        return None;
    };
    let hub = graph.real_source(above);
    if !graph.is_child_hub(hub) {
        return None;
    }
    let rel = graph.in_edges(hub).first().map(|&r| graph.real_source(r))?;
    graph.is_relationship(rel).then_some(rel)
}
