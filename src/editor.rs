use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::ir::{Graph, Sex, VertexId, VertexKind};
use crate::layout::{
    self, LayoutResult, LayoutState, PedigreeLayout, PreconditionError, compute_ancestors,
    compute_layout, compute_vertical_levels, min_gap,
};
use crate::snapshot::Snapshot;

const EPS: f64 = 1e-6;

/// Vertices created by an edit and pre-existing vertices whose rank, vertical
/// offset or x changed. Ids are in the post-edit numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    pub new: Vec<VertexId>,
    pub moved: Vec<VertexId>,
}

/// Owns a finished layout and patches it in place for single-vertex edits.
///
/// Every edit runs on a copy of the state: if a precondition or the final
/// validation fails, the editor keeps the layout it had before.
#[derive(Debug, Clone)]
pub struct PedigreeEditor {
    state: LayoutState,
    config: LayoutConfig,
}

impl PedigreeEditor {
    pub fn new(graph: &Graph, config: LayoutConfig) -> LayoutResult<Self> {
        let state = compute_layout(graph, &config)?;
        Ok(Self { state, config })
    }

    pub fn from_state(state: LayoutState, config: LayoutConfig) -> Self {
        Self { state, config }
    }

    pub fn from_snapshot(snapshot: Snapshot, config: LayoutConfig) -> LayoutResult<Self> {
        Ok(Self::from_state(snapshot.restore()?, config))
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn layout(&self) -> PedigreeLayout {
        self.state.to_layout(&self.config)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    pub fn id_of(&self, name: &str) -> LayoutResult<VertexId> {
        self.state.graph.id_of(name)
    }

    /// Adds a child below a child hub (or below the hub of a relationship).
    pub fn add_child(&mut self, target: VertexId) -> LayoutResult<EditOutcome> {
        self.apply_edit(|state, config| {
            state.graph.check(target)?;
            let hub = match state.graph.kind(target) {
                VertexKind::ChildHub => target,
                VertexKind::Relationship => state
                    .graph
                    .child_hub_of(target)
                    .ok_or(PreconditionError::NoChildHub(target))?,
                other => {
                    return Err(PreconditionError::WrongKind {
                        vertex: target,
                        expected: "child hub or relationship",
                        found: other.label(),
                    }
                    .into());
                }
            };

            let rank = state.ranks[hub] + 1;
            state.ensure_rank(rank);
            let rightmost = state
                .graph
                .out_edges(hub)
                .iter()
                .copied()
                .filter(|&c| state.ranks[c] == rank)
                .max_by(|&a, &b| state.positions[a].total_cmp(&state.positions[b]));
            let desired = match rightmost {
                Some(c) => {
                    state.positions[c]
                        + state.graph.half_width(c)
                        + config.person_separation
                        + (config.person_width / 2.0).floor()
                }
                None => state.positions[hub],
            };

            let index = best_insert_index(state, rank, &[hub], desired);
            let name = state.graph.fresh_name(&format!("{}_child", state.graph.name(hub)));
            let child = state.insert_real_vertex(&name, person(Sex::Unknown), config.person_width, rank)?;
            state.ordering.insert(rank, index, child);
            state.graph.add_edge(hub, child, 1)?;
            place_vertex(state, config, child, desired);
            Ok(vec![child])
        })
    }

    /// Gives a parentless person a father, a mother, their relationship and
    /// its child hub. Opens two ranks at the top when the person has no room
    /// above it.
    pub fn add_parents(&mut self, target: VertexId) -> LayoutResult<EditOutcome> {
        self.apply_edit(|state, config| {
            state.graph.check(target)?;
            expect_person(&state.graph, target)?;
            if !state.graph.in_edges(target).is_empty() {
                return Err(PreconditionError::AlreadyHasParents(target).into());
            }

            if state.ranks[target] < 3 {
                state.shift_ranks_down(3 - state.ranks[target]);
            }
            let rank = state.ranks[target];
            let (hub_rank, parent_rank) = (rank - 1, rank - 2);
            let base = state.graph.name(target).to_string();

            let hub_index = best_insert_index(state, hub_rank, &[target], state.positions[target]);
            let hub = insert_at(state, config, &format!("{base}_parents_hub"), VertexKind::ChildHub, hub_rank, hub_index)?;
            state.graph.add_edge(hub, target, 1)?;
            let target_x = state.positions[target];
            place_vertex(state, config, hub, target_x);

            let center = state.positions[hub];
            let group_index = best_insert_index(state, parent_rank, &[hub], center);
            let father = insert_at(state, config, &format!("{base}_father"), person(Sex::Male), parent_rank, group_index)?;
            let father_x = center
                - (state.graph.half_width(father)
                    + config.relationship_separation
                    + (config.relationship_width / 2.0).floor());
            place_vertex(state, config, father, father_x);

            let rel_index = state.ordering.position(father) + 1;
            let rel = insert_at(state, config, &format!("{base}_parents"), VertexKind::Relationship, parent_rank, rel_index)?;
            place_vertex(state, config, rel, center);

            let mother_index = state.ordering.position(rel) + 1;
            let mother = insert_at(state, config, &format!("{base}_mother"), person(Sex::Female), parent_rank, mother_index)?;
            let mother_x = state.positions[rel] + min_gap(&state.graph, config, rel, mother);
            place_vertex(state, config, mother, mother_x);

            state.graph.add_edge(father, rel, 1)?;
            state.graph.add_edge(mother, rel, 1)?;
            state.graph.add_edge(rel, hub, 1)?;
            let rel_x = state.positions[rel];
            nudge_right(state, config, hub, rel_x);
            Ok(vec![hub, father, rel, mother])
        })
    }

    /// Adds a partner next to a person together with their relationship, its
    /// child hub and a placeholder child.
    pub fn add_relationship(&mut self, target: VertexId) -> LayoutResult<EditOutcome> {
        self.apply_edit(|state, config| {
            state.graph.check(target)?;
            let sex = expect_person(&state.graph, target)?;
            let rank = state.ranks[target];
            let pos = state.ordering.position(target);
            let base = state.graph.name(target).to_string();

            let (mut left, mut right) = (0usize, 0usize);
            for &u in state.ordering.rank(rank) {
                if is_relationship_of(&state.graph, u, target) {
                    if state.ordering.position(u) < pos {
                        left += 1;
                    } else {
                        right += 1;
                    }
                }
            }
            let partner_kind = person(opposite(sex));

            let (rel, partner) = if left < right {
                let mut j = pos;
                while j > 0
                    && state
                        .ordering
                        .at(rank, j - 1)
                        .is_some_and(|u| is_relationship_of(&state.graph, u, target))
                {
                    j -= 1;
                }
                let partner = insert_at(state, config, &format!("{base}_partner"), partner_kind, rank, j)?;
                let rel = insert_at(state, config, &format!("{base}_relationship"), VertexKind::Relationship, rank, j + 1)?;
                let rel_x = state.positions[target] - min_gap(&state.graph, config, rel, target);
                place_vertex(state, config, partner, rel_x - min_gap(&state.graph, config, partner, rel));
                place_vertex(state, config, rel, rel_x);
                (rel, partner)
            } else {
                let mut i = pos + 1;
                while state
                    .ordering
                    .at(rank, i)
                    .is_some_and(|u| is_relationship_of(&state.graph, u, target))
                {
                    i += 1;
                }
                let rel = insert_at(state, config, &format!("{base}_relationship"), VertexKind::Relationship, rank, i)?;
                let rel_x = state.positions[target] + min_gap(&state.graph, config, target, rel);
                place_vertex(state, config, rel, rel_x);
                let partner = insert_at(state, config, &format!("{base}_partner"), partner_kind, rank, i + 1)?;
                let partner_x = state.positions[rel] + min_gap(&state.graph, config, rel, partner);
                place_vertex(state, config, partner, partner_x);
                (rel, partner)
            };
            state.graph.add_edge(target, rel, 1)?;
            state.graph.add_edge(partner, rel, 1)?;

            let hub_rank = rank + 1;
            state.ensure_rank(hub_rank);
            let rel_x = state.positions[rel];
            let hub_index = best_insert_index(state, hub_rank, &[rel], rel_x);
            let hub = insert_at(state, config, &format!("{base}_relationship_hub"), VertexKind::ChildHub, hub_rank, hub_index)?;
            state.graph.add_edge(rel, hub, 1)?;
            place_vertex(state, config, hub, rel_x);

            let child_rank = rank + 2;
            state.ensure_rank(child_rank);
            let hub_x = state.positions[hub];
            let child_index = best_insert_index(state, child_rank, &[hub], hub_x);
            let child = insert_at(state, config, &format!("{base}_child"), person(Sex::Unknown), child_rank, child_index)?;
            state.graph.add_edge(hub, child, 1)?;
            place_vertex(state, config, child, hub_x);

            Ok(vec![rel, partner, hub, child])
        })
    }

    /// Full x-coordinate recompute on the current ranks and order.
    pub fn reposition(&mut self) -> Vec<VertexId> {
        let before = self.state.clone();
        layout::reposition(&mut self.state, &self.config);
        moved_vertices(&before, &self.state)
    }

    /// Full pipeline recompute from the base graph.
    pub fn redraw(&mut self) -> LayoutResult<()> {
        let base = self.state.graph.base_graph()?;
        self.state = compute_layout(&base, &self.config)?;
        Ok(())
    }

    fn apply_edit<F>(&mut self, edit: F) -> LayoutResult<EditOutcome>
    where
        F: FnOnce(&mut LayoutState, &LayoutConfig) -> LayoutResult<Vec<VertexId>>,
    {
        let mut working = self.state.clone();
        let created = edit(&mut working, &self.config)?;
        working.graph.validate()?;
        working.ancestors = compute_ancestors(&working.graph, &working.ranks);
        working.vertical = compute_vertical_levels(&working);

        let moved = moved_vertices(&self.state, &working);
        debug!(new = created.len(), moved = moved.len(), "edit applied");
        self.state = working;
        Ok(EditOutcome { new: created, moved })
    }
}

fn person(sex: Sex) -> VertexKind {
    VertexKind::Person { sex }
}

fn opposite(sex: Sex) -> Sex {
    match sex {
        Sex::Male => Sex::Female,
        Sex::Female => Sex::Male,
        Sex::Unknown => Sex::Unknown,
    }
}

fn expect_person(graph: &Graph, v: VertexId) -> LayoutResult<Sex> {
    match graph.kind(v) {
        VertexKind::Person { sex } => Ok(sex),
        other => Err(PreconditionError::WrongKind {
            vertex: v,
            expected: "person",
            found: other.label(),
        }
        .into()),
    }
}

fn is_relationship_of(graph: &Graph, v: VertexId, parent: VertexId) -> bool {
    graph.is_relationship(v) && graph.in_edges(v).contains(&parent)
}

fn insert_at(
    state: &mut LayoutState,
    config: &LayoutConfig,
    name: &str,
    kind: VertexKind,
    rank: usize,
    index: usize,
) -> LayoutResult<VertexId> {
    let width = match kind {
        VertexKind::Person { .. } => config.person_width,
        VertexKind::Relationship => config.relationship_width,
        VertexKind::ChildHub => config.child_hub_width,
        VertexKind::VirtualEdge => config.virtual_width,
    };
    let name = state.graph.fresh_name(name);
    let v = state.insert_real_vertex(&name, kind, width, rank)?;
    state.ordering.insert(rank, index, v);
    Ok(v)
}

/// Crossings a new vertex at `index` on `rank` would add through edges to
/// `links`; same-rank links cost the number of vertices in between.
fn crossing_estimate(state: &LayoutState, rank: usize, index: usize, links: &[VertexId]) -> usize {
    let mut cost = 0;
    for &u in links {
        let (ru, pu) = (state.ranks[u], state.ordering.position(u));
        if ru == rank {
            cost += if index <= pu { pu - index } else { index - pu - 1 };
            continue;
        }
        let upper = ru + 1 == rank;
        for &a in state.ordering.rank(rank) {
            let pa = state.ordering.position(a);
            let others = if upper {
                state.graph.in_edges(a)
            } else {
                state.graph.out_edges(a)
            };
            for &b in others {
                if b == u || state.ranks[b] != ru {
                    continue;
                }
                let pb = state.ordering.position(b);
                if (pa < index && pb > pu) || (pa >= index && pb < pu) {
                    cost += 1;
                }
            }
        }
    }
    cost
}

/// Order position on `rank` with the fewest estimated crossings, closest to
/// where `preferred_x` falls among the existing vertices.
fn best_insert_index(state: &LayoutState, rank: usize, links: &[VertexId], preferred_x: f64) -> usize {
    let row = state.ordering.rank(rank);
    let preferred = row
        .iter()
        .filter(|&&v| state.positions[v] < preferred_x)
        .count();
    (0..=row.len())
        .min_by_key(|&index| (crossing_estimate(state, rank, index, links), index.abs_diff(preferred)))
        .unwrap_or(preferred)
}

/// Puts a vertex already in the ordering as close to `desired` as its left
/// neighbour allows, then pushes right neighbours out of the way.
fn place_vertex(state: &mut LayoutState, config: &LayoutConfig, v: VertexId, desired: f64) {
    let rank = state.ranks[v];
    let lo = match state.ordering.left_of(rank, v) {
        Some(u) => state.positions[u] + min_gap(&state.graph, config, u, v),
        None => f64::NEG_INFINITY,
    };
    state.positions[v] = desired.max(lo);
    domino(state, config, VecDeque::from([(v, 0.0)]));
}

fn nudge_right(state: &mut LayoutState, config: &LayoutConfig, v: VertexId, x: f64) {
    let mut queue = VecDeque::new();
    move_right(state, v, x, &mut queue);
    domino(state, config, queue);
}

fn move_right(state: &mut LayoutState, v: VertexId, x: f64, queue: &mut VecDeque<(VertexId, f64)>) {
    let delta = x - state.positions[v];
    if delta > EPS {
        state.positions[v] = x;
        queue.push_back((v, delta));
    }
}

/// Breadth-first push propagation. A vertex moved right by `delta` pushes its
/// right neighbour past the minimum gap, drags its child hub along if it is a
/// relationship, and shifts out-targets on other ranks by the same amount. Bounded by `domino_iteration_cap`.
fn domino(state: &mut LayoutState, config: &LayoutConfig, mut queue: VecDeque<(VertexId, f64)>) {
    let mut steps = 0usize;
    while let Some((u, delta)) = queue.pop_front() {
        steps += 1;
        if steps > config.domino_iteration_cap {
            warn!(cap = config.domino_iteration_cap, "position propagation stopped at the iteration cap");
            break;
        }
        let rank = state.ranks[u];
        if let Some(w) = state.ordering.right_of(rank, u) {
            let need = state.positions[u] + min_gap(&state.graph, config, u, w);
            move_right(state, w, need, &mut queue);
        }
        if delta <= 0.0 {
            continue;
        }
        let hub = if state.graph.is_relationship(u) {
            state.graph.child_hub_of(u)
        } else {
            None
        };
        if let Some(hub) = hub {
            let x = state.positions[u];
            move_right(state, hub, x, &mut queue);
        }
        let targets: Vec<VertexId> = state.graph.out_edges(u).to_vec();
        for t in targets {
            if Some(t) == hub {
                continue;
            }
            if state.ranks[t] == rank {
                queue.push_back((t, 0.0));
            } else {
                let x = state.positions[t] + delta;
                move_right(state, t, x, &mut queue);
            }
        }
    }
}

/// Pre-existing real vertices whose rank, vertical offset or x differ between
/// two states. Real ids survive edits unchanged.
fn moved_vertices(before: &LayoutState, after: &LayoutState) -> Vec<VertexId> {
    (0..before.graph.num_real())
        .filter(|&v| {
            before.ranks[v] != after.ranks[v]
                || (before.positions[v] - after.positions[v]).abs() > EPS
                || before.vertical.level(v) != after.vertical.level(v)
                || before.vertical.rank_offset(before.ranks[v])
                    != after.vertical.rank_offset(after.ranks[v])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NodeDescriptor, build_graph};
    use crate::layout::LayoutError;

    fn trio_editor() -> PedigreeEditor {
        let config = LayoutConfig::default();
        let descriptors = vec![
            NodeDescriptor::person("dad", "m").edge_to("r"),
            NodeDescriptor::person("mum", "f").edge_to("r"),
            NodeDescriptor::person("kid", "u"),
            NodeDescriptor::relationship("r").edge_to("kid"),
        ];
        let graph = build_graph(&descriptors, &config).unwrap();
        PedigreeEditor::new(&graph, config).unwrap()
    }

    fn assert_sound(editor: &PedigreeEditor) {
        let state = editor.state();
        state.graph.validate().unwrap();
        assert!(state.ordering.is_consistent());
        for (from, to) in state.graph.edges() {
            let (rf, rt) = (state.ranks[from], state.ranks[to]);
            if state.graph.is_relationship(to) {
                assert!(rt == rf || rt == rf + 1);
            } else {
                assert_eq!(rt, rf + 1, "{from} -> {to}");
            }
        }
        for rank in 1..=state.max_rank {
            for pair in state.ordering.rank(rank).windows(2) {
                let (u, v) = (pair[0], pair[1]);
                let gap = state.positions[v] - state.positions[u];
                assert!(gap + EPS >= min_gap(&state.graph, editor.config(), u, v));
            }
        }
    }

    #[test]
    fn add_child_joins_existing_sibling_rank() {
        let mut editor = trio_editor();
        let ids: Vec<VertexId> = ["dad", "mum", "kid"].iter().map(|n| editor.id_of(n).unwrap()).collect();
        let ranks_before: Vec<usize> = ids.iter().map(|&v| editor.state().ranks[v]).collect();
        let hub = editor.id_of("r_hub").unwrap();

        let outcome = editor.add_child(hub).unwrap();
        assert_eq!(outcome.new.len(), 1);
        let child = outcome.new[0];
        let state = editor.state();
        assert!(state.graph.is_person(child));
        assert_eq!(state.ranks[child], state.ranks[ids[2]]);
        let ranks_after: Vec<usize> = ids.iter().map(|&v| state.ranks[v]).collect();
        assert_eq!(ranks_before, ranks_after);
        assert!(!outcome.moved.contains(&ids[0]));
        assert_sound(&editor);
    }

    #[test]
    fn add_child_accepts_a_relationship() {
        let mut editor = trio_editor();
        let rel = editor.id_of("r").unwrap();
        let outcome = editor.add_child(rel).unwrap();
        let hub = editor.id_of("r_hub").unwrap();
        assert_eq!(editor.state().graph.out_edges(hub).len(), 2);
        assert_eq!(outcome.new.len(), 1);
    }

    #[test]
    fn rejected_edit_leaves_layout_untouched() {
        let mut editor = trio_editor();
        let before = editor.snapshot();
        let dad = editor.id_of("dad").unwrap();
        let kid = editor.id_of("kid").unwrap();

        let err = editor.add_child(dad).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Precondition(PreconditionError::WrongKind { .. })
        ));
        let err = editor.add_parents(kid).unwrap_err();
        assert_eq!(err, LayoutError::Precondition(PreconditionError::AlreadyHasParents(kid)));
        let rel = editor.id_of("r").unwrap();
        assert!(editor.add_relationship(rel).is_err());

        let after = editor.snapshot();
        assert_eq!(before.ranks, after.ranks);
        assert_eq!(before.positions, after.positions);
        assert_eq!(before.order, after.order);
    }

    #[test]
    fn add_parents_opens_ranks_above_a_founder() {
        let mut editor = trio_editor();
        let dad = editor.id_of("dad").unwrap();
        let kid = editor.id_of("kid").unwrap();
        let outcome = editor.add_parents(dad).unwrap();

        assert_eq!(outcome.new.len(), 4);
        let state = editor.state();
        assert_eq!(state.ranks[dad], 3);
        assert_eq!(state.max_rank, 5);
        assert!(outcome.moved.contains(&dad));
        assert!(outcome.moved.contains(&kid));

        let father = editor.id_of("dad_father").unwrap();
        assert_eq!(state.ranks[father], 1);
        assert_eq!(state.ancestors.of(kid).unwrap()[&father], 2);
        assert!(state.graph.in_edges(dad).len() == 1);
        assert_sound(&editor);
    }

    #[test]
    fn add_relationship_creates_partner_family() {
        let mut editor = trio_editor();
        let kid = editor.id_of("kid").unwrap();
        let outcome = editor.add_relationship(kid).unwrap();

        assert_eq!(outcome.new.len(), 4);
        let state = editor.state();
        let (rel, partner, hub, child) = (outcome.new[0], outcome.new[1], outcome.new[2], outcome.new[3]);
        assert!(state.graph.is_relationship(rel));
        assert_eq!(state.ranks[rel], state.ranks[kid]);
        assert_eq!(state.ranks[partner], state.ranks[kid]);
        assert_eq!(state.ranks[hub], state.ranks[kid] + 1);
        assert_eq!(state.ranks[child], state.ranks[kid] + 2);
        assert_eq!(state.positions[hub], state.positions[rel]);
        assert!(!state.ancestors.is_consanguineous(rel));
        assert_sound(&editor);
    }

    #[test]
    fn edits_chain_and_redraw_recovers_base_graph() {
        let mut editor = trio_editor();
        let kid = editor.id_of("kid").unwrap();
        editor.add_relationship(kid).unwrap();
        let hub = editor.id_of("kid_relationship_hub").unwrap();
        editor.add_child(hub).unwrap();
        assert_sound(&editor);

        let real = editor.state().graph.num_real();
        editor.redraw().unwrap();
        assert_eq!(editor.state().graph.num_real(), real);
        assert_sound(&editor);
        assert!(editor.reposition().is_empty());
    }

    #[test]
    fn unknown_ids_are_lookup_errors() {
        let mut editor = trio_editor();
        assert!(matches!(editor.add_child(999), Err(LayoutError::Lookup(_))));
        assert!(matches!(
            editor.id_of("nobody"),
            Err(LayoutError::Lookup(_))
        ));
        editor.state().graph.validate().unwrap();
    }

    #[test]
    fn pushed_relationship_carries_hub_and_children() {
        let editor = trio_editor();
        let config = editor.config().clone();
        let mut state = editor.state().clone();
        let rel = editor.id_of("r").unwrap();
        let hub = editor.id_of("r_hub").unwrap();
        let kid = editor.id_of("kid").unwrap();
        let kid_x = state.positions[kid];
        let target = state.positions[rel] + 50.0;

        nudge_right(&mut state, &config, rel, target);
        assert_eq!(state.positions[rel], target);
        assert!((state.positions[hub] - target).abs() < 1e-6);
        assert!((state.positions[kid] - (kid_x + 50.0)).abs() < 1e-2);
    }

    #[test]
    fn add_parents_above_a_married_in_spouse_keeps_ranks() {
        let config = LayoutConfig::default();
        let descriptors = vec![
            NodeDescriptor::person("dad", "m").edge_to("r"),
            NodeDescriptor::person("mum", "f").edge_to("r"),
            NodeDescriptor::person("kid", "m").edge_to("r2"),
            NodeDescriptor::person("spouse", "f").edge_to("r2"),
            NodeDescriptor::person("grandkid", "u"),
            NodeDescriptor::relationship("r").edge_to("kid"),
            NodeDescriptor::relationship("r2").edge_to("grandkid"),
        ];
        let graph = build_graph(&descriptors, &config).unwrap();
        let mut editor = PedigreeEditor::new(&graph, config).unwrap();
        let spouse = editor.id_of("spouse").unwrap();
        let kid = editor.id_of("kid").unwrap();
        let grandkid = editor.id_of("grandkid").unwrap();
        let ranks_before = editor.state().ranks.clone();
        let max_rank = editor.state().max_rank;
        assert_eq!(ranks_before[spouse], ranks_before[kid]);

        let outcome = editor.add_parents(spouse).unwrap();
        assert_eq!(outcome.new.len(), 4);
        let state = editor.state();
        assert_eq!(state.max_rank, max_rank);
        for v in 0..graph.num_real() {
            assert_eq!(state.ranks[v], ranks_before[v], "{} changed rank", graph.name(v));
        }
        let father = editor.id_of("spouse_father").unwrap();
        let hub = editor.id_of("spouse_parents_hub").unwrap();
        assert_eq!(state.ranks[hub], state.ranks[spouse] - 1);
        assert_eq!(state.ranks[father], state.ranks[spouse] - 2);
        assert_eq!(state.ancestors.of(grandkid).unwrap()[&father], 2);
        let r2 = editor.id_of("r2").unwrap();
        assert!(!state.ancestors.is_consanguineous(r2));
        assert_sound(&editor);

        let layout = editor.layout();
        assert_eq!(layout.max_rank, max_rank);
        assert_eq!(layout.rank_offsets.len(), max_rank + 1);
        let placed = layout.nodes.iter().find(|n| n.id == father).unwrap();
        assert_eq!(placed.name, "spouse_father");
        assert_eq!(placed.rank, state.ranks[father]);
        assert_eq!(placed.x, state.positions[father]);
        assert!(layout.nodes.iter().all(|n| n.rank > 0));
    }
}
