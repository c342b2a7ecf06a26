use std::path::Path;

use pedigree_layout::editor::PedigreeEditor;
use pedigree_layout::input::{build_graph, parse_descriptors};
use pedigree_layout::ir::Graph;
use pedigree_layout::layout::{LayoutError, StructuralError, collapse_empty_ranks, min_gap};
use pedigree_layout::layout_dump::LayoutDump;
use pedigree_layout::snapshot::Snapshot;
use pedigree_layout::{LayoutConfig, LayoutState, compute_layout};

const EPS: f64 = 1e-3;

// Keep this list explicit so new pedigrees must be added intentionally.
const VALID_FIXTURES: [&str; 5] = [
    "trio.json",
    "cousins.json",
    "shared_partner.json",
    "uncle_niece.json",
    "four_generations.json",
];

fn load_graph(fixture: &str, config: &LayoutConfig) -> Result<Graph, LayoutError> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(fixture);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    let descriptors = parse_descriptors(&input).expect("fixture parse failed");
    build_graph(&descriptors, config)
}

fn layout_fixture(fixture: &str) -> (Graph, LayoutState) {
    let config = LayoutConfig::default();
    let graph = load_graph(fixture, &config).expect("fixture graph invalid");
    let state = compute_layout(&graph, &config).expect("layout failed");
    (graph, state)
}

fn assert_layout_invariants(state: &LayoutState, config: &LayoutConfig, fixture: &str) {
    let graph = &state.graph;
    graph.validate().unwrap_or_else(|err| panic!("{fixture}: {err}"));
    assert!(state.ordering.is_consistent(), "{fixture}: ordering out of sync");

    for (from, to) in graph.edges() {
        let (rf, rt) = (state.ranks[from], state.ranks[to]);
        assert!(rf > 0 && rt > 0, "{fixture}: edge touches a discarded vertex");
        if graph.is_relationship(to) {
            assert_eq!(rf, rt, "{fixture}: {} not beside its relationship", graph.name(from));
        } else {
            assert_eq!(rf + 1, rt, "{fixture}: edge {from}->{to} spans {rf}..{rt}");
        }
    }

    for rank in 1..=state.max_rank {
        let row = state.ordering.rank(rank);
        assert!(
            row.iter().any(|&v| graph.is_real(v)),
            "{fixture}: rank {rank} holds no real vertex"
        );
        for pair in row.windows(2) {
            let (u, v) = (pair[0], pair[1]);
            let gap = state.positions[v] - state.positions[u];
            assert!(
                gap + EPS >= min_gap(graph, config, u, v),
                "{fixture}: {} and {} are {gap} apart",
                graph.name(u),
                graph.name(v)
            );
        }
    }
}

#[test]
fn all_fixtures_satisfy_layout_invariants() {
    let config = LayoutConfig::default();
    for fixture in VALID_FIXTURES {
        let (_, state) = layout_fixture(fixture);
        assert_layout_invariants(&state, &config, fixture);
    }
}

#[test]
fn ranks_never_decrease_along_base_edges() {
    for fixture in VALID_FIXTURES {
        let (base, state) = layout_fixture(fixture);
        for (from, to) in base.edges() {
            assert!(
                state.ranks[from] <= state.ranks[to],
                "{fixture}: {} ranked below {}",
                base.name(from),
                base.name(to)
            );
        }
        let rebuilt = state.graph.base_graph().expect("base graph");
        assert_eq!(rebuilt.edges().count(), base.edges().count(), "{fixture}");
    }
}

#[test]
fn layout_is_deterministic() {
    for fixture in VALID_FIXTURES {
        let (_, first) = layout_fixture(fixture);
        let (_, second) = layout_fixture(fixture);
        assert_eq!(first.ranks, second.ranks, "{fixture}");
        assert_eq!(first.ordering, second.ordering, "{fixture}");
        assert_eq!(first.positions, second.positions, "{fixture}");
    }
}

#[test]
fn collapsing_a_finished_layout_changes_nothing() {
    for fixture in VALID_FIXTURES {
        let (_, mut state) = layout_fixture(fixture);
        let ranks = state.ranks.clone();
        assert_eq!(collapse_empty_ranks(&mut state).expect("collapse"), 0, "{fixture}");
        assert_eq!(state.ranks, ranks, "{fixture}");
    }
}

#[test]
fn simple_families_lay_out_without_crossings() {
    for fixture in ["trio.json", "shared_partner.json"] {
        let (_, state) = layout_fixture(fixture);
        assert_eq!(state.crossings(), 0.0, "{fixture}");
    }
}

#[test]
fn trio_hub_hangs_below_the_relationship() {
    let (_, state) = layout_fixture("trio.json");
    let id = |name: &str| state.graph.id_of(name).expect("trio vertex");
    assert_eq!(state.max_rank, 3);
    assert_eq!(state.ranks[id("r")], state.ranks[id("dad")]);
    assert_eq!(state.ranks[id("r_hub")], state.ranks[id("r")] + 1);
    assert!((state.positions[id("r_hub")] - state.positions[id("r")]).abs() < EPS);
}

#[test]
fn cousin_marriage_is_consanguineous() {
    let (_, state) = layout_fixture("cousins.json");
    let r3 = state.graph.id_of("r3").expect("r3");
    assert!(state.ancestors.is_consanguineous(r3));
    for name in ["r0", "r1", "r2"] {
        let rel = state.graph.id_of(name).expect("relationship");
        assert!(!state.ancestors.is_consanguineous(rel), "{name}");
    }

    let dump = LayoutDump::from_state(&state, &LayoutConfig::default());
    assert_eq!(dump.consanguinity, vec!["r3".to_string()]);
    assert_eq!(dump.ancestors["baby"]["gpa"], 3);
}

#[test]
fn shared_partner_is_not_consanguineous() {
    let (_, state) = layout_fixture("shared_partner.json");
    assert!(state.ancestors.consanguinity.is_empty());
}

#[test]
fn uncle_marrying_niece_is_consanguineous() {
    let (_, state) = layout_fixture("uncle_niece.json");
    let r3 = state.graph.id_of("r3").expect("r3");
    assert!(state.ancestors.is_consanguineous(r3));
    let uncle = state.graph.id_of("uncle").expect("uncle");
    let niece = state.graph.id_of("niece").expect("niece");
    assert_eq!(state.ranks[state.graph.id_of("great").expect("great")], state.ranks[niece] + 2);
    assert!(state.ranks[uncle] < state.ranks[niece]);
}

#[test]
fn disconnected_and_cyclic_inputs_are_rejected() {
    let config = LayoutConfig::default();
    assert!(matches!(
        load_graph("disconnected.json", &config),
        Err(LayoutError::Structural(StructuralError::Disconnected(_)))
    ));
    assert!(matches!(
        load_graph("cycle.json", &config),
        Err(LayoutError::Structural(StructuralError::Cycle(_)))
    ));
}

#[test]
fn adding_a_child_keeps_the_layout_valid() {
    let config = LayoutConfig::default();
    let graph = load_graph("trio.json", &config).expect("trio");
    let mut editor = PedigreeEditor::new(&graph, config.clone()).expect("editor");
    let hub = editor.id_of("r_hub").expect("hub");
    let ranks_before = editor.state().ranks.clone();

    let outcome = editor.add_child(hub).expect("add child");
    assert_eq!(outcome.new.len(), 1);
    let child = outcome.new[0];
    let state = editor.state();
    let kid = state.graph.id_of("kid").expect("kid");
    assert_eq!(state.ranks[child], state.ranks[kid]);
    assert!(state.graph.has_edge(hub, child));
    for v in 0..graph.num_real() {
        assert_eq!(state.ranks[v], ranks_before[v], "{} changed rank", graph.name(v));
    }
    assert_eq!(state.ancestors.of(child).and_then(|a| a.get(&kid)), None);
    assert_layout_invariants(state, &config, "trio.json + child");
}

#[test]
fn snapshot_round_trip_preserves_the_layout() {
    let config = LayoutConfig::default();
    for fixture in VALID_FIXTURES {
        let (_, state) = layout_fixture(fixture);
        let json = serde_json::to_string(&Snapshot::capture(&state)).expect("serialize");
        let snapshot: Snapshot = serde_json::from_str(&json).expect("deserialize");
        let editor = PedigreeEditor::from_snapshot(snapshot, config.clone()).expect("restore");
        let restored = editor.state();
        assert_eq!(restored.ranks, state.ranks, "{fixture}");
        assert_eq!(restored.ordering, state.ordering, "{fixture}");
        assert_eq!(restored.positions, state.positions, "{fixture}");
        assert_eq!(restored.ancestors, state.ancestors, "{fixture}");
    }
}
