use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pedigree_layout::config::LayoutConfig;
use pedigree_layout::editor::PedigreeEditor;
use pedigree_layout::input::{NodeDescriptor, OutEdge, build_graph};
use pedigree_layout::ir::Graph;
use pedigree_layout::layout::compute_layout;
use std::hint::black_box;

/// A founding couple whose descendants each marry an outsider and have
/// `children` kids, for `generations` generations.
fn synthetic_pedigree(generations: usize, children: usize) -> Vec<NodeDescriptor> {
    let mut persons = vec![
        NodeDescriptor::person("p0", "m"),
        NodeDescriptor::person("p1", "f"),
    ];
    let mut relationships = Vec::new();
    let mut couples = vec![(0usize, 1usize)];

    for generation in 0..generations {
        let mut next = Vec::new();
        for (i, &(a, b)) in couples.iter().enumerate() {
            let rel_name = format!("r{generation}_{i}");
            for parent in [a, b] {
                persons[parent].outedges.push(OutEdge {
                    to: rel_name.clone(),
                    weight: None,
                });
            }
            let mut rel = NodeDescriptor::relationship(&rel_name);
            for _ in 0..children {
                let kid = persons.len();
                let sex = if kid % 2 == 0 { "m" } else { "f" };
                persons.push(NodeDescriptor::person(&format!("p{kid}"), sex));
                rel = rel.edge_to(&format!("p{kid}"));
                if generation + 1 < generations {
                    let partner = persons.len();
                    persons.push(NodeDescriptor::person(&format!("p{partner}"), "u"));
                    next.push((kid, partner));
                }
            }
            relationships.push(rel);
        }
        couples = next;
    }

    persons.extend(relationships);
    persons
}

fn pedigree(generations: usize, children: usize) -> Graph {
    let descriptors = synthetic_pedigree(generations, children);
    build_graph(&descriptors, &LayoutConfig::default()).expect("synthetic pedigree invalid")
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for (generations, children) in [(2, 2), (3, 2), (4, 2), (3, 3)] {
        let graph = pedigree(generations, children);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{generations}x{children}")),
            &graph,
            |b, graph| {
                b.iter(|| {
                    let state = compute_layout(black_box(graph), &config).expect("layout failed");
                    black_box(state.max_rank);
                });
            },
        );
    }
    group.finish();
}

fn bench_add_child(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_child");
    let config = LayoutConfig::default();
    for (generations, children) in [(3, 2), (4, 2)] {
        let graph = pedigree(generations, children);
        let editor = PedigreeEditor::new(&graph, config.clone()).expect("layout failed");
        let hub = editor.id_of("r0_0_hub").expect("founders' hub");
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{generations}x{children}")),
            &editor,
            |b, editor| {
                b.iter(|| {
                    let mut editor = editor.clone();
                    let outcome = editor.add_child(black_box(hub)).expect("add child failed");
                    black_box(outcome.moved.len());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_layout, bench_add_child);
criterion_main!(benches);
