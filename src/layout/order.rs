use std::collections::{HashMap, VecDeque};

use crate::config::OrderingConfig;
use crate::ir::{Graph, VertexId};

use super::crossings::RankedGraph;
use super::long_edges::straighten_long_edges;
use super::ordering::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    BreadthFirst,
    DepthFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeedSide {
    Roots,
    Leaves,
}

#[derive(Debug, Clone, Default)]
pub struct OrderStats {
    pub seed_attempts: usize,
    pub seeds_tried: usize,
    pub seed_crossings: f64,
    pub iterations: usize,
    pub long_edge_moves: usize,
    pub crossings: f64,
    pub edge_length: f64,
    /// Best `(crossings, edge length)` after each refinement iteration.
    pub best_keys: Vec<(f64, f64)>,
}

/// Crossing-minimizing vertex order for a graph whose edges all span at most
/// one rank.
pub fn order_vertices(view: RankedGraph<'_>, config: &OrderingConfig) -> (Ordering, OrderStats) {
    let mut stats = OrderStats::default();
    let seeded = best_seed_ordering(view, config, &mut stats);
    let mut ordering = refine(view, seeded, config, &mut stats);
    stats.long_edge_moves = straighten_long_edges(view, &mut ordering, config);
    stats.crossings = view.total_crossings(&ordering);
    stats.edge_length = view.total_edge_length(&ordering);
    (ordering, stats)
}

/// `(crossings, edge length)`; lower is better, compared lexicographically.
pub fn ordering_key(view: RankedGraph<'_>, ordering: &Ordering) -> (f64, f64) {
    (view.total_crossings(ordering), view.total_edge_length(ordering))
}

fn best_seed_ordering(
    view: RankedGraph<'_>,
    config: &OrderingConfig,
    stats: &mut OrderStats,
) -> Ordering {
    let partners = rootless_partners(view.graph);
    let attempts = [
        (SeedSide::Roots, Traversal::BreadthFirst),
        (SeedSide::Leaves, Traversal::BreadthFirst),
        (SeedSide::Roots, Traversal::DepthFirst),
    ];

    let mut best: Option<(f64, Ordering)> = None;
    'attempts: for (side, traversal) in attempts {
        stats.seed_attempts += 1;
        let groups = seed_groups(view.graph, side, &partners);
        let buckets = bucketize(groups, config.seed_buckets);
        for perm in non_mirrored_permutations(buckets.len()) {
            let seeds: Vec<VertexId> = perm
                .iter()
                .flat_map(|&b| buckets[b].iter().copied())
                .collect();
            let mut ordering = traverse(view, &seeds, traversal, &partners);
            transpose(view, &mut ordering, Some(config.seed_transpose_sweeps), false);
            let crossings = view.total_crossings(&ordering);
            stats.seeds_tried += 1;
            if best.as_ref().is_none_or(|(c, _)| crossings < *c) {
                best = Some((crossings, ordering));
            }
            if crossings == 0.0 {
                break 'attempts;
            }
        }
    }

    match best {
        Some((crossings, ordering)) => {
            stats.seed_crossings = crossings;
            ordering
        }
        None => traverse(view, &view.graph.parentless(), Traversal::BreadthFirst, &partners),
    }
}

/// Parentless persons whose only relationship is with someone who has
/// parents, keyed by that partner.
fn rootless_partners(graph: &Graph) -> HashMap<VertexId, Vec<VertexId>> {
    let mut partners: HashMap<VertexId, Vec<VertexId>> = HashMap::new();
    for q in graph.parentless() {
        let &[rel] = graph.out_edges(q) else {
            continue;
        };
        if !graph.is_relationship(rel) {
            continue;
        }
        let other = graph.in_edges(rel).iter().copied().find(|&p| p != q);
        if let Some(p) = other {
            if graph.is_real(p) && !graph.in_edges(p).is_empty() {
                partners.entry(p).or_default().push(q);
            }
        }
    }
    partners
}

/// Seed candidates grouped so that vertices belonging side by side share a
/// group: co-parents on the root side, siblings on the leaf side.
fn seed_groups(
    graph: &Graph,
    side: SeedSide,
    partners: &HashMap<VertexId, Vec<VertexId>>,
) -> Vec<Vec<VertexId>> {
    let mut links: Vec<(VertexId, VertexId)> = Vec::new();
    let candidates: Vec<VertexId> = match side {
        SeedSide::Roots => {
            let rootless: Vec<VertexId> = partners.values().flatten().copied().collect();
            for rel in (0..graph.num_real()).filter(|&v| graph.is_relationship(v)) {
                if let &[a, b] = graph.in_edges(rel) {
                    links.push((a, b));
                }
            }
            graph
                .parentless()
                .into_iter()
                .filter(|v| !rootless.contains(v))
                .collect()
        }
        SeedSide::Leaves => {
            for hub in (0..graph.num_real()).filter(|&v| graph.is_child_hub(v)) {
                let children = graph.out_edges(hub);
                for pair in children.windows(2) {
                    links.push((pair[0], pair[1]));
                }
            }
            graph.leaves()
        }
    };
    group_candidates(&candidates, &links)
}

fn group_candidates(candidates: &[VertexId], links: &[(VertexId, VertexId)]) -> Vec<Vec<VertexId>> {
    fn find(parent: &mut [usize], x: usize) -> usize {
        let mut root = x;
        while parent[root] != root {
            root = parent[root];
        }
        parent[x] = root;
        root
    }

    let index: HashMap<VertexId, usize> = candidates
        .iter()
        .enumerate()
        .map(|(idx, &v)| (v, idx))
        .collect();
    let mut parent: Vec<usize> = (0..candidates.len()).collect();
    for (a, b) in links {
        if let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) {
            let (ra, rb) = (find(&mut parent, ia), find(&mut parent, ib));
            if ra != rb {
                parent[ra.max(rb)] = ra.min(rb);
            }
        }
    }

    let mut groups: Vec<Vec<VertexId>> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for (idx, &v) in candidates.iter().enumerate() {
        let root = find(&mut parent, idx);
        let group = *slot.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(v);
    }
    groups
}

/// Spreads groups over at most `max_buckets` contiguous buckets.
fn bucketize(groups: Vec<Vec<VertexId>>, max_buckets: usize) -> Vec<Vec<VertexId>> {
    let n = groups.len();
    if n <= max_buckets {
        return groups;
    }
    let mut buckets = vec![Vec::new(); max_buckets];
    for (idx, group) in groups.into_iter().enumerate() {
        buckets[idx * max_buckets / n].extend(group);
    }
    buckets
}

fn next_permutation(perm: &mut [usize]) -> bool {
    if perm.len() < 2 {
        return false;
    }
    let mut i = perm.len() - 1;
    while i > 0 && perm[i - 1] >= perm[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = perm.len() - 1;
    while perm[j] <= perm[i - 1] {
        j -= 1;
    }
    perm.swap(i - 1, j);
    perm[i..].reverse();
    true
}

/// All permutations of `0..n` that are not the mirror image of an earlier one.
fn non_mirrored_permutations(n: usize) -> Vec<Vec<usize>> {
    let mut perm: Vec<usize> = (0..n).collect();
    let mut out = Vec::new();
    loop {
        if n < 2 || perm[0] < perm[n - 1] {
            out.push(perm.clone());
        }
        if !next_permutation(&mut perm) {
            break;
        }
    }
    out
}

/// Initial order: vertices are appended to their rank as the traversal first
/// reaches them.
fn traverse(
    view: RankedGraph<'_>,
    seeds: &[VertexId],
    traversal: Traversal,
    partners: &HashMap<VertexId, Vec<VertexId>>,
) -> Ordering {
    let graph = view.graph;
    let mut ordering = Ordering::new(view.max_rank + 1);
    let mut placed = vec![false; graph.len()];
    let mut frontier: VecDeque<VertexId> = match traversal {
        Traversal::BreadthFirst => seeds.iter().copied().collect(),
        Traversal::DepthFirst => seeds.iter().rev().copied().collect(),
    };

    loop {
        let next = match traversal {
            Traversal::BreadthFirst => frontier.pop_front(),
            Traversal::DepthFirst => frontier.pop_back(),
        };
        let Some(v) = next else {
            break;
        };
        if placed[v] {
            continue;
        }
        placed[v] = true;
        ordering.push(view.ranks[v], v);
        place_rootless_partners(view, &mut ordering, &mut placed, v, partners);

        let neighbors = graph
            .out_edges(v)
            .iter()
            .chain(graph.in_edges(v))
            .copied()
            .filter(|&u| !placed[u]);
        match traversal {
            Traversal::BreadthFirst => frontier.extend(neighbors),
            Traversal::DepthFirst => {
                let neighbors: Vec<VertexId> = neighbors.collect();
                frontier.extend(neighbors.into_iter().rev());
            }
        }
    }

    for v in 0..graph.len() {
        if !placed[v] {
            ordering.push(view.ranks[v], v);
        }
    }
    ordering
}

/// Puts each rootless partner of `p` directly beside it, on the side where
/// fewer of `p`'s partners are already placed.
fn place_rootless_partners(
    view: RankedGraph<'_>,
    ordering: &mut Ordering,
    placed: &mut [bool],
    p: VertexId,
    partners: &HashMap<VertexId, Vec<VertexId>>,
) {
    let Some(list) = partners.get(&p) else {
        return;
    };
    let rank = view.ranks[p];
    for &q in list {
        if placed[q] || view.ranks[q] != rank {
            continue;
        }
        let pos = ordering.position(p);
        let (mut left, mut right) = (0usize, 0usize);
        for partner in partners_of(view.graph, p) {
            if placed[partner] && view.ranks[partner] == rank {
                if ordering.position(partner) < pos {
                    left += 1;
                } else {
                    right += 1;
                }
            }
        }
        let index = if left < right { pos } else { pos + 1 };
        ordering.insert(rank, index, q);
        placed[q] = true;
    }
}

fn partners_of(graph: &Graph, p: VertexId) -> Vec<VertexId> {
    graph
        .out_edges(p)
        .iter()
        .map(|&t| graph.real_target(t))
        .filter(|&rel| graph.is_relationship(rel))
        .flat_map(|rel| graph.in_edges(rel).to_vec())
        .filter(|&q| q != p)
        .collect()
}

/// Adjacent-pair exchange until no exchange helps (or `max_sweeps` runs out).
///
/// An exchange is kept when it strictly lowers the crossings around the rank
/// or, with `minor` set, keeps them equal and shortens the edge-length score.
pub(crate) fn transpose(
    view: RankedGraph<'_>,
    ordering: &mut Ordering,
    max_sweeps: Option<usize>,
    minor: bool,
) {
    let mut sweeps = 0usize;
    loop {
        let mut improved = false;
        for rank in 1..=view.max_rank {
            let len = ordering.rank(rank).len();
            for i in 0..len.saturating_sub(1) {
                let before = view.rank_crossings(ordering, rank);
                let before_length = if minor {
                    view.rank_edge_length(ordering, rank)
                } else {
                    0.0
                };
                ordering.exchange(rank, i, i + 1);
                let after = view.rank_crossings(ordering, rank);
                let keep = after < before
                    || (minor
                        && after == before
                        && view.rank_edge_length(ordering, rank) < before_length);
                if keep {
                    improved = true;
                } else {
                    ordering.exchange(rank, i, i + 1);
                }
            }
        }
        sweeps += 1;
        if !improved || max_sweeps.is_some_and(|max| sweeps >= max) {
            break;
        }
    }
}

/// Median of sorted neighbour positions; `-1` when there are none.
///
/// Two neighbours average; more than two with an even count interpolate the
/// central pair, weighted by how spread out each half is.
pub(crate) fn median_value(positions: &[usize]) -> f64 {
    let m = positions.len();
    if m == 0 {
        return -1.0;
    }
    let p = |i: usize| positions[i] as f64;
    let mid = m / 2;
    if m % 2 == 1 {
        return p(mid);
    }
    if m == 2 {
        return (p(0) + p(1)) / 2.0;
    }
    let left = p(mid - 1) - p(0);
    let right = p(m - 1) - p(mid);
    if left + right == 0.0 {
        return (p(mid - 1) + p(mid)) / 2.0;
    }
    (p(mid - 1) * right + p(mid) * left) / (left + right)
}

/// Re-sorts every rank by the weighted median of its neighbours on the rank
/// swept from: the rank above on even iterations, the rank below on odd ones.
pub(crate) fn weighted_median_pass(view: RankedGraph<'_>, ordering: &mut Ordering, iteration: usize) {
    let top_down = iteration % 2 == 0;
    let ranks: Vec<usize> = if top_down {
        (2..=view.max_rank).collect()
    } else {
        (1..view.max_rank).rev().collect()
    };

    for rank in ranks {
        let mut keyed: Vec<(f64, VertexId)> = ordering
            .rank(rank)
            .iter()
            .map(|&v| {
                let neighbors = if top_down {
                    view.graph.in_edges(v)
                } else {
                    view.graph.out_edges(v)
                };
                let adjacent = if top_down { rank - 1 } else { rank + 1 };
                let mut positions: Vec<usize> = neighbors
                    .iter()
                    .filter(|&&u| view.ranks[u] == adjacent)
                    .map(|&u| ordering.position(u))
                    .collect();
                positions.sort_unstable();
                (median_value(&positions), v)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        ordering.set_row(rank, keyed.into_iter().map(|(_, v)| v).collect());
    }
}

fn refine(
    view: RankedGraph<'_>,
    start: Ordering,
    config: &OrderingConfig,
    stats: &mut OrderStats,
) -> Ordering {
    let mut current = start;
    transpose(view, &mut current, None, true);
    let mut best_key = ordering_key(view, &current);
    let mut best = current.clone();
    let mut stall = 0usize;

    for iteration in 0..config.iterations {
        stats.iterations = iteration + 1;
        weighted_median_pass(view, &mut current, iteration);
        transpose(view, &mut current, None, true);
        let key = ordering_key(view, &current);
        if key < best_key {
            best_key = key;
            best = current.clone();
            stall = 0;
        } else {
            stall += 1;
        }
        stats.best_keys.push(best_key);
        if stall >= config.stall_limit {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::input::{NodeDescriptor, build_graph};
    use crate::layout::ranking::rank_vertices;
    use crate::layout::split::split_long_edges;

    #[test]
    fn median_rules() {
        assert_eq!(median_value(&[]), -1.0);
        assert_eq!(median_value(&[3]), 3.0);
        assert_eq!(median_value(&[1, 4, 9]), 4.0);
        assert_eq!(median_value(&[2, 5]), 3.5);
        // left gap 1, right gap 6: pulled towards the denser left side
        assert_eq!(median_value(&[0, 1, 2, 8]), (1.0 * 6.0 + 2.0 * 1.0) / 7.0);
    }

    #[test]
    fn mirrored_permutations_are_skipped() {
        assert_eq!(non_mirrored_permutations(0), vec![Vec::<usize>::new()]);
        assert_eq!(non_mirrored_permutations(1), vec![vec![0]]);
        assert_eq!(non_mirrored_permutations(2), vec![vec![0, 1]]);
        assert_eq!(non_mirrored_permutations(3).len(), 3);
        assert_eq!(non_mirrored_permutations(5).len(), 60);
    }

    #[test]
    fn buckets_never_exceed_limit() {
        let groups: Vec<Vec<VertexId>> = (0..7).map(|v| vec![v]).collect();
        let buckets = bucketize(groups, 3);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets.iter().map(Vec::len).sum::<usize>(), 7);
    }

    #[test]
    fn co_parents_share_a_seed_group() {
        let groups = group_candidates(&[0, 1, 2, 3], &[(0, 2), (5, 1)]);
        assert_eq!(groups, vec![vec![0, 2], vec![1], vec![3]]);
    }

    fn two_families() -> Vec<NodeDescriptor> {
        vec![
            NodeDescriptor::person("a", "m").edge_to("r1"),
            NodeDescriptor::person("b", "f").edge_to("r1"),
            NodeDescriptor::person("c", "m").edge_to("r2"),
            NodeDescriptor::person("d", "f").edge_to("r2"),
            NodeDescriptor::person("k1", "m").edge_to("r3"),
            NodeDescriptor::person("k2", "f").edge_to("r3"),
            NodeDescriptor::person("k3", "u"),
            NodeDescriptor::person("g", "u"),
            NodeDescriptor::relationship("r1").edge_to("k1").edge_to("k3"),
            NodeDescriptor::relationship("r2").edge_to("k2"),
            NodeDescriptor::relationship("r3").edge_to("g"),
        ]
    }

    #[test]
    fn two_families_order_without_crossings() {
        let config = LayoutConfig::default();
        let graph = build_graph(&two_families(), &config).unwrap();
        let ranking = rank_vertices(&graph).unwrap();
        let (working, ranking) = split_long_edges(&graph, &ranking, &config).unwrap();
        let view = RankedGraph::new(&working, &ranking.ranks, ranking.max_rank);
        let (ordering, stats) = order_vertices(view, &config.ordering);

        assert!(ordering.is_consistent());
        assert_eq!(stats.crossings, 0.0);
        assert!(stats.seeds_tried >= 1);
        for v in 0..working.len() {
            assert_eq!(ordering.rank(ranking.ranks[v])[ordering.position(v)], v);
        }
    }

    #[test]
    fn ordering_is_deterministic() {
        let config = LayoutConfig::default();
        let graph = build_graph(&two_families(), &config).unwrap();
        let ranking = rank_vertices(&graph).unwrap();
        let (working, ranking) = split_long_edges(&graph, &ranking, &config).unwrap();
        let view = RankedGraph::new(&working, &ranking.ranks, ranking.max_rank);
        let (first, a) = order_vertices(view, &config.ordering);
        let (second, b) = order_vertices(view, &config.ordering);
        assert_eq!(a.crossings, b.crossings);
        assert_eq!(first, second);
    }

    #[test]
    fn transpose_never_adds_crossings() {
        let config = LayoutConfig::default();
        let graph = build_graph(&two_families(), &config).unwrap();
        let ranking = rank_vertices(&graph).unwrap();
        let (working, ranking) = split_long_edges(&graph, &ranking, &config).unwrap();
        let view = RankedGraph::new(&working, &ranking.ranks, ranking.max_rank);
        // worst case start: reverse id order on every rank
        let mut ordering = Ordering::new(ranking.max_rank + 1);
        for v in (0..working.len()).rev() {
            ordering.push(ranking.ranks[v], v);
        }
        let before = view.total_crossings(&ordering);
        transpose(view, &mut ordering, None, true);
        assert!(view.total_crossings(&ordering) <= before);
        assert!(ordering.is_consistent());
    }

    fn working_view_parts(descriptors: &[NodeDescriptor]) -> (Graph, Vec<usize>, usize) {
        let config = LayoutConfig::default();
        let graph = build_graph(descriptors, &config).unwrap();
        let ranking = rank_vertices(&graph).unwrap();
        let (working, ranking) = split_long_edges(&graph, &ranking, &config).unwrap();
        (working, ranking.ranks, ranking.max_rank)
    }

    #[test]
    fn refinement_never_loses_its_best_ordering() {
        let config = LayoutConfig::default();
        let (working, ranks, max_rank) = working_view_parts(&two_families());
        let view = RankedGraph::new(&working, &ranks, max_rank);
        let mut start = Ordering::new(max_rank + 1);
        for v in (0..working.len()).rev() {
            start.push(ranks[v], v);
        }

        let mut stats = OrderStats::default();
        let refined = refine(view, start, &config.ordering, &mut stats);
        assert!(!stats.best_keys.is_empty());
        for pair in stats.best_keys.windows(2) {
            assert!(pair[1] <= pair[0], "{:?} after {:?}", pair[1], pair[0]);
        }
        assert_eq!(stats.best_keys.last().copied(), Some(ordering_key(view, &refined)));
    }

    #[test]
    fn unavoidable_crossings_try_every_seed_strategy() {
        // three partners pairwise married: a cycle that no two-layer order
        // draws without a crossing
        let descriptors = vec![
            NodeDescriptor::person("p1", "m").edge_to("r12").edge_to("r13"),
            NodeDescriptor::person("p2", "f").edge_to("r12").edge_to("r23"),
            NodeDescriptor::person("p3", "m").edge_to("r23").edge_to("r13"),
            NodeDescriptor::person("k12", "u"),
            NodeDescriptor::person("k23", "u"),
            NodeDescriptor::person("k13", "u"),
            NodeDescriptor::relationship("r12").edge_to("k12"),
            NodeDescriptor::relationship("r23").edge_to("k23"),
            NodeDescriptor::relationship("r13").edge_to("k13"),
        ];
        let config = LayoutConfig::default();
        let (working, ranks, max_rank) = working_view_parts(&descriptors);
        let view = RankedGraph::new(&working, &ranks, max_rank);
        let (ordering, stats) = order_vertices(view, &config.ordering);

        assert_eq!(stats.seed_attempts, 3);
        assert!(stats.seed_crossings >= 1.0);
        assert!(stats.crossings >= 1.0);
        assert!(stats.crossings <= stats.seed_crossings);
        assert!(ordering.is_consistent());
    }
}
