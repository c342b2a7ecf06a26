use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::layout::error::{LayoutResult, LookupError, StructuralError};

pub type VertexId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Self::Male,
            "f" | "female" => Self::Female,
            _ => Self::Unknown,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Male => "m",
            Self::Female => "f",
            Self::Unknown => "u",
        }
    }
}

/// The four vertex kinds a pedigree graph is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VertexKind {
    Person { sex: Sex },
    Relationship,
    ChildHub,
    VirtualEdge,
}

impl VertexKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Person { .. } => "person",
            Self::Relationship => "relationship",
            Self::ChildHub => "child hub",
            Self::VirtualEdge => "virtual edge",
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::VirtualEdge)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub name: String,
    pub kind: VertexKind,
    pub width: f64,
}

impl Vertex {
    pub fn half_width(&self) -> f64 {
        (self.width / 2.0).floor()
    }
}

/// Arena-style directed multigraph of pedigree vertices.
///
/// Real vertices occupy the id prefix `[0, num_real)`; virtual vertices are
/// always appended after them, so [`Graph::is_virtual`] is an id comparison.
/// Inserting a real vertex once virtual vertices exist goes through
/// [`Graph::insert_real_vertex`], which renumbers the virtual suffix.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    out_edges: Vec<Vec<VertexId>>,
    in_edges: Vec<Vec<VertexId>>,
    weights: HashMap<(VertexId, VertexId), u32>,
    names: HashMap<String, VertexId>,
    num_real: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn num_real(&self) -> usize {
        self.num_real
    }

    pub fn is_virtual(&self, v: VertexId) -> bool {
        v >= self.num_real
    }

    pub fn is_real(&self, v: VertexId) -> bool {
        v < self.num_real
    }

    /// A virtual vertex that has been spliced out of its chain.
    pub fn is_detached(&self, v: VertexId) -> bool {
        self.is_virtual(v) && self.in_edges[v].is_empty() && self.out_edges[v].is_empty()
    }

    pub fn check(&self, v: VertexId) -> LayoutResult<()> {
        if v < self.vertices.len() {
            Ok(())
        } else {
            Err(LookupError::UnknownId(v).into())
        }
    }

    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn kind(&self, v: VertexId) -> VertexKind {
        self.vertices[v].kind
    }

    pub fn name(&self, v: VertexId) -> &str {
        &self.vertices[v].name
    }

    pub fn width(&self, v: VertexId) -> f64 {
        self.vertices[v].width
    }

    pub fn half_width(&self, v: VertexId) -> f64 {
        self.vertices[v].half_width()
    }

    pub fn is_person(&self, v: VertexId) -> bool {
        matches!(self.kind(v), VertexKind::Person { .. })
    }

    pub fn is_relationship(&self, v: VertexId) -> bool {
        matches!(self.kind(v), VertexKind::Relationship)
    }

    pub fn is_child_hub(&self, v: VertexId) -> bool {
        matches!(self.kind(v), VertexKind::ChildHub)
    }

    pub fn id_of(&self, name: &str) -> LayoutResult<VertexId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::UnknownName(name.to_string()).into())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Returns `base` if unused, otherwise the first free `base_N`.
    pub fn fresh_name(&self, base: &str) -> String {
        if !self.contains_name(base) {
            return base.to_string();
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.contains_name(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn add_vertex(&mut self, name: &str, kind: VertexKind, width: f64) -> LayoutResult<VertexId> {
        if self.names.contains_key(name) {
            return Err(StructuralError::DuplicateName(name.to_string()).into());
        }
        if !kind.is_virtual() && self.num_real != self.vertices.len() {
            return Err(StructuralError::RealAfterVirtual(name.to_string()).into());
        }
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            name: name.to_string(),
            kind,
            width,
        });
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.names.insert(name.to_string(), id);
        if !kind.is_virtual() {
            self.num_real += 1;
        }
        Ok(id)
    }

    /// Adds a real vertex at id `num_real`, bumping every virtual id by one.
    pub fn insert_real_vertex(
        &mut self,
        name: &str,
        kind: VertexKind,
        width: f64,
    ) -> LayoutResult<VertexId> {
        if kind.is_virtual() {
            return self.add_vertex(name, kind, width);
        }
        if self.names.contains_key(name) {
            return Err(StructuralError::DuplicateName(name.to_string()).into());
        }
        let id = self.num_real;
        let bump = |v: VertexId| if v >= id { v + 1 } else { v };
        for list in self.out_edges.iter_mut().chain(self.in_edges.iter_mut()) {
            for v in list.iter_mut() {
                *v = bump(*v);
            }
        }
        self.weights = self
            .weights
            .drain()
            .map(|((from, to), w)| ((bump(from), bump(to)), w))
            .collect();
        for v in self.names.values_mut() {
            *v = bump(*v);
        }
        self.vertices.insert(
            id,
            Vertex {
                name: name.to_string(),
                kind,
                width,
            },
        );
        self.out_edges.insert(id, Vec::new());
        self.in_edges.insert(id, Vec::new());
        self.names.insert(name.to_string(), id);
        self.num_real += 1;
        Ok(id)
    }

    pub fn add_edge(&mut self, from: VertexId, to: VertexId, weight: u32) -> LayoutResult<()> {
        self.check(from)?;
        self.check(to)?;
        if self.weights.contains_key(&(from, to)) {
            return Err(StructuralError::DuplicateEdge { from, to }.into());
        }
        self.out_edges[from].push(to);
        self.in_edges[to].push(from);
        self.weights.insert((from, to), weight);
        Ok(())
    }

    pub fn remove_edge(&mut self, from: VertexId, to: VertexId) -> bool {
        if self.weights.remove(&(from, to)).is_none() {
            return false;
        }
        self.out_edges[from].retain(|&v| v != to);
        self.in_edges[to].retain(|&v| v != from);
        true
    }

    pub fn out_edges(&self, v: VertexId) -> &[VertexId] {
        &self.out_edges[v]
    }

    pub fn in_edges(&self, v: VertexId) -> &[VertexId] {
        &self.in_edges[v]
    }

    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.weights.contains_key(&(from, to))
    }

    pub fn edge_weight(&self, from: VertexId, to: VertexId) -> Option<u32> {
        self.weights.get(&(from, to)).copied()
    }

    pub fn weight(&self, from: VertexId, to: VertexId) -> u32 {
        self.edge_weight(from, to).unwrap_or(1)
    }

    /// All edges in source-id order, targets in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.out_edges
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |&to| (from, to)))
    }

    pub fn parentless(&self) -> Vec<VertexId> {
        (0..self.num_real)
            .filter(|&v| self.in_edges[v].is_empty())
            .collect()
    }

    pub fn leaves(&self) -> Vec<VertexId> {
        (0..self.num_real)
            .filter(|&v| self.out_edges[v].is_empty())
            .collect()
    }

    /// The child hub hanging off a relationship, if any.
    pub fn child_hub_of(&self, relationship: VertexId) -> Option<VertexId> {
        self.out_edges[relationship]
            .iter()
            .copied()
            .find(|&v| self.is_child_hub(v))
    }

    /// Follows a chain of virtual vertices downward to the real vertex it ends in.
    pub fn real_target(&self, mut v: VertexId) -> VertexId {
        while self.is_virtual(v) {
            match self.out_edges[v].first() {
                Some(&next) => v = next,
                None => break,
            }
        }
        v
    }

    /// Follows a chain of virtual vertices upward to the real vertex it starts at.
    pub fn real_source(&self, mut v: VertexId) -> VertexId {
        while self.is_virtual(v) {
            match self.in_edges[v].first() {
                Some(&prev) => v = prev,
                None => break,
            }
        }
        v
    }

    /// The real parents of a relationship, looking through virtual chains.
    pub fn relationship_parents(&self, relationship: VertexId) -> Vec<VertexId> {
        self.in_edges[relationship]
            .iter()
            .map(|&p| self.real_source(p))
            .collect()
    }

    /// Splices a virtual vertex out of its chain: its parent is linked straight
    /// to its child with the parent's edge weight and the vertex is left with no
    /// edges at all.
    pub fn unplug_vertex(&mut self, v: VertexId) -> LayoutResult<()> {
        self.check(v)?;
        if !self.is_virtual(v) {
            return Err(StructuralError::NotVirtual(v).into());
        }
        let (parent, child) = match (self.in_edges[v].as_slice(), self.out_edges[v].as_slice()) {
            (&[parent], &[child]) => (parent, child),
            _ => {
                return Err(StructuralError::BadEdgeCount {
                    vertex: v,
                    name: self.name(v).to_string(),
                    incoming: self.in_edges[v].len(),
                    outgoing: self.out_edges[v].len(),
                }
                .into());
            }
        };
        let weight = self.weight(parent, v);
        self.remove_edge(parent, v);
        self.remove_edge(v, child);
        self.add_edge(parent, child, weight)
    }

    /// Rebuilds the virtual-free graph the working graph was split from.
    pub fn base_graph(&self) -> LayoutResult<Graph> {
        let mut base = Graph::new();
        for v in 0..self.num_real {
            let vertex = &self.vertices[v];
            base.add_vertex(&vertex.name, vertex.kind, vertex.width)?;
        }
        for from in 0..self.num_real {
            for &first in &self.out_edges[from] {
                let to = self.real_target(first);
                if self.is_virtual(to) {
                    return Err(StructuralError::BadEdgeCount {
                        vertex: to,
                        name: self.name(to).to_string(),
                        incoming: self.in_edges[to].len(),
                        outgoing: 0,
                    }
                    .into());
                }
                base.add_edge(from, to, self.weight(from, first))?;
            }
        }
        Ok(base)
    }

    /// Checks every structural invariant of a pedigree graph.
    ///
    /// Per-vertex edge counts and kinds are checked first, then cycles (DFS
    /// from every parentless vertex) and finally connectivity.
    pub fn validate(&self) -> LayoutResult<()> {
        for v in 0..self.len() {
            if self.is_detached(v) {
                continue;
            }
            self.validate_vertex(v)?;
        }

        let roots = self.parentless();
        if roots.is_empty() {
            return Err(StructuralError::NoRoots.into());
        }
        self.check_acyclic(&roots)?;
        self.check_connected(roots[0])
    }

    fn validate_vertex(&self, v: VertexId) -> LayoutResult<()> {
        let incoming = self.in_edges[v].len();
        let outgoing = self.out_edges[v].len();
        let bad_count = || StructuralError::BadEdgeCount {
            vertex: v,
            name: self.name(v).to_string(),
            incoming,
            outgoing,
        };
        match self.kind(v) {
            VertexKind::Person { .. } => {
                if incoming > 1 {
                    return Err(StructuralError::TooManyInEdges {
                        vertex: v,
                        name: self.name(v).to_string(),
                        count: incoming,
                    }
                    .into());
                }
                for &to in &self.out_edges[v] {
                    if !matches!(
                        self.kind(to),
                        VertexKind::Relationship | VertexKind::VirtualEdge
                    ) {
                        return Err(StructuralError::BadEdgeTarget { from: v, to }.into());
                    }
                }
            }
            VertexKind::Relationship => {
                if incoming != 2 || outgoing != 1 {
                    return Err(bad_count().into());
                }
                let to = self.out_edges[v][0];
                if !self.is_child_hub(to) {
                    return Err(StructuralError::BadEdgeTarget { from: v, to }.into());
                }
            }
            VertexKind::ChildHub => {
                if incoming != 1 || outgoing == 0 {
                    return Err(bad_count().into());
                }
                for &to in &self.out_edges[v] {
                    if !self.is_person(to) {
                        return Err(StructuralError::BadEdgeTarget { from: v, to }.into());
                    }
                }
            }
            VertexKind::VirtualEdge => {
                if incoming != 1 || outgoing != 1 {
                    return Err(bad_count().into());
                }
            }
        }
        Ok(())
    }

    fn check_acyclic(&self, roots: &[VertexId]) -> LayoutResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }
        let mut marks = vec![Mark::New; self.len()];
        for &root in roots {
            if marks[root] != Mark::New {
                continue;
            }
            let mut stack: Vec<(VertexId, usize)> = vec![(root, 0)];
            marks[root] = Mark::Active;
            while let Some(top) = stack.last_mut() {
                let v = top.0;
                if let Some(&child) = self.out_edges[v].get(top.1) {
                    top.1 += 1;
                    match marks[child] {
                        Mark::Active => return Err(StructuralError::Cycle(child).into()),
                        Mark::New => {
                            marks[child] = Mark::Active;
                            stack.push((child, 0));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[v] = Mark::Done;
                    stack.pop();
                }
            }
        }
        // In a DAG every vertex descends from some root.
        match (0..self.len()).find(|&v| marks[v] == Mark::New && !self.is_detached(v)) {
            Some(v) => Err(StructuralError::Cycle(v).into()),
            None => Ok(()),
        }
    }

    fn check_connected(&self, start: VertexId) -> LayoutResult<()> {
        let mut seen = vec![false; self.len()];
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(v) = queue.pop_front() {
            for &u in self.out_edges[v].iter().chain(self.in_edges[v].iter()) {
                if !seen[u] {
                    seen[u] = true;
                    queue.push_back(u);
                }
            }
        }
        match (0..self.len()).find(|&v| !seen[v] && !self.is_detached(v)) {
            Some(v) => Err(StructuralError::Disconnected(v).into()),
            None => Ok(()),
        }
    }
}
