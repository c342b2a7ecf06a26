use serde::{Deserialize, Serialize};

use crate::ir::VertexId;

/// Left-to-right vertex sequence per rank plus the inverse vertex -> index map.
///
/// Every mutation keeps both views in sync. Row 0 holds discarded vertices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<VertexId>>", into = "Vec<Vec<VertexId>>")]
pub struct Ordering {
    order: Vec<Vec<VertexId>>,
    vorder: Vec<usize>,
}

impl From<Vec<Vec<VertexId>>> for Ordering {
    fn from(order: Vec<Vec<VertexId>>) -> Self {
        let mut ordering = Self {
            order,
            vorder: Vec::new(),
        };
        ordering.reindex_all();
        ordering
    }
}

impl From<Ordering> for Vec<Vec<VertexId>> {
    fn from(ordering: Ordering) -> Self {
        ordering.order
    }
}

impl Ordering {
    pub fn new(num_ranks: usize) -> Self {
        Self {
            order: vec![Vec::new(); num_ranks],
            vorder: Vec::new(),
        }
    }

    pub fn num_ranks(&self) -> usize {
        self.order.len()
    }

    pub fn rows(&self) -> &[Vec<VertexId>] {
        &self.order
    }

    pub fn rank(&self, rank: usize) -> &[VertexId] {
        self.order.get(rank).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn position(&self, v: VertexId) -> usize {
        self.vorder[v]
    }

    pub fn at(&self, rank: usize, index: usize) -> Option<VertexId> {
        self.order.get(rank).and_then(|row| row.get(index)).copied()
    }

    pub fn left_of(&self, rank: usize, v: VertexId) -> Option<VertexId> {
        let pos = self.vorder[v];
        if pos == 0 { None } else { self.at(rank, pos - 1) }
    }

    pub fn right_of(&self, rank: usize, v: VertexId) -> Option<VertexId> {
        self.at(rank, self.vorder[v] + 1)
    }

    fn ensure_vertex(&mut self, v: VertexId) {
        if v >= self.vorder.len() {
            self.vorder.resize(v + 1, 0);
        }
    }

    pub fn ensure_ranks(&mut self, num_ranks: usize) {
        if self.order.len() < num_ranks {
            self.order.resize(num_ranks, Vec::new());
        }
    }

    fn reindex_row(&mut self, rank: usize, from: usize) {
        for idx in from..self.order[rank].len() {
            let v = self.order[rank][idx];
            self.ensure_vertex(v);
            self.vorder[v] = idx;
        }
    }

    fn reindex_all(&mut self) {
        for rank in 0..self.order.len() {
            self.reindex_row(rank, 0);
        }
    }

    pub fn push(&mut self, rank: usize, v: VertexId) {
        self.ensure_ranks(rank + 1);
        self.ensure_vertex(v);
        self.vorder[v] = self.order[rank].len();
        self.order[rank].push(v);
    }

    pub fn insert(&mut self, rank: usize, index: usize, v: VertexId) {
        self.ensure_ranks(rank + 1);
        let index = index.min(self.order[rank].len());
        self.order[rank].insert(index, v);
        self.reindex_row(rank, index);
    }

    pub fn remove(&mut self, rank: usize, v: VertexId) {
        let index = self.vorder[v];
        if self.order[rank].get(index) == Some(&v) {
            self.order[rank].remove(index);
            self.reindex_row(rank, index);
        }
    }

    /// Swaps two positions of a rank (used on adjacent pairs).
    pub fn exchange(&mut self, rank: usize, i: usize, j: usize) {
        let row = &mut self.order[rank];
        row.swap(i, j);
        let (a, b) = (row[i], row[j]);
        self.vorder[a] = i;
        self.vorder[b] = j;
    }

    /// Moves a vertex by `offset` positions within its rank, clamped to the row.
    /// Returns the applied offset.
    pub fn move_by(&mut self, rank: usize, v: VertexId, offset: i64) -> i64 {
        let from = self.vorder[v] as i64;
        let last = self.order[rank].len() as i64 - 1;
        let to = (from + offset).clamp(0, last.max(0));
        if to == from {
            return 0;
        }
        self.order[rank].remove(from as usize);
        self.order[rank].insert(to as usize, v);
        let lo = from.min(to) as usize;
        self.reindex_row(rank, lo);
        to - from
    }

    pub fn move_to(&mut self, from_rank: usize, v: VertexId, to_rank: usize, index: usize) {
        self.remove(from_rank, v);
        self.insert(to_rank, index, v);
    }

    pub fn set_row(&mut self, rank: usize, row: Vec<VertexId>) {
        self.ensure_ranks(rank + 1);
        self.order[rank] = row;
        self.reindex_row(rank, 0);
    }

    /// Inserts `count` empty rows before `at`.
    pub fn insert_rows(&mut self, at: usize, count: usize) {
        for _ in 0..count {
            self.order.insert(at, Vec::new());
        }
    }

    pub fn remove_row(&mut self, rank: usize) -> Vec<VertexId> {
        self.order.remove(rank)
    }

    /// Renumbers ids for a real vertex inserted at `id` (ids >= `id` shift up).
    pub fn bump_ids_from(&mut self, id: VertexId) {
        for row in &mut self.order {
            for v in row.iter_mut() {
                if *v >= id {
                    *v += 1;
                }
            }
        }
        if id <= self.vorder.len() {
            self.vorder.insert(id, 0);
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.order
            .iter()
            .all(|row| row.iter().enumerate().all(|(idx, &v)| self.vorder.get(v) == Some(&idx)))
    }
}
