//! Ordering constraints between leaf nodes.
//!
//! Row assignment is a longest-path problem over a directed graph whose
//! vertices are leaf nodes (or groups of leaf nodes that must share a row)
//! and whose weighted edges say "target is at least `weight` levels below
//! source".
//!
//! This is an internal module; [`ConstraintGraph`] is used by the builder.

use std::{cmp::Reverse, collections::BinaryHeap};

/// A weighted "at least below" edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    #[allow(dead_code)]
    source: usize,
    target: usize,
    weight: u64,
}

/// Vertices that could not be ordered because they sit on a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cycle {
    pub(crate) vertices: Vec<usize>,
}

/// Directed constraint graph over vertices `0..len`.
#[derive(Debug, Clone)]
pub(crate) struct ConstraintGraph {
    edges: Vec<Edge>,
    incoming: Vec<usize>,
    outgoing: Vec<Vec<usize>>,
}

impl ConstraintGraph {
    /// Creates a graph with `len` vertices and no edges.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            edges: Vec::new(),
            incoming: vec![0; len],
            outgoing: vec![Vec::new(); len],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.outgoing.len()
    }

    /// Adds the constraint `level(target) >= level(source) + weight`.
    ///
    /// Self-loops with zero weight are trivially satisfied and dropped.
    pub(crate) fn add_edge(&mut self, source: usize, target: usize, weight: u64) {
        debug_assert!(source < self.len() && target < self.len());
        if source == target && weight == 0 {
            return;
        }
        self.outgoing[source].push(self.edges.len());
        self.incoming[target] += 1;
        self.edges.push(Edge {
            source,
            target,
            weight,
        });
    }

    /// Returns the vertices without incoming constraints, ascending.
    pub(crate) fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.incoming
            .iter()
            .enumerate()
            .filter_map(|(vertex, &count)| (count == 0).then_some(vertex))
    }

    /// Computes the smallest levels satisfying every constraint, starting from
    /// `base` levels.
    ///
    /// Vertices are released in ascending index order whenever several are
    /// ready, so the result only depends on the inputs.
    pub(crate) fn levels(&self, base: &[u64]) -> Result<Vec<u64>, Cycle> {
        debug_assert_eq!(base.len(), self.len());

        let mut levels = base.to_vec();
        let mut pending = self.incoming.clone();
        let mut ready: BinaryHeap<Reverse<usize>> = self.roots().map(Reverse).collect();
        let mut visited = 0;

        while let Some(Reverse(vertex)) = ready.pop() {
            visited += 1;
            for &edge_idx in &self.outgoing[vertex] {
                let edge = self.edges[edge_idx];
                let candidate = levels[vertex] + edge.weight;
                if candidate > levels[edge.target] {
                    levels[edge.target] = candidate;
                }
                pending[edge.target] -= 1;
                if pending[edge.target] == 0 {
                    ready.push(Reverse(edge.target));
                }
            }
        }

        if visited < self.len() {
            let vertices = pending
                .iter()
                .enumerate()
                .filter_map(|(vertex, &count)| (count > 0).then_some(vertex))
                .collect();
            return Err(Cycle { vertices });
        }
        Ok(levels)
    }
}

/// Union-find over vertices `0..len`; the representative of a set is its
/// smallest member.
#[derive(Debug, Clone)]
pub(crate) struct Groups {
    parent: Vec<usize>,
}

impl Groups {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    pub(crate) fn find(&mut self, vertex: usize) -> usize {
        let mut root = vertex;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = vertex;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            let (low, high) = if a < b { (a, b) } else { (b, a) };
            self.parent[high] = low;
        }
    }
}
