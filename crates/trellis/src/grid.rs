//! Row and column index.
//!
//! Rows are discretized time slices, columns discretized lifeline positions.
//! Both are kept in a [`SlotIndex`]: an ordered sequence of slots numbered
//! densely from 1. Slots are addressed by stable handles ([`RowId`],
//! [`ColumnId`]) that survive insertion, removal and renumbering.

use std::fmt;

use crate::graph::NodeId;

macro_rules! slot_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl SlotHandle for $name {
            fn from_raw(raw: usize) -> Self {
                Self(raw)
            }

            fn raw(self) -> usize {
                self.0
            }
        }
    };
}

/// A stable handle into a [`SlotIndex`].
pub trait SlotHandle: Copy + Eq + fmt::Debug {
    fn from_raw(raw: usize) -> Self;

    fn raw(self) -> usize;
}

slot_handle!(
    /// Stable handle of a row.
    RowId
);

slot_handle!(
    /// Stable handle of a column.
    ColumnId
);

/// One row or column.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<I> {
    id: I,
    index: usize,
    position: f32,
    nodes: Vec<NodeId>,
}

impl<I: SlotHandle> Slot<I> {
    pub fn id(&self) -> I {
        self.id
    }

    /// Returns the 1-based ordinal of the slot.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the representative position in pixels: y for rows, x for columns.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Returns the member nodes in the order they were attached.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Ordered, densely numbered sequence of slots.
#[derive(Debug, Clone)]
pub struct SlotIndex<I> {
    slots: Vec<Slot<I>>,
    /// Current position in `slots` per raw handle; `None` once removed.
    lookup: Vec<Option<usize>>,
}

impl<I> Default for SlotIndex<I> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            lookup: Vec::new(),
        }
    }
}

impl<I: SlotHandle> SlotIndex<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot after the last one.
    pub fn push(&mut self, position: f32) -> I {
        self.insert(self.slots.len(), position)
    }

    /// Inserts a slot right after the slot with 1-based `after_index`.
    ///
    /// `after_index == 0` inserts in front. Returns `None` if `after_index`
    /// is past the end.
    pub fn insert_after(&mut self, after_index: usize, position: f32) -> Option<I> {
        if after_index > self.slots.len() {
            return None;
        }
        Some(self.insert(after_index, position))
    }

    fn insert(&mut self, at: usize, position: f32) -> I {
        let id = I::from_raw(self.lookup.len());
        self.lookup.push(None);
        self.slots.insert(
            at,
            Slot {
                id,
                index: 0,
                position,
                nodes: Vec::new(),
            },
        );
        self.renumber();
        id
    }

    /// Removes the slot with 1-based `index` if no node occupies it.
    ///
    /// Returns true if a slot was removed.
    pub fn remove_if_empty(&mut self, index: usize) -> bool {
        let Some(at) = index.checked_sub(1) else {
            return false;
        };
        match self.slots.get(at) {
            Some(slot) if slot.is_empty() => {
                let removed = self.slots.remove(at);
                self.lookup[removed.id.raw()] = None;
                self.renumber();
                true
            }
            _ => false,
        }
    }

    /// Renumbers slots densely from 1 in their current order.
    pub fn renumber(&mut self) {
        for (at, slot) in self.slots.iter_mut().enumerate() {
            slot.index = at + 1;
            self.lookup[slot.id.raw()] = Some(at);
        }
    }

    /// Moves a slot so that it gets the 1-based `index`.
    ///
    /// Returns false if the slot or the index does not exist.
    pub(crate) fn move_to(&mut self, id: I, index: usize) -> bool {
        let (Some(from), Some(to)) = (self.position_of(id), index.checked_sub(1)) else {
            return false;
        };
        if to >= self.slots.len() {
            return false;
        }
        let slot = self.slots.remove(from);
        self.slots.insert(to, slot);
        self.renumber();
        true
    }

    /// Returns the slot with 1-based `index`.
    pub fn get(&self, index: usize) -> Option<&Slot<I>> {
        index.checked_sub(1).and_then(|at| self.slots.get(at))
    }

    pub fn slot(&self, id: I) -> Option<&Slot<I>> {
        self.position_of(id).map(|at| &self.slots[at])
    }

    /// Returns the 1-based index of a slot.
    pub fn index_of(&self, id: I) -> Option<usize> {
        self.position_of(id).map(|at| at + 1)
    }

    fn position_of(&self, id: I) -> Option<usize> {
        self.lookup.get(id.raw()).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot<I>> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Adds `node` to the member list of a slot.
    pub(crate) fn attach(&mut self, id: I, node: NodeId) {
        if let Some(at) = self.position_of(id) {
            self.slots[at].nodes.push(node);
        }
    }

    /// Sets the representative position of a slot.
    pub(crate) fn set_position(&mut self, id: I, position: f32) {
        if let Some(at) = self.position_of(id) {
            self.slots[at].position = position;
        }
    }
}

/// Groups positions into ordered buckets.
///
/// Positions are visited in ascending order; equal positions keep their input
/// order, which is the semantic precedence of their owners. A position opens a
/// new bucket when it lies farther than `tolerance` from the first position of
/// the current bucket. Returns the 0-based bucket of every input position.
pub(crate) fn bucketize(positions: &[f32], tolerance: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by(|&a, &b| positions[a].total_cmp(&positions[b]));

    let mut buckets = vec![0; positions.len()];
    let mut current = 0;
    let mut first: Option<f32> = None;
    for idx in order {
        let position = positions[idx];
        match first {
            Some(start) if position - start <= tolerance => {}
            Some(_) => {
                current += 1;
                first = Some(position);
            }
            None => first = Some(position),
        }
        buckets[idx] = current;
    }
    buckets
}
