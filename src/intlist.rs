//! A growable list of node indices.
use crate::alloc::vec::Vec;

/// The child list of a trie node.
///
/// The capacity doubles whenever the list becomes full, and clearing keeps the storage so that a
/// reset dictionary reuses its allocations.
#[derive(Clone, Debug, Default)]
pub(crate) struct IntList {
    data: Vec<u32>,
}

impl IntList {
    pub(crate) fn new() -> Self {
        IntList::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        IntList {
            data: Vec::with_capacity(capacity.max(1)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub(crate) fn as_slice(&self) -> &[u32] {
        &self.data
    }

    pub(crate) fn push(&mut self, value: u32) {
        self.grow();
        self.data.push(value);
    }

    /// Insert `value` at `index`, shifting all later elements one slot to the right.
    pub(crate) fn insert(&mut self, index: usize, value: u32) {
        debug_assert!(index <= self.data.len());
        self.grow();
        self.data.insert(index, value);
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }

    fn grow(&mut self) {
        let capacity = self.data.capacity();
        if self.data.len() < capacity {
            return;
        }

        let additional = capacity.max(1);
        tracing::trace!(from = capacity, to = capacity + additional, "child list grows");
        self.data.reserve_exact(additional);
    }
}
