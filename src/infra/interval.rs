//! Disjoint closed-range lookup table.
//!
//! `IntervalIndex` maps non-overlapping `[left, right]` ranges to values and
//! answers point queries with a binary search over right bounds. It is used to
//! resolve byte offsets in a joined inspection payload back to the item that
//! owns them.

use crate::domain::RangeError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<V> {
    left: usize,
    right: usize,
    value: V,
}

/// Result of a point lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup<'a, V> {
    /// Value of the range containing the key, if any.
    pub value: Option<&'a V>,
    /// Position at which a range starting at the key would be inserted.
    pub index: usize,
}

impl<V> Lookup<'_, V> {
    pub fn contains(&self) -> bool {
        self.value.is_some()
    }
}

/// Sorted, pairwise-disjoint closed ranges, each bound to a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalIndex<V> {
    entries: Vec<Entry<V>>,
}

impl<V> Default for IntervalIndex<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> IntervalIndex<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the first range whose right bound is at or after `key`.
    pub fn find(&self, key: usize) -> Lookup<'_, V> {
        let index = self.entries.partition_point(|entry| entry.right < key);
        let value = self
            .entries
            .get(index)
            .filter(|entry| entry.left <= key)
            .map(|entry| &entry.value);
        Lookup { value, index }
    }

    pub fn get(&self, key: usize) -> Option<&V> {
        self.find(key).value
    }

    /// Inserts `[left, right]`, keeping ranges sorted and disjoint.
    ///
    /// Fails without touching the index when either endpoint falls inside an
    /// existing range, or when an existing range lies strictly between them.
    pub fn add_range(&mut self, left: usize, right: usize, value: V) -> Result<(), RangeError> {
        if left > right {
            return Err(RangeError::Inverted { left, right });
        }

        let start = self.find(left);
        let end = self.find(right);
        if start.contains() || end.contains() || start.index != end.index {
            return Err(RangeError::Overlap { left, right });
        }

        self.entries.insert(start.index, Entry { left, right, value });
        Ok(())
    }

    /// Ranges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &V)> {
        self.entries
            .iter()
            .map(|entry| (entry.left, entry.right, &entry.value))
    }
}
