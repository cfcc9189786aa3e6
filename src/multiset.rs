use alloc::vec::Vec;

use crate::KeyFrequency;

/// Contract shared by the AVL and Red-Black engines.
///
/// Both engines store an ordered multiset of `i32` keys and answer the same
/// queries with identical results for identical insertion sequences; only
/// the balancing discipline differs. The trait is the seam for code that
/// benchmarks or tests the engines against each other.
pub trait OrderedMultiset {
    /// Inserts a key into the multiset.
    ///
    /// Duplicate keys are always kept as separate nodes; an equal key
    /// descends into the right subtree and is never merged or rejected.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to insert
    fn insert(&mut self, key: i32);

    /// Returns the number of stored keys, duplicates included.
    ///
    /// # Returns
    ///
    /// * `usize` - The number of stored keys
    fn len(&self) -> usize;

    /// Returns whether the multiset holds no keys.
    ///
    /// # Returns
    ///
    /// * `bool` - True if the multiset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the smallest stored key, or `None` on an empty multiset.
    ///
    /// # Returns
    ///
    /// * `Option<i32>` - The minimum key
    fn min(&self) -> Option<i32>;

    /// Returns the largest stored key, or `None` on an empty multiset.
    ///
    /// # Returns
    ///
    /// * `Option<i32>` - The maximum key
    fn max(&self) -> Option<i32>;

    /// Returns the arithmetic mean of all stored keys, `0.0` when empty.
    ///
    /// Runs in O(1) auxiliary space regardless of tree depth by Morris
    /// in-order traversal. The traversal temporarily threads predecessor
    /// `right` links through the tree and restores every one of them
    /// before returning, which is why this takes `&mut self`: the borrow
    /// checker enforces the exclusive access the transient rewiring needs.
    ///
    /// # Returns
    ///
    /// * `f64` - The mean of all stored keys
    fn mean(&mut self) -> f64;

    /// Returns the `k` most frequent keys with their occurrence counts.
    ///
    /// The result always holds exactly `k` slots, most frequent first;
    /// ties resolve to the smallest key. Slots beyond the number of
    /// distinct keys are `None`. `k == 0` yields an empty vector.
    ///
    /// # Panics
    ///
    /// Panics when the multiset holds more than `capacity_hint` distinct
    /// keys; see [`crate::FrequencyTable::record`].
    ///
    /// # Arguments
    ///
    /// * `k` - Number of result slots to produce
    /// * `capacity_hint` - Upper bound on the number of distinct keys
    ///
    /// # Returns
    ///
    /// * `Vec<Option<KeyFrequency>>` - Exactly `k` slots (empty for
    ///   `k == 0`)
    fn top_k(&self, k: usize, capacity_hint: usize) -> Vec<Option<KeyFrequency>>;

    /// Clears the multiset, releasing every node at once.
    fn reset(&mut self);
}
