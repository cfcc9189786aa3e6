use alloc::vec::Vec;

use crate::frequency::{FrequencyTable, KeyFrequency};
use crate::multiset::OrderedMultiset;
use crate::{Kbn, NIL};

/// A node in the AVL tree.
///
/// Children are addressed by arena index with [`NIL`] marking an absent
/// child; there are no parent links, rebalancing is done on the way back up
/// the recursive insertion walk. `height` and `size` describe the subtree
/// rooted at the node (leaf height 1, absent child height 0).
#[derive(Debug, Clone)]
struct Node {
    /// The stored key
    key: i32,
    /// Index of the left child, [`NIL`] if absent
    left: usize,
    /// Index of the right child, [`NIL`] if absent
    right: usize,
    /// Height of the subtree rooted here, leaf = 1
    height: i32,
    /// Number of nodes in the subtree rooted here, inclusive
    size: usize,
}

/// Height-balanced ordered multiset.
///
/// Every node satisfies the AVL balance invariant: the heights of its two
/// child subtrees differ by at most one. Insertion restores the invariant
/// with at most one single or double rotation per walk, giving O(log n)
/// inserts and O(height) min/max lookups.
///
/// Duplicate keys are kept as separate nodes (an equal key descends into
/// the right subtree), which makes the container a multiset rather than a
/// set. Nodes live in one index arena and are never freed individually;
/// the tree is dropped or [`AvlTree::reset`] as a unit.
#[derive(Debug, Clone)]
pub struct AvlTree {
    /// Arena of nodes addressed by index
    nodes: Vec<Node>,
    /// Index of the root node, [`NIL`] when the tree is empty
    root: usize,
}

impl Default for AvlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AvlTree {
    /// Creates an empty tree.
    ///
    /// # Returns
    ///
    /// * `Self` - The empty tree
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NIL,
        }
    }

    /// Creates an empty tree with room for `capacity` keys preallocated.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of insertions to preallocate for
    ///
    /// # Returns
    ///
    /// * `Self` - The empty tree
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: NIL,
        }
    }

    /// Returns the number of stored keys, duplicates included.
    ///
    /// # Returns
    ///
    /// * `usize` - The number of stored keys
    pub fn len(&self) -> usize {
        self.size_of(self.root)
    }

    /// Returns whether the tree holds no keys.
    ///
    /// # Returns
    ///
    /// * `bool` - True if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Returns the height of the tree, 0 when empty.
    ///
    /// For n keys the AVL invariant bounds this by `1.44 * log2(n + 1)`.
    ///
    /// # Returns
    ///
    /// * `i32` - The height of the tree
    pub fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    /// Inserts a key, keeping duplicates as separate nodes.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to insert
    pub fn insert(&mut self, key: i32) {
        self.root = self.insert_at(self.root, key);

        #[cfg(debug_assertions)]
        debug_assert!(
            self.verify_avl_invariants(),
            "AVL invariants violated after insertion"
        );
    }

    /// Returns the smallest stored key, or `None` on an empty tree.
    ///
    /// # Returns
    ///
    /// * `Option<i32>` - The minimum key
    pub fn min(&self) -> Option<i32> {
        if self.root == NIL {
            return None;
        }
        let mut node = self.root;
        while self.nodes[node].left != NIL {
            node = self.nodes[node].left;
        }
        Some(self.nodes[node].key)
    }

    /// Returns the largest stored key, or `None` on an empty tree.
    ///
    /// # Returns
    ///
    /// * `Option<i32>` - The maximum key
    pub fn max(&self) -> Option<i32> {
        if self.root == NIL {
            return None;
        }
        let mut node = self.root;
        while self.nodes[node].right != NIL {
            node = self.nodes[node].right;
        }
        Some(self.nodes[node].key)
    }

    /// Returns the mean of all stored keys, `0.0` when empty.
    ///
    /// Morris in-order traversal: instead of a stack, the walk threads the
    /// `right` link of each in-order predecessor to the current node, and
    /// unthreads it when the link is met again. Every node is visited
    /// exactly once, auxiliary space is O(1), and each threaded link is
    /// restored to [`NIL`] before the walk moves past it, so the tree is
    /// structurally unchanged on return. The traversal is the reason this
    /// method takes `&mut self`; the tree must not be observed mid-walk.
    ///
    /// Summation uses Kahan-Babuska-Neumaier compensation, which keeps
    /// integer-exact cases exact.
    ///
    /// # Returns
    ///
    /// * `f64` - The mean of all stored keys
    pub fn mean(&mut self) -> f64 {
        if self.root == NIL {
            return 0.0;
        }

        let mut sum = Kbn::default();
        let mut count: usize = 0;
        let mut current = self.root;

        while current != NIL {
            if self.nodes[current].left == NIL {
                sum += self.nodes[current].key as f64;
                count += 1;
                current = self.nodes[current].right;
            } else {
                // Find the in-order predecessor of current.
                let mut pre = self.nodes[current].left;
                while self.nodes[pre].right != NIL && self.nodes[pre].right != current {
                    pre = self.nodes[pre].right;
                }

                if self.nodes[pre].right == NIL {
                    // Thread the predecessor to current and descend left.
                    self.nodes[pre].right = current;
                    current = self.nodes[current].left;
                } else {
                    // Second arrival: unthread, visit, go right.
                    self.nodes[pre].right = NIL;
                    sum += self.nodes[current].key as f64;
                    count += 1;
                    current = self.nodes[current].right;
                }
            }
        }

        sum.total() / count as f64
    }

    /// Returns the `k` most frequent keys with their occurrence counts.
    ///
    /// A plain (non-threaded) in-order walk tallies distinct keys into a
    /// [`FrequencyTable`] bounded by `capacity_hint`, then `k` repeated
    /// max-scans extract the result; see [`FrequencyTable::into_top_k`]
    /// for the tie-break rule. `k == 0` yields an empty vector.
    ///
    /// # Panics
    ///
    /// Panics when more than `capacity_hint` distinct keys are present.
    ///
    /// # Arguments
    ///
    /// * `k` - Number of result slots to produce
    /// * `capacity_hint` - Upper bound on the number of distinct keys
    ///
    /// # Returns
    ///
    /// * `Vec<Option<KeyFrequency>>` - Exactly `k` slots, most frequent
    ///   first
    pub fn top_k(&self, k: usize, capacity_hint: usize) -> Vec<Option<KeyFrequency>> {
        if k == 0 {
            return Vec::new();
        }
        let mut table = FrequencyTable::with_capacity(capacity_hint);
        self.in_order(self.root, &mut |key| table.record(key));
        table.into_top_k(k)
    }

    /// Clears the tree, releasing every node at once.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.root = NIL;
    }

    #[inline]
    fn height_of(&self, node: usize) -> i32 {
        if node == NIL { 0 } else { self.nodes[node].height }
    }

    #[inline]
    fn size_of(&self, node: usize) -> usize {
        if node == NIL { 0 } else { self.nodes[node].size }
    }

    fn alloc(&mut self, key: i32) -> usize {
        self.nodes.push(Node {
            key,
            left: NIL,
            right: NIL,
            height: 1,
            size: 1,
        });
        self.nodes.len() - 1
    }

    /// Recomputes height and size from the children, after they changed.
    fn update(&mut self, node: usize) {
        let left = self.nodes[node].left;
        let right = self.nodes[node].right;
        let height = 1 + self.height_of(left).max(self.height_of(right));
        let size = 1 + self.size_of(left) + self.size_of(right);
        let entry = &mut self.nodes[node];
        entry.height = height;
        entry.size = size;
    }

    /// Rotates the subtree rooted at `y` to the right and returns the new
    /// subtree root. Only the two nodes whose subtrees changed are
    /// recomputed, which keeps the rotation O(1).
    fn rotate_right(&mut self, y: usize) -> usize {
        if y == NIL {
            return y;
        }
        let x = self.nodes[y].left;
        if x == NIL {
            return y;
        }

        let t2 = self.nodes[x].right;
        self.nodes[x].right = y;
        self.nodes[y].left = t2;

        self.update(y);
        self.update(x);

        x
    }

    /// Rotates the subtree rooted at `x` to the left and returns the new
    /// subtree root.
    fn rotate_left(&mut self, x: usize) -> usize {
        if x == NIL {
            return x;
        }
        let y = self.nodes[x].right;
        if y == NIL {
            return x;
        }

        let t2 = self.nodes[y].left;
        self.nodes[y].left = x;
        self.nodes[x].right = t2;

        self.update(x);
        self.update(y);

        y
    }

    /// Recursive-descent insert returning the (possibly new) subtree root.
    ///
    /// The rebalancing case is selected by where the just-inserted key
    /// lies relative to the heavy child. Equal keys descend right, so for
    /// case selection an equal key counts as the greater side.
    fn insert_at(&mut self, node: usize, key: i32) -> usize {
        if node == NIL {
            return self.alloc(key);
        }

        if key < self.nodes[node].key {
            let left = self.insert_at(self.nodes[node].left, key);
            self.nodes[node].left = left;
        } else {
            let right = self.insert_at(self.nodes[node].right, key);
            self.nodes[node].right = right;
        }

        self.update(node);

        let left = self.nodes[node].left;
        let right = self.nodes[node].right;
        let balance = self.height_of(left) - self.height_of(right);

        if balance > 1 {
            if key < self.nodes[left].key {
                // Left-Left
                return self.rotate_right(node);
            }
            // Left-Right
            let new_left = self.rotate_left(left);
            self.nodes[node].left = new_left;
            return self.rotate_right(node);
        }

        if balance < -1 {
            if key >= self.nodes[right].key {
                // Right-Right
                return self.rotate_left(node);
            }
            // Right-Left
            let new_right = self.rotate_right(right);
            self.nodes[node].right = new_right;
            return self.rotate_left(node);
        }

        node
    }

    /// Plain recursive in-order walk feeding each key to `visit`.
    fn in_order(&self, node: usize, visit: &mut impl FnMut(i32)) {
        if node == NIL {
            return;
        }
        self.in_order(self.nodes[node].left, visit);
        visit(self.nodes[node].key);
        self.in_order(self.nodes[node].right, visit);
    }

    #[cfg(debug_assertions)]
    fn verify_avl_invariants(&self) -> bool {
        self.verify_subtree(self.root).is_some()
    }

    /// Returns `(height, size)` of the subtree, or `None` when the balance
    /// invariant or a cached height/size is wrong.
    #[cfg(debug_assertions)]
    fn verify_subtree(&self, node: usize) -> Option<(i32, usize)> {
        if node == NIL {
            return Some((0, 0));
        }

        let entry = &self.nodes[node];
        let (left_height, left_size) = self.verify_subtree(entry.left)?;
        let (right_height, right_size) = self.verify_subtree(entry.right)?;

        if (left_height - right_height).abs() > 1 {
            return None;
        }

        let height = 1 + left_height.max(right_height);
        let size = 1 + left_size + right_size;
        if entry.height != height || entry.size != size {
            return None;
        }

        Some((height, size))
    }
}

impl OrderedMultiset for AvlTree {
    fn insert(&mut self, key: i32) {
        AvlTree::insert(self, key);
    }

    fn len(&self) -> usize {
        AvlTree::len(self)
    }

    fn min(&self) -> Option<i32> {
        AvlTree::min(self)
    }

    fn max(&self) -> Option<i32> {
        AvlTree::max(self)
    }

    fn mean(&mut self) -> f64 {
        AvlTree::mean(self)
    }

    fn top_k(&self, k: usize, capacity_hint: usize) -> Vec<Option<KeyFrequency>> {
        AvlTree::top_k(self, k, capacity_hint)
    }

    fn reset(&mut self) {
        AvlTree::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn avl_height_bound(n: usize) -> f64 {
        1.44 * num_traits::Float::log2(n as f64 + 1.0)
    }

    fn keys_in_order(tree: &AvlTree) -> Vec<i32> {
        let mut keys = Vec::new();
        tree.in_order(tree.root, &mut |key| keys.push(key));
        keys
    }

    fn tree_of(keys: &[i32]) -> AvlTree {
        let mut tree = AvlTree::new();
        for &key in keys {
            tree.insert(key);
        }
        tree
    }

    #[test]
    fn test_empty_tree() {
        let mut tree = AvlTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.min(), None);
        assert_eq!(tree.max(), None);
        assert_eq!(tree.mean(), 0.0);
        assert_eq!(tree.top_k(2, 4), vec![None, None]);
        assert_eq!(tree.top_k(0, 4), vec![]);
    }

    #[test]
    fn test_single_key() {
        let mut tree = tree_of(&[42]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.min(), Some(42));
        assert_eq!(tree.max(), Some(42));
        assert_eq!(tree.mean(), 42.0);
        assert_eq!(
            tree.top_k(1, 1),
            vec![Some(KeyFrequency {
                key: 42,
                frequency: 1
            })]
        );
    }

    #[test]
    fn test_scenario_5_3_8_3_1() {
        let mut tree = tree_of(&[5, 3, 8, 3, 1]);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.min(), Some(1));
        assert_eq!(tree.max(), Some(8));
        assert_eq!(tree.mean(), 4.0);
        assert_eq!(
            tree.top_k(1, 4),
            vec![Some(KeyFrequency {
                key: 3,
                frequency: 2
            })]
        );
        assert_eq!(keys_in_order(&tree), vec![1, 3, 3, 5, 8]);
    }

    #[test]
    fn test_duplicates_are_separate_nodes() {
        let tree = tree_of(&[7, 7, 7, 7]);
        assert_eq!(tree.len(), 4);
        assert_eq!(keys_in_order(&tree), vec![7, 7, 7, 7]);
    }

    #[test]
    fn test_rebalances_on_duplicate_of_left_child() {
        // An equal key descending through the left subtree produces a
        // Left-Right shape whose offending key equals the left child's;
        // the case selection must still rebalance.
        let tree = tree_of(&[2, 1, 1]);
        assert_eq!(keys_in_order(&tree), vec![1, 1, 2]);
        assert_eq!(tree.height(), 2);

        let tree = tree_of(&[2, 1, 1, 1, 1, 1]);
        assert_eq!(tree.len(), 6);
        assert!(tree.height() <= 3);
    }

    #[test]
    fn test_ascending_insertion_height_bound() {
        let tree = tree_of(&(1..=1000).collect::<Vec<_>>());
        assert_eq!(tree.len(), 1000);
        assert_eq!(tree.min(), Some(1));
        assert_eq!(tree.max(), Some(1000));
        assert!(f64::from(tree.height()) <= avl_height_bound(1000));
        assert_eq!(keys_in_order(&tree), (1..=1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_descending_insertion_stays_balanced() {
        let tree = tree_of(&(1..=1000).rev().collect::<Vec<_>>());
        assert_eq!(tree.len(), 1000);
        assert!(f64::from(tree.height()) <= avl_height_bound(1000));
        assert_eq!(keys_in_order(&tree), (1..=1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_mean_exact_integer_cases() {
        let mut tree = tree_of(&[1, 2, 3]);
        assert_eq!(tree.mean(), 2.0);

        let mut tree = tree_of(&[-10, 10]);
        assert_eq!(tree.mean(), 0.0);

        let mut tree = tree_of(&[i32::MAX, i32::MAX]);
        assert_eq!(tree.mean(), f64::from(i32::MAX));
    }

    #[test]
    fn test_mean_fractional() {
        let mut tree = tree_of(&[1, 2, 4]);
        assert_approx_eq!(tree.mean(), 7.0 / 3.0, 1e-12);

        let mut tree = tree_of(&(1..=100).collect::<Vec<_>>());
        assert_approx_eq!(tree.mean(), 50.5, 1e-12);
    }

    #[test]
    fn test_mean_is_self_healing() {
        let mut tree = tree_of(&[5, 3, 8, 3, 1, -4, 20, 8, 8]);
        let before = keys_in_order(&tree);

        for _ in 0..5 {
            assert_approx_eq!(tree.mean(), 52.0 / 9.0, 1e-12);
        }

        assert_eq!(keys_in_order(&tree), before);
        assert_eq!(tree.min(), Some(-4));
        assert_eq!(tree.max(), Some(20));

        #[cfg(debug_assertions)]
        assert!(tree.verify_avl_invariants());
    }

    #[test]
    fn test_top_k_more_slots_than_distinct() {
        let tree = tree_of(&[4, 4, 6]);
        let top = tree.top_k(4, 2);
        assert_eq!(
            top[0],
            Some(KeyFrequency {
                key: 4,
                frequency: 2
            })
        );
        assert_eq!(
            top[1],
            Some(KeyFrequency {
                key: 6,
                frequency: 1
            })
        );
        assert_eq!(&top[2..], &[None, None]);
    }

    #[test]
    #[should_panic(expected = "frequency table capacity exceeded")]
    fn test_top_k_capacity_hint_too_small() {
        let tree = tree_of(&[1, 2, 3]);
        tree.top_k(1, 2);
    }

    #[test]
    fn test_reset() {
        let mut tree = tree_of(&[1, 2, 3]);
        tree.reset();
        assert!(tree.is_empty());
        assert_eq!(tree.min(), None);
        tree.insert(9);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.min(), Some(9));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_invariants_under_mixed_insertions() {
        let mut tree = AvlTree::with_capacity(64);
        for key in [50, 25, 75, 25, 12, 60, 90, 12, 12, 75, 1, 99, 50, 50] {
            tree.insert(key);
            assert!(tree.verify_avl_invariants());
        }
        assert_eq!(tree.len(), 14);
    }
}
