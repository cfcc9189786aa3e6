use alloc::vec::Vec;

use crate::frequency::{FrequencyTable, KeyFrequency};
use crate::multiset::OrderedMultiset;
use crate::{Kbn, NIL};

/// Red-Black tree node colors used to maintain tree balance properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Red node - cannot have a red child
    Red,
    /// Black node - contributes to black height
    Black,
}

/// A node in the Red-Black tree.
///
/// All edges are arena indices; [`NIL`] stands in for every absent child
/// and for the parent of the root, so no edge ever needs a null special
/// case. The parent link is a non-owning back-reference used only by the
/// upward fix-up walk.
#[derive(Debug, Clone)]
struct Node {
    /// The stored key
    key: i32,
    /// Color of this node, used for balancing
    color: Color,
    /// Index of the parent node, [`NIL`] for the root
    parent: usize,
    /// Index of the left child, [`NIL`] if absent
    left: usize,
    /// Index of the right child, [`NIL`] if absent
    right: usize,
}

/// Color-balanced ordered multiset.
///
/// The classic red-black properties hold after every insertion: the root
/// is black, no red node has a red child, and every path from a node down
/// to an absent edge passes the same number of black nodes. Together they
/// bound the height by `2 * log2(n + 1)`.
///
/// The contract is identical to [`crate::AvlTree`]: duplicate keys are
/// kept as separate nodes (equal keys descend right), nodes are never
/// freed individually, and min/max/mean/top-K answers match the AVL
/// engine's for the same insertion sequence.
#[derive(Debug, Clone)]
pub struct RbTree {
    /// Arena of nodes addressed by index
    nodes: Vec<Node>,
    /// Index of the root node, [`NIL`] when the tree is empty
    root: usize,
}

impl Default for RbTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RbTree {
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
    /// Nodes are created only by insertion and never freed, so the arena
    /// length is the key count.
    ///
    /// # Returns
    ///
    /// * `usize` - The number of stored keys
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree holds no keys.
    ///
    /// # Returns
    ///
    /// * `bool` - True if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Inserts a key, keeping duplicates as separate nodes.
    ///
    /// Descends to an absent edge (equal keys go right), links a red node
    /// there and restores the red-black properties with the insertion
    /// fix-up.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to insert
    pub fn insert(&mut self, key: i32) {
        let z = self.alloc(key);

        let mut parent = NIL;
        let mut current = self.root;
        while current != NIL {
            parent = current;
            current = if key < self.nodes[current].key {
                self.nodes[current].left
            } else {
                self.nodes[current].right
            };
        }

        self.nodes[z].parent = parent;
        if parent == NIL {
            self.root = z;
        } else if key < self.nodes[parent].key {
            self.nodes[parent].left = z;
        } else {
            self.nodes[parent].right = z;
        }

        self.fix_insertion_violations(z);

        #[cfg(debug_assertions)]
        debug_assert!(
            self.verify_rb_invariants(),
            "RB tree invariants violated after insertion"
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
    /// Same Morris in-order traversal as the AVL engine, with [`NIL`] as
    /// the absent marker at every comparison: predecessor `right` links
    /// are threaded to reach back up without a stack and unthreaded on the
    /// second arrival, leaving the tree structurally unchanged. Parent
    /// links and colors are never touched. Takes `&mut self` because of
    /// the transient rewiring.
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
                let mut pre = self.nodes[current].left;
                while self.nodes[pre].right != NIL && self.nodes[pre].right != current {
                    pre = self.nodes[pre].right;
                }

                if self.nodes[pre].right == NIL {
                    self.nodes[pre].right = current;
                    current = self.nodes[current].left;
                } else {
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
    /// Same two-phase algorithm and tie-break rule as the AVL engine; for
    /// the same multiset of inserted keys the two produce identical
    /// results.
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

    fn alloc(&mut self, key: i32) -> usize {
        self.nodes.push(Node {
            key,
            color: Color::Red,
            parent: NIL,
            left: NIL,
            right: NIL,
        });
        self.nodes.len() - 1
    }

    #[inline]
    fn get_color(&self, node: usize) -> Color {
        if node == NIL {
            Color::Black
        } else {
            self.nodes[node].color
        }
    }

    #[inline]
    fn set_color(&mut self, node: usize, color: Color) {
        if node != NIL {
            self.nodes[node].color = color;
        }
    }

    #[inline]
    fn is_red(&self, node: usize) -> bool {
        self.get_color(node) == Color::Red
    }

    #[inline]
    fn get_parent(&self, node: usize) -> usize {
        if node == NIL { NIL } else { self.nodes[node].parent }
    }

    #[inline]
    fn get_left(&self, node: usize) -> usize {
        if node == NIL { NIL } else { self.nodes[node].left }
    }

    #[inline]
    fn get_right(&self, node: usize) -> usize {
        if node == NIL { NIL } else { self.nodes[node].right }
    }

    /// Left rotation around `x`. Unlike the AVL rotation this repoints the
    /// rotated subtree's parent link and promotes the pivot to root when
    /// `x` had no parent.
    fn rotate_left(&mut self, x: usize) {
        if x == NIL {
            return;
        }
        let y = self.nodes[x].right;
        if y == NIL {
            return;
        }

        let y_left = self.nodes[y].left;
        self.nodes[x].right = y_left;
        if y_left != NIL {
            self.nodes[y_left].parent = x;
        }

        let x_parent = self.nodes[x].parent;
        self.nodes[y].parent = x_parent;

        if x_parent == NIL {
            self.root = y;
        } else if x == self.nodes[x_parent].left {
            self.nodes[x_parent].left = y;
        } else {
            self.nodes[x_parent].right = y;
        }

        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    /// Right rotation around `y`, mirror of [`RbTree::rotate_left`].
    fn rotate_right(&mut self, y: usize) {
        if y == NIL {
            return;
        }
        let x = self.nodes[y].left;
        if x == NIL {
            return;
        }

        let x_right = self.nodes[x].right;
        self.nodes[y].left = x_right;
        if x_right != NIL {
            self.nodes[x_right].parent = y;
        }

        let y_parent = self.nodes[y].parent;
        self.nodes[x].parent = y_parent;

        if y_parent == NIL {
            self.root = x;
        } else if y == self.nodes[y_parent].left {
            self.nodes[y_parent].left = x;
        } else {
            self.nodes[y_parent].right = x;
        }

        self.nodes[x].right = y;
        self.nodes[y].parent = x;
    }

    /// Restores the red-black properties after inserting the red node
    /// `node`.
    ///
    /// While the parent is red: a red uncle means recolor and push the
    /// violation up to the grandparent; a black uncle means straighten a
    /// zig-zag with a rotation at the parent, then recolor and rotate at
    /// the grandparent, which ends the loop. The root is forced black
    /// afterward.
    fn fix_insertion_violations(&mut self, mut node: usize) {
        while node != self.root && self.is_red(self.get_parent(node)) {
            let parent = self.get_parent(node);
            let grandparent = self.get_parent(parent);

            if parent == self.get_left(grandparent) {
                let uncle = self.get_right(grandparent);

                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    node = grandparent;
                } else {
                    if node == self.get_right(parent) {
                        node = parent;
                        self.rotate_left(node);
                    }
                    let updated_parent = self.get_parent(node);
                    let updated_grandparent = self.get_parent(updated_parent);
                    self.set_color(updated_parent, Color::Black);
                    self.set_color(updated_grandparent, Color::Red);
                    self.rotate_right(updated_grandparent);
                }
            } else {
                let uncle = self.get_left(grandparent);

                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    node = grandparent;
                } else {
                    if node == self.get_left(parent) {
                        node = parent;
                        self.rotate_right(node);
                    }
                    let updated_parent = self.get_parent(node);
                    let updated_grandparent = self.get_parent(updated_parent);
                    self.set_color(updated_parent, Color::Black);
                    self.set_color(updated_grandparent, Color::Red);
                    self.rotate_left(updated_grandparent);
                }
            }
        }
        self.set_color(self.root, Color::Black);
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
    fn verify_rb_invariants(&self) -> bool {
        if self.root == NIL {
            return true;
        }
        if self.is_red(self.root) {
            return false;
        }
        self.verify_black_height(self.root).is_some()
    }

    /// Returns the black-height of the subtree, or `None` when a red node
    /// has a red child or the black-heights of the two sides differ.
    #[cfg(debug_assertions)]
    fn verify_black_height(&self, node: usize) -> Option<usize> {
        if node == NIL {
            return Some(1);
        }

        let entry = &self.nodes[node];

        if self.is_red(node) && (self.is_red(entry.left) || self.is_red(entry.right)) {
            return None;
        }

        let left_height = self.verify_black_height(entry.left)?;
        let right_height = self.verify_black_height(entry.right)?;

        if left_height != right_height {
            return None;
        }

        if self.is_red(node) {
            Some(left_height)
        } else {
            Some(left_height + 1)
        }
    }
}

impl OrderedMultiset for RbTree {
    fn insert(&mut self, key: i32) {
        RbTree::insert(self, key);
    }

    fn len(&self) -> usize {
        RbTree::len(self)
    }

    fn min(&self) -> Option<i32> {
        RbTree::min(self)
    }

    fn max(&self) -> Option<i32> {
        RbTree::max(self)
    }

    fn mean(&mut self) -> f64 {
        RbTree::mean(self)
    }

    fn top_k(&self, k: usize, capacity_hint: usize) -> Vec<Option<KeyFrequency>> {
        RbTree::top_k(self, k, capacity_hint)
    }

    fn reset(&mut self) {
        RbTree::reset(self);
    }
}
