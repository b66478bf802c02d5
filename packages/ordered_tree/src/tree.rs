use std::fmt;
use std::marker::PhantomData;

use byte_pool::BytePool;

use crate::arena::NodeArena;
use crate::iter::{IntoIter, Iter, Range};
use crate::key_policy::PairFirst;
use crate::node::{Color, Node, NodeId};
use crate::{Compare, Identity, KeyExtract, Natural};

/// A red-black tree keyed through a pluggable extraction policy.
///
/// This is the ordered substrate behind map and set containers: values are
/// stored whole, a [`KeyExtract`] policy decides which part of each value is
/// the key, and a [`Compare`] comparator provides the strict weak ordering.
/// Unique-key and duplicate-key insertion coexist on the same type; the
/// wrapping container picks one discipline and sticks to it.
///
/// Nodes live in an arena and are addressed by stable [`NodeId`]s rather
/// than pointers; an id stays valid from insertion until that node's
/// removal, surviving any amount of rebalancing around it. The arena draws
/// node storage from a [`byte_pool::BytePool`] owned by the tree, one block
/// per node, so erase/insert cycles reuse the same few blocks.
///
/// After every mutation the tree upholds the red-black invariants: the root
/// is black, no red node has a red parent, every root-to-leaf path crosses
/// the same number of black nodes, and the cached minimum/maximum are
/// accurate. Lookups and mutations are O(log n); insertion needs at most
/// one rotation (plus recoloring), removal at most a bounded rotation pair.
///
/// # Example
///
/// ```rust
/// use ordered_tree::OrderedTree;
///
/// let mut tree = OrderedTree::<i32>::new();
///
/// let five = tree.insert_unique(5).unwrap();
/// tree.insert_unique(3).unwrap();
/// tree.insert_unique(8).unwrap();
///
/// // Duplicate keys are refused, reporting the existing position.
/// assert_eq!(tree.insert_unique(5), Err((five, 5)));
///
/// assert_eq!(tree.len(), 3);
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![3, 5, 8]);
/// ```
///
/// Map-flavored trees store pairs and key on the first element:
///
/// ```rust
/// use ordered_tree::MapTree;
///
/// let mut ages = MapTree::<String, u32>::new();
/// ages.insert_unique(("ada".to_string(), 36)).unwrap();
/// ages.insert_unique(("grace".to_string(), 85)).unwrap();
///
/// let id = ages.find(&"ada".to_string()).unwrap();
/// assert_eq!(ages.get(id).1, 36);
/// ```
pub struct OrderedTree<V, X = Identity, C = Natural>
where
    X: KeyExtract<V>,
    C: Compare<X::Key>,
{
    pub(crate) arena: NodeArena<V>,

    /// The top of the colored structure; NIL when the tree is empty.
    pub(crate) root: NodeId,

    /// Cached minimum, kept accurate across every mutation so iteration can
    /// start in O(1).
    pub(crate) leftmost: NodeId,

    /// Cached maximum, the mirror of `leftmost`.
    pub(crate) rightmost: NodeId,

    comparator: C,

    _policy: PhantomData<X>,
}

/// A set-flavored tree: the whole value is the key.
pub type SetTree<V, C = Natural> = OrderedTree<V, Identity, C>;

/// A map-flavored tree: values are `(key, mapped)` pairs keyed by the first
/// element.
pub type MapTree<K, M, C = Natural> = OrderedTree<(K, M), PairFirst, C>;

impl<V, X, C> OrderedTree<V, X, C>
where
    X: KeyExtract<V>,
    C: Compare<X::Key>,
{
    /// Creates an empty tree with the default comparator.
    #[must_use]
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::with_comparator(C::default())
    }

    /// Creates an empty tree ordered by the given comparator.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ordered_tree::{Compare, SetTree};
    ///
    /// #[derive(Clone, Debug, Default)]
    /// struct Reverse;
    ///
    /// impl Compare<i32> for Reverse {
    ///     fn less(&self, a: &i32, b: &i32) -> bool {
    ///         b < a
    ///     }
    /// }
    ///
    /// let mut tree = SetTree::with_comparator(Reverse);
    /// for value in [1, 2, 3] {
    ///     tree.insert_unique(value).unwrap();
    /// }
    ///
    /// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    /// ```
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            arena: NodeArena::new(BytePool::new()),
            root: NodeId::NIL,
            leftmost: NodeId::NIL,
            rightmost: NodeId::NIL,
            comparator,
            _policy: PhantomData,
        }
    }

    /// The number of values in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the tree holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the value stored at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not associated with a value in this tree.
    #[must_use]
    pub fn get(&self, id: NodeId) -> &V {
        &self.arena.node(id).value
    }

    /// Mutably borrows the value stored at `id`.
    ///
    /// Changing the part of the value the key policy extracts, such that its
    /// ordering relative to its neighbors changes, leaves the tree unsorted.
    /// That is a logic error - lookups may then miss values - but never a
    /// memory safety issue.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not associated with a value in this tree.
    #[must_use]
    pub fn get_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.arena.node_mut(id).value
    }

    /// The id of the minimum value, if any.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.leftmost.present()
    }

    /// The id of the maximum value, if any.
    #[must_use]
    pub fn last(&self) -> Option<NodeId> {
        self.rightmost.present()
    }

    /// The id holding the next value in comparator order, if any.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not associated with a value in this tree.
    #[must_use]
    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        let right = self.arena.node(id).right;
        if !right.is_nil() {
            return Some(self.subtree_min(right));
        }

        let mut cur = id;
        let mut parent = self.arena.node(cur).parent;
        while !parent.is_nil() && cur == self.arena.node(parent).right {
            cur = parent;
            parent = self.arena.node(cur).parent;
        }
        parent.present()
    }

    /// The id holding the previous value in comparator order, if any.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not associated with a value in this tree.
    #[must_use]
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        let left = self.arena.node(id).left;
        if !left.is_nil() {
            return Some(self.subtree_max(left));
        }

        let mut cur = id;
        let mut parent = self.arena.node(cur).parent;
        while !parent.is_nil() && cur == self.arena.node(parent).left {
            cur = parent;
            parent = self.arena.node(cur).parent;
        }
        parent.present()
    }

    /// Finds a value whose key is equivalent to `key`.
    ///
    /// With duplicate keys present this is the first of them in iteration
    /// order.
    #[must_use]
    pub fn find(&self, key: &X::Key) -> Option<NodeId> {
        let candidate = self.lower_bound(key)?;
        if self.less(key, self.key_of(candidate)) {
            None
        } else {
            Some(candidate)
        }
    }

    /// Whether any stored value's key is equivalent to `key`.
    #[must_use]
    pub fn contains(&self, key: &X::Key) -> bool {
        self.find(key).is_some()
    }

    /// The first value whose key does not order before `key`, if any.
    #[must_use]
    pub fn lower_bound(&self, key: &X::Key) -> Option<NodeId> {
        let mut result = NodeId::NIL;
        let mut cur = self.root;

        while !cur.is_nil() {
            if self.less(self.key_of(cur), key) {
                cur = self.arena.node(cur).right;
            } else {
                result = cur;
                cur = self.arena.node(cur).left;
            }
        }

        result.present()
    }

    /// The first value whose key orders strictly after `key`, if any.
    #[must_use]
    pub fn upper_bound(&self, key: &X::Key) -> Option<NodeId> {
        let mut result = NodeId::NIL;
        let mut cur = self.root;

        while !cur.is_nil() {
            if self.less(key, self.key_of(cur)) {
                result = cur;
                cur = self.arena.node(cur).left;
            } else {
                cur = self.arena.node(cur).right;
            }
        }

        result.present()
    }

    /// Iterates over every value whose key is equivalent to `key`.
    ///
    /// On a uniquely keyed tree the range holds at most one value; with
    /// duplicates it spans `[lower_bound, upper_bound)`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ordered_tree::OrderedTree;
    ///
    /// let mut tree = OrderedTree::<i32>::new();
    /// for value in [3, 5, 5, 5, 8] {
    ///     tree.insert_multi(value);
    /// }
    ///
    /// assert_eq!(tree.equal_range(&5).count(), 3);
    /// assert_eq!(tree.equal_range(&4).count(), 0);
    /// ```
    #[must_use]
    pub fn equal_range(&self, key: &X::Key) -> Range<'_, V, X, C> {
        let front = self.lower_bound(key).unwrap_or(NodeId::NIL);
        let end = self.upper_bound(key).unwrap_or(NodeId::NIL);
        Range::new(self, front, end)
    }

    /// Inserts a value whose key must not already be present.
    ///
    /// # Errors
    ///
    /// If an equivalent key already exists, nothing is inserted and the
    /// error carries the existing value's id together with the rejected
    /// value, so the caller can inspect or recycle either.
    pub fn insert_unique(&mut self, value: V) -> Result<NodeId, (NodeId, V)> {
        let mut parent = NodeId::NIL;
        let mut cur = self.root;
        let mut go_left = true;

        while !cur.is_nil() {
            parent = cur;
            go_left = self.less(X::key(&value), self.key_of(cur));
            cur = if go_left {
                self.arena.node(cur).left
            } else {
                self.arena.node(cur).right
            };
        }

        // The new value would hang off `parent` on the `go_left` side. The
        // only node that can carry an equivalent key is the in-order
        // predecessor of that position.
        let candidate = if go_left {
            if parent.is_nil() || parent == self.leftmost {
                NodeId::NIL
            } else {
                self.predecessor(parent)
                    .expect("parent is not the leftmost node, so it has a predecessor")
            }
        } else {
            parent
        };

        if !candidate.is_nil() && !self.less(self.key_of(candidate), X::key(&value)) {
            // The predecessor does not order before the value either, so the
            // two keys are equivalent.
            return Err((candidate, value));
        }

        Ok(self.attach(parent, go_left, value))
    }

    /// Inserts a value, allowing duplicate keys.
    ///
    /// A new duplicate is placed after its equals in iteration order.
    pub fn insert_multi(&mut self, value: V) -> NodeId {
        let mut parent = NodeId::NIL;
        let mut cur = self.root;
        let mut go_left = true;

        while !cur.is_nil() {
            parent = cur;
            go_left = self.less(X::key(&value), self.key_of(cur));
            cur = if go_left {
                self.arena.node(cur).left
            } else {
                self.arena.node(cur).right
            };
        }

        self.attach(parent, go_left, value)
    }

    /// Like [`insert_unique`][Self::insert_unique], but tries the
    /// caller-supplied position first.
    ///
    /// `hint` is the id the new value would directly precede (`None` hints
    /// "after everything"). When the hint is right, insertion touches only
    /// the hint's neighborhood - O(1) amortized instead of a full descent;
    /// when it is wrong, this falls back to the ordinary insert.
    ///
    /// # Errors
    ///
    /// Same contract as [`insert_unique`][Self::insert_unique].
    pub fn insert_unique_hint(
        &mut self,
        hint: Option<NodeId>,
        value: V,
    ) -> Result<NodeId, (NodeId, V)> {
        let Some(pos) = hint else {
            // "After everything": valid when the value outranks the maximum.
            if !self.rightmost.is_nil() && self.less(self.key_of(self.rightmost), X::key(&value)) {
                return Ok(self.attach(self.rightmost, false, value));
            }
            return self.insert_unique(value);
        };

        if self.less(X::key(&value), self.key_of(pos)) {
            if pos == self.leftmost {
                return Ok(self.attach(pos, true, value));
            }

            let before = self
                .predecessor(pos)
                .expect("pos is not the leftmost node, so it has a predecessor");
            if self.less(self.key_of(before), X::key(&value)) {
                // The value fits between `before` and `pos`; one of the two
                // adjacent link slots is necessarily open.
                if self.arena.node(before).right.is_nil() {
                    return Ok(self.attach(before, false, value));
                }
                return Ok(self.attach(pos, true, value));
            }

            return self.insert_unique(value);
        }

        if self.less(self.key_of(pos), X::key(&value)) {
            if pos == self.rightmost {
                return Ok(self.attach(pos, false, value));
            }

            let after = self
                .successor(pos)
                .expect("pos is not the rightmost node, so it has a successor");
            if self.less(X::key(&value), self.key_of(after)) {
                if self.arena.node(pos).right.is_nil() {
                    return Ok(self.attach(pos, false, value));
                }
                return Ok(self.attach(after, true, value));
            }

            return self.insert_unique(value);
        }

        Err((pos, value))
    }

    /// Like [`insert_multi`][Self::insert_multi], but tries the
    /// caller-supplied position first; see
    /// [`insert_unique_hint`][Self::insert_unique_hint] for the hint
    /// contract.
    pub fn insert_multi_hint(&mut self, hint: Option<NodeId>, value: V) -> NodeId {
        let Some(pos) = hint else {
            if !self.rightmost.is_nil() && !self.less(X::key(&value), self.key_of(self.rightmost)) {
                return self.attach(self.rightmost, false, value);
            }
            return self.insert_multi(value);
        };

        if !self.less(self.key_of(pos), X::key(&value)) {
            // value <= pos
            if pos == self.leftmost {
                return self.attach(pos, true, value);
            }

            let before = self
                .predecessor(pos)
                .expect("pos is not the leftmost node, so it has a predecessor");
            if !self.less(X::key(&value), self.key_of(before)) {
                // before <= value <= pos
                if self.arena.node(before).right.is_nil() {
                    return self.attach(before, false, value);
                }
                return self.attach(pos, true, value);
            }

            return self.insert_multi(value);
        }

        // value > pos
        if pos == self.rightmost {
            return self.attach(pos, false, value);
        }

        let after = self
            .successor(pos)
            .expect("pos is not the rightmost node, so it has a successor");
        if !self.less(self.key_of(after), X::key(&value)) {
            if self.arena.node(pos).right.is_nil() {
                return self.attach(pos, false, value);
            }
            return self.attach(after, true, value);
        }

        self.insert_multi(value)
    }

    /// Removes the value at `id` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not associated with a value in this tree.
    pub fn remove(&mut self, id: NodeId) -> V {
        self.detach(id);
        self.arena.remove(id).value
    }

    /// Removes the value with a key equivalent to `key`, if present.
    ///
    /// On a tree populated through [`insert_multi`][Self::insert_multi] this
    /// removes only the first equivalent value; use
    /// [`remove_multi`][Self::remove_multi] to remove them all.
    pub fn remove_unique(&mut self, key: &X::Key) -> Option<V> {
        let id = self.find(key)?;
        Some(self.remove(id))
    }

    /// Removes every value whose key is equivalent to `key`, returning how
    /// many were removed.
    pub fn remove_multi(&mut self, key: &X::Key) -> usize {
        // Ids are stable, so the whole range can be gathered first and
        // removed afterwards without invalidation concerns.
        let mut ids = Vec::new();
        let mut cur = self.lower_bound(key);
        let end = self.upper_bound(key);
        while cur != end {
            let id = cur.expect("the range end has not been reached, so a node remains");
            ids.push(id);
            cur = self.successor(id);
        }

        for id in &ids {
            drop(self.remove(*id));
        }

        ids.len()
    }

    /// Removes every value.
    ///
    /// Node blocks return to the tree's pool, so refilling the tree
    /// afterwards does not go back to the system allocator.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = NodeId::NIL;
        self.leftmost = NodeId::NIL;
        self.rightmost = NodeId::NIL;
    }

    /// Iterates over the values in comparator order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, V, X, C> {
        Iter::new(self)
    }

    pub(crate) fn key_of(&self, id: NodeId) -> &X::Key {
        X::key(&self.arena.node(id).value)
    }

    pub(crate) fn less(&self, a: &X::Key, b: &X::Key) -> bool {
        self.comparator.less(a, b)
    }

    pub(crate) fn value(&self, id: NodeId) -> &V {
        &self.arena.node(id).value
    }

    /// The minimum of the subtree rooted at `id` (which must not be NIL).
    pub(crate) fn subtree_min(&self, mut id: NodeId) -> NodeId {
        loop {
            let left = self.arena.node(id).left;
            if left.is_nil() {
                return id;
            }
            id = left;
        }
    }

    /// The maximum of the subtree rooted at `id` (which must not be NIL).
    pub(crate) fn subtree_max(&self, mut id: NodeId) -> NodeId {
        loop {
            let right = self.arena.node(id).right;
            if right.is_nil() {
                return id;
            }
            id = right;
        }
    }

    /// Links a fresh red node under `parent` on the `go_left` side (or as
    /// the root), updates the min/max caches and restores the coloring
    /// invariants.
    fn attach(&mut self, parent: NodeId, go_left: bool, value: V) -> NodeId {
        let id = self.arena.insert(Node {
            parent,
            left: NodeId::NIL,
            right: NodeId::NIL,
            color: Color::Red,
            value,
        });

        if parent.is_nil() {
            self.root = id;
            self.leftmost = id;
            self.rightmost = id;
        } else if go_left {
            self.arena.node_mut(parent).left = id;
            if parent == self.leftmost {
                self.leftmost = id;
            }
        } else {
            self.arena.node_mut(parent).right = id;
            if parent == self.rightmost {
                self.rightmost = id;
            }
        }

        self.insert_rebalance(id);
        id
    }
}

impl<V, X, C> Default for OrderedTree<V, X, C>
where
    X: KeyExtract<V>,
    C: Compare<X::Key> + Default,
{
    /// Creates an empty tree with the default comparator.
    fn default() -> Self {
        Self::new()
    }
}

impl<V, X, C> Clone for OrderedTree<V, X, C>
where
    V: Clone,
    X: KeyExtract<V>,
    C: Compare<X::Key> + Clone,
{
    /// Structurally deep-copies the tree, preserving shape and colors.
    ///
    /// If cloning a value panics partway through, the half-built copy is
    /// dropped on unwind, releasing every node cloned so far; the source
    /// tree is untouched either way.
    fn clone(&self) -> Self {
        let mut copy = Self::with_comparator(self.comparator.clone());

        if !self.root.is_nil() {
            let root = copy.clone_subtree(self, self.root, NodeId::NIL);
            copy.root = root;
            copy.leftmost = copy.subtree_min(root);
            copy.rightmost = copy.subtree_max(root);
        }

        copy
    }
}

impl<V, X, C> OrderedTree<V, X, C>
where
    V: Clone,
    X: KeyExtract<V>,
    C: Compare<X::Key>,
{
    /// Clones `source`'s subtree rooted at `source_id` into `self`,
    /// pre-order, returning the copy's root id. Recursion depth is bounded
    /// by the source's height, which the coloring invariant keeps
    /// logarithmic.
    fn clone_subtree(&mut self, source: &Self, source_id: NodeId, parent: NodeId) -> NodeId {
        let source_node = source.arena.node(source_id);
        let (left, right, color) = (source_node.left, source_node.right, source_node.color);

        let id = self.arena.insert(Node {
            parent,
            left: NodeId::NIL,
            right: NodeId::NIL,
            color,
            value: source_node.value.clone(),
        });

        if !left.is_nil() {
            let copied = self.clone_subtree(source, left, id);
            self.arena.node_mut(id).left = copied;
        }
        if !right.is_nil() {
            let copied = self.clone_subtree(source, right, id);
            self.arena.node_mut(id).right = copied;
        }

        id
    }
}

impl<V, X, C> fmt::Debug for OrderedTree<V, X, C>
where
    V: fmt::Debug,
    X: KeyExtract<V>,
    C: Compare<X::Key>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'t, V, X, C> IntoIterator for &'t OrderedTree<V, X, C>
where
    X: KeyExtract<V>,
    C: Compare<X::Key>,
{
    type Item = &'t V;
    type IntoIter = Iter<'t, V, X, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, X, C> IntoIterator for OrderedTree<V, X, C>
where
    X: KeyExtract<V>,
    C: Compare<X::Key>,
{
    type Item = V;
    type IntoIter = IntoIter<V, X, C>;

    /// Consumes the tree, yielding its values in comparator order.
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

#[cfg(test)]
impl<V, X, C> OrderedTree<V, X, C>
where
    X: KeyExtract<V>,
    C: Compare<X::Key>,
{
    /// Asserts every structural invariant the tree promises to uphold.
    pub(crate) fn check_invariants(&self) {
        self.arena.integrity_check();

        if self.root.is_nil() {
            assert!(self.leftmost.is_nil(), "empty tree caches a leftmost node");
            assert!(
                self.rightmost.is_nil(),
                "empty tree caches a rightmost node"
            );
            assert_eq!(self.len(), 0);
            return;
        }

        assert!(
            self.arena.node(self.root).parent.is_nil(),
            "root has a parent"
        );
        assert_eq!(
            self.arena.node(self.root).color,
            Color::Black,
            "root is not black"
        );
        assert_eq!(
            self.leftmost,
            self.subtree_min(self.root),
            "leftmost cache is stale"
        );
        assert_eq!(
            self.rightmost,
            self.subtree_max(self.root),
            "rightmost cache is stale"
        );

        let (count, _) = self.check_subtree(self.root);
        assert_eq!(count, self.len(), "node count does not match len");

        let mut prev: Option<NodeId> = None;
        let mut cur = self.first();
        while let Some(id) = cur {
            if let Some(previous) = prev {
                assert!(
                    !self.less(self.key_of(id), self.key_of(previous)),
                    "in-order traversal is not sorted"
                );
            }
            prev = Some(id);
            cur = self.successor(id);
        }
    }

    /// Returns (node count, black height) of the subtree, asserting the
    /// red-black and parent-link invariants along the way.
    fn check_subtree(&self, id: NodeId) -> (usize, usize) {
        if id.is_nil() {
            return (0, 1);
        }

        let node = self.arena.node(id);

        if node.color == Color::Red {
            assert!(
                !self.is_red(node.parent),
                "red node {id:?} has a red parent"
            );
        }
        if !node.left.is_nil() {
            assert_eq!(
                self.arena.node(node.left).parent,
                id,
                "left child's parent link is wrong"
            );
        }
        if !node.right.is_nil() {
            assert_eq!(
                self.arena.node(node.right).parent,
                id,
                "right child's parent link is wrong"
            );
        }

        let (left_count, left_black) = self.check_subtree(node.left);
        let (right_count, right_black) = self.check_subtree(node.right);
        assert_eq!(
            left_black, right_black,
            "black heights differ under {id:?}"
        );

        let own_black = if node.color == Color::Black { 1 } else { 0 };
        (left_count + right_count + 1, left_black + own_black)
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::collections::BTreeSet;
    use std::fmt::Debug;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::MapTree;

    assert_impl_all!(OrderedTree<u32>: Send, Debug, Default);

    #[test]
    fn smoke_test() {
        let mut tree = OrderedTree::<u32>::new();

        assert!(tree.is_empty());

        let a = tree.insert_unique(42).unwrap();
        let b = tree.insert_unique(7).unwrap();
        let c = tree.insert_unique(100).unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(a), &42);
        assert_eq!(tree.get(b), &7);
        assert_eq!(tree.get(c), &100);

        assert_eq!(tree.remove(b), 7);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.find(&7), None);

        tree.check_invariants();
    }

    #[test]
    fn scripted_insertions_keep_the_invariants() {
        // After each insertion the coloring invariants must hold, and the
        // final traversal must be sorted.
        let mut tree = OrderedTree::<i32>::new();

        for key in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert_unique(key).unwrap();
            tree.check_invariants();
        }

        assert_eq!(
            tree.iter().copied().collect::<Vec<_>>(),
            vec![1, 3, 4, 5, 7, 8, 9]
        );
    }

    #[test]
    fn duplicate_unique_insert_is_refused() {
        let mut tree = OrderedTree::<i32>::new();

        let five = tree.insert_unique(5).unwrap();
        tree.insert_unique(3).unwrap();

        let (existing, rejected) = tree.insert_unique(5).unwrap_err();
        assert_eq!(existing, five);
        assert_eq!(rejected, 5);
        assert_eq!(tree.len(), 2, "a refused insert must not change the size");

        tree.check_invariants();
    }

    #[test]
    fn multi_insert_accepts_duplicates() {
        let mut tree = OrderedTree::<i32>::new();

        for key in [5, 5, 3, 5, 9, 3] {
            _ = tree.insert_multi(key);
            tree.check_invariants();
        }

        assert_eq!(tree.len(), 6);
        assert_eq!(
            tree.iter().copied().collect::<Vec<_>>(),
            vec![3, 3, 5, 5, 5, 9]
        );
        assert_eq!(tree.equal_range(&5).count(), 3);
        assert_eq!(tree.equal_range(&3).count(), 2);
        assert_eq!(tree.equal_range(&4).count(), 0);
    }

    #[test]
    fn bounds_match_the_reference_semantics() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [10, 20, 30, 40] {
            tree.insert_unique(key).unwrap();
        }

        // lower_bound: first key not less than the probe.
        assert_eq!(tree.get(tree.lower_bound(&20).unwrap()), &20);
        assert_eq!(tree.get(tree.lower_bound(&25).unwrap()), &30);
        assert_eq!(tree.lower_bound(&41), None);

        // upper_bound: first key strictly greater than the probe.
        assert_eq!(tree.get(tree.upper_bound(&20).unwrap()), &30);
        assert_eq!(tree.get(tree.upper_bound(&5).unwrap()), &10);
        assert_eq!(tree.upper_bound(&40), None);
    }

    #[test]
    fn removal_keeps_the_invariants() {
        let mut tree = OrderedTree::<i32>::new();
        let keys = [50, 30, 70, 20, 40, 60, 80, 10, 25, 35, 45];
        for key in keys {
            tree.insert_unique(key).unwrap();
        }

        for key in [30, 10, 80, 50, 25] {
            assert_eq!(tree.remove_unique(&key), Some(key));
            tree.check_invariants();
        }

        assert_eq!(tree.remove_unique(&10), None);
        assert_eq!(tree.len(), keys.len() - 5);
    }

    #[test]
    fn removing_the_minimum_relinks_the_cache() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [5, 3, 8, 1, 9] {
            tree.insert_unique(key).unwrap();
        }

        let mut expected = vec![1, 3, 5, 8, 9];
        while let Some(first) = tree.first() {
            assert_eq!(tree.get(first), &expected[0]);
            drop(tree.remove(first));
            expected.remove(0);
            tree.check_invariants();
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn removing_the_maximum_relinks_the_cache() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [5, 3, 8, 1, 9] {
            tree.insert_unique(key).unwrap();
        }

        let mut expected = vec![1, 3, 5, 8, 9];
        while let Some(last) = tree.last() {
            assert_eq!(tree.get(last), expected.last().unwrap());
            drop(tree.remove(last));
            expected.pop();
            tree.check_invariants();
        }
    }

    #[test]
    fn hinted_insert_with_correct_hint() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [10, 20, 30] {
            tree.insert_unique(key).unwrap();
        }

        // 25 directly precedes 30.
        let thirty = tree.find(&30).unwrap();
        let id = tree.insert_unique_hint(Some(thirty), 25).unwrap();
        assert_eq!(tree.get(id), &25);
        tree.check_invariants();

        // "After everything" hint for an ascending append.
        let id = tree.insert_unique_hint(None, 40).unwrap();
        assert_eq!(tree.get(id), &40);
        tree.check_invariants();

        assert_eq!(
            tree.iter().copied().collect::<Vec<_>>(),
            vec![10, 20, 25, 30, 40]
        );
    }

    #[test]
    fn hinted_insert_with_wrong_hint_falls_back() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [10, 20, 30] {
            tree.insert_unique(key).unwrap();
        }

        // Hinting at 10 for a value that belongs at the end is simply slow,
        // never wrong.
        let ten = tree.find(&10).unwrap();
        tree.insert_unique_hint(Some(ten), 99).unwrap();
        tree.check_invariants();

        assert_eq!(
            tree.iter().copied().collect::<Vec<_>>(),
            vec![10, 20, 30, 99]
        );
    }

    #[test]
    fn hinted_insert_detects_duplicates() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [10, 20, 30] {
            tree.insert_unique(key).unwrap();
        }

        let twenty = tree.find(&20).unwrap();
        assert_eq!(
            tree.insert_unique_hint(Some(twenty), 20),
            Err((twenty, 20))
        );
        assert_eq!(tree.insert_unique_hint(None, 30).unwrap_err().1, 30);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn hinted_multi_insert_keeps_duplicates_adjacent() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [10, 20, 30] {
            _ = tree.insert_multi(key);
        }

        let twenty = tree.find(&20).unwrap();
        _ = tree.insert_multi_hint(Some(twenty), 20);
        _ = tree.insert_multi_hint(None, 30);
        tree.check_invariants();

        assert_eq!(
            tree.iter().copied().collect::<Vec<_>>(),
            vec![10, 20, 20, 30, 30]
        );
    }

    #[test]
    fn ascending_append_via_end_hint() {
        // The classic use of hints: building a tree from sorted input with
        // an end hint, each insertion landing at the rightmost edge.
        let mut tree = OrderedTree::<u32>::new();

        for key in 0..1000 {
            tree.insert_unique_hint(None, key).unwrap();
        }

        tree.check_invariants();
        assert_eq!(tree.len(), 1000);
        assert!(tree.iter().copied().eq(0..1000));
    }

    #[test]
    fn remove_multi_removes_the_whole_range() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [1, 5, 5, 5, 9] {
            _ = tree.insert_multi(key);
        }

        assert_eq!(tree.remove_multi(&5), 3);
        assert_eq!(tree.remove_multi(&5), 0);
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 9]);
        tree.check_invariants();
    }

    #[test]
    fn randomized_against_model() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut tree = OrderedTree::<u32>::new();
        let mut model = BTreeSet::new();

        for round in 0..2000 {
            let key = rng.random_range(0..500_u32);
            if rng.random_bool(0.6) {
                assert_eq!(tree.insert_unique(key).is_ok(), model.insert(key));
            } else {
                assert_eq!(tree.remove_unique(&key).is_some(), model.remove(&key));
            }

            if round % 97 == 0 {
                tree.check_invariants();
                assert!(tree.iter().copied().eq(model.iter().copied()));
            }
        }

        tree.check_invariants();
        assert_eq!(tree.len(), model.len());
        assert!(tree.iter().copied().eq(model.iter().copied()));
    }

    #[test]
    fn randomized_multi_against_model() {
        let mut rng = StdRng::seed_from_u64(0xfeed);
        let mut tree = OrderedTree::<u32>::new();
        let mut model: Vec<u32> = Vec::new();

        for _ in 0..1000 {
            let key = rng.random_range(0..50_u32);
            if rng.random_bool(0.7) {
                _ = tree.insert_multi(key);
                let at = model.partition_point(|existing| *existing <= key);
                model.insert(at, key);
            } else {
                let removed = tree.remove_multi(&key);
                let before = model.len();
                model.retain(|existing| *existing != key);
                assert_eq!(removed, before - model.len());
            }
        }

        tree.check_invariants();
        assert!(tree.iter().copied().eq(model.iter().copied()));
    }

    #[test]
    fn clone_is_deep_and_preserves_shape() {
        let mut tree = OrderedTree::<u32>::new();
        for key in 0..100 {
            tree.insert_unique(key * 3).unwrap();
        }

        let copy = tree.clone();
        copy.check_invariants();
        assert!(copy.iter().eq(tree.iter()));

        // Mutating the original leaves the copy alone.
        drop(tree.remove_unique(&0));
        assert_eq!(copy.len(), 100);
        assert!(copy.contains(&0));
    }

    #[test]
    fn map_flavor_keys_on_the_first_element() {
        let mut ages = MapTree::<String, u32>::new();

        ages.insert_unique(("ada".to_string(), 36)).unwrap();
        ages.insert_unique(("grace".to_string(), 85)).unwrap();

        // Same key, different mapped value: still a duplicate.
        assert!(ages.insert_unique(("ada".to_string(), 99)).is_err());

        let id = ages.find(&"grace".to_string()).unwrap();
        ages.get_mut(id).1 = 86;
        assert_eq!(ages.get(id).1, 86);

        let names: Vec<&str> = ages.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["ada", "grace"]);
    }

    #[test]
    fn node_blocks_return_to_the_pool() {
        let mut tree = OrderedTree::<u64>::new();

        for key in 0..100 {
            tree.insert_unique(key).unwrap();
        }
        assert_eq!(tree.arena.pool().live_block_count(), 100);

        for key in 0..100 {
            drop(tree.remove_unique(&key));
        }
        assert_eq!(tree.arena.pool().live_block_count(), 0);

        // Refilling reuses the freed blocks; the pool does not grow.
        let chunks = tree.arena.pool().chunk_count();
        for key in 0..100 {
            tree.insert_unique(key).unwrap();
        }
        assert_eq!(tree.arena.pool().chunk_count(), chunks);
    }

    #[test]
    fn clear_empties_and_remains_usable() {
        let mut tree = OrderedTree::<u32>::new();
        for key in 0..50 {
            tree.insert_unique(key).unwrap();
        }

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.first(), None);
        tree.check_invariants();

        tree.insert_unique(7).unwrap();
        assert_eq!(tree.len(), 1);
        tree.check_invariants();
    }

    #[test]
    fn into_iter_drains_in_order() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [5, 1, 4, 2, 3] {
            tree.insert_unique(key).unwrap();
        }

        assert_eq!(tree.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    #[should_panic]
    fn stale_id_access_panics() {
        let mut tree = OrderedTree::<i32>::new();
        let id = tree.insert_unique(1).unwrap();
        drop(tree.remove(id));
        _ = tree.get(id);
    }

    #[test]
    fn debug_output_lists_values_in_order() {
        let mut tree = OrderedTree::<i32>::new();
        for key in [2, 1, 3] {
            tree.insert_unique(key).unwrap();
        }

        assert_eq!(format!("{tree:?}"), "{1, 2, 3}");
    }
}
