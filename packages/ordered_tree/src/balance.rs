//! The rebalancing machinery: rotations plus the after-insert and
//! after-remove repair walks.
//!
//! Everything here manipulates link indices only; values never move. NIL
//! counts as black everywhere, which is what lets the case analysis treat
//! missing children and black children uniformly.

use crate::node::{Color, NodeId};
use crate::tree::OrderedTree;
use crate::{Compare, KeyExtract};

impl<V, X, C> OrderedTree<V, X, C>
where
    X: KeyExtract<V>,
    C: Compare<X::Key>,
{
    fn left_of(&self, id: NodeId) -> NodeId {
        self.arena.node(id).left
    }

    fn right_of(&self, id: NodeId) -> NodeId {
        self.arena.node(id).right
    }

    fn parent_of(&self, id: NodeId) -> NodeId {
        self.arena.node(id).parent
    }

    fn color_of(&self, id: NodeId) -> Color {
        self.arena.node(id).color
    }

    /// NIL is black.
    pub(crate) fn is_red(&self, id: NodeId) -> bool {
        !id.is_nil() && self.arena.node(id).color == Color::Red
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        self.arena.node_mut(id).color = color;
    }

    /// Whether `id` hangs off its parent's left link. Only meaningful below
    /// the root.
    fn is_left_child(&self, id: NodeId) -> bool {
        id == self.left_of(self.parent_of(id))
    }

    /*---------------------------------------*\
    |       p                         p       |
    |      / \                       / \      |
    |     x   d    rotate left      y   d     |
    |    / \       ===========>    / \        |
    |   a   y                     x   c       |
    |      / \                   / \          |
    |     b   c                 a   b         |
    \*---------------------------------------*/
    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right_of(x);
        let y_left = self.left_of(y);

        self.arena.node_mut(x).right = y_left;
        if !y_left.is_nil() {
            self.arena.node_mut(y_left).parent = x;
        }

        let x_parent = self.parent_of(x);
        self.arena.node_mut(y).parent = x_parent;

        if x == self.root {
            self.root = y;
        } else if self.is_left_child(x) {
            self.arena.node_mut(x_parent).left = y;
        } else {
            self.arena.node_mut(x_parent).right = y;
        }

        self.arena.node_mut(y).left = x;
        self.arena.node_mut(x).parent = y;
    }

    /*----------------------------------------*\
    |     p                         p          |
    |    / \                       / \         |
    |   d   x      rotate right   d   y        |
    |      / \     ===========>      / \       |
    |     y   a                     b   x      |
    |    / \                           / \     |
    |   b   c                         c   a    |
    \*----------------------------------------*/
    fn rotate_right(&mut self, x: NodeId) {
        let y = self.left_of(x);
        let y_right = self.right_of(y);

        self.arena.node_mut(x).left = y_right;
        if !y_right.is_nil() {
            self.arena.node_mut(y_right).parent = x;
        }

        let x_parent = self.parent_of(x);
        self.arena.node_mut(y).parent = x_parent;

        if x == self.root {
            self.root = y;
        } else if self.is_left_child(x) {
            self.arena.node_mut(x_parent).left = y;
        } else {
            self.arena.node_mut(x_parent).right = y;
        }

        self.arena.node_mut(y).right = x;
        self.arena.node_mut(x).parent = y;
    }

    /// Restores the coloring invariants after `x` was linked in as a leaf.
    ///
    /// Case analysis while the parent is red, by the uncle's color:
    /// both parent and uncle red - recolor them black and the grandparent
    /// red, continue from the grandparent; uncle black or absent - rotate an
    /// "inner" grandchild into the "outer" shape if needed, then recolor and
    /// rotate at the grandparent, which terminates. The root ends black
    /// regardless.
    pub(crate) fn insert_rebalance(&mut self, mut x: NodeId) {
        self.set_color(x, Color::Red);

        while x != self.root && self.is_red(self.parent_of(x)) {
            let parent = self.parent_of(x);
            // The parent is red, so it is not the root and the grandparent
            // exists.
            let grand = self.parent_of(parent);

            if self.is_left_child(parent) {
                let uncle = self.right_of(grand);
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    x = grand;
                } else {
                    if !self.is_left_child(x) {
                        // Inner grandchild: rotate it outward first.
                        x = parent;
                        self.rotate_left(x);
                    }
                    let parent = self.parent_of(x);
                    let grand = self.parent_of(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_right(grand);
                    break;
                }
            } else {
                let uncle = self.left_of(grand);
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    x = grand;
                } else {
                    if self.is_left_child(x) {
                        x = parent;
                        self.rotate_right(x);
                    }
                    let parent = self.parent_of(x);
                    let grand = self.parent_of(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_left(grand);
                    break;
                }
            }
        }

        self.set_color(self.root, Color::Black);
    }

    /// Unlinks `z` from the structure, rebalancing and re-aiming the min/max
    /// caches as needed. The caller releases the node itself afterwards.
    ///
    /// With two children, `z`'s in-order successor `y` is relocated into
    /// `z`'s position (links and color taken over, value untouched), so the
    /// position physically vacated is the successor's old one; with at most
    /// one child, `z`'s child `x` (possibly NIL) replaces it directly. If
    /// the vacated position was black, the repair walk below restores the
    /// black-height invariant.
    pub(crate) fn detach(&mut self, z: NodeId) {
        let y = if self.left_of(z).is_nil() || self.right_of(z).is_nil() {
            z
        } else {
            self.subtree_min(self.right_of(z))
        };

        // The node that moves into the vacated position, or NIL.
        let x = if !self.left_of(y).is_nil() {
            self.left_of(y)
        } else {
            self.right_of(y)
        };

        // Parent of the vacated position once the unlink is done.
        let mut xp;

        if y != z {
            // z has two children; y is the minimum of its right subtree.
            let z_left = self.left_of(z);
            self.arena.node_mut(z_left).parent = y;
            self.arena.node_mut(y).left = z_left;

            if y == self.right_of(z) {
                xp = y;
            } else {
                xp = self.parent_of(y);
                if !x.is_nil() {
                    self.arena.node_mut(x).parent = xp;
                }
                // y is its parent's left child (it is a subtree minimum).
                self.arena.node_mut(xp).left = x;

                let z_right = self.right_of(z);
                self.arena.node_mut(y).right = z_right;
                self.arena.node_mut(z_right).parent = y;
            }

            let z_parent = self.parent_of(z);
            if self.root == z {
                self.root = y;
            } else if self.is_left_child(z) {
                self.arena.node_mut(z_parent).left = y;
            } else {
                self.arena.node_mut(z_parent).right = y;
            }
            self.arena.node_mut(y).parent = z_parent;

            // y takes over z's color; z keeps y's old color, which is the
            // color of the position that was physically vacated.
            let y_color = self.color_of(y);
            let z_color = self.color_of(z);
            self.set_color(y, z_color);
            self.set_color(z, y_color);
        } else {
            // z has at most one child; x replaces it directly.
            xp = self.parent_of(z);
            if !x.is_nil() {
                self.arena.node_mut(x).parent = xp;
            }

            if self.root == z {
                self.root = x;
            } else if self.is_left_child(z) {
                self.arena.node_mut(xp).left = x;
            } else {
                self.arena.node_mut(xp).right = x;
            }

            // Only this branch can remove the minimum or maximum: a cached
            // extreme with two children is impossible.
            if self.leftmost == z {
                self.leftmost = if x.is_nil() { xp } else { self.subtree_min(x) };
            }
            if self.rightmost == z {
                self.rightmost = if x.is_nil() { xp } else { self.subtree_max(x) };
            }
        }

        // After the color swap above, z carries the color of the vacated
        // position. Removing a red position breaks nothing.
        if self.color_of(z) == Color::Red {
            return;
        }

        // x is "doubly black"; walk up transferring the deficit until a red
        // node absorbs it or the root is reached. The sibling exists in
        // every iteration: a black vacated position cannot have had a NIL
        // sibling subtree.
        let mut x = x;
        while x != self.root && !self.is_red(x) {
            if x == self.left_of(xp) {
                let mut brother = self.right_of(xp);
                if self.is_red(brother) {
                    // Red sibling: rotate it above, reducing to a
                    // black-sibling case.
                    self.set_color(brother, Color::Black);
                    self.set_color(xp, Color::Red);
                    self.rotate_left(xp);
                    brother = self.right_of(xp);
                }

                if !self.is_red(self.left_of(brother)) && !self.is_red(self.right_of(brother)) {
                    // Black sibling, black children: push the deficit up.
                    self.set_color(brother, Color::Red);
                    x = xp;
                    xp = self.parent_of(xp);
                } else {
                    if !self.is_red(self.right_of(brother)) {
                        // Near child red, far child black: rotate the
                        // sibling to expose a red far child.
                        let near = self.left_of(brother);
                        if !near.is_nil() {
                            self.set_color(near, Color::Black);
                        }
                        self.set_color(brother, Color::Red);
                        self.rotate_right(brother);
                        brother = self.right_of(xp);
                    }

                    // Terminal rotation: the sibling inherits the parent's
                    // color and the red far child pays the debt.
                    let parent_color = self.color_of(xp);
                    self.set_color(brother, parent_color);
                    self.set_color(xp, Color::Black);
                    let far = self.right_of(brother);
                    if !far.is_nil() {
                        self.set_color(far, Color::Black);
                    }
                    self.rotate_left(xp);
                    break;
                }
            } else {
                let mut brother = self.left_of(xp);
                if self.is_red(brother) {
                    self.set_color(brother, Color::Black);
                    self.set_color(xp, Color::Red);
                    self.rotate_right(xp);
                    brother = self.left_of(xp);
                }

                if !self.is_red(self.left_of(brother)) && !self.is_red(self.right_of(brother)) {
                    self.set_color(brother, Color::Red);
                    x = xp;
                    xp = self.parent_of(xp);
                } else {
                    if !self.is_red(self.left_of(brother)) {
                        let near = self.right_of(brother);
                        if !near.is_nil() {
                            self.set_color(near, Color::Black);
                        }
                        self.set_color(brother, Color::Red);
                        self.rotate_left(brother);
                        brother = self.left_of(xp);
                    }

                    let parent_color = self.color_of(xp);
                    self.set_color(brother, parent_color);
                    self.set_color(xp, Color::Black);
                    let far = self.left_of(brother);
                    if !far.is_nil() {
                        self.set_color(far, Color::Black);
                    }
                    self.rotate_right(xp);
                    break;
                }
            }
        }

        if !x.is_nil() {
            self.set_color(x, Color::Black);
        }
    }
}
