//! An intrusive AVL tree over integer keys, with order statistics and logarithmic split and join.
//!
//! [`AvlTree`] maps unique [`Key`]s to values. Besides search, insertion and removal it supports:
//!
//! - O(1) [`min`](AvlTree::min), [`max`](AvlTree::max) and [`len`](AvlTree::len), from cached
//!   extremes and subtree sizes;
//! - [`rank_of`](AvlTree::rank_of) and [`get_by_rank`](AvlTree::get_by_rank) in _O(log(n))_;
//! - [`split`](AvlTree::split), which partitions a tree around a key, and
//!   [`join`](AvlTree::join), which concatenates two trees around a pivot entry. A join costs
//!   time proportional to the height difference of its inputs rather than their size.
//!
//! Insertions and removals report the [`Rebalance`] steps they performed.
//!
//! # Example
//!
//! ```
//! use cordyceps_avl::AvlTree;
//!
//! let mut tree = AvlTree::new();
//! for key in 1..=7 {
//!     tree.insert(key, key * 10).unwrap();
//! }
//!
//! let split = tree.split(4).unwrap();
//! assert_eq!(split.less.keys_in_order(), [1, 2, 3]);
//! assert_eq!(split.greater.keys_in_order(), [5, 6, 7]);
//!
//! let mut joined = split.less;
//! joined.join(split.key, split.value, split.greater);
//! assert_eq!(joined.len(), 7);
//! assert_eq!(joined.search(4), Some(&40));
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

// Conventions used in comments:
// - The height of a node `x` is denoted `h(x)`. A missing child (the sentinel) has height -1.
// - The height difference of a node `x` is given by `h(p(x)) - h(x)`, where `p(x)` is its parent.
// - A node is `i,j` if its left child has height difference `i` and its right child `j`. This is
//   the node's balance pair.
//
// The AVL invariants in these terms:
// 1. Every node is 1,1, 1,2 or 2,1.
// 2. All leaves have height 0.
//
// While an update is being retraced, at most one node violates (1):
// - after an insertion (or a join), a node is 0,1 or 1,0 while the subtree below it grows, or
//   0,2 or 2,0 where a rotation is required;
// - after a removal, a node is 2,2 while the subtree below it shrinks, or 3,1 or 1,3 where a
//   rotation is required.
//
// Every node also caches the number of nodes in its subtree, which must equal the sum of its
// children's sizes plus one after every public operation.

extern crate alloc;

use alloc::{boxed::Box, vec::Vec};
use core::{cmp::Ordering, fmt, marker::PhantomData, ops::Not, ptr::NonNull};

use tracing::{debug, trace};

mod debug;
mod error;
mod insert;
mod iter;
mod join;
mod node;
mod rank;
mod rebalance;
mod remove;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use iter::Iter;
pub use join::Split;
pub use rebalance::Rebalance;

use node::{links, links_mut, Node};

/// The key type of an [`AvlTree`].
pub type Key = i64;

/// An ordered map from unique integer keys to values, balanced as an AVL tree.
///
/// Nodes are allocated individually and linked to their parents and children through raw
/// pointers, so [`split`](AvlTree::split) and [`join`](AvlTree::join) move whole subtrees between
/// trees without copying them.
pub struct AvlTree<V> {
    root: Link<V>,
    min: Link<V>,
    max: Link<V>,
    _owns: PhantomData<Box<Node<V>>>,
}

// SAFETY: An `AvlTree` exclusively owns its nodes, and nodes are never shared between trees.
unsafe impl<V: Send> Send for AvlTree<V> {}
// SAFETY: Shared references to the tree only hand out shared references to values.
unsafe impl<V: Sync> Sync for AvlTree<V> {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// A child or parent slot. `None` is the sentinel: it has no key, height -1 and size 0.
pub(crate) type Link<V> = Option<NonNull<Node<V>>>;

impl<V> AvlTree<V> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<V> {
        AvlTree {
            root: None,
            min: None,
            max: None,
            _owns: PhantomData,
        }
    }

    /// Returns `true` if the tree contains no entries.
    pub const fn is_empty(&self) -> bool {
        let empty = self.root.is_none();

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.min.is_none() && empty == self.max.is_none());
        }

        empty
    }

    /// Returns the number of entries in the tree.
    ///
    /// This is the root's subtree size and completes in _O(1)_ time.
    pub fn len(&self) -> usize {
        unsafe { size(self.root) }
    }

    /// Returns the height of the tree: -1 if it is empty, 0 if it holds a single entry.
    pub fn height(&self) -> i8 {
        unsafe { height(self.root) }
    }

    /// Returns the key stored at the root of the tree.
    pub fn root_key(&self) -> Option<Key> {
        self.root.map(|root| unsafe { key(root) })
    }

    /// Returns a reference to the value associated with `key`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn search(&self, key: Key) -> Option<&V> {
        let node = self.find(key)?;
        Some(unsafe { &(*node.as_ptr()).value })
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn search_mut(&mut self, key: Key) -> Option<&mut V> {
        let node = self.find(key)?;
        Some(unsafe { &mut (*node.as_ptr()).value })
    }

    /// Returns `true` if the tree contains `key`.
    pub fn contains_key(&self, key: Key) -> bool {
        self.find(key).is_some()
    }

    /// Returns the value associated with the smallest key.
    ///
    /// This operation completes in _O(1)_ time.
    pub fn min(&self) -> Option<&V> {
        self.min.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Returns the value associated with the largest key.
    ///
    /// This operation completes in _O(1)_ time.
    pub fn max(&self) -> Option<&V> {
        self.max.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Returns the entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(Key, &V)> {
        self.min.map(|node| unsafe { entry(node) })
    }

    /// Returns the entry with the largest key.
    pub fn last_key_value(&self) -> Option<(Key, &V)> {
        self.max.map(|node| unsafe { entry(node) })
    }

    /// Returns all keys in ascending order.
    pub fn keys_in_order(&self) -> Vec<Key> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Returns all values, ordered by their keys.
    ///
    /// The result is aligned index-for-index with [`keys_in_order`](AvlTree::keys_in_order).
    pub fn values_in_order(&self) -> Vec<&V> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// Returns an iterator over the entries of the tree, in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self)
    }

    /// Clears the tree, dropping all entries.
    pub fn clear(&mut self) {
        self.min = None;
        self.max = None;

        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node. It has no left child.
                let cur = min_of(cur);
                let parent = parent(cur);
                let right = right(cur);

                // Elevate the node's right child (which may be the sentinel).
                self.replace_child_or_set_root(parent, cur, right);
                set_parent(right, parent);

                drop(Node::into_box(cur));

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
    }

    /// Returns the node holding `key`.
    fn find(&self, key: Key) -> Link<V> {
        match self.locate(key) {
            Some((node, Ordering::Equal)) => Some(node),
            _ => None,
        }
    }

    /// Descends from the root towards `key`.
    ///
    /// Returns the node holding `key` paired with [`Ordering::Equal`]; otherwise the last node
    /// visited (the parent a new node with `key` would be attached to) paired with the side it
    /// would be attached on. Returns `None` if the tree is empty.
    pub(crate) fn locate(&self, key: Key) -> Option<(NonNull<Node<V>>, Ordering)> {
        let mut cur = self.root?;

        loop {
            let ordering = key.cmp(unsafe { &cur.as_ref().key });

            let next = unsafe {
                match ordering {
                    Ordering::Less => left(cur),
                    Ordering::Equal => return Some((cur, ordering)),
                    Ordering::Greater => right(cur),
                }
            };

            match next {
                Some(next) => cur = next,
                None => return Some((cur, ordering)),
            }
        }
    }

    /// Gives up the tree's nodes, leaving it empty. The caller takes ownership of the subtree.
    pub(crate) fn into_root(mut self) -> Link<V> {
        self.min = None;
        self.max = None;
        self.root.take()
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<V>,
        old_child: NonNull<Node<V>>,
        new_child: Link<V>,
    ) {
        match parent {
            Some(parent) => unsafe { replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Rotates `up` above its parent `down`, which becomes `up`'s child on the opposite side.
    //
    // The rotation direction follows from the side of `down` that `up` hangs on: a left child
    // rotates right and a right child rotates left. The sizes of both nodes are recomputed; their
    // heights are left to the caller. Rotating the root is a no-op.
    unsafe fn rotate(&mut self, up: NonNull<Node<V>>) {
        unsafe {
            let Some(down) = parent(up) else {
                return;
            };

            // - `down` becomes the `dir` child of `up`.
            // - `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
            let dir = !which_child(down, up);

            let across = child(up, dir);
            links_mut(down).set_child(!dir, across);
            set_parent(across, Some(down));

            links_mut(up).set_child(dir, Some(down));
            let grandparent = links_mut(down).set_parent(Some(up));
            links_mut(up).set_parent(grandparent);

            self.replace_child_or_set_root(grandparent, down, Some(up));

            links_mut(up).set_size(links(down).size());
            update_size(down);

            trace!(up = key(up), down = key(down), ?dir, "rotated");
        }
    }
}

// Support functions ======================================================

#[inline]
pub(crate) unsafe fn key<V>(node: NonNull<Node<V>>) -> Key {
    unsafe { node.as_ref().key }
}

#[inline]
pub(crate) unsafe fn entry<'a, V>(node: NonNull<Node<V>>) -> (Key, &'a V) {
    let node = unsafe { &*node.as_ptr() };
    (node.key, &node.value)
}

#[inline]
pub(crate) unsafe fn parent<V>(node: NonNull<Node<V>>) -> Link<V> {
    unsafe { links(node).parent() }
}

#[inline]
pub(crate) unsafe fn child<V>(node: NonNull<Node<V>>, dir: Dir) -> Link<V> {
    unsafe { links(node).child(dir) }
}

#[inline]
pub(crate) unsafe fn left<V>(node: NonNull<Node<V>>) -> Link<V> {
    unsafe { links(node).left() }
}

#[inline]
pub(crate) unsafe fn right<V>(node: NonNull<Node<V>>) -> Link<V> {
    unsafe { links(node).right() }
}

/// Returns the height of the pointed-to node, or -1 for the sentinel.
#[inline]
pub(crate) unsafe fn height<V>(link: Link<V>) -> i8 {
    link.map_or(-1, |node| unsafe { links(node).height() })
}

/// Returns the subtree size of the pointed-to node, or 0 for the sentinel.
#[inline]
pub(crate) unsafe fn size<V>(link: Link<V>) -> usize {
    link.map_or(0, |node| unsafe { links(node).size() })
}

#[inline]
unsafe fn set_parent<V>(opt_node: Link<V>, parent: Link<V>) {
    let Some(node) = opt_node else {
        return;
    };

    unsafe { links_mut(node).set_parent(parent) };
}

/// Recomputes the size of `node` from its children.
#[inline]
pub(crate) unsafe fn update_size<V>(node: NonNull<Node<V>>) {
    unsafe {
        let size = size(left(node)) + size(right(node)) + 1;
        links_mut(node).set_size(size);
    }
}

/// Returns the balance pair of `node`: the height differences of its left and right children.
#[inline]
pub(crate) unsafe fn balance_pair<V>(node: NonNull<Node<V>>) -> (i8, i8) {
    unsafe {
        let h = links(node).height();
        (h - height(left(node)), h - height(right(node)))
    }
}

/// Returns the balance pair of `node` as seen from `side`: the height difference of its `side`
/// child, then that of its `!side` child.
#[inline]
pub(crate) unsafe fn side_pair<V>(node: NonNull<Node<V>>, side: Dir) -> (i8, i8) {
    let (left, right) = unsafe { balance_pair(node) };

    match side {
        Dir::Left => (left, right),
        Dir::Right => (right, left),
    }
}

#[inline]
pub(crate) unsafe fn which_child<V>(parent: NonNull<Node<V>>, child: NonNull<Node<V>>) -> Dir {
    if unsafe { left(parent) } == Some(child) {
        Dir::Left
    } else {
        Dir::Right
    }
}

// Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
//
// `new_child`'s parent pointer is not updated.
unsafe fn replace_child<V>(parent: NonNull<Node<V>>, old_child: NonNull<Node<V>>, new_child: Link<V>) {
    unsafe {
        let dir = which_child(parent, old_child);
        debug_assert_eq!(
            child(parent, dir),
            Some(old_child),
            "`old_child` must be a child of `parent`"
        );

        links_mut(parent).set_child(dir, new_child);
    }
}

/// Returns the minimum node in the subtree rooted at `node`.
#[inline]
pub(crate) unsafe fn min_of<V>(node: NonNull<Node<V>>) -> NonNull<Node<V>> {
    let mut cur = node;

    while let Some(left) = unsafe { left(cur) } {
        cur = left;
    }

    cur
}

/// Returns the maximum node in the subtree rooted at `node`.
#[inline]
pub(crate) unsafe fn max_of<V>(node: NonNull<Node<V>>) -> NonNull<Node<V>> {
    let mut cur = node;

    while let Some(right) = unsafe { right(cur) } {
        cur = right;
    }

    cur
}

/// Returns the in-order successor of `node`.
pub(crate) unsafe fn successor<V>(node: NonNull<Node<V>>) -> Link<V> {
    unsafe {
        if let Some(right) = right(node) {
            return Some(min_of(right));
        }

        // Climb while `cur` is a right child; the first ancestor reached from the left is next.
        let mut cur = node;
        while let Some(parent) = parent(cur) {
            if left(parent) == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }
}

/// Returns the in-order predecessor of `node`.
pub(crate) unsafe fn predecessor<V>(node: NonNull<Node<V>>) -> Link<V> {
    unsafe {
        if let Some(left) = left(node) {
            return Some(max_of(left));
        }

        let mut cur = node;
        while let Some(parent) = parent(cur) {
            if right(parent) == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }
}

/// Returns whichever of the two nodes has the smaller key.
pub(crate) unsafe fn lowest<V>(a: Link<V>, b: Link<V>) -> Link<V> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if unsafe { key(x) <= key(y) } { x } else { y }),
        _ => a.or(b),
    }
}

/// Returns whichever of the two nodes has the larger key.
pub(crate) unsafe fn highest<V>(a: Link<V>, b: Link<V>) -> Link<V> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if unsafe { key(x) >= key(y) } { x } else { y }),
        _ => a.or(b),
    }
}

impl<V> Default for AvlTree<V> {
    fn default() -> Self {
        AvlTree::new()
    }
}

impl<V> Drop for AvlTree<V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<V: fmt::Debug> fmt::Debug for AvlTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'tree, V> IntoIterator for &'tree AvlTree<V> {
    type Item = (Key, &'tree V);
    type IntoIter = Iter<'tree, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V> Extend<(Key, V)> for AvlTree<V> {
    /// Inserts every entry of `iter`. Entries whose key is already present are skipped.
    fn extend<I: IntoIterator<Item = (Key, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            if self.insert(key, value).is_err() {
                debug!(key, "extend skipped duplicate key");
            }
        }
    }
}

impl<V> FromIterator<(Key, V)> for AvlTree<V> {
    fn from_iter<I: IntoIterator<Item = (Key, V)>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}
