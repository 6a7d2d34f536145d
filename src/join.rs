use core::ptr::NonNull;

use tracing::{debug, trace};

use crate::{
    child, height, highest, key, lowest,
    node::{links_mut, Node},
    parent, predecessor, set_parent, size, successor, AvlTree, Dir, Error, Key, Link, Result,
};

/// The two halves of a tree partitioned by [`AvlTree::split`], and the entry it was split at.
#[derive(Debug)]
pub struct Split<V> {
    /// Every entry whose key is less than `key`.
    pub less: AvlTree<V>,
    /// The key the tree was split at.
    pub key: Key,
    /// The value that was stored under `key`.
    pub value: V,
    /// Every entry whose key is greater than `key`.
    pub greater: AvlTree<V>,
}

impl<V> AvlTree<V> {
    /// Concatenates `self`, the entry `(key, value)` and `other` into a single tree, stored in
    /// `self`.
    ///
    /// `key` must separate the two trees: either every key of `self` is less than `key` and every
    /// key of `other` is greater, or the other way around. Either tree may be empty. This is only
    /// checked in debug builds; in release builds, joining overlapping trees leaves `self` with
    /// an invalid ordering.
    ///
    /// Returns the cost of the join: one plus the number of levels descended on the taller side
    /// to find the splice point. Joining two trees of equal height costs 1, and joining onto an
    /// empty tree costs the height of the other plus one.
    ///
    /// This operation completes in _O(|h(self) - h(other)| + 1)_ time.
    pub fn join(&mut self, key: Key, value: V, other: AvlTree<V>) -> usize {
        debug_assert!(
            self.separated_by(key, &other),
            "join pivot {key} does not separate the trees"
        );

        let pivot = Node::alloc(key, value);

        unsafe {
            let min = lowest(lowest(self.min, other.min), Some(pivot));
            let max = highest(highest(self.max, other.max), Some(pivot));

            let cost = self.join_at(pivot, other.into_root());

            self.min = min;
            self.max = max;

            trace!(key, cost, "joined");
            cost
        }
    }

    /// Splits the tree at `key`.
    ///
    /// On success, the tree is left empty and its contents are returned as the entries less than
    /// `key`, the entry for `key` itself and the entries greater than `key`. Returns
    /// [`Error::KeyNotFound`] if `key` is not present, in which case the tree is left untouched.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn split(&mut self, key: Key) -> Result<Split<V>> {
        let Some(node) = self.find(key) else {
            debug!(key, "split rejected: key not found");
            return Err(Error::KeyNotFound(key));
        };

        unsafe {
            let (min, max) = (self.min, self.max);
            let (pred, succ) = (predecessor(node), successor(node));

            let mut less = AvlTree::new();
            let mut greater = AvlTree::new();
            less.root = detach(node, Dir::Left);
            greater.root = detach(node, Dir::Right);

            // Walk up the search path. Every ancestor less than `key` joins the lower half along
            // with its left subtree, and every ancestor greater than `key` joins the upper half
            // with its right subtree.
            let mut cost = 0;
            let mut opt_cur = parent(node);
            while let Some(cur) = opt_cur {
                opt_cur = parent(cur);

                cost += if cur.as_ref().key < key {
                    let subtree = detach(cur, Dir::Left);
                    less.join_at(cur, subtree)
                } else {
                    let subtree = detach(cur, Dir::Right);
                    greater.join_at(cur, subtree)
                };
            }

            self.root = None;
            self.min = None;
            self.max = None;

            less.min = less.root.and(min);
            less.max = pred;
            greater.min = succ;
            greater.max = greater.root.and(max);

            trace!(
                key,
                cost,
                less = less.len(),
                greater = greater.len(),
                "split"
            );

            let (key, value) = Node::into_box(node).into_entry();
            Ok(Split {
                less,
                key,
                value,
                greater,
            })
        }
    }

    // Joins `self`, the detached node `pivot` and the detached subtree `other` in place, and
    // returns the cost as documented on `join`.
    //
    // `pivot`'s key must separate the keys of `self` and `other`. The cached extremes of `self`
    // are left for the caller to restore.
    pub(crate) unsafe fn join_at(&mut self, pivot: NonNull<Node<V>>, other: Link<V>) -> usize {
        unsafe {
            links_mut(pivot).reset();
            let pivot_key = key(pivot);

            let (Some(this), Some(that)) = (self.root, other) else {
                // One side is empty: the pivot is a plain insertion into the other.
                let cost = height(self.root).max(height(other)).max(0) as usize + 1;

                if self.root.is_none() {
                    self.root = other;
                }

                let position = self.locate(pivot_key);
                self.attach(pivot, position);
                return cost;
            };

            // The side of the pivot that `other` belongs on.
            let side = if pivot_key > key(this) {
                Dir::Right
            } else {
                Dir::Left
            };

            let (h_this, h_that) = (height(Some(this)), height(Some(that)));

            if h_this == h_that {
                let (left, right) = match side {
                    Dir::Left => (that, this),
                    Dir::Right => (this, that),
                };

                let links = links_mut(pivot);
                links.set_child(Dir::Left, Some(left));
                links.set_child(Dir::Right, Some(right));
                links.set_height(h_this + 1);
                links.set_size(size(Some(this)) + size(Some(that)) + 1);
                set_parent(Some(left), Some(pivot));
                set_parent(Some(right), Some(pivot));

                self.root = Some(pivot);
                return 1;
            }

            // Descend the taller tree along the edge facing the shorter one, until reaching a
            // subtree no taller than the shorter tree.
            let (tall, short, toward) = if h_this > h_that {
                (this, that, side)
            } else {
                (that, this, !side)
            };
            let h_short = height(Some(short));

            let mut cost = 2;
            let mut parent = tall;
            let mut opt_cur = child(tall, toward);
            while let Some(next) = opt_cur.filter(|&n| height(Some(n)) > h_short) {
                parent = next;
                opt_cur = child(next, toward);
                cost += 1;
            }

            // Splice: the pivot takes the place of `opt_cur`, adopting it on the inner side and
            // the shorter tree on the outer side.
            let links = links_mut(pivot);
            links.set_child(!toward, opt_cur);
            links.set_child(toward, Some(short));
            links.set_parent(Some(parent));
            links.set_height(height(opt_cur).max(h_short) + 1);
            links.set_size(size(opt_cur) + size(Some(short)) + 1);
            set_parent(opt_cur, Some(pivot));
            set_parent(Some(short), Some(pivot));
            links_mut(parent).set_child(toward, Some(pivot));

            let added = size(Some(short)) + 1;
            let mut opt_anc = Some(parent);
            while let Some(anc) = opt_anc {
                let links = links_mut(anc);
                links.set_size(links.size() + added);
                opt_anc = links.parent();
            }

            self.root = Some(tall);
            self.retrace_grown(parent);

            cost
        }
    }

    fn separated_by(&self, key: Key, other: &AvlTree<V>) -> bool {
        let below = |tree: &AvlTree<V>| tree.last_key_value().map_or(true, |(k, _)| k < key);
        let above = |tree: &AvlTree<V>| tree.first_key_value().map_or(true, |(k, _)| k > key);

        (below(self) && above(other)) || (above(self) && below(other))
    }
}

// Cuts the `dir` subtree off `node` and returns it as a standalone root.
unsafe fn detach<V>(node: NonNull<Node<V>>, dir: Dir) -> Link<V> {
    unsafe {
        let subtree = links_mut(node).set_child(dir, None);
        set_parent(subtree, None);
        subtree
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::prelude::v1::*;

    use super::*;

    fn tree_of(keys: impl IntoIterator<Item = Key>) -> AvlTree<Key> {
        keys.into_iter().map(|key| (key, key)).collect()
    }

    #[test]
    fn join_equal_heights() {
        let mut left = tree_of([1]);
        let right = tree_of([3]);

        assert_eq!(left.join(2, 2, right), 1);
        left.assert_invariants();

        assert_eq!(left.root_key(), Some(2));
        assert_eq!(left.keys_in_order(), [1, 2, 3]);
        assert_eq!(left.height(), 1);
    }

    #[test]
    fn join_empty() {
        let mut tree = AvlTree::new();
        assert_eq!(tree.join(5, 5, AvlTree::new()), 1);
        tree.assert_invariants();
        assert_eq!(tree.keys_in_order(), [5]);

        // Joining onto an empty tree costs the height of the other plus one.
        let mut empty = AvlTree::new();
        let full = tree_of(1..=15);
        assert_eq!(full.height(), 3);
        assert_eq!(empty.join(0, 0, full), 4);
        empty.assert_invariants();
        assert_eq!(empty.len(), 16);
        assert_eq!(empty.first_key_value(), Some((0, &0)));
        assert_eq!(empty.last_key_value(), Some((15, &15)));
    }

    #[test]
    fn join_taller_left() {
        let mut tall = tree_of(1..=15);
        let short = tree_of([17]);

        assert_eq!(tall.join(16, 16, short), 4);
        tall.assert_invariants();

        assert_eq!(tall.keys_in_order(), (1..=17).collect::<Vec<_>>());
        assert_eq!(tall.max(), Some(&17));
    }

    #[test]
    fn join_shorter_below() {
        let short = tree_of([-2]);
        let mut joined = tree_of(1..=15);

        assert_eq!(joined.join(0, 0, short), 4);
        joined.assert_invariants();

        assert_eq!(joined.min(), Some(&-2));
        assert_eq!(joined.search(0), Some(&0));
        assert_eq!(joined.len(), 17);
    }

    #[test]
    fn join_taller_other() {
        // `self` is the shorter tree, so the descent runs down `other`'s right spine.
        let mut short = tree_of([17]);
        let tall = tree_of(1..=15);

        assert_eq!(short.join(16, 16, tall), 4);
        short.assert_invariants();

        assert_eq!(short.keys_in_order(), (1..=17).collect::<Vec<_>>());
        assert_eq!(short.first_key_value(), Some((1, &1)));
        assert_eq!(short.last_key_value(), Some((17, &17)));

        // And down the left spine when `other` holds the larger keys.
        let mut short = tree_of([-2]);
        let tall = tree_of(1..=15);

        assert_eq!(short.join(0, 0, tall), 4);
        short.assert_invariants();
        assert_eq!(short.len(), 17);
        assert_eq!(short.min(), Some(&-2));
        assert_eq!(short.max(), Some(&15));
    }

    #[test]
    fn join_rebalances_spliced_subtree() {
        // A perfect tree of height 4 joined with a tree of height 2 splices the pivot two levels
        // down, and every node above it on the right spine grows.
        let mut tall = tree_of(1..=31);
        let short = tree_of(33..=39);

        assert_eq!(short.height(), 2);
        assert_eq!(tall.join(32, 32, short), 3);
        tall.assert_invariants();
        assert_eq!(tall.len(), 39);
        assert_eq!(tall.height(), 5);
    }

    #[test]
    fn split_at_root() {
        let mut tree = tree_of(1..=7);
        assert_eq!(tree.root_key(), Some(4));

        let split = tree.split(4).unwrap();
        assert!(tree.is_empty());

        split.less.assert_invariants();
        split.greater.assert_invariants();
        assert_eq!(split.less.keys_in_order(), [1, 2, 3]);
        assert_eq!((split.key, split.value), (4, 4));
        assert_eq!(split.greater.keys_in_order(), [5, 6, 7]);
    }

    #[test]
    fn split_at_extremes() {
        let mut tree = tree_of(1..=10);
        let split = tree.split(1).unwrap();
        assert!(split.less.is_empty());
        assert_eq!(split.greater.first_key_value(), Some((2, &2)));
        assert_eq!(split.greater.last_key_value(), Some((10, &10)));
        split.greater.assert_invariants();

        let mut tree = tree_of(1..=10);
        let split = tree.split(10).unwrap();
        assert!(split.greater.is_empty());
        assert_eq!(split.less.first_key_value(), Some((1, &1)));
        assert_eq!(split.less.last_key_value(), Some((9, &9)));
        split.less.assert_invariants();
    }

    #[test]
    fn split_missing_key() {
        let mut tree = tree_of([1, 3]);
        assert_eq!(tree.split(2).unwrap_err(), Error::KeyNotFound(2));
        assert_eq!(tree.keys_in_order(), [1, 3]);
    }

    #[test]
    fn split_then_join_every_key() {
        for at in 0..50 {
            let mut tree = tree_of(0..50);
            let split = tree.split(at).unwrap();

            split.less.assert_invariants();
            split.greater.assert_invariants();
            assert_eq!(split.less.len() as Key, at);
            assert_eq!(split.greater.len() as Key, 49 - at);

            let mut joined = split.less;
            joined.join(split.key, split.value, split.greater);
            joined.assert_invariants();
            assert_eq!(joined.keys_in_order(), (0..50).collect::<Vec<_>>());
        }
    }
}
