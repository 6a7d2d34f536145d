use alloc::boxed::Box;
use core::ptr::NonNull;

use tracing::debug;

use crate::{
    balance_pair, child, key, left,
    node::{links, links_mut, Node},
    parent, predecessor, right, set_parent, side_pair, successor, AvlTree, Dir, Error, Key, Link,
    Rebalance, Result,
};

impl<V> AvlTree<V> {
    /// Removes the entry for `key`, dropping its value.
    ///
    /// Returns the rebalancing steps the removal required, or [`Error::KeyNotFound`] if `key` is
    /// not present, in which case the tree is left untouched.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn delete(&mut self, key: Key) -> Result<Rebalance> {
        let Some(node) = self.find(key) else {
            debug!(key, "delete rejected: key not found");
            return Err(Error::KeyNotFound(key));
        };

        let (removed, ops) = unsafe { self.remove_node(node) };
        drop(removed);

        Ok(ops)
    }

    /// Removes and returns the entry with the smallest key.
    pub fn pop_first(&mut self) -> Option<(Key, V)> {
        let node = self.min?;
        let (removed, _) = unsafe { self.remove_node(node) };
        Some(removed.into_entry())
    }

    /// Removes and returns the entry with the largest key.
    pub fn pop_last(&mut self) -> Option<(Key, V)> {
        let node = self.max?;
        let (removed, _) = unsafe { self.remove_node(node) };
        Some(removed.into_entry())
    }

    /// Removes `node` from the tree and returns ownership of it.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not
    /// any other tree.
    unsafe fn remove_node(&mut self, node: NonNull<Node<V>>) -> (Box<Node<V>>, Rebalance) {
        // There are three possible cases:
        //
        // 1. `node` is a leaf. It is replaced by the sentinel.
        //
        // 2. `node` has one child. The child is elevated to replace it.
        //
        // 3. `node` has two children. Its successor[^1] is unlinked as in case 1 or 2 (it has no
        //    left child), and then moved into `node`'s place, taking over its children, height
        //    and size. The successor node itself moves, so nothing else pointing at it is
        //    invalidated.
        //
        // In every case exactly one subtree lost one level or kept its height, and retracing
        // starts at the parent of the node that was physically unlinked. If that parent was
        // `node` itself, the successor now stands in its place.
        //
        // [^1]: The successor of a node `a` is the least node in `a`'s right subtree.

        unsafe {
            // The cached extremes move before the links do.
            if self.min == Some(node) {
                self.min = successor(node);
            }

            if self.max == Some(node) {
                self.max = predecessor(node);
            }

            let retrace_from = match right(node) {
                Some(right) if left(node).is_some() => {
                    let successor = crate::min_of(right);
                    let from = self.unlink(successor);
                    self.relocate(node, successor);

                    if from == Some(node) {
                        Some(successor)
                    } else {
                        from
                    }
                }

                _ => self.unlink(node),
            };

            let ops = self.retrace_shrunk(retrace_from);

            links_mut(node).reset();
            (Node::into_box(node), ops)
        }
    }

    // Removes `node`, which has at most one child, by elevating that child (or the sentinel) into
    // its place. Every ancestor loses one descendant.
    //
    // Returns the former parent of `node`.
    unsafe fn unlink(&mut self, node: NonNull<Node<V>>) -> Link<V> {
        unsafe {
            debug_assert!(left(node).is_none() || right(node).is_none());

            let child = left(node).or(right(node));
            let parent = parent(node);

            self.replace_child_or_set_root(parent, node, child);
            set_parent(child, parent);

            let mut opt_cur = parent;
            while let Some(cur) = opt_cur {
                let links = links_mut(cur);
                links.set_size(links.size() - 1);
                opt_cur = links.parent();
            }

            parent
        }
    }

    // Moves the detached `successor` into the position of `node`.
    unsafe fn relocate(&mut self, node: NonNull<Node<V>>, successor: NonNull<Node<V>>) {
        unsafe {
            let parent = parent(node);
            let left = left(node);
            let right = right(node);
            let height = links(node).height();
            let size = links(node).size();

            let successor_links = links_mut(successor);
            successor_links.set_parent(parent);
            successor_links.set_child(Dir::Left, left);
            successor_links.set_child(Dir::Right, right);
            successor_links.set_height(height);
            successor_links.set_size(size);

            set_parent(left, Some(successor));
            set_parent(right, Some(successor));

            self.replace_child_or_set_root(parent, node, Some(successor));
        }
    }

    // Performs a bottom-up rebalance after the subtree below `from` lost one level or a node.
    //
    // Each iteration classifies `cur` and either stops, or fixes it and moves up to the root of
    // the subtree that shrank.
    unsafe fn retrace_shrunk(&mut self, from: Link<V>) -> Rebalance {
        let mut ops = Rebalance::NONE;
        let mut opt_cur = from;

        while let Some(cur) = opt_cur {
            opt_cur = unsafe {
                match balance_pair(cur) {
                    // Two children with valid differences, or one child that is a leaf (a 1,2
                    // unary node). The height of `cur` did not change.
                    (1, 1) | (1, 2) | (2, 1) => None,

                    // Both children are 2-children; this includes a leaf of height 1 whose only
                    // child was removed. Demote and ascend.
                    (2, 2) => {
                        ops.demote(cur);
                        parent(cur)
                    }

                    (3, 1) => self.rotate_shrunk(cur, Dir::Right, &mut ops),
                    (1, 3) => self.rotate_shrunk(cur, Dir::Left, &mut ops),

                    pair => unreachable!("node {} is {pair:?} after shrinking", key(cur)),
                }
            };
        }

        ops
    }

    // Restores the 3,1 (or 1,3) node `z`, whose `heavy` child `y` is a 1-child.
    //
    // Returns the node to continue retracing at, if the subtree rooted at `z`'s position is now
    // one level shorter than before.
    unsafe fn rotate_shrunk(
        &mut self,
        z: NonNull<Node<V>>,
        heavy: Dir,
        ops: &mut Rebalance,
    ) -> Link<V> {
        unsafe {
            let y = child(z, heavy).expect("the 1-child of a 3,1 node must be real");

            // `y`'s pair seen from the heavy side: outer child first, inner child second.
            match side_pair(y, heavy) {
                // `y` is 1,1. After one rotation, `y` takes `z`'s height and the subtree keeps
                // its height.
                (1, 1) => {
                    ops.demote(z);
                    ops.promote(y);
                    self.rotate(y);
                    ops.rotated(1);
                    None
                }

                // The outer grandchild is the tall one. One rotation; the subtree shrinks.
                (1, 2) => {
                    ops.demote(z);
                    ops.demote(z);
                    self.rotate(y);
                    ops.rotated(1);
                    parent(y)
                }

                // The inner grandchild `v` is the tall one. Rotate it up twice; the subtree
                // shrinks.
                (2, 1) => {
                    let v = child(y, !heavy).expect("a 1-child must be a real node");
                    ops.demote(z);
                    ops.demote(z);
                    ops.demote(y);
                    self.rotate(v);
                    self.rotate(v);
                    ops.rotated(2);
                    ops.promote(v);
                    parent(v)
                }

                pair => unreachable!("sibling {} of a 3-child is {pair:?}", key(y)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height;

    #[test]
    fn relocated_successor_keeps_identity() {
        let mut tree: AvlTree<&str> = AvlTree::new();
        for (key, value) in [(4, "d"), (2, "b"), (6, "f"), (1, "a"), (3, "c"), (5, "e"), (7, "g")]
        {
            tree.insert(key, value).unwrap();
        }

        // Taking a pointer to the successor before the removal checks that the node itself, not
        // a copy of its entry, ends up at the root.
        let successor = tree.locate(5).unwrap().0;
        tree.delete(4).unwrap();
        tree.assert_invariants();

        assert_eq!(tree.root, Some(successor));
        assert_eq!(tree.search(5), Some(&"e"));
        assert_eq!(unsafe { height(tree.root) }, 2);
        assert_eq!(unsafe { links(successor).size() }, 6);
    }

    #[test]
    fn pop_ends() {
        let mut tree: AvlTree<u32> = (0..10).map(|key| (key, key as u32 * 2)).collect();

        assert_eq!(tree.pop_first(), Some((0, 0)));
        assert_eq!(tree.pop_last(), Some((9, 18)));
        tree.assert_invariants();

        assert_eq!(tree.first_key_value(), Some((1, &2)));
        assert_eq!(tree.last_key_value(), Some((8, &16)));
        assert_eq!(tree.len(), 8);

        while tree.pop_first().is_some() {
            tree.assert_invariants();
        }

        assert!(tree.is_empty());
        assert_eq!(tree.pop_last(), None);
    }
}
