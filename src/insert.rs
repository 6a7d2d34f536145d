use core::{cmp::Ordering, ptr::NonNull};

use tracing::debug;

use crate::{
    balance_pair, child, highest, key, lowest,
    node::{links_mut, Node},
    parent, side_pair, AvlTree, Dir, Error, Key, Link, Rebalance, Result,
};

impl<V> AvlTree<V> {
    /// Inserts `value` under `key`.
    ///
    /// Returns the rebalancing steps the insertion required, or [`Error::DuplicateKey`] if `key`
    /// is already present, in which case the tree is left untouched and `value` is dropped.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: Key, value: V) -> Result<Rebalance> {
        let position = self.locate(key);

        if let Some((_, Ordering::Equal)) = position {
            debug!(key, "insert rejected: duplicate key");
            return Err(Error::DuplicateKey(key));
        }

        let node = Node::alloc(key, value);
        Ok(unsafe { self.attach(node, position) })
    }

    // Links the detached `node` in as a leaf at `position`, as returned by `locate` for its key,
    // and rebalances.
    //
    // The key of `node` must not be present in the tree.
    pub(crate) unsafe fn attach(
        &mut self,
        node: NonNull<Node<V>>,
        position: Option<(NonNull<Node<V>>, Ordering)>,
    ) -> Rebalance {
        unsafe {
            links_mut(node).reset();

            let Some((parent, ordering)) = position else {
                // Tree is empty. Set `node` as the root and return.
                self.root = Some(node);
                self.min = Some(node);
                self.max = Some(node);
                return Rebalance::NONE;
            };

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => unreachable!("key {} is already present", key(node)),
            };

            links_mut(parent).set_child(dir, Some(node));
            links_mut(node).set_parent(Some(parent));

            // Every ancestor gains one descendant.
            let mut opt_cur = Some(parent);
            while let Some(cur) = opt_cur {
                let links = links_mut(cur);
                links.set_size(links.size() + 1);
                opt_cur = links.parent();
            }

            self.min = lowest(self.min, Some(node));
            self.max = highest(self.max, Some(node));

            self.retrace_grown(parent)
        }
    }

    // Performs a bottom-up rebalance after the subtree below `from` grew by one level.
    //
    // Invariants:
    // - All nodes below `from` are 1,1, 1,2 or 2,1.
    // - `from`'s height has not yet been adjusted, so it is 0,1, 1,0, 0,2, 2,0 or already valid.
    pub(crate) unsafe fn retrace_grown(&mut self, from: NonNull<Node<V>>) -> Rebalance {
        let mut ops = Rebalance::NONE;
        let mut opt_cur = Some(from);

        while let Some(cur) = opt_cur {
            opt_cur = unsafe {
                match balance_pair(cur) {
                    // Balanced here, and thus above.
                    (1, 1) | (1, 2) | (2, 1) => None,

                    // `cur` is 0,1: promote it and ascend one level.
                    (0, 1) | (1, 0) => {
                        ops.promote(cur);
                        parent(cur)
                    }

                    (0, 2) => self.rotate_grown(cur, Dir::Left, &mut ops),
                    (2, 0) => self.rotate_grown(cur, Dir::Right, &mut ops),

                    pair => unreachable!("node {} is {pair:?} after growing", key(cur)),
                }
            };
        }

        ops
    }

    // Restores the 0,2 node `z`, whose `heavy` child `x` is a 0-child.
    //
    // Returns the node to continue retracing at, if the subtree rooted at `z`'s position is still
    // one level taller than before.
    unsafe fn rotate_grown(
        &mut self,
        z: NonNull<Node<V>>,
        heavy: Dir,
        ops: &mut Rebalance,
    ) -> Link<V> {
        unsafe {
            let x = child(z, heavy).expect("a 0-child must be a real node");

            // `x`'s pair seen from the heavy side: outer child first, inner child second.
            match side_pair(x, heavy) {
                // The outer grandchild is the tall one. A single rotation restores the height of
                // the subtree.
                (1, 2) => {
                    self.rotate(x);
                    ops.rotated(1);
                    ops.demote(z);
                    None
                }

                // The inner grandchild `y` is the tall one. Rotate it up twice.
                (2, 1) => {
                    let y = child(x, !heavy).expect("a 1-child must be a real node");
                    self.rotate(y);
                    ops.demote(x);
                    self.rotate(y);
                    ops.rotated(2);
                    ops.demote(z);
                    ops.promote(y);
                    None
                }

                // Both grandchildren are tall. This cannot follow a single insertion, but arises
                // when `join` splices a subtree under `z`. After a single rotation `z` keeps its
                // height and `x` rises above it, so the subtree is still one level taller.
                (1, 1) => {
                    self.rotate(x);
                    ops.rotated(1);
                    ops.promote(x);
                    parent(x)
                }

                pair => unreachable!("heavy child {} is {pair:?}", key(x)),
            }
        }
    }
}
