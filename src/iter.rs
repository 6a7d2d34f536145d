use core::{iter::FusedIterator, marker::PhantomData};

use crate::{entry, predecessor, successor, AvlTree, Key, Link};

/// An iterator over the entries of an [`AvlTree`], in ascending key order.
///
/// Created by [`AvlTree::iter`]. Each step follows parent and child links from the previous
/// entry, so a full traversal takes _O(n)_ time and no extra space.
pub struct Iter<'tree, V> {
    front: Link<V>,
    back: Link<V>,
    len: usize,
    _tree: PhantomData<&'tree AvlTree<V>>,
}

impl<'tree, V> Iter<'tree, V> {
    pub(crate) fn new(tree: &'tree AvlTree<V>) -> Self {
        Iter {
            front: tree.min,
            back: tree.max,
            len: tree.len(),
            _tree: PhantomData,
        }
    }
}

impl<'tree, V> Iterator for Iter<'tree, V> {
    type Item = (Key, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front?;
        self.len -= 1;
        self.front = unsafe { successor(cur) };

        Some(unsafe { entry(cur) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, V> DoubleEndedIterator for Iter<'tree, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back?;
        self.len -= 1;
        self.back = unsafe { predecessor(cur) };

        Some(unsafe { entry(cur) })
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Iter {
            front: self.front,
            back: self.back,
            len: self.len,
            _tree: PhantomData,
        }
    }
}
