use core::cmp::Ordering;

use crate::{entry, left, right, size, AvlTree, Key};

impl<V> AvlTree<V> {
    /// Returns the number of keys less than `key`, if `key` is present.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn rank_of(&self, key: Key) -> Option<usize> {
        let mut rank = 0;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            opt_cur = unsafe {
                match key.cmp(&cur.as_ref().key) {
                    Ordering::Less => left(cur),
                    Ordering::Equal => return Some(rank + size(left(cur))),
                    Ordering::Greater => {
                        rank += size(left(cur)) + 1;
                        right(cur)
                    }
                }
            };
        }

        None
    }

    /// Returns the entry with the given zero-based rank, i.e. the entry preceded by exactly
    /// `rank` smaller keys.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn get_by_rank(&self, mut rank: usize) -> Option<(Key, &V)> {
        if rank >= self.len() {
            return None;
        }

        let mut cur = self.root?;

        loop {
            let left_size = unsafe { size(left(cur)) };

            let next = match rank.cmp(&left_size) {
                Ordering::Less => unsafe { left(cur) },
                Ordering::Equal => return Some(unsafe { entry(cur) }),
                Ordering::Greater => {
                    rank -= left_size + 1;
                    unsafe { right(cur) }
                }
            };

            // Sizes are consistent, so a rank below `len` always ends at a real node.
            cur = next?;
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::{collections::BTreeSet, prelude::v1::*};

    use proptest::prelude::*;

    use crate::AvlTree;

    proptest! {
        #[test]
        fn ranks_match_sorted_order(keys in proptest::collection::btree_set(-500i64..500, 0..200)) {
            let tree: AvlTree<()> = keys.iter().map(|&key| (key, ())).collect();
            let sorted: Vec<i64> = keys.iter().copied().collect();

            for (rank, &key) in sorted.iter().enumerate() {
                prop_assert_eq!(tree.rank_of(key), Some(rank));
                prop_assert_eq!(tree.get_by_rank(rank).map(|(k, _)| k), Some(key));
            }

            prop_assert_eq!(tree.get_by_rank(sorted.len()), None);
        }

        #[test]
        fn missing_keys_have_no_rank(
            keys in proptest::collection::btree_set(0i64..100, 0..50),
            probe in 0i64..100,
        ) {
            let tree: AvlTree<()> = keys.iter().map(|&key| (key, ())).collect();
            prop_assert_eq!(tree.rank_of(probe).is_some(), keys.contains(&probe));
        }
    }

    #[test]
    fn ranks_after_removal() {
        let mut tree: AvlTree<()> = (0..20).map(|key| (key * 2, ())).collect();
        let mut expected: BTreeSet<i64> = (0..20).map(|key| key * 2).collect();

        for key in [10, 0, 38, 22] {
            tree.delete(key).unwrap();
            expected.remove(&key);
        }

        for (rank, key) in expected.into_iter().enumerate() {
            assert_eq!(tree.rank_of(key), Some(rank));
        }
    }
}
