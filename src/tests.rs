extern crate std;

use std::{format, ops::Range, prelude::v1::*, vec};

use proptest::prelude::*;

use crate::model;

use super::*;

fn insert_find_all(keys: &[Key]) {
    let mut tree: AvlTree<Key> = AvlTree::new();

    for &key in keys {
        tree.insert(key, key * 10).unwrap();
        tree.assert_invariants();
    }

    for &key in keys {
        let value = tree.search(key).expect("item not found");
        assert_eq!(*value, key * 10);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

// Every permutation of `0..n`, in lexicographic order.
fn permutations(n: Key) -> Vec<Vec<Key>> {
    if n == 0 {
        return vec![vec![]];
    }

    let mut out = Vec::new();
    for first in 0..n {
        for mut rest in permutations(n - 1) {
            for key in rest.iter_mut() {
                if *key >= first {
                    *key += 1;
                }
            }
            rest.insert(0, first);
            out.push(rest);
        }
    }

    out
}

#[test]
fn four_elems_find() {
    for keys in permutations(4) {
        insert_find_all(&keys);
    }
}

#[test]
fn five_elems_find() {
    for keys in permutations(5) {
        insert_find_all(&keys);
    }
}

fn insert_remove_all(keys: &[Key]) {
    let mut tree: AvlTree<()> = AvlTree::new();

    for &key in keys {
        tree.insert(key, ()).unwrap();
        tree.assert_invariants();
    }

    for &key in keys {
        tree.delete(key).expect("item not found");
        tree.assert_invariants();
    }

    for &key in keys {
        tree.insert(key, ()).unwrap();
        tree.assert_invariants();
    }

    for &key in keys.iter().rev() {
        tree.delete(key).expect("item not found");
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    for keys in permutations(3) {
        insert_remove_all(&keys);
    }
}

#[test]
fn remove_four() {
    for keys in permutations(4) {
        insert_remove_all(&keys);
    }
}

#[test]
fn remove_five() {
    for keys in permutations(5) {
        insert_remove_all(&keys);
    }
}

#[test]
fn ascending_insert_rotates_once() {
    let mut tree = AvlTree::new();

    assert_eq!(tree.insert(1, "a").unwrap(), Rebalance::NONE);

    let ops = tree.insert(2, "b").unwrap();
    assert_eq!(ops.promotions, 1);
    assert_eq!(ops.rotations, 0);

    // Promote 2, rotate it above 1, demote 1.
    let ops = tree.insert(3, "c").unwrap();
    assert_eq!(ops.rotations, 1);
    assert_eq!(ops.ops(), 3);

    tree.assert_invariants();
    assert_eq!(tree.root_key(), Some(2));
    assert_eq!(tree.height(), 1);
}

#[test]
fn double_rotation() {
    let mut tree = AvlTree::new();
    tree.insert(3, ()).unwrap();
    tree.insert(1, ()).unwrap();

    // Promote 1, rotate 2 above 1, demote 1, rotate 2 above 3, demote 3, promote 2.
    let ops = tree.insert(2, ()).unwrap();
    tree.assert_invariants();

    assert_eq!(ops.rotations, 2);
    assert_eq!(ops.promotions, 2);
    assert_eq!(ops.demotions, 2);
    assert_eq!(ops.ops(), 6);
    assert_eq!(tree.root_key(), Some(2));
}

#[test]
fn delete_without_rebalancing() {
    let mut tree = AvlTree::new();
    for key in [2, 1, 3] {
        tree.insert(key, key).unwrap();
    }

    for key in [2, 3, 1] {
        let ops = tree.delete(key).unwrap();
        tree.assert_invariants();
        assert!(ops.is_none(), "deleting {key} took {ops}");
    }

    assert!(tree.is_empty());
    assert_eq!(tree.min(), None);
    assert_eq!(tree.max(), None);
}

fn tree_of(keys: &[Key]) -> AvlTree<()> {
    let mut tree = AvlTree::new();
    for &key in keys {
        tree.insert(key, ()).unwrap();
    }
    tree.assert_invariants();
    tree
}

#[test]
fn delete_demotes_2_2() {
    // 1 is the root with a single child 2. Removing 2 leaves 1 as a 2,2 leaf.
    let mut tree = tree_of(&[1, 2]);
    let ops = tree.delete(2).unwrap();
    tree.assert_invariants();

    assert_eq!(ops.demotions, 1);
    assert_eq!(ops.ops(), 1);

    // 3 becomes a 2,2 leaf, and then the root 2 is 2,2 as well.
    let mut tree = tree_of(&[2, 1, 3, 4]);
    let ops = tree.delete(4).unwrap();
    tree.assert_invariants();

    assert_eq!(ops.demotions, 2);
    assert_eq!(ops.ops(), 2);
    assert_eq!(tree.height(), 1);
}

#[test]
fn delete_rotates_over_1_1_sibling() {
    // 2 has children 1 and 4, and 4 has children 3 and 5. Removing 1 leaves 2 as 3,1 with a
    // 1,1 sibling: demote 2, promote 4, rotate 4 above 2.
    let mut tree = tree_of(&[2, 1, 4, 3, 5]);
    let ops = tree.delete(1).unwrap();
    tree.assert_invariants();

    assert_eq!(ops.rotations, 1);
    assert_eq!(ops.promotions, 1);
    assert_eq!(ops.demotions, 1);
    assert_eq!(ops.ops(), 3);
    assert_eq!(tree.root_key(), Some(4));
    assert_eq!(tree.height(), 2);
}

#[test]
fn delete_rotates() {
    // 2 is the root with children 1 and 3, and 4 hangs below 3. Removing 1 leaves 2 as 3,1:
    // demote 2 twice, rotate 3 above 2.
    let mut tree = tree_of(&[2, 1, 3, 4]);
    let ops = tree.delete(1).unwrap();
    tree.assert_invariants();

    assert_eq!(ops.rotations, 1);
    assert_eq!(ops.demotions, 2);
    assert_eq!(ops.ops(), 3);
    assert_eq!(tree.root_key(), Some(3));
    assert_eq!(tree.keys_in_order(), [2, 3, 4]);
}

#[test]
fn delete_rotates_then_demotes_above() {
    // 5 is 1,2 with left child 2, which is 1,2 with right child 3, which has a right child 4.
    // Removing 1 rotates 3 above 2, which shrinks the left subtree and leaves 5 as 2,2.
    let mut tree = tree_of(&[5, 2, 6, 1, 3, 7, 4]);
    assert_eq!(tree.height(), 3);

    let ops = tree.delete(1).unwrap();
    tree.assert_invariants();

    assert_eq!(ops.rotations, 1);
    assert_eq!(ops.demotions, 3);
    assert_eq!(ops.ops(), 4);
    assert_eq!(tree.root_key(), Some(5));
    assert_eq!(tree.height(), 2);
}

#[test]
fn delete_double_rotates() {
    // 2 has children 1 and 4, and 3 hangs below 4 on the inside. Removing 1 leaves 2 as 3,1:
    // demote 2 twice, demote 4, rotate 3 above 4 and then above 2, promote 3.
    let mut tree = tree_of(&[2, 1, 4, 3]);
    let ops = tree.delete(1).unwrap();
    tree.assert_invariants();

    assert_eq!(ops.rotations, 2);
    assert_eq!(ops.promotions, 1);
    assert_eq!(ops.demotions, 3);
    assert_eq!(ops.ops(), 6);
    assert_eq!(tree.root_key(), Some(3));

    // Mirrored: 4 has children 2 and 5, and 3 hangs below 2 on the inside.
    let mut tree = tree_of(&[4, 5, 2, 3]);
    let ops = tree.delete(5).unwrap();
    tree.assert_invariants();

    assert_eq!(ops.rotations, 2);
    assert_eq!(ops.ops(), 6);
    assert_eq!(tree.root_key(), Some(3));
}

#[test]
fn duplicate_insert_is_rejected() {
    let mut tree = AvlTree::new();
    tree.insert(7, "first").unwrap();

    assert_eq!(tree.insert(7, "second"), Err(Error::DuplicateKey(7)));
    assert_eq!(tree.search(7), Some(&"first"));
    assert_eq!(tree.len(), 1);
}

#[test]
fn missing_delete_is_rejected() {
    let mut tree: AvlTree<()> = (0..4).map(|key| (key, ())).collect();

    assert_eq!(tree.delete(9), Err(Error::KeyNotFound(9)));
    assert_eq!(tree.keys_in_order(), [0, 1, 2, 3]);
    tree.assert_invariants();
}

#[test]
fn in_order_sequences() {
    let tree: AvlTree<char> = [(3, 'c'), (1, 'a'), (2, 'b'), (-5, 'z')].into_iter().collect();

    assert_eq!(tree.keys_in_order(), [-5, 1, 2, 3]);
    assert_eq!(tree.values_in_order(), [&'z', &'a', &'b', &'c']);
    assert_eq!(tree.len(), tree.keys_in_order().len());
    assert_eq!(tree.min(), Some(&'z'));
    assert_eq!(tree.max(), Some(&'c'));
}

#[test]
fn search_mut_and_clear() {
    let mut tree: AvlTree<Vec<u8>> = (0..8).map(|key| (key, Vec::new())).collect();

    tree.search_mut(3).unwrap().push(1);
    assert_eq!(tree.search(3).map(Vec::len), Some(1));
    assert!(tree.search_mut(8).is_none());

    tree.clear();
    tree.assert_invariants();
    assert!(tree.is_empty());
    assert_eq!(tree.height(), -1);
}

#[test]
fn extend_skips_duplicates() {
    let mut tree: AvlTree<&str> = [(1, "a"), (2, "b")].into_iter().collect();
    tree.extend([(2, "x"), (3, "c"), (1, "y")]);
    tree.assert_invariants();

    assert_eq!(tree.values_in_order(), [&"a", &"b", &"c"]);
}

#[test]
fn debug_is_map_like() {
    let tree: AvlTree<&str> = [(2, "b"), (1, "a")].into_iter().collect();
    assert_eq!(format!("{tree:?}"), r#"{1: "a", 2: "b"}"#);
}

#[test]
fn split_and_join_split_halves() {
    let mut tree: AvlTree<Key> = (1..=7).map(|key| (key, key)).collect();

    let split = tree.split(4).unwrap();
    split.less.assert_invariants();
    split.greater.assert_invariants();
    assert_eq!(split.less.keys_in_order(), [1, 2, 3]);
    assert_eq!(split.greater.keys_in_order(), [5, 6, 7]);

    let mut joined = split.less;
    joined.join(split.key, split.value, split.greater);
    joined.assert_invariants();
    assert_eq!(joined.keys_in_order(), (1..=7).collect::<Vec<_>>());
}

#[test]
fn join_singletons_costs_one() {
    let mut less = AvlTree::new();
    less.insert(1, ()).unwrap();
    let mut greater = AvlTree::new();
    greater.insert(3, ()).unwrap();

    assert_eq!(less.join(2, (), greater), 1);
    less.assert_invariants();
    assert_eq!(less.keys_in_order(), [1, 2, 3]);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn split_join_roundtrip(
        keys in proptest::collection::btree_set(-1000i64..1000, 1..300),
        pick in any::<proptest::sample::Index>(),
    ) {
        let keys: Vec<Key> = keys.into_iter().collect();
        let at = keys[pick.index(keys.len())];

        let mut tree: AvlTree<Key> = keys.iter().map(|&key| (key, -key)).collect();
        let split = tree.split(at).unwrap();

        split.less.assert_invariants();
        split.greater.assert_invariants();
        prop_assert!(split.less.iter().all(|(key, _)| key < at));
        prop_assert!(split.greater.iter().all(|(key, _)| key > at));
        prop_assert_eq!(split.value, -at);

        let mut joined = split.greater;
        joined.join(split.key, split.value, split.less);
        joined.assert_invariants();
        prop_assert_eq!(joined.keys_in_order(), keys);
    }
}
