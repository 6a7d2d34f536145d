extern crate std;

use std::{
    collections::BTreeMap,
    ops::Bound::{Excluded, Unbounded},
    prelude::v1::*,
};

use arbitrary::Arbitrary;
use proptest::{
    prelude::any,
    strategy::{Just, Strategy},
};

use crate::{AvlTree, Error, Key};

/// A key operand: either an index into the keys currently present, or a raw key that is
/// likely absent.
#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemKey {
    Index(usize),
    Random(i16),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemKey {
        ItemKey::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in -1000i16..1000,
    ) -> ItemKey {
        ItemKey::Random(random)
    }
}

fn key_strategy() -> impl Strategy<Value = ItemKey> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemKey),
    Search(ItemKey),
    Delete(ItemKey),
    Min,
    Max,
    PopFirst,
    PopLast,
    Rank(ItemKey),
    /// Splits at the key and joins the halves back together.
    SplitJoin(ItemKey),
    /// Joins a fresh run of `len` keys (plus the pivot) above or below every present key.
    Join { above: bool, len: u8 },
}

impl Op {
    fn finalize(self, model: &BTreeMap<Key, u32>) -> FinalOp {
        fn get_key(m: &BTreeMap<Key, u32>, k: ItemKey) -> Key {
            match k {
                ItemKey::Index(idx) => {
                    if m.is_empty() {
                        idx as Key
                    } else {
                        m.keys().nth(idx % m.len()).copied().unwrap_or(0)
                    }
                }
                ItemKey::Random(k) => k.into(),
            }
        }

        match self {
            Op::Insert(k) => FinalOp::Insert(get_key(model, k)),
            Op::Search(k) => FinalOp::Search(get_key(model, k)),
            Op::Delete(k) => FinalOp::Delete(get_key(model, k)),
            Op::Min => FinalOp::Min,
            Op::Max => FinalOp::Max,
            Op::PopFirst => FinalOp::PopFirst,
            Op::PopLast => FinalOp::PopLast,
            Op::Rank(k) => FinalOp::Rank(get_key(model, k)),
            Op::SplitJoin(k) => FinalOp::SplitJoin(get_key(model, k)),
            Op::Join { above, len } => FinalOp::Join { above, len },
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(Key),
    Search(Key),
    Delete(Key),
    Min,
    Max,
    PopFirst,
    PopLast,
    Rank(Key),
    SplitJoin(Key),
    Join { above: bool, len: u8 },
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        key_strategy().prop_map(Op::Insert),
        key_strategy().prop_map(Op::Search),
        key_strategy().prop_map(Op::Delete),
        Just(Op::Min),
        Just(Op::Max),
        Just(Op::PopFirst),
        Just(Op::PopLast),
        key_strategy().prop_map(Op::Rank),
        key_strategy().prop_map(Op::SplitJoin),
        (any::<bool>(), 0u8..32).prop_map(|(above, len)| Op::Join { above, len }),
    ]
}

/// Applies `ops` to an [`AvlTree`] and a [`BTreeMap`] side by side, panicking on the first
/// observable difference or broken invariant.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut btree: BTreeMap<Key, u32> = BTreeMap::new();
    let mut avl: AvlTree<u32> = AvlTree::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&btree);
        let value = op_id as u32;

        match final_op {
            FinalOp::Insert(key) => {
                let from_btree = if btree.contains_key(&key) {
                    Err(Error::DuplicateKey(key))
                } else {
                    btree.insert(key, value);
                    Ok(())
                };
                let from_avl = avl.insert(key, value).map(drop);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Search(key) => {
                assert_eq!(
                    btree.get(&key),
                    avl.search(key),
                    "FinalOp #{op_id}: {final_op:?}"
                );
                assert_eq!(
                    btree.contains_key(&key),
                    avl.contains_key(key),
                    "FinalOp #{op_id}: {final_op:?}"
                );
            }

            FinalOp::Delete(key) => {
                let from_btree = match btree.remove(&key) {
                    Some(_) => Ok(()),
                    None => Err(Error::KeyNotFound(key)),
                };
                let from_avl = avl.delete(key).map(drop);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Min => {
                let from_btree = btree.first_key_value().map(|(_, v)| v);
                assert_eq!(from_btree, avl.min(), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Max => {
                let from_btree = btree.last_key_value().map(|(_, v)| v);
                assert_eq!(from_btree, avl.max(), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopFirst => {
                assert_eq!(
                    btree.pop_first(),
                    avl.pop_first(),
                    "FinalOp #{op_id}: {final_op:?}"
                );
            }

            FinalOp::PopLast => {
                assert_eq!(
                    btree.pop_last(),
                    avl.pop_last(),
                    "FinalOp #{op_id}: {final_op:?}"
                );
            }

            FinalOp::Rank(key) => {
                let from_btree = btree
                    .contains_key(&key)
                    .then(|| btree.range(..key).count());
                assert_eq!(from_btree, avl.rank_of(key), "FinalOp #{op_id}: {final_op:?}");

                if let Some(rank) = from_btree {
                    assert_eq!(avl.get_by_rank(rank).map(|(k, _)| k), Some(key));
                }
            }

            FinalOp::SplitJoin(key) => {
                let Some(&expected) = btree.get(&key) else {
                    assert_eq!(
                        avl.split(key).map(drop),
                        Err(Error::KeyNotFound(key)),
                        "FinalOp #{op_id}: {final_op:?}"
                    );
                    continue;
                };

                let split = avl.split(key).expect("present key must split");
                assert!(avl.is_empty());

                split.less.assert_invariants();
                split.greater.assert_invariants();

                let less: Vec<Key> = btree.range(..key).map(|(&k, _)| k).collect();
                let greater: Vec<Key> = btree
                    .range((Excluded(key), Unbounded))
                    .map(|(&k, _)| k)
                    .collect();

                assert_eq!(split.less.keys_in_order(), less, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(
                    split.greater.keys_in_order(),
                    greater,
                    "FinalOp #{op_id}: {final_op:?}"
                );
                assert_eq!((split.key, split.value), (key, expected));

                avl = split.less;
                avl.join(split.key, split.value, split.greater);
            }

            FinalOp::Join { above, len } => {
                // The pivot sits next to the existing keys, and the fresh run beyond it.
                let (pivot, step) = if above {
                    (btree.last_key_value().map_or(0, |(&k, _)| k + 1), 1)
                } else {
                    (btree.first_key_value().map_or(0, |(&k, _)| k - 1), -1)
                };

                let mut other = AvlTree::new();
                for i in 1..=Key::from(len) {
                    let key = pivot + i * step;
                    other.insert(key, value).expect("fresh keys are unique");
                    btree.insert(key, value);
                }
                btree.insert(pivot, value);

                avl.join(pivot, value, other);
            }
        }

        avl.assert_invariants();
        assert_eq!(btree.len(), avl.len());
        assert!(btree
            .iter()
            .map(|(&k, v)| (k, v))
            .eq(avl.iter()));
    }
}
