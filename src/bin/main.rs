use cordyceps_avl::AvlTree;

fn main() {
    let mut tree: AvlTree<String> = AvlTree::new();

    for key in [2, 0, 3, 4, 5, 1, 6] {
        let ops = tree.insert(key, format!("v{key}")).expect("keys are unique");
        tree.assert_invariants();
        println!("insert {key}: {ops}; {:?}", tree.keys_in_order());
    }

    let ops = tree.delete(0).expect("0 was inserted");
    tree.assert_invariants();
    println!("delete 0: {ops}; {:?}", tree.keys_in_order());

    let split = tree.split(3).expect("3 was inserted");
    println!(
        "split at {}: {:?} | {:?}",
        split.key,
        split.less.keys_in_order(),
        split.greater.keys_in_order()
    );

    let mut joined = split.less;
    let cost = joined.join(split.key, split.value, split.greater);
    joined.assert_invariants();
    println!("join cost {cost}: {joined:?}");

    let mut dot = String::new();
    joined
        .dotgraph("joined", &mut dot)
        .expect("writing to a String cannot fail");
    println!("{dot}");
}
