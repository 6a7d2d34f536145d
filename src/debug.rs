use alloc::{collections::VecDeque, string::String};
use core::{fmt, ptr::NonNull};

use crate::{
    balance_pair, height, key, max_of, min_of,
    node::{links, Node},
    parent, AvlTree, Dir, Key,
};

impl<V> AvlTree<V> {
    /// Writes the tree to `w` as a Graphviz digraph named `name`.
    ///
    /// Nodes are labelled `key:height:size`, laid out one rank per tree level. Missing children
    /// are drawn as points so that left and right children can be told apart.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, mut w: W) -> fmt::Result {
        let Some(root) = self.root else {
            return write!(w, "digraph \"graph-{name}\" {{}}");
        };

        enum Item<V> {
            Node(NonNull<Node<V>>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let node = match queue.pop_front() {
                    Some(Item::Node(node)) => node,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let (key, links) = unsafe { (key(node), links(node)) };
                write!(
                    w,
                    "\"graph{name}-{key}\" [label=\"{key}:{}:{}\"]; ",
                    links.height(),
                    links.size()
                )?;

                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = links.child(dir) {
                        let child_key = unsafe { crate::key(child) };

                        queue.push_back(Item::Node(child));
                        writeln!(
                            edges,
                            "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                        )?;
                    } else {
                        queue.push_back(Item::Missing(missing));
                        writeln!(
                            edges,
                            "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                        )?;
                        missing += 1;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }

    /// Panics if any structural invariant of the tree is violated.
    ///
    /// Checks key order, AVL balance, stored heights and subtree sizes, parent links and the
    /// cached extremes.
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert!(self.min.is_none(), "empty tree has a cached minimum");
            assert!(self.max.is_none(), "empty tree has a cached maximum");
            return;
        };

        unsafe {
            assert!(parent(root).is_none(), "root has a parent");
            Self::assert_invariants_at(root, None, None);

            assert_eq!(self.min, Some(min_of(root)), "stale cached minimum");
            assert_eq!(self.max, Some(max_of(root)), "stale cached maximum");
        }
    }

    // Checks the subtree at `node`, whose keys must lie strictly between `lower` and `upper`.
    unsafe fn assert_invariants_at(node: NonNull<Node<V>>, lower: Option<Key>, upper: Option<Key>) {
        unsafe {
            let key = key(node);
            let links = links(node);

            if let Some(lower) = lower {
                assert!(key > lower, "key {key} is not above {lower}");
            }

            if let Some(upper) = upper {
                assert!(key < upper, "key {key} is not below {upper}");
            }

            // Leaves have height 0.
            if links.is_leaf() {
                assert_eq!(links.height(), 0, "leaf {key} has nonzero height");
            }

            let expected_height = height(links.left()).max(height(links.right())) + 1;
            assert_eq!(links.height(), expected_height, "wrong height at {key}");

            let pair = balance_pair(node);
            assert!(
                matches!(pair, (1, 1) | (1, 2) | (2, 1)),
                "node {key} is {pair:?}"
            );

            let mut size = 1;

            for (dir, lower, upper) in [
                (Dir::Left, lower, Some(key)),
                (Dir::Right, Some(key), upper),
            ] {
                if let Some(child) = links.child(dir) {
                    assert_eq!(parent(child), Some(node), "bad parent link below {key}");

                    Self::assert_invariants_at(child, lower, upper);
                    size += crate::links(child).size();
                }
            }

            assert_eq!(links.size(), size, "wrong size at {key}");
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::prelude::v1::*;

    use crate::AvlTree;

    #[test]
    fn dotgraph_empty() {
        let tree: AvlTree<()> = AvlTree::new();
        let mut out = String::new();
        tree.dotgraph("empty", &mut out).unwrap();
        assert_eq!(out, "digraph \"graph-empty\" {}");
    }

    #[test]
    fn dotgraph_labels() {
        let tree: AvlTree<()> = [(2, ()), (1, ()), (3, ())].into_iter().collect();
        let mut out = String::new();
        tree.dotgraph("t", &mut out).unwrap();

        assert!(out.contains("\"grapht-2\" [label=\"2:1:3\"]"));
        assert!(out.contains("\"grapht-1\" [label=\"1:0:1\"]"));
        assert!(out.contains("\"grapht-2\" -> \"grapht-3\";"));
        assert!(out.contains("[shape=point]"));
        assert!(out.ends_with(" }\n}"));
    }

    #[test]
    #[should_panic]
    fn catches_bad_height() {
        let tree: AvlTree<()> = (0..3).map(|key| (key, ())).collect();
        let root = tree.root.unwrap();
        unsafe { crate::node::links_mut(root).set_height(5) };
        tree.assert_invariants();
    }
}
