use std::{ops::Range, sync::Once};

use proptest::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::model::{self, TestNode};

use super::*;

fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn tree_of(keys: &[u32]) -> AvlTree<TestNode> {
    let mut tree = AvlTree::new();

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    tree
}

fn keys_of<C>(tree: &AvlTree<TestNode, C>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

// Calls `f` with every permutation of `0..n`.
fn for_each_permutation(n: u32, mut f: impl FnMut(&[u32])) {
    fn permute(keys: &mut Vec<u32>, k: usize, f: &mut impl FnMut(&[u32])) {
        if k == keys.len() {
            f(keys);
            return;
        }

        for i in k..keys.len() {
            keys.swap(k, i);
            permute(keys, k + 1, f);
            keys.swap(k, i);
        }
    }

    permute(&mut (0..n).collect(), 0, &mut f);
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
    }

    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    assert_eq!(keys_of(&tree), sorted);
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        unsafe { tree.remove_at(node) };
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key).map(|node| node.key), Some(*key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn zero_elems() {
    insert_find_all(&[]);
    insert_remove_all(&[]);
}

#[test]
fn permutations_find() {
    for n in 1..=6 {
        for_each_permutation(n, insert_find_all);
    }
}

#[test]
fn permutations_remove() {
    for n in 1..=6 {
        for_each_permutation(n, insert_remove_all);
    }
}

#[test]
fn ascending_stays_balanced() {
    let keys: Vec<u32> = (0..1024).collect();
    let tree = tree_of(&keys);

    // A perfectly balanced tree of 1024 nodes has height 10; AVL allows at most ~1.44 log2(n).
    let height = unsafe { tree.height(tree.root) };
    assert!(height <= 14, "height {height} too large");
}

#[test]
fn in_order_and_find() {
    let tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);

    assert_eq!(keys_of(&tree), [1, 3, 4, 5, 7, 8, 9]);
    assert_eq!(tree.find(&4).get().map(|node| node.key), Some(4));
    assert!(tree.find(&6) == tree.end());
    assert!(tree.find(&6).is_end());
}

#[test]
fn erase_root_repeatedly() {
    let mut tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);
    let mut expected = keys_of(&tree);

    while let Some(root) = tree.root {
        let key = unsafe { root.as_ref().key };
        let removed = unsafe { tree.remove_at(root) };
        assert_eq!(removed.key, key);

        expected.retain(|&k| k != key);
        tree.assert_invariants();
        assert_eq!(keys_of(&tree), expected);
    }

    assert!(expected.is_empty());
    assert_eq!(tree.len(), 0);
    assert!(tree.cursor_first() == tree.end());
}

#[test]
fn duplicates_counted_and_adjacent() {
    let tree = tree_of(&[1, 1, 1, 2, 3]);

    assert_eq!(tree.count(&1), 3);
    assert_eq!(tree.count(&2), 1);
    assert_eq!(tree.count(&99), 0);

    let many = tree_of(&[7; 100]);
    assert_eq!(many.count(&7), 100);
    assert_eq!(many.lower_bound(&7), many.cursor_first());
    assert!(many.upper_bound(&7).is_end());
}

#[test]
fn bounds() {
    let tree = tree_of(&[10, 20, 20, 30]);

    fn key(curs: Cursor<'_, TestNode, Natural>) -> Option<u32> {
        curs.get().map(|node| node.key)
    }

    assert_eq!(key(tree.lower_bound(&5)), Some(10));
    assert_eq!(key(tree.lower_bound(&20)), Some(20));
    assert_eq!(key(tree.lower_bound(&25)), Some(30));
    assert_eq!(key(tree.lower_bound(&31)), None);

    assert_eq!(key(tree.upper_bound(&5)), Some(10));
    assert_eq!(key(tree.upper_bound(&20)), Some(30));
    assert_eq!(key(tree.upper_bound(&25)), Some(30));
    assert_eq!(key(tree.upper_bound(&30)), None);

    let (lower, upper) = tree.equal_range(&20);
    assert_eq!(lower.peek_prev().map(|node| node.key), Some(10));
    assert_eq!(key(upper), Some(30));
}

#[test]
fn cursor_ring() {
    let tree = tree_of(&[1, 2, 3]);

    let mut curs = tree.end();
    curs.move_next();
    assert_eq!(curs, tree.cursor_first());

    curs.move_prev();
    assert_eq!(curs, tree.end());

    curs.move_prev();
    assert_eq!(curs, tree.cursor_last());
    assert_eq!(curs.get().map(|node| node.key), Some(3));
    assert_eq!(curs.peek_next().map(|node| node.key), None);

    let empty: AvlTree<TestNode> = AvlTree::new();
    let mut curs = empty.end();
    curs.move_next();
    assert!(curs.is_end());
    assert_eq!(curs.get().map(|node| node.key), None);
}

#[test]
fn unique_and_replacing_insert() {
    init_tracing();

    let mut tree = tree_of(&[2, 4]);

    let (curs, inserted) = tree.insert_unique(TestNode::new(4));
    assert!(!inserted);
    let existing = curs.get().map(|node| node as *const TestNode);
    assert_eq!(existing, tree.get(&4).map(|node| &*node as *const TestNode));
    assert_eq!(tree.len(), 2);

    let (_, inserted) = tree.insert_unique(TestNode::new(3));
    assert!(inserted);

    let (curs, replaced) = tree.insert_or_replace(TestNode::new(2));
    assert_eq!(curs.get().map(|node| node.key), Some(2));
    let replaced = replaced.expect("an equal key was present");
    assert_eq!(replaced.key, 2);
    assert!(replaced.links.parent().is_none());

    tree.assert_invariants();
    assert_eq!(keys_of(&tree), [2, 3, 4]);
}

#[test]
fn entry() {
    let mut tree = tree_of(&[1, 3]);

    match tree.entry(&2) {
        Entry::Vacant(vacant) => {
            unsafe { vacant.insert(TestNode::new(2)) };
        }
        Entry::Occupied(_) => panic!("2 is not in the tree"),
    }

    match tree.entry(&3) {
        Entry::Occupied(occupied) => assert_eq!(occupied.remove().key, 3),
        Entry::Vacant(_) => panic!("3 is in the tree"),
    }

    tree.assert_invariants();
    assert_eq!(keys_of(&tree), [1, 2]);
}

#[test]
fn clone_keeps_shape() {
    init_tracing();

    let tree = tree_of(&[8, 3, 10, 1, 6, 14, 4, 7, 13]);
    let copy = tree.clone_with(|node| TestNode::new(node.key));

    copy.assert_invariants();

    let mut original = String::new();
    let mut cloned = String::new();
    tree.dotgraph("t", &mut original).unwrap();
    copy.dotgraph("t", &mut cloned).unwrap();
    assert_eq!(original, cloned);

    drop(tree);
    assert_eq!(keys_of(&copy), [1, 3, 4, 6, 7, 8, 10, 13, 14]);
}

#[test]
fn swap_exchanges_comparators() {
    init_tracing();

    let mut a = AvlTree::with_comparator(Reversed(Natural));
    let mut b = AvlTree::with_comparator(Reversed(Natural));
    for key in [1, 2, 3] {
        a.insert(TestNode::new(key));
    }
    b.insert(TestNode::new(9));

    a.swap(&mut b);

    assert_eq!(keys_of(&a), [9]);
    assert_eq!(keys_of(&b), [3, 2, 1]);
    a.assert_invariants();
    b.assert_invariants();
}

#[test]
fn merge_conserves() {
    init_tracing();

    let mut a = tree_of(&[1, 2, 2, 5]);
    let mut b = tree_of(&[2, 3, 5, 8]);

    a.merge(&mut b);

    assert!(b.is_empty());
    assert_eq!(keys_of(&a), [1, 2, 2, 2, 3, 5, 5, 8]);
    a.assert_invariants();
}

#[test]
fn merge_unique_keeps_collisions() {
    init_tracing();

    let mut a = tree_of(&[1, 2, 5]);
    let mut b = tree_of(&[2, 3, 5, 8]);
    let total = a.len() + b.len();

    a.merge_unique(&mut b);

    assert_eq!(a.len() + b.len(), total);
    assert_eq!(keys_of(&a), [1, 2, 3, 5, 8]);
    assert_eq!(keys_of(&b), [2, 5]);
    a.assert_invariants();
    b.assert_invariants();
}

#[test]
fn iterators() {
    let tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 7);
    assert_eq!(iter.next().map(|node| node.key), Some(1));
    assert_eq!(iter.next_back().map(|node| node.key), Some(7));
    assert_eq!(iter.len(), 5);

    let middle: Vec<u32> = iter.map(|node| node.key).collect();
    assert_eq!(middle, [2, 3, 4, 5, 6]);

    let reversed: Vec<u32> = tree.into_iter().rev().map(|node| node.key).collect();
    assert_eq!(reversed, [7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn clear_and_reuse() {
    init_tracing();

    let mut tree = tree_of(&[3, 1, 2]);
    tree.clear();

    assert!(tree.is_empty());
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
    tree.assert_invariants();

    tree.insert(TestNode::new(5));
    assert_eq!(keys_of(&tree), [5]);
}

#[test]
fn max_len_is_positive() {
    let tree: AvlTree<TestNode> = AvlTree::new();
    assert!(tree.max_len() > 0);
}

#[test]
fn dotgraph_empty() {
    let tree: AvlTree<TestNode> = AvlTree::new();
    let mut out = String::new();
    tree.dotgraph("e", &mut out).unwrap();

    assert_eq!(out, "digraph \"graph-e\" {}");
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
    fn model_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_model_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        keys in proptest::collection::vec(0u32..32, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(keys, ops);
    }
}
