//! Model-based checking of [`AvlTree`] against a sorted `Vec` multiset.
//!
//! Shared by the property tests and the fuzz targets.

use std::ptr::NonNull;

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::strategy::{Just, Strategy};

use crate::{AvlTree, Links, TreeNode};

#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
}

impl TestNode {
    pub fn new(key: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

/// A key, either picked from the keys currently in the tree or drawn at random.
#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum KeyChoice {
    Existing(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn existing_strategy()(
        index in 0usize..1000,
    ) -> KeyChoice {
        KeyChoice::Existing(index)
    }
}

proptest::prop_compose! {
    // Small keys, so that duplicates are common.
    fn random_strategy()(
        random in 0u32..64,
    ) -> KeyChoice {
        KeyChoice::Random(random)
    }
}

fn key_strategy() -> impl Strategy<Value = KeyChoice> {
    proptest::prop_oneof![existing_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(KeyChoice),
    InsertUnique(KeyChoice),
    InsertOrReplace(KeyChoice),
    Remove(KeyChoice),
    RemoveAtLowerBound(KeyChoice),
    Find(KeyChoice),
    Count(KeyChoice),
    LowerBound(KeyChoice),
    UpperBound(KeyChoice),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    fn resolve(self, sorted: &[u32]) -> Resolved {
        fn key(sorted: &[u32], choice: KeyChoice) -> u32 {
            match choice {
                KeyChoice::Existing(idx) if !sorted.is_empty() => sorted[idx % sorted.len()],
                KeyChoice::Existing(idx) => idx as u32,
                KeyChoice::Random(key) => key,
            }
        }

        match self {
            Op::Insert(k) => Resolved::Insert(key(sorted, k)),
            Op::InsertUnique(k) => Resolved::InsertUnique(key(sorted, k)),
            Op::InsertOrReplace(k) => Resolved::InsertOrReplace(key(sorted, k)),
            Op::Remove(k) => Resolved::Remove(key(sorted, k)),
            Op::RemoveAtLowerBound(k) => Resolved::RemoveAtLowerBound(key(sorted, k)),
            Op::Find(k) => Resolved::Find(key(sorted, k)),
            Op::Count(k) => Resolved::Count(key(sorted, k)),
            Op::LowerBound(k) => Resolved::LowerBound(key(sorted, k)),
            Op::UpperBound(k) => Resolved::UpperBound(key(sorted, k)),
            Op::First => Resolved::First,
            Op::PopFirst => Resolved::PopFirst,
            Op::Last => Resolved::Last,
            Op::PopLast => Resolved::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum Resolved {
    Insert(u32),
    InsertUnique(u32),
    InsertOrReplace(u32),
    Remove(u32),
    RemoveAtLowerBound(u32),
    Find(u32),
    Count(u32),
    LowerBound(u32),
    UpperBound(u32),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        key_strategy().prop_map(Op::Insert),
        key_strategy().prop_map(Op::InsertUnique),
        key_strategy().prop_map(Op::InsertOrReplace),
        key_strategy().prop_map(Op::Remove),
        key_strategy().prop_map(Op::RemoveAtLowerBound),
        key_strategy().prop_map(Op::Find),
        key_strategy().prop_map(Op::Count),
        key_strategy().prop_map(Op::LowerBound),
        key_strategy().prop_map(Op::UpperBound),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

/// Replays `ops` on an [`AvlTree`] and on a sorted `Vec`, asserting that both agree after every
/// operation and that the tree's invariants hold.
pub fn run_model_equivalence(ops: Vec<Op>) {
    let mut sorted: Vec<u32> = Vec::with_capacity(ops.len());
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    #[inline]
    #[allow(clippy::boxed_local)]
    fn node_key(node: Box<TestNode>) -> u32 {
        node.key
    }

    #[inline]
    fn ref_key(node: &TestNode) -> u32 {
        node.key
    }

    // Index of the first element not less than `key`.
    fn lower(v: &[u32], key: u32) -> usize {
        v.partition_point(|&x| x < key)
    }

    // Index of the first element greater than `key`.
    fn upper(v: &[u32], key: u32) -> usize {
        v.partition_point(|&x| x <= key)
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let resolved = op.resolve(&sorted);

        match resolved {
            Resolved::Insert(key) => {
                let at = upper(&sorted, key);
                sorted.insert(at, key);

                let curs = tree.insert(TestNode::new(key));
                assert_eq!(curs.get().map(ref_key), Some(key), "op #{op_id}: {resolved:?}");
            }

            Resolved::InsertUnique(key) => {
                let absent = !sorted.contains(&key);
                if absent {
                    let at = upper(&sorted, key);
                    sorted.insert(at, key);
                }

                let (curs, inserted) = tree.insert_unique(TestNode::new(key));
                assert_eq!(inserted, absent, "op #{op_id}: {resolved:?}");
                assert_eq!(curs.get().map(ref_key), Some(key), "op #{op_id}: {resolved:?}");
            }

            Resolved::InsertOrReplace(key) => {
                let present = sorted.binary_search(&key).is_ok();
                if !present {
                    let at = upper(&sorted, key);
                    sorted.insert(at, key);
                }

                let node = TestNode::new(key);
                let new_ptr: *const TestNode = &*node;
                let (curs, replaced) = tree.insert_or_replace(node);
                let at = curs.get().map(|node| node as *const TestNode);
                assert_eq!(at, Some(new_ptr), "op #{op_id}: {resolved:?}");

                let replaced = replaced.map(|old| {
                    assert!(old.links.parent().is_none(), "op #{op_id}: {resolved:?}");
                    assert!(old.links.left().is_none(), "op #{op_id}: {resolved:?}");
                    assert!(old.links.right().is_none(), "op #{op_id}: {resolved:?}");
                    node_key(old)
                });
                assert_eq!(replaced, present.then_some(key), "op #{op_id}: {resolved:?}");
            }

            Resolved::RemoveAtLowerBound(key) => {
                let at = lower(&sorted, key);
                let from_model = (at < sorted.len()).then(|| sorted.remove(at));

                let mut curs = tree.lower_bound_mut(&key);
                let from_tree = curs.remove_current().map(node_key);
                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
                assert_eq!(
                    curs.get().map(ref_key),
                    sorted.get(at).copied(),
                    "op #{op_id}: {resolved:?}"
                );
            }

            Resolved::Remove(key) => {
                let from_model = sorted
                    .binary_search(&key)
                    .ok()
                    .map(|idx| sorted.remove(idx));
                let from_tree = tree.remove(&key).map(node_key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
            }

            Resolved::Find(key) => {
                let from_model = sorted.contains(&key).then_some(key);
                let from_tree = tree.find(&key).get().map(ref_key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
                assert_eq!(tree.contains_key(&key), from_model.is_some());
            }

            Resolved::Count(key) => {
                let from_model = upper(&sorted, key) - lower(&sorted, key);
                let from_tree = tree.count(&key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
            }

            Resolved::LowerBound(key) => {
                let from_model = sorted.get(lower(&sorted, key)).copied();
                let from_tree = tree.lower_bound(&key).get().map(ref_key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
            }

            Resolved::UpperBound(key) => {
                let from_model = sorted.get(upper(&sorted, key)).copied();
                let from_tree = tree.upper_bound(&key).get().map(ref_key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
            }

            Resolved::First => {
                let from_model = sorted.first().copied();
                let from_tree = tree.first().map(|node| node.key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
            }

            Resolved::PopFirst => {
                let from_model = (!sorted.is_empty()).then(|| sorted.remove(0));
                let from_tree = tree.pop_first().map(node_key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
            }

            Resolved::Last => {
                let from_model = sorted.last().copied();
                let from_tree = tree.last().map(|node| node.key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
            }

            Resolved::PopLast => {
                let from_model = sorted.pop();
                let from_tree = tree.pop_last().map(node_key);

                assert_eq!(from_model, from_tree, "op #{op_id}: {resolved:?}");
            }
        }

        tree.assert_invariants();
        assert_eq!(sorted.len(), tree.len());
        assert!(sorted.iter().copied().eq(tree.iter().map(ref_key)));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MovePrev,
    MoveNext,
    PeekNext,
    PeekPrev,
    RemoveCurrent,
    RemoveCurrentMovePrev,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        Just(CursorOp::RemoveCurrent),
        Just(CursorOp::RemoveCurrentMovePrev),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub keys: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn key(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u8::arbitrary(u).map(u32::from).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_keys = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let keys = core::iter::repeat_with(|| key(u))
            .take(num_keys.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { keys, ops })
    }
}

/// Replays cursor movements and removals on an [`AvlTree`] holding `keys` (duplicates included)
/// and on an index into the sorted keys.
pub fn run_cursor_equivalence(mut keys: Vec<u32>, ops: Vec<CursorOp>) {
    keys.sort_unstable();

    // `None` is the end position.
    let mut vec = Vec::new();
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for key in keys {
        vec.push(key);
        tree.insert(TestNode::new(key));
    }

    fn vec_curs_prev(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_sub(1),
            None => v.len().checked_sub(1),
        }
    }

    fn vec_curs_next(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_add(1).filter(|&i| i < v.len()),
            None => (!v.is_empty()).then_some(0),
        }
    }

    let mut vec_curs = vec_curs_next(&vec, None);
    let mut tree_curs = tree.cursor_first_mut();

    // Check that the initial states are equivalent.
    {
        let v = vec_curs.map(|i| &vec[i]);
        let t = tree_curs.get().map(TestNode::key);

        assert_eq!(v, t);
    }

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                vec_curs = vec_curs_next(&vec, vec_curs);
                tree_curs.move_next();
            }

            CursorOp::MovePrev => {
                vec_curs = vec_curs_prev(&vec, vec_curs);
                tree_curs.move_prev();
            }

            CursorOp::PeekNext => {
                let v = vec_curs_next(&vec, vec_curs).map(|i| &vec[i]);
                let t = tree_curs.peek_next().map(TestNode::key);

                assert_eq!(v, t);
            }

            CursorOp::PeekPrev => {
                let v = vec_curs_prev(&vec, vec_curs).map(|i| &vec[i]);
                let t = tree_curs.peek_prev().map(TestNode::key);

                assert_eq!(v, t);
            }

            CursorOp::RemoveCurrent => {
                let v = vec_curs.map(|i| vec.remove(i));

                if vec_curs == Some(vec.len()) {
                    vec_curs = None;
                }

                let t = tree_curs.remove_current().map(|node| node.key);

                assert_eq!(v, t);
            }

            CursorOp::RemoveCurrentMovePrev => {
                let new_v_curs = vec_curs.is_some().then(|| vec_curs_prev(&vec, vec_curs));
                let v = vec_curs.map(|i| vec.remove(i));

                if let Some(vc) = new_v_curs {
                    vec_curs = vc;
                }

                let t = tree_curs
                    .remove_current_and_move_prev()
                    .map(|node| node.key);

                assert_eq!(v, t);
            }
        }

        let v = vec_curs.map(|i| &vec[i]);
        let t = tree_curs.get().map(TestNode::key);

        assert_eq!(v, t);
    }

    drop(tree_curs);
    tree.assert_invariants();
    assert!(vec.iter().eq(tree.iter().map(TestNode::key)));
}
