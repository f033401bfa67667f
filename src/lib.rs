//! An intrusive AVL tree, and the ordered map, set and multiset built on top of it.

// Conventions used in comments:
// - The height of a node `x` is denoted `h(x)`. A missing child has height -1, so leaves have
//   height 0.
// - The balance factor of a node `x` is `h(right(x)) - h(left(x))`.
// - A node is left-heavy if its balance factor is negative, right-heavy if positive.
//
// The invariants of the tree, restored before any public operation returns:
// 1. Every balance factor is -1, 0 or +1.
// 2. `h(x) = 1 + max(h(left(x)), h(right(x)))`.
// 3. An in-order traversal is non-decreasing under the tree's comparator. Equal keys are adjacent.
// 4. `first` and `last` point at the minimum and maximum nodes, and are `None` iff the tree is
//    empty.
// 5. `len` is the number of nodes reachable from `root`.
//
// The end position of a cursor is the "ghost" non-element, represented by a `None` link. It sits
// between the last and the first element.

use core::{
    cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin,
    ptr::NonNull,
};
use std::borrow::Borrow;

use cordyceps::Linked;

mod compare;
mod cursor;
mod debug;
mod entry;
mod error;
mod iter;
pub mod map;
pub mod multiset;
pub mod set;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use compare::{Comparator, FnComparator, Natural, Reversed};
pub use cursor::{Cursor, CursorMut};
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::{Error, Result};
pub use iter::{IntoIter, Iter};
pub use map::AvlMap;
pub use multiset::AvlMultiset;
pub use set::AvlSet;

pub trait TreeNode<L>: Linked<L> {
    type Key;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Nodes are owned by the tree between insertion and removal. Ordering is decided by the
/// comparator `C`, which is supplied at construction.
pub struct AvlTree<T, C = Natural>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    first: Link<T>,
    last: Link<T>,
    len: usize,
    cmp: C,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    height: i8,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

impl<T> AvlTree<T, Natural>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree ordered by [`Ord`].
    pub const fn new() -> AvlTree<T, Natural> {
        AvlTree::with_comparator(Natural)
    }
}

impl<T> Default for AvlTree<T, Natural>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> AvlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> AvlTree<T, C> {
        AvlTree {
            root: None,
            first: None,
            last: None,
            len: 0,
            cmp,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the comparator ordering this tree.
    pub const fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns the minimum element of the tree.
    ///
    /// This operation completes in _O(1)_ time.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.first
            .map(|first| unsafe { Pin::new_unchecked(first.as_ref()) })
    }

    /// Returns the maximum element of the tree.
    ///
    /// This operation completes in _O(1)_ time.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.last
            .map(|last| unsafe { Pin::new_unchecked(last.as_ref()) })
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first?;
        Some(unsafe { self.remove_at(first) })
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last?;
        Some(unsafe { self.remove_at(last) })
    }

    /// Returns a cursor pointing at the minimum element, or at the ghost element if the tree is
    /// empty.
    pub fn cursor_first(&self) -> Cursor<'_, T, C> {
        Cursor::first(self)
    }

    /// Returns a cursor pointing at the maximum element, or at the ghost element if the tree is
    /// empty.
    pub fn cursor_last(&self) -> Cursor<'_, T, C> {
        Cursor::last(self)
    }

    /// Returns a cursor pointing at the ghost element, one past the maximum.
    pub fn end(&self) -> Cursor<'_, T, C> {
        Cursor::at(self, None)
    }

    /// Returns an editing cursor pointing at the minimum element.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T, C> {
        CursorMut::first(self)
    }

    /// Returns an editing cursor pointing at the maximum element.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T, C> {
        CursorMut::last(self)
    }

    /// Returns an iterator over the elements of the tree, in order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter::new(self)
    }

    /// Exchanges the contents of two trees, including their comparators.
    ///
    /// No node is visited; this operation completes in _O(1)_ time.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
        tracing::trace!(len = self.len, other_len = other.len, "swapped trees");
    }

    /// Returns a deep copy of the tree with exactly the same shape.
    ///
    /// `f` produces a fresh, unlinked node equivalent to the node it is given.
    pub fn clone_with<F>(&self, mut f: F) -> Self
    where
        C: Clone,
        F: FnMut(&T) -> T::Handle,
    {
        let mut tree = AvlTree::with_comparator(self.cmp.clone());

        if let Some(root) = self.root {
            let root = unsafe { tree.clone_subtree(root, None, &mut f) };
            tree.root = Some(root);
            tree.len = self.len;
            tree.refresh_bounds();
        }

        tracing::trace!(len = tree.len, "cloned tree");
        tree
    }

    unsafe fn clone_subtree<F>(&mut self, src: NonNull<T>, parent: Link<T>, f: &mut F) -> NonNull<T>
    where
        F: FnMut(&T) -> T::Handle,
    {
        unsafe {
            let ptr = T::into_ptr(f(src.as_ref()));
            let links = self.links(ptr);
            links.clear();
            links.set_parent(parent);
            links.set_height(self.links(src).height());

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = self.links(src).child(dir) {
                    let copy = self.clone_subtree(child, Some(ptr), f);
                    self.links(ptr).set_child(dir, Some(copy));
                }
            }

            ptr
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let freed = self.len;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let (cur, parent) = self.min_in_subtree(cur);
                let parent = parent.or_else(|| self.links(cur).parent());

                let right = self.links(cur).right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                self.links(cur).clear();
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        self.first = None;
        self.last = None;

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);

        if freed > 0 {
            tracing::trace!(freed, "cleared tree");
        }
    }

    // Links ==================================================================

    #[inline]
    unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    unsafe fn height(&self, node: Link<T>) -> i8 {
        node.map(|n| unsafe { self.links(n).height() })
            .unwrap_or(-1)
    }

    #[inline]
    unsafe fn balance_factor(&self, node: NonNull<T>) -> i8 {
        unsafe {
            let links = self.links(node);
            self.height(links.right()) - self.height(links.left())
        }
    }

    #[inline]
    unsafe fn update_height(&mut self, node: NonNull<T>) {
        unsafe {
            let links = self.links(node);
            let height = 1 + self.height(links.left()).max(self.height(links.right()));
            links.set_height(height);
        }
    }

    unsafe fn which_child(&self, parent: NonNull<T>, child: Link<T>) -> Dir {
        if unsafe { self.links(parent).left() } == child {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that `old_child` is a child node of `parent`.
    unsafe fn replace_child(&mut self, parent: NonNull<T>, old_child: NonNull<T>, new_child: Link<T>) {
        unsafe {
            let links = self.links(parent);

            if links.left() == Some(old_child) {
                links.set_left(new_child);
            } else {
                debug_assert_eq!(
                    links.right(),
                    Some(old_child),
                    "`old_child` must be a child of `parent`"
                );
                links.set_right(new_child);
            }
        }
    }

    // Rotates the subtree rooted at `node` in direction `dir`, moving `node` down and its `!dir`
    // child up. Returns the new subtree root.
    //
    // The heights of both moved nodes are recomputed.
    unsafe fn rotate(&mut self, node: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let up = self
                .links(node)
                .child(!dir)
                .expect("rotation requires a child on the heavy side");

            // `across` goes from the `dir` child of `up` to the `!dir` child of `node`.
            let across = self.links(up).child(dir);
            self.links(node).set_child(!dir, across);
            self.maybe_set_parent(across, Some(node));

            let parent = self.links(node).parent();
            self.replace_child_or_set_root(parent, node, Some(up));
            self.links(up).set_parent(parent);

            self.links(up).set_child(dir, Some(node));
            self.links(node).set_parent(Some(up));

            self.update_height(node);
            self.update_height(up);

            up
        }
    }

    // Restores the balance of `node`, whose children are balanced and differ in height by at most
    // two. Returns the root of the rebalanced subtree.
    unsafe fn rebalance(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe {
            match self.balance_factor(node) {
                2 => {
                    let right = self.links(node).right().expect("right-heavy node");
                    if self.balance_factor(right) < 0 {
                        // Right-left case.
                        self.rotate(right, Dir::Right);
                    }
                    self.rotate(node, Dir::Left)
                }

                -2 => {
                    let left = self.links(node).left().expect("left-heavy node");
                    if self.balance_factor(left) > 0 {
                        // Left-right case.
                        self.rotate(left, Dir::Left);
                    }
                    self.rotate(node, Dir::Right)
                }

                bf => {
                    debug_assert!((-1..=1).contains(&bf), "balance factor {bf} out of range");
                    node
                }
            }
        }
    }

    // Walks from `start` to the root, recomputing heights and rebalancing every node on the path.
    unsafe fn rebalance_upward(&mut self, start: Link<T>) {
        let mut opt_cur = start;

        while let Some(cur) = opt_cur {
            unsafe {
                self.update_height(cur);
                let top = self.rebalance(cur);
                opt_cur = self.links(top).parent();
            }
        }
    }

    // Re-derives the cached minimum and maximum.
    fn refresh_bounds(&mut self) {
        unsafe {
            self.first = self.root.map(|root| self.min_in_subtree(root).0);
            self.last = self.root.map(|root| self.max_in_subtree(root));
        }
    }

    // Returns the minimum node in the subtree.
    //
    // If the subtree root is not the minimum, also returns the minimum node's parent.
    #[inline]
    unsafe fn min_in_subtree(&self, root: NonNull<T>) -> (NonNull<T>, Option<NonNull<T>>) {
        let mut parent = None;
        let mut cur = root;

        while let Some(left) = unsafe { self.links(cur).left() } {
            parent = Some(cur);
            cur = left;
        }

        (cur, parent)
    }

    #[inline]
    unsafe fn max_in_subtree(&self, root: NonNull<T>) -> NonNull<T> {
        let mut cur = root;

        while let Some(right) = unsafe { self.links(cur).right() } {
            cur = right;
        }

        cur
    }

    // Returns the in-order successor of `node`, or `None` if `node` is the maximum.
    unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe {
            if let Some(right) = self.links(node).right() {
                return Some(self.min_in_subtree(right).0);
            }

            // Climb while `cur` is a right child; the first ancestor reached from the left is
            // the successor.
            let mut cur = node;
            while let Some(parent) = self.links(cur).parent() {
                if self.links(parent).left() == Some(cur) {
                    return Some(parent);
                }
                cur = parent;
            }

            None
        }
    }

    // Returns the in-order predecessor of `node`, or `None` if `node` is the minimum.
    unsafe fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe {
            if let Some(left) = self.links(node).left() {
                return Some(self.max_in_subtree(left));
            }

            let mut cur = node;
            while let Some(parent) = self.links(cur).parent() {
                if self.links(parent).right() == Some(cur) {
                    return Some(parent);
                }
                cur = parent;
            }

            None
        }
    }

    // Links `ptr` into an empty tree.
    unsafe fn insert_as_root(&mut self, ptr: NonNull<T>) {
        debug_assert!(self.root.is_none());

        unsafe { self.links(ptr).clear() };

        self.root = Some(ptr);
        self.first = Some(ptr);
        self.last = Some(ptr);
        self.len += 1;
    }

    // Links `ptr` as the `dir` child of `parent`, which must not have one, then rebalances.
    unsafe fn insert_as_child(&mut self, parent: NonNull<T>, dir: Dir, ptr: NonNull<T>) {
        unsafe {
            debug_assert!(self.links(parent).child(dir).is_none());

            let links = self.links(ptr);
            links.clear();
            links.set_parent(Some(parent));
            self.links(parent).set_child(dir, Some(ptr));

            self.rebalance_upward(Some(parent));
        }

        self.len += 1;
        self.refresh_bounds();
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub(crate) unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        // There are two cases:
        //
        // 1. `node` has no right child.
        //
        //    Its left child (which may be None) is elevated into its place.
        //
        // 2. `node` has a right child.
        //
        //    `node`'s successor[^1] is unlinked from the right subtree by elevating the successor's
        //    right child, then takes `node`'s place, adopting both of its children.
        //
        // Either way, every node from the lowest structurally changed node up to the root has its
        // height recomputed and is rebalanced.
        //
        // [^1]: The successor of a node `a` is the least node in `a`'s right subtree.

        unsafe {
            let parent = self.links(node).parent();
            let left = self.links(node).left();
            let right = self.links(node).right();

            let rebalance_from = match right {
                None => {
                    self.replace_child_or_set_root(parent, node, left);
                    self.maybe_set_parent(left, parent);

                    parent
                }

                Some(right) => {
                    let (successor, successor_parent) = self.min_in_subtree(right);

                    let lowest = match successor_parent {
                        Some(successor_parent) => {
                            // Elevate the successor's right child to replace it.
                            let successor_right = self.links(successor).right();
                            self.links(successor_parent).set_left(successor_right);
                            self.maybe_set_parent(successor_right, Some(successor_parent));

                            self.links(successor).set_right(Some(right));
                            self.links(right).set_parent(Some(successor));

                            successor_parent
                        }

                        // The successor is `right` itself and keeps its right subtree.
                        None => successor,
                    };

                    self.links(successor).set_left(left);
                    self.maybe_set_parent(left, Some(successor));

                    self.replace_child_or_set_root(parent, node, Some(successor));
                    self.links(successor).set_parent(parent);

                    Some(lowest)
                }
            };

            self.rebalance_upward(rebalance_from);

            self.links(node).clear();
            self.len -= 1;
            self.refresh_bounds();

            T::from_ptr(node)
        }
    }
}

impl<T, C> AvlTree<T, C>
where
    T: TreeNode<Links<T>>,
{
    /// Returns the theoretical maximum number of elements the tree can hold.
    pub const fn max_len(&self) -> usize {
        let size = mem::size_of::<T>();
        if size == 0 {
            usize::MAX
        } else {
            isize::MAX as usize / size
        }
    }
}

impl<T, C> AvlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
    C: Comparator<T::Key>,
{
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let mut count = 0;

        if let Some(root) = self.root {
            unsafe {
                assert!(
                    self.links(root).parent().is_none(),
                    "root must not have a parent"
                );
                self.assert_invariants_at(root, &mut count);
            }
        }

        assert_eq!(count, self.len, "length must match the number of nodes");

        unsafe {
            assert_eq!(self.first, self.root.map(|r| self.min_in_subtree(r).0));
            assert_eq!(self.last, self.root.map(|r| self.max_in_subtree(r)));
        }

        let mut prev: Option<&T> = None;
        for node in self.iter() {
            if let Some(prev) = prev {
                assert_ne!(
                    self.cmp.compare(prev.key(), node.key()),
                    Ordering::Greater,
                    "in-order traversal must be non-decreasing"
                );
            }
            prev = Some(node);
        }
    }

    // Returns the height of `node`.
    unsafe fn assert_invariants_at(&self, node: NonNull<T>, count: &mut usize) -> i8 {
        *count += 1;

        unsafe {
            let links = self.links(node);
            let mut child_heights = [-1; 2];

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = links.child(dir) {
                    // Ensure child's parent link points to this node.
                    let parent = self.links(child).parent();
                    assert_eq!(parent, Some(node), "child's parent pointer not set");

                    child_heights[dir as usize] = self.assert_invariants_at(child, count);
                }
            }

            let [left, right] = child_heights;

            // Ensure the node is balanced and its height is up to date.
            assert!((right - left).abs() <= 1, "balance factor out of range");
            assert_eq!(links.height(), 1 + left.max(right), "stale height");

            links.height()
        }
    }

    /// Inserts an item into the tree, even if an element with an equal key is present.
    ///
    /// Equal keys descend to the right, so the new item is placed after any existing elements with
    /// an equal key. Returns a cursor pointing at the inserted item.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> CursorMut<'_, T, C> {
        let ptr = T::into_ptr(item);

        let Some(mut parent) = self.root else {
            unsafe { self.insert_as_root(ptr) };
            return CursorMut::at(self, Some(ptr));
        };

        // Descend the tree, looking for a free slot.
        loop {
            let dir = unsafe {
                if self.cmp.less(ptr.as_ref().key(), parent.as_ref().key()) {
                    Dir::Left
                } else {
                    Dir::Right
                }
            };

            match unsafe { self.links(parent).child(dir) } {
                // Descend.
                Some(child) => parent = child,

                // Set `item` as child.
                None => {
                    unsafe { self.insert_as_child(parent, dir, ptr) };
                    break;
                }
            }
        }

        CursorMut::at(self, Some(ptr))
    }

    /// Inserts an item into the tree if no element with an equal key is present.
    ///
    /// Returns a cursor pointing at the inserted item and `true`, or, if an equal key was found, a
    /// cursor pointing at the existing element and `false`. In the latter case `item` is dropped.
    pub fn insert_unique(&mut self, item: T::Handle) -> (CursorMut<'_, T, C>, bool) {
        let ptr = T::into_ptr(item);
        let key = unsafe { ptr.as_ref().key() };

        match self.entry(key) {
            Entry::Occupied(occupied) => {
                drop(unsafe { T::from_ptr(ptr) });
                (occupied.into_cursor(), false)
            }

            Entry::Vacant(vacant) => (unsafe { vacant.insert_ptr(ptr) }, true),
        }
    }

    /// Inserts an item into the tree, replacing an element with an equal key if one is present.
    ///
    /// The replacement takes over the position of the replaced element. Returns a cursor pointing
    /// at `item` and the replaced element, if any.
    pub fn insert_or_replace(
        &mut self,
        item: T::Handle,
    ) -> (CursorMut<'_, T, C>, Option<T::Handle>) {
        let ptr = T::into_ptr(item);
        let key = unsafe { ptr.as_ref().key() };

        match self.entry(key) {
            Entry::Occupied(mut occupied) => {
                let old = unsafe { occupied.replace_ptr(ptr) };
                (occupied.into_cursor(), Some(old))
            }

            Entry::Vacant(vacant) => (unsafe { vacant.insert_ptr(ptr) }, None),
        }
    }

    /// Returns the entry for `key`: the element with an equal key, or the slot it would occupy.
    pub fn entry<Q>(&mut self, key: &Q) -> Entry<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let Some(mut cur) = self.root else {
            return unsafe { Entry::vacant_root(self) };
        };

        loop {
            let cur_key: &Q = unsafe { cur.as_ref() }.key().borrow();
            let dir = match Comparator::<Q>::compare(&self.cmp, key, cur_key) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return unsafe { Entry::occupied(self, cur) },
                Ordering::Greater => Dir::Right,
            };

            match unsafe { self.links(cur).child(dir) } {
                Some(child) => cur = child,
                None => return unsafe { Entry::vacant_child(self, cur, dir) },
            }
        }
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                let cur_key: &Q = cur.as_ref().key().borrow();
                match Comparator::<Q>::compare(&self.cmp, key, cur_key) {
                    Ordering::Less => opt_cur = self.links(cur).left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = self.links(cur).right(),
                }
            }
        }
    }

    // Returns the first node whose key is not less than `key`.
    fn lower_bound_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut opt_cur = self.root;
        let mut bound = None;

        while let Some(cur) = opt_cur {
            unsafe {
                let cur_key: &Q = cur.as_ref().key().borrow();
                if Comparator::<Q>::less(&self.cmp, cur_key, key) {
                    opt_cur = self.links(cur).right();
                } else {
                    bound = Some(cur);
                    opt_cur = self.links(cur).left();
                }
            }
        }

        bound
    }

    // Returns the first node whose key is greater than `key`.
    fn upper_bound_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut opt_cur = self.root;
        let mut bound = None;

        while let Some(cur) = opt_cur {
            unsafe {
                let cur_key: &Q = cur.as_ref().key().borrow();
                if Comparator::<Q>::less(&self.cmp, key, cur_key) {
                    bound = Some(cur);
                    opt_cur = self.links(cur).left();
                } else {
                    opt_cur = self.links(cur).right();
                }
            }
        }

        bound
    }

    /// Returns `true` if the tree contains an element with a key equal to `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get_raw(key).is_some()
    }

    /// Returns a reference to an element with a key equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to an element with a key equal to `key`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that neither the links nor the key of the returned item are
    /// modified.
    pub unsafe fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns a cursor pointing at an element with a key equal to `key`, or at the ghost element
    /// if there is none.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor::at(self, self.get_raw(key))
    }

    /// Returns an editing cursor pointing at an element with a key equal to `key`, or at the ghost
    /// element if there is none.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let ptr = self.get_raw(key);
        CursorMut::at(self, ptr)
    }

    /// Returns a cursor pointing at the first element whose key is not less than `key`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor::at(self, self.lower_bound_raw(key))
    }

    /// Returns an editing cursor pointing at the first element whose key is not less than `key`.
    pub fn lower_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let ptr = self.lower_bound_raw(key);
        CursorMut::at(self, ptr)
    }

    /// Returns a cursor pointing at the first element whose key is greater than `key`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor::at(self, self.upper_bound_raw(key))
    }

    /// Returns an editing cursor pointing at the first element whose key is greater than `key`.
    pub fn upper_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let ptr = self.upper_bound_raw(key);
        CursorMut::at(self, ptr)
    }

    /// Returns the half-open cursor range of the elements whose keys are equal to `key`.
    pub fn equal_range<Q>(&self, key: &Q) -> (Cursor<'_, T, C>, Cursor<'_, T, C>)
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        (self.lower_bound(key), self.upper_bound(key))
    }

    /// Returns the number of elements whose keys are equal to `key`.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let (mut lower, upper) = self.equal_range(key);
        let mut count = 0;

        while lower != upper {
            count += 1;
            lower.move_next();
        }

        count
    }

    /// Removes an element with a key equal to `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let ptr = self.get_raw(key)?;
        Some(unsafe { self.remove_at(ptr) })
    }

    /// Moves every element of `other` into `self`, permitting duplicate keys.
    ///
    /// `other` is left empty.
    pub fn merge(&mut self, other: &mut Self) {
        let moved = other.len();

        while let Some(item) = other.pop_first() {
            self.insert(item);
        }

        tracing::debug!(moved, len = self.len, "merged trees");
    }

    /// Moves the elements of `other` whose keys are not present in `self` into `self`.
    ///
    /// Elements whose keys collide with an element of `self` remain in `other`.
    pub fn merge_unique(&mut self, other: &mut Self) {
        let mut moved = 0;
        let mut kept = 0;
        let mut curs = other.cursor_first_mut();

        while let Some(node) = curs.get() {
            if self.contains_key(node.key()) {
                kept += 1;
                curs.move_next();
            } else if let Some(item) = curs.remove_current() {
                moved += 1;
                self.insert(item);
            }
        }

        tracing::debug!(moved, kept, len = self.len, "merged trees by unique key");
    }
}

impl<T, C> Drop for AvlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C> fmt::Debug for AvlTree<T, C>
where
    T: TreeNode<Links<T>> + fmt::Debug + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'tree, T, C> IntoIterator for &'tree AvlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C> IntoIterator for AvlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = T::Handle;
    type IntoIter = IntoIter<T, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                height: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    // Links are only read and written by the tree that owns the node, which holds either a shared
    // or an exclusive borrow of itself for the duration of the access.

    #[inline]
    fn height(&self) -> i8 {
        unsafe { (*self.inner.get()).height }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&self, parent: Link<T>) -> Link<T> {
        unsafe { mem::replace(&mut (*self.inner.get()).parent, parent) }
    }

    #[inline]
    fn set_child(&self, dir: Dir, child: Link<T>) -> Link<T> {
        unsafe { mem::replace(&mut (*self.inner.get()).children[dir as usize], child) }
    }

    #[inline]
    fn set_left(&self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_height(&self, height: i8) {
        unsafe { (*self.inner.get()).height = height };
    }

    // Resets the links to those of a detached leaf.
    #[inline]
    fn clear(&self) {
        self.set_parent(None);
        self.set_left(None);
        self.set_right(None);
        self.set_height(0);
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("height", &self.height())
            .finish()
    }
}
