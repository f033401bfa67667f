//! An ordered set, and the key-only node and cursors it shares with the multiset.

use core::{
    borrow::Borrow,
    fmt,
    iter::FusedIterator,
    marker::PhantomPinned,
    ptr::{self, NonNull},
};

use cordyceps::Linked;

use crate::{AvlTree, Comparator, Links, Natural, TreeNode};

/// An ordered set based on an [AVL tree].
///
/// Keys are unique under the comparator `C`.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlSet<K, C = Natural> {
    tree: AvlTree<SetNode<K>, C>,
}

pub(crate) struct SetNode<K> {
    links: Links<SetNode<K>>,
    pub(crate) key: K,
    _unpin: PhantomPinned,
}

impl<K> SetNode<K> {
    pub(crate) fn new(key: K) -> Box<Self> {
        Box::new(SetNode {
            links: Links::new(),
            key,
            _unpin: PhantomPinned,
        })
    }

    pub(crate) fn into_key(self: Box<Self>) -> K {
        self.key
    }
}

unsafe impl<K> Linked<Links<SetNode<K>>> for SetNode<K> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<SetNode<K>>> {
        // SAFETY: `ptr` is non-null, so the address of its field is too.
        unsafe { NonNull::new_unchecked(ptr::addr_of_mut!((*ptr.as_ptr()).links)) }
    }
}

impl<K> TreeNode<Links<SetNode<K>>> for SetNode<K> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

// SAFETY: the set exclusively owns its nodes.
unsafe impl<K: Send, C: Send> Send for AvlSet<K, C> {}
unsafe impl<K: Sync, C: Sync> Sync for AvlSet<K, C> {}

impl<K> AvlSet<K, Natural> {
    /// Creates a new, empty `AvlSet` ordered by [`Ord`].
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }
}

impl<K, C> AvlSet<K, C> {
    /// Creates a new, empty `AvlSet` ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            tree: AvlTree::with_comparator(cmp),
        }
    }

    /// Returns `true` if the set contains no keys.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of keys in the set.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the theoretical maximum number of elements the set can hold.
    pub const fn max_size(&self) -> usize {
        self.tree.max_len()
    }

    /// Returns the comparator ordering the set.
    pub const fn comparator(&self) -> &C {
        self.tree.comparator()
    }

    /// Returns the minimum key in the set.
    pub fn first(&self) -> Option<&K> {
        self.tree.first().map(|node| &node.get_ref().key)
    }

    /// Returns the maximum key in the set.
    pub fn last(&self) -> Option<&K> {
        self.tree.last().map(|node| &node.get_ref().key)
    }

    /// Removes and returns the minimum key in the set.
    pub fn pop_first(&mut self) -> Option<K> {
        self.tree.pop_first().map(SetNode::into_key)
    }

    /// Removes and returns the maximum key in the set.
    pub fn pop_last(&mut self) -> Option<K> {
        self.tree.pop_last().map(SetNode::into_key)
    }

    /// Returns a cursor pointing at the minimum key, or at the end position if the set is empty.
    pub fn cursor_first(&self) -> Cursor<'_, K, C> {
        Cursor(self.tree.cursor_first())
    }

    /// Returns a cursor pointing at the maximum key, or at the end position if the set is empty.
    pub fn cursor_last(&self) -> Cursor<'_, K, C> {
        Cursor(self.tree.cursor_last())
    }

    /// Returns a cursor pointing past the maximum key.
    pub fn end(&self) -> Cursor<'_, K, C> {
        Cursor(self.tree.end())
    }

    /// Returns an editing cursor pointing at the minimum key.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, C> {
        CursorMut(self.tree.cursor_first_mut())
    }

    /// Returns an editing cursor pointing at the maximum key.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, K, C> {
        CursorMut(self.tree.cursor_last_mut())
    }

    /// Returns an iterator over the keys of the set, in order.
    pub fn iter(&self) -> Iter<'_, K, C> {
        Iter(self.tree.iter())
    }

    /// Exchanges the contents of two sets.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    /// Removes every key from the set.
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K, C> AvlSet<K, C>
where
    C: Comparator<K>,
{
    /// Returns `true` if the set contains `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns the key in the set equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().key)
    }

    /// Returns a cursor pointing at `key`, or past the maximum key if it is not present.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor(self.tree.find(key))
    }

    /// Returns an editing cursor pointing at `key`, or at the end position if it is not present.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        CursorMut(self.tree.find_mut(key))
    }

    /// Returns a cursor pointing at the first key not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor(self.tree.lower_bound(key))
    }

    /// Returns an editing cursor pointing at the first key not less than `key`.
    pub fn lower_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        CursorMut(self.tree.lower_bound_mut(key))
    }

    /// Returns a cursor pointing at the first key greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor(self.tree.upper_bound(key))
    }

    /// Returns an editing cursor pointing at the first key greater than `key`.
    pub fn upper_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        CursorMut(self.tree.upper_bound_mut(key))
    }

    /// Inserts `key` if it is not already present.
    ///
    /// Returns a cursor pointing at the key in the set, and whether the insertion took place.
    pub fn insert(&mut self, key: K) -> (CursorMut<'_, K, C>, bool) {
        let (curs, inserted) = self.tree.insert_unique(SetNode::new(key));
        (CursorMut(curs), inserted)
    }

    /// Inserts every key of `iter`, returning for each whether it was inserted.
    pub fn insert_many<I>(&mut self, iter: I) -> Vec<bool>
    where
        I: IntoIterator<Item = K>,
    {
        iter.into_iter().map(|key| self.insert(key).1).collect()
    }

    /// Removes `key` from the set, returning whether it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes and returns the key in the set equal to `key`.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.remove(key).map(SetNode::into_key)
    }

    /// Moves the keys of `other` that are not present in `self` into `self`.
    ///
    /// Colliding keys remain in `other`.
    pub fn merge(&mut self, other: &mut Self) {
        self.tree.merge_unique(&mut other.tree);
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

impl<K> Default for AvlSet<K, Natural> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, C: Clone> Clone for AvlSet<K, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone_with(|node| SetNode::new(node.key.clone())),
        }
    }
}

impl<K: fmt::Debug, C> fmt::Debug for AvlSet<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, C> PartialEq for AvlSet<K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, C> Eq for AvlSet<K, C> {}

impl<K, C> Extend<K> for AvlSet<K, C>
where
    C: Comparator<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, C> FromIterator<K> for AvlSet<K, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = AvlSet::with_comparator(C::default());
        set.extend(iter);
        set
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for AvlSet<K, Natural> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K, C> IntoIterator for &'a AvlSet<K, C> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, C> IntoIterator for AvlSet<K, C> {
    type Item = K;
    type IntoIter = IntoIter<K, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.tree.into_iter())
    }
}

// Cursors ====================================================================

/// A cursor over the keys of an [`AvlSet`] or [`AvlMultiset`](crate::AvlMultiset).
///
/// Besides the keys, a cursor may point at the end position, past the maximum key.
pub struct Cursor<'a, K, C>(pub(crate) crate::Cursor<'a, SetNode<K>, C>);

impl<'a, K, C> Cursor<'a, K, C> {
    /// Returns `true` if the cursor is at the end position.
    pub fn is_end(&self) -> bool {
        self.0.is_end()
    }

    /// Moves the cursor to the next position, wrapping from the end position to the first.
    pub fn move_next(&mut self) {
        self.0.move_next();
    }

    /// Moves the cursor to the previous position, wrapping from the end position to the last.
    pub fn move_prev(&mut self) {
        self.0.move_prev();
    }

    /// Returns the key the cursor points at, or `None` at the end position.
    pub fn get(&self) -> Option<&'a K> {
        self.0.get().map(|node| &node.key)
    }

    /// Returns the element after the cursor, without moving it.
    pub fn peek_next(&self) -> Option<&'a K> {
        self.0.peek_next().map(|node| &node.key)
    }

    /// Returns the element before the cursor, without moving it.
    pub fn peek_prev(&self) -> Option<&'a K> {
        self.0.peek_prev().map(|node| &node.key)
    }
}

impl<K, C> Clone for Cursor<'_, K, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, C> Copy for Cursor<'_, K, C> {}

impl<K, C> PartialEq for Cursor<'_, K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<K, C> Eq for Cursor<'_, K, C> {}

impl<K: fmt::Debug, C> fmt::Debug for Cursor<'_, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// A cursor over the keys of an [`AvlSet`] or [`AvlMultiset`](crate::AvlMultiset) which permits
/// removing keys.
pub struct CursorMut<'a, K, C>(pub(crate) crate::CursorMut<'a, SetNode<K>, C>);

impl<'a, K, C> CursorMut<'a, K, C> {
    /// Returns a read-only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, K, C> {
        Cursor(self.0.as_cursor())
    }

    /// Converts this cursor into a read-only cursor at the same position.
    pub fn into_cursor(self) -> Cursor<'a, K, C> {
        Cursor(self.0.into_cursor())
    }

    /// Returns `true` if the cursor is at the end position.
    pub fn is_end(&self) -> bool {
        self.0.is_end()
    }

    /// Moves the cursor to the next position, wrapping from the end position to the first.
    pub fn move_next(&mut self) {
        self.0.move_next();
    }

    /// Moves the cursor to the previous position, wrapping from the end position to the last.
    pub fn move_prev(&mut self) {
        self.0.move_prev();
    }

    pub fn get(&self) -> Option<&K> {
        self.0.get().map(|node| &node.key)
    }

    /// Returns the element after the cursor, without moving it.
    pub fn peek_next(&self) -> Option<&K> {
        self.0.peek_next().map(|node| &node.key)
    }

    /// Returns the element before the cursor, without moving it.
    pub fn peek_prev(&self) -> Option<&K> {
        self.0.peek_prev().map(|node| &node.key)
    }

    /// Removes the current key and moves the cursor to the next one.
    ///
    /// Returns `None` and does nothing at the end position.
    pub fn remove_current(&mut self) -> Option<K> {
        self.0.remove_current().map(SetNode::into_key)
    }

    /// Removes the current key and moves the cursor to the previous one.
    pub fn remove_current_and_move_prev(&mut self) -> Option<K> {
        self.0
            .remove_current_and_move_prev()
            .map(SetNode::into_key)
    }
}

impl<K: fmt::Debug, C> fmt::Debug for CursorMut<'_, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get()).finish()
    }
}

// Iterators ==================================================================

/// An iterator over the keys of an [`AvlSet`] or [`AvlMultiset`](crate::AvlMultiset), in order.
pub struct Iter<'a, K, C>(pub(crate) crate::Iter<'a, SetNode<K>, C>);

impl<'a, K, C> Iterator for Iter<'a, K, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|node| &node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, C> DoubleEndedIterator for Iter<'_, K, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|node| &node.key)
    }
}

impl<K, C> ExactSizeIterator for Iter<'_, K, C> {}

impl<K, C> FusedIterator for Iter<'_, K, C> {}

impl<K, C> Clone for Iter<'_, K, C> {
    fn clone(&self) -> Self {
        Iter(self.0.clone())
    }
}

/// An owning iterator over the keys of an [`AvlSet`] or [`AvlMultiset`](crate::AvlMultiset).
pub struct IntoIter<K, C>(pub(crate) crate::IntoIter<SetNode<K>, C>);

impl<K, C> Iterator for IntoIter<K, C> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(SetNode::into_key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, C> DoubleEndedIterator for IntoIter<K, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(SetNode::into_key)
    }
}

impl<K, C> ExactSizeIterator for IntoIter<K, C> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_insert() {
        let mut set = AvlSet::new();

        assert!(set.insert(5).1);
        assert!(set.insert(3).1);

        let (curs, inserted) = set.insert(5);
        assert!(!inserted);
        assert_eq!(curs.get(), Some(&5));

        assert_eq!(set.len(), 2);
        assert_eq!(set.insert_many([1, 3, 1, 7]), [true, false, false, true]);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 3, 5, 7]);
        set.assert_invariants();
    }

    #[test]
    fn find_contains_remove() {
        let mut set = AvlSet::from([5, 3, 8, 1, 4, 7, 9]);

        assert_eq!(set.find(&4).get(), Some(&4));
        assert!(set.find(&6) == set.end());
        assert!(set.contains(&9));
        assert!(!set.contains(&10));

        assert!(set.remove(&5));
        assert!(!set.remove(&5));
        assert_eq!(set.take(&8), Some(8));

        assert_eq!(set.first(), Some(&1));
        assert_eq!(set.last(), Some(&9));
        set.assert_invariants();
    }

    #[test]
    fn borrowed_lookup() {
        let set: AvlSet<String> = ["pear", "apple", "fig"].map(String::from).into_iter().collect();

        assert!(set.contains("fig"));
        assert_eq!(set.get("apple").map(String::as_str), Some("apple"));
        assert_eq!(set.lower_bound("b").get().map(String::as_str), Some("fig"));
    }

    #[test]
    fn cursor_walks_ring() {
        let set = AvlSet::from([1, 2, 3]);
        let mut curs = set.cursor_last();

        curs.move_next();
        assert!(curs.is_end());
        curs.move_next();
        assert_eq!(curs.get(), Some(&1));
        curs.move_prev();
        assert!(curs.is_end());
        assert_eq!(curs.peek_prev(), Some(&3));
    }

    #[test]
    fn cursor_removes() {
        let mut set = AvlSet::from([1, 2, 3, 4, 5, 6]);
        let mut curs = set.cursor_first_mut();

        while let Some(&key) = curs.get() {
            if key % 2 == 0 {
                assert_eq!(curs.remove_current(), Some(key));
            } else {
                curs.move_next();
            }
        }
        assert_eq!(curs.remove_current(), None);

        assert_eq!(set.into_iter().collect::<Vec<_>>(), [1, 3, 5]);
    }

    #[test]
    fn erase_at_bounds() {
        let mut set = AvlSet::from([10, 20, 30, 40]);

        let mut curs = set.lower_bound_mut(&15);
        assert_eq!(curs.remove_current(), Some(20));
        assert_eq!(curs.get(), Some(&30));

        let mut curs = set.upper_bound_mut(&30);
        assert_eq!(curs.remove_current(), Some(40));
        assert!(curs.is_end());

        let mut curs = set.cursor_last_mut();
        assert_eq!(curs.remove_current_and_move_prev(), Some(30));
        assert_eq!(curs.get(), Some(&10));

        assert_eq!(set.find_mut(&99).remove_current(), None);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [10]);
        set.assert_invariants();
    }

    #[test]
    fn merge_keeps_collisions() {
        let mut a = AvlSet::from([1, 2, 3]);
        let mut b = AvlSet::from([3, 4, 5]);
        let total = a.len() + b.len();

        a.merge(&mut b);

        assert_eq!(a.len() + b.len(), total);
        assert_eq!(a, AvlSet::from([1, 2, 3, 4, 5]));
        assert_eq!(b, AvlSet::from([3]));
    }

    #[test]
    fn clone_is_deep() {
        let a = AvlSet::from([4, 2, 6]);
        let mut b = a.clone();
        b.insert(5);

        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 4);
        b.assert_invariants();
        assert_eq!(format!("{a:?}"), "{2, 4, 6}");
    }
}
