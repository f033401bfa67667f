//! An ordered multiset.

use core::{borrow::Borrow, fmt};

use crate::{set::SetNode, AvlTree, Comparator, Natural};

pub use crate::set::{Cursor, CursorMut, IntoIter, Iter};

/// An ordered multiset based on an [AVL tree].
///
/// Equal keys may be stored any number of times. They are kept adjacent, in insertion order.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlMultiset<K, C = Natural> {
    tree: AvlTree<SetNode<K>, C>,
}

// SAFETY: the multiset exclusively owns its nodes.
unsafe impl<K: Send, C: Send> Send for AvlMultiset<K, C> {}
unsafe impl<K: Sync, C: Sync> Sync for AvlMultiset<K, C> {}

impl<K> AvlMultiset<K, Natural> {
    /// Creates a new, empty `AvlMultiset` ordered by [`Ord`].
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }
}

impl<K, C> AvlMultiset<K, C> {
    /// Creates a new, empty `AvlMultiset` ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            tree: AvlTree::with_comparator(cmp),
        }
    }

    /// Returns `true` if the multiset contains no keys.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of keys in the multiset, counting every occurrence.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the theoretical maximum number of keys the multiset can hold.
    pub const fn max_size(&self) -> usize {
        self.tree.max_len()
    }

    /// Returns the comparator ordering the multiset.
    pub const fn comparator(&self) -> &C {
        self.tree.comparator()
    }

    /// Returns the first occurrence of the minimum key.
    pub fn first(&self) -> Option<&K> {
        self.tree.first().map(|node| &node.get_ref().key)
    }

    /// Returns the last occurrence of the maximum key.
    pub fn last(&self) -> Option<&K> {
        self.tree.last().map(|node| &node.get_ref().key)
    }

    /// Removes and returns the first occurrence of the minimum key.
    pub fn pop_first(&mut self) -> Option<K> {
        self.tree.pop_first().map(SetNode::into_key)
    }

    /// Removes and returns the last occurrence of the maximum key.
    pub fn pop_last(&mut self) -> Option<K> {
        self.tree.pop_last().map(SetNode::into_key)
    }

    /// Returns a cursor pointing at the minimum key, or at the end position if the multiset is
    /// empty.
    pub fn cursor_first(&self) -> Cursor<'_, K, C> {
        Cursor(self.tree.cursor_first())
    }

    /// Returns a cursor pointing at the maximum key, or at the end position if the multiset is
    /// empty.
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

    /// Returns an iterator over every occurrence of every key, in order.
    pub fn iter(&self) -> Iter<'_, K, C> {
        Iter(self.tree.iter())
    }

    /// Exchanges the contents of two multisets.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    /// Removes every key from the multiset.
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K, C> AvlMultiset<K, C>
where
    C: Comparator<K>,
{
    /// Returns `true` if the multiset contains at least one occurrence of `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a cursor pointing at an occurrence of `key`, or past the maximum key if there is
    /// none.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor(self.tree.find(key))
    }

    /// Returns an editing cursor pointing at an occurrence of `key`, or at the end position if there
    /// is none.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        CursorMut(self.tree.find_mut(key))
    }

    /// Returns the number of occurrences of `key`.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.count(key)
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

    /// Returns the half-open cursor range covering every occurrence of `key`.
    pub fn equal_range<Q>(&self, key: &Q) -> (Cursor<'_, K, C>, Cursor<'_, K, C>)
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let (lower, upper) = self.tree.equal_range(key);
        (Cursor(lower), Cursor(upper))
    }

    /// Inserts `key`, after any occurrences already present.
    ///
    /// Returns a cursor pointing at the new occurrence.
    pub fn insert(&mut self, key: K) -> CursorMut<'_, K, C> {
        CursorMut(self.tree.insert(SetNode::new(key)))
    }

    /// Inserts every key of `iter`, returning how many were inserted.
    ///
    /// Inserting into a multiset always succeeds, so the count equals the number of keys `iter`
    /// yielded.
    pub fn insert_many<I>(&mut self, iter: I) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        let before = self.len();
        self.extend(iter);
        self.len() - before
    }

    /// Removes one occurrence of `key`, returning whether there was one.
    ///
    /// Which of several equal occurrences is removed is unspecified. Use
    /// [`lower_bound_mut`](Self::lower_bound_mut) to remove a particular one.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.remove(key).is_some()
    }

    /// Removes every occurrence of `key`, returning how many there were.
    pub fn remove_all<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut removed = 0;

        while self.tree.remove(key).is_some() {
            removed += 1;
        }

        removed
    }

    /// Moves every key of `other` into `self`, leaving `other` empty.
    pub fn merge(&mut self, other: &mut Self) {
        self.tree.merge(&mut other.tree);
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

impl<K> Default for AvlMultiset<K, Natural> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, C: Clone> Clone for AvlMultiset<K, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone_with(|node| SetNode::new(node.key.clone())),
        }
    }
}

impl<K: fmt::Debug, C> fmt::Debug for AvlMultiset<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, C> PartialEq for AvlMultiset<K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, C> Eq for AvlMultiset<K, C> {}

impl<K, C> Extend<K> for AvlMultiset<K, C>
where
    C: Comparator<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, C> FromIterator<K> for AvlMultiset<K, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut multiset = AvlMultiset::with_comparator(C::default());
        multiset.extend(iter);
        multiset
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for AvlMultiset<K, Natural> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K, C> IntoIterator for &'a AvlMultiset<K, C> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, C> IntoIterator for AvlMultiset<K, C> {
    type Item = K;
    type IntoIter = IntoIter<K, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.tree.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_duplicates() {
        let set = AvlMultiset::from([1, 1, 1, 2, 3]);

        assert_eq!(set.count(&1), 3);
        assert_eq!(set.count(&2), 1);
        assert_eq!(set.count(&99), 0);
        assert_eq!(set.len(), 5);
        set.assert_invariants();
    }

    #[test]
    fn equal_range_spans_duplicates() {
        let set = AvlMultiset::from([
            1, 1, 1, 1, 2, 3, 4, 5, 6, 743, 4, 423, 4, 32, 5, 345623, 4, 12, 3,
        ]);

        assert_eq!(set.len(), 19);
        assert_eq!(set.count(&4), 4);

        let (mut lower, upper) = set.equal_range(&4);
        assert_eq!(lower.peek_prev(), Some(&3));
        assert_eq!(upper.get(), Some(&5));

        let mut seen = 0;
        while lower != upper {
            assert_eq!(lower.get(), Some(&4));
            seen += 1;
            lower.move_next();
        }
        assert_eq!(seen, 4);

        let (lower, upper) = set.equal_range(&7);
        assert!(lower == upper);
        assert_eq!(lower.get(), Some(&12));

        assert!(set.upper_bound(&345623).is_end());
        assert_eq!(set.lower_bound(&0).get(), Some(&1));
    }

    #[test]
    fn remove_one_or_all() {
        let mut set = AvlMultiset::from([2, 1, 2, 3, 2]);

        assert!(set.remove(&2));
        assert_eq!(set.count(&2), 2);
        assert_eq!(set.remove_all(&2), 2);
        assert_eq!(set.remove_all(&2), 0);
        assert!(!set.remove(&2));

        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 3]);
        set.assert_invariants();
    }

    #[test]
    fn erase_chosen_occurrence() {
        let mut set = AvlMultiset::with_comparator(crate::FnComparator(|a: &(u8, u8), b: &(u8, u8)| {
            a.0.cmp(&b.0)
        }));
        set.extend([(1, 0), (2, 0), (2, 1), (2, 2), (3, 0)]);

        let mut curs = set.lower_bound_mut(&(2, 0));
        assert_eq!(curs.remove_current(), Some((2, 0)));
        assert_eq!(curs.get(), Some(&(2, 1)));
        assert_eq!(set.count(&(2, 0)), 2);

        let mut curs = set.upper_bound_mut(&(2, 0));
        assert_eq!(curs.get(), Some(&(3, 0)));
        curs.move_prev();
        assert_eq!(curs.remove_current(), Some((2, 2)));
        assert_eq!(curs.get(), Some(&(3, 0)));

        let mut curs = set.cursor_last_mut();
        assert_eq!(curs.remove_current(), Some((3, 0)));
        assert!(curs.is_end());

        assert_eq!(set.find_mut(&(2, 9)).remove_current(), Some((2, 1)));
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [(1, 0)]);
        set.assert_invariants();
    }

    #[test]
    fn merge_moves_everything() {
        let mut a = AvlMultiset::from([1, 2, 2]);
        let mut b = AvlMultiset::from([2, 3]);

        a.merge(&mut b);

        assert!(b.is_empty());
        assert_eq!(a.len(), 5);
        assert_eq!(a.count(&2), 3);
        a.assert_invariants();
    }

    #[test]
    fn insert_many_counts() {
        let mut set = AvlMultiset::new();

        assert_eq!(set.insert_many([3, 3, 1]), 3);
        assert_eq!(set.insert_many(Vec::new()), 0);
        assert_eq!(format!("{set:?}"), "[1, 3, 3]");
    }

    #[test]
    fn duplicates_keep_insertion_order() {
        let mut set = AvlMultiset::with_comparator(crate::FnComparator(|a: &(u8, u8), b: &(u8, u8)| {
            a.0.cmp(&b.0)
        }));

        for (i, key) in [1, 0, 1, 1, 0].into_iter().enumerate() {
            set.insert((key, i as u8));
        }

        assert_eq!(
            set.iter().copied().collect::<Vec<_>>(),
            [(0, 1), (0, 4), (1, 0), (1, 2), (1, 3)]
        );
    }
}
