//! An ordered map with unique keys.

use core::{
    borrow::Borrow,
    fmt,
    iter::FusedIterator,
    marker::PhantomPinned,
    mem,
    ops::Index,
    ptr::{self, NonNull},
};

use cordyceps::Linked;

use crate::{AvlTree, Comparator, Error, Links, Natural, Result, TreeNode};

/// An ordered map based on an [AVL tree].
///
/// Keys are unique under the comparator `C`. Inserting a key that is already present leaves the
/// map unchanged, unless the insertion explicitly assigns.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlMap<K, V, C = Natural> {
    tree: AvlTree<MapNode<K, V>, C>,
}

struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
    _unpin: PhantomPinned,
}

impl<K, V> MapNode<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(MapNode {
            links: Links::new(),
            key,
            value,
            _unpin: PhantomPinned,
        })
    }

    fn into_pair(self: Box<Self>) -> (K, V) {
        let MapNode { key, value, .. } = *self;
        (key, value)
    }
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        // SAFETY: `ptr` is non-null, so the address of its field is too.
        unsafe { NonNull::new_unchecked(ptr::addr_of_mut!((*ptr.as_ptr()).links)) }
    }
}

impl<K, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

// SAFETY: the map exclusively owns its nodes.
unsafe impl<K: Send, V: Send, C: Send> Send for AvlMap<K, V, C> {}
unsafe impl<K: Sync, V: Sync, C: Sync> Sync for AvlMap<K, V, C> {}

impl<K, V> AvlMap<K, V, Natural> {
    /// Creates a new, empty `AvlMap` ordered by [`Ord`].
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }
}

impl<K, V, C> AvlMap<K, V, C> {
    /// Creates a new, empty `AvlMap` ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            tree: AvlTree::with_comparator(cmp),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the theoretical maximum number of elements the map can hold.
    pub const fn max_size(&self) -> usize {
        self.tree.max_len()
    }

    /// Returns the comparator ordering the map's keys.
    pub const fn comparator(&self) -> &C {
        self.tree.comparator()
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| pair(node.get_ref()))
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| pair(node.get_ref()))
    }

    /// Removes and returns the first key-value pair in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(MapNode::into_pair)
    }

    /// Removes and returns the last key-value pair in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(MapNode::into_pair)
    }

    /// Returns a cursor pointing at the pair with the minimum key.
    pub fn cursor_first(&self) -> Cursor<'_, K, V, C> {
        Cursor(self.tree.cursor_first())
    }

    /// Returns a cursor pointing at the pair with the maximum key.
    pub fn cursor_last(&self) -> Cursor<'_, K, V, C> {
        Cursor(self.tree.cursor_last())
    }

    /// Returns a cursor pointing past the last pair.
    pub fn end(&self) -> Cursor<'_, K, V, C> {
        Cursor(self.tree.end())
    }

    /// Returns an editing cursor pointing at the pair with the minimum key.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V, C> {
        CursorMut(self.tree.cursor_first_mut())
    }

    /// Returns an editing cursor pointing at the pair with the maximum key.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, K, V, C> {
        CursorMut(self.tree.cursor_last_mut())
    }

    /// Returns an iterator over the key-value pairs of the map, in key order.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter(self.tree.iter())
    }

    /// Returns an iterator over the keys of the map, in order.
    pub fn keys(&self) -> Keys<'_, K, V, C> {
        Keys(self.iter())
    }

    /// Returns an iterator over the values of the map, in key order.
    pub fn values(&self) -> Values<'_, K, V, C> {
        Values(self.iter())
    }

    /// Exchanges the contents of two maps.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K, V, C> AvlMap<K, V, C>
where
    C: Comparator<K>,
{
    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        unsafe { self.tree.get_mut(key) }
            // SAFETY: Pinning is not structural for `node.value`.
            .map(|node| unsafe { &mut node.get_unchecked_mut().value })
    }

    /// Returns the key-value pair associated with `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.get(key).map(|node| pair(node.get_ref()))
    }

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the map has no such key.
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value associated with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the map has no such key.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a cursor pointing at the pair with key `key`, or past the last pair if there is
    /// none.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor(self.tree.find(key))
    }

    /// Returns an editing cursor pointing at the pair with key `key`, or past the last pair if
    /// there is none.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        CursorMut(self.tree.find_mut(key))
    }

    /// Returns a cursor pointing at the first pair whose key is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor(self.tree.lower_bound(key))
    }

    /// Returns an editing cursor pointing at the first pair whose key is not less than `key`.
    pub fn lower_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        CursorMut(self.tree.lower_bound_mut(key))
    }

    /// Returns a cursor pointing at the first pair whose key is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor(self.tree.upper_bound(key))
    }

    /// Returns an editing cursor pointing at the first pair whose key is greater than `key`.
    pub fn upper_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        CursorMut(self.tree.upper_bound_mut(key))
    }

    /// Inserts a key-value pair if `key` is not already present.
    ///
    /// Returns a cursor pointing at the pair with key `key`, and whether the insertion took place.
    /// If the key was present, the map is left unchanged and `value` is dropped.
    pub fn insert(&mut self, key: K, value: V) -> (CursorMut<'_, K, V, C>, bool) {
        match self.tree.entry(&key) {
            crate::Entry::Occupied(occupied) => (CursorMut(occupied.into_cursor()), false),

            crate::Entry::Vacant(vacant) => {
                // SAFETY: the entry was retrieved with `key`.
                let curs = unsafe { vacant.insert_with_cursor(MapNode::new(key, value)) };
                (CursorMut(curs), true)
            }
        }
    }

    /// Inserts a `(key, value)` pair. See [`AvlMap::insert`].
    pub fn insert_pair(&mut self, (key, value): (K, V)) -> (CursorMut<'_, K, V, C>, bool) {
        self.insert(key, value)
    }

    /// Inserts a key-value pair, overwriting the value of an existing pair with an equal key.
    ///
    /// Returns a cursor pointing at the pair, and `true` if a new pair was inserted or `false` if a
    /// value was assigned. The key already in the map is kept.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (CursorMut<'_, K, V, C>, bool) {
        match self.tree.entry(&key) {
            crate::Entry::Occupied(mut occupied) => {
                // SAFETY: Pinning is not structural for `value`, and the key is untouched.
                unsafe { occupied.get_mut().get_unchecked_mut().value = value };
                (CursorMut(occupied.into_cursor()), false)
            }

            crate::Entry::Vacant(vacant) => {
                // SAFETY: the entry was retrieved with `key`.
                let curs = unsafe { vacant.insert_with_cursor(MapNode::new(key, value)) };
                (CursorMut(curs), true)
            }
        }
    }

    /// Returns a mutable reference to the value associated with `key`, first inserting
    /// `V::default()` if the key is not present.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Returns the entry for `key`, for in-place manipulation.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C> {
        match self.tree.entry(&key) {
            crate::Entry::Occupied(inner) => Entry::Occupied(OccupiedEntry { inner }),
            crate::Entry::Vacant(inner) => Entry::Vacant(VacantEntry { key, inner }),
        }
    }

    /// Inserts every pair of `iter` whose key is not yet present.
    ///
    /// Returns, for each pair in order, whether it was inserted.
    pub fn insert_many<I>(&mut self, iter: I) -> Vec<bool>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        iter.into_iter()
            .map(|(key, value)| self.insert(key, value).1)
            .collect()
    }

    /// Removes the value associated with `key` from the map.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the pair associated with `key` from the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.remove(key).map(MapNode::into_pair)
    }

    /// Moves the pairs of `other` whose keys are not present in `self` into `self`.
    ///
    /// Pairs whose keys collide remain in `other`.
    pub fn merge(&mut self, other: &mut Self) {
        self.tree.merge_unique(&mut other.tree);
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

#[inline]
fn pair<K, V>(node: &MapNode<K, V>) -> (&K, &V) {
    (&node.key, &node.value)
}

impl<K, V> Default for AvlMap<K, V, Natural> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> Clone for AvlMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            tree: self
                .tree
                .clone_with(|node| MapNode::new(node.key.clone(), node.value.clone())),
        }
    }
}

impl<K, V, C> fmt::Debug for AvlMap<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> PartialEq for AvlMap<K, V, C>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for AvlMap<K, V, C> {}

impl<K, Q, V, C> Index<&Q> for AvlMap<K, V, C>
where
    K: Borrow<Q>,
    C: Comparator<K> + Comparator<Q>,
    Q: ?Sized,
{
    type Output = V;

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, C> Extend<(K, V)> for AvlMap<K, V, C>
where
    C: Comparator<K>,
{
    /// Inserts every pair of `iter`. Of pairs with equal keys, the first one wins.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for AvlMap<K, V, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AvlMap::with_comparator(C::default());
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for AvlMap<K, V, Natural>
where
    K: Ord,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a, K, V, C> IntoIterator for &'a AvlMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, C> IntoIterator for AvlMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.tree.into_iter())
    }
}

// Entries ====================================================================

/// A view into a single entry of an [`AvlMap`], which may be either vacant or occupied.
pub enum Entry<'a, K, V, C> {
    Vacant(VacantEntry<'a, K, V, C>),
    Occupied(OccupiedEntry<'a, K, V, C>),
}

impl<'a, K, V, C> Entry<'a, K, V, C> {
    /// Returns the key of this entry.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(vacant) => vacant.key(),
            Entry::Occupied(occupied) => occupied.key(),
        }
    }

    /// Inserts `default` if the entry is vacant, and returns a mutable reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        self.or_insert_with(|| default)
    }

    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Vacant(vacant) => vacant.insert(default()),
            Entry::Occupied(occupied) => occupied.into_mut(),
        }
    }

    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Calls `f` on the value if the entry is occupied.
    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(occupied) = &mut self {
            f(occupied.get_mut());
        }

        self
    }
}

pub struct VacantEntry<'a, K, V, C> {
    key: K,
    inner: crate::VacantEntry<'a, MapNode<K, V>, C>,
}

impl<'a, K, V, C> VacantEntry<'a, K, V, C> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts `value` under the entry's key, and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        // SAFETY: the entry was retrieved with `self.key`.
        let node = unsafe { self.inner.insert(MapNode::new(self.key, value)) };
        // SAFETY: Pinning is not structural for `value`.
        unsafe { &mut node.get_unchecked_mut().value }
    }
}

pub struct OccupiedEntry<'a, K, V, C> {
    inner: crate::OccupiedEntry<'a, MapNode<K, V>, C>,
}

impl<'a, K, V, C> OccupiedEntry<'a, K, V, C> {
    pub fn key(&self) -> &K {
        &self.inner.get().key
    }

    pub fn get(&self) -> &V {
        &self.inner.get().value
    }

    pub fn get_mut(&mut self) -> &mut V {
        // SAFETY: Pinning is not structural for `value`, and the key is untouched.
        unsafe { &mut self.inner.get_mut().get_unchecked_mut().value }
    }

    /// Converts the entry into a mutable reference to its value.
    pub fn into_mut(self) -> &'a mut V {
        // SAFETY: as above.
        unsafe { &mut self.inner.into_mut().get_unchecked_mut().value }
    }

    /// Sets the value of the entry, returning the old value.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the map, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the map, returning its key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.inner.remove().into_pair()
    }
}

// Cursors ====================================================================

/// A cursor over the pairs of an [`AvlMap`].
///
/// Besides the pairs, a cursor may point at the end position, past the last pair. Stepping past
/// either end lands on the end position; stepping from the end position wraps around.
pub struct Cursor<'a, K, V, C>(crate::Cursor<'a, MapNode<K, V>, C>);

impl<'a, K, V, C> Cursor<'a, K, V, C> {
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

    /// Returns the pair the cursor points at, or `None` at the end position.
    pub fn get(&self) -> Option<(&'a K, &'a V)> {
        self.0.get().map(pair)
    }

    pub fn key(&self) -> Option<&'a K> {
        self.get().map(|(key, _)| key)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.get().map(|(_, value)| value)
    }

    /// Returns the element after the cursor, without moving it.
    pub fn peek_next(&self) -> Option<(&'a K, &'a V)> {
        self.0.peek_next().map(pair)
    }

    /// Returns the element before the cursor, without moving it.
    pub fn peek_prev(&self) -> Option<(&'a K, &'a V)> {
        self.0.peek_prev().map(pair)
    }
}

impl<K, V, C> Clone for Cursor<'_, K, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, C> Copy for Cursor<'_, K, V, C> {}

impl<K, V, C> PartialEq for Cursor<'_, K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<K, V, C> Eq for Cursor<'_, K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for Cursor<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// A cursor over the pairs of an [`AvlMap`] which permits editing values and removing pairs.
pub struct CursorMut<'a, K, V, C>(crate::CursorMut<'a, MapNode<K, V>, C>);

impl<'a, K, V, C> CursorMut<'a, K, V, C> {
    /// Returns a read-only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, K, V, C> {
        Cursor(self.0.as_cursor())
    }

    /// Converts this cursor into a read-only cursor at the same position.
    pub fn into_cursor(self) -> Cursor<'a, K, V, C> {
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

    pub fn get(&self) -> Option<(&K, &V)> {
        self.0.get().map(pair)
    }

    pub fn key(&self) -> Option<&K> {
        self.0.get().map(|node| &node.key)
    }

    /// Returns a mutable reference to the value the cursor points at.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        // SAFETY: Pinning is not structural for `value`, and the key is untouched.
        unsafe { self.0.get_mut() }.map(|node| unsafe { &mut node.get_unchecked_mut().value })
    }

    /// Returns the element after the cursor, without moving it.
    pub fn peek_next(&self) -> Option<(&K, &V)> {
        self.0.peek_next().map(pair)
    }

    /// Returns the element before the cursor, without moving it.
    pub fn peek_prev(&self) -> Option<(&K, &V)> {
        self.0.peek_prev().map(pair)
    }

    /// Removes the current pair and moves the cursor to the next one.
    ///
    /// Returns `None` and does nothing at the end position.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        self.0.remove_current().map(MapNode::into_pair)
    }

    /// Removes the current pair and moves the cursor to the previous one.
    pub fn remove_current_and_move_prev(&mut self) -> Option<(K, V)> {
        self.0
            .remove_current_and_move_prev()
            .map(MapNode::into_pair)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for CursorMut<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get()).finish()
    }
}

// Iterators ==================================================================

/// An iterator over the pairs of an [`AvlMap`], in key order.
pub struct Iter<'a, K, V, C>(crate::Iter<'a, MapNode<K, V>, C>);

impl<'a, K, V, C> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V, C> DoubleEndedIterator for Iter<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(pair)
    }
}

impl<K, V, C> ExactSizeIterator for Iter<'_, K, V, C> {}

impl<K, V, C> FusedIterator for Iter<'_, K, V, C> {}

impl<K, V, C> Clone for Iter<'_, K, V, C> {
    fn clone(&self) -> Self {
        Iter(self.0.clone())
    }
}

/// An iterator over the keys of an [`AvlMap`], in order.
pub struct Keys<'a, K, V, C>(Iter<'a, K, V, C>);

impl<'a, K, V, C> Iterator for Keys<'a, K, V, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V, C> DoubleEndedIterator for Keys<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(key, _)| key)
    }
}

impl<K, V, C> ExactSizeIterator for Keys<'_, K, V, C> {}

/// An iterator over the values of an [`AvlMap`], in key order.
pub struct Values<'a, K, V, C>(Iter<'a, K, V, C>);

impl<'a, K, V, C> Iterator for Values<'a, K, V, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V, C> DoubleEndedIterator for Values<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(_, value)| value)
    }
}

impl<K, V, C> ExactSizeIterator for Values<'_, K, V, C> {}

/// An owning iterator over the pairs of an [`AvlMap`], in key order.
pub struct IntoIter<K, V, C>(crate::IntoIter<MapNode<K, V>, C>);

impl<K, V, C> Iterator for IntoIter<K, V, C> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(MapNode::into_pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V, C> DoubleEndedIterator for IntoIter<K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(MapNode::into_pair)
    }
}

impl<K, V, C> ExactSizeIterator for IntoIter<K, V, C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reversed;

    #[test]
    fn at_missing_key() {
        let mut map = AvlMap::from([(1, "one"), (2, "two")]);

        assert_eq!(map.at(&1), Ok(&"one"));
        assert_eq!(map.at(&3), Err(Error::KeyNotFound));
        assert_eq!(map.at_mut(&3), Err(Error::KeyNotFound));

        *map.at_mut(&2).unwrap() = "deux";
        assert_eq!(map[&2], "deux");
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn index_missing_key() {
        let map: AvlMap<i32, i32> = AvlMap::new();
        let _ = map[&7];
    }

    #[test]
    fn get_or_insert_default_grows() {
        let mut map: AvlMap<String, u32> = AvlMap::new();
        map.insert("a".into(), 1);

        *map.get_or_insert_default("a".into()) += 10;
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a"), Some(&11));

        assert_eq!(*map.get_or_insert_default("b".into()), 0);
        assert_eq!(map.len(), 2);
        map.assert_invariants();
    }

    #[test]
    fn insert_keeps_existing() {
        let mut map = AvlMap::new();

        let (curs, inserted) = map.insert(3, 'a');
        assert!(inserted);
        assert_eq!(curs.get(), Some((&3, &'a')));

        let (curs, inserted) = map.insert(3, 'b');
        assert!(!inserted);
        assert_eq!(curs.get(), Some((&3, &'a')));

        let (curs, inserted) = map.insert_pair((1, 'c'));
        assert!(inserted);
        assert_eq!(curs.peek_next(), Some((&3, &'a')));

        assert_eq!(map.len(), 2);
    }

    #[test]
    fn insert_or_assign_overwrites() {
        let mut map = AvlMap::new();

        assert!(map.insert_or_assign(3, 'a').1);
        assert!(!map.insert_or_assign(3, 'b').1);

        assert_eq!(map.get(&3), Some(&'b'));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn from_iter_first_value_wins() {
        let map: AvlMap<i32, &str> = [(1, "a"), (2, "b"), (1, "c")].into_iter().collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map[&1], "a");
    }

    #[test]
    fn insert_many_reports_each() {
        let mut map = AvlMap::from([(2, 0)]);

        let inserted = map.insert_many([(1, 1), (2, 2), (3, 3), (1, 4)]);

        assert_eq!(inserted, [true, false, true, false]);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), [1, 0, 3]);
    }

    #[test]
    fn find_and_bounds() {
        let map: AvlMap<i32, ()> = [5, 3, 8, 1, 4, 7, 9].into_iter().map(|k| (k, ())).collect();

        assert_eq!(map.find(&4).key(), Some(&4));
        assert!(map.find(&6) == map.end());

        assert_eq!(map.lower_bound(&6).key(), Some(&7));
        assert_eq!(map.upper_bound(&7).key(), Some(&8));
        assert!(map.upper_bound(&9).is_end());
    }

    #[test]
    fn erase_at_bounds() {
        let mut map = AvlMap::from([(1, 'a'), (3, 'c'), (5, 'e'), (7, 'g')]);

        let mut curs = map.lower_bound_mut(&2);
        assert_eq!(curs.remove_current(), Some((3, 'c')));
        assert_eq!(curs.key(), Some(&5));

        let mut curs = map.upper_bound_mut(&5);
        assert_eq!(curs.value_mut().map(|v| *v), Some('g'));
        assert_eq!(curs.remove_current_and_move_prev(), Some((7, 'g')));
        assert_eq!(curs.key(), Some(&5));

        assert!(map.upper_bound_mut(&7).is_end());
        assert_eq!(map.into_iter().collect::<Vec<_>>(), [(1, 'a'), (5, 'e')]);
    }

    #[test]
    fn cursor_edits_values() {
        let mut map = AvlMap::from([(1, 10), (2, 20), (3, 30)]);

        let mut curs = map.cursor_first_mut();
        while let Some(value) = curs.value_mut() {
            *value += 1;
            curs.move_next();
        }

        let mut curs = map.find_mut(&2);
        assert_eq!(curs.remove_current(), Some((2, 21)));
        assert_eq!(curs.key(), Some(&3));

        assert_eq!(map.into_iter().collect::<Vec<_>>(), [(1, 11), (3, 31)]);
    }

    #[test]
    fn entry_api() {
        let mut map = AvlMap::new();

        map.entry("x").or_insert(1);
        map.entry("x").and_modify(|v| *v += 1).or_insert(100);
        map.entry("y").and_modify(|v| *v += 1).or_insert(100);

        assert_eq!(map[&"x"], 2);
        assert_eq!(map[&"y"], 100);

        if let Entry::Occupied(occupied) = map.entry("x") {
            assert_eq!(occupied.remove_entry(), ("x", 2));
        } else {
            panic!("expected an occupied entry");
        }

        assert!(!map.contains_key(&"x"));
    }

    #[test]
    fn merge_leaves_collisions() {
        let mut a = AvlMap::from([(1, 'a'), (3, 'a')]);
        let mut b = AvlMap::from([(2, 'b'), (3, 'b'), (4, 'b')]);

        a.merge(&mut b);

        assert_eq!(
            a.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>(),
            [(1, 'a'), (2, 'b'), (3, 'a'), (4, 'b')]
        );
        assert_eq!(b.into_iter().collect::<Vec<_>>(), [(3, 'b')]);
        a.assert_invariants();
    }

    #[test]
    fn clone_and_swap() {
        let mut a = AvlMap::from([(1, "one"), (2, "two")]);
        let mut b = a.clone();
        assert_eq!(a, b);

        b.insert(3, "three");
        a.swap(&mut b);

        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn reversed_comparator() {
        let mut map = AvlMap::with_comparator(Reversed(Natural));
        map.extend([(1, ()), (3, ()), (2, ())]);

        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [3, 2, 1]);
        assert_eq!(map.first_key_value(), Some((&3, &())));
        assert_eq!(map.lower_bound(&2).key(), Some(&2));
        assert_eq!(map.upper_bound(&2).key(), Some(&1));
    }
}
