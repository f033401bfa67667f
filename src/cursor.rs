use core::{fmt, marker::PhantomData, pin::Pin, ptr::NonNull};

use crate::{AvlTree, Link, Links, TreeNode};

/// A cursor over an [`AvlTree`].
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first. The ghost element is the tree's end position.
///
/// Two cursors are equal if they point to the same position of the same tree.
pub struct Cursor<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    curs: CursorRaw<T, C>,
    phantom: PhantomData<&'tree AvlTree<T, C>>,
}

impl<'tree, T, C> Cursor<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn first(tree: &'tree AvlTree<T, C>) -> Cursor<'tree, T, C> {
        Cursor::at(tree, tree.first)
    }

    pub(crate) fn last(tree: &'tree AvlTree<T, C>) -> Cursor<'tree, T, C> {
        Cursor::at(tree, tree.last)
    }

    pub(crate) fn at(tree: &'tree AvlTree<T, C>, ptr: Link<T>) -> Cursor<'tree, T, C> {
        Cursor {
            curs: CursorRaw {
                tree: tree.into(),
                ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Returns `true` if the cursor points to the "ghost" non-element.
    pub fn is_end(&self) -> bool {
        self.curs.ptr.is_none()
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&'tree T> {
        // SAFETY: the tree is immutably borrowed for `'tree`.
        self.curs.ptr.map(|p| unsafe { p.as_ref() })
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_next() }.map(|p| unsafe { p.as_ref() })
    }

    /// Returns a reference to the previous item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_prev() }.map(|p| unsafe { p.as_ref() })
    }
}

impl<T, C> Clone for Cursor<'_, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C> Copy for Cursor<'_, T, C> where T: TreeNode<Links<T>> + ?Sized {}

impl<T, C> PartialEq for Cursor<'_, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn eq(&self, other: &Self) -> bool {
        self.curs.same_position(&other.curs)
    }
}

impl<T, C> Eq for Cursor<'_, T, C> where T: TreeNode<Links<T>> + ?Sized {}

impl<T, C> fmt::Debug for Cursor<'_, T, C>
where
    T: TreeNode<Links<T>> + fmt::Debug + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// A cursor over an [`AvlTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    curs: CursorRaw<T, C>,
    phantom: PhantomData<&'tree mut AvlTree<T, C>>,
}

impl<'tree, T, C> CursorMut<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn first(tree: &'tree mut AvlTree<T, C>) -> CursorMut<'tree, T, C> {
        let ptr = tree.first;
        CursorMut::at(tree, ptr)
    }

    pub(crate) fn last(tree: &'tree mut AvlTree<T, C>) -> CursorMut<'tree, T, C> {
        let ptr = tree.last;
        CursorMut::at(tree, ptr)
    }

    pub(crate) fn at(tree: &'tree mut AvlTree<T, C>, ptr: Link<T>) -> CursorMut<'tree, T, C> {
        CursorMut {
            curs: CursorRaw {
                tree: tree.into(),
                ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T, C> {
        Cursor {
            curs: CursorRaw {
                tree: self.curs.tree,
                ptr: self.curs.ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Converts the cursor into a read-only cursor pointing to the same element.
    pub fn into_cursor(self) -> Cursor<'tree, T, C> {
        Cursor {
            curs: self.curs,
            phantom: PhantomData,
        }
    }

    /// Returns `true` if the cursor points to the "ghost" non-element.
    pub fn is_end(&self) -> bool {
        self.curs.ptr.is_none()
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the last
    /// element. If it is pointing to the first element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&T> {
        self.curs.ptr.map(|p| unsafe { p.as_ref() })
    }

    /// Returns a pinned mutable reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    ///
    /// # Safety
    ///
    /// The caller must ensure that modifications to the returned value do not violate the
    /// invariants of the tree. In particular, the result of comparisons between the key of the
    /// returned item and the keys of other items in the tree must not change.
    pub unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        self.curs
            .ptr
            .map(|mut p| unsafe { Pin::new_unchecked(p.as_mut()) })
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<&T> {
        unsafe { self.curs.peek_next() }.map(|p| unsafe { p.as_ref() })
    }

    /// Returns a reference to the previous item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<&T> {
        unsafe { self.curs.peek_prev() }.map(|p| unsafe { p.as_ref() })
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current() }
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the previous element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current_and_move_prev() }
    }
}

impl<T, C> fmt::Debug for CursorMut<'_, T, C>
where
    T: TreeNode<Links<T>> + fmt::Debug + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get()).finish()
    }
}

struct CursorRaw<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: NonNull<AvlTree<T, C>>,
    ptr: Link<T>,
}

impl<T, C> Clone for CursorRaw<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C> Copy for CursorRaw<T, C> where T: TreeNode<Links<T>> + ?Sized {}

impl<T, C> CursorRaw<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn same_position(&self, other: &Self) -> bool {
        self.tree == other.tree && self.ptr == other.ptr
    }

    unsafe fn move_next(&mut self) {
        self.ptr = unsafe { self.peek_next() };
    }

    unsafe fn move_prev(&mut self) {
        self.ptr = unsafe { self.peek_prev() };
    }

    unsafe fn peek_next(&self) -> Link<T> {
        let tree = unsafe { self.tree.as_ref() };

        match self.ptr {
            Some(p) => unsafe { tree.successor_raw(p) },
            None => tree.first,
        }
    }

    unsafe fn peek_prev(&self) -> Link<T> {
        let tree = unsafe { self.tree.as_ref() };

        match self.ptr {
            Some(p) => unsafe { tree.predecessor_raw(p) },
            None => tree.last,
        }
    }

    unsafe fn remove_current(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe {
            self.move_next();

            let tree = self.tree.as_mut();
            Some(tree.remove_at(remove))
        }
    }

    unsafe fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe {
            self.move_prev();

            let tree = self.tree.as_mut();
            Some(tree.remove_at(remove))
        }
    }
}
