use core::iter::FusedIterator;

use crate::{AvlTree, Link, Links, TreeNode};

/// An in-order iterator over the elements of an [`AvlTree`].
///
/// Both ends walk the threaded parent links, so no stack is kept.
pub struct Iter<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree AvlTree<T, C>,

    front: Link<T>,
    back: Link<T>,

    len: usize,
}

impl<'tree, T, C> Iter<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree AvlTree<T, C>) -> Self {
        Iter {
            tree,

            front: tree.first,
            back: tree.last,

            len: tree.len(),
        }
    }
}

impl<'tree, T, C> Iterator for Iter<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front?;

        self.front = unsafe { self.tree.successor_raw(cur) };
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, T, C> DoubleEndedIterator for Iter<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back?;

        self.back = unsafe { self.tree.predecessor_raw(cur) };
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> where T: TreeNode<Links<T>> + ?Sized {}

impl<T, C> FusedIterator for Iter<'_, T, C> where T: TreeNode<Links<T>> + ?Sized {}

impl<T, C> Clone for Iter<'_, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

/// An owning iterator over the elements of an [`AvlTree`], in order.
pub struct IntoIter<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: AvlTree<T, C>,
}

impl<T, C> IntoIter<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: AvlTree<T, C>) -> Self {
        IntoIter { tree }
    }
}

impl<T, C> Iterator for IntoIter<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = T::Handle;

    fn next(&mut self) -> Option<Self::Item> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<T, C> DoubleEndedIterator for IntoIter<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.tree.pop_last()
    }
}

impl<T, C> ExactSizeIterator for IntoIter<T, C> where T: TreeNode<Links<T>> + ?Sized {}

impl<T, C> FusedIterator for IntoIter<T, C> where T: TreeNode<Links<T>> + ?Sized {}
