use core::{pin::Pin, ptr::NonNull};

use crate::{AvlTree, CursorMut, Dir, Links, TreeNode};

/// A view into a single entry in an [`AvlTree`], which may be either vacant or occupied.
pub enum Entry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    Vacant(VacantEntry<'tree, T, C>),
    Occupied(OccupiedEntry<'tree, T, C>),
}

impl<'tree, T, C> Entry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) unsafe fn vacant_root(tree: &'tree mut AvlTree<T, C>) -> Self {
        Entry::Vacant(VacantEntry {
            tree,
            insert_as: InsertAs::Root,
        })
    }

    pub(crate) unsafe fn vacant_child(
        tree: &'tree mut AvlTree<T, C>,
        parent: NonNull<T>,
        dir: Dir,
    ) -> Self {
        Entry::Vacant(VacantEntry {
            tree,
            insert_as: InsertAs::Child { parent, dir },
        })
    }

    pub(crate) unsafe fn occupied(tree: &'tree mut AvlTree<T, C>, node: NonNull<T>) -> Self {
        Entry::Occupied(OccupiedEntry { tree, node })
    }
}

pub(crate) enum InsertAs<T: ?Sized> {
    Root,
    Child { parent: NonNull<T>, dir: Dir },
}

pub struct VacantEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) tree: &'tree mut AvlTree<T, C>,
    pub(crate) insert_as: InsertAs<T>,
}

impl<'tree, T, C> VacantEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Inserts `item` at the key associated with this entry.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key returned by `item.key()` is equal to the key used to
    /// retrieve this entry.
    pub unsafe fn insert(self, item: T::Handle) -> Pin<&'tree mut T> {
        let (mut ptr, _tree) = unsafe { self.link(T::into_ptr(item)) };
        unsafe { Pin::new_unchecked(ptr.as_mut()) }
    }

    /// Inserts `item` at the key associated with this entry, returning a cursor pointing at it.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key returned by `item.key()` is equal to the key used to
    /// retrieve this entry.
    pub unsafe fn insert_with_cursor(self, item: T::Handle) -> CursorMut<'tree, T, C> {
        unsafe { self.insert_ptr(T::into_ptr(item)) }
    }

    pub(crate) unsafe fn insert_ptr(self, ptr: NonNull<T>) -> CursorMut<'tree, T, C> {
        let (ptr, tree) = unsafe { self.link(ptr) };
        CursorMut::at(tree, Some(ptr))
    }

    unsafe fn link(self, ptr: NonNull<T>) -> (NonNull<T>, &'tree mut AvlTree<T, C>) {
        unsafe {
            match self.insert_as {
                InsertAs::Root => self.tree.insert_as_root(ptr),
                InsertAs::Child { parent, dir } => self.tree.insert_as_child(parent, dir, ptr),
            }
        }

        (ptr, self.tree)
    }
}

pub struct OccupiedEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) tree: &'tree mut AvlTree<T, C>,
    pub(crate) node: NonNull<T>,
}

impl<'tree, T, C> OccupiedEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a reference to the item in the entry.
    pub fn get(&self) -> &T {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`
        unsafe { self.node.as_ref() }
    }

    /// Returns a pinned mutable reference to the item in the entry.
    ///
    /// # Safety
    ///
    /// The caller must ensure that neither the links nor the key of the mutably borrowed item are
    /// modified, as doing so may result in undefined behavior.
    pub unsafe fn get_mut(&mut self) -> Pin<&mut T> {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`, and `self.node` is guaranteed pinned
        // by contract with `Linked`.
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Converts the entry into a pinned mutable reference to its item.
    ///
    /// # Safety
    ///
    /// See [`OccupiedEntry::get_mut`].
    pub unsafe fn into_mut(mut self) -> Pin<&'tree mut T> {
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Converts the entry into an editing cursor pointing at its item.
    pub fn into_cursor(self) -> CursorMut<'tree, T, C> {
        CursorMut::at(self.tree, Some(self.node))
    }

    /// Inserts a new item into the entry, returning the previous item.
    ///
    /// The new item takes over the position, links and height of the previous one.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `item`'s key is equivalent to the key of the existing item.
    pub unsafe fn insert(&mut self, item: T::Handle) -> T::Handle {
        unsafe { self.replace_ptr(T::into_ptr(item)) }
    }

    pub(crate) unsafe fn replace_ptr(&mut self, new_ptr: NonNull<T>) -> T::Handle {
        let old_ptr = self.node;

        // Point this entry at the new item.
        self.node = new_ptr;

        unsafe {
            // Read the old value's links.
            let old_links = self.tree.links(old_ptr);
            let height = old_links.height();
            let parent = old_links.parent();
            let left = old_links.left();
            let right = old_links.right();

            // Link the new item into the tree.
            self.tree
                .replace_child_or_set_root(parent, old_ptr, Some(new_ptr));
            self.tree.maybe_set_parent(left, Some(new_ptr));
            self.tree.maybe_set_parent(right, Some(new_ptr));

            let new_links = self.tree.links(new_ptr);
            new_links.set_parent(parent);
            new_links.set_left(left);
            new_links.set_right(right);
            new_links.set_height(height);

            // Deinit the old item's links.
            old_links.clear();

            if self.tree.first == Some(old_ptr) {
                self.tree.first = Some(new_ptr);
            }
            if self.tree.last == Some(old_ptr) {
                self.tree.last = Some(new_ptr);
            }

            T::from_ptr(old_ptr)
        }
    }

    /// Removes and returns the item pointed to by this entry.
    pub fn remove(self) -> T::Handle {
        unsafe { self.tree.remove_at(self.node) }
    }
}
