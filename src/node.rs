use alloc::boxed::Box;
use core::{cell::UnsafeCell, marker::PhantomPinned, mem, ptr::NonNull};

use cordyceps::Linked;

use crate::{Dir, Key, Link};

/// A heap-allocated tree node.
///
/// Nodes are owned by the tree through the raw pointers stored in their parents' links (the root
/// is owned by the tree itself). Ownership is handed to and from the tree as a `Box` through
/// [`Linked`].
pub(crate) struct Node<V> {
    links: Links<V>,
    pub(crate) key: Key,
    pub(crate) value: V,
}

pub(crate) struct Links<V> {
    inner: UnsafeCell<LinksInner<V>>,
}

struct LinksInner<V> {
    parent: Link<V>,
    children: [Link<V>; 2],
    height: i8,
    size: usize,
    _unpin: PhantomPinned,
}

unsafe impl<V> Linked<Links<V>> for Node<V> {
    type Handle = Box<Node<V>>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<V>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<V> Node<V> {
    /// Allocates a detached leaf and releases it to the caller as a raw pointer.
    pub(crate) fn alloc(key: Key, value: V) -> NonNull<Node<V>> {
        <Node<V> as Linked<Links<V>>>::into_ptr(Box::new(Node {
            links: Links::new(),
            key,
            value,
        }))
    }

    /// Reclaims ownership of a node previously released by [`Node::alloc`].
    ///
    /// # Safety
    ///
    /// `ptr` must not be reachable from any tree.
    pub(crate) unsafe fn into_box(ptr: NonNull<Node<V>>) -> Box<Node<V>> {
        unsafe { <Node<V> as Linked<Links<V>>>::from_ptr(ptr) }
    }

    pub(crate) fn into_entry(self: Box<Self>) -> (Key, V) {
        let Node { key, value, .. } = *self;
        (key, value)
    }
}

#[inline]
pub(crate) unsafe fn links<'a, V>(node: NonNull<Node<V>>) -> &'a Links<V> {
    unsafe { <Node<V> as Linked<Links<V>>>::links(node).as_ref() }
}

#[inline]
pub(crate) unsafe fn links_mut<'a, V>(node: NonNull<Node<V>>) -> &'a mut Links<V> {
    unsafe { <Node<V> as Linked<Links<V>>>::links(node).as_mut() }
}

impl<V> Links<V> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                height: 0,
                size: 1,
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Detaches the node from every neighbour and makes it a leaf again.
    #[inline]
    pub(crate) fn reset(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.height = 0;
        inner.size = 1;
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    pub(crate) fn height(&self) -> i8 {
        unsafe { (*self.inner.get()).height }
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        unsafe { (*self.inner.get()).size }
    }

    #[inline]
    pub(crate) fn parent(&self) -> Link<V> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link<V> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    pub(crate) fn left(&self) -> Link<V> {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Link<V> {
        self.child(Dir::Right)
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Link<V>) -> Link<V> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link<V>) -> Link<V> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn set_height(&mut self, height: i8) {
        self.inner.get_mut().height = height;
    }

    #[inline]
    pub(crate) fn set_size(&mut self, size: usize) {
        self.inner.get_mut().size = size;
    }
}
