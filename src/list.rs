use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};

/// A node in the doubly linked list.
///
/// Contains a value and pointers to the previous and next nodes.
/// This structure is not meant to be used directly by users of the `List`.
pub struct Node<T> {
    /// The value stored in this node. Uses MaybeUninit to allow for sigil nodes.
    val: mem::MaybeUninit<T>,
    /// Pointer to the previous node in the list.
    prev: *mut Node<T>,
    /// Pointer to the next node in the list.
    next: *mut Node<T>,
}

impl<T> Node<T> {
    fn new(val: T) -> Self {
        Node {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Creates a new sigil (sentinel) node without initializing the value.
    ///
    /// Sigil nodes are used as head and tail markers in the list.
    fn new_sigil() -> Self {
        Node {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Returns a reference to the value held by this node.
    ///
    /// # Safety
    ///
    /// The value must be initialized, i.e. this must not be a sigil node.
    pub unsafe fn get_value(&self) -> &T {
        self.val.assume_init_ref()
    }

    /// Consumes a detached node and returns its value.
    ///
    /// # Safety
    ///
    /// The value must be initialized, i.e. this must not be a sigil node.
    pub unsafe fn into_value(self: Box<Self>) -> T {
        self.val.assume_init_read()
    }
}

/// An unbounded doubly linked list that keeps its values in arrival order.
///
/// New values are appended before the tail sentinel, so walking from the head
/// visits the oldest value first. Values can be moved back to the tail in O(1),
/// which is what an access-ordered store needs on every hit.
///
/// ```text
///   head ⇄ [oldest] ⇄ ... ⇄ [newest] ⇄ tail
/// ```
pub struct List<T> {
    /// Current number of items in the list.
    len: usize,
    /// Pointer to the head sentinel node.
    head: *mut Node<T>,
    /// Pointer to the tail sentinel node.
    tail: *mut Node<T>,
}

impl<T> List<T> {
    /// Creates an empty list with linked head and tail sentinels.
    pub fn new() -> List<T> {
        let head = Box::into_raw(Box::new(Node::new_sigil()));
        let tail = Box::into_raw(Box::new(Node::new_sigil()));

        let list = List { len: 0, head, tail };

        // SAFETY: head and tail are newly allocated and valid pointers
        unsafe {
            (*list.head).next = list.tail;
            (*list.tail).prev = list.head;
        }

        list
    }

    /// Returns the current number of items in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list contains no items.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the oldest node, if any.
    pub fn first(&self) -> Option<*mut Node<T>> {
        // SAFETY: head is valid for the lifetime of the list
        let next = unsafe { (*self.head).next };
        (next != self.tail).then_some(next)
    }

    /// Returns the node following `node`, if any.
    ///
    /// # Safety
    ///
    /// `node` must be a live, non-sigil node of this list.
    pub unsafe fn next_of(&self, node: *mut Node<T>) -> Option<*mut Node<T>> {
        let next = (*node).next;
        (next != self.tail).then_some(next)
    }

    /// Appends a value before the tail sentinel and returns its node.
    pub fn push_back(&mut self, v: T) -> *mut Node<T> {
        // SAFETY: Box::into_raw never returns null
        let node = unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(Node::new(v)))) };
        // SAFETY: node is a newly allocated node that is not part of any list yet
        unsafe { self.attach_last(node.as_ptr()) };
        self.len += 1;
        node.as_ptr()
    }

    /// Removes the oldest node from the list.
    pub fn pop_front(&mut self) -> Option<Box<Node<T>>> {
        let first = self.first()?;
        // SAFETY: first() only returns live non-sigil nodes of this list
        unsafe { self.remove(first) }
    }

    /// Detaches a node from the list and returns it as a Box.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `node` is a valid pointer to a node in the list
    /// (not null, not freed, and actually part of this list).
    pub unsafe fn remove(&mut self, node: *mut Node<T>) -> Option<Box<Node<T>>> {
        if self.is_empty() || node.is_null() || node == self.head || node == self.tail {
            return None;
        }

        // SAFETY: Caller guarantees node is valid and part of this list
        unsafe {
            self.detach(node);
            self.len -= 1;
            Some(Box::from_raw(node))
        }
    }

    /// Moves a node to the back of the list (before the tail sentinel).
    ///
    /// # Safety
    ///
    /// The caller must ensure that `node` points to a valid node in the list.
    pub unsafe fn move_to_back(&mut self, node: *mut Node<T>) {
        if node.is_null() || node == self.head || node == self.tail {
            return;
        }

        if (*self.tail).prev == node {
            return;
        }

        self.detach(node);
        self.attach_last(node);
    }

    /// Replaces the value held by `node`, returning the old one.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `node` points to a valid non-sigil node in the list.
    pub unsafe fn replace(&mut self, node: *mut Node<T>, v: T) -> T {
        mem::replace(&mut (*node).val, mem::MaybeUninit::new(v)).assume_init()
    }

    /// Removes every node from the list.
    pub fn clear(&mut self) {
        while let Some(node) = self.pop_front() {
            // SAFETY: pop_front only yields non-sigil nodes; MaybeUninit would
            // otherwise leak the value when the box is freed
            drop(unsafe { node.into_value() });
        }
    }

    /// # Safety
    ///
    /// `node` must be a valid node currently linked into this list.
    unsafe fn detach(&mut self, node: *mut Node<T>) {
        // SAFETY: node is linked, so its neighbours are valid nodes (or sigils)
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// # Safety
    ///
    /// `node` must be valid and not currently linked into this list.
    unsafe fn attach_last(&mut self, node: *mut Node<T>) {
        // SAFETY: tail is a valid pointer initialized in `new`
        (*node).next = self.tail;
        (*node).prev = (*self.tail).prev;
        (*self.tail).prev = node;
        (*(*node).prev).next = node;
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();

        // SAFETY: head and tail were allocated in `new` and are only freed here
        unsafe {
            if !self.head.is_null() {
                let _ = Box::from_raw(self.head);
                self.head = ptr::null_mut();
            }
            if !self.tail.is_null() {
                let _ = Box::from_raw(self.tail);
                self.tail = ptr::null_mut();
            }
        }
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("length", &self.len).finish()
    }
}
