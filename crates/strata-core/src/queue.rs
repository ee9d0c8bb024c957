//! Sorted priority queues keyed by order keys.
//!
//! The queues here back search frontiers, which stay small (bounded by
//! frontier width, not graph size), so a key-sorted vector beats a heap:
//! insertion is a binary-search locate plus a shift, removal of the minimum
//! pops from the tail, and [`KeyedQueue::peek`] never mutates.

use crate::orderkey::combine;

// ---------------------------------------------------------------------------
// KeyedQueue
// ---------------------------------------------------------------------------

/// An ordered sequence of keyed items supporting insert and remove-minimum.
///
/// Items with equal keys come out in an unspecified order; callers that
/// need a deterministic tie-break should fold a secondary criterion into
/// the key (see [`DualKeyedQueue`]).
#[derive(Debug, Clone)]
pub struct KeyedQueue<K, T> {
    // Sorted descending by key; the minimum sits at the tail.
    items: Vec<(K, T)>,
}

impl<K: Ord + Copy, T> KeyedQueue<K, T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an empty queue with space for `cap` items.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap),
        }
    }

    /// Insert an item with the given key.
    pub fn push(&mut self, key: K, item: T) {
        let at = self.items.partition_point(|(k, _)| *k > key);
        self.items.insert(at, (key, item));
    }

    /// Remove and return the item with the smallest key.
    pub fn pop(&mut self) -> Option<(K, T)> {
        self.items.pop()
    }

    /// The item with the smallest key, without removing it.
    pub fn peek(&self) -> Option<(K, &T)> {
        self.items.last().map(|(k, t)| (*k, t))
    }

    /// Remove all items, yielding them in unspecified order.
    pub fn drain(&mut self) -> impl Iterator<Item = (K, T)> + '_ {
        self.items.drain(..)
    }

    /// Number of queued items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove all items.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<K: Ord + Copy, T> Default for KeyedQueue<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue keyed by a single 64-bit order key.
pub type Queue64<T> = KeyedQueue<u64, T>;

// ---------------------------------------------------------------------------
// DualKeyedQueue
// ---------------------------------------------------------------------------

/// A queue ordered by a primary and a secondary 64-bit order key, compared
/// as one 128-bit key, primary first.
#[derive(Debug, Clone, Default)]
pub struct DualKeyedQueue<T> {
    inner: KeyedQueue<u128, T>,
}

impl<T> DualKeyedQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: KeyedQueue::new(),
        }
    }

    /// Insert an item ordered by `primary`, then `secondary`.
    pub fn push(&mut self, primary: u64, secondary: u64, item: T) {
        self.inner.push(combine(primary, secondary), item);
    }

    /// Remove and return the item with the smallest combined key.
    pub fn pop(&mut self) -> Option<(u128, T)> {
        self.inner.pop()
    }

    /// The smallest combined key and its item, without removing them.
    pub fn peek(&self) -> Option<(u128, &T)> {
        self.inner.peek()
    }

    /// The primary key of the smallest entry.
    pub fn peek_primary(&self) -> Option<u64> {
        self.inner.peek().map(|(k, _)| (k >> 64) as u64)
    }

    /// Remove all items, yielding them in unspecified order.
    pub fn drain(&mut self) -> impl Iterator<Item = (u128, T)> + '_ {
        self.inner.drain()
    }

    /// Number of queued items.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Remove all items.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
