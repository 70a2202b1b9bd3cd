//! Reusable buffers for the pooled replace strategies.
//!
//! [`BufferPool`] keeps idle `Vec<T>` buffers in free lists keyed by size
//! class (the power of two at or below the buffer's capacity). Borrowing
//! returns a [`PooledBuffer`] guard that hands the buffer back when dropped,
//! so a buffer is released exactly once on every exit path: success,
//! validation error or panic.
//!
//! # Design Principles
//!
//! - **Scoped release**: the guard owns the buffer; `Drop` returns it.
//! - **Geometric growth**: a full guard borrows a buffer of twice the
//!   capacity, moves its contents over and returns the old buffer at once.
//! - **Bounded retention**: buffers above `max_retained_capacity`, or beyond
//!   [`MAX_IDLE_PER_CLASS`] in one size class, are dropped instead of kept.
//!
//! A pool is shared between strategies through `Arc<BufferPool<T>>`.
//!
//! # Examples
//!
//! ```rust
//! use keyset::pool::BufferPool;
//!
//! let pool: BufferPool<u32> = BufferPool::new();
//! {
//!     let mut buffer = pool.borrow(2);
//!     buffer.push(1);
//!     buffer.push(2);
//!     buffer.push(3); // grows to capacity 4
//!     assert_eq!(pool.outstanding(), 1);
//! }
//! assert_eq!(pool.outstanding(), 0);
//! assert_eq!(pool.stats().grown, 1);
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::config::DEFAULT_MAX_RETAINED_CAPACITY;

/// Maximum number of idle buffers kept per size class.
pub const MAX_IDLE_PER_CLASS: usize = 4;

/// Number of size classes; class `c` holds buffers with capacity in `[2^c, 2^(c+1))`.
const SIZE_CLASSES: usize = usize::BITS as usize;

/// Counters describing pool activity since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers handed out, growth included.
    pub borrowed: u64,
    /// Borrows served from a free list.
    pub reused: u64,
    /// Borrows that allocated a fresh buffer.
    pub allocated: u64,
    /// Times a full buffer was replaced by one of double capacity.
    pub grown: u64,
    /// Returned buffers that were dropped instead of retained.
    pub discarded: u64,
}

struct PoolState<T> {
    classes: Vec<SmallVec<[Vec<T>; MAX_IDLE_PER_CLASS]>>,
    outstanding: usize,
    stats: PoolStats,
}

/// A size-class keyed free list of `Vec<T>` buffers.
pub struct BufferPool<T> {
    state: Mutex<PoolState<T>>,
    max_retained_capacity: usize,
}

impl<T> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BufferPool<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        formatter
            .debug_struct("BufferPool")
            .field("outstanding", &state.outstanding)
            .field("idle", &idle_count(&state))
            .field("max_retained_capacity", &self.max_retained_capacity)
            .field("stats", &state.stats)
            .finish()
    }
}

impl<T> BufferPool<T> {
    /// Creates an empty pool with the default retention limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_retained_capacity(DEFAULT_MAX_RETAINED_CAPACITY)
    }

    /// Creates an empty pool that drops returned buffers above `max_retained_capacity`.
    #[must_use]
    pub fn with_max_retained_capacity(max_retained_capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                classes: (0..SIZE_CLASSES).map(|_| SmallVec::new()).collect(),
                outstanding: 0,
                stats: PoolStats::default(),
            }),
            max_retained_capacity,
        }
    }

    /// Borrows an empty buffer with room for at least `min_capacity` items.
    pub fn borrow(&self, min_capacity: usize) -> PooledBuffer<'_, T> {
        PooledBuffer {
            pool: self,
            buffer: self.take(min_capacity),
        }
    }

    /// Returns the number of buffers currently borrowed.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }

    /// Returns the number of idle buffers held for reuse.
    #[must_use]
    pub fn idle(&self) -> usize {
        idle_count(&self.state.lock())
    }

    /// Returns a snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.state.lock().stats
    }

    /// Returns the retention limit.
    #[must_use]
    pub const fn max_retained_capacity(&self) -> usize {
        self.max_retained_capacity
    }

    /// Drops every idle buffer.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        for class in &mut state.classes {
            class.clear();
        }
    }

    fn take(&self, min_capacity: usize) -> Vec<T> {
        let wanted = min_capacity
            .checked_next_power_of_two()
            .unwrap_or(min_capacity);

        let mut state = self.state.lock();
        let reused = if wanted > 0 {
            state.classes[size_class(wanted)..]
                .iter_mut()
                .find_map(SmallVec::pop)
        } else {
            None
        };

        // A borrow is counted only once its buffer exists.
        let buffer = match reused {
            Some(buffer) => {
                state.stats.reused += 1;
                buffer
            }
            None => {
                let buffer = Vec::with_capacity(wanted);
                state.stats.allocated += 1;
                buffer
            }
        };
        state.outstanding += 1;
        state.stats.borrowed += 1;
        buffer
    }

    fn give_back(&self, mut buffer: Vec<T>) {
        buffer.clear();
        let capacity = buffer.capacity();

        let mut state = self.state.lock();
        state.outstanding -= 1;

        if capacity == 0 {
            return;
        }
        if capacity > self.max_retained_capacity {
            state.stats.discarded += 1;
            drop(state);
            tracing::debug!(
                capacity,
                max_retained_capacity = self.max_retained_capacity,
                "discarding oversized pooled buffer"
            );
            return;
        }

        let class = size_class(capacity);
        if state.classes[class].len() < MAX_IDLE_PER_CLASS {
            state.classes[class].push(buffer);
        } else {
            state.stats.discarded += 1;
        }
    }
}

fn size_class(capacity: usize) -> usize {
    (usize::BITS - 1 - capacity.leading_zeros()) as usize
}

fn idle_count<T>(state: &PoolState<T>) -> usize {
    state.classes.iter().map(SmallVec::len).sum()
}

/// A buffer borrowed from a [`BufferPool`], returned when dropped.
///
/// The guard dereferences to a slice, so it can be sorted and scanned in
/// place. Appending goes through [`PooledBuffer::push`], which doubles the
/// capacity through the pool when the buffer is full.
pub struct PooledBuffer<'pool, T> {
    pool: &'pool BufferPool<T>,
    buffer: Vec<T>,
}

impl<T> PooledBuffer<'_, T> {
    /// Returns the capacity of the underlying buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Returns `true` if the next push has to grow the buffer.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.buffer.capacity()
    }

    /// Appends an item, growing the buffer geometrically when full.
    pub fn push(&mut self, item: T) {
        if self.is_full() {
            self.grow();
        }
        self.buffer.push(item);
    }

    /// Removes every item, keeping the buffer borrowed.
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.buffer.drain(..)
    }

    /// Replaces the buffer with one of double capacity from the pool.
    ///
    /// Contents are moved over and the old buffer is returned to the pool
    /// before this method exits.
    pub fn grow(&mut self) {
        let target = self.buffer.capacity().max(1).saturating_mul(2);
        let mut larger = self.pool.take(target);
        larger.append(&mut self.buffer);
        let previous = std::mem::replace(&mut self.buffer, larger);

        self.pool.state.lock().stats.grown += 1;
        tracing::trace!(
            from = previous.capacity(),
            to = self.buffer.capacity(),
            "pooled buffer grown"
        );
        self.pool.give_back(previous);
    }
}

impl<T> Extend<T> for PooledBuffer<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.push(item);
        }
    }
}

impl<T> Deref for PooledBuffer<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.buffer
    }
}

impl<T> DerefMut for PooledBuffer<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.buffer
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledBuffer<'_, T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.buffer.iter()).finish()
    }
}

impl<T> Drop for PooledBuffer<'_, T> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buffer));
    }
}

static_assertions::assert_impl_all!(BufferPool<u64>: Send, Sync);
