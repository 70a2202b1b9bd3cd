//! Sort-based duplicate detection over pooled buffers.

use std::sync::Arc;

use crate::collection::{ItemSource, SharedItems};
use crate::config::ReplaceConfig;
use crate::error::ReplaceError;
use crate::key::KeyedObject;
use crate::pool::BufferPool;

use super::{ReplaceStrategy, StrategyKind, require_present, reported_sort_duplicate};

/// Buffers the source in a pooled buffer, sorts a pooled buffer of indices
/// into it by key and scans adjacent pairs.
///
/// Items are never cloned. The index buffers come from a pool owned by the
/// strategy; the item buffers come from the pool given at construction.
///
/// The first buffer starts at the source's exact length when known, and at
/// [`ReplaceConfig::default_capacity`] otherwise, doubling through the pool
/// as needed. The backing collection is only touched after validation
/// succeeds, whatever the [`CommitPolicy`](crate::config::CommitPolicy).
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use keyset::config::ReplaceConfig;
/// use keyset::key::CompositeKey;
/// use keyset::pool::BufferPool;
/// use keyset::strategy::{PooledSortScan, ReplaceStrategy};
///
/// let pool = Arc::new(BufferPool::new());
/// let mut strategy = PooledSortScan::with_pool(ReplaceConfig::default(), Arc::clone(&pool));
///
/// let result = strategy.set_items(vec![
///     Some(CompositeKey::labelled("a")),
///     Some(CompositeKey::labelled("a")),
/// ]);
///
/// assert!(result.is_err());
/// assert!(strategy.get_items().is_empty());
/// assert_eq!(pool.outstanding(), 0);
/// ```
#[derive(Debug)]
pub struct PooledSortScan<T> {
    items: SharedItems<T>,
    config: ReplaceConfig,
    pool: Arc<BufferPool<T>>,
    indices: BufferPool<usize>,
}

impl<T> Default for PooledSortScan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PooledSortScan<T> {
    /// Creates the strategy with the default configuration and a private pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ReplaceConfig::default())
    }

    /// Creates the strategy with `config` and a private pool.
    #[must_use]
    pub fn with_config(config: ReplaceConfig) -> Self {
        let pool = Arc::new(BufferPool::with_max_retained_capacity(
            config.max_retained_capacity(),
        ));
        Self::with_pool(config, pool)
    }

    /// Creates the strategy with `config`, borrowing buffers from `pool`.
    #[must_use]
    pub fn with_pool(config: ReplaceConfig, pool: Arc<BufferPool<T>>) -> Self {
        Self {
            items: SharedItems::new(),
            indices: BufferPool::with_max_retained_capacity(config.max_retained_capacity()),
            config,
            pool,
        }
    }

    /// Returns the pool this strategy borrows item buffers from.
    #[must_use]
    pub const fn pool(&self) -> &Arc<BufferPool<T>> {
        &self.pool
    }

    /// Returns the strategy's own pool of sort-index buffers.
    #[must_use]
    pub const fn index_pool(&self) -> &BufferPool<usize> {
        &self.indices
    }
}

impl<T: KeyedObject + Clone> ReplaceStrategy<T> for PooledSortScan<T> {
    fn name(&self) -> &'static str {
        StrategyKind::PooledSortScan.name()
    }

    fn config(&self) -> &ReplaceConfig {
        &self.config
    }

    fn reset(&mut self) {
        self.items = SharedItems::new();
        tracing::debug!(strategy = self.name(), "backing collection reset");
    }

    fn get_items(&self) -> SharedItems<T> {
        self.items.clone()
    }

    fn set_items<S: ItemSource<T>>(&mut self, source: S) -> Result<(), ReplaceError> {
        if source.aliases(&self.items) {
            return Ok(());
        }

        let capacity = source
            .len_hint()
            .unwrap_or_else(|| self.config.default_capacity());
        let items = source.into_items();

        let mut buffer = self.pool.borrow(capacity);
        for (position, item) in items.enumerate() {
            buffer.push(require_present(position, item)?);
        }

        if buffer.len() > 1 {
            let mut order = self.indices.borrow(buffer.len());
            order.extend(0..buffer.len());
            order.sort_unstable_by(|&left, &right| buffer[left].key().cmp(buffer[right].key()));

            let collision = order
                .windows(2)
                .map(|pair| (buffer[pair[0]].key(), buffer[pair[1]].key()))
                .find(|(left, right)| left == right);

            if let Some((key, _)) = collision {
                let key = reported_sort_duplicate(self.config.duplicate_report(), key, &buffer);
                return Err(ReplaceError::DuplicateKey(key));
            }
        }

        self.items.replace_contents(buffer.drain());
        Ok(())
    }
}
