//! Distinct-count duplicate detection over a pooled buffer.

use std::sync::Arc;

use crate::collection::{ItemSource, SharedItems};
use crate::config::ReplaceConfig;
use crate::error::ReplaceError;
use crate::key::KeyedObject;
use crate::pool::BufferPool;

use super::set_distinct_count::validate_distinct;
use super::{ReplaceStrategy, StrategyKind, require_present};

/// Buffers the source in a pooled buffer and compares its distinct-key count
/// with its length.
///
/// Buffering follows [`PooledSortScan`](super::PooledSortScan); detection
/// follows [`SetDistinctCount`](super::SetDistinctCount). The backing
/// collection is only touched after validation succeeds.
#[derive(Debug)]
pub struct PooledSetDistinctCount<T> {
    items: SharedItems<T>,
    config: ReplaceConfig,
    pool: Arc<BufferPool<T>>,
}

impl<T> Default for PooledSetDistinctCount<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PooledSetDistinctCount<T> {
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
            config,
            pool,
        }
    }

    /// Returns the pool this strategy borrows from.
    #[must_use]
    pub const fn pool(&self) -> &Arc<BufferPool<T>> {
        &self.pool
    }
}

impl<T: KeyedObject + Clone> ReplaceStrategy<T> for PooledSetDistinctCount<T> {
    fn name(&self) -> &'static str {
        StrategyKind::PooledSetDistinctCount.name()
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
        validate_distinct(&buffer)?;

        self.items.replace_contents(buffer.drain());
        Ok(())
    }
}
