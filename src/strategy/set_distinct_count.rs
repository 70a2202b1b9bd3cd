//! Distinct-count duplicate detection over heap-allocated copies.

use crate::collection::{ItemSource, SharedItems};
use crate::config::{CommitPolicy, ReplaceConfig};
use crate::error::ReplaceError;
use crate::key::KeyedObject;

use super::{
    ReplaceStrategy, StrategyKind, distinct_count, first_repeat_in_order, require_present,
};

/// Compares the number of distinct keys with the number of items.
///
/// On a mismatch the items are scanned again in source order with a
/// seen-key set, and the first key met a second time is reported.
///
/// Under [`CommitPolicy::Legacy`] the collection is cleared and filled with
/// the raw source before validation, as [`SortScan`](super::SortScan) does.
#[derive(Debug)]
pub struct SetDistinctCount<T> {
    items: SharedItems<T>,
    config: ReplaceConfig,
}

impl<T> Default for SetDistinctCount<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SetDistinctCount<T> {
    /// Creates the strategy with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ReplaceConfig::default())
    }

    /// Creates the strategy with `config`.
    #[must_use]
    pub fn with_config(config: ReplaceConfig) -> Self {
        Self {
            items: SharedItems::new(),
            config,
        }
    }
}

/// Shared with the pooled variant.
pub(super) fn validate_distinct<T: KeyedObject>(items: &[T]) -> Result<(), ReplaceError> {
    if items.len() < 2 || distinct_count(items) == items.len() {
        return Ok(());
    }
    match first_repeat_in_order(items) {
        Some(key) => Err(ReplaceError::DuplicateKey(key.clone())),
        None => Ok(()),
    }
}

impl<T: KeyedObject + Clone> ReplaceStrategy<T> for SetDistinctCount<T> {
    fn name(&self) -> &'static str {
        StrategyKind::SetDistinctCount.name()
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

        let expected = source.len_hint().unwrap_or(0);
        let items = source.into_items();

        if self.config.commit_policy() == CommitPolicy::Legacy {
            self.items.clear();
            for (position, item) in items.enumerate() {
                self.items.push(require_present(position, item)?);
            }
            let current = self.items.read();
            return validate_distinct(&current);
        }

        let mut copy = Vec::with_capacity(expected);
        for (position, item) in items.enumerate() {
            copy.push(require_present(position, item)?);
        }
        validate_distinct(&copy)?;
        self.items.replace_contents(copy);
        Ok(())
    }
}
