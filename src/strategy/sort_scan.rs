//! Sort-based duplicate detection over heap-allocated copies.

use crate::collection::{ItemSource, SharedItems};
use crate::config::{CommitPolicy, ReplaceConfig};
use crate::error::ReplaceError;
use crate::key::KeyedObject;

use super::{
    ReplaceStrategy, StrategyKind, compare_keys, first_adjacent_duplicate, require_present,
    reported_sort_duplicate,
};

/// Copies the source, sorts a second copy by key and scans adjacent pairs.
///
/// Under [`DuplicateReport::Native`] the first adjacent equal pair in
/// sorted order is reported, i.e. the smallest duplicated key.
///
/// Under [`CommitPolicy::Legacy`] the collection is cleared and filled with
/// the raw source before validation, so a duplicate leaves it holding the
/// duplicates.
///
/// [`DuplicateReport::Native`]: crate::config::DuplicateReport::Native
#[derive(Debug)]
pub struct SortScan<T> {
    items: SharedItems<T>,
    config: ReplaceConfig,
}

impl<T> Default for SortScan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SortScan<T> {
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

impl<T: KeyedObject + Clone> SortScan<T> {
    fn validate(&self, source_order: &[T]) -> Result<(), ReplaceError> {
        if source_order.len() < 2 {
            return Ok(());
        }

        let mut sorted: Vec<&T> = source_order.iter().collect();
        sorted.sort_unstable_by(|left, right| compare_keys(*left, *right));

        match first_adjacent_duplicate(&sorted) {
            Some(key) => Err(ReplaceError::DuplicateKey(reported_sort_duplicate(
                self.config.duplicate_report(),
                key,
                source_order,
            ))),
            None => Ok(()),
        }
    }
}

impl<T: KeyedObject + Clone> ReplaceStrategy<T> for SortScan<T> {
    fn name(&self) -> &'static str {
        StrategyKind::SortScan.name()
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
            return self.validate(&current);
        }

        let mut copy = Vec::with_capacity(expected);
        for (position, item) in items.enumerate() {
            copy.push(require_present(position, item)?);
        }
        self.validate(&copy)?;
        self.items.replace_contents(copy);
        Ok(())
    }
}
