//! Incremental hash-set validation.

use crate::collection::{ItemSource, SharedItems};
use crate::config::{CommitPolicy, ReplaceConfig};
use crate::error::ReplaceError;
use crate::key::{CompositeKey, KeyedObject};

use super::{ReplaceStrategy, StrategyKind, key_set, require_present};

/// Validates each item as it is read, recording its key in a seen-key set.
///
/// Keys are cloned into the set, so no item has to outlive the pass. The
/// first key met a second time is reported; both [`DuplicateReport`] modes
/// agree for this strategy.
///
/// Under [`CommitPolicy::Atomic`] reading continues past the first
/// duplicate, so an absent item later in the source is still reported.
///
/// Under [`CommitPolicy::Legacy`] the collection is cleared up front and
/// each validated item is appended immediately. The first duplicate ends
/// the call, leaving the distinct prefix read so far.
///
/// [`DuplicateReport`]: crate::config::DuplicateReport
#[derive(Debug)]
pub struct Baseline<T> {
    items: SharedItems<T>,
    config: ReplaceConfig,
}

impl<T> Default for Baseline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Baseline<T> {
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

impl<T: KeyedObject + Clone> ReplaceStrategy<T> for Baseline<T> {
    fn name(&self) -> &'static str {
        StrategyKind::Baseline.name()
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

        let legacy = self.config.commit_policy() == CommitPolicy::Legacy;
        let expected = source.len_hint().unwrap_or(0);
        let items = source.into_items();

        let mut seen = key_set::<CompositeKey>(expected);
        let mut staged = Vec::with_capacity(if legacy { 0 } else { expected });
        let mut duplicate = None;

        if legacy {
            self.items.clear();
        }

        for (position, item) in items.enumerate() {
            let item = require_present(position, item)?;
            if duplicate.is_some() {
                continue;
            }
            if !seen.insert(item.key().clone()) {
                if legacy {
                    return Err(ReplaceError::DuplicateKey(item.key().clone()));
                }
                duplicate = Some(item.key().clone());
                continue;
            }
            if legacy {
                self.items.push(item);
            } else {
                staged.push(item);
            }
        }

        if let Some(key) = duplicate {
            return Err(ReplaceError::DuplicateKey(key));
        }
        if !legacy {
            self.items.replace_contents(staged);
        }
        Ok(())
    }
}
