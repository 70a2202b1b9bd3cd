//! Replace-and-validate strategies.
//!
//! Every strategy owns a [`SharedItems`] backing collection and implements
//! [`ReplaceStrategy`]: replacing the collection's contents from an
//! [`ItemSource`] while rejecting absent items and duplicate keys.
//!
//! | Strategy                   | Duplicate detection                  | Buffers        |
//! |----------------------------|--------------------------------------|----------------|
//! | [`Baseline`]               | incremental hash set                 | owned keys     |
//! | [`SortScan`]               | sort references, scan adjacent pairs | heap `Vec`     |
//! | [`PooledSortScan`]         | sort indices, scan adjacent pairs    | [`BufferPool`] |
//! | [`SetDistinctCount`]       | distinct count, then re-scan         | heap `Vec`     |
//! | [`PooledSetDistinctCount`] | distinct count, then re-scan         | [`BufferPool`] |
//!
//! # Common Contract
//!
//! - A source that is the backing collection itself is a no-op.
//! - An empty source empties the collection.
//! - Any absent item fails with [`ReplaceError::InvalidItem`]; absence is
//!   reported even when the source also contains duplicates.
//! - Two equal keys fail with [`ReplaceError::DuplicateKey`]; the reported
//!   key follows [`DuplicateReport`].
//! - On success the collection holds the source items in source order.
//! - After a failure the collection state follows [`CommitPolicy`].
//!
//! # Examples
//!
//! ```rust
//! use keyset::key::CompositeKey;
//! use keyset::strategy::{ReplaceStrategy, StrategyKind};
//! use keyset::error::ReplaceError;
//!
//! for kind in StrategyKind::ALL {
//!     let mut strategy = kind.build_default::<CompositeKey>();
//!     let result = strategy.set_items(vec![
//!         Some(CompositeKey::labelled("x")),
//!         Some(CompositeKey::labelled("x")),
//!     ]);
//!     assert_eq!(result, Err(ReplaceError::DuplicateKey(CompositeKey::labelled("x"))));
//!     assert!(strategy.get_items().is_empty());
//! }
//! ```

mod baseline;
mod pooled_set_distinct_count;
mod pooled_sort_scan;
mod set_distinct_count;
mod sort_scan;

pub use baseline::Baseline;
pub use pooled_set_distinct_count::PooledSetDistinctCount;
pub use pooled_sort_scan::PooledSortScan;
pub use set_distinct_count::SetDistinctCount;
pub use sort_scan::SortScan;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::collection::{ItemSource, SharedItems};
use crate::config::{CommitPolicy, DuplicateReport, ReplaceConfig};
use crate::error::ReplaceError;
use crate::key::{CompositeKey, KeyedObject};
use crate::pool::BufferPool;

/// The replace-and-validate contract shared by all strategies.
pub trait ReplaceStrategy<T> {
    /// Returns a short, stable name for this strategy.
    fn name(&self) -> &'static str;

    /// Returns the configuration in effect.
    fn config(&self) -> &ReplaceConfig;

    /// Installs a fresh, empty backing collection.
    ///
    /// Handles obtained from [`get_items`](Self::get_items) before the reset
    /// keep the old collection and no longer observe replacements.
    fn reset(&mut self);

    /// Returns the live backing collection.
    fn get_items(&self) -> SharedItems<T>;

    /// Validates `source` and replaces the backing collection's contents with it.
    ///
    /// # Errors
    ///
    /// Returns [`ReplaceError::InvalidItem`] if `source` contains an absent item,
    /// or [`ReplaceError::DuplicateKey`] if two items share a key.
    fn set_items<S: ItemSource<T>>(&mut self, source: S) -> Result<(), ReplaceError>;
}

// =============================================================================
// Shared Validation Helpers
// =============================================================================

#[cfg(feature = "fxhash")]
type KeyHasher = rustc_hash::FxBuildHasher;

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
type KeyHasher = ahash::RandomState;

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
type KeyHasher = std::collections::hash_map::RandomState;

/// A set of keys used for duplicate detection.
pub(crate) type KeySet<K> = HashSet<K, KeyHasher>;

pub(crate) fn key_set<K>(capacity: usize) -> KeySet<K> {
    HashSet::with_capacity_and_hasher(capacity, KeyHasher::default())
}

/// Unwraps a source item, failing with `InvalidItem` when it is absent.
#[inline]
pub(crate) fn require_present<T>(
    position: usize,
    item: Option<T>,
) -> Result<T, ReplaceError> {
    match item {
        Some(item) => Ok(item),
        None => Err(ReplaceError::InvalidItem { position }),
    }
}

/// Returns the key of the earliest item whose key already occurred before it.
pub(crate) fn first_repeat_in_order<T: KeyedObject>(items: &[T]) -> Option<&CompositeKey> {
    let mut seen = key_set(items.len());
    items
        .iter()
        .map(KeyedObject::key)
        .find(|key| !seen.insert(*key))
}

/// Counts distinct keys.
pub(crate) fn distinct_count<T: KeyedObject>(items: &[T]) -> usize {
    let mut distinct = key_set(items.len());
    distinct.extend(items.iter().map(KeyedObject::key));
    distinct.len()
}

/// Returns the key of the first adjacent equal pair in a key-sorted slice.
pub(crate) fn first_adjacent_duplicate<T: KeyedObject>(sorted: &[T]) -> Option<&CompositeKey> {
    sorted
        .windows(2)
        .find(|pair| pair[0].key() == pair[1].key())
        .map(|pair| pair[0].key())
}

#[inline]
pub(crate) fn compare_keys<T: KeyedObject>(left: &T, right: &T) -> std::cmp::Ordering {
    left.key().cmp(right.key())
}

/// Resolves the key to report once a sort scan has found `sorted_first`.
pub(crate) fn reported_sort_duplicate<T: KeyedObject>(
    report: DuplicateReport,
    sorted_first: &CompositeKey,
    source_order: &[T],
) -> CompositeKey {
    match report {
        DuplicateReport::Native => sorted_first.clone(),
        DuplicateReport::InputOrder => first_repeat_in_order(source_order)
            .unwrap_or(sorted_first)
            .clone(),
    }
}

// =============================================================================
// Strategy Selection
// =============================================================================

/// Identifies one of the five replace strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// [`Baseline`]
    Baseline,
    /// [`SortScan`]
    SortScan,
    /// [`PooledSortScan`]
    PooledSortScan,
    /// [`SetDistinctCount`]
    SetDistinctCount,
    /// [`PooledSetDistinctCount`]
    PooledSetDistinctCount,
}

impl StrategyKind {
    /// Every strategy, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Baseline,
        Self::SortScan,
        Self::PooledSortScan,
        Self::SetDistinctCount,
        Self::PooledSetDistinctCount,
    ];

    /// Returns the strategy's name, as reported by [`ReplaceStrategy::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::SortScan => "sort-scan",
            Self::PooledSortScan => "pooled-sort-scan",
            Self::SetDistinctCount => "set-distinct-count",
            Self::PooledSetDistinctCount => "pooled-set-distinct-count",
        }
    }

    /// Returns `true` for strategies that borrow from a [`BufferPool`].
    #[must_use]
    pub const fn is_pooled(self) -> bool {
        matches!(self, Self::PooledSortScan | Self::PooledSetDistinctCount)
    }

    /// Returns `true` if a failed call leaves the collection untouched under `policy`.
    #[must_use]
    pub const fn is_atomic_under(self, policy: CommitPolicy) -> bool {
        matches!(policy, CommitPolicy::Atomic) || self.is_pooled()
    }

    /// Builds the strategy. Non-pooled strategies ignore `pool`.
    #[must_use]
    pub fn build<T>(self, config: ReplaceConfig, pool: Arc<BufferPool<T>>) -> AnyStrategy<T> {
        match self {
            Self::Baseline => AnyStrategy::Baseline(Baseline::with_config(config)),
            Self::SortScan => AnyStrategy::SortScan(SortScan::with_config(config)),
            Self::PooledSortScan => {
                AnyStrategy::PooledSortScan(PooledSortScan::with_pool(config, pool))
            }
            Self::SetDistinctCount => {
                AnyStrategy::SetDistinctCount(SetDistinctCount::with_config(config))
            }
            Self::PooledSetDistinctCount => AnyStrategy::PooledSetDistinctCount(
                PooledSetDistinctCount::with_pool(config, pool),
            ),
        }
    }

    /// Builds the strategy with the default configuration and a private pool.
    #[must_use]
    pub fn build_default<T>(self) -> AnyStrategy<T> {
        self.build(ReplaceConfig::default(), Arc::new(BufferPool::new()))
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| format!("unknown strategy: {value}"))
    }
}

/// Any of the five strategies, dispatched statically by `match`.
#[derive(Debug)]
pub enum AnyStrategy<T> {
    /// See [`Baseline`].
    Baseline(Baseline<T>),
    /// See [`SortScan`].
    SortScan(SortScan<T>),
    /// See [`PooledSortScan`].
    PooledSortScan(PooledSortScan<T>),
    /// See [`SetDistinctCount`].
    SetDistinctCount(SetDistinctCount<T>),
    /// See [`PooledSetDistinctCount`].
    PooledSetDistinctCount(PooledSetDistinctCount<T>),
}

impl<T> AnyStrategy<T> {
    /// Returns which strategy this is.
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Baseline(_) => StrategyKind::Baseline,
            Self::SortScan(_) => StrategyKind::SortScan,
            Self::PooledSortScan(_) => StrategyKind::PooledSortScan,
            Self::SetDistinctCount(_) => StrategyKind::SetDistinctCount,
            Self::PooledSetDistinctCount(_) => StrategyKind::PooledSetDistinctCount,
        }
    }
}

macro_rules! dispatch {
    ($strategy:expr, $inner:ident => $body:expr) => {
        match $strategy {
            AnyStrategy::Baseline($inner) => $body,
            AnyStrategy::SortScan($inner) => $body,
            AnyStrategy::PooledSortScan($inner) => $body,
            AnyStrategy::SetDistinctCount($inner) => $body,
            AnyStrategy::PooledSetDistinctCount($inner) => $body,
        }
    };
}

impl<T: KeyedObject + Clone> ReplaceStrategy<T> for AnyStrategy<T> {
    fn name(&self) -> &'static str {
        dispatch!(self, inner => inner.name())
    }

    fn config(&self) -> &ReplaceConfig {
        dispatch!(self, inner => inner.config())
    }

    fn reset(&mut self) {
        dispatch!(self, inner => inner.reset());
    }

    fn get_items(&self) -> SharedItems<T> {
        dispatch!(self, inner => inner.get_items())
    }

    fn set_items<S: ItemSource<T>>(&mut self, source: S) -> Result<(), ReplaceError> {
        dispatch!(self, inner => inner.set_items(source))
    }
}
