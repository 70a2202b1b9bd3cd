//! # keyset
//!
//! Replace-and-validate strategies for shared collections of uniquely keyed
//! objects.
//!
//! ## Overview
//!
//! A strategy owns a backing collection that callers may hold on to. Replacing
//! its contents must reject absent items and duplicate keys, and must mutate
//! the collection in place so that every earlier holder sees the result.
//!
//! - **Keys**: [`CompositeKey`](key::CompositeKey) and the
//!   [`KeyedObject`](key::KeyedObject) capability
//! - **Collection**: [`SharedItems`](collection::SharedItems), the aliasable store
//! - **Pool**: [`BufferPool`](pool::BufferPool), reusable buffers with scoped release
//! - **Strategies**: five interchangeable implementations of
//!   [`ReplaceStrategy`](strategy::ReplaceStrategy)
//! - **Configuration**: [`ReplaceConfig`](config::ReplaceConfig)
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for `CompositeKey`
//! - `fxhash`: use `rustc-hash` for duplicate-detection sets
//! - `ahash`: use `ahash` for duplicate-detection sets
//!
//! ## Example
//!
//! ```rust
//! use keyset::prelude::*;
//!
//! let mut strategy = PooledSetDistinctCount::new();
//! let observer = strategy.get_items();
//!
//! strategy
//!     .set_items(vec![Some(CompositeKey::labelled("a")), Some(CompositeKey::labelled("b"))])
//!     .unwrap();
//! assert_eq!(observer.len(), 2);
//!
//! let error = strategy
//!     .set_items(vec![Some(CompositeKey::labelled("x")), None])
//!     .unwrap_err();
//! assert_eq!(error, ReplaceError::InvalidItem { position: 1 });
//! assert_eq!(observer.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use keyset::prelude::*;
/// ```
pub mod prelude {
    pub use crate::collection::{ItemSource, SharedItems, from_iter};
    pub use crate::config::{CommitPolicy, DuplicateReport, ReplaceConfig};
    pub use crate::error::{ConfigError, ReplaceError};
    pub use crate::key::{CompositeKey, KeyedObject};
    pub use crate::pool::{BufferPool, PooledBuffer};
    pub use crate::strategy::{
        AnyStrategy, Baseline, PooledSetDistinctCount, PooledSortScan, ReplaceStrategy,
        SetDistinctCount, SortScan, StrategyKind,
    };
}

pub mod collection;
pub mod config;
pub mod error;
pub mod key;
pub mod pool;
pub mod strategy;
