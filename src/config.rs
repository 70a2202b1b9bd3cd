//! Strategy configuration.
//!
//! [`ReplaceConfig`] controls the two behaviours on which the replace
//! strategies historically disagreed, plus the sizing of pooled buffers:
//!
//! - [`CommitPolicy`]: what a failed `set_items` leaves behind
//! - [`DuplicateReport`]: which key a `DuplicateKey` error carries
//! - `default_capacity` / `max_retained_capacity`: pooled buffer sizing
//!
//! # Example
//!
//! ```rust
//! use keyset::config::{CommitPolicy, DuplicateReport, ReplaceConfig};
//!
//! let config = ReplaceConfig::default()
//!     .with_commit_policy(CommitPolicy::Legacy)
//!     .with_duplicate_report(DuplicateReport::Native);
//! assert_eq!(config.commit_policy(), CommitPolicy::Legacy);
//! ```

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Initial pooled buffer capacity when the source does not report its length.
pub const DEFAULT_CAPACITY: usize = 16;

/// Buffers above this capacity are dropped instead of returned to the pool.
pub const DEFAULT_MAX_RETAINED_CAPACITY: usize = 1 << 20;

/// What a failed `set_items` leaves in the backing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommitPolicy {
    /// Validate the whole source before touching the collection.
    ///
    /// A failed call leaves the collection exactly as it was.
    #[default]
    Atomic,

    /// Reproduce the historical per-strategy behaviour.
    ///
    /// `Baseline` stops at the first duplicate and keeps the validated
    /// prefix. `SortScan` and `SetDistinctCount` keep the raw source
    /// including duplicates. The pooled strategies stay atomic.
    Legacy,
}

impl FromStr for CommitPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(Self::Atomic),
            "legacy" => Ok(Self::Legacy),
            _ => Err("expected one of: atomic, legacy".to_string()),
        }
    }
}

/// Which key a `DuplicateKey` error reports when several keys collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuplicateReport {
    /// Report the key of the earliest source item whose key already occurred.
    ///
    /// All five strategies agree under this mode.
    #[default]
    InputOrder,

    /// Report whatever the algorithm meets first.
    ///
    /// Hash-set strategies report the first re-occurrence in source order;
    /// sort-based strategies report the first adjacent equal pair in sorted
    /// order, which is the smallest duplicated key.
    Native,
}

impl FromStr for DuplicateReport {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "input-order" | "input_order" => Ok(Self::InputOrder),
            "native" => Ok(Self::Native),
            _ => Err("expected one of: input-order, native".to_string()),
        }
    }
}

/// Configuration shared by every replace strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceConfig {
    commit_policy: CommitPolicy,
    duplicate_report: DuplicateReport,
    default_capacity: usize,
    max_retained_capacity: usize,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplaceConfig {
    /// Creates the default configuration: atomic commits, input-order reports.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commit_policy: CommitPolicy::Atomic,
            duplicate_report: DuplicateReport::InputOrder,
            default_capacity: DEFAULT_CAPACITY,
            max_retained_capacity: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }

    /// Sets the commit policy.
    #[must_use]
    pub const fn with_commit_policy(mut self, commit_policy: CommitPolicy) -> Self {
        self.commit_policy = commit_policy;
        self
    }

    /// Sets the duplicate reporting mode.
    #[must_use]
    pub const fn with_duplicate_report(mut self, duplicate_report: DuplicateReport) -> Self {
        self.duplicate_report = duplicate_report;
        self
    }

    /// Sets the initial pooled buffer capacity for sources of unknown length.
    ///
    /// Zero is raised to one so that doubling always makes progress.
    #[must_use]
    pub const fn with_default_capacity(mut self, default_capacity: usize) -> Self {
        self.default_capacity = if default_capacity == 0 {
            1
        } else {
            default_capacity
        };
        self
    }

    /// Sets the largest buffer capacity the pool keeps for reuse.
    #[must_use]
    pub const fn with_max_retained_capacity(mut self, max_retained_capacity: usize) -> Self {
        self.max_retained_capacity = max_retained_capacity;
        self
    }

    /// Returns the commit policy.
    #[must_use]
    pub const fn commit_policy(&self) -> CommitPolicy {
        self.commit_policy
    }

    /// Returns the duplicate reporting mode.
    #[must_use]
    pub const fn duplicate_report(&self) -> DuplicateReport {
        self.duplicate_report
    }

    /// Returns the initial pooled buffer capacity for sources of unknown length.
    #[must_use]
    pub const fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    /// Returns the largest buffer capacity the pool keeps for reuse.
    #[must_use]
    pub const fn max_retained_capacity(&self) -> usize {
        self.max_retained_capacity
    }

    /// Loads configuration from environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Environment Variables
    ///
    /// - `KEYSET_COMMIT_POLICY`: `atomic` or `legacy` (default: `atomic`)
    /// - `KEYSET_DUPLICATE_REPORT`: `input-order` or `native` (default: `input-order`)
    /// - `KEYSET_DEFAULT_CAPACITY`: positive integer (default: 16)
    /// - `KEYSET_MAX_RETAINED_CAPACITY`: integer (default: 1048576)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::new();

        let commit_policy = parse_optional(&lookup, "KEYSET_COMMIT_POLICY")?
            .unwrap_or(defaults.commit_policy);
        let duplicate_report = parse_optional(&lookup, "KEYSET_DUPLICATE_REPORT")?
            .unwrap_or(defaults.duplicate_report);
        let default_capacity: usize = parse_optional(&lookup, "KEYSET_DEFAULT_CAPACITY")?
            .unwrap_or(defaults.default_capacity);
        let max_retained_capacity = parse_optional(&lookup, "KEYSET_MAX_RETAINED_CAPACITY")?
            .unwrap_or(defaults.max_retained_capacity);

        if default_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "KEYSET_DEFAULT_CAPACITY".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        let config = Self {
            commit_policy,
            duplicate_report,
            default_capacity,
            max_retained_capacity,
        };
        tracing::debug!(?config, "replace configuration loaded");
        Ok(config)
    }
}

fn parse_optional<F, V>(lookup: &F, key: &str) -> Result<Option<V>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    V: FromStr,
    V::Err: ToString,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse().map_err(|error: V::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: error.to_string(),
            })
        })
        .transpose()
}
