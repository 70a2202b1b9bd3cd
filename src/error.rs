//! Error types for replace-and-validate operations and configuration loading.

use std::fmt;

use crate::key::CompositeKey;

/// Errors raised by [`ReplaceStrategy::set_items`](crate::strategy::ReplaceStrategy::set_items).
///
/// Both variants are terminal for the call. Which state the backing
/// collection is left in depends on the configured
/// [`CommitPolicy`](crate::config::CommitPolicy).
///
/// # Examples
///
/// ```rust
/// use keyset::error::ReplaceError;
/// use keyset::key::CompositeKey;
///
/// let error = ReplaceError::DuplicateKey(CompositeKey::labelled("x"));
/// assert_eq!(error.duplicate_key(), Some(&CompositeKey::labelled("x")));
/// assert!(!error.is_invalid_item());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceError {
    /// The source contained an absent item.
    InvalidItem {
        /// Zero-based position of the absent item in the source.
        position: usize,
    },

    /// Two items in the source resolved to the same key.
    DuplicateKey(CompositeKey),
}

impl ReplaceError {
    /// Returns the offending key of a [`ReplaceError::DuplicateKey`].
    #[must_use]
    pub const fn duplicate_key(&self) -> Option<&CompositeKey> {
        match self {
            Self::DuplicateKey(key) => Some(key),
            Self::InvalidItem { .. } => None,
        }
    }

    /// Returns `true` for [`ReplaceError::InvalidItem`].
    #[must_use]
    pub const fn is_invalid_item(&self) -> bool {
        matches!(self, Self::InvalidItem { .. })
    }
}

impl fmt::Display for ReplaceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidItem { position } => {
                write!(formatter, "absent item at position {position}")
            }
            Self::DuplicateKey(key) => {
                write!(formatter, "an item with the same key has already been added: {key}")
            }
        }
    }
}

impl std::error::Error for ReplaceError {}

/// Errors that can occur when loading a [`ReplaceConfig`](crate::config::ReplaceConfig)
/// from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue {
        /// The name of the environment variable.
        key: String,
        /// Description of why the value is invalid.
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, message } => {
                write!(formatter, "Invalid value for {key}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
