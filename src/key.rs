//! Composite keys and the keyed-object capability.
//!
//! Every item stored in a [`SharedItems`](crate::collection::SharedItems)
//! collection is identified by a [`CompositeKey`]. Items expose their key
//! through the [`KeyedObject`] trait, which is resolved statically so that
//! duplicate detection never pays for dynamic dispatch.
//!
//! # Examples
//!
//! ```rust
//! use keyset::key::{CompositeKey, KeyedObject};
//! use uuid::Uuid;
//!
//! let key = CompositeKey::new(Uuid::nil(), Uuid::nil(), "accounts", "alice");
//! assert_eq!(key.name(), "alice");
//! assert_eq!(key.key(), &key);
//! ```

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use uuid::Uuid;

/// An immutable, totally ordered identifier made of two UUIDs and two text fields.
///
/// Ordering is lexicographic over `(primary, secondary, namespace, name)`.
/// Two keys are duplicates iff they are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositeKey {
    primary: Uuid,
    secondary: Uuid,
    namespace: String,
    name: String,
}

impl CompositeKey {
    /// Creates a new key from its four components.
    #[must_use]
    pub fn new(
        primary: Uuid,
        secondary: Uuid,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            primary,
            secondary,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Creates a key that differs from other labelled keys only by `name`.
    ///
    /// Both identifiers are nil and the namespace is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keyset::key::CompositeKey;
    ///
    /// assert_eq!(CompositeKey::labelled("x"), CompositeKey::labelled("x"));
    /// assert!(CompositeKey::labelled("a") < CompositeKey::labelled("b"));
    /// ```
    #[must_use]
    pub fn labelled(name: impl Into<String>) -> Self {
        Self::new(Uuid::nil(), Uuid::nil(), String::new(), name)
    }

    /// Returns the primary identifier.
    #[inline]
    #[must_use]
    pub const fn primary(&self) -> Uuid {
        self.primary
    }

    /// Returns the secondary identifier.
    #[inline]
    #[must_use]
    pub const fn secondary(&self) -> Uuid {
        self.secondary
    }

    /// Returns the namespace text field.
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the name text field.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{}/{}/{}",
            self.primary, self.secondary, self.namespace, self.name
        )
    }
}

/// Capability of yielding a [`CompositeKey`].
///
/// Implemented for keys themselves and forwarded through the common
/// pointer types, so `Rc<Order>` or `&Order` are keyed whenever `Order` is.
pub trait KeyedObject {
    /// Returns the key identifying this object.
    fn key(&self) -> &CompositeKey;
}

impl KeyedObject for CompositeKey {
    #[inline]
    fn key(&self) -> &CompositeKey {
        self
    }
}

impl<K: KeyedObject + ?Sized> KeyedObject for &K {
    #[inline]
    fn key(&self) -> &CompositeKey {
        (**self).key()
    }
}

impl<K: KeyedObject + ?Sized> KeyedObject for Box<K> {
    #[inline]
    fn key(&self) -> &CompositeKey {
        (**self).key()
    }
}

impl<K: KeyedObject + ?Sized> KeyedObject for Rc<K> {
    #[inline]
    fn key(&self) -> &CompositeKey {
        (**self).key()
    }
}

impl<K: KeyedObject + ?Sized> KeyedObject for Arc<K> {
    #[inline]
    fn key(&self) -> &CompositeKey {
        (**self).key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug)]
    struct Order {
        id: CompositeKey,
    }

    impl KeyedObject for Order {
        fn key(&self) -> &CompositeKey {
            &self.id
        }
    }

    #[rstest]
    fn test_ordering_is_lexicographic_over_fields() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);

        let first = CompositeKey::new(low, high, "b", "b");
        let second = CompositeKey::new(high, low, "a", "a");
        assert!(first < second);

        let third = CompositeKey::new(low, high, "b", "c");
        assert!(first < third);
    }

    #[rstest]
    #[case("a", "a", true)]
    #[case("a", "b", false)]
    fn test_labelled_equality(#[case] left: &str, #[case] right: &str, #[case] expected: bool) {
        assert_eq!(
            CompositeKey::labelled(left) == CompositeKey::labelled(right),
            expected
        );
    }

    #[rstest]
    fn test_display_joins_components() {
        let key = CompositeKey::new(Uuid::nil(), Uuid::from_u128(1), "ns", "name");
        assert_eq!(
            key.to_string(),
            "00000000-0000-0000-0000-000000000000/00000000-0000-0000-0000-000000000001/ns/name"
        );
    }

    #[rstest]
    fn test_key_forwards_through_pointers() {
        let order = Order {
            id: CompositeKey::labelled("order"),
        };
        let shared = Rc::new(Order {
            id: CompositeKey::labelled("order"),
        });
        let boxed: Box<Order> = Box::new(Order {
            id: CompositeKey::labelled("order"),
        });

        assert_eq!(<&Order as KeyedObject>::key(&&order), order.key());
        assert_eq!(shared.key(), order.key());
        assert_eq!(boxed.key(), order.key());
        assert_eq!(Arc::new(CompositeKey::labelled("order")).key(), order.key());
    }
}
