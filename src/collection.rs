//! The shared backing collection and the sources a replace reads from.
//!
//! [`SharedItems`] is the exposed, ordered store that replace strategies
//! mutate in place. Cloning the handle never copies items: every clone
//! observes every later mutation, until the owning strategy is `reset`.
//!
//! [`ItemSource`] describes anything a strategy can replace its items from.
//! Absent items are represented as `None`.
//!
//! # Examples
//!
//! ```rust
//! use keyset::collection::SharedItems;
//! use keyset::key::CompositeKey;
//! use keyset::strategy::{Baseline, ReplaceStrategy};
//!
//! let mut strategy = Baseline::new();
//! let observer: SharedItems<CompositeKey> = strategy.get_items();
//!
//! strategy
//!     .set_items(vec![Some(CompositeKey::labelled("a"))])
//!     .unwrap();
//!
//! // The earlier handle sees the replacement.
//! assert_eq!(observer.len(), 1);
//! ```

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::key::{CompositeKey, KeyedObject};

/// A shared, mutable, ordered collection of keyed items.
///
/// All clones refer to the same storage. The handle is `!Send` and `!Sync`:
/// a collection is mutated from one thread only.
pub struct SharedItems<T> {
    inner: Rc<RefCell<Vec<T>>>,
}

static_assertions::assert_not_impl_any!(SharedItems<CompositeKey>: Send, Sync);

impl<T> Clone for SharedItems<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedItems<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedItems<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.inner.borrow().iter()).finish()
    }
}

impl<T> SharedItems<T> {
    /// Creates a new, empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` if the collection holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Returns `true` if both handles refer to the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Calls `reader` with a borrowed view of the current items.
    ///
    /// # Panics
    ///
    /// Panics if `reader` replaces items through a strategy while the view is held.
    pub fn with_items<R>(&self, reader: impl FnOnce(&[T]) -> R) -> R {
        reader(&self.inner.borrow())
    }

    /// Returns a borrowed view of the current items.
    ///
    /// # Panics
    ///
    /// Panics if a replace runs while the returned guard is alive.
    #[must_use]
    pub fn read(&self) -> Ref<'_, [T]> {
        Ref::map(self.inner.borrow(), Vec::as_slice)
    }

    pub(crate) fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    pub(crate) fn push(&self, item: T) {
        self.inner.borrow_mut().push(item);
    }

    /// Swaps the contents for `items` without allocating a new handle.
    pub(crate) fn replace_contents(&self, items: impl IntoIterator<Item = T>) {
        let mut storage = self.inner.borrow_mut();
        storage.clear();
        storage.extend(items);
    }
}

impl<T: Clone> SharedItems<T> {
    /// Returns a snapshot of the current items.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.borrow().clone()
    }
}

impl<T: KeyedObject> SharedItems<T> {
    /// Returns `true` if an item with `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &CompositeKey) -> bool {
        self.inner.borrow().iter().any(|item| item.key() == key)
    }

    /// Returns the keys of the current items, in collection order.
    #[must_use]
    pub fn keys(&self) -> Vec<CompositeKey> {
        self.inner
            .borrow()
            .iter()
            .map(|item| item.key().clone())
            .collect()
    }
}

/// A sequence of possibly absent items that a strategy can replace from.
///
/// `aliases` lets a strategy detect that it is being asked to replace a
/// collection with itself, which is a no-op.
pub trait ItemSource<T> {
    /// Iterator over the source items.
    type Items: Iterator<Item = Option<T>>;

    /// Returns `true` if this source is the collection `items` itself.
    fn aliases(&self, _items: &SharedItems<T>) -> bool {
        false
    }

    /// Returns how many items a strategy may preallocate room for.
    ///
    /// `None` means the length is unknown and buffers start small and grow.
    fn len_hint(&self) -> Option<usize> {
        None
    }

    /// Consumes the source.
    fn into_items(self) -> Self::Items;
}

impl<T> ItemSource<T> for Vec<Option<T>> {
    type Items = std::vec::IntoIter<Option<T>>;

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }

    fn into_items(self) -> Self::Items {
        self.into_iter()
    }
}

impl<'a, T: Clone> ItemSource<T> for &'a [Option<T>] {
    type Items = std::iter::Cloned<std::slice::Iter<'a, Option<T>>>;

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }

    fn into_items(self) -> Self::Items {
        self.iter().cloned()
    }
}

impl<'a, T: Clone> ItemSource<T> for &'a Vec<Option<T>> {
    type Items = std::iter::Cloned<std::slice::Iter<'a, Option<T>>>;

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }

    fn into_items(self) -> Self::Items {
        self.iter().cloned()
    }
}

impl<T: Clone> ItemSource<T> for &SharedItems<T> {
    type Items = std::iter::Map<std::vec::IntoIter<T>, fn(T) -> Option<T>>;

    fn aliases(&self, items: &SharedItems<T>) -> bool {
        self.ptr_eq(items)
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }

    fn into_items(self) -> Self::Items {
        self.to_vec().into_iter().map(Some as fn(T) -> Option<T>)
    }
}

/// An [`ItemSource`] wrapping an arbitrary iterator.
///
/// Created by [`from_iter`]. An exact `size_hint` is used for preallocation,
/// capped at [`MAX_ITERATOR_LEN_HINT`]: the hint is not checked against the
/// items actually produced.
#[derive(Debug, Clone)]
pub struct FromIter<I> {
    iter: I,
}

/// Wraps an iterator of possibly absent items as an [`ItemSource`].
///
/// # Examples
///
/// ```rust
/// use keyset::collection::from_iter;
/// use keyset::key::CompositeKey;
/// use keyset::strategy::{PooledSortScan, ReplaceStrategy};
///
/// let mut strategy = PooledSortScan::new();
/// strategy
///     .set_items(from_iter(["a", "b"].into_iter().map(|name| Some(CompositeKey::labelled(name)))))
///     .unwrap();
/// assert_eq!(strategy.get_items().len(), 2);
/// ```
pub fn from_iter<T, I>(iter: I) -> FromIter<I::IntoIter>
where
    I: IntoIterator<Item = Option<T>>,
{
    FromIter {
        iter: iter.into_iter(),
    }
}

impl<T, I> ItemSource<T> for FromIter<I>
where
    I: Iterator<Item = Option<T>>,
{
    type Items = I;

    fn len_hint(&self) -> Option<usize> {
        exact_size_hint(&self.iter).map(|len| len.min(MAX_ITERATOR_LEN_HINT))
    }

    fn into_items(self) -> Self::Items {
        self.iter
    }
}

/// Largest preallocation taken from an iterator's size hint.
pub const MAX_ITERATOR_LEN_HINT: usize = 1 << 16;

fn exact_size_hint<I: Iterator>(iter: &I) -> Option<usize> {
    match iter.size_hint() {
        (lower, Some(upper)) if lower == upper => Some(lower),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn keys(names: &[&str]) -> Vec<CompositeKey> {
        names.iter().map(|name| CompositeKey::labelled(*name)).collect()
    }

    #[rstest]
    fn test_clones_share_storage() {
        let items: SharedItems<CompositeKey> = SharedItems::new();
        let observer = items.clone();

        items.replace_contents(keys(&["a", "b"]));

        assert_eq!(observer.len(), 2);
        assert!(observer.ptr_eq(&items));
        assert!(observer.contains_key(&CompositeKey::labelled("a")));
    }

    #[rstest]
    fn test_separate_collections_do_not_alias() {
        let first: SharedItems<CompositeKey> = SharedItems::new();
        let second: SharedItems<CompositeKey> = SharedItems::new();
        assert!(!first.ptr_eq(&second));
        assert!((&second).aliases(&second));
        assert!(!(&second).aliases(&first));
    }

    #[rstest]
    fn test_replace_contents_keeps_handle() {
        let items: SharedItems<CompositeKey> = SharedItems::new();
        let observer = items.clone();
        items.replace_contents(keys(&["a"]));

        items.replace_contents(keys(&["b", "c"]));

        assert_eq!(observer.keys(), keys(&["b", "c"]));
        items.clear();
        assert!(observer.is_empty());
    }

    #[rstest]
    fn test_read_and_with_items_see_current_contents() {
        let items: SharedItems<CompositeKey> = SharedItems::new();
        items.push(CompositeKey::labelled("a"));

        assert_eq!(items.read().len(), 1);
        assert_eq!(items.with_items(|slice| slice[0].name().to_string()), "a");
        assert_eq!(items.to_vec(), keys(&["a"]));
    }

    #[rstest]
    fn test_debug_lists_items() {
        let items: SharedItems<u8> = SharedItems::new();
        items.replace_contents([1, 2]);
        assert_eq!(format!("{items:?}"), "[1, 2]");
    }

    #[rstest]
    #[case(vec![Some(1), None, Some(3)], Some(3))]
    #[case(Vec::new(), Some(0))]
    fn test_len_hint_of_materialised_sources(
        #[case] source: Vec<Option<u8>>,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(source.len_hint(), expected);
    }

    #[rstest]
    fn test_len_hint_of_filtered_source_is_unknown() {
        let source = from_iter((0..4).filter(|value| value % 2 == 0).map(Some));
        assert_eq!(source.len_hint(), None);
    }

    #[rstest]
    fn test_len_hint_of_exact_iterator_is_capped() {
        let exact = from_iter((0..10).map(Some));
        let huge = from_iter((0..usize::MAX).map(|_| None::<u8>));

        assert_eq!(exact.len_hint(), Some(10));
        assert_eq!(huge.len_hint(), Some(MAX_ITERATOR_LEN_HINT));
    }

    #[rstest]
    fn test_shared_source_snapshots_items() {
        let items: SharedItems<CompositeKey> = SharedItems::new();
        items.replace_contents(keys(&["a", "b"]));

        let collected: Vec<Option<CompositeKey>> = (&items).into_items().collect();

        assert_eq!(
            collected,
            keys(&["a", "b"]).into_iter().map(Some).collect::<Vec<_>>()
        );
    }
}
