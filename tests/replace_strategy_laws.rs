//! Property-based tests for the replace-and-validate contract.
//!
//! These tests verify that every strategy satisfies the same laws for
//! arbitrary sources, under both commit policies where the law applies.

use std::collections::HashSet;
use std::sync::Arc;

use keyset::prelude::*;
use proptest::prelude::*;
use uuid::Uuid;

fn key_strategy() -> impl Strategy<Value = CompositeKey> {
    (0u8..4, 0u8..4, "[a-c]{0,1}", "[a-z]{1,2}").prop_map(
        |(primary, secondary, namespace, name)| {
            CompositeKey::new(
                Uuid::from_u128(u128::from(primary)),
                Uuid::from_u128(u128::from(secondary)),
                namespace,
                name,
            )
        },
    )
}

fn unique_keys() -> impl Strategy<Value = Vec<CompositeKey>> {
    prop::collection::btree_set(key_strategy(), 0..40)
        .prop_map(|keys| keys.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn kind_strategy() -> impl Strategy<Value = StrategyKind> {
    prop::sample::select(StrategyKind::ALL.to_vec())
}

fn report_strategy() -> impl Strategy<Value = DuplicateReport> {
    prop_oneof![Just(DuplicateReport::InputOrder), Just(DuplicateReport::Native)]
}

fn build(
    kind: StrategyKind,
    config: ReplaceConfig,
) -> (AnyStrategy<CompositeKey>, Arc<BufferPool<CompositeKey>>) {
    let pool = Arc::new(BufferPool::new());
    (kind.build(config, Arc::clone(&pool)), pool)
}

fn present(keys: &[CompositeKey]) -> Vec<Option<CompositeKey>> {
    keys.iter().cloned().map(Some).collect()
}

fn first_repeat(keys: &[CompositeKey]) -> Option<&CompositeKey> {
    let mut seen = HashSet::new();
    keys.iter().find(|key| !seen.insert(*key))
}

// =============================================================================
// Commit Law
// Description: A duplicate-free source is committed exactly, in source order
// =============================================================================

proptest! {
    #[test]
    fn prop_commit_law(kind in kind_strategy(), keys in unique_keys()) {
        let (mut strategy, pool) = build(kind, ReplaceConfig::default());

        prop_assert!(strategy.set_items(present(&keys)).is_ok());

        prop_assert_eq!(strategy.get_items().keys(), keys);
        prop_assert_eq!(pool.outstanding(), 0);
    }
}

// =============================================================================
// Idempotence Law
// Description: Replacing twice with the same source equals replacing once
// =============================================================================

proptest! {
    #[test]
    fn prop_idempotence_law(kind in kind_strategy(), keys in unique_keys()) {
        let (mut strategy, _pool) = build(kind, ReplaceConfig::default());
        let source = present(&keys);

        strategy.set_items(&source).unwrap();
        let once = strategy.get_items().keys();
        strategy.set_items(&source).unwrap();

        prop_assert_eq!(strategy.get_items().keys(), once);
    }
}

// =============================================================================
// Duplicate Rejection Law
// Description: A source with a repeated key fails with that key, leaving the
// collection unchanged under the atomic policy
// =============================================================================

proptest! {
    #[test]
    fn prop_duplicate_rejection_law(
        kind in kind_strategy(),
        keys in unique_keys().prop_filter("need a key to repeat", |keys| !keys.is_empty()),
        pick in any::<prop::sample::Index>(),
        insert_at in any::<prop::sample::Index>(),
        previous in unique_keys(),
    ) {
        let (mut strategy, pool) = build(kind, ReplaceConfig::default());
        strategy.set_items(present(&previous)).unwrap();

        let mut source = keys.clone();
        let repeated = pick.get(&keys).clone();
        source.insert(insert_at.index(source.len() + 1), repeated);
        let expected = first_repeat(&source).cloned();

        let result = strategy.set_items(present(&source));

        prop_assert_eq!(result.unwrap_err().duplicate_key().cloned(), expected);
        prop_assert_eq!(strategy.get_items().keys(), previous);
        prop_assert_eq!(pool.outstanding(), 0);
    }
}

// =============================================================================
// Reported Key Law
// Description: Under the native report, hash-based strategies report the
// first re-occurrence and sort-based strategies the smallest duplicated key
// =============================================================================

proptest! {
    #[test]
    fn prop_native_report_law(
        kind in kind_strategy(),
        keys in prop::collection::vec(key_strategy(), 2..30),
    ) {
        let config = ReplaceConfig::default().with_duplicate_report(DuplicateReport::Native);
        let (mut strategy, _pool) = build(kind, config);

        let result = strategy.set_items(present(&keys));

        let mut counts = std::collections::BTreeMap::new();
        for key in &keys {
            *counts.entry(key).or_insert(0usize) += 1;
        }
        let smallest_duplicate = counts
            .iter()
            .find(|(_, count)| **count > 1)
            .map(|(key, _)| (*key).clone());

        let expected = match kind {
            StrategyKind::SortScan | StrategyKind::PooledSortScan => smallest_duplicate,
            _ => first_repeat(&keys).cloned(),
        };
        let reported = result.err().and_then(|error| error.duplicate_key().cloned());
        prop_assert_eq!(reported, expected);
    }
}

// =============================================================================
// Absence Law
// Description: Any absent item fails with the position of the first absence,
// whatever else the source contains
// =============================================================================

proptest! {
    #[test]
    fn prop_absence_law(
        kind in kind_strategy(),
        report in report_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..30),
        absent_at in prop::collection::vec(any::<prop::sample::Index>(), 1..4),
    ) {
        let config = ReplaceConfig::default().with_duplicate_report(report);
        let (mut strategy, pool) = build(kind, config);

        let mut source = present(&keys);
        for index in &absent_at {
            source.insert(index.index(source.len() + 1), None);
        }
        let first_absent = source.iter().position(Option::is_none);

        let result = strategy.set_items(source);

        prop_assert_eq!(
            result,
            Err(ReplaceError::InvalidItem { position: first_absent.unwrap() })
        );
        prop_assert_eq!(pool.outstanding(), 0);
    }
}

// =============================================================================
// Legacy Visibility Law
// Description: Under the legacy policy, eager strategies keep the raw source
// after a duplicate and pooled strategies keep the previous contents
// =============================================================================

proptest! {
    #[test]
    fn prop_legacy_visibility_law(
        kind in kind_strategy(),
        keys in unique_keys().prop_filter("need a key to repeat", |keys| !keys.is_empty()),
        previous in unique_keys(),
    ) {
        let config = ReplaceConfig::default().with_commit_policy(CommitPolicy::Legacy);
        let (mut strategy, _pool) = build(kind, config);
        strategy.set_items(present(&previous)).unwrap();

        let mut source = keys.clone();
        source.push(keys[0].clone());

        prop_assert!(strategy.set_items(present(&source)).is_err());

        let observed = strategy.get_items().keys();
        match kind {
            StrategyKind::Baseline => {
                prop_assert_eq!(observed, keys);
            }
            StrategyKind::SortScan | StrategyKind::SetDistinctCount => {
                prop_assert_eq!(observed, source);
            }
            StrategyKind::PooledSortScan | StrategyKind::PooledSetDistinctCount => {
                prop_assert_eq!(observed, previous);
            }
        }
    }
}
