//! Assertion functions for values emitted by a table.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
///
/// ```
/// use spillreduce::testing::assert_collections_equal;
///
/// assert_collections_equal(&[1, 2, 3], &[1, 2, 3]);
/// ```
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that two collections of key-value pairs are equal after sorting by key.
///
/// # Panics
///
/// Panics if the collections differ in length, keys or values.
///
/// ```
/// use spillreduce::testing::assert_kv_collections_equal;
///
/// assert_kv_collections_equal(vec![("b", 2), ("a", 1)], vec![("a", 1), ("b", 2)]);
/// ```
pub fn assert_kv_collections_equal<K, V>(mut actual: Vec<(K, V)>, mut expected: Vec<(K, V)>)
where
    K: Debug + Ord,
    V: Debug + PartialEq,
{
    actual.sort_by(|a, b| a.0.cmp(&b.0));
    expected.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, ((ak, av), (ek, ev))) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            ak == ek && av == ev,
            "Collection mismatch at index {i} after sorting:\n  Expected: ({ek:?}, {ev:?})\n  Actual: ({ak:?}, {av:?})\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that no key appears twice among `keys`.
///
/// Between two spills a table never emits the same key twice; feed this the
/// keys of one spill or one flush.
///
/// # Panics
///
/// Panics on the first repeated key.
pub fn assert_unique_keys<'a, K, I>(keys: I)
where
    K: Debug + Eq + Hash + 'a,
    I: IntoIterator<Item = &'a K>,
{
    let mut seen = HashSet::new();
    for k in keys {
        assert!(seen.insert(k), "Duplicate key emitted: {k:?}");
    }
}
