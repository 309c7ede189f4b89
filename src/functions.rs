//! Key extraction and reduce functions.
//!
//! Closures work directly through the blanket impls:
//!
//! ```
//! use spillreduce::{KeyExtractor, ReduceFunction};
//!
//! let key = |v: &(String, u64)| v.0.clone();
//! let add = |a: &(String, u64), b: &(String, u64)| (a.0.clone(), a.1 + b.1);
//!
//! let x = ("x".to_string(), 2);
//! let y = ("x".to_string(), 5);
//! assert_eq!(key.key(&x), "x");
//! assert_eq!(add.reduce(&x, &y).1, 7);
//! ```
//!
//! The structs below cover the common case of `(key, number)` pair values.

use std::marker::PhantomData;
use std::ops::Add;

/// Derives the grouping key of a value. Must be pure and deterministic.
pub trait KeyExtractor<V, K> {
    fn key(&self, value: &V) -> K;
}

impl<V, K, F> KeyExtractor<V, K> for F
where
    F: Fn(&V) -> K,
{
    fn key(&self, value: &V) -> K {
        self(value)
    }
}

/// Folds an incoming value into the resident value for the same key.
///
/// Called as `reduce(resident, incoming)`. Collision order follows insertion
/// order between spills, but a key spilled and reinserted starts a new fold,
/// so the function should not depend on seeing every value for a key.
pub trait ReduceFunction<V> {
    fn reduce(&self, resident: &V, incoming: &V) -> V;
}

impl<V, F> ReduceFunction<V> for F
where
    F: Fn(&V, &V) -> V,
{
    fn reduce(&self, resident: &V, incoming: &V) -> V {
        self(resident, incoming)
    }
}

/* ===================== PairKey ===================== */

/// Uses the first element of a `(K, N)` pair as the key.
#[derive(Clone, Copy, Debug, Default)]
pub struct PairKey;

impl<K: Clone, N> KeyExtractor<(K, N), K> for PairKey {
    fn key(&self, value: &(K, N)) -> K {
        value.0.clone()
    }
}

/* ===================== Sum<N> ===================== */

/// Adds the numeric halves of two `(K, N)` pairs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum<N>(pub PhantomData<N>);
impl<N> Sum<N> {
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, N> ReduceFunction<(K, N)> for Sum<N>
where
    K: Clone,
    N: Clone + Add<Output = N>,
{
    fn reduce(&self, resident: &(K, N), incoming: &(K, N)) -> (K, N) {
        (resident.0.clone(), resident.1.clone() + incoming.1.clone())
    }
}

/* ===================== Min<N> ===================== */

/// Keeps the pair with the smaller second element. Ties keep the resident pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct Min<N>(pub PhantomData<N>);
impl<N> Min<N> {
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, N> ReduceFunction<(K, N)> for Min<N>
where
    K: Clone,
    N: Clone + Ord,
{
    fn reduce(&self, resident: &(K, N), incoming: &(K, N)) -> (K, N) {
        if incoming.1 < resident.1 {
            incoming.clone()
        } else {
            resident.clone()
        }
    }
}

/* ===================== Max<N> ===================== */

/// Keeps the pair with the larger second element. Ties keep the resident pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct Max<N>(pub PhantomData<N>);
impl<N> Max<N> {
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, N> ReduceFunction<(K, N)> for Max<N>
where
    K: Clone,
    N: Clone + Ord,
{
    fn reduce(&self, resident: &(K, N), incoming: &(K, N)) -> (K, N) {
        if incoming.1 > resident.1 {
            incoming.clone()
        } else {
            resident.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_reducers() {
        let a = ("k", 3i64);
        let b = ("k", -2i64);
        assert_eq!(Sum::<i64>::new().reduce(&a, &b), ("k", 1));
        assert_eq!(Min::<i64>::new().reduce(&a, &b), ("k", -2));
        assert_eq!(Max::<i64>::new().reduce(&a, &b), ("k", 3));
        assert_eq!(PairKey.key(&a), "k");
    }

    #[test]
    fn argument_order_is_resident_then_incoming() {
        let concat = |a: &String, b: &String| format!("{a}{b}");
        assert_eq!(concat.reduce(&"old".to_string(), &"new".to_string()), "oldnew");
    }
}
