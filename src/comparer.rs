//! Module define the ordering contract between [Index](crate::Index) and
//! its keys and values.

use std::cmp::Ordering;

use crate::Result;

/// Ordering collaborator for keys and values.
///
/// Implementation must define a strict total order over all keys ever
/// inserted into an index, and a symmetric equality over values. Both
/// methods must be pure. When either method fails, the index operation in
/// flight is aborted and the error is returned to the caller, nothing in the
/// tree is mutated before the failing call.
///
/// Implementations that cannot compare a pair of operands shall return
/// [Error::ComparisonFailure](crate::Error::ComparisonFailure).
pub trait Comparer<K, V> {
    /// Order key `a` relative to key `b`.
    fn compare_keys(&self, a: &K, b: &K) -> Result<Ordering>;

    /// Check whether value `a` is equal to value `b`, used by update and
    /// value-level delete.
    fn values_equal(&self, a: &V, b: &V) -> Result<bool>;
}

/// Comparer using the natural ordering of `K` and equality of `V`.
/// Never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct Natural;

impl<K, V> Comparer<K, V> for Natural
where
    K: Ord,
    V: PartialEq,
{
    #[inline]
    fn compare_keys(&self, a: &K, b: &K) -> Result<Ordering> {
        Ok(a.cmp(b))
    }

    #[inline]
    fn values_equal(&self, a: &V, b: &V) -> Result<bool> {
        Ok(a == b)
    }
}

/// Comparer reversing the key order of another comparer, value equality is
/// left untouched. Useful to index keys in descending order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reverse<C> {
    inner: C,
}

impl<C> Reverse<C> {
    pub fn new(inner: C) -> Reverse<C> {
        Reverse { inner }
    }
}

impl<C, K, V> Comparer<K, V> for Reverse<C>
where
    C: Comparer<K, V>,
{
    fn compare_keys(&self, a: &K, b: &K) -> Result<Ordering> {
        Ok(self.inner.compare_keys(a, b)?.reverse())
    }

    fn values_equal(&self, a: &V, b: &V) -> Result<bool> {
        self.inner.values_equal(a, b)
    }
}
