use std::ops;

/// One side of a range query, `value` plus whether equality satisfies it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bound<K> {
    pub value: K,
    pub include_equal: bool,
}

impl<K> Bound<K> {
    /// Bound satisfied by keys equal to `value`.
    pub fn included(value: K) -> Bound<K> {
        Bound {
            value,
            include_equal: true,
        }
    }

    /// Bound not satisfied by keys equal to `value`.
    pub fn excluded(value: K) -> Bound<K> {
        Bound {
            value,
            include_equal: false,
        }
    }
}

/// Range query over keys.
///
/// * Neither bound set, query shall return nothing.
/// * Only `greater_than`, all values whose key is above the bound.
/// * Only `lower_than`, all values whose key is below the bound.
/// * Both set, values whose key lies between the bounds, each bound's
///   `include_equal` applies independently. An inverted or empty interval
///   is not an error, it simply returns nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query<K> {
    pub greater_than: Option<Bound<K>>,
    pub lower_than: Option<Bound<K>>,
}

impl<K> Default for Query<K> {
    fn default() -> Query<K> {
        Query {
            greater_than: None,
            lower_than: None,
        }
    }
}

impl<K> Query<K> {
    pub fn greater_than(bound: Bound<K>) -> Query<K> {
        Query {
            greater_than: Some(bound),
            lower_than: None,
        }
    }

    pub fn lower_than(bound: Bound<K>) -> Query<K> {
        Query {
            greater_than: None,
            lower_than: Some(bound),
        }
    }

    pub fn between(low: Bound<K>, high: Bound<K>) -> Query<K> {
        Query {
            greater_than: Some(low),
            lower_than: Some(high),
        }
    }

    /// Query without any bound matches nothing.
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.greater_than.is_none() && self.lower_than.is_none()
    }
}

fn from_ops_bound<K>(bound: ops::Bound<K>) -> Option<Bound<K>> {
    match bound {
        ops::Bound::Included(value) => Some(Bound::included(value)),
        ops::Bound::Excluded(value) => Some(Bound::excluded(value)),
        ops::Bound::Unbounded => None,
    }
}

/// Convert `(start, end)` pair, `Unbounded` leaves that side open. Note
/// that `(Unbounded, Unbounded)` converts to a query that matches nothing.
impl<K> From<(ops::Bound<K>, ops::Bound<K>)> for Query<K> {
    fn from((start, end): (ops::Bound<K>, ops::Bound<K>)) -> Query<K> {
        Query {
            greater_than: from_ops_bound(start),
            lower_than: from_ops_bound(end),
        }
    }
}
