//! Module implement range queries over [Index](crate::Index).
//!
//! Every visited node is classified against the query's bounds, telling
//! whether its lower subtree can hold matching keys, whether the node
//! itself matches, and whether its greater subtree can hold matching keys.
//! Subtrees that provably lie outside a bound are never visited.
//!
//! Two traversals share the classification:
//!
//! * [descend], recursive descent, stack depth proportional to tree height.
//! * [Range], pull iterator over an explicit worklist of pending steps,
//!   constant stack depth irrespective of tree height.
//!
//! Both visit nodes in the same pre-order, hence compare keys in the same
//! order, and emit values in the same ascending order.

use std::cmp::Ordering;

use crate::{
    comparer::Comparer,
    node::NodeId,
    pool::Pool,
    query::{Bound, Query},
    Result,
};

// Outcome of classifying a node against a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Visit {
    pub lower: bool,   // lower subtree may hold matching keys
    pub emit: bool,    // node's key matches
    pub greater: bool, // greater subtree may hold matching keys
}

pub(crate) fn classify<K, V, C>(comparer: &C, key: &K, query: &Query<K>) -> Result<Visit>
where
    C: Comparer<K, V>,
{
    let mut visit = Visit {
        lower: true,
        emit: true,
        greater: true,
    };

    if let Some(Bound {
        value,
        include_equal,
    }) = &query.greater_than
    {
        match comparer.compare_keys(key, value)? {
            Ordering::Greater => (),
            Ordering::Equal => {
                visit.lower = false;
                visit.emit = visit.emit && *include_equal;
            }
            Ordering::Less => {
                visit.lower = false;
                visit.emit = false;
            }
        }
    }

    if let Some(Bound {
        value,
        include_equal,
    }) = &query.lower_than
    {
        match comparer.compare_keys(key, value)? {
            Ordering::Less => (),
            Ordering::Equal => {
                visit.greater = false;
                visit.emit = visit.emit && *include_equal;
            }
            Ordering::Greater => {
                visit.greater = false;
                visit.emit = false;
            }
        }
    }

    Ok(visit)
}

/// Recursive descent from node `id`. Return `Ok(false)` once `callback`
/// asks to stop, after which nothing else is visited.
pub(crate) fn descend<K, V, C, F>(
    pool: &Pool<K, V>,
    comparer: &C,
    query: &Query<K>,
    id: NodeId,
    callback: &mut F,
) -> Result<bool>
where
    C: Comparer<K, V>,
    F: FnMut(&V) -> bool,
{
    let node = pool.node(id);
    let visit = classify::<K, V, C>(comparer, &node.key, query)?;

    if let (true, Some(lower)) = (visit.lower, node.lower) {
        if !descend(pool, comparer, query, lower, callback)? {
            return Ok(false);
        }
    }
    if visit.emit {
        for value in node.values.iter() {
            if !callback(value) {
                return Ok(false);
            }
        }
    }
    if let (true, Some(greater)) = (visit.greater, node.greater) {
        return descend(pool, comparer, query, greater, callback);
    }

    Ok(true)
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Expand(NodeId),      // classify node and schedule its parts
    Emit(NodeId, usize), // yield node's values starting from offset
}

/// Iterator over values matching a [Query], refer to
/// [Index::range](crate::Index::range).
pub struct Range<'a, K, V, C> {
    pool: &'a Pool<K, V>,
    comparer: &'a C,
    query: &'a Query<K>,
    work: Vec<Step>, // pending steps, next step at the end
    fin: bool,
}

impl<'a, K, V, C> Range<'a, K, V, C> {
    pub(crate) fn new(
        pool: &'a Pool<K, V>,
        comparer: &'a C,
        query: &'a Query<K>,
        root: Option<NodeId>,
    ) -> Range<'a, K, V, C> {
        let work = match root {
            Some(id) => vec![Step::Expand(id)],
            None => Vec::default(),
        };
        Range {
            pool,
            comparer,
            query,
            work,
            fin: false,
        }
    }
}

impl<'a, K, V, C> Iterator for Range<'a, K, V, C>
where
    C: Comparer<K, V>,
{
    type Item = Result<&'a V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fin {
            return None;
        }

        let pool = self.pool;
        loop {
            match self.work.pop()? {
                Step::Emit(id, off) => {
                    let values = &pool.node(id).values;
                    if off + 1 < values.len() {
                        self.work.push(Step::Emit(id, off + 1));
                    }
                    if let Some(value) = values.get(off) {
                        break Some(Ok(value));
                    }
                }
                Step::Expand(id) => {
                    let node = pool.node(id);
                    let visit = match classify::<K, V, C>(self.comparer, &node.key, self.query) {
                        Ok(visit) => visit,
                        Err(err) => {
                            self.fin = true;
                            self.work.clear();
                            break Some(Err(err));
                        }
                    };
                    // scheduled in reverse, lower subtree is popped first.
                    if let (true, Some(greater)) = (visit.greater, node.greater) {
                        self.work.push(Step::Expand(greater));
                    }
                    if visit.emit {
                        self.work.push(Step::Emit(id, 0));
                    }
                    if let (true, Some(lower)) = (visit.lower, node.lower) {
                        self.work.push(Step::Expand(lower));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "range_test.rs"]
mod range_test;
