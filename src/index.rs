//! Module provide the multi-value ordered index implemented by [Index] type.
//!
//! Index is an unbalanced [binary-search-tree][wiki-bst], nodes are never
//! rotated. A strictly ascending or descending insertion order degrades the
//! tree into a list, single-key operations are iterative and range queries
//! switch to an explicit worklist beyond a configured size, so that no
//! operation depends on call-stack depth proportional to tree height.
//!
//! Constructing a new index:
//!
//! ```
//! use ubst::{Config, Index, Natural};
//!
//! let config = Config::new().set_unique(true);
//! let mut index: Index<u64, String> = Index::with_config(config, Natural);
//!
//! index.insert(10, "ten".to_string()).unwrap();
//! assert!(index.insert(10, "dix".to_string()).is_err());
//! assert_eq!(index.get(&10).unwrap().unwrap(), &["ten".to_string()]);
//! ```
//!
//! [wiki-bst]: https://en.wikipedia.org/wiki/Binary_search_tree

use log::{debug, trace};
use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};

use std::{cmp::Ordering, fmt, mem, slice};

use crate::{
    comparer::{Comparer, Natural},
    config::{Config, Donor, Traversal},
    node::{NodeId, NodeRef, Side},
    pool::Pool,
    query::Query,
    range::{self, Range},
    Error, Result,
};

/// Index manage a single instance of in-memory, unbalanced,
/// binary-search-tree mapping each key to one or more values.
///
/// Index is not thread safe, mutations take `&mut self` and callers
/// sharing an index across threads must serialize access externally.
pub struct Index<K, V, C = Natural> {
    pool: Pool<K, V>,
    comparer: C,
    config: Config,
    rng: SmallRng,
    n_count: usize, // number of keys holding at least one value.
    height: usize,  // upper bound on tree height, exact until a removal.
    edges: [Option<(NodeId, usize)>; 2], // cached (min, max) node and depth.
}

enum Locate {
    Empty,
    Found(NodeId),
    Vacant(NodeId, Side, usize), // parent, side, depth of the new node
}

impl<K, V, C> Index<K, V, C> {
    /// Create an empty index with default [Config].
    pub fn new(comparer: C) -> Index<K, V, C> {
        Index::with_config(Config::default(), comparer)
    }

    /// Create an empty index. Configuration cannot be changed later.
    pub fn with_config(config: Config, comparer: C) -> Index<K, V, C> {
        let seed = config.seed.unwrap_or_else(random);
        debug!(
            target: "ubst",
            "new index unique:{} value_chunk:{} recursion_limit:{} recycle:{} donor:{:?} seed:{}",
            config.unique,
            config.to_value_chunk(),
            config.recursion_limit,
            config.recycle,
            config.donor,
            seed
        );

        Index {
            pool: Pool::new(config.to_value_chunk(), config.recycle),
            comparer,
            config,
            rng: SmallRng::seed_from_u64(seed),
            n_count: 0,
            height: 0,
            edges: [None, None],
        }
    }
}

/// Maintenance API.
impl<K, V, C> Index<K, V, C> {
    /// Return number of keys holding at least one value.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Check whether the root holds a key. Index is uninitialized when
    /// created and again after its last key is removed.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.pool.is_occupied(NodeId::ROOT)
    }

    #[inline]
    pub fn to_config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn as_comparer(&self) -> &C {
        &self.comparer
    }

    /// Return statistics on the tree's shape and on node recycling.
    pub fn stats(&self) -> Stats {
        let mut stats = Stats {
            n_count: self.n_count,
            n_nodes: self.pool.len(),
            depth: 0,
            n_pooled: self.pool.to_pooled(),
            n_fresh: self.pool.to_fresh(),
            n_reused: self.pool.to_reused(),
        };

        let mut stack = Vec::default();
        if self.is_initialized() {
            stack.push((NodeId::ROOT, 1));
        }
        while let Some((id, depth)) = stack.pop() {
            stats.depth = stats.depth.max(depth);
            let node = self.pool.node(id);
            for child in [node.lower, node.greater].iter().flatten() {
                stack.push((*child, depth + 1));
            }
        }

        stats
    }

    /// Validate tree with following rules:
    ///
    /// * Keys, in order, are strictly ascending under the comparer.
    /// * Every child's parent link points back to its parent.
    /// * Every reachable node holds at least one value, at most one value
    ///   for unique index.
    /// * Number of reachable nodes matches key count and the number of
    ///   occupied slots.
    pub fn validate(&self) -> Result<()>
    where
        K: fmt::Debug,
        C: Comparer<K, V>,
    {
        if !self.is_initialized() {
            if self.n_count != 0 {
                err_at!(Fatal, msg: "uninitialized with n_count {}", self.n_count)?;
            }
            if self.pool.len() != 0 {
                err_at!(Fatal, msg: "uninitialized with {} nodes", self.pool.len())?;
            }
            return Ok(());
        }

        if let Some(parent) = self.pool.node(NodeId::ROOT).parent {
            err_at!(Fatal, msg: "root has parent {}", parent)?;
        }

        let (n_occupied, mut n_nodes) = (self.pool.len(), 0);
        let mut prev: Option<&K> = None;
        let mut walk = Walk::new(&self.pool);
        while let Some(id) = walk.next() {
            n_nodes += 1;
            if n_nodes > n_occupied {
                err_at!(Fatal, msg: "cycle detected at {}", id)?;
            }

            let node = self.pool.node(id);
            if node.values.is_empty() {
                err_at!(Fatal, msg: "empty node {:?}", node.key)?;
            }
            if self.config.unique && node.values.len() > 1 {
                err_at!(Fatal, msg: "unique key {:?} has {}", node.key, node.values.len())?;
            }
            for child in [node.lower, node.greater].iter().flatten() {
                let parent = self.pool.node(*child).parent;
                if parent != Some(id) {
                    let ckey = &self.pool.node(*child).key;
                    err_at!(Fatal, msg: "parent link {:?}->{:?}", ckey, parent)?;
                }
            }
            if let Some(pkey) = prev {
                if self.comparer.compare_keys(pkey, &node.key)? != Ordering::Less {
                    err_at!(Fatal, msg: "sort prev:{:?} key:{:?}", pkey, node.key)?;
                }
            }
            prev = Some(&node.key);
        }

        if walk.cyclic {
            err_at!(Fatal, msg: "cycle detected along lower links")?;
        }
        if n_nodes != self.n_count {
            err_at!(Fatal, msg: "n_count {} reachable {}", self.n_count, n_nodes)?;
        }
        if n_nodes != n_occupied {
            err_at!(Fatal, msg: "occupied {} reachable {}", n_occupied, n_nodes)?;
        }

        Ok(())
    }
}

/// Write API.
impl<K, V, C> Index<K, V, C>
where
    C: Comparer<K, V>,
{
    /// Insert `value` under `key`. A new key gets a new node, an existing
    /// key gets `value` appended to its values. For unique index inserting
    /// an existing key fails with [Error::UniqueViolation], naming the node
    /// that holds the key, and leaves the index untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let located = match self.locate_edge(&key)? {
            Some(located) => located,
            None => self.locate(&key)?,
        };

        let id = match located {
            Locate::Empty => {
                self.pool.claim_root(key);
                self.height = 1;
                self.edges = [Some((NodeId::ROOT, 1)); 2];
                NodeId::ROOT
            }
            Locate::Found(id) if self.config.unique && !self.pool.node(id).values.is_empty() => {
                return err_at!(UniqueViolation, msg: "key at {} is not unique", id);
            }
            Locate::Found(id) => id,
            Locate::Vacant(parent, side, depth) => {
                let id = self.pool.alloc(key, parent);
                self.pool.node_mut(parent).set_child(side, Some(id));
                self.height = self.height.max(depth);
                if let Some((edge, _)) = self.edges[side as usize] {
                    if edge == parent {
                        self.edges[side as usize] = Some((id, depth));
                    }
                }
                id
            }
        };

        let node = self.pool.node_mut(id);
        if node.values.is_empty() {
            self.n_count += 1;
        }
        node.values.push(value);

        Ok(())
    }

    /// Replace the first value under `key` equal to `old` with `value`.
    /// Return whether a value was replaced, missing key or missing value
    /// is a no-op.
    pub fn update(&mut self, key: &K, old: &V, value: V) -> Result<bool> {
        let id = match self.locate(key)? {
            Locate::Found(id) => id,
            Locate::Empty | Locate::Vacant(..) => return Ok(false),
        };

        match self.position(id, old)? {
            Some(off) => {
                self.pool.node_mut(id).values[off] = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete from `key`. If `value` is supplied only the first equal value
    /// is removed, otherwise all of key's values are removed. Key itself is
    /// removed once it holds no value. Return the number of values removed,
    /// missing key or missing value is a no-op.
    pub fn delete(&mut self, key: &K, value: Option<&V>) -> Result<usize> {
        let id = match self.locate(key)? {
            Locate::Found(id) => id,
            Locate::Empty | Locate::Vacant(..) => return Ok(0),
        };

        let n = match value {
            Some(value) => match self.position(id, value)? {
                Some(off) => {
                    let node = self.pool.node_mut(id);
                    node.values.remove(off);
                    if !node.values.is_empty() {
                        return Ok(1);
                    }
                    1
                }
                None => return Ok(0),
            },
            None => self.pool.node(id).values.len(),
        };

        self.unlink(id);
        self.n_count -= 1;

        Ok(n)
    }

    // Descend from root, all comparisons happen here and before any
    // mutation, a failing comparison leaves the tree untouched.
    fn locate(&self, key: &K) -> Result<Locate> {
        if !self.is_initialized() {
            return Ok(Locate::Empty);
        }

        let (mut id, mut depth) = (NodeId::ROOT, 1);
        loop {
            let node = self.pool.node(id);
            let side = match self.comparer.compare_keys(key, &node.key)? {
                Ordering::Less => Side::Lower,
                Ordering::Greater => Side::Greater,
                Ordering::Equal => break Ok(Locate::Found(id)),
            };
            match node.child(side) {
                Some(child) => {
                    id = child;
                    depth += 1;
                }
                None => break Ok(Locate::Vacant(id, side, depth + 1)),
            }
        }
    }

    // Key beyond the current maximum, or below the current minimum, can
    // only land next to that extreme node. Check both extremes before
    // descending from root, so that sorted loads don't walk the spine.
    fn locate_edge(&mut self, key: &K) -> Result<Option<Locate>> {
        if !self.is_initialized() {
            return Ok(None);
        }

        for side in [Side::Greater, Side::Lower].iter().copied() {
            let (id, depth) = match self.edges[side as usize] {
                Some(edge) => edge,
                None => {
                    let edge = self.to_edge(side);
                    self.edges[side as usize] = Some(edge);
                    edge
                }
            };
            let cmp = self.comparer.compare_keys(key, &self.pool.node(id).key)?;
            match (cmp, side) {
                (Ordering::Equal, _) => return Ok(Some(Locate::Found(id))),
                (Ordering::Greater, Side::Greater) | (Ordering::Less, Side::Lower) => {
                    return Ok(Some(Locate::Vacant(id, side, depth + 1)));
                }
                _ => (),
            }
        }

        Ok(None)
    }

    fn position(&self, id: NodeId, value: &V) -> Result<Option<usize>> {
        for (off, v) in self.pool.node(id).values.iter().enumerate() {
            if self.comparer.values_equal(value, v)? {
                return Ok(Some(off));
            }
        }
        Ok(None)
    }
}

impl<K, V, C> Index<K, V, C> {
    // Remove node from the graph, no comparisons are needed from here on.
    fn unlink(&mut self, id: NodeId) {
        self.forget_edge(id);

        let node = self.pool.node(id);
        match (node.lower, node.greater, node.parent) {
            (Some(lower), Some(greater), _) => self.unlink_double(id, lower, greater),
            (Some(child), None, _) | (None, Some(child), _) => self.take_place(id, child),
            (None, None, None) => {
                debug!(target: "ubst", "removed last key, index uninitialized");
                self.height = 0;
                self.pool.release(id)
            }
            (None, None, Some(parent)) => {
                let pnode = self.pool.node_mut(parent);
                match pnode.side_of(id) {
                    Some(side) => pnode.set_child(side, None),
                    None => panic!("unlink(): {} not a child of {}, call the programmer", id, parent),
                }
                self.pool.release(id)
            }
        }
    }

    // Node inherits its only child's key, values and children, the child
    // is released.
    fn take_place(&mut self, id: NodeId, child: NodeId) {
        self.forget_edge(child);
        let mut donor = self.pool.take(child);
        let (lower, greater) = (donor.lower, donor.greater);

        let node = self.pool.node_mut(id);
        mem::swap(&mut node.key, &mut donor.key);
        mem::swap(&mut node.values, &mut donor.values);
        node.lower = lower;
        node.greater = greater;

        for grandchild in [lower, greater].iter().flatten() {
            self.pool.node_mut(*grandchild).parent = Some(id);
        }
        self.pool.recycle(donor)
    }

    // Node inherits key and values from the nearest key on one side, the
    // donor. Side is picked by [Donor] policy, a coin flip by default, so
    // that repeated deletes don't skew the tree towards one side.
    fn unlink_double(&mut self, id: NodeId, lower: NodeId, greater: NodeId) {
        let side = match self.config.donor {
            Donor::Lower => Side::Lower,
            Donor::Greater => Side::Greater,
            Donor::Random if self.rng.gen_bool(0.5) => Side::Lower,
            Donor::Random => Side::Greater,
        };
        trace!(target: "ubst", "two-children removal {} donor side {:?}", id, side);

        // donor is the extreme node, towards `far`, of the subtree on `side`.
        let far = side.flip();
        let (mut parent, mut donor_id) = match side {
            Side::Lower => (id, lower),
            Side::Greater => (id, greater),
        };
        while let Some(next) = self.pool.node(donor_id).child(far) {
            parent = donor_id;
            donor_id = next;
        }

        self.forget_edge(donor_id);
        let mut donor = self.pool.take(donor_id);
        let orphan = donor.child(side);
        let parent_side = if parent == id { side } else { far };
        self.pool.node_mut(parent).set_child(parent_side, orphan);
        if let Some(orphan) = orphan {
            self.pool.node_mut(orphan).parent = Some(parent);
        }

        let node = self.pool.node_mut(id);
        mem::swap(&mut node.key, &mut donor.key);
        mem::swap(&mut node.values, &mut donor.values);
        self.pool.recycle(donor)
    }

    // Drop cached extremes held by a node that is removed or changes key.
    fn forget_edge(&mut self, id: NodeId) {
        for edge in self.edges.iter_mut() {
            if matches!(edge, Some((eid, _)) if *eid == id) {
                *edge = None;
            }
        }
    }

    fn to_edge(&self, side: Side) -> (NodeId, usize) {
        let (mut id, mut depth) = (NodeId::ROOT, 1);
        while let Some(next) = self.pool.node(id).child(side) {
            id = next;
            depth += 1;
        }
        (id, depth)
    }
}

/// Read API.
impl<K, V, C> Index<K, V, C> {
    /// Search for `key`, return a handle to its node. Missing key is not
    /// an error.
    pub fn search(&self, key: &K) -> Result<Option<NodeRef<K, V>>>
    where
        C: Comparer<K, V>,
    {
        match self.locate(key)? {
            Locate::Found(id) => Ok(Some(NodeRef::new(&self.pool, id))),
            Locate::Empty | Locate::Vacant(..) => Ok(None),
        }
    }

    /// Get the values for `key`, in insertion order.
    pub fn get(&self, key: &K) -> Result<Option<&[V]>>
    where
        C: Comparer<K, V>,
    {
        Ok(self.search(key)?.map(|node| node.values()))
    }

    /// Return the node holding the largest key.
    pub fn get_max(&self) -> Option<NodeRef<K, V>> {
        self.extreme(Side::Greater)
    }

    /// Return the node holding the smallest key.
    pub fn get_min(&self) -> Option<NodeRef<K, V>> {
        self.extreme(Side::Lower)
    }

    fn extreme(&self, side: Side) -> Option<NodeRef<K, V>> {
        if !self.is_initialized() {
            return None;
        }
        let mut id = NodeId::ROOT;
        while let Some(next) = self.pool.node(id).child(side) {
            id = next;
        }
        Some(NodeRef::new(&self.pool, id))
    }

    /// Return a lazy iterator over all values, in ascending key order and
    /// in insertion order within a key. Dropping the iterator stops the
    /// traversal.
    pub fn iter(&self) -> Iter<K, V> {
        Iter {
            walk: Walk::new(&self.pool),
            values: None,
        }
    }

    /// Run `query`, calling `callback` for every matching value in
    /// ascending key order. Traversal is recursive unless key count exceeds
    /// [Config::recursion_limit] or tree height may exceed
    /// [Config::depth_limit]. Return `false` from `callback` to stop the
    /// traversal.
    pub fn query<F>(&self, query: &Query<K>, callback: F) -> Result<()>
    where
        C: Comparer<K, V>,
        F: FnMut(&V) -> bool,
    {
        let traversal = self.config.to_traversal(self.n_count, self.height);
        trace!(
            target: "ubst",
            "query over {} keys height<={} using {:?}",
            self.n_count,
            self.height,
            traversal
        );
        self.query_by(traversal, query, callback)
    }

    /// Same as [Index::query], with an explicit traversal strategy. Both
    /// strategies visit nodes and yield values in the same order.
    /// [Traversal::Recursive] uses one stack frame per level of the tree,
    /// callers forcing it on a degenerate tree risk exhausting the stack.
    pub fn query_by<F>(&self, traversal: Traversal, query: &Query<K>, mut callback: F) -> Result<()>
    where
        C: Comparer<K, V>,
        F: FnMut(&V) -> bool,
    {
        if query.is_unbounded() || !self.is_initialized() {
            return Ok(());
        }

        match traversal {
            Traversal::Recursive => {
                let root = NodeId::ROOT;
                range::descend(&self.pool, &self.comparer, query, root, &mut callback)?;
            }
            Traversal::Worklist => {
                for item in self.range(query) {
                    if !callback(item?) {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Return a lazy iterator over values matching `query`, in ascending
    /// key order. Iterator runs over an explicit worklist, independent of
    /// tree height. On comparison failure the error is yielded once and
    /// the iterator is exhausted.
    pub fn range<'a>(&'a self, query: &'a Query<K>) -> Range<'a, K, V, C>
    where
        C: Comparer<K, V>,
    {
        let root = match self.is_initialized() {
            true if !query.is_unbounded() => Some(NodeId::ROOT),
            _ => None,
        };
        Range::new(&self.pool, &self.comparer, query, root)
    }
}

/// Statistics on [Index], refer to [Index::stats].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of keys.
    pub n_count: usize,
    /// Number of nodes occupying storage.
    pub n_nodes: usize,
    /// Height of the tree, ZERO for an uninitialized index.
    pub depth: usize,
    /// Number of released value buffers waiting to be reused.
    pub n_pooled: usize,
    /// Number of value buffers allocated afresh.
    pub n_fresh: usize,
    /// Number of value buffers reused from pool.
    pub n_reused: usize,
}

// In-order walk over nodes, using an explicit stack of pending nodes.
// Pending nodes can't outnumber occupied nodes, otherwise lower links form
// a cycle and the walk ends with `cyclic` set.
pub(crate) struct Walk<'a, K, V> {
    pool: &'a Pool<K, V>,
    paths: Vec<NodeId>,
    cyclic: bool,
}

impl<'a, K, V> Walk<'a, K, V> {
    fn new(pool: &'a Pool<K, V>) -> Walk<'a, K, V> {
        let mut walk = Walk {
            pool,
            paths: Vec::default(),
            cyclic: false,
        };
        if pool.is_occupied(NodeId::ROOT) {
            walk.build(Some(NodeId::ROOT));
        }
        walk
    }

    fn build(&mut self, mut node: Option<NodeId>) {
        let limit = self.pool.len();
        while let Some(id) = node {
            if self.paths.len() >= limit {
                self.cyclic = true;
                self.paths.clear();
                break;
            }
            self.paths.push(id);
            node = self.pool.node(id).lower;
        }
    }
}

impl<'a, K, V> Iterator for Walk<'a, K, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.paths.pop()?;
        self.build(self.pool.node(id).greater);
        Some(id)
    }
}

/// Iterator over all values in [Index], refer to [Index::iter].
pub struct Iter<'a, K, V> {
    walk: Walk<'a, K, V>,
    values: Option<slice::Iter<'a, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.values.as_mut().and_then(|iter| iter.next()) {
                break Some(value);
            }
            let id = self.walk.next()?;
            self.values = Some(self.walk.pool.node(id).values.iter());
        }
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
