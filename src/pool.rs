//! Module implement node storage and recycling for [Index](crate::Index).
//!
//! Nodes live in a slab of slots addressed by [NodeId]. Vacated slots are
//! kept in a free-list and handed out again before the slab grows. When
//! recycling is enabled, the value buffer of every released node is
//! cleared and pooled, so that a later node can reuse its capacity instead
//! of allocating afresh. Pooled buffers never outnumber vacant slots, and
//! vacating the last slot shrinks the slab back to its initial size.
//! Recycling is an optimization only, disabling it shall not change any
//! observable behaviour of the index.

use crate::node::{Node, NodeId};

pub(crate) struct Pool<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    vacant: Vec<NodeId>,    // free-list of vacated slots, excluding root
    buffers: Vec<Vec<V>>,   // free-list of empty value buffers, at most one per vacant slot
    value_chunk: usize,
    recycle: bool,

    n_fresh: usize,  // value buffers allocated afresh
    n_reused: usize, // value buffers taken from the pool
}

impl<K, V> Pool<K, V> {
    /// Create a new pool, root slot is reserved and left vacant.
    pub fn new(value_chunk: usize, recycle: bool) -> Pool<K, V> {
        Pool {
            slots: vec![None],
            vacant: Vec::default(),
            buffers: Vec::default(),
            value_chunk,
            recycle,

            n_fresh: 0,
            n_reused: 0,
        }
    }

    /// Occupy the root slot with `key`.
    pub fn claim_root(&mut self, key: K) {
        if self.is_occupied(NodeId::ROOT) {
            panic!("claim_root(): root is occupied, call the programmer");
        }
        let values = self.to_buffer();
        self.slots[NodeId::ROOT.index()] = Some(Node::new(key, values, None));
    }

    /// Allocate a new node for `key` under `parent`. Linking the node as
    /// parent's child is left to the caller.
    pub fn alloc(&mut self, key: K, parent: NodeId) -> NodeId {
        let node = Node::new(key, self.to_buffer(), Some(parent));
        match self.vacant.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId(self.slots.len() as u32);
                self.slots.push(Some(node));
                id
            }
        }
    }

    /// Vacate the slot for `id` and return its node, caller shall
    /// [Pool::recycle] it after salvaging its content.
    pub fn take(&mut self, id: NodeId) -> Node<K, V> {
        match self.slots[id.index()].take() {
            Some(node) if id == NodeId::ROOT => {
                if self.len() == 0 {
                    self.shrink();
                }
                node
            }
            Some(node) => {
                self.vacant.push(id);
                node
            }
            None => panic!("take(): vacant node {}, call the programmer", id),
        }
    }

    /// Release a detached node. Its links are dropped and its value
    /// buffer is truncated and pooled, preserving capacity.
    pub fn recycle(&mut self, node: Node<K, V>) {
        let Node { mut values, .. } = node;
        if self.recycle && self.buffers.len() < self.to_vacant() {
            values.clear();
            self.buffers.push(values);
        }
    }

    /// Short form for take and recycle.
    pub fn release(&mut self, id: NodeId) {
        let node = self.take(id);
        self.recycle(node)
    }

    // Pool is empty, drop the slab and the buffers accumulated at peak.
    fn shrink(&mut self) {
        self.slots.truncate(1);
        self.slots.shrink_to_fit();
        self.vacant = Vec::default();
        self.buffers = Vec::default();
    }

    fn to_buffer(&mut self) -> Vec<V> {
        match self.buffers.pop() {
            Some(values) => {
                self.n_reused += 1;
                values
            }
            None => {
                self.n_fresh += 1;
                Vec::with_capacity(self.value_chunk)
            }
        }
    }
}

impl<K, V> Pool<K, V> {
    #[inline]
    pub fn is_occupied(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<K, V> {
        match self.slots[id.index()].as_ref() {
            Some(node) => node,
            None => panic!("node(): vacant node {}, call the programmer", id),
        }
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match self.slots[id.index()].as_mut() {
            Some(node) => node,
            None => panic!("node_mut(): vacant node {}, call the programmer", id),
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        let root = if self.is_occupied(NodeId::ROOT) { 0 } else { 1 };
        self.slots.len() - self.vacant.len() - root
    }

    /// Number of vacant slots, including a vacant root.
    pub fn to_vacant(&self) -> usize {
        self.slots.len() - self.len()
    }

    /// Number of value buffers waiting to be reused.
    pub fn to_pooled(&self) -> usize {
        self.buffers.len()
    }

    pub fn to_fresh(&self) -> usize {
        self.n_fresh
    }

    pub fn to_reused(&self) -> usize {
        self.n_reused
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
