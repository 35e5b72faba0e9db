use std::fmt;

use crate::pool::Pool;

/// Stable address of a node within its index. Parent and child links are
/// kept as `NodeId`, the pool owns the nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node always lives in the first slot.
    pub(crate) const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Lower,
    Greater,
}

impl Side {
    #[inline]
    pub(crate) fn flip(self) -> Side {
        match self {
            Side::Lower => Side::Greater,
            Side::Greater => Side::Lower,
        }
    }
}

// Node corresponds to a single key in Index instance.
pub(crate) struct Node<K, V> {
    pub key: K,
    pub values: Vec<V>,              // insertion order
    pub parent: Option<NodeId>,      // None only for root
    pub lower: Option<NodeId>,       // store: all keys strictly less
    pub greater: Option<NodeId>,     // store: all keys strictly greater
}

impl<K, V> Node<K, V> {
    pub fn new(key: K, values: Vec<V>, parent: Option<NodeId>) -> Node<K, V> {
        Node {
            key,
            values,
            parent,
            lower: None,
            greater: None,
        }
    }

    #[inline]
    pub fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Lower => self.lower,
            Side::Greater => self.greater,
        }
    }

    #[inline]
    pub fn set_child(&mut self, side: Side, child: Option<NodeId>) {
        match side {
            Side::Lower => self.lower = child,
            Side::Greater => self.greater = child,
        }
    }

    /// Side on which `child` hangs from this node, if at all.
    #[inline]
    pub fn side_of(&self, child: NodeId) -> Option<Side> {
        if self.lower == Some(child) {
            Some(Side::Lower)
        } else if self.greater == Some(child) {
            Some(Side::Greater)
        } else {
            None
        }
    }
}

/// Read only handle to a node, returned by search and min/max lookups.
///
/// Handle borrows the index, it is invalidated by the next mutation.
pub struct NodeRef<'a, K, V> {
    pool: &'a Pool<K, V>,
    id: NodeId,
}

impl<'a, K, V> Clone for NodeRef<'a, K, V> {
    fn clone(&self) -> Self {
        NodeRef {
            pool: self.pool,
            id: self.id,
        }
    }
}

impl<'a, K, V> Copy for NodeRef<'a, K, V> {}

impl<'a, K, V> NodeRef<'a, K, V> {
    pub(crate) fn new(pool: &'a Pool<K, V>, id: NodeId) -> NodeRef<'a, K, V> {
        NodeRef { pool, id }
    }

    #[inline]
    pub fn to_id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn key(&self) -> &'a K {
        &self.pool.node(self.id).key
    }

    /// Values for this key, in insertion order.
    #[inline]
    pub fn values(&self) -> &'a [V] {
        &self.pool.node(self.id).values
    }

    pub fn parent(&self) -> Option<NodeRef<'a, K, V>> {
        let id = self.pool.node(self.id).parent?;
        Some(NodeRef::new(self.pool, id))
    }

    pub fn lower(&self) -> Option<NodeRef<'a, K, V>> {
        let id = self.pool.node(self.id).lower?;
        Some(NodeRef::new(self.pool, id))
    }

    pub fn greater(&self) -> Option<NodeRef<'a, K, V>> {
        let id = self.pool.node(self.id).greater?;
        Some(NodeRef::new(self.pool, id))
    }
}

impl<'a, K, V> fmt::Debug for NodeRef<'a, K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("key", self.key())
            .field("values", &self.values())
            .finish()
    }
}
