//! Module define construction time configuration for [Index](crate::Index).
//!
//! All parameters are supplied at construction and are not mutated
//! afterwards.

/// Default number of keys beyond which range queries switch from
/// recursive descent to explicit worklist traversal.
pub const RECURSION_LIMIT: usize = 100_000;

/// Default tree height beyond which range queries switch to explicit
/// worklist traversal, irrespective of key count. Keeps recursive descent
/// well within a default thread stack.
pub const DEPTH_LIMIT: usize = 1_000;

/// Default capacity reserved for each node's value list.
pub const VALUE_CHUNK: usize = 8;

/// Policy for picking the donor node when removing a node that has both
/// children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Donor {
    /// Flip an unbiased coin between in-order predecessor and successor.
    Random,
    /// Always use the in-order predecessor, maximum of the lower subtree.
    Lower,
    /// Always use the in-order successor, minimum of the greater subtree.
    Greater,
}

/// Traversal strategy for range queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    /// Recursive descent, stack depth proportional to tree height.
    Recursive,
    /// Explicitly managed worklist of pending nodes, constant stack depth.
    Worklist,
}

/// Configuration for [Index](crate::Index).
#[derive(Clone, Debug)]
pub struct Config {
    /// Reject a second value for an existing key.
    pub unique: bool,
    /// Initial capacity for each node's value list. ZERO picks
    /// [VALUE_CHUNK]. Ignored for unique index, which always use 1.
    pub value_chunk: usize,
    /// Range queries on index holding more than `recursion_limit` keys
    /// shall use [Traversal::Worklist].
    pub recursion_limit: usize,
    /// Range queries on index whose height may exceed `depth_limit` shall
    /// use [Traversal::Worklist], even below `recursion_limit`.
    pub depth_limit: usize,
    /// Recycle released nodes' value buffers.
    pub recycle: bool,
    /// Donor policy for two-children removal.
    pub donor: Donor,
    /// Seed for [Donor::Random], picked randomly if not supplied.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            unique: false,
            value_chunk: VALUE_CHUNK,
            recursion_limit: RECURSION_LIMIT,
            depth_limit: DEPTH_LIMIT,
            recycle: true,
            donor: Donor::Random,
            seed: None,
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn set_unique(mut self, unique: bool) -> Config {
        self.unique = unique;
        self
    }

    pub fn set_value_chunk(mut self, value_chunk: usize) -> Config {
        self.value_chunk = value_chunk;
        self
    }

    pub fn set_recursion_limit(mut self, limit: usize) -> Config {
        self.recursion_limit = limit;
        self
    }

    pub fn set_depth_limit(mut self, limit: usize) -> Config {
        self.depth_limit = limit;
        self
    }

    pub fn set_recycle(mut self, recycle: bool) -> Config {
        self.recycle = recycle;
        self
    }

    pub fn set_donor(mut self, donor: Donor) -> Config {
        self.donor = donor;
        self
    }

    pub fn set_seed(mut self, seed: u64) -> Config {
        self.seed = Some(seed);
        self
    }

    /// Effective capacity hint for value lists.
    pub fn to_value_chunk(&self) -> usize {
        match self.value_chunk {
            _ if self.unique => 1,
            0 => VALUE_CHUNK,
            n => n,
        }
    }

    /// Traversal strategy for an index holding `n_count` keys, with tree
    /// height at most `height`.
    pub fn to_traversal(&self, n_count: usize, height: usize) -> Traversal {
        if n_count > self.recursion_limit || height > self.depth_limit {
            Traversal::Worklist
        } else {
            Traversal::Recursive
        }
    }
}
