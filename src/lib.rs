//! Package implement an unbalanced, multi-value, ordered index.
//!
//! [Index] is a plain [binary-search-tree][wiki-bst] mapping each key to
//! one or more values. It is meant to be embedded as the secondary index of
//! a higher level storage or query engine.
//!
//! - Each key in the index correspond to a node holding a list of values,
//!   in insertion order.
//! - Parametrised over `key-type`, `value-type` and a pluggable [Comparer].
//! - CRUD operations, via insert(), search(), update(), delete() api.
//! - Optional uniqueness constraint, one value per key.
//! - Full table scan, to iterate over all values in key order.
//! - Range query with open/closed bounds on either side, see [Query].
//! - Range query can run recursively or over an explicit worklist, the
//!   later shall not exhaust the call stack on a degenerate tree.
//! - Released nodes are recycled through a pool.
//! - No rebalancing, no durability guarantee, not thread safe.
//!
//! Constructing a new [Index] instance and CRUD operations:
//!
//! ```
//! use ubst::{Index, Natural};
//!
//! let mut index: Index<String, u32> = Index::new(Natural);
//! assert_eq!(index.len(), 0);
//! assert_eq!(index.is_empty(), true);
//!
//! index.insert("Leo".to_string(), 76).unwrap();
//! index.insert("Alice".to_string(), 42).unwrap();
//! index.insert("Alice".to_string(), 23).unwrap();
//! assert_eq!(index.len(), 2);
//!
//! let values = index.get(&"Alice".to_string()).unwrap().unwrap();
//! assert_eq!(values, &[42, 23]);
//!
//! let n = index.delete(&"Alice".to_string(), Some(&42)).unwrap();
//! assert_eq!(n, 1);
//! let values = index.get(&"Alice".to_string()).unwrap().unwrap();
//! assert_eq!(values, &[23]);
//! ```
//!
//! Range query:
//!
//! ```
//! use ubst::{Bound, Index, Natural, Query};
//!
//! let mut index: Index<u32, u32> = Index::new(Natural);
//! for key in [50, 20, 70, 10, 30, 60, 80].iter() {
//!     index.insert(*key, key * 10).unwrap();
//! }
//!
//! let query = Query::between(Bound::excluded(20), Bound::included(60));
//! let values: Vec<u32> = index.range(&query).map(|v| *v.unwrap()).collect();
//! assert_eq!(values, vec![300, 500, 600]);
//! ```
//!
//! [wiki-bst]: https://en.wikipedia.org/wiki/Binary_search_tree

use std::{error, fmt, result};

// Short form to compose Error values.
//
// Here are few possible ways:
//
// ```ignore
// use crate::Error;
// err_at!(Fatal, msg: format!("bad argument"));
// ```
//
// ```ignore
// use crate::Error;
// err_at!(ComparisonFailure, key.partial_cmp(other).ok_or("nan"));
// ```
//
// ```ignore
// use crate::Error;
// err_at!(ComparisonFailure, cast(value), format!("key {}", key));
// ```
//
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err(Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err(Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err(Error::$v(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

mod comparer;
mod config;
mod index;
mod node;
mod pool;
mod query;
mod range;


pub use comparer::{Comparer, Natural, Reverse};
pub use config::{Config, Donor, Traversal, DEPTH_LIMIT, RECURSION_LIMIT, VALUE_CHUNK};
pub use index::{Index, Iter, Stats};
pub use node::{NodeId, NodeRef};
pub use query::{Bound, Query};
pub use range::Range;

/// Error variants that are returned by this package's API.
///
/// Each variant carries a prefix, typically identifying the
/// error location.
pub enum Error {
    /// Index failed validation, its invariants are broken.
    Fatal(String, String),
    /// [Comparer] could not order two keys or equate two values. The
    /// operation was aborted before touching the tree.
    ComparisonFailure(String, String),
    /// Insert on an existing key, for an index configured as unique.
    UniqueViolation(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, msg) => write!(f, "{} Fatal: {}", p, msg),
            ComparisonFailure(p, msg) => write!(f, "{} ComparisonFailure: {}", p, msg),
            UniqueViolation(p, msg) => write!(f, "{} UniqueViolation: {}", p, msg),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}

/// Type alias for Result return type, used by this package.
pub type Result<T> = result::Result<T, Error>;
