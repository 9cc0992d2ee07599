//! Error types for tree construction.
//!
//! Lookups never fail: a missing key is reported as `None`.

use thiserror::Error;

/// Result type alias for tree construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration error returned by [`BTree::new`](crate::BTree::new) and
/// [`BTree::with_comparator`](crate::BTree::with_comparator).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Minimum degree below [`MIN_DEGREE`](crate::MIN_DEGREE), a node could not be split.
    #[error("minimum degree must be at least {min}, got {0}", min = crate::MIN_DEGREE)]
    InvalidDegree(usize),

    /// Node capacity for this degree does not fit in `usize`.
    #[error("minimum degree {0} is too large, node capacity overflows")]
    DegreeOverflow(usize),
}
