#![deny(missing_docs)]

//! This crate implements an in-memory [BTree] whose minimum degree is chosen at run time.
//!
//! Full nodes are split on the way down during insertion, so every insert is a single
//! pass from the root to a leaf. Keys are ordered by a [Compare] implementation supplied
//! at construction, [Natural] ( the key's [Ord] ) by default.
//!
//! Most of the implementation is in the [tree] module, see [tree::BTree].
//!
//! # Example
//!
//! ```
//!     use degree_btree::BTree;
//!     let mut capitals = BTree::new(3).unwrap();
//!     capitals.insert("France", "Paris");
//!     assert_eq!(capitals.insert("England", "London"), (None, false));
//!     assert_eq!(capitals.insert("France", "Lyon"), (Some("Paris"), true));
//!     assert_eq!(capitals.search(&"France"), Some(&"Lyon"));
//!     assert_eq!(capitals.size(), 2);
//! ```
//!
//! # Value storage
//!
//! By default the tree owns its values. A tree can instead hold references to values
//! owned by the caller, see [RefBTree]: the referents must outlive the tree, and
//! interior mutability ( `&RefCell<T>`, `&Cell<T>` ) lets the caller change a value
//! after it has been inserted.
//!
//! ```
//!     use degree_btree::RefBTree;
//!     use std::cell::Cell;
//!     let (a, b) = (Cell::new(1), Cell::new(2));
//!     let mut t: RefBTree<'_, &str, Cell<i32>> = RefBTree::new(2).unwrap();
//!     t.insert("a", &a);
//!     t.insert("b", &b);
//!     a.set(10);
//!     let mut seen = Vec::new();
//!     t.traverse(|v| seen.push(v.get()));
//!     assert_eq!(seen, [10, 2]);
//! ```
//!
//!# Features
//!
//! This crate supports the following cargo features:
//! - `tracing` : logs node splits via the tracing crate.
//! - `unsafe-optim` : uses unchecked indexing, and omits internal assertions in release builds.

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(any(debug_assertions, not(feature = "unsafe-optim")))]
macro_rules! safe_assert {
    ( $cond: expr ) => {
        assert!($cond)
    };
}

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(all(not(debug_assertions), feature = "unsafe-optim"))]
macro_rules! safe_assert {
    ( $cond: expr ) => {};
}

/// Module with the B-tree engine.
pub mod tree;

pub mod compare;
pub mod error;

mod tracing_helpers;
mod vecs;

pub use compare::{Compare, Natural};
pub use error::{Error, Result};
pub use tree::{BTree, Iter, Keys, Values};

/// Smallest minimum degree accepted by [BTree::new] ( a node of degree 1 cannot be split ).
pub const MIN_DEGREE: usize = 2;

/// Minimum degree used by [BTree::default], and when collecting an iterator into a [BTree].
pub const DEFAULT_DEGREE: usize = 13;

/// [BTree] that stores references to caller-owned values instead of owning them.
pub type RefBTree<'a, K, T, C = Natural> = BTree<K, &'a T, C>;

// Tests.

/* mimalloc cannot be used with miri */
#[cfg(all(test, not(miri)))]
use mimalloc::MiMalloc;

#[cfg(all(test, not(miri)))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(test)]
mod mytests;
