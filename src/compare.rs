//! Key ordering used by [`BTree`](crate::BTree).

use std::cmp::Ordering;

/// A strict total order over keys of type `K`.
///
/// The comparator is fixed when the tree is constructed. It must be consistent for the
/// lifetime of the tree: antisymmetric, transitive, and returning [`Ordering::Equal`]
/// exactly for keys that should be treated as the same entry. A comparator that
/// changes its answers after keys have been inserted leaves lookups unspecified
/// (they will not cause memory unsafety, but may miss or duplicate keys).
///
/// Any `Fn(&K, &K) -> Ordering` closure is a comparator.
///
/// ```
/// use degree_btree::BTree;
/// let mut t = BTree::with_comparator(3, |a: &i32, b: &i32| b.cmp(a)).unwrap();
/// t.insert(1, "one");
/// t.insert(2, "two");
/// let keys: Vec<_> = t.keys().copied().collect();
/// assert_eq!(keys, [2, 1]);
/// ```
pub trait Compare<K: ?Sized> {
    /// Compare two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<K: Ord + ?Sized> Compare<K> for Natural {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K: ?Sized, F> Compare<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}
