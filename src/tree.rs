/// B-tree of minimum degree `t`, where the degree is chosen at construction time.
///
/// Every node holds at most `2t - 1` key-value pairs, and every node other than the root
/// holds at least `t - 1`. Internal nodes with `n` pairs own exactly `n + 1` children.
///
/// General guide to implementation:
///
/// [`BTree`] has a length, the degree, a split counter, a comparator and a `Tree`, where
/// `Tree` is an enum that can be `Leaf` or `NonLeaf`. Children are held by value in the
/// parent's `FixedCapVec`, so each node has exactly one owner.
///
/// Insertion splits full nodes on the way down, so a node is never full when a key is
/// added to it, and a split never has to propagate upwards. Splitting a child promotes its
/// median into the parent, which can make the key being inserted appear in the parent;
/// that case is handled as an update before descending.
pub struct BTree<K, V, C = Natural> {
    len: usize,
    degree: usize,
    height: usize,
    cmp: C,
    tree: Tree<K, V>,
}

impl<K: Ord, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self {
            len: 0,
            degree: DEFAULT_DEGREE,
            height: 0,
            cmp: Natural,
            tree: Tree::new_leaf(capacity(DEFAULT_DEGREE)),
        }
    }
}

impl<K: Ord, V> BTree<K, V> {
    /// Returns a new, empty tree ordered by [`Ord`].
    ///
    /// Fails if `degree` is less than [`MIN_DEGREE`].
    pub fn new(degree: usize) -> Result<Self> {
        Self::with_comparator(degree, Natural)
    }
}

impl<K, V, C> BTree<K, V, C> {
    #[cfg(test)]
    pub(crate) fn check(&self)
    where
        C: Compare<K>,
    {
        let mut leaf_depth = None;
        let n = self
            .tree
            .check(self.degree, &self.cmp, true, 0, &mut leaf_depth, None, None);
        assert_eq!(n, self.len, "size does not match number of entries");
    }

    /// Returns a new, empty tree ordered by `cmp`.
    ///
    /// Fails if `degree` is less than [`MIN_DEGREE`], or so large that the node capacity
    /// `2 * degree` overflows.
    pub fn with_comparator(degree: usize, cmp: C) -> Result<Self>
    where
        C: Compare<K>,
    {
        if degree < MIN_DEGREE {
            return Err(Error::InvalidDegree(degree));
        }
        if degree.checked_mul(2).is_none() {
            return Err(Error::DegreeOverflow(degree));
        }
        Ok(Self {
            len: 0,
            degree,
            height: 0,
            cmp,
            tree: Tree::new_leaf(capacity(degree)),
        })
    }

    /// Get number of key-value pairs in the tree.
    #[must_use]
    pub fn size(&self) -> usize {
        self.len
    }

    /// Is the tree empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the minimum degree the tree was constructed with.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Get the number of times the root has been split.
    ///
    /// This is a split counter, not the distance from the root to a leaf, see [`BTree::depth`].
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the number of levels in the tree, 1 when the root is a leaf.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut tree = &self.tree;
        while let Tree::NL(nl) = tree {
            tree = nl.c.ix(0);
            depth += 1;
        }
        depth
    }

    /// Remove all key-value pairs and reset the split counter.
    pub fn clear(&mut self) {
        self.len = 0;
        self.height = 0;
        self.tree = Tree::new_leaf(capacity(self.degree));
    }

    /// Get reference to the value corresponding to the key.
    pub fn search(&self, key: &K) -> Option<&V>
    where
        C: Compare<K>,
    {
        self.get_key_value(key).map(|(_k, v)| v)
    }

    /// Get a mutable reference to the value corresponding to the key.
    pub fn search_mut(&mut self, key: &K) -> Option<&mut V>
    where
        C: Compare<K>,
    {
        self.tree.get_mut(key, &self.cmp)
    }

    /// Get references to the stored key and value.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)>
    where
        C: Compare<K>,
    {
        self.tree.get_key_value(key, &self.cmp)
    }

    /// Does the tree have an entry for the specified key.
    pub fn contains_key(&self, key: &K) -> bool
    where
        C: Compare<K>,
    {
        self.get_key_value(key).is_some()
    }

    /// Insert key-value pair into the tree.
    ///
    /// If the key was absent returns `(None, false)`. Otherwise the stored value is
    /// replaced, the stored key is kept, and `(Some(old_value), true)` is returned.
    pub fn insert(&mut self, key: K, value: V) -> (Option<V>, bool)
    where
        C: Compare<K>,
    {
        if self.tree.full(self.degree) {
            self.split_root();
        }
        match self.tree.insert_non_full(key, value, &self.cmp, self.degree) {
            Some(old) => (Some(old), true),
            None => {
                self.len += 1;
                (None, false)
            }
        }
    }

    fn split_root(&mut self) {
        let mut nl = NonLeafInner::new(capacity(self.degree));
        nl.c.push(std::mem::take(&mut self.tree));
        nl.split_child(0, self.degree);
        self.tree = Tree::NL(nl);
        self.height += 1;
        debug_log!(height = self.height, size = self.len, "root split");
    }

    /// Call `visit` with each value in ascending key order.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(&V),
    {
        self.tree.walk(&mut |_k: &K, v: &V| {
            visit(v);
            false
        });
    }

    /// Walk the tree in ascending key order, calling action with each key-value pair.
    /// If action returns true the walk terminates, and walk returns true.
    pub fn walk<F>(&self, mut action: F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.tree.walk(&mut action)
    }

    /// Get iterator of references to key-value pairs, in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut x = Iter {
            len: self.len,
            leaf: None,
            stk: StkVec::new(),
        };
        x.push_tree(&self.tree);
        x
    }

    /// Get iterator of references to keys.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Get iterator of references to values.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }
}

impl<K, V, C> Clone for BTree<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            len: self.len,
            degree: self.degree,
            height: self.height,
            cmp: self.cmp.clone(),
            tree: self.tree.clone(),
        }
    }
}

impl<K: Debug, V: Debug, C> Debug for BTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C> IntoIterator for &'a BTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BTree<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> BTree<K, V> {
        let mut tree = BTree::default();
        tree.extend(iter);
        tree
    }
}

impl<K, V, C: Compare<K>> Extend<(K, V)> for BTree<K, V, C> {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

use std::{
    cmp::Ordering,
    fmt,
    fmt::Debug,
    iter::FusedIterator,
};

use crate::compare::{Compare, Natural};
use crate::error::{Error, Result};
use crate::tracing_helpers::{debug_log, trace_log};
use crate::vecs::FixedCapVec;
use crate::{DEFAULT_DEGREE, MIN_DEGREE};

// Vector types.
type StkVec<T> = arrayvec::ArrayVec<T, 64>;

type PairVec<K, V> = FixedCapVec<(K, V)>;
type TreeVec<K, V> = FixedCapVec<Tree<K, V>>;

type Split<K, V> = ((K, V), Tree<K, V>);

/// Maximum number of pairs in a node of minimum degree `t`.
#[inline]
fn capacity(t: usize) -> usize {
    2 * t - 1
}

#[derive(Debug, Clone)]
enum Tree<K, V> {
    L(Leaf<K, V>),
    NL(NonLeaf<K, V>),
}
impl<K, V> Default for Tree<K, V> {
    // Placeholder while the root is moved under a new root, allocates nothing.
    fn default() -> Self {
        Tree::L(Leaf(PairVec::default()))
    }
}
impl<K, V> Tree<K, V> {
    fn new_leaf(cap: usize) -> Self {
        Tree::L(Leaf(PairVec::new(cap)))
    }

    fn full(&self, t: usize) -> bool {
        match self {
            Tree::L(leaf) => leaf.full(t),
            Tree::NL(nonleaf) => nonleaf.full(t),
        }
    }

    fn split(&mut self, t: usize) -> Split<K, V> {
        match self {
            Tree::L(leaf) => {
                let (med, right) = leaf.split(t);
                (med, Tree::L(Leaf(right)))
            }
            Tree::NL(nonleaf) => nonleaf.split(t),
        }
    }

    fn insert_non_full<C>(&mut self, key: K, value: V, cmp: &C, t: usize) -> Option<V>
    where
        C: Compare<K>,
    {
        match self {
            Tree::L(leaf) => leaf.insert(key, value, cmp),
            Tree::NL(nonleaf) => nonleaf.insert(key, value, cmp, t),
        }
    }

    fn get_key_value<C>(&self, key: &K, cmp: &C) -> Option<(&K, &V)>
    where
        C: Compare<K>,
    {
        match self {
            Tree::L(leaf) => leaf.get_key_value(key, cmp),
            Tree::NL(nonleaf) => nonleaf.get_key_value(key, cmp),
        }
    }

    fn get_mut<C>(&mut self, key: &K, cmp: &C) -> Option<&mut V>
    where
        C: Compare<K>,
    {
        match self {
            Tree::L(leaf) => leaf.get_mut(key, cmp),
            Tree::NL(nonleaf) => nonleaf.get_mut(key, cmp),
        }
    }

    fn walk<F>(&self, action: &mut F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        match self {
            Tree::L(leaf) => {
                for (k, v) in leaf.0.iter() {
                    if action(k, v) {
                        return true;
                    }
                }
            }
            Tree::NL(nonleaf) => {
                for i in 0..nonleaf.v.len() {
                    if nonleaf.c.ix(i).walk(action) {
                        return true;
                    }
                    let (k, v) = nonleaf.v.ix(i);
                    if action(k, v) {
                        return true;
                    }
                }
                if nonleaf.c.ix(nonleaf.v.len()).walk(action) {
                    return true;
                }
            }
        }
        false
    }

    /// Check node invariants, returns number of pairs in this subtree.
    #[cfg(test)]
    #[allow(clippy::too_many_arguments)]
    fn check<C>(
        &self,
        t: usize,
        cmp: &C,
        root: bool,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> usize
    where
        C: Compare<K>,
    {
        let v = match self {
            Tree::L(leaf) => &leaf.0,
            Tree::NL(nonleaf) => &nonleaf.v,
        };
        assert!(v.len() <= capacity(t), "node over capacity");
        if !root {
            assert!(v.len() >= t - 1, "non-root node under minimum occupancy");
        }
        for w in v.windows(2) {
            assert_eq!(cmp.compare(&w[0].0, &w[1].0), Ordering::Less, "keys not ascending");
        }
        if let (Some(lo), Some(first)) = (lower, v.first()) {
            assert_eq!(cmp.compare(lo, &first.0), Ordering::Less, "key below parent bound");
        }
        if let (Some(hi), Some(last)) = (upper, v.last()) {
            assert_eq!(cmp.compare(&last.0, hi), Ordering::Less, "key above parent bound");
        }
        match self {
            Tree::L(leaf) => {
                match leaf_depth {
                    Some(d) => assert_eq!(*d, depth, "leaves at unequal depth"),
                    None => *leaf_depth = Some(depth),
                }
                leaf.0.len()
            }
            Tree::NL(nonleaf) => {
                assert!(!nonleaf.v.is_empty(), "internal node without keys");
                assert_eq!(nonleaf.c.len(), nonleaf.v.len() + 1, "child count mismatch");
                let mut n = nonleaf.v.len();
                for i in 0..nonleaf.c.len() {
                    let lo = if i == 0 { lower } else { Some(&nonleaf.v.ix(i - 1).0) };
                    let hi = if i == nonleaf.v.len() {
                        upper
                    } else {
                        Some(&nonleaf.v.ix(i).0)
                    };
                    n += nonleaf
                        .c
                        .ix(i)
                        .check(t, cmp, false, depth + 1, leaf_depth, lo, hi);
                }
                n
            }
        }
    }
} // End impl Tree

#[derive(Debug, Clone)]
struct Leaf<K, V>(PairVec<K, V>);
impl<K, V> Leaf<K, V> {
    fn full(&self, t: usize) -> bool {
        self.0.len() == capacity(t)
    }

    /// Keeps the lowest `t - 1` pairs, returns the median and the highest `t - 1` pairs.
    fn split(&mut self, t: usize) -> ((K, V), PairVec<K, V>) {
        safe_assert!(self.full(t));
        let right = self.0.split_off(t, capacity(t));
        let Some(med) = self.0.pop() else {
            unreachable!("split of empty leaf")
        };
        (med, right)
    }

    fn insert<C>(&mut self, key: K, value: V, cmp: &C) -> Option<V>
    where
        C: Compare<K>,
    {
        match self.0.search(|x| cmp.compare(&x.0, &key)) {
            Ok(i) => Some(std::mem::replace(&mut self.0.ixm(i).1, value)),
            Err(i) => {
                self.0.insert(i, (key, value));
                None
            }
        }
    }

    fn get_key_value<C>(&self, key: &K, cmp: &C) -> Option<(&K, &V)>
    where
        C: Compare<K>,
    {
        match self.0.search(|x| cmp.compare(&x.0, key)) {
            Ok(i) => {
                let x = self.0.ix(i);
                Some((&x.0, &x.1))
            }
            Err(_i) => None,
        }
    }

    fn get_mut<C>(&mut self, key: &K, cmp: &C) -> Option<&mut V>
    where
        C: Compare<K>,
    {
        match self.0.search(|x| cmp.compare(&x.0, key)) {
            Ok(i) => Some(&mut self.0.ixm(i).1),
            Err(_i) => None,
        }
    }
} // End impl Leaf

/* Boxing NonLeaf keeps the Tree enum the size of a leaf */
type NonLeaf<K, V> = Box<NonLeafInner<K, V>>;

#[derive(Debug, Clone)]
struct NonLeafInner<K, V> {
    v: PairVec<K, V>,
    c: TreeVec<K, V>,
}
impl<K, V> NonLeafInner<K, V> {
    fn new(cap: usize) -> Box<Self> {
        Box::new(Self {
            v: PairVec::new(cap),
            c: TreeVec::new(cap + 1),
        })
    }

    fn full(&self, t: usize) -> bool {
        self.v.len() == capacity(t)
    }

    /// Keeps the lowest `t - 1` pairs and `t` children, the new sibling takes the rest
    /// except the median.
    fn split(&mut self, t: usize) -> Split<K, V> {
        safe_assert!(self.full(t));
        let right = Box::new(Self {
            v: self.v.split_off(t, capacity(t)),
            c: self.c.split_off(t, capacity(t) + 1),
        });
        let Some(med) = self.v.pop() else {
            unreachable!("split of empty node")
        };
        (med, Tree::NL(right))
    }

    /// Split full child `i`, promoting its median to pair `i` and adding the new
    /// sibling as child `i + 1`.
    fn split_child(&mut self, i: usize, t: usize) {
        let (med, right) = self.c.ixm(i).split(t);
        self.v.insert(i, med);
        self.c.insert(i + 1, right);
        trace_log!(index = i, "child split");
    }

    fn insert<C>(&mut self, key: K, value: V, cmp: &C, t: usize) -> Option<V>
    where
        C: Compare<K>,
    {
        let mut i = match self.v.search(|x| cmp.compare(&x.0, &key)) {
            Ok(i) => return Some(std::mem::replace(&mut self.v.ixm(i).1, value)),
            Err(i) => i,
        };
        if self.c.ix(i).full(t) {
            self.split_child(i, t);
            match cmp.compare(&self.v.ix(i).0, &key) {
                Ordering::Less => i += 1,
                Ordering::Equal => {
                    trace_log!(index = i, "promoted median is the inserted key");
                    return Some(std::mem::replace(&mut self.v.ixm(i).1, value));
                }
                Ordering::Greater => {}
            }
        }
        self.c.ixm(i).insert_non_full(key, value, cmp, t)
    }

    fn get_key_value<C>(&self, key: &K, cmp: &C) -> Option<(&K, &V)>
    where
        C: Compare<K>,
    {
        match self.v.search(|x| cmp.compare(&x.0, key)) {
            Ok(i) => {
                let kv = self.v.ix(i);
                Some((&kv.0, &kv.1))
            }
            Err(i) => self.c.ix(i).get_key_value(key, cmp),
        }
    }

    fn get_mut<C>(&mut self, key: &K, cmp: &C) -> Option<&mut V>
    where
        C: Compare<K>,
    {
        match self.v.search(|x| cmp.compare(&x.0, key)) {
            Ok(i) => Some(&mut self.v.ixm(i).1),
            Err(i) => self.c.ixm(i).get_mut(key, cmp),
        }
    }
} // End impl NonLeafInner

// Iterators.

#[derive(Clone, Debug)]
struct Stk<'a, K, V> {
    v: std::slice::Iter<'a, (K, V)>,
    c: std::slice::Iter<'a, Tree<K, V>>,
}

/// Iterator returned by [`BTree::iter`].
#[derive(Clone, Debug)]
pub struct Iter<'a, K, V> {
    len: usize,
    leaf: Option<std::slice::Iter<'a, (K, V)>>,
    stk: StkVec<Stk<'a, K, V>>,
}
impl<'a, K, V> Iter<'a, K, V> {
    /// Push the path to the leftmost leaf of `tree`.
    fn push_tree(&mut self, tree: &'a Tree<K, V>) {
        match tree {
            Tree::L(leaf) => {
                self.leaf = Some(leaf.0.iter());
            }
            Tree::NL(nl) => {
                let (v, mut c) = (nl.v.iter(), nl.c.iter());
                let ct = c.next();
                self.stk.push(Stk { v, c });
                if let Some(ct) = ct {
                    self.push_tree(ct);
                }
            }
        }
    }
}
impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(f) = &mut self.leaf {
                if let Some((k, v)) = f.next() {
                    self.len -= 1;
                    return Some((k, v));
                }
                self.leaf = None;
            } else if let Some(s) = self.stk.last_mut() {
                if let Some((k, v)) = s.v.next() {
                    if let Some(ct) = s.c.next() {
                        self.push_tree(ct);
                    }
                    self.len -= 1;
                    return Some((k, v));
                }
                self.stk.pop();
            } else {
                return None;
            }
        }
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}
impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {
    fn len(&self) -> usize {
        self.len
    }
}
impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

/// Iterator returned by [`BTree::keys`].
#[derive(Clone, Debug)]
pub struct Keys<'a, K, V>(Iter<'a, K, V>);
impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<'a, K, V> FusedIterator for Keys<'a, K, V> {}

/// Iterator returned by [`BTree::values`].
#[derive(Clone, Debug)]
pub struct Values<'a, K, V>(Iter<'a, K, V>);
impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<'a, K, V> FusedIterator for Values<'a, K, V> {}
