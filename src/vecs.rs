use std::{cmp::Ordering, fmt, ops::Deref};

/// Vec with fixed capacity, allocated once when the node is created.
///
/// Elements past `len` do not exist: moving a tail out with [`FixedCapVec::split_off`]
/// leaves nothing behind in the donor, so no two nodes can own the same child.
pub(crate) struct FixedCapVec<T> {
    v: Vec<T>,
}

impl<T> Default for FixedCapVec<T> {
    fn default() -> Self {
        Self { v: Vec::new() }
    }
}

impl<T> FixedCapVec<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            v: Vec::with_capacity(cap),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.v.len()
    }

    /// Capacity must be greater than len.
    #[inline]
    pub fn push(&mut self, value: T) {
        safe_assert!(self.v.len() < self.v.capacity());
        self.v.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.v.pop()
    }

    /// Capacity must be greater than len.
    pub fn insert(&mut self, at: usize, value: T) {
        safe_assert!(at <= self.v.len() && self.v.len() < self.v.capacity());
        self.v.insert(at, value);
    }

    /// Move elements `at..` into a new vec of capacity `cap`.
    pub fn split_off(&mut self, at: usize, cap: usize) -> Self {
        safe_assert!(at < self.v.len());
        let mut result = Self::new(cap);
        result.v.extend(self.v.drain(at..));
        result
    }

    /// Get reference to ith element.
    #[cfg(not(feature = "unsafe-optim"))]
    #[inline]
    pub fn ix(&self, ix: usize) -> &T {
        &self.v[ix]
    }

    /// Get reference to ith element.
    #[cfg(feature = "unsafe-optim")]
    #[inline]
    pub fn ix(&self, ix: usize) -> &T {
        safe_assert!(ix < self.v.len());
        unsafe { self.v.get_unchecked(ix) }
    }

    /// Get mutable reference to ith element.
    #[cfg(not(feature = "unsafe-optim"))]
    #[inline]
    pub fn ixm(&mut self, ix: usize) -> &mut T {
        &mut self.v[ix]
    }

    /// Get mutable reference to ith element.
    #[cfg(feature = "unsafe-optim")]
    #[inline]
    pub fn ixm(&mut self, ix: usize) -> &mut T {
        safe_assert!(ix < self.v.len());
        unsafe { self.v.get_unchecked_mut(ix) }
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.v.capacity()
    }

    /// Same as `binary_search_by`, returns the index of the match or the insertion point.
    pub fn search<F>(&self, mut f: F) -> Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        let (mut i, mut j) = (0, self.v.len());
        while i < j {
            let m = (i + j) / 2;
            match f(self.ix(m)) {
                Ordering::Equal => {
                    return Ok(m);
                }
                Ordering::Less => i = m + 1,
                Ordering::Greater => j = m,
            }
        }
        Err(i)
    }
}

impl<T: Clone> Clone for FixedCapVec<T> {
    fn clone(&self) -> Self {
        let mut v = Vec::with_capacity(self.v.capacity());
        v.extend(self.v.iter().cloned());
        Self { v }
    }
}

impl<T> Deref for FixedCapVec<T> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        &self.v
    }
}

impl<T> fmt::Debug for FixedCapVec<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
