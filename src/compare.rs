use std::cmp::Ordering;
use std::fmt;

/// A strict weak ordering over keys, fixed for the lifetime of a map.
///
/// Two keys are equivalent when `compare` returns [`Ordering::Equal`]; a map
/// never holds two equivalent keys. Implementations must be consistent:
/// the same pair of keys always yields the same answer.
pub trait Compare<K: ?Sized> {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<K: Ord + ?Sized> Compare<K> for Natural {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Orders keys by the reverse of their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reverse;

impl<K: Ord + ?Sized> Compare<K> for Reverse {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        rhs.cmp(lhs)
    }
}

/// Adapts a closure into a [`Compare`].
///
/// # Example
/// ```rust
/// use rb_tree_map::{FnCompare, TreeMap};
///
/// let by_len = FnCompare(|a: &&str, b: &&str| a.len().cmp(&b.len()));
/// let mut map = TreeMap::with_comparator(by_len);
/// map.insert("ccc", 3);
/// map.insert("a", 1);
/// assert!(!map.insert("b", 2).1); // same length as "a"
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["a", "ccc"]);
/// ```
#[derive(Clone, Copy, Default)]
pub struct FnCompare<F>(pub F);

impl<K: ?Sized, F> Compare<K> for FnCompare<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        (self.0)(lhs, rhs)
    }
}

impl<F> fmt::Debug for FnCompare<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCompare")
    }
}
