use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::index::{IndexType, NodeIndex};
use crate::node::{Node, Side};
use crate::treemap::TreeMap;

/// An iterator over the entries of a `TreeMap`, sorted by key.
pub struct Iter<'a, K, V, C, Ix> {
    /// Reference to the map
    map_ref: &'a TreeMap<K, V, C, Ix>,
    /// Next node from the front
    front: Option<NodeIndex<Ix>>,
    /// Next node from the back
    back: Option<NodeIndex<Ix>>,
    /// Entries not yielded yet from either end
    remaining: usize,
}

impl<'a, K, V, C, Ix> Iter<'a, K, V, C, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn new(map_ref: &'a TreeMap<K, V, C, Ix>) -> Self {
        Iter {
            map_ref,
            front: map_ref.first_node(),
            back: map_ref.last_node(),
            remaining: map_ref.len(),
        }
    }
}

impl<K, V, C, Ix: fmt::Debug> fmt::Debug for Iter<'_, K, V, C, Ix> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("front", &self.front)
            .field("back", &self.back)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<K, V, C, Ix: Copy> Clone for Iter<'_, K, V, C, Ix> {
    fn clone(&self) -> Self {
        Iter {
            map_ref: self.map_ref,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, C, Ix> Iterator for Iter<'a, K, V, C, Ix>
where
    Ix: IndexType,
{
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front?;
        self.remaining -= 1;
        self.front = self.map_ref.successor(x);
        Some(self.map_ref.node_ref(x, Node::key_value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, C, Ix> DoubleEndedIterator for Iter<'_, K, V, C, Ix>
where
    Ix: IndexType,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back?;
        self.remaining -= 1;
        self.back = self.map_ref.predecessor(x);
        Some(self.map_ref.node_ref(x, Node::key_value))
    }
}

impl<K, V, C, Ix: IndexType> ExactSizeIterator for Iter<'_, K, V, C, Ix> {}

impl<K, V, C, Ix: IndexType> FusedIterator for Iter<'_, K, V, C, Ix> {}

/// A mutable iterator over the entries of a `TreeMap`, sorted by key.
///
/// Walks the tree lazily from both ends like [`Iter`], every live node is
/// yielded at most once.
pub struct IterMut<'a, K, V, Ix> {
    /// Start of the map's node arena
    nodes: NonNull<Node<K, V, Ix>>,
    /// Next node from the front
    front: Option<NodeIndex<Ix>>,
    /// Next node from the back
    back: Option<NodeIndex<Ix>>,
    /// Entries not yielded yet from either end
    remaining: usize,
    _marker: PhantomData<&'a mut Node<K, V, Ix>>,
}

// Same as `&'a mut TreeMap`
unsafe impl<K: Send, V: Send, Ix: Send> Send for IterMut<'_, K, V, Ix> {}
unsafe impl<K: Sync, V: Sync, Ix: Sync> Sync for IterMut<'_, K, V, Ix> {}

impl<'a, K, V, Ix> IterMut<'a, K, V, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn new<C>(map_ref: &'a mut TreeMap<K, V, C, Ix>) -> Self {
        let front = map_ref.first_node();
        let back = map_ref.last_node();
        let remaining = map_ref.len();
        IterMut {
            // the arena always holds the sentinel, so the pointer is never dangling
            nodes: NonNull::from(map_ref.nodes.as_mut_slice()).cast(),
            front,
            back,
            remaining,
            _marker: PhantomData,
        }
    }

    /// Read one link of the node at `x` without borrowing the whole node,
    /// its value may be lent out already.
    fn link(&self, x: NodeIndex<Ix>, link: Link) -> NodeIndex<Ix> {
        // SAFETY: `x` is a slot of the arena borrowed for `'a`, and only the
        // link fields are read, never the key or value
        unsafe {
            let node = self.nodes.as_ptr().add(x.index());
            match link {
                Link::Child(Side::Left) => (*node).left,
                Link::Child(Side::Right) => (*node).right,
                Link::Parent => (*node).parent,
            }
        }
    }

    /// In-order neighbour of `x` towards `side`.
    fn step(&self, x: NodeIndex<Ix>, side: Side) -> Option<NodeIndex<Ix>> {
        let child = self.link(x, Link::Child(side));
        if !child.is_sentinel() {
            let mut y = child;
            loop {
                let next = self.link(y, Link::Child(side.opposite()));
                if next.is_sentinel() {
                    return Some(y);
                }
                y = next;
            }
        }
        let mut x = x;
        let mut p = self.link(x, Link::Parent);
        while !p.is_sentinel() && self.link(p, Link::Child(side)) == x {
            x = p;
            p = self.link(p, Link::Parent);
        }
        (!p.is_sentinel()).then_some(p)
    }

    fn entry(&mut self, x: NodeIndex<Ix>) -> Option<(&'a K, &'a mut V)> {
        // SAFETY: `remaining` stops both ends before they cross, so no node is
        // handed out twice; key and value are disjoint from the links
        unsafe {
            let node = self.nodes.as_ptr().add(x.index());
            match (&(*node).key, &mut (*node).value) {
                (Some(key), Some(value)) => Some((key, value)),
                _ => None,
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Link {
    Child(Side),
    Parent,
}

impl<K, V, Ix> fmt::Debug for IterMut<'_, K, V, Ix> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<'a, K, V, Ix> Iterator for IterMut<'a, K, V, Ix>
where
    Ix: IndexType,
{
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front?;
        self.remaining -= 1;
        self.front = self.step(x, Side::Right);
        self.entry(x)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, Ix> DoubleEndedIterator for IterMut<'_, K, V, Ix>
where
    Ix: IndexType,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back?;
        self.remaining -= 1;
        self.back = self.step(x, Side::Left);
        self.entry(x)
    }
}

impl<K, V, Ix: IndexType> ExactSizeIterator for IterMut<'_, K, V, Ix> {}

impl<K, V, Ix: IndexType> FusedIterator for IterMut<'_, K, V, Ix> {}

/// An into iterator over the entries of a `TreeMap`, sorted by key.
pub struct IntoIter<K, V, C, Ix> {
    tree_map: TreeMap<K, V, C, Ix>,
    front: Option<NodeIndex<Ix>>,
    back: Option<NodeIndex<Ix>>,
    remaining: usize,
}

impl<K, V, C, Ix> IntoIter<K, V, C, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn new(tree_map: TreeMap<K, V, C, Ix>) -> Self {
        IntoIter {
            front: tree_map.first_node(),
            back: tree_map.last_node(),
            remaining: tree_map.len(),
            tree_map,
        }
    }
}

impl<K, V, C, Ix> fmt::Debug for IntoIter<K, V, C, Ix> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<K, V, C, Ix> Iterator for IntoIter<K, V, C, Ix>
where
    Ix: IndexType,
{
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front?;
        self.remaining -= 1;
        // links stay intact while entries are taken out
        self.front = self.tree_map.successor(x);
        self.tree_map.nodes[x.index()].take_entry()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, C, Ix> DoubleEndedIterator for IntoIter<K, V, C, Ix>
where
    Ix: IndexType,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back?;
        self.remaining -= 1;
        self.back = self.tree_map.predecessor(x);
        self.tree_map.nodes[x.index()].take_entry()
    }
}

impl<K, V, C, Ix: IndexType> ExactSizeIterator for IntoIter<K, V, C, Ix> {}

impl<K, V, C, Ix: IndexType> FusedIterator for IntoIter<K, V, C, Ix> {}

/// An iterator over the keys of a `TreeMap`, in order.
#[derive(Debug)]
pub struct Keys<'a, K, V, C, Ix> {
    pub(crate) inner: Iter<'a, K, V, C, Ix>,
}

impl<K, V, C, Ix: Copy> Clone for Keys<'_, K, V, C, Ix> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, C, Ix: IndexType> Iterator for Keys<'a, K, V, C, Ix> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C, Ix: IndexType> DoubleEndedIterator for Keys<'_, K, V, C, Ix> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V, C, Ix: IndexType> ExactSizeIterator for Keys<'_, K, V, C, Ix> {}

/// An iterator over the values of a `TreeMap`, in key order.
#[derive(Debug)]
pub struct Values<'a, K, V, C, Ix> {
    pub(crate) inner: Iter<'a, K, V, C, Ix>,
}

impl<K, V, C, Ix: Copy> Clone for Values<'_, K, V, C, Ix> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, C, Ix: IndexType> Iterator for Values<'a, K, V, C, Ix> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C, Ix: IndexType> DoubleEndedIterator for Values<'_, K, V, C, Ix> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V, C, Ix: IndexType> ExactSizeIterator for Values<'_, K, V, C, Ix> {}

/// A mutable iterator over the values of a `TreeMap`, in key order.
#[derive(Debug)]
pub struct ValuesMut<'a, K, V, Ix> {
    pub(crate) inner: IterMut<'a, K, V, Ix>,
}

impl<'a, K, V, Ix: IndexType> Iterator for ValuesMut<'a, K, V, Ix> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, Ix: IndexType> DoubleEndedIterator for ValuesMut<'_, K, V, Ix> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V, Ix: IndexType> ExactSizeIterator for ValuesMut<'_, K, V, Ix> {}

/// An owning iterator over the keys of a `TreeMap`, in order.
#[derive(Debug)]
pub struct IntoKeys<K, V, C, Ix> {
    pub(crate) inner: IntoIter<K, V, C, Ix>,
}

impl<K, V, C, Ix: IndexType> Iterator for IntoKeys<K, V, C, Ix> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C, Ix: IndexType> DoubleEndedIterator for IntoKeys<K, V, C, Ix> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V, C, Ix: IndexType> ExactSizeIterator for IntoKeys<K, V, C, Ix> {}

/// An owning iterator over the values of a `TreeMap`, in key order.
#[derive(Debug)]
pub struct IntoValues<K, V, C, Ix> {
    pub(crate) inner: IntoIter<K, V, C, Ix>,
}

impl<K, V, C, Ix: IndexType> Iterator for IntoValues<K, V, C, Ix> {
    type Item = V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C, Ix: IndexType> DoubleEndedIterator for IntoValues<K, V, C, Ix> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V, C, Ix: IndexType> ExactSizeIterator for IntoValues<K, V, C, Ix> {}

impl<K, V, C, Ix> IntoIterator for TreeMap<K, V, C, Ix>
where
    Ix: IndexType,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C, Ix>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, K, V, C, Ix> IntoIterator for &'a TreeMap<K, V, C, Ix>
where
    Ix: IndexType,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C, Ix>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C, Ix> IntoIterator for &'a mut TreeMap<K, V, C, Ix>
where
    Ix: IndexType,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, Ix>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
