use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{self, AtomicU64};

use crate::compare::{Compare, Natural};
use crate::cursor::Cursor;
use crate::entry::{Entry, OccupiedEntry, VacantEntry};
use crate::error::{Error, Result};
use crate::index::{DefaultIx, IndexType, NodeIndex};
use crate::iter::{IntoKeys, IntoValues, Iter, IterMut, Keys, Values, ValuesMut};
use crate::node::{Color, Node, Side};

/// Process-unique identity of a map instance.
///
/// Cursors record it so that a cursor handed to a different map is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MapId(u64);

impl MapId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        MapId(NEXT_ID.fetch_add(1, atomic::Ordering::Relaxed))
    }
}

/// Result of descending the tree for a key.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Search<Ix> {
    /// A node with an equivalent key.
    Found(NodeIndex<Ix>),
    /// The key is absent, it would be attached as the `side` child of
    /// `parent` (the sentinel when the tree is empty).
    Vacant { parent: NodeIndex<Ix>, side: Side },
}

/// An ordered map based on a red-black tree.
///
/// Nodes live in an arena and never move; erasing one element leaves every
/// other element at the same slot, so a [`Cursor`] stays valid until the
/// element it points at is erased.
pub struct TreeMap<K, V, C = Natural, Ix = DefaultIx> {
    /// Vector that stores nodes, slot 0 is the sentinel
    pub(crate) nodes: Vec<Node<K, V, Ix>>,
    /// Root of the tree
    pub(crate) root: NodeIndex<Ix>,
    /// Number of elements in the map
    pub(crate) len: usize,
    /// Vacated slots waiting for reuse
    pub(crate) free: Vec<NodeIndex<Ix>>,
    /// Key ordering
    pub(crate) cmp: C,
    /// Identity checked by cursors
    pub(crate) id: MapId,
    /// Stamp given to the next allocated node
    pub(crate) next_stamp: u64,
}

impl<K, V> TreeMap<K, V> {
    /// Create an empty `TreeMap`
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new `TreeMap` with estimated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, Natural)
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    /// Create an empty `TreeMap` ordered by `cmp`.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::{Reverse, TreeMap};
    ///
    /// let mut map = TreeMap::with_comparator(Reverse);
    /// map.insert(1, ());
    /// map.insert(3, ());
    /// map.insert(2, ());
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [3, 2, 1]);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_capacity_and_comparator(0, cmp)
    }
}

impl<K, V, C, Ix> TreeMap<K, V, C, Ix>
where
    Ix: IndexType,
{
    /// Create an empty `TreeMap` ordered by `cmp`, with room for `capacity`
    /// elements before the arena reallocates.
    #[inline]
    #[must_use]
    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        let mut nodes = vec![Node::new_sentinel()];
        nodes.reserve(capacity);
        TreeMap {
            nodes,
            root: NodeIndex::sentinel(),
            len: 0,
            free: Vec::new(),
            cmp,
            id: MapId::next(),
            next_stamp: 1,
        }
    }

    /// Return the comparator ordering this map.
    #[inline]
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Return the number of elements in the map.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` if the map contains no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all elements from the map.
    ///
    /// Every cursor obtained before the call is invalidated.
    #[inline]
    pub fn clear(&mut self) {
        log::trace!("clearing {} elements", self.len);
        self.nodes.clear();
        self.nodes.push(Node::new_sentinel());
        self.free.clear();
        self.root = NodeIndex::sentinel();
        self.len = 0;
    }

    /// A cursor at the element with the smallest key, or [`end`](Self::end)
    /// for an empty map.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let map: TreeMap<i32, ()> = TreeMap::new();
    /// assert_eq!(map.begin(), map.end());
    /// ```
    #[inline]
    #[must_use]
    pub fn begin(&self) -> Cursor<Ix> {
        self.cursor_at(self.first_node())
    }

    /// The past-the-end cursor.
    #[inline]
    #[must_use]
    pub fn end(&self) -> Cursor<Ix> {
        Cursor::new(self.id, None, 0)
    }

    /// Erase the element under `cursor`, returning its key and value.
    ///
    /// Cursors to any other element remain valid.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIterator`] when `cursor` is past-the-end, belongs to
    /// another map, or its element was already erased.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// let (c10, _) = map.insert(10, "a");
    /// let (c20, _) = map.insert(20, "b");
    /// assert_eq!(map.erase(c10), Ok((10, "a")));
    /// assert_eq!(c20.get(&map), Ok((&20, &"b")));
    /// assert!(map.erase(map.end()).is_err());
    /// ```
    #[inline]
    pub fn erase(&mut self, cursor: Cursor<Ix>) -> Result<(K, V)> {
        let z = self.resolve(&cursor)?.ok_or(Error::InvalidIterator)?;
        Ok(self.remove_node(z))
    }

    /// Return the entry with the smallest key.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.first_node()
            .map(|x| self.node_ref(x, Node::key_value))
    }

    /// Return the entry with the largest key.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.last_node().map(|x| self.node_ref(x, Node::key_value))
    }

    /// Remove and return the entry with the smallest key.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.first_node().map(|x| self.remove_node(x))
    }

    /// Remove and return the entry with the largest key.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.last_node().map(|x| self.remove_node(x))
    }

    /// Keep only the elements for which `f` returns `true`, visiting them in
    /// key order.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map: TreeMap<i32, i32> = (0..8).map(|x| (x, x * 10)).collect();
    /// map.retain(|&k, _| k % 2 == 0);
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [0, 2, 4, 6]);
    /// ```
    #[inline]
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut x = self.first_node();
        while let Some(node) = x {
            // the successor keeps its slot when `node` is erased
            x = self.successor(node);
            let keep = self.node_mut(node, |n| {
                let (key, value) = n.key_value_mut();
                f(key, value)
            });
            if !keep {
                let _ignore = self.remove_node(node);
            }
        }
    }

    /// Number of nodes on the longest path from the root to a leaf.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((x, depth)) = stack.pop() {
            if x.is_sentinel() {
                continue;
            }
            height = height.max(depth);
            stack.push((self.node_ref(x, Node::left), depth + 1));
            stack.push((self.node_ref(x, Node::right), depth + 1));
        }
        height
    }

    /// Get an iterator over the entries of the map, sorted by key.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, C, Ix> {
        Iter::new(self)
    }

    /// Get an iterator over the entries of the map with mutable values,
    /// sorted by key.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, Ix> {
        IterMut::new(self)
    }

    /// Get an iterator over the keys of the map, in order.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, C, Ix> {
        Keys { inner: self.iter() }
    }

    /// Get an iterator over the values of the map, in key order.
    #[inline]
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, C, Ix> {
        Values { inner: self.iter() }
    }

    /// Get a mutable iterator over the values of the map, in key order.
    #[inline]
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, Ix> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Consume the map, yielding its keys in order.
    #[inline]
    pub fn into_keys(self) -> IntoKeys<K, V, C, Ix> {
        IntoKeys {
            inner: self.into_iter(),
        }
    }

    /// Consume the map, yielding its values in key order.
    #[inline]
    pub fn into_values(self) -> IntoValues<K, V, C, Ix> {
        IntoValues {
            inner: self.into_iter(),
        }
    }
}

impl<K, V, C, Ix> TreeMap<K, V, C, Ix>
where
    C: Compare<K>,
    Ix: IndexType,
{
    /// Insert a key-value pair into the map.
    ///
    /// If an equivalent key exists the map is left unchanged and the cursor
    /// points at the existing element; the returned flag tells whether an
    /// insertion happened.
    ///
    /// # Panics
    ///
    /// This method panics when the tree is at the maximum number of nodes for its index
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// let (first, inserted) = map.insert(1, "a");
    /// assert!(inserted);
    /// let (again, inserted) = map.insert(1, "b");
    /// assert!(!inserted);
    /// assert_eq!(first, again);
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> (Cursor<Ix>, bool) {
        match self.locate(&key) {
            Search::Found(x) => (self.cursor_at(Some(x)), false),
            Search::Vacant { parent, side } => {
                let z = self.attach(key, value, parent, side);
                (self.cursor_at(Some(z)), true)
            }
        }
    }

    /// Insert a key-value pair into the map.
    /// If the key exists, overwrite and return the previous value.
    ///
    /// # Panics
    ///
    /// This method panics when the tree is at the maximum number of nodes for its index
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// assert_eq!(map.insert_or_update(1, 1), None);
    /// assert_eq!(map.insert_or_update(1, 2), Some(1));
    /// assert_eq!(map.insert_or_update(1, 3), Some(2));
    /// ```
    #[inline]
    pub fn insert_or_update(&mut self, key: K, value: V) -> Option<V> {
        match self.locate(&key) {
            Search::Found(x) => self.node_mut(x, Node::set_value(value)),
            Search::Vacant { parent, side } => {
                let _ignore = self.attach(key, value, parent, side);
                None
            }
        }
    }

    /// Remove a key from the map, returning the value at the key if the key exists
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, 1);
    /// map.insert(2, 2);
    /// assert_eq!(map.remove(&3), None);
    /// assert_eq!(map.remove(&2), Some(2));
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove a key from the map, returning the stored key and value if the
    /// key exists.
    #[inline]
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.search_exact(key).map(|x| self.remove_node(x))
    }

    /// A cursor at the element with a key equivalent to `key`, or
    /// [`end`](Self::end) if there is none.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(4, "d");
    /// assert_eq!(map.find(&4).get(&map), Ok((&4, &"d")));
    /// assert_eq!(map.find(&5), map.end());
    /// ```
    #[inline]
    #[must_use]
    pub fn find(&self, key: &K) -> Cursor<Ix> {
        self.cursor_at(self.search_exact(key))
    }

    /// Number of elements with a key equivalent to `key`, either 0 or 1.
    #[inline]
    #[must_use]
    pub fn count(&self, key: &K) -> usize {
        usize::from(self.contains_key(key))
    }

    /// Return `true` if the map holds a key equivalent to `key`.
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.search_exact(key).is_some()
    }

    /// Return reference to the value corresponding to the key.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, 1);
    /// map.insert(7, 4);
    /// assert_eq!(map.get(&1), Some(&1));
    /// assert_eq!(map.get(&7), Some(&4));
    /// assert_eq!(map.get(&5), None);
    /// ```
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.search_exact(key)
            .map(|idx| self.node_ref(idx, Node::value))
    }

    /// Return a mutable reference to the value corresponding to the key.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(3, 0);
    /// if let Some(v) = map.get_mut(&3) {
    ///     *v += 1;
    /// }
    /// assert_eq!(map.get(&3), Some(&1));
    /// ```
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.search_exact(key)
            .map(|idx| self.node_mut(idx, Node::value_mut))
    }

    /// Return the stored key and the value corresponding to `key`.
    #[inline]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.search_exact(key)
            .map(|idx| self.node_ref(idx, Node::key_value))
    }

    /// Return reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] when the key is absent.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::{Error, TreeMap};
    ///
    /// let mut map = TreeMap::new();
    /// map.insert("a", 1);
    /// assert_eq!(map.at(&"a"), Ok(&1));
    /// assert_eq!(map.at(&"b"), Err(Error::KeyNotFound));
    /// ```
    #[inline]
    pub fn at(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Return a mutable reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] when the key is absent.
    #[inline]
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V> {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Return a mutable reference to the value corresponding to the key,
    /// inserting `V::default()` first if the key is absent.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut counts = TreeMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.get_or_insert_default(word) += 1;
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&2));
    /// assert_eq!(counts.get(&"b"), Some(&1));
    /// ```
    #[inline]
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Get the given key's corresponding entry in the map for in-place manipulation.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::{Entry, TreeMap};
    ///
    /// let mut map = TreeMap::new();
    ///
    /// assert!(matches!(map.entry(1), Entry::Vacant(_)));
    /// map.entry(1).or_insert(0);
    /// assert!(matches!(map.entry(1), Entry::Occupied(_)));
    /// map.entry(1).and_modify(|v| *v += 1);
    /// assert_eq!(map.get(&1), Some(&1));
    /// ```
    #[inline]
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C, Ix> {
        match self.locate(&key) {
            Search::Found(node_idx) => Entry::Occupied(OccupiedEntry {
                map_ref: self,
                node_idx,
            }),
            Search::Vacant { parent, side } => Entry::Vacant(VacantEntry {
                map_ref: self,
                key,
                parent,
                side,
            }),
        }
    }

    /// Check every structural invariant of the tree.
    ///
    /// # Panics
    ///
    /// Panics when keys are out of order, a parent link disagrees with its
    /// child, a red node has a red child, black heights differ, the root is
    /// red, or the element count and free-list disagree with the arena.
    pub fn assert_valid(&self) {
        let sentinel = &self.nodes[0];
        assert!(sentinel.is_vacant() && sentinel.is_black(), "corrupted sentinel");
        assert!(self.node_ref(self.root, Node::is_black), "red root");
        if !self.root.is_sentinel() {
            assert!(
                self.node_ref(self.root, Node::parent).is_sentinel(),
                "root has a parent"
            );
        }

        let (count, _) = self.check_subtree(self.root);
        assert_eq!(count, self.len, "element count mismatch");
        assert_eq!(
            self.len + self.free.len() + 1,
            self.nodes.len(),
            "arena slots leaked"
        );
        for idx in &self.free {
            assert!(self.node_ref(*idx, Node::is_vacant), "live node on free-list");
        }

        let mut prev = None;
        let mut x = self.first_node();
        while let Some(node) = x {
            let key = self.node_ref(node, Node::key);
            if let Some(prev) = prev {
                assert_eq!(
                    self.cmp.compare(prev, key),
                    Ordering::Less,
                    "keys out of order"
                );
            }
            prev = Some(key);
            x = self.successor(node);
        }
    }

    /// Returns the element count and black height of the subtree at `x`.
    fn check_subtree(&self, x: NodeIndex<Ix>) -> (usize, usize) {
        if x.is_sentinel() {
            return (0, 0);
        }
        assert!(!self.node_ref(x, Node::is_vacant), "vacant node linked");
        let left = self.node_ref(x, Node::left);
        let right = self.node_ref(x, Node::right);
        for child in [left, right] {
            if !child.is_sentinel() {
                assert_eq!(self.node_ref(child, Node::parent), x, "broken parent link");
                if self.node_ref(x, Node::is_red) {
                    assert!(self.node_ref(child, Node::is_black), "red node with red child");
                }
            }
        }
        let (lcount, lheight) = self.check_subtree(left);
        let (rcount, rheight) = self.check_subtree(right);
        assert_eq!(lheight, rheight, "black height mismatch");
        let own = usize::from(self.node_ref(x, Node::is_black));
        (lcount + rcount + 1, lheight + own)
    }

    /// Descend from the root looking for `key`.
    ///
    /// All comparator calls of a mutation happen here, before the tree is
    /// touched.
    pub(crate) fn locate(&self, key: &K) -> Search<Ix> {
        let mut parent = NodeIndex::sentinel();
        let mut side = Side::Left;
        let mut x = self.root;
        while !x.is_sentinel() {
            match self.cmp.compare(key, self.node_ref(x, Node::key)) {
                Ordering::Less => side = Side::Left,
                Ordering::Greater => side = Side::Right,
                Ordering::Equal => return Search::Found(x),
            }
            parent = x;
            x = self.node_ref(x, |xn| xn.child(side));
        }
        Search::Vacant { parent, side }
    }

    /// Search for the node with a key equivalent to `key`
    fn search_exact(&self, key: &K) -> Option<NodeIndex<Ix>> {
        match self.locate(key) {
            Search::Found(x) => Some(x),
            Search::Vacant { .. } => None,
        }
    }
}

// Structural operations, none of them calls the comparator
impl<K, V, C, Ix> TreeMap<K, V, C, Ix>
where
    Ix: IndexType,
{
    /// Link a new red node as the `side` child of `parent` and repair.
    pub(crate) fn attach(
        &mut self,
        key: K,
        value: V,
        parent: NodeIndex<Ix>,
        side: Side,
    ) -> NodeIndex<Ix> {
        let stamp = self.next_stamp;
        self.next_stamp = self.next_stamp.wrapping_add(1);
        let z = self.alloc(Node::new_leaf(key, value, parent, stamp));
        if parent.is_sentinel() {
            self.root = z;
        } else {
            self.node_mut(parent, Node::set_child(side, z));
        }
        self.len = self.len.wrapping_add(1);
        self.insert_fixup(z);
        z
    }

    /// Unlink the node at `z` and return its entry.
    ///
    /// A node with two children first trades places with its successor, so
    /// the node physically removed is always `z` itself.
    pub(crate) fn remove_node(&mut self, z: NodeIndex<Ix>) -> (K, V) {
        if !self.left_ref(z, Node::is_vacant) && !self.right_ref(z, Node::is_vacant) {
            let y = self.tree_minimum(self.node_ref(z, Node::right));
            self.swap_with_successor(z, y);
        }

        let child = if self.node_ref(z, Node::left).is_sentinel() {
            self.node_ref(z, Node::right)
        } else {
            self.node_ref(z, Node::left)
        };
        if self.node_ref(z, Node::is_black) {
            if child.is_sentinel() {
                self.remove_fixup(z);
            } else {
                // a black node's only child is red, it takes over the black
                self.node_mut(child, Node::set_color(Color::Black));
            }
        }
        self.transplant(z, child);

        self.len = self.len.wrapping_sub(1);
        self.release(z)
    }

    /// Restore red-black tree properties after an insert.
    fn insert_fixup(&mut self, mut n: NodeIndex<Ix>) {
        loop {
            if n == self.root {
                self.node_mut(n, Node::set_color(Color::Black));
                return;
            }
            let parent = self.node_ref(n, Node::parent);
            if self.node_ref(parent, Node::is_black) {
                return;
            }
            // the parent is red, so it is not the root
            let grand_parent = self.node_ref(parent, Node::parent);
            let parent_side = self.side_of(parent);
            let uncle = self.node_ref(grand_parent, |g| g.child(parent_side.opposite()));
            if self.node_ref(uncle, Node::is_red) {
                self.node_mut(parent, Node::set_color(Color::Black));
                self.node_mut(uncle, Node::set_color(Color::Black));
                self.node_mut(grand_parent, Node::set_color(Color::Red));
                n = grand_parent;
            } else if self.side_of(n) == parent_side {
                self.rotate_up(parent);
                self.node_mut(parent, Node::set_color(Color::Black));
                self.node_mut(grand_parent, Node::set_color(Color::Red));
                return;
            } else {
                self.rotate_up(n);
                self.rotate_up(n);
                self.node_mut(n, Node::set_color(Color::Black));
                self.node_mut(grand_parent, Node::set_color(Color::Red));
                return;
            }
        }
    }

    /// Restore red-black tree properties before a black leaf `x` is unlinked.
    fn remove_fixup(&mut self, mut x: NodeIndex<Ix>) {
        while x != self.root {
            let side = self.side_of(x);
            let p = self.node_ref(x, Node::parent);
            let mut w = self.node_ref(p, |pn| pn.child(side.opposite()));
            if self.node_ref(w, Node::is_red) {
                self.node_mut(w, Node::set_color(Color::Black));
                self.node_mut(p, Node::set_color(Color::Red));
                self.rotate_up(w);
                w = self.node_ref(p, |pn| pn.child(side.opposite()));
            }
            if w.is_sentinel() {
                break;
            }

            let near = self.node_ref(w, |wn| wn.child(side));
            let far = self.node_ref(w, |wn| wn.child(side.opposite()));
            if self.node_ref(near, Node::is_black) && self.node_ref(far, Node::is_black) {
                self.node_mut(w, Node::set_color(Color::Red));
                if self.node_ref(p, Node::is_red) {
                    self.node_mut(p, Node::set_color(Color::Black));
                    return;
                }
                x = p;
                continue;
            }

            let p_color = self.node_ref(p, Node::color);
            if self.node_ref(far, Node::is_red) {
                self.rotate_up(w);
                self.node_mut(w, Node::set_color(p_color));
                self.node_mut(far, Node::set_color(Color::Black));
            } else {
                self.rotate_up(near);
                self.rotate_up(near);
                self.node_mut(near, Node::set_color(p_color));
            }
            self.node_mut(p, Node::set_color(Color::Black));
            return;
        }
    }

    /// Exchange the tree positions and colors of `z` and its successor `y`.
    ///
    /// `y` is the left-most node of `z`'s right subtree, so it has no left
    /// child. Only links are rewritten, both nodes keep their slots.
    fn swap_with_successor(&mut self, z: NodeIndex<Ix>, y: NodeIndex<Ix>) {
        let zp = self.node_ref(z, Node::parent);
        let zl = self.node_ref(z, Node::left);
        let zr = self.node_ref(z, Node::right);
        let yp = self.node_ref(y, Node::parent);
        let yr = self.node_ref(y, Node::right);
        let z_color = self.node_ref(z, Node::color);
        let y_color = self.node_ref(y, Node::color);

        self.replace_child(zp, z, y);
        self.node_mut(y, Node::set_parent(zp));
        self.node_mut(y, Node::set_left(zl));
        self.node_mut(zl, Node::set_parent(y));

        self.node_mut(z, Node::set_left(NodeIndex::sentinel()));
        self.node_mut(z, Node::set_right(yr));
        if !yr.is_sentinel() {
            self.node_mut(yr, Node::set_parent(z));
        }

        if yp == z {
            log::trace!("swapping {z:?} with adjacent successor {y:?}");
            self.node_mut(y, Node::set_right(z));
            self.node_mut(z, Node::set_parent(y));
        } else {
            log::trace!("swapping {z:?} with distant successor {y:?}");
            self.node_mut(y, Node::set_right(zr));
            self.node_mut(zr, Node::set_parent(y));
            self.node_mut(yp, Node::set_left(z));
            self.node_mut(z, Node::set_parent(yp));
        }

        self.node_mut(z, Node::set_color(y_color));
        self.node_mut(y, Node::set_color(z_color));
    }

    /// Move `x` above its parent, keeping the in-order sequence.
    fn rotate_up(&mut self, x: NodeIndex<Ix>) {
        let p = self.node_ref(x, Node::parent);
        match self.side_of(x) {
            Side::Left => self.right_rotate(p),
            Side::Right => self.left_rotate(p),
        }
    }

    /// Binary tree left rotate.
    fn left_rotate(&mut self, x: NodeIndex<Ix>) {
        if self.right_ref(x, Node::is_vacant) {
            return;
        }
        let y = self.node_ref(x, Node::right);
        log::trace!("left rotate {x:?} under {y:?}");
        self.node_mut(x, Node::set_right(self.node_ref(y, Node::left)));
        if !self.left_ref(y, Node::is_vacant) {
            self.left_mut(y, Node::set_parent(x));
        }

        self.replace_parent(x, y);
        self.node_mut(y, Node::set_left(x));
    }

    /// Binary tree right rotate.
    fn right_rotate(&mut self, x: NodeIndex<Ix>) {
        if self.left_ref(x, Node::is_vacant) {
            return;
        }
        let y = self.node_ref(x, Node::left);
        log::trace!("right rotate {x:?} under {y:?}");
        self.node_mut(x, Node::set_left(self.node_ref(y, Node::right)));
        if !self.right_ref(y, Node::is_vacant) {
            self.right_mut(y, Node::set_parent(x));
        }

        self.replace_parent(x, y);
        self.node_mut(y, Node::set_right(x));
    }

    /// Replace parent during a rotation.
    fn replace_parent(&mut self, x: NodeIndex<Ix>, y: NodeIndex<Ix>) {
        let p = self.node_ref(x, Node::parent);
        self.node_mut(y, Node::set_parent(p));
        self.replace_child(p, x, y);
        self.node_mut(x, Node::set_parent(y));
    }

    /// Replace one subtree as a child of its parent with another subtree.
    fn transplant(&mut self, u: NodeIndex<Ix>, v: NodeIndex<Ix>) {
        let p = self.node_ref(u, Node::parent);
        self.replace_child(p, u, v);
        if !v.is_sentinel() {
            self.node_mut(v, Node::set_parent(p));
        }
    }

    /// Point the link of `parent` that refers to `old` at `new`; a sentinel
    /// `parent` means `old` is the root.
    fn replace_child(&mut self, parent: NodeIndex<Ix>, old: NodeIndex<Ix>, new: NodeIndex<Ix>) {
        if parent.is_sentinel() {
            self.root = new;
        } else if self.node_ref(parent, Node::left) == old {
            self.node_mut(parent, Node::set_left(new));
        } else {
            self.node_mut(parent, Node::set_right(new));
        }
    }

    /// Which child of its parent `x` is. Not meaningful for the root.
    fn side_of(&self, x: NodeIndex<Ix>) -> Side {
        if self.parent_ref(x, Node::left) == x {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Store `node` in a free slot, growing the arena if none is left.
    fn alloc(&mut self, node: Node<K, V, Ix>) -> NodeIndex<Ix> {
        if let Some(idx) = self.free.pop() {
            log::trace!("reusing slot {idx:?}");
            self.nodes[idx.index()] = node;
            return idx;
        }
        let idx = NodeIndex::new(self.nodes.len());
        // check for max capacity, except if we use usize
        assert!(
            <Ix as IndexType>::max().index() == !0 || NodeIndex::end() != idx,
            "Reached maximum number of nodes"
        );
        log::trace!("allocating slot {idx:?}");
        self.nodes.push(node);
        idx
    }

    /// Vacate the slot of an unlinked node and put it on the free-list.
    fn release(&mut self, z: NodeIndex<Ix>) -> (K, V) {
        log::trace!("releasing slot {z:?}");
        let node = std::mem::replace(&mut self.nodes[z.index()], Node::new_sentinel());
        self.free.push(z);
        match (node.key, node.value) {
            (Some(key), Some(value)) => (key, value),
            _ => unreachable!("released a vacant slot"),
        }
    }

    /// Find the node with the minimum key in the subtree at `x`.
    fn tree_minimum(&self, mut x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        while !self.left_ref(x, Node::is_vacant) {
            x = self.node_ref(x, Node::left);
        }
        x
    }

    /// Find the node with the maximum key in the subtree at `x`.
    fn tree_maximum(&self, mut x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        while !self.right_ref(x, Node::is_vacant) {
            x = self.node_ref(x, Node::right);
        }
        x
    }

    pub(crate) fn first_node(&self) -> Option<NodeIndex<Ix>> {
        (!self.root.is_sentinel()).then(|| self.tree_minimum(self.root))
    }

    pub(crate) fn last_node(&self) -> Option<NodeIndex<Ix>> {
        (!self.root.is_sentinel()).then(|| self.tree_maximum(self.root))
    }

    /// The in-order successor of `x`, `None` if `x` holds the largest key.
    pub(crate) fn successor(&self, x: NodeIndex<Ix>) -> Option<NodeIndex<Ix>> {
        let right = self.node_ref(x, Node::right);
        if !right.is_sentinel() {
            return Some(self.tree_minimum(right));
        }
        let mut x = x;
        let mut p = self.node_ref(x, Node::parent);
        while !p.is_sentinel() && self.node_ref(p, Node::right) == x {
            x = p;
            p = self.node_ref(p, Node::parent);
        }
        (!p.is_sentinel()).then_some(p)
    }

    /// The in-order predecessor of `x`, `None` if `x` holds the smallest key.
    pub(crate) fn predecessor(&self, x: NodeIndex<Ix>) -> Option<NodeIndex<Ix>> {
        let left = self.node_ref(x, Node::left);
        if !left.is_sentinel() {
            return Some(self.tree_maximum(left));
        }
        let mut x = x;
        let mut p = self.node_ref(x, Node::parent);
        while !p.is_sentinel() && self.node_ref(p, Node::left) == x {
            x = p;
            p = self.node_ref(p, Node::parent);
        }
        (!p.is_sentinel()).then_some(p)
    }

    pub(crate) fn cursor_at(&self, node: Option<NodeIndex<Ix>>) -> Cursor<Ix> {
        let stamp = node.map_or(0, |x| self.node_ref(x, Node::stamp));
        Cursor::new(self.id, node, stamp)
    }

    /// Check that `cursor` was issued by this map and still refers to the
    /// node it was taken at. `Ok(None)` is the past-the-end position.
    pub(crate) fn resolve(&self, cursor: &Cursor<Ix>) -> Result<Option<NodeIndex<Ix>>> {
        if cursor.map != self.id {
            return Err(Error::InvalidIterator);
        }
        match cursor.node {
            None => Ok(None),
            Some(x) if x.is_sentinel() => Err(Error::InvalidIterator),
            Some(x) => match self.nodes.get(x.index()) {
                Some(node) if !node.is_vacant() && node.stamp() == cursor.stamp => Ok(Some(x)),
                _ => Err(Error::InvalidIterator),
            },
        }
    }
}

// Convenient methods for reference or mutate current/parent/left/right node
impl<'a, K, V, C, Ix> TreeMap<K, V, C, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn node_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, V, Ix>) -> R,
    {
        op(&self.nodes[node.index()])
    }

    pub(crate) fn node_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, V, Ix>) -> R,
    {
        op(&mut self.nodes[node.index()])
    }

    fn left_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].left().index();
        op(&self.nodes[idx])
    }

    fn right_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].right().index();
        op(&self.nodes[idx])
    }

    fn parent_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].parent().index();
        op(&self.nodes[idx])
    }

    fn left_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].left().index();
        op(&mut self.nodes[idx])
    }

    fn right_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].right().index();
        op(&mut self.nodes[idx])
    }
}

impl<K, V, C, Ix> Default for TreeMap<K, V, C, Ix>
where
    C: Default,
    Ix: IndexType,
{
    #[inline]
    fn default() -> Self {
        Self::with_capacity_and_comparator(0, C::default())
    }
}

impl<K, V, C, Ix> Clone for TreeMap<K, V, C, Ix>
where
    K: Clone,
    V: Clone,
    C: Clone,
    Ix: IndexType,
{
    /// Deep copy with identical shape and colors. The copy is a distinct map:
    /// cursors of the original are rejected by it.
    fn clone(&self) -> Self {
        TreeMap {
            nodes: self.nodes.clone(),
            root: self.root,
            len: self.len,
            free: self.free.clone(),
            cmp: self.cmp.clone(),
            id: MapId::next(),
            next_stamp: self.next_stamp,
        }
    }
}

impl<K, V, C, Ix> fmt::Debug for TreeMap<K, V, C, Ix>
where
    K: fmt::Debug,
    V: fmt::Debug,
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C, Ix> PartialEq for TreeMap<K, V, C, Ix>
where
    K: PartialEq,
    V: PartialEq,
    Ix: IndexType,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K, V, C, Ix> Eq for TreeMap<K, V, C, Ix>
where
    K: Eq,
    V: Eq,
    Ix: IndexType,
{
}

impl<K, V, C, Ix> FromIterator<(K, V)> for TreeMap<K, V, C, Ix>
where
    C: Compare<K> + Default,
    Ix: IndexType,
{
    /// Later pairs overwrite the values of earlier pairs with equivalent keys.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C, Ix> Extend<(K, V)> for TreeMap<K, V, C, Ix>
where
    C: Compare<K>,
    Ix: IndexType,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ignore = self.insert_or_update(key, value);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn map_of(keys: &[i32]) -> TreeMap<i32, i32> {
        let mut map = TreeMap::new();
        for &k in keys {
            let _ignore = map.insert(k, k * 10);
        }
        map.assert_valid();
        map
    }

    #[test]
    fn locate_reports_insertion_parent() {
        let map = map_of(&[5, 3, 8]);
        let five = map.search_exact(&5).unwrap();
        let three = map.search_exact(&3).unwrap();
        assert_eq!(map.root, five);
        assert!(matches!(
            map.locate(&4),
            Search::Vacant { parent, side: Side::Right } if parent == three
        ));
        assert!(matches!(
            map.locate(&1),
            Search::Vacant { parent, side: Side::Left } if parent == three
        ));
        assert!(matches!(map.locate(&8), Search::Found(_)));
    }

    #[test]
    fn locate_on_empty_tree_reports_sentinel() {
        let map: TreeMap<i32, i32> = TreeMap::new();
        assert!(matches!(
            map.locate(&1),
            Search::Vacant { parent, .. } if parent.is_sentinel()
        ));
    }

    #[test]
    fn rotate_up_preserves_order_and_links() {
        let mut map = map_of(&[2, 1, 3]);
        let one = map.search_exact(&1).unwrap();
        let two = map.search_exact(&2).unwrap();
        map.rotate_up(one);
        assert_eq!(map.root, one);
        assert_eq!(map.node_ref(one, Node::parent), NodeIndex::sentinel());
        assert_eq!(map.node_ref(one, Node::right), two);
        assert_eq!(map.node_ref(two, Node::parent), one);
        assert!(map.node_ref(two, Node::left).is_sentinel());
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, [1, 2, 3]);
        map.rotate_up(two);
        assert_eq!(map.root, two);
        assert_eq!(map.node_ref(two, Node::left), one);
        assert_eq!(map.node_ref(one, Node::parent), two);
    }

    #[test]
    fn successor_swap_with_adjacent_child() {
        // the successor of 20 is its right child 30
        let mut map = map_of(&[20, 10, 30, 40]);
        let z = map.search_exact(&20).unwrap();
        let y = map.search_exact(&30).unwrap();
        assert_eq!(map.node_ref(y, Node::parent), z);
        let (z_color, y_color) = (map.node_ref(z, Node::color), map.node_ref(y, Node::color));
        map.swap_with_successor(z, y);
        assert_eq!(map.root, y);
        assert_eq!(map.node_ref(z, Node::parent), y);
        assert_eq!(map.node_ref(y, Node::right), z);
        assert_eq!(map.node_ref(y, Node::color), z_color);
        assert_eq!(map.node_ref(z, Node::color), y_color);
        let forty = map.search_exact(&40);
        assert_eq!(map.node_ref(z, Node::right), forty.unwrap());
    }

    #[test]
    fn successor_swap_with_distant_descendant() {
        let mut map = map_of(&[20, 10, 40, 30, 50]);
        let z = map.search_exact(&20).unwrap();
        let y = map.search_exact(&30).unwrap();
        let forty = map.search_exact(&40).unwrap();
        assert_eq!(map.node_ref(y, Node::parent), forty);
        map.swap_with_successor(z, y);
        assert_eq!(map.root, y);
        assert_eq!(map.node_ref(y, Node::right), forty);
        assert_eq!(map.node_ref(forty, Node::parent), y);
        assert_eq!(map.node_ref(forty, Node::left), z);
        assert_eq!(map.node_ref(z, Node::parent), forty);
        assert!(map.node_ref(z, Node::left).is_sentinel());
    }

    #[test]
    fn released_slots_are_reused() {
        let mut map = map_of(&[1, 2, 3]);
        let slots = map.nodes.len();
        let _ignore = map.remove(&2);
        assert_eq!(map.free.len(), 1);
        let _ignore = map.insert(4, 40);
        assert_eq!(map.nodes.len(), slots);
        assert!(map.free.is_empty());
        map.assert_valid();
    }

    #[test]
    fn tree_map_clear_is_ok() {
        let mut map = map_of(&[1, 2, 6]);
        let _ignore = map.remove(&1);
        assert_eq!(map.len(), 2);
        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.nodes.len(), 1);
        assert!(map.nodes[0].is_vacant());
        assert!(map.free.is_empty());
        map.assert_valid();
    }
}
