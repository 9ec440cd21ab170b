use std::fmt;

use crate::cursor::Cursor;
use crate::index::{IndexType, NodeIndex};
use crate::node::{Node, Side};
use crate::treemap::TreeMap;

/// A view into a single entry in a map, which may either be vacant or occupied.
pub enum Entry<'a, K, V, C, Ix> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, C, Ix>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, C, Ix>),
}

/// A view into an occupied entry in a `TreeMap`.
/// It is part of the [`Entry`] enum.
pub struct OccupiedEntry<'a, K, V, C, Ix> {
    /// Reference to the map
    pub(crate) map_ref: &'a mut TreeMap<K, V, C, Ix>,
    /// The entry node
    pub(crate) node_idx: NodeIndex<Ix>,
}

/// A view into a vacant entry in a `TreeMap`.
/// It is part of the [`Entry`] enum.
///
/// The insertion point found by the lookup is kept, inserting through the
/// entry makes no further key comparisons.
pub struct VacantEntry<'a, K, V, C, Ix> {
    /// Mutable reference to the map
    pub(crate) map_ref: &'a mut TreeMap<K, V, C, Ix>,
    /// The key of this entry
    pub(crate) key: K,
    /// Future parent of the new node
    pub(crate) parent: NodeIndex<Ix>,
    /// Which child of `parent` the new node becomes
    pub(crate) side: Side,
}

impl<'a, K, V, C, Ix> Entry<'a, K, V, C, Ix>
where
    Ix: IndexType,
{
    /// Ensures a value is in the entry by inserting the default if empty, and returns
    /// a mutable reference to the value in the entry.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::{Entry, TreeMap};
    ///
    /// let mut map = TreeMap::new();
    /// assert!(matches!(map.entry(1), Entry::Vacant(_)));
    /// map.entry(1).or_insert(3);
    /// assert!(matches!(map.entry(1), Entry::Occupied(_)));
    /// assert_eq!(map.get(&1), Some(&3));
    /// ```
    #[inline]
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Ensures a value is in the entry by inserting the result of `default`
    /// if empty, and returns a mutable reference to the value in the entry.
    #[inline]
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Like [`or_insert_with`](Self::or_insert_with), but `default` receives
    /// the key.
    #[inline]
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(&entry.key);
                entry.insert(value)
            }
        }
    }

    /// Ensures a value is in the entry by inserting `V::default()` if empty.
    #[inline]
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts into the map.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::{Entry, TreeMap};
    ///
    /// let mut map = TreeMap::new();
    ///
    /// map.insert(6, 3);
    /// assert!(matches!(map.entry(6), Entry::Occupied(_)));
    /// map.entry(6).and_modify(|v| *v += 1);
    /// assert_eq!(map.get(&6), Some(&4));
    /// ```
    #[inline]
    #[must_use]
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Self::Occupied(entry)
            }
            Entry::Vacant(entry) => Self::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    #[inline]
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, C, Ix> OccupiedEntry<'a, K, V, C, Ix>
where
    Ix: IndexType,
{
    /// The key stored in the map.
    #[inline]
    pub fn key(&self) -> &K {
        self.map_ref.node_ref(self.node_idx, Node::key)
    }

    #[inline]
    pub fn get(&self) -> &V {
        self.map_ref.node_ref(self.node_idx, Node::value)
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        self.map_ref.node_mut(self.node_idx, Node::value_mut)
    }

    /// Converts the entry into a mutable reference bound to the map borrow.
    #[inline]
    pub fn into_mut(self) -> &'a mut V {
        let map_ref = self.map_ref;
        map_ref.node_mut(self.node_idx, Node::value_mut)
    }

    /// Replace the value, returning the old one.
    #[inline]
    pub fn insert(&mut self, value: V) -> V {
        std::mem::replace(self.get_mut(), value)
    }

    /// A cursor at this entry.
    #[inline]
    pub fn cursor(&self) -> Cursor<Ix> {
        self.map_ref.cursor_at(Some(self.node_idx))
    }

    /// Remove the entry from the map, returning its value.
    #[inline]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Remove the entry from the map, returning the stored key and value.
    #[inline]
    pub fn remove_entry(self) -> (K, V) {
        self.map_ref.remove_node(self.node_idx)
    }
}

impl<'a, K, V, C, Ix> VacantEntry<'a, K, V, C, Ix>
where
    Ix: IndexType,
{
    /// The key that would be inserted.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    #[inline]
    pub fn into_key(self) -> K {
        self.key
    }

    /// Insert `value` under the entry's key and return a mutable reference
    /// to it.
    ///
    /// # Panics
    ///
    /// This method panics when the tree is at the maximum number of nodes for its index
    #[inline]
    pub fn insert(self, value: V) -> &'a mut V {
        let map_ref = self.map_ref;
        let node_idx = map_ref.attach(self.key, value, self.parent, self.side);
        map_ref.node_mut(node_idx, Node::value_mut)
    }
}

impl<K, V, C, Ix> fmt::Debug for Entry<'_, K, V, C, Ix>
where
    K: fmt::Debug,
    V: fmt::Debug,
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Occupied(entry) => f.debug_tuple("Entry").field(entry).finish(),
            Entry::Vacant(entry) => f.debug_tuple("Entry").field(entry).finish(),
        }
    }
}

impl<K, V, C, Ix> fmt::Debug for OccupiedEntry<'_, K, V, C, Ix>
where
    K: fmt::Debug,
    V: fmt::Debug,
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .finish()
    }
}

impl<K, V, C, Ix> fmt::Debug for VacantEntry<'_, K, V, C, Ix>
where
    K: fmt::Debug,
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(self.key()).finish()
    }
}
