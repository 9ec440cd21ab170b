use crate::error::{Error, Result};
use crate::index::{DefaultIx, IndexType, NodeIndex};
use crate::node::Node;
use crate::treemap::{MapId, TreeMap};

/// A position in a [`TreeMap`]: either an element or past-the-end.
///
/// A cursor is a plain `Copy` handle that does not borrow its map, every
/// operation takes the map explicitly. It stays valid across inserts and
/// across erasing other elements, including the successor exchange of a
/// two-child erase. Once its element is erased the cursor is rejected with
/// [`Error::InvalidIterator`], even after a later insert reuses the slot.
/// Two cursors are equal when they come from the same map
/// and point at the same element; cursors of different maps are never
/// equal.
///
/// # Example
/// ```rust
/// use rb_tree_map::TreeMap;
///
/// let mut map = TreeMap::new();
/// for k in [3, 1, 2] {
///     map.insert(k, k * 10);
/// }
/// let mut cursor = map.begin();
/// let mut seen = vec![];
/// while cursor != map.end() {
///     seen.push(*cursor.key(&map)?);
///     cursor.move_next(&map)?;
/// }
/// assert_eq!(seen, [1, 2, 3]);
/// # Ok::<(), rb_tree_map::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor<Ix = DefaultIx> {
    /// Map this cursor was obtained from
    pub(crate) map: MapId,
    /// Current node, `None` past-the-end
    pub(crate) node: Option<NodeIndex<Ix>>,
    /// Stamp of the node when the cursor was taken
    pub(crate) stamp: u64,
}

impl<Ix> Cursor<Ix>
where
    Ix: IndexType,
{
    pub(crate) fn new(map: MapId, node: Option<NodeIndex<Ix>>, stamp: u64) -> Self {
        Cursor { map, node, stamp }
    }

    /// Return `true` for the past-the-end position.
    #[inline]
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Advance to the next element in key order, or past-the-end after the
    /// last one.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIterator`] when the cursor is already past-the-end,
    /// comes from another map, or its element was erased. The cursor is left
    /// unchanged.
    #[inline]
    pub fn move_next<K, V, C>(&mut self, map: &TreeMap<K, V, C, Ix>) -> Result<()> {
        let x = map.resolve(self)?.ok_or(Error::InvalidIterator)?;
        *self = map.cursor_at(map.successor(x));
        Ok(())
    }

    /// Step back to the previous element in key order. From past-the-end
    /// this moves to the element with the largest key.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIterator`] when the cursor is at the first element,
    /// is past-the-end of an empty map, comes from another map, or its
    /// element was erased. The cursor is left unchanged.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::{Error, TreeMap};
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, ());
    /// let mut cursor = map.end();
    /// cursor.move_prev(&map)?;
    /// assert_eq!(cursor.key(&map), Ok(&1));
    /// assert_eq!(cursor.move_prev(&map), Err(Error::InvalidIterator));
    /// # Ok::<(), Error>(())
    /// ```
    #[inline]
    pub fn move_prev<K, V, C>(&mut self, map: &TreeMap<K, V, C, Ix>) -> Result<()> {
        let prev = match map.resolve(self)? {
            Some(x) => map.predecessor(x),
            None => map.last_node(),
        };
        *self = map.cursor_at(Some(prev.ok_or(Error::InvalidIterator)?));
        Ok(())
    }

    /// Return a cursor one element further, leaving `self` untouched.
    ///
    /// # Errors
    ///
    /// Same as [`move_next`](Self::move_next).
    #[inline]
    pub fn following<K, V, C>(mut self, map: &TreeMap<K, V, C, Ix>) -> Result<Self> {
        self.move_next(map)?;
        Ok(self)
    }

    /// Return a cursor one element back, leaving `self` untouched.
    ///
    /// # Errors
    ///
    /// Same as [`move_prev`](Self::move_prev).
    #[inline]
    pub fn preceding<K, V, C>(mut self, map: &TreeMap<K, V, C, Ix>) -> Result<Self> {
        self.move_prev(map)?;
        Ok(self)
    }

    /// Return the key and value under the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIterator`] when past-the-end, foreign, or erased.
    #[inline]
    pub fn get<'a, K, V, C>(&self, map: &'a TreeMap<K, V, C, Ix>) -> Result<(&'a K, &'a V)> {
        let x = map.resolve(self)?.ok_or(Error::InvalidIterator)?;
        Ok(map.node_ref(x, Node::key_value))
    }

    /// Return the key and a mutable reference to the value under the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIterator`] when past-the-end, foreign, or erased.
    #[inline]
    pub fn get_mut<'a, K, V, C>(
        &self,
        map: &'a mut TreeMap<K, V, C, Ix>,
    ) -> Result<(&'a K, &'a mut V)> {
        let x = map.resolve(self)?.ok_or(Error::InvalidIterator)?;
        Ok(map.node_mut(x, Node::key_value_mut))
    }

    /// Return the key under the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIterator`] when past-the-end, foreign, or erased.
    #[inline]
    pub fn key<'a, K, V, C>(&self, map: &'a TreeMap<K, V, C, Ix>) -> Result<&'a K> {
        self.get(map).map(|(k, _)| k)
    }

    /// Return the value under the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIterator`] when past-the-end, foreign, or erased.
    #[inline]
    pub fn value<'a, K, V, C>(&self, map: &'a TreeMap<K, V, C, Ix>) -> Result<&'a V> {
        self.get(map).map(|(_, v)| v)
    }
}
