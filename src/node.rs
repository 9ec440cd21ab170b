use crate::index::{IndexType, NodeIndex};

/// Node of the red-black tree
///
/// Slot 0 of every arena holds the sentinel: a black node without key or
/// value whose links all point back to itself. Vacated slots on the
/// free-list also carry no key or value.
#[derive(Debug, Clone)]
pub struct Node<K, V, Ix> {
    /// Left child
    pub left: NodeIndex<Ix>,
    /// Right child
    pub right: NodeIndex<Ix>,
    /// Parent, the sentinel for the root
    pub parent: NodeIndex<Ix>,
    /// Color of the node
    pub color: Color,

    /// Key of the node, fixed for the node's lifetime
    pub key: Option<K>,
    /// Value of the node
    pub value: Option<V>,
    /// Allocation stamp, distinguishes successive occupants of a slot
    pub stamp: u64,
}

impl<K, V, Ix> Node<K, V, Ix>
where
    Ix: IndexType,
{
    pub fn new_sentinel() -> Self {
        Node {
            left: NodeIndex::sentinel(),
            right: NodeIndex::sentinel(),
            parent: NodeIndex::sentinel(),
            color: Color::Black,
            key: None,
            value: None,
            stamp: 0,
        }
    }

    pub fn new_leaf(key: K, value: V, parent: NodeIndex<Ix>, stamp: u64) -> Self {
        Node {
            left: NodeIndex::sentinel(),
            right: NodeIndex::sentinel(),
            parent,
            color: Color::Red,
            key: Some(key),
            value: Some(value),
            stamp,
        }
    }
}

// Convenient getter/setter methods
impl<K, V, Ix> Node<K, V, Ix>
where
    Ix: IndexType,
{
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn left(&self) -> NodeIndex<Ix> {
        self.left
    }

    pub fn right(&self) -> NodeIndex<Ix> {
        self.right
    }

    pub fn parent(&self) -> NodeIndex<Ix> {
        self.parent
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn child(&self, side: Side) -> NodeIndex<Ix> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// `true` for the sentinel and for vacated slots.
    pub fn is_vacant(&self) -> bool {
        self.key.is_none()
    }

    pub fn is_black(&self) -> bool {
        matches!(self.color, Color::Black)
    }

    pub fn is_red(&self) -> bool {
        matches!(self.color, Color::Red)
    }

    /// # Panics
    ///
    /// Panics when called on the sentinel or a vacated slot.
    pub fn key(&self) -> &K {
        self.key.as_ref().expect("vacant node has no key")
    }

    /// # Panics
    ///
    /// Panics when called on the sentinel or a vacated slot.
    pub fn value(&self) -> &V {
        self.value.as_ref().expect("vacant node has no value")
    }

    /// # Panics
    ///
    /// Panics when called on the sentinel or a vacated slot.
    pub fn value_mut(&mut self) -> &mut V {
        self.value.as_mut().expect("vacant node has no value")
    }

    pub fn key_value(&self) -> (&K, &V) {
        (self.key(), self.value())
    }

    pub fn key_value_mut(&mut self) -> (&K, &mut V) {
        match (&self.key, &mut self.value) {
            (Some(key), Some(value)) => (key, value),
            _ => panic!("vacant node has no entry"),
        }
    }

    /// Takes key and value out, leaving the slot vacant.
    pub fn take_entry(&mut self) -> Option<(K, V)> {
        self.key.take().zip(self.value.take())
    }

    pub fn set_value(value: V) -> impl FnOnce(&mut Node<K, V, Ix>) -> Option<V> {
        move |node: &mut Node<K, V, Ix>| node.value.replace(value)
    }

    pub fn set_color(color: Color) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| {
            node.color = color;
        }
    }

    pub fn set_left(left: NodeIndex<Ix>) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| {
            node.left = left;
        }
    }

    pub fn set_right(right: NodeIndex<Ix>) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| {
            node.right = right;
        }
    }

    pub fn set_child(side: Side, child: NodeIndex<Ix>) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| match side {
            Side::Left => node.left = child,
            Side::Right => node.right = child,
        }
    }

    pub fn set_parent(parent: NodeIndex<Ix>) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| {
            node.parent = parent;
        }
    }
}

/// The color of the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Red node
    Red,
    /// Black node
    Black,
}

/// Which child slot of a parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}
