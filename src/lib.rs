//! `rb_tree_map` is an ordered map based on red-black tree.
//!
//! It implements the insertion and deletion functionality of a red-black tree,
//! ensuring that each modification operation requires at most O(logN) time complexity.
//!
//! `rb_tree_map` uses arrays to simulate pointers for managing the parent-child
//! references in the red-black tree. Nodes never move inside the array, which gives
//! every element a stable identity: a [`Cursor`] taken to one element keeps pointing at
//! it while other elements are inserted or erased, including the two-child erase that
//! exchanges a node with its in-order successor.
//!
//! Keys are ordered by a [`Compare`] implementation fixed at construction,
//! [`Natural`] by default.
//!
//! # Example
//!
//! ```rust
//! use rb_tree_map::{Error, TreeMap};
//!
//! let mut map = TreeMap::new();
//! for k in [10, 20, 30, 15, 25] {
//!     map.insert(k, k.to_string());
//! }
//! let (thirty, inserted) = map.insert(30, "ignored".to_string());
//! assert!(!inserted);
//!
//! map.erase(map.find(&20))?;
//! assert_eq!(thirty.value(&map)?, "30");
//! assert_eq!(map.at(&20), Err(Error::KeyNotFound));
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), [10, 15, 25, 30]);
//! # Ok::<(), Error>(())
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize` and `Deserialize` as an ordered map.
//! - `graphviz`: render the tree with [`TreeMap::dot`], [`TreeMap::draw`] and
//!   [`TreeMap::draw_without_value`].

mod compare;
mod cursor;
#[cfg(feature = "graphviz")]
mod dot;
mod entry;
mod error;
mod index;
mod iter;
mod node;
#[cfg(feature = "serde")]
mod serde_impl;
mod treemap;

#[cfg(test)]
mod tests;

pub use compare::{Compare, FnCompare, Natural, Reverse};
pub use cursor::Cursor;
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::{Error, Result};
pub use index::{DefaultIx, IndexType, NodeIndex};
pub use iter::{IntoIter, IntoKeys, IntoValues, Iter, IterMut, Keys, Values, ValuesMut};
pub use treemap::TreeMap;
