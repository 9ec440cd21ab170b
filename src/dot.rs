use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::index::{IndexType, NodeIndex};
use crate::node::{Color, Node, Side};
use crate::treemap::TreeMap;

/// Graphviz rendering of a map's tree, see [`TreeMap::dot`].
pub struct Dot<'a, K, V, C, Ix> {
    pub(crate) map: &'a TreeMap<K, V, C, Ix>,
    pub(crate) with_value: bool,
}

impl<K, V, C, Ix> Dot<'_, K, V, C, Ix>
where
    K: fmt::Debug,
    V: fmt::Debug,
    Ix: IndexType,
{
    fn node_fmt(&self, f: &mut fmt::Formatter<'_>, x: NodeIndex<Ix>) -> fmt::Result {
        let node = self.map.node_ref(x, |n| n);
        let id = x.index();
        let color = match node.color() {
            Color::Red => "red",
            Color::Black => "black",
        };
        let label = if self.with_value {
            format!("{:?}: {:?}", node.key(), node.value())
        } else {
            format!("{:?}", node.key())
        };
        writeln!(
            f,
            r#"    {id} [label="{}", color={color}];"#,
            label.escape_debug()
        )?;

        for side in [Side::Left, Side::Right] {
            let child = node.child(side);
            if !child.is_sentinel() {
                let label = match side {
                    Side::Left => "left",
                    Side::Right => "right",
                };
                writeln!(f, r#"    {id} -> {} [label="{label}"];"#, child.index())?;
            }
        }
        Ok(())
    }
}

impl<K, V, C, Ix> fmt::Display for Dot<'_, K, V, C, Ix>
where
    K: fmt::Debug,
    V: fmt::Debug,
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {{")?;
        writeln!(f, "    node [shape=box];")?;
        let mut stack = vec![self.map.root];
        while let Some(x) = stack.pop() {
            if x.is_sentinel() {
                continue;
            }
            self.node_fmt(f, x)?;
            stack.push(self.map.node_ref(x, Node::right));
            stack.push(self.map.node_ref(x, Node::left));
        }
        writeln!(f, "}}")
    }
}

impl<K, V, C, Ix> TreeMap<K, V, C, Ix>
where
    K: fmt::Debug,
    V: fmt::Debug,
    Ix: IndexType,
{
    /// Render the tree as a Graphviz digraph. Nodes are labeled with their
    /// key and value and outlined in their color.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, "one");
    /// assert!(map.dot().contains(r#"[label="1: \"one\"", color=black]"#));
    /// ```
    #[must_use]
    pub fn dot(&self) -> String {
        self.render(true).to_string()
    }

    /// Write the digraph of [`dot`](Self::dot) to `path`.
    ///
    /// # Errors
    ///
    /// Any I/O error creating or writing the file.
    pub fn draw(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.write_dot(path, true)
    }

    /// Like [`draw`](Self::draw), with nodes labeled by key only.
    ///
    /// # Errors
    ///
    /// Any I/O error creating or writing the file.
    pub fn draw_without_value(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.write_dot(path, false)
    }

    fn render(&self, with_value: bool) -> Dot<'_, K, V, C, Ix> {
        Dot {
            map: self,
            with_value,
        }
    }

    fn write_dot(&self, path: impl AsRef<Path>, with_value: bool) -> io::Result<()> {
        let mut file = File::create(path)?;
        write!(file, "{}", self.render(with_value))?;
        file.flush()
    }
}
