use std::cmp;

use rb_tree_map::{Compare, Cursor, TreeMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringAffine {
    /// String
    String(String),
    /// Unbounded
    Unbounded,
}

impl StringAffine {
    pub fn new_key(s: &str) -> Self {
        Self::String(s.to_string())
    }

    pub fn new_unbounded() -> Self {
        Self::Unbounded
    }
}

/// Orders strings case-insensitively, with `Unbounded` after every string.
#[derive(Debug, Clone, Copy, Default)]
struct CaseInsensitive;

impl Compare<StringAffine> for CaseInsensitive {
    fn compare(&self, lhs: &StringAffine, rhs: &StringAffine) -> cmp::Ordering {
        match (lhs, rhs) {
            (StringAffine::String(x), StringAffine::String(y)) => x
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(y.chars().flat_map(char::to_lowercase)),
            (StringAffine::String(_), StringAffine::Unbounded) => cmp::Ordering::Less,
            (StringAffine::Unbounded, StringAffine::String(_)) => cmp::Ordering::Greater,
            (StringAffine::Unbounded, StringAffine::Unbounded) => cmp::Ordering::Equal,
        }
    }
}

fn main() -> Result<(), rb_tree_map::Error> {
    let mut map = TreeMap::<StringAffine, u32, CaseInsensitive>::with_comparator(CaseInsensitive);
    let (unbounded, _) = map.insert(StringAffine::new_unbounded(), 0);
    for (i, word) in ["pear", "Apple", "fig", "banana"].into_iter().enumerate() {
        let _ignore = map.insert(StringAffine::new_key(word), u32::try_from(i).unwrap_or(0));
    }

    // equivalent under the comparator, so nothing is inserted
    let (apple, inserted) = map.insert(StringAffine::new_key("APPLE"), 99);
    assert!(!inserted);
    assert_eq!(apple.key(&map)?, &StringAffine::new_key("Apple"));

    let mut cursor: Cursor = map.begin();
    let mut order = vec![];
    while cursor != unbounded {
        order.push(cursor.key(&map)?.clone());
        cursor.move_next(&map)?;
    }
    assert_eq!(
        order,
        ["Apple", "banana", "fig", "pear"].map(StringAffine::new_key)
    );

    map.erase(map.find(&StringAffine::new_key("FIG")))?;
    assert_eq!(map.len(), 4);
    assert_eq!(unbounded.value(&map)?, &0);
    assert_eq!(map.last_key_value(), Some((&StringAffine::Unbounded, &0)));
    Ok(())
}
