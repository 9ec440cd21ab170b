use std::fmt;
use std::marker::PhantomData;

use ::serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use ::serde::ser::{Serialize, Serializer};

use crate::compare::Compare;
use crate::index::IndexType;
use crate::treemap::TreeMap;

impl<K, V, C, Ix> Serialize for TreeMap<K, V, C, Ix>
where
    K: Serialize,
    V: Serialize,
    Ix: IndexType,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self)
    }
}

impl<'de, K, V, C, Ix> Deserialize<'de> for TreeMap<K, V, C, Ix>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Compare<K> + Default,
    Ix: IndexType,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TreeMapVisitor {
            phantom: PhantomData,
        })
    }
}

struct TreeMapVisitor<K, V, C, Ix> {
    phantom: PhantomData<fn() -> TreeMap<K, V, C, Ix>>,
}

impl<'de, K, V, C, Ix> Visitor<'de> for TreeMapVisitor<K, V, C, Ix>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Compare<K> + Default,
    Ix: IndexType,
{
    type Value = TreeMap<K, V, C, Ix>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let capacity = access.size_hint().unwrap_or(0).min(4096);
        let mut map = TreeMap::with_capacity_and_comparator(capacity, C::default());
        while let Some((key, value)) = access.next_entry()? {
            let _ignore = map.insert_or_update(key, value);
        }
        Ok(map)
    }
}
