use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use index::NodeIndex;
use node::{Color, Node};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::*;

struct KeyGenerator {
    rng: StdRng,
    unique: HashSet<i32>,
    limit: i32,
}

impl KeyGenerator {
    fn new(seed: [u8; 32]) -> Self {
        const LIMIT: i32 = 100_000;
        Self {
            rng: SeedableRng::from_seed(seed),
            unique: HashSet::new(),
            limit: LIMIT,
        }
    }

    fn next(&mut self) -> i32 {
        self.rng.gen_range(0..self.limit)
    }

    fn next_unique(&mut self) -> i32 {
        let mut key = self.next();
        while self.unique.contains(&key) {
            key = self.next();
        }
        self.unique.insert(key);
        key
    }
}

impl<V, C> TreeMap<i32, V, C> {
    /// 1. Every node is either red or black.
    /// 2. The root is black.
    /// 3. Every leaf (NIL) is black.
    /// 4. If a node is red, then both its children are black.
    /// 5. For each node, all simple paths from the node to descendant leaves contain the
    ///    same number of black nodes.
    fn check_rb_properties(&self) {
        assert!(matches!(
            self.node_ref(self.root, Node::color),
            Color::Black
        ));
        assert!(self.node_ref(NodeIndex::sentinel(), Node::is_black));
        self.check_children_color(self.root);
        self.check_black_height(self.root);
    }

    fn check_children_color(&self, x: NodeIndex<u32>) {
        if x.is_sentinel() {
            return;
        }
        let left = self.node_ref(x, Node::left);
        let right = self.node_ref(x, Node::right);
        self.check_children_color(left);
        self.check_children_color(right);
        if self.node_ref(x, Node::is_red) {
            assert!(matches!(self.node_ref(left, Node::color), Color::Black));
            assert!(matches!(self.node_ref(right, Node::color), Color::Black));
        }
    }

    fn check_black_height(&self, x: NodeIndex<u32>) -> usize {
        if x.is_sentinel() {
            return 0;
        }
        let lefth = self.check_black_height(self.node_ref(x, Node::left));
        let righth = self.check_black_height(self.node_ref(x, Node::right));
        assert_eq!(lefth, righth);
        if self.node_ref(x, Node::is_black) {
            return lefth + 1;
        }
        lefth
    }

    /// Walk from `begin` to `end` with a cursor, returning the keys seen.
    fn cursor_walk(&self) -> Vec<i32> {
        let mut keys = vec![];
        let mut cursor = self.begin();
        while cursor != self.end() {
            keys.push(*cursor.key(self).unwrap());
            cursor.move_next(self).unwrap();
        }
        keys
    }
}

fn with_map_and_generator<V>(test_fn: impl Fn(TreeMap<i32, V>, KeyGenerator)) {
    let seeds = vec![[0; 32], [1; 32], [2; 32]];
    for seed in seeds {
        let gen = KeyGenerator::new(seed);
        let map = TreeMap::new();
        test_fn(map, gen);
    }
}

#[test]
fn red_black_tree_properties_is_satisfied() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for k in keys.clone() {
            let _ignore = map.insert(k, ());
        }
        map.check_rb_properties();
    });
}

#[test]
fn red_black_tree_properties_hold_after_every_mutation() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        for k in keys.clone() {
            let _ignore = map.insert(k, k);
            map.check_rb_properties();
            map.assert_valid();
        }
        for k in keys.iter().step_by(2) {
            assert_eq!(map.remove(k), Some(*k));
            map.check_rb_properties();
            map.assert_valid();
        }
        for k in keys.iter().skip(1).step_by(2) {
            let cursor = map.find(k);
            assert_eq!(map.erase(cursor), Ok((*k, *k)));
            map.check_rb_properties();
            map.assert_valid();
        }
        assert!(map.is_empty());
    });
}

#[test]
fn map_len_will_update() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(100)
            .collect();
        for k in keys.clone() {
            let _ignore = map.insert(k, ());
        }
        assert_eq!(map.len(), 100);
        assert_eq!(map.cursor_walk().len(), 100);
        for k in keys {
            let _ignore = map.remove(&k);
        }
        assert_eq!(map.len(), 0);
        assert_eq!(map.begin(), map.end());
    });
}

#[test]
fn remove_non_exist_key_will_do_nothing() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for k in keys {
            let _ignore = map.insert(k, ());
        }
        assert_eq!(map.len(), 1000);
        let to_remove: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for k in to_remove {
            assert_eq!(map.remove(&k), None);
        }
        assert_eq!(map.len(), 1000);
        map.assert_valid();
    });
}

#[test]
fn iterate_through_map_is_sorted() {
    with_map_and_generator(|mut map, mut gen| {
        let mut keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .enumerate()
            .take(1000)
            .collect();
        for (v, k) in keys.clone() {
            let _ignore = map.insert(k, v);
        }
        keys.sort_unstable_by_key(|&(_, k)| k);

        assert_eq!(map.iter().len(), keys.len());
        for ((ek, ev), (v, k)) in map.iter().zip(keys.iter()) {
            assert_eq!(ek, k);
            assert_eq!(ev, v);
        }
        let walked = map.cursor_walk();
        assert!(walked.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(walked, map.keys().copied().collect::<Vec<_>>());
    });
}

#[test]
fn reverse_iteration_matches_cursor_walk_backwards() {
    with_map_and_generator(|mut map, mut gen| {
        for _ in 0..200 {
            let _ignore = map.insert(gen.next_unique(), ());
        }
        let mut backwards = vec![];
        let mut cursor = map.end();
        while cursor.move_prev(&map).is_ok() {
            backwards.push(*cursor.key(&map).unwrap());
        }
        let expected: Vec<_> = map.keys().rev().copied().collect();
        assert_eq!(backwards, expected);
        assert_eq!(cursor, map.begin());
    });
}

#[test]
fn insert_existing_key_returns_existing_cursor() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(100)
            .collect();
        let cursors: Vec<_> = keys.iter().map(|&k| map.insert(k, k).0).collect();
        for (&k, &cursor) in keys.iter().zip(cursors.iter()) {
            let (again, inserted) = map.insert(k, -1);
            assert!(!inserted);
            assert_eq!(again, cursor);
            assert_eq!(again.value(&map), Ok(&k));
        }
        assert_eq!(map.len(), 100);
    });
}

#[test]
fn erased_key_is_not_found() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(200)
            .collect();
        for &k in &keys {
            let _ignore = map.insert(k, ());
        }
        for k in keys.iter().take(100) {
            let cursor = map.find(k);
            assert!(map.erase(cursor).is_ok());
            assert_eq!(map.find(k), map.end());
            assert_eq!(map.count(k), 0);
        }
        for k in keys.iter().skip(100) {
            assert_eq!(map.count(k), 1);
        }
    });
}

#[test]
fn cursors_survive_unrelated_erase() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        let cursors: Vec<_> = keys.iter().map(|&k| map.insert(k, k).0).collect();
        for (i, (k, cursor)) in keys.iter().zip(cursors.iter()).enumerate() {
            if i % 3 == 0 {
                assert_eq!(map.erase(*cursor), Ok((*k, *k)));
            }
        }
        for (i, (k, cursor)) in keys.iter().zip(cursors.iter()).enumerate() {
            if i % 3 == 0 {
                assert_eq!(cursor.get(&map), Err(Error::InvalidIterator));
            } else {
                assert_eq!(cursor.get(&map), Ok((k, k)));
            }
        }
    });
}

#[test]
fn ten_keys_are_sorted_and_balanced() {
    let mut map = TreeMap::new();
    for k in [5, 3, 8, 1, 4, 7, 9, 2, 6, 0] {
        let (_, inserted) = map.insert(k, ());
        assert!(inserted);
        map.check_rb_properties();
    }
    assert_eq!(map.cursor_walk(), (0..=9).collect::<Vec<_>>());
    assert_eq!(map.len(), 10);
    // 2 * ceil(log2(11))
    assert!(map.height() <= 8);
}

#[test]
fn empty_map_cursors_and_lookups() {
    let map: TreeMap<i32, i32> = TreeMap::new();
    assert_eq!(map.begin(), map.end());
    assert!(map.begin().is_end());

    let mut cursor = map.end();
    assert_eq!(cursor.move_prev(&map), Err(Error::InvalidIterator));
    assert_eq!(cursor, map.end());
    assert_eq!(cursor.move_next(&map), Err(Error::InvalidIterator));
    assert_eq!(cursor.get(&map), Err(Error::InvalidIterator));

    assert_eq!(map.at(&0), Err(Error::KeyNotFound));
    assert_eq!(map.at(&42), Err(Error::KeyNotFound));
    assert_eq!(map.height(), 0);
    map.assert_valid();
}

#[test]
fn cursor_to_successor_survives_two_child_erase() {
    let mut map = TreeMap::new();
    let mut cursors = BTreeMap::new();
    for k in [10, 20, 30, 15, 25] {
        let (cursor, _) = map.insert(k, k * 10);
        let _ignore = cursors.insert(k, cursor);
    }
    let twenty = map.find(&20);
    assert!(!map.node_ref(twenty.node.unwrap(), Node::left).is_sentinel());
    assert!(!map.node_ref(twenty.node.unwrap(), Node::right).is_sentinel());

    let thirty = map.find(&30);
    assert_eq!(map.erase(twenty), Ok((20, 200)));
    map.check_rb_properties();
    map.assert_valid();

    assert_eq!(thirty.key(&map), Ok(&30));
    assert_eq!(thirty.value(&map), Ok(&300));
    assert_eq!(twenty.get(&map), Err(Error::InvalidIterator));
    for k in [10, 15, 25, 30] {
        assert_eq!(cursors[&k].key(&map), Ok(&k));
    }
    assert_eq!(map.cursor_walk(), [10, 15, 25, 30]);
}

#[test]
fn erase_with_adjacent_successor_keeps_cursors() {
    // 20's successor 30 is its right child
    let mut map = TreeMap::new();
    for k in [20, 10, 30, 40] {
        let _ignore = map.insert(k, ());
    }
    let thirty = map.find(&30);
    let forty = map.find(&40);
    let z = map.find(&20).node.unwrap();
    assert_eq!(map.node_ref(z, Node::right), thirty.node.unwrap());

    assert_eq!(map.erase(map.find(&20)), Ok((20, ())));
    map.assert_valid();
    assert_eq!(thirty.key(&map), Ok(&30));
    assert_eq!(forty.key(&map), Ok(&40));
    assert_eq!(map.cursor_walk(), [10, 30, 40]);
}

#[test]
fn erase_with_distant_successor_keeps_cursors() {
    // 20's successor 30 is the left child of 40
    let mut map = TreeMap::new();
    for k in [20, 10, 40, 30, 50] {
        let _ignore = map.insert(k, ());
    }
    let thirty = map.find(&30);
    let forty = map.find(&40);
    assert_eq!(
        map.node_ref(thirty.node.unwrap(), Node::parent),
        forty.node.unwrap()
    );

    assert_eq!(map.erase(map.find(&20)), Ok((20, ())));
    map.assert_valid();
    assert_eq!(thirty.key(&map), Ok(&30));
    assert_eq!(forty.key(&map), Ok(&40));
    assert_eq!(map.root, thirty.node.unwrap());
    assert_eq!(map.cursor_walk(), [10, 30, 40, 50]);
}

#[test]
fn cursor_state_machine() {
    let mut map = TreeMap::new();
    for k in [2, 1, 3] {
        let _ignore = map.insert(k, k);
    }

    let mut cursor = map.begin();
    assert_eq!(cursor.key(&map), Ok(&1));
    assert_eq!(cursor.move_prev(&map), Err(Error::InvalidIterator));
    assert_eq!(cursor.key(&map), Ok(&1));

    cursor.move_next(&map).unwrap();
    cursor.move_next(&map).unwrap();
    assert_eq!(cursor.key(&map), Ok(&3));
    cursor.move_next(&map).unwrap();
    assert!(cursor.is_end());
    assert_eq!(cursor, map.end());
    assert_eq!(cursor.move_next(&map), Err(Error::InvalidIterator));
    assert_eq!(cursor.value(&map), Err(Error::InvalidIterator));

    cursor.move_prev(&map).unwrap();
    assert_eq!(cursor.key(&map), Ok(&3));
    assert_eq!(cursor.preceding(&map).unwrap().key(&map), Ok(&2));
    assert_eq!(cursor.key(&map), Ok(&3));
    assert_eq!(map.begin().following(&map).unwrap().key(&map), Ok(&2));

    let (_, v) = map.find(&2).get_mut(&mut map).unwrap();
    *v = 20;
    assert_eq!(map.get(&2), Some(&20));
}

#[test]
fn foreign_cursor_is_rejected() {
    let mut a = TreeMap::new();
    let mut b = TreeMap::new();
    for k in 0..10 {
        let _ignore = a.insert(k, ());
        let _ignore = b.insert(k, ());
    }
    let from_a = a.find(&5);
    assert_ne!(from_a, b.find(&5));
    assert_ne!(a.end(), b.end());
    assert_eq!(from_a.get(&b), Err(Error::InvalidIterator));
    assert_eq!(b.erase(from_a), Err(Error::InvalidIterator));
    assert_eq!(b.erase(b.end()), Err(Error::InvalidIterator));
    assert_eq!(b.len(), 10);

    let copy = a.clone();
    assert_eq!(from_a.get(&copy), Err(Error::InvalidIterator));
    assert_eq!(copy.find(&5).key(&copy), Ok(&5));
}

#[test]
fn stale_cursor_is_rejected_after_slot_reuse() {
    let mut map = TreeMap::new();
    let (one, _) = map.insert(1, "one");
    let _ignore = map.insert(2, "two");
    assert_eq!(map.erase(one), Ok((1, "one")));
    let (three, _) = map.insert(3, "three");
    // the freed slot was handed to the new element
    assert_eq!(one.node, three.node);
    assert_eq!(one.get(&map), Err(Error::InvalidIterator));
    assert_eq!(map.erase(one), Err(Error::InvalidIterator));
    assert_eq!(three.get(&map), Ok((&3, &"three")));

    map.clear();
    assert_eq!(three.get(&map), Err(Error::InvalidIterator));
    let (again, _) = map.insert(3, "again");
    assert_ne!(again, three);
}

#[test]
fn clone_is_deep_and_isolated() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(100)
            .collect();
        for &k in &keys {
            let _ignore = map.insert(k, k);
        }
        let mut copy = map.clone();
        assert_eq!(copy, map);
        assert_eq!(copy.root, map.root);
        for (a, b) in copy.nodes.iter().zip(map.nodes.iter()) {
            assert_eq!(a.color, b.color);
            assert_eq!((a.left, a.right, a.parent), (b.left, b.right, b.parent));
        }

        for k in keys.iter().take(50) {
            let _ignore = copy.remove(k);
        }
        *copy.get_mut(&keys[60]).unwrap() = -1;
        assert_eq!(map.len(), 100);
        assert_eq!(copy.len(), 50);
        assert_eq!(map.get(&keys[60]), Some(&keys[60]));
        map.check_rb_properties();
        copy.check_rb_properties();
    });
}

#[test]
fn moved_out_map_is_empty() {
    let mut map: TreeMap<i32, i32> = (0..5).map(|k| (k, k)).collect();
    let cursor = map.find(&3);
    let moved = std::mem::take(&mut map);
    assert!(map.is_empty());
    assert_eq!(map.begin(), map.end());
    assert_eq!(cursor.key(&map), Err(Error::InvalidIterator));
    assert_eq!(cursor.key(&moved), Ok(&3));
}

#[test]
fn panicking_comparator_leaves_map_unchanged() {
    let armed = Cell::new(false);
    let cmp = FnCompare(|a: &i32, b: &i32| {
        assert!(!armed.get(), "comparator failure");
        a.cmp(b)
    });
    let mut map = TreeMap::with_comparator(cmp);
    for k in [5, 3, 8, 1, 4] {
        let _ignore = map.insert(k, k);
    }
    let before: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
    let root = map.root;

    armed.set(true);
    let result = panic::catch_unwind(AssertUnwindSafe(|| map.insert(2, 2)));
    assert!(result.is_err());
    let result = panic::catch_unwind(AssertUnwindSafe(|| map.remove(&3)));
    assert!(result.is_err());
    armed.set(false);

    assert_eq!(map.root, root);
    assert_eq!(map.len(), 5);
    let after: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(before, after);
    map.assert_valid();
}

#[test]
fn reverse_comparator_orders_descending() {
    let mut map = TreeMap::with_comparator(Reverse);
    for k in [5, 3, 8, 1, 4, 7, 9, 2, 6, 0] {
        let _ignore = map.insert(k, ());
    }
    map.assert_valid();
    assert_eq!(map.cursor_walk(), (0..=9).rev().collect::<Vec<_>>());
    assert_eq!(map.first_key_value(), Some((&9, &())));
}

#[test]
fn lookups_by_key() {
    let mut map = TreeMap::new();
    let _ignore = map.insert(1, 10);
    let _ignore = map.insert(2, 20);
    assert_eq!(map.at(&1), Ok(&10));
    *map.at_mut(&2).unwrap() += 1;
    assert_eq!(map.get_key_value(&2), Some((&2, &21)));
    assert_eq!(map.at_mut(&3), Err(Error::KeyNotFound));
    assert!(map.contains_key(&1));
    assert!(!map.contains_key(&3));

    *map.get_or_insert_default(3) += 5;
    *map.get_or_insert_default(1) += 5;
    assert_eq!(map.get(&3), Some(&5));
    assert_eq!(map.get(&1), Some(&15));

    assert_eq!(map.insert_or_update(3, 30), Some(5));
    assert_eq!(map.remove_entry(&3), Some((3, 30)));
    assert_eq!(map.len(), 2);
}

#[test]
fn entry_api_is_ok() {
    let mut map = TreeMap::new();
    match map.entry(1) {
        Entry::Vacant(entry) => {
            assert_eq!(entry.key(), &1);
            *entry.insert(10) += 1;
        }
        Entry::Occupied(_) => unreachable!(),
    }
    assert_eq!(map.get(&1), Some(&11));

    match map.entry(1) {
        Entry::Occupied(mut entry) => {
            assert_eq!(entry.key(), &1);
            assert_eq!(entry.insert(12), 11);
            assert_eq!(entry.get(), &12);
            let cursor = entry.cursor();
            assert_eq!(cursor.key(&map), Ok(&1));
        }
        Entry::Vacant(_) => unreachable!(),
    }

    assert_eq!(*map.entry(2).or_insert_with_key(|k| k * 100), 200);
    assert_eq!(*map.entry(2).or_insert_with(|| 0), 200);
    map.entry(2).and_modify(|v| *v += 1).or_insert(0);
    assert_eq!(map.get(&2), Some(&201));
    assert_eq!(*map.entry(3).or_default(), 0);
    assert_eq!(map.entry(4).key(), &4);

    if let Entry::Occupied(entry) = map.entry(1) {
        assert_eq!(entry.remove_entry(), (1, 12));
    }
    if let Entry::Vacant(entry) = map.entry(1) {
        assert_eq!(entry.into_key(), 1);
    }
    if let Entry::Occupied(entry) = map.entry(2) {
        assert_eq!(entry.remove(), 201);
    }
    assert_eq!(map.len(), 1);
    map.assert_valid();
}

#[test]
fn ends_and_retain() {
    with_map_and_generator(|mut map, mut gen| {
        let mut keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(200)
            .collect();
        for &k in &keys {
            let _ignore = map.insert(k, k);
        }
        keys.sort_unstable();

        assert_eq!(map.first_key_value(), Some((&keys[0], &keys[0])));
        assert_eq!(map.last_key_value(), Some((&keys[199], &keys[199])));
        assert_eq!(map.pop_first(), Some((keys[0], keys[0])));
        assert_eq!(map.pop_last(), Some((keys[199], keys[199])));
        map.assert_valid();

        map.retain(|k, v| {
            *v += 1;
            k % 2 == 0
        });
        map.check_rb_properties();
        map.assert_valid();
        let expected: Vec<_> = keys[1..199]
            .iter()
            .filter(|k| *k % 2 == 0)
            .map(|k| (*k, k + 1))
            .collect();
        let actual: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(actual, expected);
    });
}

#[test]
fn owning_and_mutable_iterators() {
    let mut map: TreeMap<i32, i32> = [(3, 30), (1, 10), (2, 20), (1, 11)].into_iter().collect();
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&1), Some(&11));

    for (_, v) in &mut map {
        *v += 1;
    }
    for v in map.values_mut() {
        *v *= 2;
    }
    assert_eq!(map.values().copied().collect::<Vec<_>>(), [24, 42, 62]);
    assert_eq!(map.iter_mut().next_back().map(|(k, _)| *k), Some(3));

    map.extend([(4, 0), (1, 0)]);
    assert_eq!(map.get(&1), Some(&0));

    let mut iter = map.clone().into_iter();
    assert_eq!(iter.len(), 4);
    assert_eq!(iter.next(), Some((1, 0)));
    assert_eq!(iter.next_back(), Some((4, 0)));
    assert_eq!(iter.collect::<Vec<_>>(), [(2, 42), (3, 62)]);

    assert_eq!(map.clone().into_keys().collect::<Vec<_>>(), [1, 2, 3, 4]);
    assert_eq!(map.into_values().rev().collect::<Vec<_>>(), [0, 62, 42, 0]);
}

#[test]
fn iter_mut_walks_lazily_from_both_ends() {
    let mut map: TreeMap<i32, i32> = (0..64).map(|k| (k, k)).collect();
    for k in (0..64).filter(|k| k % 3 == 0) {
        let _ignore = map.remove(&k);
    }
    // freed slots are reused out of key order
    for k in [100, -100, 50] {
        let _ignore = map.insert(k, k);
    }
    let expected = map.keys().copied().collect::<Vec<_>>();

    let mut iter = map.iter_mut();
    let mut front = vec![];
    let mut back = vec![];
    let mut left = expected.len();
    loop {
        assert_eq!(iter.len(), left);
        let item = if left % 2 == 0 {
            iter.next().map(|entry| (true, entry))
        } else {
            iter.next_back().map(|entry| (false, entry))
        };
        let Some((from_front, (k, v))) = item else {
            break;
        };
        *v = -*v;
        if from_front {
            front.push(*k);
        } else {
            back.push(*k);
        }
        left -= 1;
    }
    assert_eq!(left, 0);
    assert!(iter.next().is_none());
    assert!(iter.next_back().is_none());

    back.reverse();
    front.extend(back);
    assert_eq!(front, expected);
    assert!(map.iter().all(|(k, v)| *v == -*k));
    map.assert_valid();

    let mut empty: TreeMap<i32, i32> = TreeMap::new();
    assert_eq!(empty.iter_mut().len(), 0);
    assert!(empty.values_mut().next_back().is_none());
}

#[test]
fn entry_api_groups_values_on_reverse_map() {
    let counts: TreeMap<&str, usize> = [("fox", 2), ("dog", 2), ("the", 4), ("cat", 1)]
        .into_iter()
        .collect();
    let mut ranking: TreeMap<usize, Vec<&str>, Reverse> = TreeMap::with_comparator(Reverse);
    for (word, count) in counts.iter() {
        match ranking.entry(*count) {
            Entry::Occupied(mut entry) => entry.get_mut().push(*word),
            Entry::Vacant(entry) => {
                let _ignore = entry.insert(vec![*word]);
            }
        }
    }
    assert_eq!(ranking.keys().copied().collect::<Vec<_>>(), [4, 2, 1]);
    assert_eq!(ranking.first_key_value(), Some((&4, &vec!["the"])));
    assert_eq!(ranking.get(&2).map(Vec::as_slice), Some(["dog", "fox"].as_slice()));
    ranking.assert_valid();
}

#[test]
fn equality_ignores_tree_shape() {
    let ascending: TreeMap<i32, ()> = (0..32).map(|k| (k, ())).collect();
    let descending: TreeMap<i32, ()> = (0..32).rev().map(|k| (k, ())).collect();
    assert_eq!(ascending, descending);
    assert_eq!(format!("{ascending:?}"), format!("{descending:?}"));
    let mut shorter = descending.clone();
    let _ignore = shorter.pop_last();
    assert_ne!(ascending, shorter);
}

#[test]
fn comparator_is_consulted_for_equivalence() {
    let calls = Cell::new(0);
    let cmp = FnCompare(|a: &i32, b: &i32| {
        calls.set(calls.get() + 1);
        (a / 10).cmp(&(b / 10))
    });
    let mut map = TreeMap::with_comparator(cmp);
    let _ignore = map.insert(11, "a");
    let (_, inserted) = map.insert(15, "b");
    assert!(!inserted);
    assert_eq!(map.get(&19), Some(&"a"));
    assert!(calls.get() > 0);
    assert_eq!(map.comparator().compare(&1, &9), Ordering::Equal);
}

#[test]
fn tree_map_clear_keeps_working() {
    let mut map = TreeMap::with_capacity(16);
    for k in 0..16 {
        let _ignore = map.insert(k, ());
    }
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.nodes.len(), 1);
    for k in (0..16).rev() {
        let _ignore = map.insert(k, ());
    }
    map.check_rb_properties();
    assert_eq!(map.cursor_walk(), (0..16).collect::<Vec<_>>());
}

#[test]
#[should_panic(expected = "Reached maximum number of nodes")]
fn small_index_overflows() {
    let mut map: TreeMap<u32, (), Natural, u16> =
        TreeMap::with_capacity_and_comparator(0, Natural);
    for k in 0..=u32::from(u16::MAX) {
        let _ignore = map.insert(k, ());
    }
}

#[cfg(feature = "graphviz")]
#[test]
fn tree_map_draw_is_ok() {
    let mut map = TreeMap::new();
    for k in [16, 8, 0, 5, 6, 15, 17, 25, 26, 19] {
        let _ignore = map.insert(k, k * 2);
    }
    let dot = map.dot();
    assert!(dot.starts_with("digraph {"));
    assert_eq!(dot.matches("label=\"left\"").count() + dot.matches("label=\"right\"").count(), 9);

    let path = std::env::temp_dir().join("rb_tree_map_draw.dot");
    map.draw(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), dot);
    map.draw_without_value(&path).unwrap();
    let without_value = std::fs::read_to_string(&path).unwrap();
    assert!(without_value.contains(r#"[label="16", color="#));
    let _ignore = std::fs::remove_file(path);
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_tree_map() {
    use serde_json::{json, Value};

    let mut map = TreeMap::<i32, i32>::new();
    let _ignore = map.insert(3, 30);
    let _ignore = map.insert(1, 10);
    let _ignore = map.insert(2, 20);

    let serialized = serde_json::to_string(&map).unwrap();
    assert_eq!(serialized, r#"{"1":10,"2":20,"3":30}"#);
    let actual: Value = serde_json::from_str(&serialized).unwrap();
    assert_eq!(actual, json!({"1": 10, "2": 20, "3": 30}));

    let deserialized: TreeMap<i32, i32> = serde_json::from_str(&serialized).unwrap();
    assert_eq!(deserialized, map);
    deserialized.assert_valid();

    let reversed: TreeMap<i32, i32, Reverse> = serde_json::from_str(&serialized).unwrap();
    assert_eq!(reversed.keys().copied().collect::<Vec<_>>(), [3, 2, 1]);

    let duplicated: TreeMap<String, i32> = serde_json::from_str(r#"{"a":1,"a":2}"#).unwrap();
    assert_eq!(duplicated.get(&"a".to_string()), Some(&2));
}
