use rb_tree_map::{Entry, Reverse, TreeMap};

const TEXT: &str = "the quick brown fox jumps over the lazy dog \
                    the dog barks and the fox runs";

fn main() {
    let mut counts: TreeMap<&str, usize> = TreeMap::new();
    for word in TEXT.split_whitespace() {
        *counts.get_or_insert_default(word) += 1;
    }
    for (word, count) in &counts {
        println!("{word:>6} {count}");
    }

    // rank words by count, largest first, ties in word order
    let mut ranking: TreeMap<usize, Vec<&str>, Reverse> = TreeMap::with_comparator(Reverse);
    for (word, count) in counts.iter() {
        match ranking.entry(*count) {
            Entry::Occupied(mut entry) => entry.get_mut().push(*word),
            Entry::Vacant(entry) => {
                let _ignore = entry.insert(vec![*word]);
            }
        }
    }
    let Some((top, words)) = ranking.first_key_value() else {
        return;
    };
    println!("most frequent ({top}): {}", words.join(", "));
    assert_eq!(words.as_slice(), ["the"]);

    counts.retain(|_, count| *count > 1);
    assert_eq!(counts.keys().copied().collect::<Vec<_>>(), ["dog", "fox", "the"]);
}
