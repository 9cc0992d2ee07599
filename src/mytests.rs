use crate::{BTree, Error, RefBTree, DEFAULT_DEGREE};
use proptest::prelude::*;
use std::cell::RefCell;
use std::cmp::Ordering;

fn degree2() -> BTree<i32, String> {
    BTree::new(2).unwrap()
}

fn insert_seq(t: &mut BTree<i32, String>, keys: impl IntoIterator<Item = i32>) {
    for k in keys {
        assert_eq!(t.insert(k, k.to_string()), (None, false));
        t.check();
    }
}

fn values(t: &BTree<i32, String>) -> Vec<String> {
    let mut result = Vec::new();
    t.traverse(|v| result.push(v.clone()));
    result
}

#[test]
fn create_test() {
    assert_eq!(
        BTree::<i32, i32>::new(0).err(),
        Some(Error::InvalidDegree(0))
    );
    assert_eq!(
        BTree::<i32, i32>::new(1).err(),
        Some(Error::InvalidDegree(1))
    );
    assert_eq!(
        BTree::<i32, i32>::new(usize::MAX).err(),
        Some(Error::DegreeOverflow(usize::MAX))
    );
    let t = BTree::<i32, i32>::new(2).unwrap();
    assert_eq!(t.size(), 0);
    assert_eq!(t.height(), 0);
    assert_eq!(t.degree(), 2);
    assert_eq!(t.depth(), 1);
    assert!(t.is_empty());
    t.check();

    let d = BTree::<i32, i32>::default();
    assert_eq!(d.degree(), DEFAULT_DEGREE);
}

#[test]
fn insert_one_key_test() {
    let mut t = degree2();
    insert_seq(&mut t, [1]);
    assert_eq!(t.size(), 1);
    assert_eq!(t.height(), 0);
    assert_eq!(values(&t), ["1"]);
}

#[test]
fn insert_10_keys_test() {
    let mut t = degree2();
    insert_seq(&mut t, 0..10);
    assert_eq!(t.size(), 10);
    assert_eq!(t.height(), 2);
    let expect: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    assert_eq!(values(&t), expect);
}

#[test]
fn insert_10_keys_reverse_test() {
    let mut t = degree2();
    insert_seq(&mut t, (0..10).rev());
    assert_eq!(t.size(), 10);
    assert_eq!(t.height(), 2);
    let expect: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    assert_eq!(values(&t), expect);
}

#[test]
fn height_counts_root_splits_test() {
    let mut t = degree2();
    insert_seq(&mut t, 1..=3);
    // Root holds 2t - 1 = 3 pairs, not yet split.
    assert_eq!(t.height(), 0);
    insert_seq(&mut t, [4]);
    assert_eq!(t.height(), 1);
    // Splits below the root do not count.
    insert_seq(&mut t, 5..=7);
    assert_eq!(t.height(), 1);
    insert_seq(&mut t, [8, 9]);
    assert_eq!(t.height(), 2);
}

#[test]
fn height_and_depth_test() {
    for degree in 2..6 {
        let mut t = BTree::new(degree).unwrap();
        for i in 0..2000 {
            t.insert(i, i);
            assert_eq!(t.depth(), t.height() + 1);
        }
        t.check();
    }
}

#[test]
fn insert_duplicate_test() {
    let mut t = BTree::new(2).unwrap();
    assert_eq!(t.insert(1, "first val"), (None, false));
    assert_eq!(t.insert(1, "second val"), (Some("first val"), true));
    assert_eq!(t.size(), 1);
    assert_eq!(t.search(&1), Some(&"second val"));
}

#[test]
fn split_median_duplicate_test() {
    let mut t = degree2();
    insert_seq(&mut t, 1..=7);
    t.insert(8, "8v1".to_string());
    insert_seq(&mut t, 9..=12);
    assert_eq!(t.height(), 2);
    // 8 is now the median of the full internal node [6, 8, 10] below the root.
    assert_eq!(
        t.insert(8, "8v2".to_string()),
        (Some("8v1".to_string()), true)
    );
    t.check();
    assert_eq!(t.size(), 12);
    assert_eq!(t.search(&8).map(String::as_str), Some("8v2"));
}

#[test]
fn split_non_leaf_duplicate_test() {
    let mut t = degree2();
    insert_seq(&mut t, 1..=5);
    t.insert(6, "6v1".to_string());
    insert_seq(&mut t, 7..=11);
    assert_eq!(
        t.insert(6, "6v2".to_string()),
        (Some("6v1".to_string()), true)
    );
    t.check();
    assert_eq!(t.size(), 11);
}

#[test]
fn split_root_duplicate_test() {
    let mut t = degree2();
    insert_seq(&mut t, 1..=3);
    t.insert(4, "4v1".to_string());
    insert_seq(&mut t, 5..=8);
    assert_eq!(t.height(), 1);
    // Root is full, the insert splits it and promotes 4.
    assert_eq!(
        t.insert(4, "4v2".to_string()),
        (Some("4v1".to_string()), true)
    );
    t.check();
    assert_eq!(t.height(), 2);
    assert_eq!(t.size(), 8);
}

#[test]
fn split_leaf_duplicate_test() {
    let mut t = degree2();
    insert_seq(&mut t, 1..=5);
    // Leaf [3, 4, 5] is full, splitting it promotes 4.
    assert_eq!(t.insert(4, "four".to_string()), (Some("4".to_string()), true));
    t.check();
    assert_eq!(t.size(), 5);
    assert_eq!(t.height(), 1);
    assert_eq!(t.search(&4).map(String::as_str), Some("four"));
}

#[test]
fn first_root_split_duplicate_test() {
    let mut t = degree2();
    insert_seq(&mut t, 1..=3);
    assert_eq!(t.insert(2, "two".to_string()), (Some("2".to_string()), true));
    t.check();
    assert_eq!(t.size(), 3);
    assert_eq!(t.height(), 1);
    assert_eq!(values(&t), ["1", "two", "3"]);
}

#[test]
fn search_test() {
    let mut t = degree2();
    assert_eq!(t.search(&1), None);
    for i in (0..200).map(|i| (i * 37) % 200) {
        t.insert(i, i.to_string());
        assert_eq!(t.search(&i), Some(&i.to_string()));
    }
    assert_eq!(t.search(&-1), None);
    assert_eq!(t.search(&200), None);
    assert!(t.contains_key(&150));
    assert_eq!(t.get_key_value(&7), Some((&7, &"7".to_string())));
}

#[test]
fn search_mut_test() {
    let mut t = BTree::new(3).unwrap();
    for i in 0..100 {
        t.insert(i, i);
    }
    for i in 0..100 {
        *t.search_mut(&i).unwrap() *= 2;
    }
    assert!(t.search_mut(&100).is_none());
    for (k, v) in t.iter() {
        assert_eq!(*v, *k * 2);
    }
}

#[test]
fn traverse_idempotent_test() {
    let mut t = degree2();
    insert_seq(&mut t, (0..50).rev());
    let first = values(&t);
    for _rep in 0..10 {
        assert_eq!(values(&t), first);
    }
}

#[test]
fn walk_stops_early_test() {
    let t: BTree<i32, i32> = (0..1000).map(|i| (i, i)).collect();
    let mut seen = Vec::new();
    assert!(t.walk(|k, _v| {
        seen.push(*k);
        *k == 9
    }));
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
    assert!(!t.walk(|_k, _v| false));
}

#[test]
fn iter_test() {
    for degree in [2, 3, 7, 13] {
        let mut t = BTree::new(degree).unwrap();
        let n = 5000;
        for i in (0..n).rev() {
            t.insert(i, i);
        }
        let it = t.iter();
        assert_eq!(it.len(), n);
        let mut expect = 0;
        for (k, v) in it {
            assert_eq!((*k, *v), (expect, expect));
            expect += 1;
        }
        assert_eq!(expect, n);
        assert!(t.keys().copied().eq(0..n));
        assert_eq!(t.values().len(), n);
        assert_eq!((&t).into_iter().count(), n);
    }
}

#[test]
fn clear_test() {
    let mut t = degree2();
    insert_seq(&mut t, 0..20);
    t.clear();
    assert_eq!(t.size(), 0);
    assert_eq!(t.height(), 0);
    assert_eq!(t.degree(), 2);
    assert_eq!(t.search(&3), None);
    t.check();
    insert_seq(&mut t, 0..5);
    assert_eq!(t.size(), 5);
}

#[test]
fn comparator_test() {
    let mut t = BTree::with_comparator(2, |a: &i32, b: &i32| b.cmp(a)).unwrap();
    for i in 0..100 {
        t.insert(i, i);
    }
    t.check();
    assert!(t.keys().copied().eq((0..100).rev()));

    // Case-insensitive keys collapse to one entry.
    let mut t = BTree::with_comparator(2, |a: &String, b: &String| {
        a.to_lowercase().cmp(&b.to_lowercase())
    })
    .unwrap();
    t.insert("Key".to_string(), 1);
    assert_eq!(t.insert("KEY".to_string(), 2), (Some(1), true));
    assert_eq!(t.size(), 1);
    assert_eq!(t.get_key_value(&"key".to_string()), Some((&"Key".to_string(), &2)));
}

#[test]
fn clone_test() {
    let mut t = degree2();
    insert_seq(&mut t, 0..30);
    let mut c = t.clone();
    c.check();
    c.insert(100, "100".to_string());
    *c.search_mut(&0).unwrap() = "zero".to_string();
    assert_eq!(t.size(), 30);
    assert_eq!(c.size(), 31);
    assert_eq!(t.search(&0).map(String::as_str), Some("0"));
    assert_eq!(t.height(), c.height());
}

#[test]
fn debug_test() {
    let t: BTree<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
    assert_eq!(format!("{:?}", t), r#"{1: "a", 2: "b"}"#);
}

#[test]
fn ref_mode_test() {
    let cells: Vec<RefCell<String>> = (0..20).map(|i| RefCell::new(i.to_string())).collect();
    let mut t: RefBTree<'_, usize, RefCell<String>> = RefBTree::new(2).unwrap();
    for (i, c) in cells.iter().enumerate() {
        t.insert(i, c);
    }
    cells[5].borrow_mut().push('!');
    assert_eq!(t.search(&5).unwrap().borrow().as_str(), "5!");
    let (old, found) = t.insert(5, &cells[6]);
    assert!(found);
    assert!(std::ptr::eq(old.unwrap(), &cells[5]));
    t.check();
}

/// Deterministic xorshift sequence, so failures reproduce.
fn xorshift(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

#[test]
fn random_vs_std_test() {
    let mut state = 0x2545_f491_4f6c_dd1d;
    for degree in [2, 3, 4, 13, 40] {
        let mut t = BTree::new(degree).unwrap();
        let mut m = std::collections::BTreeMap::new();
        for _ in 0..20000 {
            let k = xorshift(&mut state) % 5000;
            let v = xorshift(&mut state);
            let (old, found) = t.insert(k, v);
            let expect = m.insert(k, v);
            assert_eq!(old, expect);
            assert_eq!(found, expect.is_some());
        }
        t.check();
        assert_eq!(t.size(), m.len());
        assert!(t.iter().eq(m.iter()));
    }
}

#[cfg(feature = "tracing")]
#[test]
fn tracing_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("degree_btree=trace")
        .with_test_writer()
        .try_init();
    let mut t = degree2();
    insert_seq(&mut t, 0..10);
    assert!(t.insert(3, "three".to_string()).1);
}

proptest! {
    #[test]
    fn prop_matches_std(
        degree in 2usize..8,
        pairs in prop::collection::vec((0u16..300, any::<u32>()), 0..400),
    ) {
        let mut t = BTree::new(degree).unwrap();
        let mut m = std::collections::BTreeMap::new();
        for (k, v) in pairs {
            let (old, found) = t.insert(k, v);
            let expect = m.insert(k, v);
            prop_assert_eq!(old, expect);
            prop_assert_eq!(found, expect.is_some());
        }
        t.check();
        prop_assert_eq!(t.size(), m.len());
        prop_assert!(t.iter().eq(m.iter()));
        for k in 0u16..300 {
            prop_assert_eq!(t.search(&k), m.get(&k));
        }
    }

    #[test]
    fn prop_traverse_sorted_distinct(
        degree in 2usize..6,
        keys in prop::collection::vec(any::<i64>(), 0..300),
    ) {
        let mut t = BTree::new(degree).unwrap();
        for k in &keys {
            t.insert(*k, *k);
        }
        let mut seen = Vec::new();
        t.traverse(|v| seen.push(*v));
        prop_assert!(seen.windows(2).all(|w| w[0].cmp(&w[1]) == Ordering::Less));
        let mut expect = keys.clone();
        expect.sort_unstable();
        expect.dedup();
        prop_assert_eq!(seen, expect);
    }

    #[test]
    fn prop_reinsert_keeps_size(
        degree in 2usize..6,
        keys in prop::collection::hash_set(any::<u16>(), 1..200),
    ) {
        let mut t = BTree::new(degree).unwrap();
        for k in &keys {
            t.insert(*k, 0u8);
        }
        let n = t.size();
        let height = t.height();
        prop_assert_eq!(n, keys.len());
        for k in &keys {
            prop_assert_eq!(t.insert(*k, 1u8), (Some(0u8), true));
            // Re-inserting can split full nodes on the way down, but never adds a pair.
            prop_assert_eq!(t.size(), n);
        }
        prop_assert!(t.height() >= height);
        t.check();
        prop_assert!(t.values().all(|v| *v == 1));
    }
}
