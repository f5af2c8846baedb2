use std::collections::BTreeMap;
use std::ops::Bound;

use proptest::prelude::*;

use ksl_tree::{KeyRange, KslMap, RangeCompare, RangeExclusiveCompare};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Keys drawn from a range small enough to force collisions and reuse.
fn key_strategy() -> impl Strategy<Value = i64> {
    -2_000i64..2_000
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i64, i64),
    Remove(i64),
    Get(i64),
    ContainsKey(i64),
    LowerBound(i64),
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        3 => key_strategy().prop_map(MapOp::Remove),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::ContainsKey),
        2 => key_strategy().prop_map(MapOp::LowerBound),
    ]
}

// ─── Model cross-checks against std's BTreeMap ───────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random sequence of operations on both KslMap and BTreeMap
    /// and asserts identical results at every step. KslMap requires distinct
    /// keys and present keys for removal, so the harness gates on the model.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
        let mut ksl: KslMap<i64, i64> = KslMap::new();
        let mut model: BTreeMap<i64, i64> = BTreeMap::new();

        for op in &ops {
            match *op {
                MapOp::Insert(k, v) => {
                    if model.contains_key(&k) {
                        continue;
                    }
                    let it = ksl.insert(k, v).unwrap();
                    prop_assert_eq!(*it.key(), k, "insert cursor key");
                    prop_assert_eq!(*it.value(), v, "insert cursor value");
                    model.insert(k, v);
                }
                MapOp::Remove(k) => {
                    let Some(expected) = model.remove(&k) else {
                        continue;
                    };
                    let (removed, successor) = ksl.remove(&k);
                    prop_assert_eq!(removed, expected, "remove({})", k);
                    match model.range((Bound::Excluded(k), Bound::Unbounded)).next() {
                        Some((&succ, _)) => prop_assert_eq!(*successor.key(), succ, "successor of {}", k),
                        None => prop_assert!(successor.at_end(), "successor of {} should be end", k),
                    }
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(ksl.get(&k), model.get(&k), "get({})", k);
                }
                MapOp::ContainsKey(k) => {
                    prop_assert_eq!(ksl.contains_key(&k), model.contains_key(&k), "contains_key({})", k);
                }
                MapOp::LowerBound(k) => {
                    let it = ksl.lower_bound(&k);
                    match model.range(k..).next() {
                        Some((&expected, v)) => {
                            prop_assert_eq!(*it.key(), expected, "lower_bound({})", k);
                            prop_assert_eq!(it.value(), v, "lower_bound({}) value", k);
                        }
                        None => prop_assert!(it.at_end(), "lower_bound({}) should be end", k),
                    }
                }
            }
            prop_assert_eq!(ksl.len(), model.len(), "len mismatch after {:?}", op);
        }
    }

    /// Iteration order and content must match BTreeMap in both directions.
    #[test]
    fn iter_matches_btreemap(entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE)) {
        let mut ksl: KslMap<i64, i64> = KslMap::new();
        let mut model: BTreeMap<i64, i64> = BTreeMap::new();

        for &(k, v) in &entries {
            if !model.contains_key(&k) {
                ksl.insert(k, v).unwrap();
                model.insert(k, v);
            }
        }

        let forward: Vec<(i64, i64)> = ksl.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(i64, i64)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(forward, expected);

        let backward: Vec<i64> = ksl.iter().rev().map(|(k, _)| *k).collect();
        let expected: Vec<i64> = model.keys().rev().copied().collect();
        prop_assert_eq!(backward, expected);
    }

    /// Inserting a set of distinct keys in any order and removing them in any
    /// other order must drain the map completely.
    #[test]
    fn insert_remove_round_trip(insert_seed in any::<u64>(), remove_seed in any::<u64>()) {
        let mut insert_order: Vec<i64> = (0..500).collect();
        shuffle(&mut insert_order, insert_seed);
        let mut remove_order = insert_order.clone();
        shuffle(&mut remove_order, remove_seed);

        let mut ksl: KslMap<i64, i64> = KslMap::new();
        for &k in &insert_order {
            ksl.insert(k, !k).unwrap();
        }
        prop_assert_eq!(ksl.len(), insert_order.len());

        for &k in &remove_order {
            let (value, _) = ksl.remove(&k);
            prop_assert_eq!(value, !k);
        }
        prop_assert_eq!(ksl.len(), 0);
        prop_assert!(ksl.begin().at_end());
    }
}

/// Deterministic Fisher-Yates driven by a splitmix-style generator.
fn shuffle(keys: &mut [i64], seed: u64) {
    let mut state = seed | 1;
    for i in (1..keys.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        #[allow(clippy::cast_possible_truncation)]
        keys.swap(i, (state >> 33) as usize % (i + 1));
    }
}

// ─── Range keys: the comparators shipped for the HTTP/3 layers ───────────────

#[test]
fn disjoint_ranges_order_by_begin() {
    let mut acked: KslMap<KeyRange, u64, RangeCompare> = KslMap::with_compar(RangeCompare);
    acked.insert(KeyRange::new(20, 30), 3).unwrap();
    acked.insert(KeyRange::new(0, 10), 1).unwrap();
    acked.insert(KeyRange::new(10, 20), 2).unwrap();

    let begins: Vec<u64> = acked.iter().map(|(r, _)| r.begin).collect();
    assert_eq!(begins, [0, 10, 20]);
}

#[test]
fn exclusive_probe_finds_the_covering_range() {
    let mut acked: KslMap<KeyRange, u64, RangeCompare> = KslMap::with_compar(RangeCompare);
    acked.insert(KeyRange::new(0, 10), 1).unwrap();
    acked.insert(KeyRange::new(10, 20), 2).unwrap();
    acked.insert(KeyRange::new(20, 30), 3).unwrap();

    for offset in 0..30 {
        let probe = KeyRange::new(offset, offset + 1);
        let it = acked.lower_bound_by(&probe, &RangeExclusiveCompare);
        let covering = it.key();
        assert!(
            covering.begin <= offset && offset < covering.end,
            "offset {offset} resolved to [{}, {})",
            covering.begin,
            covering.end
        );
    }

    let it = acked.lower_bound_by(&KeyRange::new(30, 31), &RangeExclusiveCompare);
    assert!(it.at_end());
}

#[test]
fn update_key_extends_a_stored_range() {
    let mut acked: KslMap<KeyRange, u64, RangeCompare> = KslMap::with_compar(RangeCompare);
    for begin in (0..200).step_by(10) {
        acked.insert(KeyRange::new(begin, begin + 10), begin).unwrap();
    }

    // Growing a range's end keeps its begin, so the order is unchanged.
    acked.update_key(&KeyRange::new(50, 51), KeyRange::new(50, 58));
    let it = acked.lower_bound(&KeyRange::new(50, 50));
    assert_eq!(*it.key(), KeyRange::new(50, 58));
    assert_eq!(*it.value(), 50);
    assert_eq!(acked.len(), 20);
}

// ─── Lower-bound stability across order-preserving key updates ───────────────

#[test]
fn lower_bound_is_stable_across_order_preserving_updates() {
    let mut ksl: KslMap<i64, i64> = (0..200).map(|k| (k * 10, k)).collect();
    let mut model: BTreeMap<i64, i64> = (0..200).map(|k| (k * 10, k)).collect();

    // Nudge every key within its decade; relative order never changes.
    for k in 0..200 {
        let old = k * 10;
        let new = old + (k % 7);
        if new != old {
            ksl.update_key(&old, new);
            let v = model.remove(&old).unwrap();
            model.insert(new, v);
        }
    }

    for probe in -5..2_005 {
        let it = ksl.lower_bound(&probe);
        match model.range(probe..).next() {
            Some((&expected, _)) => assert_eq!(*it.key(), expected, "lower_bound({probe})"),
            None => assert!(it.at_end(), "lower_bound({probe}) should be end"),
        }
    }
}

// ─── Cursor semantics after mutations ────────────────────────────────────────

#[test]
fn remove_cursor_resumes_a_drain() {
    // Removing through the returned cursor's key drains in order, the way a
    // stack retires acknowledged ranges.
    let mut ksl: KslMap<i64, i64> = (0..100).map(|k| (k, k)).collect();

    let mut next_key = Some(0);
    let mut drained = Vec::new();
    while let Some(key) = next_key {
        drained.push(key);
        let (_, successor) = ksl.remove(&key);
        next_key = if successor.at_end() { None } else { Some(*successor.key()) };
    }

    assert_eq!(drained, (0..100).collect::<Vec<_>>());
    assert!(ksl.is_empty());
}

#[test]
fn clear_then_reuse() {
    let mut ksl: KslMap<i64, i64> = (0..300).map(|k| (k, k)).collect();
    ksl.clear();
    assert!(ksl.is_empty());
    assert!(ksl.begin().at_end());

    ksl.insert(42, 1).unwrap();
    assert_eq!(ksl.len(), 1);
    assert_eq!(*ksl.begin().key(), 42);
}
