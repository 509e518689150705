//! Proptest strategies for key spaces.

use proptest::prelude::*;

/// A sorted list of distinct keys with arbitrary gaps, some of them zero-width
pub fn key_run_strategy(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::btree_set(-50_000i64..50_000, 2..max_len)
        .prop_map(|keys| keys.into_iter().collect())
}

/// Pairs of optional neighbour keys with `prev < next` when both exist
pub fn boundary_strategy() -> impl Strategy<Value = (Option<i64>, Option<i64>)> {
    prop_oneof![
        (any::<i64>(), any::<i64>()).prop_map(|(a, b)| {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            (Some(lo), Some(hi))
        }),
        any::<i64>().prop_map(|a| (Some(a), None)),
        any::<i64>().prop_map(|b| (None, Some(b))),
        Just((None, None)),
    ]
}
