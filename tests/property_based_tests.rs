mod common;

use chrono::{Duration, TimeZone, Utc};
use common::strategies::*;
use proptest::prelude::*;
use uuid::Uuid;

use shigu_core::models::OrderedItem;
use shigu_core::sequencing::rebalancer::{plan_window, WindowSide};
use shigu_core::sequencing::{is_strictly_ordered, sort_items, KeyAllocator};

fn items_from_keys(keys: &[i64]) -> Vec<OrderedItem> {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    keys.iter()
        .enumerate()
        .map(|(i, key)| OrderedItem::new(Uuid::new_v4(), *key, base + Duration::seconds(i as i64)))
        .collect()
}

proptest! {
    /// Property: an allocated key always sorts strictly between its neighbours
    #[test]
    fn allocated_keys_fall_strictly_between((prev, next) in boundary_strategy()) {
        let allocator = KeyAllocator::default();
        match allocator.compute_between(prev, next) {
            Some(key) => {
                if let Some(prev) = prev {
                    prop_assert!(prev < key);
                }
                if let Some(next) = next {
                    prop_assert!(key < next);
                }
            }
            None => {
                // only a missing gap or the edge of the key space refuses
                let gap_missing = matches!((prev, next), (Some(p), Some(n)) if i128::from(n) - i128::from(p) < 2);
                let at_edge = matches!((prev, next), (Some(p), None) if p > i64::MAX - 1000)
                    || matches!((prev, next), (None, Some(n)) if n < i64::MIN + 1000);
                prop_assert!(gap_missing || at_edge);
            }
        }
    }

    /// Property: sorting yields a strict total order even with duplicate keys
    #[test]
    fn sorting_is_strict_with_duplicate_keys(keys in prop::collection::vec(-5i64..5, 1..40)) {
        let mut items = items_from_keys(&keys);
        sort_items(&mut items);
        prop_assert!(is_strictly_ordered(&items));
    }

    /// Property: a window plan never reorders the rows it re-keys
    #[test]
    fn window_plans_preserve_relative_order(keys in key_run_strategy(30), pick in any::<prop::sample::Index>()) {
        let items = items_from_keys(&keys);
        let center_at = pick.index(items.len());
        let center = items[center_at].clone();
        let before: Vec<OrderedItem> = items[..center_at].iter().rev().cloned().collect();
        let after: Vec<OrderedItem> = items[center_at + 1..].to_vec();

        let plan = plan_window(
            WindowSide { items: &before, outer_key: None },
            &center,
            WindowSide { items: &after, outer_key: None },
            1000,
        )
        .expect("keys stay far from the i64 edges");

        let mut rekeyed = items.clone();
        for (id, key) in &plan.updates {
            if let Some(item) = rekeyed.iter_mut().find(|item| item.id == *id) {
                item.sort_order = *key;
            }
        }
        let original_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        sort_items(&mut rekeyed);
        let rekeyed_ids: Vec<Uuid> = rekeyed.iter().map(|item| item.id).collect();

        prop_assert_eq!(original_ids, rekeyed_ids);
        prop_assert!(plan.updates.len() < items.len());
    }
}
