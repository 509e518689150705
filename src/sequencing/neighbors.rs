//! # Neighbor Resolver
//!
//! Finds the closest items on either side of a reference item inside the
//! transaction's scope. The query itself belongs to the store (one indexed
//! range scan); this module owns the direction semantics.

use std::cmp::Ordering;

use uuid::Uuid;

use super::errors::SequenceResult;
use super::key_space::compare;
use crate::models::OrderedItem;
use crate::store::SequenceTx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Items sorting strictly before the reference, nearest first
    Previous,
    /// Items sorting strictly after the reference, nearest first
    Next,
}

impl Direction {
    /// Whether `candidate` lies strictly on this side of `reference`
    pub fn contains(&self, candidate: &OrderedItem, reference: &OrderedItem) -> bool {
        let ordering = compare(candidate, reference);
        match self {
            Direction::Previous => ordering == Ordering::Less,
            Direction::Next => ordering == Ordering::Greater,
        }
    }

    /// Ordering that puts the nearest candidate first
    pub fn nearest_first(&self, a: &OrderedItem, b: &OrderedItem) -> Ordering {
        match self {
            Direction::Previous => compare(b, a),
            Direction::Next => compare(a, b),
        }
    }
}

/// Immediate predecessor of `item`, ignoring `excluding`
pub async fn previous(
    tx: &mut dyn SequenceTx,
    item: &OrderedItem,
    excluding: &[Uuid],
) -> SequenceResult<Option<OrderedItem>> {
    closest(tx, item, Direction::Previous, excluding).await
}

/// Immediate successor of `item`, ignoring `excluding`
pub async fn next(
    tx: &mut dyn SequenceTx,
    item: &OrderedItem,
    excluding: &[Uuid],
) -> SequenceResult<Option<OrderedItem>> {
    closest(tx, item, Direction::Next, excluding).await
}

async fn closest(
    tx: &mut dyn SequenceTx,
    item: &OrderedItem,
    direction: Direction,
    excluding: &[Uuid],
) -> SequenceResult<Option<OrderedItem>> {
    let mut found = tx.neighbors(item, direction, excluding, 1).await?;
    Ok(found.pop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_direction_contains() {
        let now = Utc::now();
        let reference = OrderedItem::new(Uuid::from_u128(5), 100, now);
        let lower = OrderedItem::new(Uuid::from_u128(1), 50, now);
        let higher = OrderedItem::new(Uuid::from_u128(9), 150, now);

        assert!(Direction::Previous.contains(&lower, &reference));
        assert!(!Direction::Previous.contains(&higher, &reference));
        assert!(Direction::Next.contains(&higher, &reference));
        assert!(!Direction::Next.contains(&reference, &reference));
        assert!(!Direction::Previous.contains(&reference, &reference));
    }

    #[test]
    fn test_nearest_first() {
        let now = Utc::now();
        let mut before = vec![
            OrderedItem::new(Uuid::from_u128(1), 10, now),
            OrderedItem::new(Uuid::from_u128(2), 30, now),
            OrderedItem::new(Uuid::from_u128(3), 20, now),
        ];
        before.sort_by(|a, b| Direction::Previous.nearest_first(a, b));
        let keys: Vec<i64> = before.iter().map(|i| i.sort_order).collect();
        assert_eq!(keys, vec![30, 20, 10]);

        before.sort_by(|a, b| Direction::Next.nearest_first(a, b));
        let keys: Vec<i64> = before.iter().map(|i| i.sort_order).collect();
        assert_eq!(keys, vec![10, 20, 30]);
    }
}
