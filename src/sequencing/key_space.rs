//! # Order Key Space
//!
//! Keys are sparse `i64` values. Within a scope the list is sorted by
//! `sort_order ASC, created_at DESC, id DESC`: equal keys put the newer item
//! first, and equal timestamps put the larger id first. Ids are unique, so
//! the order is strict and total.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::OrderedItem;

/// Where the moving item lands relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
}

impl Position {
    /// Key offset applied to the anchor when no neighbour gap can be found
    pub fn fallback_offset(&self, step: i64) -> i64 {
        match self {
            Position::Before => -step,
            Position::After => step,
        }
    }
}

/// Compare two items of the same scope under the sequence order
pub fn compare(a: &OrderedItem, b: &OrderedItem) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Sort a slice in place into sequence order
pub fn sort_items(items: &mut [OrderedItem]) {
    items.sort_by(compare);
}

/// True when every adjacent pair is strictly increasing
pub fn is_strictly_ordered(items: &[OrderedItem]) -> bool {
    items
        .windows(2)
        .all(|pair| compare(&pair[0], &pair[1]) == Ordering::Less)
}
