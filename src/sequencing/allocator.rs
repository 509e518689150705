//! # Key Allocator
//!
//! Pure key arithmetic: midpoint between two neighbours when an integer gap
//! exists, one step past the edge otherwise. `None` means "no room here"; the
//! mover answers it by rebalancing.

use crate::constants::ORDER_STEP;
use crate::models::OrderedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAllocator {
    step: i64,
}

impl Default for KeyAllocator {
    fn default() -> Self {
        Self { step: ORDER_STEP }
    }
}

impl KeyAllocator {
    pub fn new(step: i64) -> Self {
        Self { step }
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// New key for an item placed between `prev` and `next`
    pub fn compute_new_order(
        &self,
        prev: Option<&OrderedItem>,
        next: Option<&OrderedItem>,
    ) -> Option<i64> {
        self.compute_between(prev.map(|p| p.sort_order), next.map(|n| n.sort_order))
    }

    /// Same as [`compute_new_order`](Self::compute_new_order) on raw keys
    pub fn compute_between(&self, prev: Option<i64>, next: Option<i64>) -> Option<i64> {
        match (prev, next) {
            (Some(prev), Some(next)) => {
                let (low, high) = (i128::from(prev), i128::from(next));
                if high - low >= 2 {
                    // floor division, also for negative sums
                    i64::try_from((low + high).div_euclid(2)).ok()
                } else {
                    None
                }
            }
            (Some(prev), None) => prev.checked_add(self.step),
            (None, Some(next)) => next.checked_sub(self.step),
            (None, None) => Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        let allocator = KeyAllocator::default();
        assert_eq!(allocator.compute_between(Some(10), Some(20)), Some(15));
        assert_eq!(allocator.compute_between(Some(10), Some(13)), Some(11));
        assert_eq!(allocator.compute_between(Some(0), Some(1000)), Some(500));
    }

    #[test]
    fn test_no_gap() {
        let allocator = KeyAllocator::default();
        // a gap of two still holds one integer
        assert_eq!(allocator.compute_between(Some(10), Some(12)), Some(11));
        assert_eq!(allocator.compute_between(Some(10), Some(11)), None);
        assert_eq!(allocator.compute_between(Some(10), Some(10)), None);
        // inverted neighbours never produce a key
        assert_eq!(allocator.compute_between(Some(20), Some(10)), None);
    }

    #[test]
    fn test_negative_midpoint_floors() {
        let allocator = KeyAllocator::default();
        assert_eq!(allocator.compute_between(Some(-3), Some(0)), Some(-2));
        assert_eq!(allocator.compute_between(Some(-1000), Some(-997)), Some(-999));
    }

    #[test]
    fn test_edges_and_empty() {
        let allocator = KeyAllocator::new(1000);
        assert_eq!(allocator.compute_between(Some(2000), None), Some(3000));
        assert_eq!(allocator.compute_between(None, Some(0)), Some(-1000));
        assert_eq!(allocator.compute_between(None, None), Some(0));
    }

    #[test]
    fn test_extreme_keys() {
        let allocator = KeyAllocator::default();
        assert_eq!(allocator.compute_between(Some(i64::MAX - 10), None), None);
        assert_eq!(allocator.compute_between(None, Some(i64::MIN + 10)), None);
        assert_eq!(
            allocator.compute_between(Some(i64::MIN), Some(i64::MAX)),
            Some(-1)
        );
    }
}
