//! # Window Rebalancer
//!
//! Restores key spacing around an anchor once its neighbours have run out of
//! integer gaps. Only a bounded window on each side of the centre is re-keyed;
//! the centre keeps its key and every row outside the window is untouched.
//!
//! Keys are laid out `step` apart, starting `len(before) * step` below the
//! centre. When the window is cut short by the window size and that spread
//! would jump past the first item outside the window, the side is compressed
//! to fit evenly between that item and the centre instead, so remote items
//! never change relative position.
//!
//! A side is never compressed below half a step. When a dense run reaches past
//! the window, the scan keeps widening until the first outer item that leaves
//! enough room, or until the end of the list, so repeated drops onto the same
//! anchor always end in a usable gap.
//!
//! Every row the plan touches, plus the outer row it measured against, is
//! locked in ascending id order and checked against what was read before any
//! key is written. A row that moved in the meantime aborts the rebalance with
//! a retryable [`SequenceError::ConcurrencyConflict`].

use tracing::debug;
use uuid::Uuid;

use super::errors::{SequenceError, SequenceResult};
use super::neighbors::Direction;
use crate::constants::sequencing::DEFAULT_REBALANCE_WINDOW;
use crate::constants::ORDER_STEP;
use crate::models::OrderedItem;
use crate::store::SequenceTx;

/// What a rebalance looked at and changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebalanceReport {
    pub before: usize,
    pub after: usize,
    pub updated: usize,
    pub compressed: bool,
}

impl RebalanceReport {
    /// Rows inside the window, centre included
    pub fn examined(&self) -> usize {
        self.before + self.after + 1
    }
}

/// One side of the window, nearest item first
#[derive(Debug, Clone, Copy)]
pub struct WindowSide<'a> {
    pub items: &'a [OrderedItem],
    /// Key of the first item past the window, when the window was truncated
    pub outer_key: Option<i64>,
}

/// Rows read for one side before planning
#[derive(Debug, Clone, Default)]
struct SideScan {
    items: Vec<OrderedItem>,
    outer: Option<OrderedItem>,
}

impl SideScan {
    fn side(&self) -> WindowSide<'_> {
        WindowSide {
            items: &self.items,
            outer_key: self.outer.as_ref().map(|outer| outer.sort_order),
        }
    }

    /// Window rows followed by the outer row, nearest first
    fn rows(&self) -> impl Iterator<Item = &OrderedItem> {
        self.items.iter().chain(self.outer.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRebalancer {
    step: i64,
    window: usize,
}

impl Default for WindowRebalancer {
    fn default() -> Self {
        Self {
            step: ORDER_STEP,
            window: DEFAULT_REBALANCE_WINDOW,
        }
    }
}

impl WindowRebalancer {
    pub fn new(step: i64, window: usize) -> Self {
        Self { step, window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Re-key up to `window` items on each side of `center`, skipping `excluding`.
    ///
    /// A side reaches further than `window` only while the rows past it are
    /// packed too tightly to share.
    pub async fn rebalance_around(
        &self,
        tx: &mut dyn SequenceTx,
        center: &OrderedItem,
        excluding: &[Uuid],
    ) -> SequenceResult<RebalanceReport> {
        let scope = tx.scope();
        let mut excluded = excluding.to_vec();
        if !excluded.contains(&center.id) {
            excluded.push(center.id);
        }

        let before = self
            .scan_side(tx, center, Direction::Previous, &excluded)
            .await?;
        let after = self.scan_side(tx, center, Direction::Next, &excluded).await?;

        lock_window(tx, center, &before, &after, &excluded).await?;

        let plan = plan_window(before.side(), center, after.side(), self.step).ok_or(
            SequenceError::ExhaustedKeySpace {
                scope,
                anchor: center.id,
            },
        )?;

        if !plan.updates.is_empty() {
            tx.update_orders(&plan.updates).await?;
        }

        let report = RebalanceReport {
            before: before.items.len(),
            after: after.items.len(),
            updated: plan.updates.len(),
            compressed: plan.compressed,
        };

        debug!(
            scope = %scope,
            center = %center.id,
            center_order = center.sort_order,
            before = report.before,
            after = report.after,
            updated = report.updated,
            compressed = report.compressed,
            "Rebalanced sequence window"
        );

        Ok(report)
    }

    /// Read one side: at least `window` rows, and past that only as far as the
    /// first outer row that leaves room for half-step spacing.
    async fn scan_side(
        &self,
        tx: &mut dyn SequenceTx,
        center: &OrderedItem,
        direction: Direction,
        excluded: &[Uuid],
    ) -> SequenceResult<SideScan> {
        let min_spacing = min_spacing(self.step);
        let mut limit = self.window.saturating_add(1);

        loop {
            let mut items = tx.neighbors(center, direction, excluded, limit).await?;
            if items.len() < limit {
                // reached the end of the list, nothing to measure against
                return Ok(SideScan { items, outer: None });
            }

            if let Some(cut) = roomy_cut(&items, center, self.window, min_spacing) {
                let outer = items.get(cut).cloned();
                items.truncate(cut);
                return Ok(SideScan { items, outer });
            }

            debug!(
                scope = %tx.scope(),
                center = %center.id,
                direction = ?direction,
                scanned = items.len(),
                "Dense run past the rebalance window, widening the scan"
            );
            limit = limit.saturating_mul(2);
        }
    }
}

/// Smallest spacing a side may be compressed to
fn min_spacing(step: i64) -> i128 {
    (i128::from(step) / 2).max(2)
}

/// First index at or beyond `window` whose row leaves at least `min_spacing`
/// per slot between it and the centre
fn roomy_cut(
    items: &[OrderedItem],
    center: &OrderedItem,
    window: usize,
    min_spacing: i128,
) -> Option<usize> {
    let center_key = i128::from(center.sort_order);
    (window..items.len()).find(|&cut| {
        let room = (i128::from(items[cut].sort_order) - center_key).abs();
        let slots = cut as i128 + 1;
        room / slots >= min_spacing
    })
}

/// Lock the scanned rows and make sure nothing changed since they were read
async fn lock_window(
    tx: &mut dyn SequenceTx,
    center: &OrderedItem,
    before: &SideScan,
    after: &SideScan,
    excluded: &[Uuid],
) -> SequenceResult<()> {
    let scope = tx.scope();
    let mut ids: Vec<Uuid> = before.rows().chain(after.rows()).map(|row| row.id).collect();
    if ids.is_empty() {
        return Ok(());
    }
    ids.sort_unstable();

    let locked = tx.lock_items(&ids).await?;
    let unchanged = before.rows().chain(after.rows()).all(|read| {
        locked
            .iter()
            .any(|row| row.id == read.id && row.sort_order == read.sort_order)
    });
    if !unchanged {
        return Err(SequenceError::conflict(
            scope,
            format!("rows around {} moved while the window was being locked", center.id),
        ));
    }

    // with every boundary held, a second read shows whether anything slipped in between
    for (scan, direction) in [(before, Direction::Previous), (after, Direction::Next)] {
        let expected: Vec<Uuid> = scan.rows().map(|row| row.id).collect();
        if expected.is_empty() {
            continue;
        }
        let current = tx
            .neighbors(center, direction, excluded, expected.len())
            .await?;
        if !current.iter().map(|row| row.id).eq(expected.iter().copied()) {
            return Err(SequenceError::conflict(
                scope,
                format!("rows were inserted around {} during a rebalance", center.id),
            ));
        }
    }

    Ok(())
}

/// Key assignments for one window
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowPlan {
    /// `(id, new_key)` for rows whose key changes
    pub updates: Vec<(Uuid, i64)>,
    pub compressed: bool,
}

/// Lay out keys for `reversed(before) + center + after`.
///
/// Returns `None` when the keys cannot be represented as `i64`, or when an
/// outer item leaves less than one key per slot.
pub fn plan_window(
    before: WindowSide<'_>,
    center: &OrderedItem,
    after: WindowSide<'_>,
    step: i64,
) -> Option<WindowPlan> {
    let center_key = i128::from(center.sort_order);
    let (before_spacing, before_compressed) = side_spacing(
        before.items.len(),
        before.outer_key.map(|k| center_key - i128::from(k)),
        step,
    )?;
    let (after_spacing, after_compressed) = side_spacing(
        after.items.len(),
        after.outer_key.map(|k| i128::from(k) - center_key),
        step,
    )?;

    let mut updates = Vec::new();

    // nearest-first, so the k-th item sits (k + 1) spacings from the centre
    for (distance, item) in (1_i128..).zip(before.items) {
        let key = i64::try_from(center_key - distance * before_spacing).ok()?;
        if item.sort_order != key {
            updates.push((item.id, key));
        }
    }
    for (distance, item) in (1_i128..).zip(after.items) {
        let key = i64::try_from(center_key + distance * after_spacing).ok()?;
        if item.sort_order != key {
            updates.push((item.id, key));
        }
    }

    Some(WindowPlan {
        updates,
        compressed: before_compressed || after_compressed,
    })
}

/// Spacing for one side: the full step unless that would reach the item past
/// the window, in which case the room up to it is shared evenly.
fn side_spacing(len: usize, room: Option<i128>, step: i64) -> Option<(i128, bool)> {
    let step = i128::from(step);
    let slots = len as i128 + 1;
    match room {
        Some(room) if step * slots >= room => {
            let spacing = room / slots;
            // zero spacing would give two rows the same key
            (spacing >= 1).then_some((spacing, true))
        }
        _ => Some((step, false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: u128, key: i64) -> OrderedItem {
        OrderedItem::new(Uuid::from_u128(id), key, Utc::now())
    }

    fn side(items: &[OrderedItem]) -> WindowSide<'_> {
        WindowSide {
            items,
            outer_key: None,
        }
    }

    #[test]
    fn test_plan_spreads_from_center() {
        let center = item(10, 6);
        let before = vec![item(1, 5), item(2, 4)];
        let after = vec![item(3, 7)];

        let plan = plan_window(side(&before), &center, side(&after), 1000).unwrap();
        assert!(!plan.compressed);
        assert_eq!(
            plan.updates,
            vec![
                (Uuid::from_u128(1), -994),
                (Uuid::from_u128(2), -1994),
                (Uuid::from_u128(3), 1006),
            ]
        );
    }

    #[test]
    fn test_plan_skips_unchanged_rows() {
        let center = item(10, 0);
        let before = vec![item(1, -1000)];
        let after = vec![item(2, 1000), item(3, 1500)];

        let plan = plan_window(side(&before), &center, side(&after), 1000).unwrap();
        assert_eq!(plan.updates, vec![(Uuid::from_u128(3), 2000)]);
    }

    #[test]
    fn test_plan_compresses_instead_of_passing_outer_item() {
        let center = item(10, 100);
        let before = vec![item(1, 99), item(2, 98)];

        let plan = plan_window(
            WindowSide {
                items: &before,
                outer_key: Some(40),
            },
            &center,
            side(&[]),
            1000,
        )
        .unwrap();

        assert!(plan.compressed);
        // 60 units of room shared by three slots
        assert_eq!(
            plan.updates,
            vec![(Uuid::from_u128(1), 80), (Uuid::from_u128(2), 60)]
        );
    }

    #[test]
    fn test_plan_reports_overflow() {
        let center = item(10, i64::MAX - 1);
        let after = vec![item(1, i64::MAX)];
        assert!(plan_window(side(&[]), &center, side(&after), 1000).is_none());
    }

    #[test]
    fn test_side_spacing() {
        assert_eq!(side_spacing(3, None, 1000), Some((1000, false)));
        assert_eq!(side_spacing(3, Some(10_000), 1000), Some((1000, false)));
        assert_eq!(side_spacing(3, Some(400), 1000), Some((100, true)));
        assert_eq!(side_spacing(3, Some(4), 1000), Some((1, true)));
        assert_eq!(side_spacing(3, Some(2), 1000), None);
    }

    #[test]
    fn test_roomy_cut_skips_dense_rows() {
        let center = item(10, 0);
        let items = vec![item(1, 1), item(2, 2), item(3, 3), item(4, 4000)];

        assert_eq!(min_spacing(1000), 500);
        assert_eq!(min_spacing(3), 2);
        assert_eq!(roomy_cut(&items, &center, 1, min_spacing(1000)), Some(3));
        assert_eq!(roomy_cut(&items[..3], &center, 1, min_spacing(1000)), None);
    }

    #[tokio::test]
    async fn test_dense_run_widens_the_window() {
        use crate::sequencing::test_support::{row, ScriptedTx};

        let center = row(100, 0);
        let mut rows = vec![center.clone()];
        rows.extend((1..=5).map(|id| row(id, id as i64)));
        rows.push(row(6, 100_000));
        let mut tx = ScriptedTx::new(rows);

        let report = WindowRebalancer::new(1000, 2)
            .rebalance_around(&mut tx, &center, &[])
            .await
            .unwrap();

        assert_eq!(report.after, 5);
        assert_eq!(report.updated, 5);
        assert!(!report.compressed);
        assert_eq!(tx.key_of(Uuid::from_u128(1)), Some(1000));
        assert_eq!(tx.key_of(Uuid::from_u128(5)), Some(5000));
        assert_eq!(tx.key_of(Uuid::from_u128(6)), Some(100_000));
    }

    #[tokio::test]
    async fn test_window_moved_under_lock_is_a_conflict() {
        use crate::sequencing::test_support::{row, ScriptedTx};

        let center = row(100, 0);
        let rows = vec![center.clone(), row(1, 1), row(2, 2)];

        // a row of the window was moved elsewhere and committed
        let mut moved = ScriptedTx::new(rows.clone()).on_lock(Uuid::from_u128(1), row(1, 9000));
        let result = WindowRebalancer::default()
            .rebalance_around(&mut moved, &center, &[])
            .await;
        assert!(matches!(result, Err(SequenceError::ConcurrencyConflict { .. })));
        assert!(moved.written.is_empty());

        // another row was dropped into the window
        let mut joined = ScriptedTx::new(rows).on_lock(Uuid::from_u128(1), row(3, 1));
        let result = WindowRebalancer::default()
            .rebalance_around(&mut joined, &center, &[])
            .await;
        assert!(matches!(result, Err(SequenceError::ConcurrencyConflict { .. })));
        assert!(joined.written.is_empty());
    }
}
