//! # Move Transaction
//!
//! Places one item directly before or after an anchor in a single
//! transaction:
//!
//! 1. Lock the moving row and the anchor row, lower id first.
//! 2. Resolve the boundary pair around the anchor, ignoring the moving item,
//!    and lock the neighbour on the far side. If that neighbour moved, or
//!    another row slipped in next to the anchor while waiting for the lock,
//!    the move fails with a retryable conflict.
//! 3. Allocate a key between the boundaries.
//! 4. Out of room: rebalance a window around the anchor and allocate again.
//! 5. Still out of room: one step past the anchor, unless that would reach
//!    the neighbour on the far side.
//! 6. Write the key and commit.
//!
//! Any failure rolls the transaction back, so a failed move leaves every key
//! as it was.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::allocator::KeyAllocator;
use super::errors::{SequenceError, SequenceResult};
use super::key_space::Position;
use super::neighbors;
use super::rebalancer::{RebalanceReport, WindowRebalancer};
use super::scope::SequenceScope;
use crate::config::SequencingConfig;
use crate::models::OrderedItem;
use crate::store::{SequenceStore, SequenceTx};

/// Result of a move request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved {
        id: Uuid,
        previous_order: i64,
        new_order: i64,
        rebalance: Option<RebalanceReport>,
        used_fallback: bool,
    },
    /// The item was its own anchor; nothing was written
    Unchanged { id: Uuid, sort_order: i64 },
}

impl MoveOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            MoveOutcome::Moved { id, .. } | MoveOutcome::Unchanged { id, .. } => *id,
        }
    }

    pub fn new_order(&self) -> i64 {
        match self {
            MoveOutcome::Moved { new_order, .. } => *new_order,
            MoveOutcome::Unchanged { sort_order, .. } => *sort_order,
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }
}

/// Shared move engine for every sequence scope
#[derive(Clone)]
pub struct SequenceMover {
    store: Arc<dyn SequenceStore>,
    allocator: KeyAllocator,
    rebalancer: WindowRebalancer,
}

impl std::fmt::Debug for SequenceMover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceMover")
            .field("allocator", &self.allocator)
            .field("rebalancer", &self.rebalancer)
            .finish_non_exhaustive()
    }
}

impl SequenceMover {
    pub fn new(
        store: Arc<dyn SequenceStore>,
        allocator: KeyAllocator,
        rebalancer: WindowRebalancer,
    ) -> Self {
        Self {
            store,
            allocator,
            rebalancer,
        }
    }

    pub fn from_config(store: Arc<dyn SequenceStore>, config: &SequencingConfig) -> Self {
        Self::new(
            store,
            KeyAllocator::new(config.step),
            WindowRebalancer::new(config.step, config.rebalance_window),
        )
    }

    /// Move `moving_id` directly before or after `anchor_id` within `scope`
    pub async fn move_item(
        &self,
        scope: SequenceScope,
        moving_id: Uuid,
        anchor_id: Uuid,
        position: Position,
    ) -> SequenceResult<MoveOutcome> {
        let mut tx = self.store.begin(scope).await?;

        match self
            .move_within(tx.as_mut(), moving_id, anchor_id, position)
            .await
        {
            Ok(outcome @ MoveOutcome::Moved { .. }) => {
                tx.commit().await?;
                info!(
                    scope = %scope,
                    moving_id = %moving_id,
                    anchor_id = %anchor_id,
                    position = ?position,
                    new_order = outcome.new_order(),
                    "Moved item"
                );
                Ok(outcome)
            }
            Ok(outcome) => {
                tx.rollback().await?;
                debug!(scope = %scope, id = %moving_id, "Move onto itself, nothing to do");
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(scope = %scope, error = %rollback_err, "Rollback after failed move failed");
                }
                match &err {
                    SequenceError::ExhaustedKeySpace { .. } => error!(
                        scope = %scope,
                        moving_id = %moving_id,
                        anchor_id = %anchor_id,
                        error = %err,
                        "Order key space exhausted, move rejected"
                    ),
                    _ => debug!(scope = %scope, error = %err, "Move failed"),
                }
                Err(err)
            }
        }
    }

    async fn move_within(
        &self,
        tx: &mut dyn SequenceTx,
        moving_id: Uuid,
        anchor_id: Uuid,
        position: Position,
    ) -> SequenceResult<MoveOutcome> {
        let scope = tx.scope();

        if moving_id == anchor_id {
            let locked = tx.lock_items(&[moving_id]).await?;
            let item = take_locked(&locked, moving_id, scope)?;
            return Ok(MoveOutcome::Unchanged {
                id: item.id,
                sort_order: item.sort_order,
            });
        }

        // lower id first for every caller, so two movers never wait on each other in a cycle
        let lock_order = if moving_id < anchor_id {
            [moving_id, anchor_id]
        } else {
            [anchor_id, moving_id]
        };
        let locked = tx.lock_items(&lock_order).await?;
        let moving = take_locked(&locked, moving_id, scope)?;
        let anchor = take_locked(&locked, anchor_id, scope)?;
        let excluding = [moving.id];

        let (prev, next) = self.boundaries(tx, &anchor, position, &excluding).await?;
        let mut new_order = self.allocator.compute_new_order(prev.as_ref(), next.as_ref());
        let mut rebalance = None;
        let mut used_fallback = false;

        if new_order.is_none() {
            let report = self
                .rebalancer
                .rebalance_around(tx, &anchor, &excluding)
                .await?;
            rebalance = Some(report);

            let (prev, next) = self.boundaries(tx, &anchor, position, &excluding).await?;
            new_order = self.allocator.compute_new_order(prev.as_ref(), next.as_ref());

            if new_order.is_none() {
                let beyond = match position {
                    Position::Before => prev,
                    Position::After => next,
                };
                new_order = Some(self.fallback_order(scope, &anchor, beyond.as_ref(), position)?);
                used_fallback = true;
            }
        }

        let new_order = new_order.ok_or(SequenceError::ExhaustedKeySpace {
            scope,
            anchor: anchor.id,
        })?;

        tx.update_orders(&[(moving.id, new_order)]).await?;

        Ok(MoveOutcome::Moved {
            id: moving.id,
            previous_order: moving.sort_order,
            new_order,
            rebalance,
            used_fallback,
        })
    }

    /// `(prev, next)` around the anchor for the requested side.
    ///
    /// The neighbour beyond the anchor is locked too: with both ends of the
    /// gap held, no other move can claim a key inside it before commit.
    async fn boundaries(
        &self,
        tx: &mut dyn SequenceTx,
        anchor: &OrderedItem,
        position: Position,
        excluding: &[Uuid],
    ) -> SequenceResult<(Option<OrderedItem>, Option<OrderedItem>)> {
        let beyond = beyond_anchor(tx, anchor, position, excluding).await?;

        if let Some(found) = &beyond {
            let locked = tx.lock_items(&[found.id]).await?;
            let unmoved = locked
                .iter()
                .any(|row| row.id == found.id && row.sort_order == found.sort_order);
            let recheck = beyond_anchor(tx, anchor, position, excluding).await?;

            if !unmoved || recheck.as_ref().map(|row| row.id) != Some(found.id) {
                return Err(SequenceError::conflict(
                    tx.scope(),
                    format!("neighbour of {} changed while it was being locked", anchor.id),
                ));
            }
        }

        Ok(match position {
            Position::Before => (beyond, Some(anchor.clone())),
            Position::After => (Some(anchor.clone()), beyond),
        })
    }

    fn fallback_order(
        &self,
        scope: SequenceScope,
        anchor: &OrderedItem,
        beyond: Option<&OrderedItem>,
        position: Position,
    ) -> SequenceResult<i64> {
        let exhausted = SequenceError::ExhaustedKeySpace {
            scope,
            anchor: anchor.id,
        };
        let candidate = anchor
            .sort_order
            .checked_add(position.fallback_offset(self.allocator.step()))
            .ok_or_else(|| exhausted.clone())?;

        // the step must not land on or past the neighbour beyond the anchor
        let overshoots = beyond.is_some_and(|item| match position {
            Position::Before => item.sort_order >= candidate,
            Position::After => item.sort_order <= candidate,
        });
        if overshoots {
            return Err(exhausted);
        }

        warn!(
            scope = %scope,
            anchor_id = %anchor.id,
            anchor_order = anchor.sort_order,
            fallback_order = candidate,
            "No gap after rebalancing, stepping past the anchor"
        );
        Ok(candidate)
    }
}

async fn beyond_anchor(
    tx: &mut dyn SequenceTx,
    anchor: &OrderedItem,
    position: Position,
    excluding: &[Uuid],
) -> SequenceResult<Option<OrderedItem>> {
    match position {
        Position::Before => neighbors::previous(tx, anchor, excluding).await,
        Position::After => neighbors::next(tx, anchor, excluding).await,
    }
}

fn take_locked(
    locked: &[OrderedItem],
    id: Uuid,
    scope: SequenceScope,
) -> SequenceResult<OrderedItem> {
    locked
        .iter()
        .find(|item| item.id == id)
        .cloned()
        .ok_or(SequenceError::NotFound { scope, id })
}
