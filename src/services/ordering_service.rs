use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SequencingConfig;
use crate::sequencing::{
    MoveOutcome, Position, SequenceError, SequenceMover, SequenceResult, SequenceScope,
};
use crate::store::SequenceStore;

/// Entry point for move requests from the web layer.
///
/// Wraps the [`SequenceMover`] with bounded retries: a move that loses a
/// lock or serialization race is retried with exponential backoff up to
/// `max_move_attempts` times before the conflict is surfaced.
///
/// ```
/// use std::sync::Arc;
/// use shigu_core::config::SequencingConfig;
/// use shigu_core::models::NewGoods;
/// use shigu_core::sequencing::Position;
/// use shigu_core::services::OrderingService;
/// use shigu_core::store::{CatalogStore, MemoryStore};
///
/// # tokio_test::block_on(async {
/// let store = Arc::new(MemoryStore::default());
/// let first = store.create_goods(NewGoods::named("first"), 1000).await.unwrap();
/// let second = store.create_goods(NewGoods::named("second"), 1000).await.unwrap();
/// assert_eq!((first.sort_order, second.sort_order), (-1000, -2000));
///
/// let ordering = OrderingService::new(store.clone(), SequencingConfig::default());
/// let outcome = ordering
///     .move_goods(second.id, first.id, Position::After)
///     .await
///     .unwrap();
/// assert_eq!(outcome.new_order(), 0);
/// # });
/// ```
#[derive(Debug)]
pub struct OrderingService {
    mover: SequenceMover,
    config: SequencingConfig,
    stats: Mutex<MoveStatistics>,
}

/// Running counters since process start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveStatistics {
    pub requested: u64,
    pub moved: u64,
    pub unchanged: u64,
    pub rebalanced: u64,
    pub fallbacks: u64,
    pub retries: u64,
    pub conflicts: u64,
    pub failed: u64,
}

impl OrderingService {
    pub fn new(store: Arc<dyn SequenceStore>, config: SequencingConfig) -> Self {
        Self {
            mover: SequenceMover::from_config(store, &config),
            config,
            stats: Mutex::new(MoveStatistics::default()),
        }
    }

    /// Move a goods item in the global goods list
    pub async fn move_goods(
        &self,
        goods_id: Uuid,
        anchor_id: Uuid,
        position: Position,
    ) -> SequenceResult<MoveOutcome> {
        self.move_with_retry(SequenceScope::Goods, goods_id, anchor_id, position)
            .await
    }

    /// Move a member of a showcase relative to another member
    pub async fn move_showcase_goods(
        &self,
        showcase_id: Uuid,
        goods_id: Uuid,
        anchor_goods_id: Uuid,
        position: Position,
    ) -> SequenceResult<MoveOutcome> {
        self.move_with_retry(
            SequenceScope::Showcase(showcase_id),
            goods_id,
            anchor_goods_id,
            position,
        )
        .await
    }

    pub fn statistics(&self) -> MoveStatistics {
        self.stats.lock().clone()
    }

    async fn move_with_retry(
        &self,
        scope: SequenceScope,
        moving_id: Uuid,
        anchor_id: Uuid,
        position: Position,
    ) -> SequenceResult<MoveOutcome> {
        self.stats.lock().requested += 1;
        let max_attempts = self.config.max_move_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self
                .mover
                .move_item(scope, moving_id, anchor_id, position)
                .await
            {
                Ok(outcome) => {
                    self.record_success(&outcome);
                    return Ok(outcome);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let backoff = self.config.retry_backoff(attempt);
                    warn!(
                        scope = %scope,
                        moving_id = %moving_id,
                        attempt = attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Move lost a concurrency race, retrying"
                    );
                    self.stats.lock().retries += 1;
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    self.record_failure(&err);
                    debug!(scope = %scope, attempts = attempt, error = %err, "Move gave up");
                    return Err(err);
                }
            }
        }
    }

    fn record_success(&self, outcome: &MoveOutcome) {
        let mut stats = self.stats.lock();
        match outcome {
            MoveOutcome::Moved {
                rebalance,
                used_fallback,
                ..
            } => {
                stats.moved += 1;
                if rebalance.is_some() {
                    stats.rebalanced += 1;
                }
                if *used_fallback {
                    stats.fallbacks += 1;
                }
            }
            MoveOutcome::Unchanged { .. } => stats.unchanged += 1,
        }
    }

    fn record_failure(&self, err: &SequenceError) {
        let mut stats = self.stats.lock();
        if err.is_retryable() {
            stats.conflicts += 1;
        } else {
            stats.failed += 1;
        }
    }
}
