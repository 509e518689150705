//! In-process sequence transactions whose rows can change underneath the
//! caller, standing in for a commit by another session at read committed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::errors::SequenceResult;
use super::neighbors::Direction;
use super::scope::SequenceScope;
use crate::models::OrderedItem;
use crate::store::{SequenceStore, SequenceTx};

pub fn created(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, second).unwrap()
}

pub fn row(id: u128, sort_order: i64) -> OrderedItem {
    OrderedItem::new(Uuid::from_u128(id), sort_order, created(0))
}

/// Rows plus one pending foreign write, applied the first time `trigger` is locked
#[derive(Debug, Clone)]
pub struct ScriptedTx {
    pub rows: Vec<OrderedItem>,
    pub trigger: Option<(Uuid, OrderedItem)>,
    pub written: Vec<(Uuid, i64)>,
}

impl ScriptedTx {
    pub fn new(rows: Vec<OrderedItem>) -> Self {
        Self {
            rows,
            trigger: None,
            written: Vec::new(),
        }
    }

    /// Once `locked` is locked, `change` replaces the row with its id or joins the scope
    pub fn on_lock(mut self, locked: Uuid, change: OrderedItem) -> Self {
        self.trigger = Some((locked, change));
        self
    }

    fn upsert(&mut self, change: OrderedItem) {
        match self.rows.iter_mut().find(|row| row.id == change.id) {
            Some(existing) => *existing = change,
            None => self.rows.push(change),
        }
    }

    pub fn key_of(&self, id: Uuid) -> Option<i64> {
        self.rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.sort_order)
    }
}

#[async_trait]
impl SequenceTx for ScriptedTx {
    fn scope(&self) -> SequenceScope {
        SequenceScope::Goods
    }

    async fn lock_items(&mut self, ids: &[Uuid]) -> SequenceResult<Vec<OrderedItem>> {
        let fired = self
            .trigger
            .as_ref()
            .is_some_and(|(locked, _)| ids.contains(locked));
        if fired {
            if let Some((_, change)) = self.trigger.take() {
                self.upsert(change);
            }
        }
        Ok(self
            .rows
            .iter()
            .filter(|row| ids.contains(&row.id))
            .cloned()
            .collect())
    }

    async fn neighbors(
        &mut self,
        item: &OrderedItem,
        direction: Direction,
        excluding: &[Uuid],
        limit: usize,
    ) -> SequenceResult<Vec<OrderedItem>> {
        let mut found: Vec<OrderedItem> = self
            .rows
            .iter()
            .filter(|row| !excluding.contains(&row.id) && direction.contains(row, item))
            .cloned()
            .collect();
        found.sort_by(|a, b| direction.nearest_first(a, b));
        found.truncate(limit);
        Ok(found)
    }

    async fn update_orders(&mut self, updates: &[(Uuid, i64)]) -> SequenceResult<u64> {
        for (id, sort_order) in updates {
            if let Some(row) = self.rows.iter_mut().find(|row| row.id == *id) {
                row.sort_order = *sort_order;
            }
            self.written.push((*id, *sort_order));
        }
        Ok(updates.len() as u64)
    }

    async fn commit(self: Box<Self>) -> SequenceResult<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> SequenceResult<()> {
        Ok(())
    }
}

/// Hands out one prepared transaction
#[derive(Debug, Clone, Default)]
pub struct ScriptedStore {
    pending: Arc<Mutex<Option<ScriptedTx>>>,
}

impl ScriptedStore {
    pub fn with(tx: ScriptedTx) -> Self {
        Self {
            pending: Arc::new(Mutex::new(Some(tx))),
        }
    }
}

#[async_trait]
impl SequenceStore for ScriptedStore {
    async fn begin(&self, scope: SequenceScope) -> SequenceResult<Box<dyn SequenceTx>> {
        let tx = self.pending.lock().take().ok_or_else(|| {
            super::errors::SequenceError::conflict(scope, "scripted transaction already used")
        })?;
        Ok(Box::new(tx))
    }
}
