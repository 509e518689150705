//! # In-Memory Store
//!
//! Process-local backend for development and tests. A sequence transaction
//! owns the store mutex for its whole lifetime, which serializes every
//! writer, works on a copy of its scope and publishes changed keys only on
//! commit. Waiting longer than the lock timeout for the mutex is reported as
//! a concurrency conflict, like a row-lock timeout on PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::{CatalogStore, SequenceStore, SequenceTx, StoreError, StoreResult};
use crate::constants::sequencing::DEFAULT_LOCK_TIMEOUT_MS;
use crate::models::{
    Goods, NewGoods, NewShowcase, OrderedItem, Page, Showcase, ShowcaseGoods, ShowcaseGoodsEntry,
};
use crate::sequencing::{compare, Direction, SequenceError, SequenceResult, SequenceScope};

#[derive(Debug, Default)]
struct MemoryState {
    goods: HashMap<Uuid, Goods>,
    showcases: HashMap<Uuid, Showcase>,
    /// showcase id -> goods id -> membership
    memberships: HashMap<Uuid, HashMap<Uuid, ShowcaseGoods>>,
}

impl MemoryState {
    fn scope_rows(&self, scope: SequenceScope) -> HashMap<Uuid, OrderedItem> {
        match scope {
            SequenceScope::Goods => self
                .goods
                .values()
                .map(|g| (g.id, OrderedItem::new(g.id, g.sort_order, g.created_at)))
                .collect(),
            SequenceScope::Showcase(showcase_id) => self
                .memberships
                .get(&showcase_id)
                .map(|members| {
                    members
                        .values()
                        .map(|m| {
                            (
                                m.goods_id,
                                OrderedItem::new(m.goods_id, m.sort_order, m.created_at),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn write_order(&mut self, scope: SequenceScope, id: Uuid, sort_order: i64) {
        match scope {
            SequenceScope::Goods => {
                if let Some(goods) = self.goods.get_mut(&id) {
                    goods.sort_order = sort_order;
                }
            }
            SequenceScope::Showcase(showcase_id) => {
                if let Some(member) = self
                    .memberships
                    .get_mut(&showcase_id)
                    .and_then(|members| members.get_mut(&id))
                {
                    member.sort_order = sort_order;
                }
            }
        }
    }

    fn front_key<I: Iterator<Item = i64>>(keys: I, step: i64) -> i64 {
        keys.min().unwrap_or(0).saturating_sub(step)
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    lock_timeout: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS))
    }
}

impl MemoryStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            lock_timeout,
        }
    }

    /// Insert a goods row as given, keeping its key and timestamps
    pub async fn insert_goods(&self, goods: Goods) {
        self.state.lock().await.goods.insert(goods.id, goods);
    }

    /// Insert a membership row as given, keeping its key and timestamp
    pub async fn insert_showcase_goods(&self, member: ShowcaseGoods) {
        self.state
            .lock()
            .await
            .memberships
            .entry(member.showcase_id)
            .or_default()
            .insert(member.goods_id, member);
    }

    /// Every item of a scope in sequence order
    pub async fn sequence(&self, scope: SequenceScope) -> Vec<OrderedItem> {
        let mut items: Vec<OrderedItem> = self
            .state
            .lock()
            .await
            .scope_rows(scope)
            .into_values()
            .collect();
        items.sort_by(compare);
        items
    }
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn begin(&self, scope: SequenceScope) -> SequenceResult<Box<dyn SequenceTx>> {
        let guard = tokio::time::timeout(self.lock_timeout, self.state.clone().lock_owned())
            .await
            .map_err(|_| {
                SequenceError::conflict(
                    scope,
                    format!("lock wait exceeded {}ms", self.lock_timeout.as_millis()),
                )
            })?;

        let rows = guard.scope_rows(scope);
        debug!(scope = %scope, rows = rows.len(), "Opened in-memory sequence transaction");

        Ok(Box::new(MemorySequenceTx {
            guard,
            scope,
            rows,
            pending: HashMap::new(),
        }))
    }
}

pub struct MemorySequenceTx {
    guard: OwnedMutexGuard<MemoryState>,
    scope: SequenceScope,
    rows: HashMap<Uuid, OrderedItem>,
    pending: HashMap<Uuid, i64>,
}

#[async_trait]
impl SequenceTx for MemorySequenceTx {
    fn scope(&self) -> SequenceScope {
        self.scope
    }

    async fn lock_items(&mut self, ids: &[Uuid]) -> SequenceResult<Vec<OrderedItem>> {
        // the whole store is already held exclusively
        Ok(ids
            .iter()
            .filter_map(|id| self.rows.get(id).cloned())
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
            .values()
            .filter(|candidate| !excluding.contains(&candidate.id))
            .filter(|candidate| direction.contains(candidate, item))
            .cloned()
            .collect();
        found.sort_by(|a, b| direction.nearest_first(a, b));
        found.truncate(limit);
        Ok(found)
    }

    async fn update_orders(&mut self, updates: &[(Uuid, i64)]) -> SequenceResult<u64> {
        let mut changed = 0;
        for (id, sort_order) in updates {
            if let Some(row) = self.rows.get_mut(id) {
                row.sort_order = *sort_order;
                self.pending.insert(*id, *sort_order);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn commit(self: Box<Self>) -> SequenceResult<()> {
        let MemorySequenceTx {
            mut guard,
            scope,
            pending,
            ..
        } = *self;
        for (id, sort_order) in pending {
            guard.write_order(scope, id, sort_order);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> SequenceResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create_goods(&self, new_goods: NewGoods, step: i64) -> StoreResult<Goods> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let goods = Goods {
            id: Uuid::new_v4(),
            name: new_goods.name,
            quantity: new_goods.quantity,
            notes: new_goods.notes,
            sort_order: MemoryState::front_key(state.goods.values().map(|g| g.sort_order), step),
            created_at: now,
            updated_at: now,
        };
        state.goods.insert(goods.id, goods.clone());
        Ok(goods)
    }

    async fn find_goods(&self, id: Uuid) -> StoreResult<Option<Goods>> {
        Ok(self.state.lock().await.goods.get(&id).cloned())
    }

    async fn list_goods(&self, page: Page) -> StoreResult<(Vec<Goods>, u64)> {
        let state = self.state.lock().await;
        let mut goods: Vec<&Goods> = state.goods.values().collect();
        goods.sort_by(|a, b| {
            compare(
                &OrderedItem::new(a.id, a.sort_order, a.created_at),
                &OrderedItem::new(b.id, b.sort_order, b.created_at),
            )
        });

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let items = goods.into_iter().skip(offset).take(limit).cloned().collect();

        Ok((items, state.goods.len() as u64))
    }

    async fn delete_goods(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.goods.remove(&id).is_some();
        if removed {
            for members in state.memberships.values_mut() {
                members.remove(&id);
            }
        }
        Ok(removed)
    }

    async fn create_showcase(&self, new_showcase: NewShowcase, step: i64) -> StoreResult<Showcase> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let showcase = Showcase {
            id: Uuid::new_v4(),
            name: new_showcase.name,
            description: new_showcase.description,
            is_public: new_showcase.is_public,
            sort_order: MemoryState::front_key(
                state.showcases.values().map(|s| s.sort_order),
                step,
            ),
            created_at: now,
            updated_at: now,
        };
        state.showcases.insert(showcase.id, showcase.clone());
        Ok(showcase)
    }

    async fn find_showcase(&self, id: Uuid) -> StoreResult<Option<Showcase>> {
        Ok(self.state.lock().await.showcases.get(&id).cloned())
    }

    async fn list_showcases(&self) -> StoreResult<Vec<Showcase>> {
        let state = self.state.lock().await;
        let mut showcases: Vec<Showcase> = state.showcases.values().cloned().collect();
        showcases.sort_by(|a, b| {
            compare(
                &OrderedItem::new(a.id, a.sort_order, a.created_at),
                &OrderedItem::new(b.id, b.sort_order, b.created_at),
            )
        });
        Ok(showcases)
    }

    async fn delete_showcase(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        state.memberships.remove(&id);
        Ok(state.showcases.remove(&id).is_some())
    }

    async fn add_showcase_goods(
        &self,
        showcase_id: Uuid,
        goods_id: Uuid,
        notes: Option<String>,
        step: i64,
    ) -> StoreResult<ShowcaseGoods> {
        let mut state = self.state.lock().await;
        if !state.showcases.contains_key(&showcase_id) {
            return Err(StoreError::not_found("showcase", showcase_id));
        }
        if !state.goods.contains_key(&goods_id) {
            return Err(StoreError::not_found("goods", goods_id));
        }

        let members = state.memberships.entry(showcase_id).or_default();
        if members.contains_key(&goods_id) {
            return Err(StoreError::Conflict {
                message: format!("goods {goods_id} is already in showcase {showcase_id}"),
            });
        }

        let member = ShowcaseGoods {
            id: Uuid::new_v4(),
            showcase_id,
            goods_id,
            notes,
            sort_order: MemoryState::front_key(members.values().map(|m| m.sort_order), step),
            created_at: Utc::now(),
        };
        members.insert(goods_id, member.clone());
        Ok(member)
    }

    async fn remove_showcase_goods(&self, showcase_id: Uuid, goods_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state
            .memberships
            .get_mut(&showcase_id)
            .and_then(|members| members.remove(&goods_id))
            .is_some())
    }

    async fn list_showcase_goods(&self, showcase_id: Uuid) -> StoreResult<Vec<ShowcaseGoodsEntry>> {
        let state = self.state.lock().await;
        let Some(members) = state.memberships.get(&showcase_id) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<(&ShowcaseGoods, &Goods)> = members
            .values()
            .filter_map(|m| state.goods.get(&m.goods_id).map(|g| (m, g)))
            .collect();
        rows.sort_by(|(a, _), (b, _)| {
            compare(
                &OrderedItem::new(a.goods_id, a.sort_order, a.created_at),
                &OrderedItem::new(b.goods_id, b.sort_order, b.created_at),
            )
        });

        Ok(rows
            .into_iter()
            .map(|(member, goods)| ShowcaseGoodsEntry {
                goods_id: member.goods_id,
                goods_name: goods.name.clone(),
                quantity: goods.quantity,
                notes: member.notes.clone(),
                sort_order: member.sort_order,
                added_at: member.created_at,
            })
            .collect())
    }
}
