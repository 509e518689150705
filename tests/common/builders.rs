//! Seeding helpers for the in-memory store.
//!
//! Rows are inserted with explicit keys and timestamps so scenarios can start
//! from an exact sequence instead of the front-insertion rule.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use shigu_core::config::SequencingConfig;
use shigu_core::models::{Goods, OrderedItem, ShowcaseGoods};
use shigu_core::services::OrderingService;
use shigu_core::store::MemoryStore;
use shigu_core::SequenceScope;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// Goods row with `sort_order`, created `seconds` after the base time
pub fn goods_at(name: &str, sort_order: i64, seconds: i64) -> Goods {
    let created_at = base_time() + Duration::seconds(seconds);
    Goods {
        id: Uuid::new_v4(),
        name: name.to_string(),
        quantity: 1,
        notes: None,
        sort_order,
        created_at,
        updated_at: created_at,
    }
}

/// Insert one goods row per `(name, key)`, returning them in input order
pub async fn seed_goods(store: &MemoryStore, rows: &[(&str, i64)]) -> Vec<Goods> {
    let mut seeded = Vec::with_capacity(rows.len());
    for (i, (name, key)) in rows.iter().enumerate() {
        let goods = goods_at(name, *key, i as i64);
        store.insert_goods(goods.clone()).await;
        seeded.push(goods);
    }
    seeded
}

/// Add existing goods to a showcase with explicit keys
pub async fn seed_membership(
    store: &MemoryStore,
    showcase_id: Uuid,
    rows: &[(&Goods, i64)],
) -> Vec<ShowcaseGoods> {
    let mut seeded = Vec::with_capacity(rows.len());
    for (i, (goods, key)) in rows.iter().enumerate() {
        let member = ShowcaseGoods {
            id: Uuid::new_v4(),
            showcase_id,
            goods_id: goods.id,
            notes: None,
            sort_order: *key,
            created_at: base_time() + Duration::seconds(i as i64),
        };
        store.insert_showcase_goods(member.clone()).await;
        seeded.push(member);
    }
    seeded
}

pub fn fast_sequencing() -> SequencingConfig {
    SequencingConfig {
        retry_backoff_ms: 1,
        ..SequencingConfig::default()
    }
}

pub fn ordering_for(store: &Arc<MemoryStore>, config: SequencingConfig) -> OrderingService {
    OrderingService::new(store.clone(), config)
}

/// Ids of a scope in sequence order
pub async fn sequence_ids(store: &MemoryStore, scope: SequenceScope) -> Vec<Uuid> {
    store.sequence(scope).await.iter().map(|item| item.id).collect()
}

pub async fn key_of(store: &MemoryStore, scope: SequenceScope, id: Uuid) -> i64 {
    store
        .sequence(scope)
        .await
        .into_iter()
        .find(|item| item.id == id)
        .map(|item: OrderedItem| item.sort_order)
        .expect("item present in scope")
}
