//! # Persistence
//!
//! Two seams sit between the HTTP layer and storage:
//!
//! - [`SequenceStore`] / [`SequenceTx`] - transactional row access for the
//!   sequence engine (locks, neighbour scans, batch key updates)
//! - [`CatalogStore`] - plain catalogue CRUD
//!
//! [`PgStore`] implements both on PostgreSQL; [`MemoryStore`] implements both
//! in process for development and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Goods, NewGoods, NewShowcase, OrderedItem, Page, Showcase, ShowcaseGoods, ShowcaseGoodsEntry,
};
use crate::sequencing::{Direction, SequenceResult, SequenceScope};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Opens transactions over one sequence scope
#[async_trait]
pub trait SequenceStore: Send + Sync {
    async fn begin(&self, scope: SequenceScope) -> SequenceResult<Box<dyn SequenceTx>>;
}

/// A transaction restricted to a single scope.
///
/// Nothing written through it is visible to others before [`commit`](Self::commit);
/// dropping it without committing discards every write.
#[async_trait]
pub trait SequenceTx: Send {
    fn scope(&self) -> SequenceScope;

    /// Lock the rows for `ids` one at a time, in the order given, and return
    /// the ones that exist in this scope.
    async fn lock_items(&mut self, ids: &[Uuid]) -> SequenceResult<Vec<OrderedItem>>;

    /// Up to `limit` items strictly on `direction`'s side of `item`, nearest
    /// first, skipping `excluding` and `item` itself.
    async fn neighbors(
        &mut self,
        item: &OrderedItem,
        direction: Direction,
        excluding: &[Uuid],
        limit: usize,
    ) -> SequenceResult<Vec<OrderedItem>>;

    /// Write new keys in one batch; returns the number of rows changed
    async fn update_orders(&mut self, updates: &[(Uuid, i64)]) -> SequenceResult<u64>;

    async fn commit(self: Box<Self>) -> SequenceResult<()>;

    async fn rollback(self: Box<Self>) -> SequenceResult<()>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("database operation failed: {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("database unavailable during {operation}")]
    Unavailable { operation: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn database(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Database {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    /// Classify a sqlx failure; an exhausted or closed pool is reported as unavailable
    pub fn from_sqlx(operation: impl Into<String>, err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => Self::Unavailable {
                operation: operation.into(),
            },
            _ => Self::database(operation, err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Catalogue CRUD. New goods, showcases and memberships go to the front of
/// their list: current minimum key minus `step`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn backend_name(&self) -> &'static str;

    async fn create_goods(&self, new_goods: NewGoods, step: i64) -> StoreResult<Goods>;
    async fn find_goods(&self, id: Uuid) -> StoreResult<Option<Goods>>;
    /// One page of goods in sequence order, plus the total count
    async fn list_goods(&self, page: Page) -> StoreResult<(Vec<Goods>, u64)>;
    async fn delete_goods(&self, id: Uuid) -> StoreResult<bool>;

    async fn create_showcase(&self, new_showcase: NewShowcase, step: i64) -> StoreResult<Showcase>;
    async fn find_showcase(&self, id: Uuid) -> StoreResult<Option<Showcase>>;
    async fn list_showcases(&self) -> StoreResult<Vec<Showcase>>;
    async fn delete_showcase(&self, id: Uuid) -> StoreResult<bool>;

    /// Fails with `NotFound` for an unknown showcase or goods and `Conflict`
    /// when the goods is already a member
    async fn add_showcase_goods(
        &self,
        showcase_id: Uuid,
        goods_id: Uuid,
        notes: Option<String>,
        step: i64,
    ) -> StoreResult<ShowcaseGoods>;
    async fn remove_showcase_goods(&self, showcase_id: Uuid, goods_id: Uuid) -> StoreResult<bool>;
    async fn list_showcase_goods(&self, showcase_id: Uuid) -> StoreResult<Vec<ShowcaseGoodsEntry>>;
}
