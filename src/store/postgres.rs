//! # PostgreSQL Store
//!
//! Sequence transactions run with the configured isolation level and a
//! transaction-local `lock_timeout`. Each `lock_items` call takes its rows
//! with one `SELECT ... ORDER BY id FOR UPDATE`. Lock timeouts, deadlocks and
//! serialization failures surface as [`SequenceError::ConcurrencyConflict`];
//! an exhausted or closed pool as [`SequenceError::Unavailable`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{CatalogStore, SequenceStore, SequenceTx, StoreError, StoreResult};
use crate::config::{IsolationLevel, SequencingConfig};
use crate::models::{
    Goods, NewGoods, NewShowcase, OrderedItem, Page, Showcase, ShowcaseGoods, ShowcaseGoodsEntry,
};
use crate::sequencing::{Direction, SequenceError, SequenceResult, SequenceScope};

/// SQLSTATE codes that mean "try again": serialization failure, deadlock,
/// lock not available
const RETRYABLE_SQLSTATES: [&str; 3] = ["40001", "40P01", "55P03"];

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    isolation: IsolationLevel,
    lock_timeout_ms: u64,
}

impl PgStore {
    pub fn new(pool: PgPool, config: &SequencingConfig) -> Self {
        Self {
            pool,
            isolation: config.isolation,
            lock_timeout_ms: config.lock_timeout_ms,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a sqlx error from a sequence transaction onto the move taxonomy
pub fn classify_sqlx_error(err: sqlx::Error, scope: SequenceScope, operation: &str) -> SequenceError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err
                .code()
                .as_deref()
                .is_some_and(|code| RETRYABLE_SQLSTATES.contains(&code)) =>
        {
            SequenceError::conflict(scope, format!("{operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => SequenceError::Unavailable {
            operation: format!("{operation} in {scope}"),
        },
        _ => SequenceError::database(operation, err.to_string()),
    }
}

#[async_trait]
impl SequenceStore for PgStore {
    async fn begin(&self, scope: SequenceScope) -> SequenceResult<Box<dyn SequenceTx>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify_sqlx_error(e, scope, "begin"))?;

        // must be the first statement of the transaction
        sqlx::query(self.isolation.set_transaction_sql())
            .execute(&mut *tx)
            .await
            .map_err(|e| classify_sqlx_error(e, scope, "set isolation level"))?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(|e| classify_sqlx_error(e, scope, "set lock timeout"))?;

        debug!(scope = %scope, isolation = ?self.isolation, "Opened sequence transaction");

        Ok(Box::new(PgSequenceTx { tx, scope }))
    }
}

pub struct PgSequenceTx {
    tx: Transaction<'static, Postgres>,
    scope: SequenceScope,
}

impl PgSequenceTx {
    fn select_items(&self) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!(
            "SELECT {key} AS id, sort_order, created_at FROM {table} WHERE TRUE",
            key = self.scope.key_column(),
            table = self.scope.table(),
        ))
    }
}

fn push_partition(builder: &mut QueryBuilder<'static, Postgres>, scope: SequenceScope, alias: &str) {
    if let Some((column, value)) = scope.partition() {
        builder.push(format!(" AND {alias}{column} = "));
        builder.push_bind(value);
    }
}

#[async_trait]
impl SequenceTx for PgSequenceTx {
    fn scope(&self) -> SequenceScope {
        self.scope
    }

    async fn lock_items(&mut self, ids: &[Uuid]) -> SequenceResult<Vec<OrderedItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // rows are locked in the order the sort hands them to FOR UPDATE
        let key = self.scope.key_column();
        let mut builder = self.select_items();
        builder.push(format!(" AND {key} = ANY("));
        builder.push_bind(ids.to_vec());
        builder.push(")");
        push_partition(&mut builder, self.scope, "");
        builder.push(format!(" ORDER BY {key} FOR UPDATE"));

        builder
            .build_query_as::<OrderedItem>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| classify_sqlx_error(e, self.scope, "lock items"))
    }

    async fn neighbors(
        &mut self,
        item: &OrderedItem,
        direction: Direction,
        excluding: &[Uuid],
        limit: usize,
    ) -> SequenceResult<Vec<OrderedItem>> {
        let key = self.scope.key_column();
        let (key_cmp, time_cmp, ordering) = match direction {
            Direction::Previous => ("<", ">", "sort_order DESC, created_at ASC"),
            Direction::Next => (">", "<", "sort_order ASC, created_at DESC"),
        };
        // the id comparison is inverted relative to the key comparison: larger ids sort first
        let (id_cmp, id_ordering) = match direction {
            Direction::Previous => (">", "ASC"),
            Direction::Next => ("<", "DESC"),
        };

        let mut builder = self.select_items();
        push_partition(&mut builder, self.scope, "");
        builder.push(format!(" AND {key} <> ALL("));
        builder.push_bind(excluding.to_vec());
        builder.push(format!(") AND (sort_order {key_cmp} "));
        builder.push_bind(item.sort_order);
        builder.push(" OR (sort_order = ");
        builder.push_bind(item.sort_order);
        builder.push(format!(" AND created_at {time_cmp} "));
        builder.push_bind(item.created_at);
        builder.push(") OR (sort_order = ");
        builder.push_bind(item.sort_order);
        builder.push(" AND created_at = ");
        builder.push_bind(item.created_at);
        builder.push(format!(" AND {key} {id_cmp} "));
        builder.push_bind(item.id);
        builder.push(format!(")) ORDER BY {ordering}, {key} {id_ordering} LIMIT "));
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        builder
            .build_query_as::<OrderedItem>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| classify_sqlx_error(e, self.scope, "resolve neighbors"))
    }

    async fn update_orders(&mut self, updates: &[(Uuid, i64)]) -> SequenceResult<u64> {
        if updates.is_empty() {
            return Ok(0);
        }

        let (ids, orders): (Vec<Uuid>, Vec<i64>) = updates.iter().copied().unzip();

        let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new(format!(
            "UPDATE {table} AS t SET sort_order = v.new_order FROM UNNEST(",
            table = self.scope.table(),
        ));
        builder.push_bind(ids);
        builder.push("::uuid[], ");
        builder.push_bind(orders);
        builder.push(format!(
            "::bigint[]) AS v(item_id, new_order) WHERE t.{key} = v.item_id",
            key = self.scope.key_column(),
        ));
        push_partition(&mut builder, self.scope, "t.");

        let result = builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| classify_sqlx_error(e, self.scope, "update orders"))?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> SequenceResult<()> {
        let PgSequenceTx { tx, scope } = *self;
        tx.commit()
            .await
            .map_err(|e| classify_sqlx_error(e, scope, "commit"))
    }

    async fn rollback(self: Box<Self>) -> SequenceResult<()> {
        let PgSequenceTx { tx, scope } = *self;
        tx.rollback()
            .await
            .map_err(|e| classify_sqlx_error(e, scope, "rollback"))
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create_goods(&self, new_goods: NewGoods, step: i64) -> StoreResult<Goods> {
        Goods::create(&self.pool, new_goods, step)
            .await
            .map_err(|e| StoreError::from_sqlx("create goods", &e))
    }

    async fn find_goods(&self, id: Uuid) -> StoreResult<Option<Goods>> {
        Goods::find_by_id(&self.pool, id)
            .await
            .map_err(|e| StoreError::from_sqlx("find goods", &e))
    }

    async fn list_goods(&self, page: Page) -> StoreResult<(Vec<Goods>, u64)> {
        let items = Goods::list_page(&self.pool, page)
            .await
            .map_err(|e| StoreError::from_sqlx("list goods", &e))?;
        let total = Goods::count(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("count goods", &e))?;

        Ok((items, u64::try_from(total).unwrap_or_default()))
    }

    async fn delete_goods(&self, id: Uuid) -> StoreResult<bool> {
        Goods::delete(&self.pool, id)
            .await
            .map_err(|e| StoreError::from_sqlx("delete goods", &e))
    }

    async fn create_showcase(&self, new_showcase: NewShowcase, step: i64) -> StoreResult<Showcase> {
        Showcase::create(&self.pool, new_showcase, step)
            .await
            .map_err(|e| StoreError::from_sqlx("create showcase", &e))
    }

    async fn find_showcase(&self, id: Uuid) -> StoreResult<Option<Showcase>> {
        Showcase::find_by_id(&self.pool, id)
            .await
            .map_err(|e| StoreError::from_sqlx("find showcase", &e))
    }

    async fn list_showcases(&self) -> StoreResult<Vec<Showcase>> {
        Showcase::list_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("list showcases", &e))
    }

    async fn delete_showcase(&self, id: Uuid) -> StoreResult<bool> {
        Showcase::delete(&self.pool, id)
            .await
            .map_err(|e| StoreError::from_sqlx("delete showcase", &e))
    }

    async fn add_showcase_goods(
        &self,
        showcase_id: Uuid,
        goods_id: Uuid,
        notes: Option<String>,
        step: i64,
    ) -> StoreResult<ShowcaseGoods> {
        if self.find_showcase(showcase_id).await?.is_none() {
            return Err(StoreError::not_found("showcase", showcase_id));
        }
        if self.find_goods(goods_id).await?.is_none() {
            return Err(StoreError::not_found("goods", goods_id));
        }

        ShowcaseGoods::add(&self.pool, showcase_id, goods_id, notes, step)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    StoreError::Conflict {
                        message: format!("goods {goods_id} is already in showcase {showcase_id}"),
                    }
                }
                // deleted between the existence check and the insert
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    StoreError::not_found("goods", goods_id)
                }
                _ => StoreError::from_sqlx("add showcase goods", &e),
            })
    }

    async fn remove_showcase_goods(&self, showcase_id: Uuid, goods_id: Uuid) -> StoreResult<bool> {
        ShowcaseGoods::remove(&self.pool, showcase_id, goods_id)
            .await
            .map_err(|e| StoreError::from_sqlx("remove showcase goods", &e))
    }

    async fn list_showcase_goods(&self, showcase_id: Uuid) -> StoreResult<Vec<ShowcaseGoodsEntry>> {
        ShowcaseGoods::list_entries(&self.pool, showcase_id)
            .await
            .map_err(|e| StoreError::from_sqlx("list showcase goods", &e))
    }
}
