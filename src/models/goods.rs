use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::pagination::Page;

/// A catalogued merchandise item
/// Maps to the `goods` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Goods {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New goods for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoods {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

impl NewGoods {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: default_quantity(),
            notes: None,
        }
    }
}

impl Goods {
    /// Insert goods at the front of the goods sequence (current minimum minus `step`)
    pub async fn create(pool: &PgPool, new_goods: NewGoods, step: i64) -> Result<Goods, sqlx::Error> {
        let goods = sqlx::query_as::<_, Goods>(
            r#"
            INSERT INTO goods (id, name, quantity, notes, sort_order, created_at, updated_at)
            SELECT $1, $2, $3, $4, COALESCE(MIN(sort_order), 0) - $5, NOW(), NOW()
            FROM goods
            RETURNING id, name, quantity, notes, sort_order, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_goods.name)
        .bind(new_goods.quantity)
        .bind(&new_goods.notes)
        .bind(step)
        .fetch_one(pool)
        .await?;

        Ok(goods)
    }

    /// Find goods by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Goods>, sqlx::Error> {
        sqlx::query_as::<_, Goods>(
            r#"
            SELECT id, name, quantity, notes, sort_order, created_at, updated_at
            FROM goods
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List one page of goods in sequence order
    pub async fn list_page(pool: &PgPool, page: Page) -> Result<Vec<Goods>, sqlx::Error> {
        sqlx::query_as::<_, Goods>(
            r#"
            SELECT id, name, quantity, notes, sort_order, created_at, updated_at
            FROM goods
            ORDER BY sort_order ASC, created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM goods")
            .fetch_one(pool)
            .await
    }

    /// Delete goods; survivors keep their keys
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM goods WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
