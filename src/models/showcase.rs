use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A curated display of goods
/// Maps to the `showcases` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Showcase {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShowcase {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Membership of goods in a showcase, ordered per showcase
/// Maps to the `showcase_goods` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShowcaseGoods {
    pub id: Uuid,
    pub showcase_id: Uuid,
    pub goods_id: Uuid,
    pub notes: Option<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

/// Showcase member joined with the goods it refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShowcaseGoodsEntry {
    pub goods_id: Uuid,
    pub goods_name: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub sort_order: i64,
    pub added_at: DateTime<Utc>,
}

impl Showcase {
    /// Insert a showcase at the front of the showcase list
    pub async fn create(
        pool: &PgPool,
        new_showcase: NewShowcase,
        step: i64,
    ) -> Result<Showcase, sqlx::Error> {
        sqlx::query_as::<_, Showcase>(
            r#"
            INSERT INTO showcases (id, name, description, is_public, sort_order, created_at, updated_at)
            SELECT $1, $2, $3, $4, COALESCE(MIN(sort_order), 0) - $5, NOW(), NOW()
            FROM showcases
            RETURNING id, name, description, is_public, sort_order, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_showcase.name)
        .bind(&new_showcase.description)
        .bind(new_showcase.is_public)
        .bind(step)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Showcase>, sqlx::Error> {
        sqlx::query_as::<_, Showcase>(
            r#"
            SELECT id, name, description, is_public, sort_order, created_at, updated_at
            FROM showcases
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Showcase>, sqlx::Error> {
        sqlx::query_as::<_, Showcase>(
            r#"
            SELECT id, name, description, is_public, sort_order, created_at, updated_at
            FROM showcases
            ORDER BY sort_order ASC, created_at DESC, id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Delete a showcase; memberships cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM showcases WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl ShowcaseGoods {
    /// Add goods to the front of a showcase's sequence.
    ///
    /// Fails with a unique violation when the goods is already a member.
    pub async fn add(
        pool: &PgPool,
        showcase_id: Uuid,
        goods_id: Uuid,
        notes: Option<String>,
        step: i64,
    ) -> Result<ShowcaseGoods, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseGoods>(
            r#"
            INSERT INTO showcase_goods (id, showcase_id, goods_id, notes, sort_order, created_at)
            SELECT $1, $2, $3, $4, COALESCE(MIN(sort_order), 0) - $5, NOW()
            FROM showcase_goods
            WHERE showcase_id = $2
            RETURNING id, showcase_id, goods_id, notes, sort_order, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(showcase_id)
        .bind(goods_id)
        .bind(&notes)
        .bind(step)
        .fetch_one(pool)
        .await
    }

    pub async fn remove(pool: &PgPool, showcase_id: Uuid, goods_id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM showcase_goods WHERE showcase_id = $1 AND goods_id = $2")
                .bind(showcase_id)
                .bind(goods_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Members of a showcase in showcase sequence order
    pub async fn list_entries(
        pool: &PgPool,
        showcase_id: Uuid,
    ) -> Result<Vec<ShowcaseGoodsEntry>, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseGoodsEntry>(
            r#"
            SELECT sg.goods_id, g.name AS goods_name, g.quantity, sg.notes,
                   sg.sort_order, sg.created_at AS added_at
            FROM showcase_goods sg
            JOIN goods g ON g.id = sg.goods_id
            WHERE sg.showcase_id = $1
            ORDER BY sg.sort_order ASC, sg.created_at DESC, sg.goods_id DESC
            "#,
        )
        .bind(showcase_id)
        .fetch_all(pool)
        .await
    }
}
