use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row as the sequence engine sees it: identity, order key and tie-breaker.
///
/// For the goods list `id` is the goods id; inside a showcase it is the
/// member's goods id, which is unique per showcase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderedItem {
    pub id: Uuid,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderedItem {
    pub fn new(id: Uuid, sort_order: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            sort_order,
            created_at,
        }
    }
}
