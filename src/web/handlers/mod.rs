//! # Web API Request Handlers
//!
//! Handlers grouped by resource. Move endpoints share the
//! [`MoveRequest`]/[`MoveResponse`] shapes defined here.

pub mod goods;
pub mod health;
pub mod showcases;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sequencing::{MoveOutcome, Position};

/// Body of `POST /api/goods/:id/move`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub anchor_id: Uuid,
    pub position: Position,
}

/// Result of either move endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    pub id: Uuid,
    pub new_order: i64,
    pub moved: bool,
    pub detail: String,
}

impl From<MoveOutcome> for MoveResponse {
    fn from(outcome: MoveOutcome) -> Self {
        let detail = match &outcome {
            MoveOutcome::Unchanged { .. } => "item is its own anchor, nothing changed".to_string(),
            MoveOutcome::Moved {
                used_fallback: true,
                ..
            } => "placed one step past the anchor".to_string(),
            MoveOutcome::Moved {
                rebalance: Some(report),
                ..
            } => format!(
                "placed after rebalancing {} neighbouring items",
                report.updated
            ),
            MoveOutcome::Moved { .. } => "placed between its new neighbours".to_string(),
        };

        Self {
            id: outcome.id(),
            new_order: outcome.new_order(),
            moved: outcome.is_moved(),
            detail,
        }
    }
}

/// `?page=&per_page=` on list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
