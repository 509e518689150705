//! # Showcase Handlers
//!
//! Showcases are curated lists of goods with their own ordering. Membership
//! rows carry the per-showcase key; moves inside a showcase never touch the
//! global goods order.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::MoveResponse;
use crate::logging::log_catalog_operation;
use crate::models::{NewShowcase, Showcase, ShowcaseGoods, ShowcaseGoodsEntry};
use crate::sequencing::Position;
use crate::web::errors::{parse_uuid, ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddGoodsRequest {
    pub goods_id: Uuid,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveGoodsRequest {
    pub goods_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveGoodsResponse {
    pub showcase_id: Uuid,
    pub goods_id: Uuid,
    pub removed: bool,
}

/// Body of `POST /api/showcases/:id/move-goods`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveShowcaseGoodsRequest {
    pub goods_id: Uuid,
    pub anchor_goods_id: Uuid,
    pub position: Position,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShowcaseGoodsListResponse {
    pub showcase_id: Uuid,
    pub items: Vec<ShowcaseGoodsEntry>,
}

/// Create a showcase: POST /api/showcases
pub async fn create_showcase(
    State(state): State<AppState>,
    Json(request): Json<NewShowcase>,
) -> ApiResult<(StatusCode, Json<Showcase>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Showcase name cannot be empty"));
    }

    let showcase = state.catalog.create_showcase(request, state.step()).await?;
    log_catalog_operation("create", "showcase", Some(showcase.id), "success", None);

    Ok((StatusCode::CREATED, Json(showcase)))
}

/// List showcases in sequence order: GET /api/showcases
pub async fn list_showcases(State(state): State<AppState>) -> ApiResult<Json<Vec<Showcase>>> {
    Ok(Json(state.catalog.list_showcases().await?))
}

/// Get a showcase: GET /api/showcases/:id
pub async fn get_showcase(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Showcase>> {
    let id = parse_uuid(&id)?;
    Ok(Json(require_showcase(&state, id).await?))
}

/// Delete a showcase and its memberships: DELETE /api/showcases/:id
pub async fn delete_showcase(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_uuid(&id)?;

    if !state.catalog.delete_showcase(id).await? {
        return Err(ApiError::not_found(format!("showcase {id} not found")));
    }
    log_catalog_operation("delete", "showcase", Some(id), "success", None);

    Ok(StatusCode::NO_CONTENT)
}

/// Members in showcase order: GET /api/showcases/:id/goods
pub async fn list_showcase_goods(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ShowcaseGoodsListResponse>> {
    let id = parse_uuid(&id)?;
    require_showcase(&state, id).await?;

    let items = state.catalog.list_showcase_goods(id).await?;
    Ok(Json(ShowcaseGoodsListResponse {
        showcase_id: id,
        items,
    }))
}

/// Add goods to the front of a showcase: POST /api/showcases/:id/add-goods
pub async fn add_goods(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddGoodsRequest>,
) -> ApiResult<(StatusCode, Json<ShowcaseGoods>)> {
    let id = parse_uuid(&id)?;

    let member = state
        .catalog
        .add_showcase_goods(id, request.goods_id, request.notes, state.step())
        .await?;
    log_catalog_operation(
        "add_goods",
        "showcase",
        Some(id),
        "success",
        Some(&format!("goods_id={}", request.goods_id)),
    );

    Ok((StatusCode::CREATED, Json(member)))
}

/// Remove goods from a showcase: POST /api/showcases/:id/remove-goods
pub async fn remove_goods(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RemoveGoodsRequest>,
) -> ApiResult<Json<RemoveGoodsResponse>> {
    let id = parse_uuid(&id)?;

    if !state
        .catalog
        .remove_showcase_goods(id, request.goods_id)
        .await?
    {
        return Err(ApiError::not_found(format!(
            "goods {} is not in showcase {id}",
            request.goods_id
        )));
    }
    log_catalog_operation(
        "remove_goods",
        "showcase",
        Some(id),
        "success",
        Some(&format!("goods_id={}", request.goods_id)),
    );

    Ok(Json(RemoveGoodsResponse {
        showcase_id: id,
        goods_id: request.goods_id,
        removed: true,
    }))
}

/// Reorder goods inside a showcase: POST /api/showcases/:id/move-goods
///
/// Both goods must be members of the showcase; the response id is the goods id.
pub async fn move_goods(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MoveShowcaseGoodsRequest>,
) -> ApiResult<Json<MoveResponse>> {
    let id = parse_uuid(&id)?;
    require_showcase(&state, id).await?;

    info!(
        showcase_id = %id,
        goods_id = %request.goods_id,
        anchor_goods_id = %request.anchor_goods_id,
        position = ?request.position,
        "Moving showcase goods via web API"
    );

    let outcome = state
        .ordering
        .move_showcase_goods(
            id,
            request.goods_id,
            request.anchor_goods_id,
            request.position,
        )
        .await?;

    Ok(Json(MoveResponse::from(outcome)))
}

async fn require_showcase(state: &AppState, id: Uuid) -> ApiResult<Showcase> {
    state
        .catalog
        .find_showcase(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("showcase {id} not found")))
}
