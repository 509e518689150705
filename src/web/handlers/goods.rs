//! # Goods Handlers
//!
//! CRUD over the global goods list plus the move endpoint that reorders it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{MoveRequest, MoveResponse, PageQuery};
use crate::logging::log_catalog_operation;
use crate::models::{Goods, NewGoods, Page, PaginationInfo};
use crate::web::errors::{parse_uuid, ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct GoodsListResponse {
    pub items: Vec<Goods>,
    pub pagination: PaginationInfo,
}

/// Create goods: POST /api/goods
///
/// New goods land at the front of the list.
pub async fn create_goods(
    State(state): State<AppState>,
    Json(request): Json<NewGoods>,
) -> ApiResult<(StatusCode, Json<Goods>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Goods name cannot be empty"));
    }
    if request.quantity < 0 {
        return Err(ApiError::bad_request("Quantity cannot be negative"));
    }

    let goods = state.catalog.create_goods(request, state.step()).await?;
    log_catalog_operation("create", "goods", Some(goods.id), "success", None);

    Ok((StatusCode::CREATED, Json(goods)))
}

/// List goods in sequence order: GET /api/goods
pub async fn list_goods(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<GoodsListResponse>> {
    let defaults = Page::default();
    let per_page = query
        .per_page
        .unwrap_or(defaults.per_page)
        .min(state.config.server.max_per_page);
    let page = Page::new(query.page.unwrap_or(defaults.page), per_page);

    let (items, total_count) = state.catalog.list_goods(page).await?;
    debug!(page = page.page, per_page = page.per_page, total_count, "Listed goods");

    Ok(Json(GoodsListResponse {
        items,
        pagination: PaginationInfo::new(page, total_count),
    }))
}

/// Get goods by id: GET /api/goods/:id
pub async fn get_goods(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Goods>> {
    let id = parse_uuid(&id)?;

    state
        .catalog
        .find_goods(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("goods {id} not found")))
}

/// Delete goods: DELETE /api/goods/:id
///
/// Showcase memberships of the goods go with it.
pub async fn delete_goods(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_uuid(&id)?;

    if !state.catalog.delete_goods(id).await? {
        return Err(ApiError::not_found(format!("goods {id} not found")));
    }
    log_catalog_operation("delete", "goods", Some(id), "success", None);

    Ok(StatusCode::NO_CONTENT)
}

/// Reorder goods: POST /api/goods/:id/move
///
/// Places the goods directly before or after `anchor_id`. Moving an item
/// onto itself answers `moved: false` without writing anything.
pub async fn move_goods(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> ApiResult<Json<MoveResponse>> {
    let id = parse_uuid(&id)?;

    info!(
        goods_id = %id,
        anchor_id = %request.anchor_id,
        position = ?request.position,
        "Moving goods via web API"
    );

    let outcome = state
        .ordering
        .move_goods(id, request.anchor_id, request.position)
        .await?;

    Ok(Json(MoveResponse::from(outcome)))
}
