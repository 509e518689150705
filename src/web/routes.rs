//! # Web API Route Definitions

use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers;
use crate::web::state::AppState;

/// Liveness endpoint, outside the `/api` prefix
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Catalogue routes, nested under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Goods
        .route(
            "/goods",
            post(handlers::goods::create_goods).get(handlers::goods::list_goods),
        )
        .route(
            "/goods/:id",
            get(handlers::goods::get_goods).delete(handlers::goods::delete_goods),
        )
        .route("/goods/:id/move", post(handlers::goods::move_goods))
        // Showcases
        .route(
            "/showcases",
            post(handlers::showcases::create_showcase).get(handlers::showcases::list_showcases),
        )
        .route(
            "/showcases/:id",
            get(handlers::showcases::get_showcase).delete(handlers::showcases::delete_showcase),
        )
        .route(
            "/showcases/:id/goods",
            get(handlers::showcases::list_showcase_goods),
        )
        .route(
            "/showcases/:id/add-goods",
            post(handlers::showcases::add_goods),
        )
        .route(
            "/showcases/:id/remove-goods",
            post(handlers::showcases::remove_goods),
        )
        .route(
            "/showcases/:id/move-goods",
            post(handlers::showcases::move_goods),
        )
}
