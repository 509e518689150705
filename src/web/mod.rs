//! # Web API Module
//!
//! Axum REST API over the catalogue and the ordering engine.
//!
//! - [`routes`] - route table
//! - [`handlers`] - request handlers per resource
//! - [`state`] - shared application state
//! - [`errors`] - `ApiError` and its JSON rendering

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;

pub use errors::{ApiError, ApiResult};

/// Create the main Axum application with all routes and middleware
pub fn create_app(app_state: AppState) -> Router {
    let request_timeout = app_state.config.server.request_timeout();

    Router::new()
        .merge(routes::health_routes())
        .nest("/api", routes::api_routes())
        .layer(tower_http::timeout::TimeoutLayer::new(request_timeout))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}
