//! # Health Check Handlers

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::system::SHIGU_CORE_VERSION;
use crate::services::MoveStatistics;
use crate::web::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub version: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub moves: MoveStatistics,
}

/// Basic health check endpoint: GET /health
///
/// Always answers while the process is serving; includes the move counters
/// of the ordering service.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Health check requested");

    Json(HealthResponse {
        status: "healthy".to_string(),
        backend: state.catalog.backend_name().to_string(),
        version: SHIGU_CORE_VERSION.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        moves: state.ordering.statistics(),
    })
}
