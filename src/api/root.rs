use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::state::AppState;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub api_version: &'static str,
}

/// GET / - Liveness
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "online",
        message: format!("{} is running", state.config.app.project_name),
        version: API_VERSION,
    })
}

/// GET /health - Liveness plus a database ping
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = state.database_status().await;
    debug!(database, "health check");

    Json(HealthResponse {
        status: "healthy",
        database,
        api_version: API_VERSION,
    })
}

pub fn create_root_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}
