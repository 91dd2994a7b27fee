use axum::{middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cache;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod security;
pub mod services;
pub mod state;

use api::create_api_router;
use middleware::request_logging_middleware;
use security::{get_cors_layer, security_headers_middleware};
use state::AppState;

/// Vehicle payloads are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_api_router(app_state.clone()))
        .with_state(app_state)
        .layer(axum_middleware::from_fn(request_logging_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(get_cors_layer())
        .layer(axum_middleware::from_fn(security_headers_middleware))
}
