use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

use crate::{middleware::require_auth, state::AppState};

pub mod auth;
pub mod exchange;
pub mod root;
pub mod vehicles;

// ============================================================================
// API ROUTER
// ============================================================================

/// Routes that require a bearer token.
fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/vehicles", vehicles::create_vehicles_router())
        .nest("/exchange", exchange::create_exchange_router())
        .route_layer(from_fn_with_state(state, require_auth))
}

pub fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let prefix = state.config.app.api_prefix.clone();

    let versioned = Router::new()
        .nest("/auth", auth::create_auth_router())
        .merge(create_protected_router(state));

    Router::new()
        .merge(root::create_root_router())
        .nest(&prefix, versioned)
}
