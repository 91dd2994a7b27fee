use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Form, Router,
};
use shared::{Result, TokenPair};
use std::sync::Arc;
use tracing::info;

use crate::{
    models::{LoginRequest, RegisterRequest, UserResponse},
    state::AppState,
};

/// POST {prefix}/auth/register - Create a user account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    info!(username = %payload.username, role = %payload.role, "registration requested");

    let user = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST {prefix}/auth/login - Exchange form credentials for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(credentials): Form<LoginRequest>,
) -> Result<Json<TokenPair>> {
    let token = state
        .auth
        .login(&credentials.username, &credentials.password)
        .await?;
    Ok(Json(token))
}

pub fn create_auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
