use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use shared::AppError;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{User, UserRole};
use crate::state::AppState;

/// Authenticated caller, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// Resolves the bearer token to an active user or rejects the request.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!(path = %request.uri().path(), "Missing Authorization header");
            AppError::authentication("Not authenticated")
        })?;

    let token = state.auth.tokens().extract_token_from_header(auth_header)?;
    let user = state.auth.user_from_token(token).await?;

    debug!(user_id = user.id, username = %user.username, "request authenticated");

    request.extensions_mut().insert(CurrentUser::from(user));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::authentication("Not authenticated"))
    }
}

/// An authenticated caller with the ADMIN role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            warn!(
                username = %user.username,
                role = %user.role,
                path = %parts.uri.path(),
                "admin access denied"
            );
            return Err(AppError::authorization(
                "Insufficient permissions. Admin role required.",
            ));
        }
        Ok(AdminUser(user))
    }
}
