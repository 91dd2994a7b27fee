use shared::{AppError, Result, TokenPair, TokenService};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::models::{NewUser, RegisterRequest, User, UserResponse};
use crate::repositories::UserRepository;

/// Registration, login and token-to-user resolution.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Returns the user only when the credentials match an active account.
    pub async fn authenticate_user(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.users.get_by_username(username).await? else {
            warn!(username, "login failed: user not found");
            return Ok(None);
        };
        if !self.tokens.verify_password(password, &user.hashed_password) {
            warn!(username, "login failed: invalid password");
            return Ok(None);
        }
        if !user.is_active {
            warn!(username, "login failed: inactive user");
            return Ok(None);
        }
        info!(username, role = %user.role, "login succeeded");
        Ok(Some(user))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        let user = self
            .authenticate_user(username, password)
            .await?
            .ok_or_else(|| AppError::authentication("Incorrect username or password"))?;

        self.tokens
            .issue_access_token(&user.username, user.role.as_str())
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse> {
        request.validate()?;

        if self.users.get_by_username(&request.username).await?.is_some() {
            return Err(AppError::bad_request("Username already registered"));
        }
        if self.users.get_by_email(&request.email).await?.is_some() {
            return Err(AppError::bad_request("Email already registered"));
        }

        let hashed_password = self.tokens.hash_password(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                username: request.username,
                email: request.email,
                hashed_password,
                role: request.role,
            })
            .await?;

        info!(
            user_id = user.id,
            username = %user.username,
            role = %user.role,
            "user created"
        );
        Ok(user.into())
    }

    /// Resolves a bearer token to an active user.
    pub async fn user_from_token(&self, token: &str) -> Result<User> {
        let claims = self.tokens.validate_token(token)?;

        let user = self
            .users
            .get_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AppError::authentication("Could not validate credentials"))?;

        if !user.is_active {
            return Err(AppError::authorization("Inactive user"));
        }
        Ok(user)
    }
}
