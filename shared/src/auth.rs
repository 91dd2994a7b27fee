//! Token issuance/verification and password hashing

use crate::{
    config::{AuthConfig, MAX_ACCESS_TOKEN_MINUTES},
    error::AppError,
    Result,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl: Duration,
    bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (username)
    pub role: String,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
    pub jti: String, // JWT ID
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            // Bounded so chrono arithmetic cannot overflow.
            access_token_ttl: Duration::minutes(
                config
                    .access_token_expire_minutes
                    .clamp(-MAX_ACCESS_TOKEN_MINUTES, MAX_ACCESS_TOKEN_MINUTES),
            ),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Issue a signed access token for `username` carrying its role
    pub fn issue_access_token(&self, username: &str, role: &str) -> Result<TokenPair> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            role: role.to_string(),
            exp: (now + self.access_token_ttl).timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let access_token = encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate access token: {}", e)))?;

        Ok(TokenPair {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.access_token_ttl.num_seconds(),
        })
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(JWT_ALGORITHM);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                _ => AppError::authentication("Could not validate credentials"),
            })?;

        Ok(token_data.claims)
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))
    }

    /// Malformed hashes count as a mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Extract token from Authorization header
    pub fn extract_token_from_header<'a>(&self, auth_header: &'a str) -> Result<&'a str> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Invalid authorization header format"))?
            .trim();

        if token.is_empty() {
            return Err(AppError::authentication("Empty token"));
        }

        Ok(token)
    }
}
