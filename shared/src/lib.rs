//! Shared library for the vehicle inventory service
//!
//! This library contains the infrastructure pieces used by the service crate:
//! - Configuration loaded from the environment
//! - Error taxonomy and HTTP error rendering
//! - JWT issuance/verification and password hashing
//! - Remote key-value store (Redis) access
//! - Database pool construction

pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;

// Re-export commonly used types
pub use auth::{Claims, TokenPair, TokenService};
pub use cache::{RedisStore, RemoteStore};
pub use config::Config;
pub use database::DatabaseService;
pub use error::{AppError, ErrorResponse, Result};
