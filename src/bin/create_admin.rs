//! Seeds the initial administrator account.
//!
//! Usage: `cargo run --bin create_admin` (password from `ADMIN_PASSWORD`, default `admin123`).

use anyhow::Result;
use shared::{Config, DatabaseService, TokenService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vehicle_api::models::{NewUser, UserRole};
use vehicle_api::repositories::{PgUserRepository, UserRepository};

const ADMIN_USERNAME: &str = "admin";
const ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.app.log_level))
        .init();

    let database = DatabaseService::new(&config.database).await?;
    sqlx::migrate!("./migrations").run(database.pool()).await?;

    let users = PgUserRepository::new(database.pool().clone());
    if users.get_by_username(ADMIN_USERNAME).await?.is_some() {
        warn!(username = ADMIN_USERNAME, "admin user already exists");
        return Ok(());
    }

    let password = std::env::var("ADMIN_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());

    let tokens = TokenService::new(&config.auth);
    let admin = users
        .create(NewUser {
            username: ADMIN_USERNAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            hashed_password: tokens.hash_password(&password)?,
            role: UserRole::Admin,
        })
        .await?;

    info!(
        user_id = admin.id,
        username = %admin.username,
        role = %admin.role,
        "admin user created"
    );
    Ok(())
}
