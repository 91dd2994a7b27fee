//! Configuration management for the service

use serde::{Deserialize, Serialize};
use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub const DEFAULT_PRIMARY_RATE_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";
pub const DEFAULT_SECONDARY_RATE_URL: &str = "https://api.frankfurter.app/latest?from=USD&to=BRL";

/// Upper bound for `EXCHANGE_RATE_TTL` (30 days).
pub const MAX_RATE_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;
/// Upper bound for `ACCESS_TOKEN_EXPIRE_MINUTES` (one year).
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub exchange: ExchangeConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// `None` keeps the rate cache purely in-process.
    pub url: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub fixed_rate: Option<f64>,
    pub cache_ttl_seconds: u64,
    pub primary_url: String,
    pub secondary_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    pub project_name: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            fixed_rate: None,
            cache_ttl_seconds: 600,
            primary_url: DEFAULT_PRIMARY_RATE_URL.to_string(),
            secondary_url: DEFAULT_SECONDARY_RATE_URL.to_string(),
            timeout_seconds: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            database: DatabaseConfig {
                url: get("DATABASE_URL")
                    .unwrap_or_else(|| "postgresql://localhost:5432/vehicles".to_string()),
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_or(&get, "DATABASE_MIN_CONNECTIONS", 1)?,
                acquire_timeout_seconds: parse_or(&get, "DATABASE_ACQUIRE_TIMEOUT_SECONDS", 30)?,
            },
            redis: RedisConfig {
                url: get("REDIS_URL"),
                timeout_seconds: parse_or(&get, "REDIS_TIMEOUT_SECONDS", 2)?,
            },
            auth: AuthConfig {
                jwt_secret: get("JWT_SECRET")
                    .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?,
                access_token_expire_minutes: parse_in_range(
                    &get,
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    30,
                    1..=MAX_ACCESS_TOKEN_MINUTES,
                )?,
                bcrypt_cost: parse_or(&get, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            },
            exchange: ExchangeConfig {
                fixed_rate: parse_fixed_rate(&get)?,
                cache_ttl_seconds: parse_in_range(
                    &get,
                    "EXCHANGE_RATE_TTL",
                    600,
                    1..=MAX_RATE_TTL_SECONDS,
                )?,
                primary_url: get("EXCHANGE_PRIMARY_URL")
                    .unwrap_or_else(|| DEFAULT_PRIMARY_RATE_URL.to_string()),
                secondary_url: get("EXCHANGE_SECONDARY_URL")
                    .unwrap_or_else(|| DEFAULT_SECONDARY_RATE_URL.to_string()),
                timeout_seconds: parse_or(&get, "EXCHANGE_TIMEOUT_SECONDS", 5)?,
            },
            app: AppConfig {
                environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                log_level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "PORT", 8000)?,
                api_prefix: get("API_V1_PREFIX").unwrap_or_else(|| "/api/v1".to_string()),
                project_name: get("PROJECT_NAME").unwrap_or_else(|| "Vehicles API".to_string()),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid ({}): {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_in_range<T, G>(
    get: &G,
    key: &str,
    default: T,
    range: RangeInclusive<T>,
) -> anyhow::Result<T>
where
    T: FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, key, default)?;
    if !range.contains(&value) {
        anyhow::bail!(
            "{} must be between {} and {} (got {})",
            key,
            range.start(),
            range.end(),
            value
        );
    }
    Ok(value)
}

/// The override must be a positive, finite rate.
fn parse_fixed_rate<G>(get: &G) -> anyhow::Result<Option<f64>>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get("EXCHANGE_RATE_FIXED") else {
        return Ok(None);
    };
    let rate = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| anyhow::anyhow!("EXCHANGE_RATE_FIXED is invalid ({}): {}", raw, e))?;
    if !rate.is_finite() || rate <= 0.0 {
        anyhow::bail!("EXCHANGE_RATE_FIXED must be a positive number (got {})", raw);
    }
    Ok(Some(rate))
}
