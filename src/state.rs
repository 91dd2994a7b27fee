use shared::{Config, DatabaseService, TokenService};
use std::sync::Arc;
use tracing::info;

use crate::cache::RateCache;
use crate::repositories::{PgUserRepository, PgVehicleRepository, UserRepository, VehicleRepository};
use crate::services::{AuthService, ExchangeRateResolver, VehicleService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub vehicles: VehicleService,
    pub exchange: Arc<ExchangeRateResolver>,
    /// `None` when running without a database (tests).
    pub database: Option<DatabaseService>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database = DatabaseService::new(&config.database).await?;
        let pool = database.pool().clone();

        let cache = RateCache::connect(&config.redis, config.exchange.cache_ttl_seconds).await;
        info!(remote = cache.has_remote(), "Rate cache initialized");

        let exchange = ExchangeRateResolver::from_config(&config.exchange, cache)?;
        if config.exchange.fixed_rate.is_some() {
            info!("Exchange rate override active (EXCHANGE_RATE_FIXED)");
        }

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgVehicleRepository::new(pool)),
            exchange,
            Some(database),
        ))
    }

    pub fn from_parts(
        config: Config,
        users: Arc<dyn UserRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        exchange: ExchangeRateResolver,
        database: Option<DatabaseService>,
    ) -> Self {
        let tokens = TokenService::new(&config.auth);
        Self {
            auth: AuthService::new(users, tokens),
            vehicles: VehicleService::new(vehicles),
            exchange: Arc::new(exchange),
            database,
            config: Arc::new(config),
        }
    }

    /// "connected", "disconnected" or "not configured", from a live ping.
    pub async fn database_status(&self) -> &'static str {
        match &self.database {
            Some(db) if db.ping().await.is_ok() => "connected",
            Some(_) => "disconnected",
            None => "not configured",
        }
    }
}
