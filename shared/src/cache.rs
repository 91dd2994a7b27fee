//! Remote key-value store used as the authoritative cache tier

use crate::{config::RedisConfig, error::AppError, Result};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Capability surface of a remote cache store.
///
/// Values are plain strings; the store is expected to expire keys written
/// through [`RemoteStore::set_ex`] on its own.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
    timeout: Duration,
}

impl RedisStore {
    pub async fn connect(url: &str, config: &RedisConfig) -> Result<Self> {
        info!("Initializing Redis connection");

        let client = Client::open(url)
            .map_err(|e| AppError::configuration(format!("Failed to create Redis client: {}", e)))?;

        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let connection = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| AppError::service_unavailable("redis (connect timeout)"))??;

        Ok(Self { connection, timeout })
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| AppError::service_unavailable(format!("redis ({} timeout)", operation)))?
            .map_err(AppError::from)
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        self.bounded("get", async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.connection.clone();
        self.bounded("set", async move {
            conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: String = self
            .bounded("ping", async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?;
        Ok(())
    }
}
