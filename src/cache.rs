use dashmap::DashMap;
use shared::{config::RedisConfig, RedisStore, RemoteStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_RATE_TTL_SECONDS: u64 = 600;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    value: f64,
    /// `None` when the TTL is too large to represent; the entry never expires locally.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// Numeric value cache with TTL.
///
/// A remote store, when configured and reachable at construction, is
/// authoritative. The in-process map serves reads and writes whenever there
/// is no remote store or a remote call fails. Remote failures are logged and
/// never reach the caller.
#[derive(Clone)]
pub struct RateCache {
    remote: Option<Arc<dyn RemoteStore>>,
    local: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl RateCache {
    /// In-process only.
    pub fn in_memory(ttl_seconds: u64) -> Self {
        Self {
            remote: None,
            local: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Connects to Redis when `config.url` is set. Any failure while
    /// connecting or probing leaves the cache in pure in-process mode for its
    /// whole lifetime.
    pub async fn connect(config: &RedisConfig, ttl_seconds: u64) -> Self {
        let Some(url) = config.url.as_deref() else {
            info!("Rate cache running in-process only (REDIS_URL not set)");
            return Self::in_memory(ttl_seconds);
        };

        match RedisStore::connect(url, config).await {
            Ok(store) => Self::with_store(Arc::new(store), ttl_seconds).await,
            Err(e) => {
                warn!(error = %e, "Redis unavailable, rate cache falling back to memory");
                Self::in_memory(ttl_seconds)
            }
        }
    }

    /// Uses `store` as the remote tier if it answers a liveness probe.
    pub async fn with_store(store: Arc<dyn RemoteStore>, ttl_seconds: u64) -> Self {
        let mut cache = Self::in_memory(ttl_seconds);
        match store.ping().await {
            Ok(()) => {
                info!("Rate cache using remote store");
                cache.remote = Some(store);
            }
            Err(e) => {
                warn!(error = %e, "Remote store probe failed, rate cache falling back to memory");
            }
        }
        cache
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<f64> {
        if let Some(remote) = &self.remote {
            match remote.get(key).await {
                Ok(Some(raw)) => match raw.parse::<f64>() {
                    Ok(value) => return Some(value),
                    Err(e) => {
                        warn!(key, raw = %raw, error = %e, "Unparseable value in remote cache");
                    }
                },
                Ok(None) => return None,
                Err(e) => {
                    debug!(key, error = %e, "Remote cache read failed, using memory");
                }
            }
        }

        self.get_local(key)
    }

    pub async fn set(&self, key: &str, value: f64) {
        let expires_at = Instant::now().checked_add(self.ttl);

        if let Some(remote) = &self.remote {
            match remote
                .set_ex(key, &value.to_string(), self.ttl.as_secs().max(1))
                .await
            {
                Ok(()) => return,
                Err(e) => {
                    debug!(key, error = %e, "Remote cache write failed, using memory");
                }
            }
        }

        self.local
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }

    fn get_local(&self, key: &str) -> Option<f64> {
        let entry = *self.local.get(key)?;
        let now = Instant::now();
        if entry.is_expired(now) {
            // Guarded so a fresher concurrent write is not evicted.
            self.local.remove_if(key, |_, current| current.is_expired(now));
            return None;
        }
        Some(entry.value)
    }
}
