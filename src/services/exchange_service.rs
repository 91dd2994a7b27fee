//! USD→BRL exchange rate lookup with caching and provider fallback.
//!
//! Resolution order: fixed override, cache, primary provider (AwesomeAPI),
//! secondary provider (Frankfurter). Each provider is tried once per call and
//! only a failure of every provider reaches the caller.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use shared::{config::ExchangeConfig, AppError, Config};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::RateCache;

pub const USD_BRL_CACHE_KEY: &str = "usd_brl";

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned no usable rate: {reason}")]
    MissingRate {
        provider: &'static str,
        reason: String,
    },

    #[error("exchange rate unavailable: {last_error}")]
    UpstreamUnavailable { last_error: String },
}

impl From<ExchangeError> for AppError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::UpstreamUnavailable { .. } => {
                AppError::service_unavailable("exchange rate providers")
            }
            other => AppError::external_service("exchange rate", other.to_string()),
        }
    }
}

/// An upstream source of the BRL-per-USD rate.
#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_rate(&self) -> Result<f64, ExchangeError>;
}

/// Accepts a JSON number or a numeric string; the rate must be positive.
fn rate_from_json(provider: &'static str, data: &Value, pointer: &str) -> Result<f64, ExchangeError> {
    let missing = |reason: String| ExchangeError::MissingRate { provider, reason };

    let rate = match data.pointer(pointer) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) | None => return Err(missing(format!("field {} not found", pointer))),
    }
    .ok_or_else(|| missing(format!("field {} is not numeric", pointer)))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(missing(format!("non-positive rate {}", rate)));
    }
    Ok(rate)
}

async fn get_json(client: &ReqwestClient, provider: &'static str, url: &str) -> Result<Value, ExchangeError> {
    let http = |source| ExchangeError::Http { provider, source };

    client
        .get(url)
        .send()
        .await
        .map_err(http)?
        .error_for_status()
        .map_err(http)?
        .json::<Value>()
        .await
        .map_err(http)
}

/// AwesomeAPI: `{"USDBRL": {"bid": "5.1234", ...}}`
pub struct AwesomeApiProvider {
    client: ReqwestClient,
    url: String,
}

impl AwesomeApiProvider {
    pub fn new(client: ReqwestClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateProvider for AwesomeApiProvider {
    fn name(&self) -> &'static str {
        "awesomeapi"
    }

    async fn fetch_rate(&self) -> Result<f64, ExchangeError> {
        let data = get_json(&self.client, self.name(), &self.url).await?;
        rate_from_json(self.name(), &data, "/USDBRL/bid")
    }
}

/// Frankfurter: `{"amount": 1.0, "base": "USD", "rates": {"BRL": 5.40}}`
pub struct FrankfurterProvider {
    client: ReqwestClient,
    url: String,
}

impl FrankfurterProvider {
    pub fn new(client: ReqwestClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &'static str {
        "frankfurter"
    }

    async fn fetch_rate(&self) -> Result<f64, ExchangeError> {
        let data = get_json(&self.client, self.name(), &self.url).await?;
        rate_from_json(self.name(), &data, "/rates/BRL")
    }
}

/// Tries `providers` in order and returns the first rate obtained.
pub async fn first_success(providers: &[Arc<dyn RateProvider>]) -> Result<f64, ExchangeError> {
    let mut last_error = String::from("no providers configured");

    for provider in providers {
        match provider.fetch_rate().await {
            Ok(rate) => {
                info!(provider = provider.name(), rate, "exchange rate fetched");
                return Ok(rate);
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "exchange rate provider failed");
                last_error = e.to_string();
            }
        }
    }

    Err(ExchangeError::UpstreamUnavailable { last_error })
}

pub struct ExchangeRateResolver {
    fixed_rate: Option<f64>,
    cache: RateCache,
    providers: Vec<Arc<dyn RateProvider>>,
}

impl ExchangeRateResolver {
    pub fn new(
        fixed_rate: Option<f64>,
        cache: RateCache,
        providers: Vec<Arc<dyn RateProvider>>,
    ) -> Self {
        Self {
            fixed_rate,
            cache,
            providers,
        }
    }

    /// AwesomeAPI first, Frankfurter as fallback, both with the configured timeout.
    pub fn from_config(config: &ExchangeConfig, cache: RateCache) -> Result<Self, AppError> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        let providers: Vec<Arc<dyn RateProvider>> = vec![
            Arc::new(AwesomeApiProvider::new(client.clone(), config.primary_url.clone())),
            Arc::new(FrankfurterProvider::new(client, config.secondary_url.clone())),
        ];

        Ok(Self::new(config.fixed_rate, cache, providers))
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// BRL per 1 USD.
    pub async fn resolve(&self) -> Result<f64, ExchangeError> {
        if let Some(rate) = self.fixed_rate {
            return Ok(rate);
        }

        if let Some(rate) = self.cache.get(USD_BRL_CACHE_KEY).await {
            debug!(rate, "exchange rate served from cache");
            return Ok(rate);
        }

        let rate = first_success(&self.providers).await?;
        self.cache.set(USD_BRL_CACHE_KEY, rate).await;
        Ok(rate)
    }
}

/// One-shot lookup. Builds a cache from `config` unless one is supplied.
pub async fn get_usd_brl_rate(config: &Config, cache: Option<RateCache>) -> Result<f64, AppError> {
    if let Some(rate) = config.exchange.fixed_rate {
        return Ok(rate);
    }

    let cache = match cache {
        Some(cache) => cache,
        None => RateCache::connect(&config.redis, config.exchange.cache_ttl_seconds).await,
    };

    let resolver = ExchangeRateResolver::from_config(&config.exchange, cache)?;
    Ok(resolver.resolve().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const AWESOME_PATH: &str = "/json/last/USD-BRL";
    const FRANKFURTER_PATH: &str = "/latest";

    fn exchange_config(server: &MockServer) -> ExchangeConfig {
        ExchangeConfig {
            fixed_rate: None,
            cache_ttl_seconds: 600,
            primary_url: format!("{}{}", server.uri(), AWESOME_PATH),
            secondary_url: format!("{}{}?from=USD&to=BRL", server.uri(), FRANKFURTER_PATH),
            timeout_seconds: 1,
        }
    }

    fn resolver(config: &ExchangeConfig, cache: RateCache) -> ExchangeRateResolver {
        ExchangeRateResolver::from_config(config, cache).unwrap()
    }

    async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, calls: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .expect(calls)
            .mount(server)
            .await;
    }

    fn awesome_body(bid: &str) -> Value {
        json!({ "USDBRL": { "code": "USD", "codein": "BRL", "bid": bid, "ask": "5.30" } })
    }

    fn frankfurter_body(rate: f64) -> Value {
        json!({ "amount": 1.0, "base": "USD", "date": "2024-01-02", "rates": { "BRL": rate } })
    }

    #[tokio::test]
    async fn test_fixed_rate_bypasses_cache_and_providers() {
        let server = MockServer::start().await;
        mount(&server, AWESOME_PATH, ResponseTemplate::new(200).set_body_json(awesome_body("5.00")), 0).await;
        mount(&server, FRANKFURTER_PATH, ResponseTemplate::new(200).set_body_json(frankfurter_body(5.0)), 0).await;

        let mut config = exchange_config(&server);
        config.fixed_rate = Some(5.25);
        let cache = RateCache::in_memory(600);
        cache.set(USD_BRL_CACHE_KEY, 4.99).await;

        let rate = resolver(&config, cache).resolve().await.unwrap();
        assert_eq!(rate, 5.25);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        let server = MockServer::start().await;
        mount(&server, AWESOME_PATH, ResponseTemplate::new(200).set_body_json(awesome_body("5.00")), 0).await;
        mount(&server, FRANKFURTER_PATH, ResponseTemplate::new(200).set_body_json(frankfurter_body(5.0)), 0).await;

        let cache = RateCache::in_memory(600);
        cache.set(USD_BRL_CACHE_KEY, 5.10).await;

        let rate = resolver(&exchange_config(&server), cache).resolve().await.unwrap();
        assert_eq!(rate, 5.10);
    }

    #[tokio::test]
    async fn test_primary_success_is_cached() {
        let server = MockServer::start().await;
        mount(&server, AWESOME_PATH, ResponseTemplate::new(200).set_body_json(awesome_body("5.1234")), 1).await;
        mount(&server, FRANKFURTER_PATH, ResponseTemplate::new(200).set_body_json(frankfurter_body(5.0)), 0).await;

        let resolver = resolver(&exchange_config(&server), RateCache::in_memory(600));

        assert_eq!(resolver.resolve().await.unwrap(), 5.1234);
        // Second call is answered by the cache; the primary expects exactly one hit.
        assert_eq!(resolver.resolve().await.unwrap(), 5.1234);
        assert_eq!(resolver.cache().get(USD_BRL_CACHE_KEY).await, Some(5.1234));
    }

    #[tokio::test]
    async fn test_falls_back_to_secondary_on_primary_error() {
        let server = MockServer::start().await;
        mount(&server, AWESOME_PATH, ResponseTemplate::new(500), 1).await;
        mount(&server, FRANKFURTER_PATH, ResponseTemplate::new(200).set_body_json(frankfurter_body(5.40)), 1).await;

        let resolver = resolver(&exchange_config(&server), RateCache::in_memory(600));

        assert_eq!(resolver.resolve().await.unwrap(), 5.40);
        assert_eq!(resolver.cache().get(USD_BRL_CACHE_KEY).await, Some(5.40));
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_field_missing() {
        let server = MockServer::start().await;
        mount(&server, AWESOME_PATH, ResponseTemplate::new(200).set_body_json(json!({ "USDBRL": {} })), 1).await;
        mount(&server, FRANKFURTER_PATH, ResponseTemplate::new(200).set_body_json(frankfurter_body(5.41)), 1).await;

        let rate = resolver(&exchange_config(&server), RateCache::in_memory(600))
            .resolve()
            .await
            .unwrap();
        assert_eq!(rate, 5.41);
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_times_out() {
        let server = MockServer::start().await;
        mount(
            &server,
            AWESOME_PATH,
            ResponseTemplate::new(200)
                .set_body_json(awesome_body("5.00"))
                .set_delay(Duration::from_secs(3)),
            1,
        )
        .await;
        mount(&server, FRANKFURTER_PATH, ResponseTemplate::new(200).set_body_json(frankfurter_body(5.42)), 1).await;

        let rate = resolver(&exchange_config(&server), RateCache::in_memory(600))
            .resolve()
            .await
            .unwrap();
        assert_eq!(rate, 5.42);
    }

    #[tokio::test]
    async fn test_total_failure_leaves_cache_untouched() {
        let server = MockServer::start().await;
        mount(&server, AWESOME_PATH, ResponseTemplate::new(503), 1).await;
        mount(&server, FRANKFURTER_PATH, ResponseTemplate::new(200).set_body_json(json!({ "rates": {} })), 1).await;

        let resolver = resolver(&exchange_config(&server), RateCache::in_memory(600));

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, ExchangeError::UpstreamUnavailable { .. }));
        assert_eq!(resolver.cache().get(USD_BRL_CACHE_KEY).await, None);

        let app_error: AppError = err.into();
        assert_eq!(app_error.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_get_usd_brl_rate_uses_injected_cache() {
        let server = MockServer::start().await;
        mount(&server, AWESOME_PATH, ResponseTemplate::new(200).set_body_json(awesome_body("5.00")), 0).await;

        let mut config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        config.exchange = exchange_config(&server);

        let cache = RateCache::in_memory(600);
        cache.set(USD_BRL_CACHE_KEY, 5.15).await;

        assert_eq!(get_usd_brl_rate(&config, Some(cache)).await.unwrap(), 5.15);

        config.exchange.fixed_rate = Some(5.25);
        assert_eq!(get_usd_brl_rate(&config, None).await.unwrap(), 5.25);
    }

    #[test]
    fn test_rate_from_json() {
        let data = json!({ "a": { "s": "5.5", "n": 5.6, "zero": "0", "text": "abc" } });
        assert_eq!(rate_from_json("t", &data, "/a/s").unwrap(), 5.5);
        assert_eq!(rate_from_json("t", &data, "/a/n").unwrap(), 5.6);
        assert!(rate_from_json("t", &data, "/a/zero").is_err());
        assert!(rate_from_json("t", &data, "/a/text").is_err());
        assert!(rate_from_json("t", &data, "/a/missing").is_err());
    }
}
