use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use shared::Result;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ExchangeRateResponse {
    pub pair: &'static str,
    pub rate: f64,
}

/// GET {prefix}/exchange/usd-brl - BRL per 1 USD
pub async fn usd_brl(State(state): State<Arc<AppState>>) -> Result<Json<ExchangeRateResponse>> {
    let rate = state.exchange.resolve().await?;
    Ok(Json(ExchangeRateResponse {
        pair: "USD-BRL",
        rate,
    }))
}

pub fn create_exchange_router() -> Router<Arc<AppState>> {
    Router::new().route("/usd-brl", get(usd_brl))
}
