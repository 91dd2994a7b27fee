pub mod auth_service;
pub mod exchange_service;
pub mod vehicle_service;

pub use auth_service::AuthService;
pub use exchange_service::{
    get_usd_brl_rate, AwesomeApiProvider, ExchangeError, ExchangeRateResolver,
    FrankfurterProvider, RateProvider, USD_BRL_CACHE_KEY,
};
pub use vehicle_service::VehicleService;
