//! Alpaca Market Data v2 historical trades (`GET /v2/stocks/trades`).

pub mod params;
pub mod provider;
pub mod response;

pub use params::{AlpacaTradesParams, Feed, Sort};
pub use provider::{AlpacaConfig, AlpacaProvider};
