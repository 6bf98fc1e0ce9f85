//! Provider abstraction for market data sources.
//!
//! This module defines the [`TradeProvider`] trait, which serves as a unified interface
//! for fetching raw trades from any market data vendor (e.g., Alpaca, Polygon.io).
//!
//! Each concrete provider implementation should implement [`TradeProvider`] to handle
//! vendor-specific API logic and validation. Paginated vendors usually implement the
//! lower-level [`TradePageSource`] instead and delegate to [`collect_pages`].
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::request_params::TradesRequestParams;
//! use market_data_ingestor::providers::{FetchStatus, ProviderError, TradeFetch, TradeProvider};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl TradeProvider for MyProvider {
//!     async fn fetch_trades(
//!         &self,
//!         params: TradesRequestParams,
//!     ) -> Result<TradeFetch, ProviderError> {
//!         Ok(TradeFetch {
//!             symbol: params.symbol,
//!             trades: vec![],
//!             pages: 0,
//!             status: FetchStatus::Complete,
//!         })
//!     }
//! }
//! ```

pub mod alpaca_rest;
pub mod pagination;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::request_params::TradesRequestParams;

pub use pagination::{FetchStatus, TradeFetch, TradePage, TradePageSource, collect_pages};

/// Trait for fetching raw trades from a market data provider.
///
/// The trait is designed for async usage and supports dynamic dispatch
/// (`dyn TradeProvider`) for runtime selection of providers.
#[async_trait]
pub trait TradeProvider: Send + Sync {
    /// Fetches every trade for `params.symbol` in `[params.start, params.end)`.
    ///
    /// # Returns
    ///
    /// * `Ok(TradeFetch)` - The trades, plus whether the upstream delivered all of them.
    ///   Upstream failures part-way through are reported through
    ///   [`FetchStatus::Truncated`], not as `Err`.
    /// * `Err(ProviderError)` - The request was rejected before anything was sent.
    async fn fetch_trades(&self, params: TradesRequestParams) -> Result<TradeFetch, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `TradeProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API answered with a non-success status.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The response body did not match the expected schema.
    #[snafu(display("Failed to decode API response: {source}"))]
    Decode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An internal error occurred while processing data within the provider.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },
}
