use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::alpaca_rest::AlpacaTradesParams;

/// Universal parameters for requesting raw trades for one symbol.
///
/// This struct is vendor-agnostic and is the standard input for all
/// [`TradeProvider`](crate::providers::TradeProvider) implementations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TradesRequestParams {
    /// Ticker to request (e.g. `"AAPL"`). Exactly one symbol per request.
    pub symbol: String,

    /// Start of the requested time range (inclusive, UTC).
    pub start: DateTime<Utc>,

    /// End of the requested time range (exclusive, UTC).
    pub end: DateTime<Utc>,

    /// Optional, provider-specific parameters.
    #[serde(default)]
    pub provider_specific: ProviderParams,
}

impl TradesRequestParams {
    /// Request for `symbol` over `[start, end)` with provider defaults.
    pub fn new(symbol: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
            provider_specific: ProviderParams::None,
        }
    }
}

/// An enum to hold provider-specific request parameters.
///
/// This allows callers to specify detailed, per-request options for a
/// particular provider without cluttering the universal `TradesRequestParams`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ProviderParams {
    #[default]
    None,
    Alpaca(AlpacaTradesParams),
}
