use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::{
    models::request_params::{ProviderParams, TradesRequestParams},
    providers::{ProviderError, ValidationSnafu},
};

/// Largest page the trades endpoint will return.
pub const MAX_PAGE_LIMIT: u32 = 10_000;

/// Specifies the source feed for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Sip => "sip",
            Feed::Iex => "iex",
            Feed::Otc => "otc",
        }
    }
}

/// Specifies the sort order for the trades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

impl Sort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::Asc => "asc",
            Sort::Desc => "desc",
        }
    }
}

/// Alpaca-specific parameters for a trades request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AlpacaTradesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

impl AlpacaTradesParams {
    fn from_request(params: &TradesRequestParams) -> Self {
        match &params.provider_specific {
            ProviderParams::Alpaca(p) => p.clone(),
            ProviderParams::None => Self::default(),
        }
    }
}

/// Ticker as the endpoint expects it and as it keys the response: trimmed, upper case.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

/// Rejects requests the trades endpoint would refuse or misinterpret.
pub fn validate_params(params: &TradesRequestParams) -> Result<(), ProviderError> {
    let symbol = params.symbol.trim();
    if symbol.is_empty() {
        return ValidationSnafu {
            message: "symbol must not be empty",
        }
        .fail();
    }
    if symbol.contains(|c: char| c == ',' || c.is_whitespace()) {
        return ValidationSnafu {
            message: format!("expected a single ticker, got {symbol:?}"),
        }
        .fail();
    }
    if params.start >= params.end {
        return ValidationSnafu {
            message: format!(
                "start ({}) must be before end ({})",
                params.start, params.end
            ),
        }
        .fail();
    }
    let limit = AlpacaTradesParams::from_request(params)
        .limit
        .unwrap_or(MAX_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return ValidationSnafu {
            message: format!("limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"),
        }
        .fail();
    }
    Ok(())
}

/// Builds the query string for the first page of a trades request.
///
/// The caller appends `page_token` for every following page.
pub fn construct_params(params: &TradesRequestParams) -> Vec<(String, String)> {
    let alpaca = AlpacaTradesParams::from_request(params);

    let mut query = vec![
        ("symbols".to_string(), normalize_symbol(&params.symbol)),
        (
            "start".to_string(),
            params.start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ),
        (
            "end".to_string(),
            params.end.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ),
        (
            "limit".to_string(),
            alpaca.limit.unwrap_or(MAX_PAGE_LIMIT).to_string(),
        ),
        (
            "feed".to_string(),
            alpaca.feed.unwrap_or_default().as_str().to_string(),
        ),
        (
            "sort".to_string(),
            alpaca.sort.unwrap_or_default().as_str().to_string(),
        ),
    ];
    if let Some(currency) = alpaca.currency {
        query.push(("currency".to_string(), currency));
    }
    query
}
