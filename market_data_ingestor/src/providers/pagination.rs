//! Cursor-driven pagination shared by paginated trade providers.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    models::{request_params::TradesRequestParams, trade::Trade},
    providers::{InternalSnafu, ProviderError},
};

/// One page of trades plus the cursor for the next one.
#[derive(Debug, Clone, Default)]
pub struct TradePage {
    pub trades: Vec<Trade>,
    /// `None` or empty means this was the last page.
    pub next_page_token: Option<String>,
}

/// A source that can fetch exactly one page of trades.
#[async_trait]
pub trait TradePageSource: Send + Sync {
    /// Fetches the page identified by `page_token` (`None` for the first page).
    async fn fetch_page(
        &self,
        params: &TradesRequestParams,
        page_token: Option<&str>,
    ) -> Result<TradePage, ProviderError>;
}

/// Whether a fetch delivered everything the upstream had.
#[derive(Debug)]
pub enum FetchStatus {
    /// Every page was retrieved.
    Complete,
    /// A page failed; the trades before it are kept.
    Truncated { error: ProviderError },
}

/// Result of a (possibly partial) trade fetch.
#[derive(Debug)]
pub struct TradeFetch {
    pub symbol: String,
    /// Trades in the order the pages delivered them.
    pub trades: Vec<Trade>,
    /// Number of pages successfully received.
    pub pages: usize,
    pub status: FetchStatus,
}

impl TradeFetch {
    pub fn is_complete(&self) -> bool {
        matches!(self.status, FetchStatus::Complete)
    }
}

/// Requests pages from `source` until the continuation token runs out.
///
/// Pages are fetched strictly one after another and concatenated in arrival
/// order. The first failing page ends the loop; whatever was accumulated so
/// far is returned with [`FetchStatus::Truncated`].
pub async fn collect_pages<S>(source: &S, params: &TradesRequestParams) -> TradeFetch
where
    S: TradePageSource + ?Sized,
{
    let mut trades = Vec::new();
    let mut pages = 0usize;
    let mut page_token: Option<String> = None;
    let mut seen_tokens: HashSet<String> = HashSet::new();

    let status = loop {
        match source.fetch_page(params, page_token.as_deref()).await {
            Ok(page) => {
                pages += 1;
                debug!(
                    symbol = %params.symbol,
                    page = pages,
                    received = page.trades.len(),
                    "fetched trades page"
                );
                trades.extend(page.trades);

                match page.next_page_token.filter(|t| !t.is_empty()) {
                    // Any cursor seen before means the upstream is cycling.
                    Some(token) if seen_tokens.contains(&token) => {
                        let error = InternalSnafu {
                            message: format!("upstream repeated page token {token}"),
                        }
                        .build();
                        warn!(symbol = %params.symbol, pages, %error, "stopping pagination");
                        break FetchStatus::Truncated { error };
                    }
                    Some(token) => {
                        seen_tokens.insert(token.clone());
                        page_token = Some(token);
                    }
                    None => break FetchStatus::Complete,
                }
            }
            Err(error) => {
                warn!(
                    symbol = %params.symbol,
                    pages,
                    accumulated = trades.len(),
                    %error,
                    "trade fetch stopped early, keeping partial result"
                );
                break FetchStatus::Truncated { error };
            }
        }
    };

    TradeFetch {
        symbol: params.symbol.trim().to_string(),
        trades,
        pages,
        status,
    }
}
