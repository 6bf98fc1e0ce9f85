//! Fetch, aggregate and persist one symbol's trades.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use market_data_ingestor::{
    models::request_params::{ProviderParams, TradesRequestParams},
    providers::{FetchStatus, ProviderError, TradeFetch, TradeProvider},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    aggregate::{AggregateError, aggregate_trades},
    chart::ChartOptions,
    config::AnalysisConfig,
    sink::{BarSink, CsvBarSink, HtmlChartSink, SinkError},
    window::select_window,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetching trades failed: {0}")]
    Provider(#[from] ProviderError),

    /// The fetch stopped early and the run requires a complete data set.
    #[error("trade fetch for {symbol} stopped after {pages} page(s) and {trades} trade(s): {source}")]
    Incomplete {
        symbol: String,
        pages: usize,
        trades: usize,
        #[source]
        source: ProviderError,
    },

    #[error("aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: FetchStatus,
    pub pages: usize,
    pub trades: usize,
    pub bars: usize,
    pub csv_path: PathBuf,
    pub html_path: PathBuf,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        matches!(self.status, FetchStatus::Complete)
    }
}

/// Runs the whole analysis for `config.symbol` over the window ending
/// `config.window.days_back` days before `now`.
///
/// The CSV is written before the chart. A truncated fetch is analysed as far
/// as it goes unless `config.require_complete` is set, in which case nothing
/// is written.
pub async fn run_pipeline<P>(
    provider: &P,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> Result<RunReport, PipelineError>
where
    P: TradeProvider + ?Sized,
{
    let (start, end) = select_window(now, config.window.days_back, config.window.hours.get());
    let mut params = TradesRequestParams::new(config.symbol.as_str(), start, end);
    params.provider_specific = ProviderParams::Alpaca(config.alpaca.request_params());

    info!(symbol = %config.symbol, %start, %end, "fetching trades");
    let TradeFetch {
        symbol,
        mut trades,
        pages,
        status,
    } = provider.fetch_trades(params).await?;

    let status = match status {
        FetchStatus::Truncated { error } if config.require_complete => {
            return Err(PipelineError::Incomplete {
                symbol,
                pages,
                trades: trades.len(),
                source: error,
            });
        }
        FetchStatus::Truncated { error } => {
            warn!(
                %symbol,
                pages,
                trades = trades.len(),
                %error,
                "trade fetch truncated, continuing with partial data"
            );
            FetchStatus::Truncated { error }
        }
        FetchStatus::Complete => FetchStatus::Complete,
    };

    // Stable, so same-timestamp trades keep their delivery order.
    trades.sort_by_key(|t| t.timestamp);
    let bars = aggregate_trades(&trades, &config.aggregation())?;
    if bars.is_empty() {
        warn!(%symbol, "no trades in window, writing empty outputs");
    }

    let csv_path = CsvBarSink::new(&config.output.csv).write(&bars)?;
    let html_path =
        HtmlChartSink::new(&config.output.html, &symbol, ChartOptions::default()).write(&bars)?;

    Ok(RunReport {
        symbol,
        start,
        end,
        status,
        pages,
        trades: trades.len(),
        bars: bars.len(),
        csv_path,
        html_path,
    })
}
