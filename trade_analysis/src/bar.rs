//! Minute-level (or coarser) OHLCV bar with session indicators.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One aggregated interval.
///
/// `vwap` is cumulative over the session up to and including this bar, not a
/// per-bar value. The Donchian bands are `None` until a full lookback window
/// of bars has accumulated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    /// Interval start (UTC), aligned to the aggregation timeframe.
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Shares traded in the interval.
    pub volume: u64,
    /// Trades in the interval. Zero for forward-filled bars.
    pub trade_count: u64,
    pub vwap: Option<f64>,
    pub donchian_high: Option<f64>,
    pub donchian_low: Option<f64>,
}

impl Bar {
    /// A bar with OHLC = `price` and no indicator values yet.
    pub(crate) fn opening(timestamp: DateTime<Utc>, price: f64, size: u64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: size,
            trade_count: 1,
            vwap: None,
            donchian_high: None,
            donchian_low: None,
        }
    }

    pub(crate) fn absorb(&mut self, price: f64, size: u64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += size;
        self.trade_count += 1;
    }

    /// Placeholder for an interval without trades: flat at `close`, zero volume.
    pub(crate) fn flat(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            volume: 0,
            trade_count: 0,
            ..Self::opening(timestamp, close, 0)
        }
    }

    /// True for bars inserted by gap filling.
    pub fn is_filled(&self) -> bool {
        self.trade_count == 0
    }
}
