//! Trade → bar aggregation.
//!
//! Trades are bucketed by truncating their timestamp to the timeframe
//! boundary. Each non-empty bucket becomes one [`Bar`]; the session VWAP and
//! the Donchian channel are then computed across the resulting sequence.
//!
//! Empty buckets are skipped by default ([`GapPolicy::Skip`]). With
//! [`GapPolicy::ForwardFill`] every empty interval between two traded ones
//! gets a flat, zero-volume bar at the previous close.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use market_data_ingestor::models::trade::Trade;
use thiserror::Error;
use tracing::debug;

use crate::{
    bar::Bar,
    indicators::{CumulativeVwap, DonchianChannel},
    timeframe::{Timeframe, TimeframeError},
};

pub const DEFAULT_DONCHIAN_WINDOW: NonZeroUsize = match NonZeroUsize::new(20) {
    Some(nz) => nz,
    None => unreachable!(),
};

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("trade {index} at {timestamp} has invalid price {price}")]
    InvalidPrice {
        index: usize,
        timestamp: DateTime<Utc>,
        price: f64,
    },

    #[error("trade {index} at {timestamp} has zero size")]
    ZeroSize {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("trade {index} at {timestamp} is earlier than the trade before it ({previous})")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error(transparent)]
    Timeframe(#[from] TimeframeError),
}

/// What to do with intervals that saw no trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GapPolicy {
    /// Emit no bar for the interval.
    #[default]
    Skip,
    /// Emit a flat zero-volume bar at the previous close.
    ForwardFill,
}

#[derive(Debug, Clone)]
pub struct AggregationOptions {
    pub timeframe: Timeframe,
    pub gap_policy: GapPolicy,
    /// Lookback, in bars, of the Donchian channel.
    pub donchian_window: NonZeroUsize,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::ONE_MINUTE,
            gap_policy: GapPolicy::Skip,
            donchian_window: DEFAULT_DONCHIAN_WINDOW,
        }
    }
}

/// Aggregates time-ordered trades into bars with indicators.
///
/// `trades` must be sorted ascending by timestamp; equal timestamps keep their
/// given order. Fails on the first trade with a non-finite or non-positive
/// price, a zero size, or a timestamp earlier than its predecessor.
pub fn aggregate_trades(
    trades: &[Trade],
    options: &AggregationOptions,
) -> Result<Vec<Bar>, AggregateError> {
    let mut bars = build_ohlcv(trades, options.timeframe)?;
    let traded = bars.len();

    if options.gap_policy == GapPolicy::ForwardFill {
        bars = forward_fill(bars, options.timeframe);
    }
    apply_indicators(&mut bars, options.donchian_window);

    debug!(
        trades = trades.len(),
        bars = bars.len(),
        filled = bars.len() - traded,
        timeframe = %options.timeframe,
        "aggregated trades"
    );
    Ok(bars)
}

/// Recomputes `vwap` and the Donchian bands of `bars` from scratch.
pub fn apply_indicators(bars: &mut [Bar], donchian_window: NonZeroUsize) {
    let mut vwap = CumulativeVwap::new();
    let mut donchian = DonchianChannel::new(donchian_window);

    for bar in bars.iter_mut() {
        bar.vwap = vwap.push(bar.close, bar.volume);
        (bar.donchian_high, bar.donchian_low) = donchian.push(bar.high, bar.low);
    }
}

fn build_ohlcv(trades: &[Trade], timeframe: Timeframe) -> Result<Vec<Bar>, AggregateError> {
    let mut bars: Vec<Bar> = Vec::new();
    let mut previous: Option<DateTime<Utc>> = None;

    for (index, trade) in trades.iter().enumerate() {
        validate_trade(index, trade, previous)?;
        previous = Some(trade.timestamp);

        let start = timeframe.bucket_start(trade.timestamp)?;
        match bars.last_mut() {
            Some(bar) if bar.timestamp == start => bar.absorb(trade.price, trade.size),
            _ => bars.push(Bar::opening(start, trade.price, trade.size)),
        }
    }
    Ok(bars)
}

fn validate_trade(
    index: usize,
    trade: &Trade,
    previous: Option<DateTime<Utc>>,
) -> Result<(), AggregateError> {
    let timestamp = trade.timestamp;
    if !trade.price.is_finite() || trade.price <= 0.0 {
        return Err(AggregateError::InvalidPrice {
            index,
            timestamp,
            price: trade.price,
        });
    }
    if trade.size == 0 {
        return Err(AggregateError::ZeroSize { index, timestamp });
    }
    match previous {
        Some(previous) if timestamp < previous => Err(AggregateError::OutOfOrder {
            index,
            timestamp,
            previous,
        }),
        _ => Ok(()),
    }
}

fn forward_fill(bars: Vec<Bar>, timeframe: Timeframe) -> Vec<Bar> {
    let width = timeframe.width();
    let mut filled: Vec<Bar> = Vec::with_capacity(bars.len());

    for bar in bars {
        if let Some((last_start, close)) = filled.last().map(|b| (b.timestamp, b.close)) {
            let mut ts = last_start + width;
            while ts < bar.timestamp {
                filled.push(Bar::flat(ts, close));
                ts += width;
            }
        }
        filled.push(bar);
    }
    filled
}
