//! Tick-trade analysis: fetch one symbol's trades, aggregate them into OHLCV
//! bars with cumulative VWAP and a Donchian channel, then write a CSV table
//! and an interactive HTML chart.

pub mod aggregate;
pub mod bar;
pub mod chart;
pub mod config;
pub mod indicators;
pub mod logging;
pub mod pipeline;
pub mod sink;
pub mod timeframe;
pub mod window;

pub use aggregate::{AggregateError, AggregationOptions, GapPolicy, aggregate_trades};
pub use bar::Bar;
pub use config::AnalysisConfig;
pub use pipeline::{PipelineError, RunReport, run_pipeline};
