//! Run configuration.
//!
//! Everything has a default, so the pipeline runs without a config file. A
//! TOML file may override any subset of fields:
//!
//! ```toml
//! symbol = "MSFT"
//! interval = "5m"
//! fill_gaps = true
//!
//! [window]
//! days_back = 3
//!
//! [output]
//! csv = "out/msft.csv"
//!
//! [alpaca]
//! timeout_secs = 10
//! ```

use std::{num::NonZeroU32, num::NonZeroUsize, path::Path, path::PathBuf, time::Duration};

use anyhow::Context;
use market_data_ingestor::providers::alpaca_rest::{
    AlpacaConfig, AlpacaTradesParams, Feed, Sort, provider::DEFAULT_BASE_URL,
};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{AggregationOptions, DEFAULT_DONCHIAN_WINDOW, GapPolicy},
    timeframe::Timeframe,
};

const DEFAULT_WINDOW_HOURS: NonZeroU32 = match NonZeroU32::new(24) {
    Some(nz) => nz,
    None => unreachable!(),
};

const DEFAULT_REQUESTS_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(200) {
    Some(nz) => nz,
    None => unreachable!(),
};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub symbol: String,
    /// Bar width, e.g. `"1m"`.
    pub interval: Timeframe,
    pub donchian_window: NonZeroUsize,
    /// Forward-fill intervals without trades instead of skipping them.
    pub fill_gaps: bool,
    /// Abort before writing outputs when the fetch was truncated.
    pub require_complete: bool,
    pub window: WindowCfg,
    pub output: OutputCfg,
    pub alpaca: AlpacaCfg,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            interval: Timeframe::ONE_MINUTE,
            donchian_window: DEFAULT_DONCHIAN_WINDOW,
            fill_gaps: false,
            require_complete: false,
            window: WindowCfg::default(),
            output: OutputCfg::default(),
            alpaca: AlpacaCfg::default(),
        }
    }
}

/// Historical window ending `days_back` days before now and spanning `hours`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowCfg {
    pub days_back: u32,
    pub hours: NonZeroU32,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            days_back: 2,
            hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputCfg {
    pub html: PathBuf,
    pub csv: PathBuf,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            html: PathBuf::from("trading_analysis.html"),
            csv: PathBuf::from("data/ohlc_data.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlpacaCfg {
    pub base_url: String,
    pub timeout_secs: u64,
    pub feed: Feed,
    pub page_limit: u32,
    pub requests_per_minute: NonZeroU32,
}

impl Default for AlpacaCfg {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            feed: Feed::Sip,
            page_limit: 10_000,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        }
    }
}

impl AlpacaCfg {
    /// Connection settings for the given credentials.
    pub fn connection(&self, api_key: String, secret_key: String) -> AlpacaConfig {
        AlpacaConfig::new(api_key, secret_key)
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_requests_per_minute(self.requests_per_minute)
    }

    /// Per-request parameters.
    pub fn request_params(&self) -> AlpacaTradesParams {
        AlpacaTradesParams {
            feed: Some(self.feed),
            limit: Some(self.page_limit),
            sort: Some(Sort::Asc),
            currency: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid analysis config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn aggregation(&self) -> AggregationOptions {
        AggregationOptions {
            timeframe: self.interval,
            gap_policy: if self.fill_gaps {
                GapPolicy::ForwardFill
            } else {
                GapPolicy::Skip
            },
            donchian_window: self.donchian_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.symbol, "AAPL");
        assert_eq!(cfg.interval, Timeframe::ONE_MINUTE);
        assert_eq!(cfg.donchian_window.get(), 20);
        assert_eq!(cfg.window.days_back, 2);
        assert_eq!(cfg.window.hours.get(), 24);
        assert_eq!(cfg.output.csv, PathBuf::from("data/ohlc_data.csv"));
        assert_eq!(cfg.alpaca.timeout_secs, 30);
        assert_eq!(cfg.aggregation().gap_policy, GapPolicy::Skip);
    }

    #[test]
    fn partial_override() {
        let cfg = AnalysisConfig::from_toml_str(
            r#"
symbol = "MSFT"
interval = "5m"
fill_gaps = true

[window]
days_back = 3

[alpaca]
feed = "iex"
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.symbol, "MSFT");
        assert_eq!(cfg.interval.to_string(), "5m");
        assert_eq!(cfg.window.days_back, 3);
        assert_eq!(cfg.window.hours.get(), 24);
        assert_eq!(cfg.aggregation().gap_policy, GapPolicy::ForwardFill);
        assert_eq!(cfg.alpaca.request_params().feed, Some(Feed::Iex));
        assert_eq!(
            cfg.alpaca.connection("k".into(), "s".into()).timeout,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn example_file_matches_defaults() {
        let cfg =
            AnalysisConfig::from_toml_str(include_str!("../../config/trade_analysis.example.toml"))
                .unwrap();
        let defaults = AnalysisConfig::default();
        assert_eq!(cfg.symbol, defaults.symbol);
        assert_eq!(cfg.interval, defaults.interval);
        assert_eq!(cfg.output.html, defaults.output.html);
        assert_eq!(cfg.alpaca.base_url, defaults.alpaca.base_url);
        assert_eq!(cfg.alpaca.page_limit, defaults.alpaca.page_limit);
        assert_eq!(cfg.alpaca.requests_per_minute, defaults.alpaca.requests_per_minute);
    }

    #[test]
    fn unknown_fields_and_bad_values_are_rejected() {
        assert!(AnalysisConfig::from_toml_str("symbl = \"AAPL\"").is_err());
        assert!(AnalysisConfig::from_toml_str("interval = \"7x\"").is_err());
        assert!(AnalysisConfig::from_toml_str("donchian_window = 0").is_err());
    }
}
