//! Output sinks for the aggregated bars.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::info;

use crate::{
    bar::Bar,
    chart::{AXIS_TIME_FORMAT, ChartOptions, render_html},
};

/// Column order of the bar table.
pub const CSV_HEADER: [&str; 9] = [
    "Timestamp",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "VWAP",
    "Donchian_High",
    "Donchian_Low",
];

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The output's parent directory could not be created.
    #[snafu(display("Failed to create directory {}: {source}", path.display()))]
    CreateDir {
        path: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },

    /// A generic I/O error while writing the output.
    #[snafu(display("Failed to write {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },

    /// An error occurred while encoding bars as CSV.
    #[snafu(display("Failed to encode CSV for {}: {source}", path.display()))]
    Csv {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },
}

pub trait BarSink {
    /// The type of output returned after a successful write operation.
    type Output;

    /// Writes the bars to the destination.
    fn write(&self, bars: &[Bar]) -> Result<Self::Output, SinkError>;
}

fn ensure_parent(path: &Path) -> Result<(), SinkError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            fs::create_dir_all(dir).context(CreateDirSnafu { path: dir })
        }
        _ => Ok(()),
    }
}

#[derive(Serialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    vwap: Option<f64>,
    donchian_high: Option<f64>,
    donchian_low: Option<f64>,
}

impl From<&Bar> for CsvRow {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: bar.timestamp.format(AXIS_TIME_FORMAT).to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            vwap: bar.vwap,
            donchian_high: bar.donchian_high,
            donchian_low: bar.donchian_low,
        }
    }
}

/// Comma-separated bar table, one row per bar; absent indicators are empty fields.
#[derive(Debug, Clone)]
pub struct CsvBarSink {
    path: PathBuf,
}

impl CsvBarSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BarSink for CsvBarSink {
    type Output = PathBuf;

    fn write(&self, bars: &[Bar]) -> Result<PathBuf, SinkError> {
        ensure_parent(&self.path)?;

        // Header is written by hand so an empty table still has one.
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .context(CsvSnafu { path: &self.path })?;
        wtr.write_record(CSV_HEADER)
            .context(CsvSnafu { path: &self.path })?;
        for bar in bars {
            wtr.serialize(CsvRow::from(bar))
                .context(CsvSnafu { path: &self.path })?;
        }
        wtr.flush().context(IoSnafu { path: &self.path })?;

        info!(path = %self.path.display(), rows = bars.len(), "wrote bar table");
        Ok(self.path.clone())
    }
}

/// Interactive HTML chart.
#[derive(Debug, Clone)]
pub struct HtmlChartSink {
    path: PathBuf,
    symbol: String,
    options: ChartOptions,
}

impl HtmlChartSink {
    pub fn new(path: impl Into<PathBuf>, symbol: impl Into<String>, options: ChartOptions) -> Self {
        Self {
            path: path.into(),
            symbol: symbol.into(),
            options,
        }
    }
}

impl BarSink for HtmlChartSink {
    type Output = PathBuf;

    fn write(&self, bars: &[Bar]) -> Result<PathBuf, SinkError> {
        ensure_parent(&self.path)?;
        let html = render_html(&self.symbol, bars, &self.options);
        fs::write(&self.path, html).context(IoSnafu { path: &self.path })?;

        info!(path = %self.path.display(), bars = bars.len(), "wrote chart");
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    fn bar(minute: u32, vwap: Option<f64>, band: Option<(f64, f64)>) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 3, 9, minute, 0).unwrap(),
            open: 100.0,
            high: 102.0,
            low: 100.0,
            close: 102.0,
            volume: 15,
            trade_count: 2,
            vwap,
            donchian_high: band.map(|b| b.0),
            donchian_low: band.map(|b| b.1),
        }
    }

    #[test]
    fn csv_rows_and_empty_indicator_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data/ohlc_data.csv");
        let bars = vec![bar(30, Some(102.0), None), bar(31, Some(101.5), Some((102.0, 100.0)))];

        let written = CsvBarSink::new(&path).write(&bars).unwrap();

        assert_eq!(written, path);
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Timestamp,Open,High,Low,Close,Volume,VWAP,Donchian_High,Donchian_Low",
                "2025-03-03 09:30:00,100.0,102.0,100.0,102.0,15,102.0,,",
                "2025-03-03 09:31:00,100.0,102.0,100.0,102.0,15,101.5,102.0,100.0",
            ]
        );
    }

    #[test]
    fn empty_csv_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        CsvBarSink::new(&path).write(&[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn html_sink_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/charts/aapl.html");
        let sink = HtmlChartSink::new(&path, "AAPL", ChartOptions::default());

        sink.write(&[bar(30, None, None)]).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("AAPL Trading Analysis"));
    }

    #[test]
    fn unwritable_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened as a file.
        let err = CsvBarSink::new(dir.path()).write(&[]).unwrap_err();
        assert!(matches!(err, SinkError::Csv { .. }));
    }
}
