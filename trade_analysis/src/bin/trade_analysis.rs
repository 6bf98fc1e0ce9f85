use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use market_data_ingestor::providers::{FetchStatus, alpaca_rest::AlpacaProvider};
use shared_utils::config::load_first_env_file;
use tracing::{info, warn};
use trade_analysis::{AnalysisConfig, logging::init_tracing, run_pipeline};

const API_KEY_VARS: [&str; 2] = ["API_KEY", "APCA_API_KEY_ID"];
const SECRET_KEY_VARS: [&str; 2] = ["SECRET_KEY", "APCA_API_SECRET_KEY"];

#[derive(Parser)]
#[command(author, version, about = "Aggregate a symbol's trades into OHLCV bars and chart them")]
struct Cli {
    /// Path to the config file (trade_analysis.toml); defaults apply without one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticker to analyse, overrides the config file
    #[arg(long)]
    symbol: Option<String>,

    /// Credential file; replaces the default search list
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Insert flat bars for minutes without trades
    #[arg(long)]
    fill_gaps: bool,

    /// Fail instead of writing outputs when the fetch is cut short
    #[arg(long)]
    require_complete: bool,

    /// Open the chart in the default browser once written
    #[arg(long)]
    open: bool,

    /// Log filter, e.g. "debug" or "trade_analysis=trace" (default: RUST_LOG, then info)
    #[arg(long)]
    log_level: Option<String>,
}

fn env_file_candidates(explicit: Option<PathBuf>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path];
    }
    let mut candidates = vec![Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/.env")];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".alpaca.env"));
    }
    candidates.push(PathBuf::from(".env"));
    candidates
}

fn opener_command(path: &Path) -> Command {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(path);
    cmd
}

fn open_in_browser(path: &Path) -> io::Result<()> {
    let status = opener_command(path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("opener exited with {status}")))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(symbol) = cli.symbol {
        config.symbol = symbol;
    }
    config.fill_gaps |= cli.fill_gaps;
    config.require_complete |= cli.require_complete;

    // Credentials first: nothing touches the network without them.
    let env = load_first_env_file(&env_file_candidates(cli.env_file))?;
    info!(path = %env.path().display(), "loaded credentials");
    let api_key = env.require(&API_KEY_VARS)?;
    let secret_key = env.require(&SECRET_KEY_VARS)?;

    let provider = AlpacaProvider::new(config.alpaca.connection(api_key, secret_key))
        .context("building Alpaca client")?;

    let report = run_pipeline(&provider, &config, Utc::now()).await?;

    if let FetchStatus::Truncated { error } = &report.status {
        warn!(%error, "outputs were built from a partial fetch");
    }
    info!(
        symbol = %report.symbol,
        start = %report.start,
        end = %report.end,
        pages = report.pages,
        trades = report.trades,
        bars = report.bars,
        csv = %report.csv_path.display(),
        html = %report.html_path.display(),
        "analysis complete"
    );

    if cli.open {
        if let Err(error) = open_in_browser(&report.html_path) {
            warn!(%error, path = %report.html_path.display(), "could not open chart");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_keeps_defaults() {
        let cli = Cli::try_parse_from(["trade-analysis"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.fill_gaps);
        assert!(!cli.open);
    }

    #[test]
    fn open_flag_and_overrides_parse() {
        let cli = Cli::try_parse_from([
            "trade-analysis",
            "--symbol",
            "MSFT",
            "--open",
            "--require-complete",
        ])
        .unwrap();
        assert_eq!(cli.symbol.as_deref(), Some("MSFT"));
        assert!(cli.open);
        assert!(cli.require_complete);
    }

    #[test]
    fn opener_receives_the_chart_path() {
        let cmd = opener_command(Path::new("out/chart.html"));
        let last = cmd.get_args().last().unwrap();
        assert_eq!(last, "out/chart.html");
    }

    #[test]
    fn explicit_env_file_replaces_search_list() {
        let only = PathBuf::from("/tmp/creds.env");
        assert_eq!(env_file_candidates(Some(only.clone())), vec![only]);
        assert!(env_file_candidates(None).ends_with(&[PathBuf::from(".env")]));
    }
}
