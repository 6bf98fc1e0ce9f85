//! Console logging for the binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LEVEL: &str = "info";

/// Builds the filter: an explicit `level` wins, then `RUST_LOG`, then `info`.
///
/// HTTP client internals are capped at `warn` unless the directive names them.
pub fn build_filter(level: Option<&str>) -> anyhow::Result<EnvFilter> {
    let base = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL)),
    };
    Ok(base
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = build_filter(level)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
    Ok(())
}
