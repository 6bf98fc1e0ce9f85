//! Interactive two-panel chart rendered as a standalone HTML page.
//!
//! The page loads plotly.js from its CDN and embeds the figure as JSON:
//!
//! - top panel: candlesticks, cumulative VWAP and both Donchian bands
//! - bottom panel: volume histogram sharing the time axis
//!
//! Missing indicator values are emitted as `null`, which plotly draws as a gap.

use serde_json::{Value, json};

use crate::bar::Bar;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Timestamp format used on the x axis (UTC, no offset).
pub const AXIS_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fraction of the vertical space separating the panels.
const PANEL_SPACING: f64 = 0.05;
/// Share of the remaining height given to the price panel.
const PRICE_PANEL_SHARE: f64 = 0.7;

#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Overrides the default `"<SYMBOL> Trading Analysis"` title.
    pub title: Option<String>,
    pub height: u32,
    pub template: String,
    pub plotly_src: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: None,
            height: 800,
            template: "plotly_white".to_string(),
            plotly_src: PLOTLY_CDN.to_string(),
        }
    }
}

/// Builds the plotly figure (`{"data": [...], "layout": {...}}`).
pub fn build_figure(symbol: &str, bars: &[Bar], options: &ChartOptions) -> Value {
    let x: Vec<String> = bars
        .iter()
        .map(|b| b.timestamp.format(AXIS_TIME_FORMAT).to_string())
        .collect();
    let column = |f: fn(&Bar) -> Option<f64>| bars.iter().map(f).collect::<Vec<_>>();

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| format!("{symbol} Trading Analysis"));

    let usable = 1.0 - PANEL_SPACING;
    let volume_top = usable * (1.0 - PRICE_PANEL_SHARE);
    let price_bottom = volume_top + PANEL_SPACING;

    json!({
        "data": [
            {
                "type": "candlestick",
                "name": "Price",
                "x": x,
                "open": column(|b| Some(b.open)),
                "high": column(|b| Some(b.high)),
                "low": column(|b| Some(b.low)),
                "close": column(|b| Some(b.close)),
                "increasing": {"line": {"color": "green"}},
                "decreasing": {"line": {"color": "red"}},
                "xaxis": "x",
                "yaxis": "y",
            },
            {
                "type": "scatter",
                "mode": "lines",
                "name": "VWAP",
                "x": x,
                "y": column(|b| b.vwap),
                "line": {"color": "cyan"},
                "xaxis": "x",
                "yaxis": "y",
            },
            {
                "type": "scatter",
                "mode": "lines",
                "name": "Donchian High",
                "x": x,
                "y": column(|b| b.donchian_high),
                "line": {"color": "blue", "dash": "dot"},
                "xaxis": "x",
                "yaxis": "y",
            },
            {
                "type": "scatter",
                "mode": "lines",
                "name": "Donchian Low",
                "x": x,
                "y": column(|b| b.donchian_low),
                "line": {"color": "blue", "dash": "dot"},
                "xaxis": "x",
                "yaxis": "y",
            },
            {
                "type": "bar",
                "name": "Volume",
                "x": x,
                "y": bars.iter().map(|b| b.volume).collect::<Vec<_>>(),
                "marker": {"color": "rgba(100, 100, 255, 0.4)"},
                "xaxis": "x2",
                "yaxis": "y2",
            },
        ],
        "layout": {
            "title": {"text": title},
            "height": options.height,
            "template": options.template,
            "showlegend": true,
            "xaxis": {
                "anchor": "y",
                "domain": [0.0, 1.0],
                "matches": "x2",
                "showticklabels": false,
                "rangeslider": {"visible": false},
            },
            "yaxis": {"anchor": "x", "domain": [price_bottom, 1.0]},
            "xaxis2": {"anchor": "y2", "domain": [0.0, 1.0]},
            "yaxis2": {"anchor": "x2", "domain": [0.0, volume_top]},
        },
    })
}

/// Renders the complete HTML document. Never fails; an empty `bars` slice
/// yields a page with empty traces.
pub fn render_html(symbol: &str, bars: &[Bar], options: &ChartOptions) -> String {
    let figure = build_figure(symbol, bars, options);
    let title = figure["layout"]["title"]["text"]
        .as_str()
        .unwrap_or(symbol)
        .to_string();
    // `</script>` inside the JSON would end the script element early.
    let figure = figure.to_string().replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{src}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:{height}px;"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{"responsive": true}});
</script>
</body>
</html>
"#,
        title = escape_html(&title),
        src = options.plotly_src,
        height = options.height,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
