use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::{models::trade::Trade, providers::TradePage};

#[derive(Deserialize, Debug)]
pub struct AlpacaTrade {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "p")]
    pub price: f64,
    #[serde(rename = "s")]
    pub size: u64,
    #[serde(rename = "c", default)]
    pub conditions: Option<Vec<String>>,
    #[serde(rename = "x", default)]
    pub exchange: Option<String>,
    #[serde(rename = "i", default)]
    pub id: Option<u64>,
    #[serde(rename = "z", default)]
    pub tape: Option<String>,
}

impl From<AlpacaTrade> for Trade {
    fn from(at: AlpacaTrade) -> Self {
        Trade {
            timestamp: at.timestamp,
            price: at.price,
            size: at.size,
            conditions: at.conditions.unwrap_or_default(),
            exchange: at.exchange,
            id: at.id,
            tape: at.tape,
        }
    }
}

/// Body of `GET /v2/stocks/trades`.
///
/// `trades` is keyed by symbol; Alpaca omits the symbol (or sends `null` for
/// the whole map) when a page has no trades for it.
#[derive(Deserialize, Debug)]
pub struct AlpacaTradesResponse {
    #[serde(default)]
    pub trades: Option<IndexMap<String, Vec<AlpacaTrade>>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl AlpacaTradesResponse {
    pub fn into_page(self, symbol: &str) -> TradePage {
        let trades = self
            .trades
            .and_then(|mut by_symbol| by_symbol.shift_remove(symbol))
            .unwrap_or_default()
            .into_iter()
            .map(Trade::from)
            .collect();

        TradePage {
            trades,
            next_page_token: self.next_page_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn decodes_a_trades_page() {
        let body = r#"{
            "trades": {
                "AAPL": [
                    {"t": "2025-03-03T14:30:00.123456789Z", "x": "V", "p": 241.5, "s": 100, "c": ["@"], "i": 52983525029461, "z": "C"},
                    {"t": "2025-03-03T14:30:01Z", "p": 241.51, "s": 3, "c": ["@", "I"]}
                ]
            },
            "next_page_token": "QUFQTHwyMDI1"
        }"#;

        let page = serde_json::from_str::<AlpacaTradesResponse>(body)
            .unwrap()
            .into_page("AAPL");

        assert_eq!(page.next_page_token.as_deref(), Some("QUFQTHwyMDI1"));
        assert_eq!(page.trades.len(), 2);
        let first = &page.trades[0];
        assert_eq!(first.price, 241.5);
        assert_eq!(first.size, 100);
        assert_eq!(first.exchange.as_deref(), Some("V"));
        assert_eq!(first.tape.as_deref(), Some("C"));
        assert_eq!(
            first.timestamp,
            Utc.with_ymd_and_hms(2025, 3, 3, 14, 30, 0).unwrap()
                + chrono::Duration::nanoseconds(123_456_789)
        );
        assert_eq!(page.trades[1].conditions, vec!["@", "I"]);
    }

    #[test]
    fn empty_or_missing_symbol_is_an_empty_page() {
        for body in [
            r#"{"trades": {}, "next_page_token": null}"#,
            r#"{"trades": null, "next_page_token": null}"#,
            r#"{"trades": {"MSFT": []}}"#,
        ] {
            let page = serde_json::from_str::<AlpacaTradesResponse>(body)
                .unwrap()
                .into_page("AAPL");
            assert!(page.trades.is_empty(), "{body}");
            assert!(page.next_page_token.is_none());
        }
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let body = r#"{"trades": {"AAPL": [{"t": "2025-03-03T14:30:00Z", "p": "abc", "s": 1, "c": []}]}}"#;
        assert!(serde_json::from_str::<AlpacaTradesResponse>(body).is_err());
    }
}
