use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{
    Client,
    header::{self, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_first_env_var;
use snafu::ResultExt;
use tracing::info;

use crate::{
    models::request_params::TradesRequestParams,
    providers::{
        ApiSnafu, ClientBuildSnafu, DecodeSnafu, InvalidApiKeySnafu, MissingEnvVarSnafu,
        ProviderError, ProviderInitError, ReqwestSnafu, TradeFetch, TradePage, TradePageSource,
        TradeProvider,
        alpaca_rest::{
            params::{construct_params, normalize_symbol, validate_params},
            response::AlpacaTradesResponse,
        },
        collect_pages,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://data.alpaca.markets/v2";
const TRADES_ENDPOINT: &str = "/stocks/trades";

/// Connection settings for [`AlpacaProvider`].
#[derive(Debug)]
pub struct AlpacaConfig {
    pub api_key: SecretString,
    pub secret_key: SecretString,
    /// Market data root, without the endpoint path.
    pub base_url: String,
    /// Per-request timeout, covering connect through reading the body.
    pub timeout: Duration,
    /// Upper bound on page requests per minute.
    pub requests_per_minute: NonZeroU32,
}

impl AlpacaConfig {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            secret_key: SecretString::from(secret_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            // Free-plan budget.
            requests_per_minute: nonzero!(200u32),
        }
    }

    /// Reads API keys from `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`,
    /// falling back to `API_KEY` / `SECRET_KEY`.
    pub fn from_env() -> Result<Self, ProviderInitError> {
        let api_key =
            get_first_env_var(&["APCA_API_KEY_ID", "API_KEY"]).context(MissingEnvVarSnafu)?;
        let secret_key =
            get_first_env_var(&["APCA_API_SECRET_KEY", "SECRET_KEY"]).context(MissingEnvVarSnafu)?;
        Ok(Self::new(api_key, secret_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_requests_per_minute(mut self, rpm: NonZeroU32) -> Self {
        self.requests_per_minute = rpm;
        self
    }
}

pub struct AlpacaProvider {
    client: Client,
    trades_url: String,
    limiter: DefaultDirectRateLimiter,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider from explicit credentials and settings.
    pub fn new(config: AlpacaConfig) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            sensitive(config.api_key.expose_secret()).context(InvalidApiKeySnafu)?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            sensitive(config.secret_key.expose_secret()).context(InvalidApiKeySnafu)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            trades_url: format!("{}{}", config.base_url.trim_end_matches('/'), TRADES_ENDPOINT),
            limiter: RateLimiter::direct(Quota::per_minute(config.requests_per_minute)),
        })
    }

    pub fn trades_url(&self) -> &str {
        &self.trades_url
    }
}

fn sensitive(value: &str) -> Result<HeaderValue, header::InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(value)?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl TradePageSource for AlpacaProvider {
    async fn fetch_page(
        &self,
        params: &TradesRequestParams,
        page_token: Option<&str>,
    ) -> Result<TradePage, ProviderError> {
        let mut query_params = construct_params(params);
        if let Some(token) = page_token {
            query_params.push(("page_token".to_string(), token.to_string()));
        }

        self.limiter.until_ready().await;

        let response = self
            .client
            .get(&self.trades_url)
            .query(&query_params)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let body = response.text().await.context(ReqwestSnafu)?;

        if !status.is_success() {
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown API error").to_string()
            } else {
                body
            };
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let alpaca_response: AlpacaTradesResponse =
            serde_json::from_str(&body).context(DecodeSnafu)?;

        Ok(alpaca_response.into_page(&normalize_symbol(&params.symbol)))
    }
}

#[async_trait]
impl TradeProvider for AlpacaProvider {
    async fn fetch_trades(
        &self,
        mut params: TradesRequestParams,
    ) -> Result<TradeFetch, ProviderError> {
        validate_params(&params)?;
        params.symbol = normalize_symbol(&params.symbol);

        info!(
            symbol = %params.symbol,
            start = %params.start,
            end = %params.end,
            "fetching trades from Alpaca"
        );
        let fetch = collect_pages(self, &params).await;
        info!(
            symbol = %fetch.symbol,
            trades = fetch.trades.len(),
            pages = fetch.pages,
            complete = fetch.is_complete(),
            "trade fetch finished"
        );

        Ok(fetch)
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::*;
    use crate::providers::FetchStatus;

    /// Answers a single HTTP request with `response` and hands back the raw request.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (format!("http://{addr}/v2"), handle)
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn provider_at(base_url: &str) -> AlpacaProvider {
        AlpacaProvider::new(
            AlpacaConfig::new("key", "secret")
                .with_base_url(base_url)
                .with_timeout(Duration::from_secs(5)),
        )
        .unwrap()
    }

    fn last_hour(symbol: &str) -> TradesRequestParams {
        let now = chrono::Utc::now();
        TradesRequestParams::new(symbol, now - chrono::Duration::hours(1), now)
    }

    #[tokio::test]
    async fn error_status_with_empty_body_uses_canonical_reason() {
        let (base_url, server) =
            serve_once(http_response("500 Internal Server Error", "")).await;

        let fetch = provider_at(&base_url)
            .fetch_trades(last_hour("AAPL"))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(fetch.pages, 0);
        match &fetch.status {
            FetchStatus::Truncated {
                error: ProviderError::Api { status, message, .. },
            } => {
                assert_eq!(*status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_keeps_the_body_as_message() {
        let (base_url, server) =
            serve_once(http_response("403 Forbidden", r#"{"message":"forbidden."}"#)).await;

        let fetch = provider_at(&base_url)
            .fetch_trades(last_hour("AAPL"))
            .await
            .unwrap();
        server.await.unwrap();

        match &fetch.status {
            FetchStatus::Truncated {
                error: ProviderError::Api { status, message, .. },
            } => {
                assert_eq!(*status, 403);
                assert!(message.contains("forbidden."));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let body = r#"{"trades":{"AAPL":[{"t":"2025-03-03T14:30:00Z","p":"x","s":1,"c":[]}]}}"#;
        let (base_url, server) = serve_once(http_response("200 OK", body)).await;

        let fetch = provider_at(&base_url)
            .fetch_trades(last_hour("AAPL"))
            .await
            .unwrap();
        server.await.unwrap();

        assert!(fetch.trades.is_empty());
        assert!(matches!(
            fetch.status,
            FetchStatus::Truncated {
                error: ProviderError::Decode { .. }
            }
        ));
    }

    #[tokio::test]
    async fn lowercase_symbol_matches_upper_case_response_key() {
        let body = r#"{"trades":{"AAPL":[{"t":"2025-03-03T14:30:00Z","p":241.5,"s":10,"c":["@"]}]},"next_page_token":null}"#;
        let (base_url, server) = serve_once(http_response("200 OK", body)).await;

        let fetch = provider_at(&base_url)
            .fetch_trades(last_hour(" aapl"))
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /v2/stocks/trades?symbols=AAPL&"));
        assert!(request.to_ascii_lowercase().contains("apca-api-key-id: key"));
        assert!(fetch.is_complete());
        assert_eq!(fetch.symbol, "AAPL");
        assert_eq!(fetch.trades.len(), 1);
        assert_eq!(fetch.trades[0].price, 241.5);
    }

    #[test]
    fn base_url_is_joined_with_endpoint() {
        let provider = AlpacaProvider::new(
            AlpacaConfig::new("key", "secret").with_base_url("http://127.0.0.1:9/v2/"),
        )
        .unwrap();
        assert_eq!(provider.trades_url(), "http://127.0.0.1:9/v2/stocks/trades");
    }

    #[test]
    fn header_unsafe_keys_are_rejected() {
        let result = AlpacaProvider::new(AlpacaConfig::new("bad\nkey", "secret"));
        assert!(matches!(
            result,
            Err(ProviderInitError::InvalidApiKey { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_params_are_rejected_before_any_request() {
        // Port 9 (discard) is never contacted: validation fails first.
        let provider = AlpacaProvider::new(
            AlpacaConfig::new("key", "secret").with_base_url("http://127.0.0.1:9/v2"),
        )
        .unwrap();
        let now = chrono::Utc::now();
        let params = TradesRequestParams::new("", now - chrono::Duration::hours(1), now);

        let result = provider.fetch_trades(params).await;
        assert!(matches!(result, Err(ProviderError::Validation { .. })));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_reported_as_truncation() {
        let provider = AlpacaProvider::new(
            AlpacaConfig::new("key", "secret")
                .with_base_url("http://127.0.0.1:9/v2")
                .with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let now = chrono::Utc::now();
        let params = TradesRequestParams::new("AAPL", now - chrono::Duration::hours(1), now);

        let fetch = provider.fetch_trades(params).await.unwrap();
        assert!(!fetch.is_complete());
        assert!(fetch.trades.is_empty());
    }
}
