use async_trait::async_trait;
use market_dashboard_core::candle::{Candle, decode_price_history};
use market_dashboard_core::indicator::IndicatorSnapshot;
use market_dashboard_core::symbol::Symbol;
use market_dashboard_core::timeframe::TimeFrame;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::source::DashboardSource;

const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Client for the markets gateway HTTP API.
pub struct GatewayClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Serialize)]
struct AddSymbolRequest<'a> {
    symbol: &'a str,
}

impl GatewayClient {
    /// Create from the `DASHBOARD_API_URL` environment variable,
    /// falling back to `http://localhost:8000`.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url =
            std::env::var("DASHBOARD_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&base_url)
    }

    /// Create against an explicit gateway base URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "unsupported URL scheme '{}'",
                base_url.scheme()
            )));
        }

        Ok(Self {
            client: Client::builder().build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Config(format!("base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /health`. True when the gateway reports `ok`.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self.client.get(self.endpoint(&["health"])?).send().await?;
        Ok(is_ok(&read_json(response).await?))
    }

    /// `GET /watchlist`.
    pub async fn watchlist(&self) -> Result<Vec<Symbol>, ClientError> {
        let response = self.client.get(self.endpoint(&["watchlist"])?).send().await?;
        Ok(decode_watchlist(&read_json(response).await?))
    }

    /// `POST /watchlist`. Returns the updated watchlist.
    pub async fn add_symbol(&self, symbol: &Symbol) -> Result<Vec<Symbol>, ClientError> {
        let response = self
            .client
            .post(self.endpoint(&["watchlist"])?)
            .json(&AddSymbolRequest {
                symbol: symbol.as_str(),
            })
            .send()
            .await?;
        let symbols = decode_watchlist(&read_json(response).await?);
        info!("{symbol}: added to watchlist");
        Ok(symbols)
    }

    /// `DELETE /watchlist/{symbol}`. Returns the updated watchlist.
    pub async fn remove_symbol(&self, symbol: &Symbol) -> Result<Vec<Symbol>, ClientError> {
        let response = self
            .client
            .delete(self.endpoint(&["watchlist", symbol.as_str()])?)
            .send()
            .await?;
        let symbols = decode_watchlist(&read_json(response).await?);
        info!("{symbol}: removed from watchlist");
        Ok(symbols)
    }

    /// `POST /jobs/run-analysis`. Fire-and-forget: only the status is checked.
    pub async fn run_analysis(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.endpoint(&["jobs", "run-analysis"])?)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// `GET /telegram/test`. True when the gateway confirms the message was sent.
    pub async fn telegram_test(&self) -> Result<bool, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["telegram", "test"])?)
            .send()
            .await?;
        Ok(is_ok(&read_json(response).await?))
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status,
            message: body,
        });
    }
    Ok(response)
}

async fn read_json(response: Response) -> Result<Value, ClientError> {
    ensure_success(response)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::Parse(format!("failed to parse response: {e}")))
}

fn is_ok(body: &Value) -> bool {
    body.get("ok").and_then(Value::as_bool).unwrap_or(false)
}

/// `{symbols: [...]}`; anything else, or entries that are not valid symbols, are ignored.
fn decode_watchlist(body: &Value) -> Vec<Symbol> {
    body.get("symbols")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| Symbol::parse(s).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl DashboardSource for GatewayClient {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn fetch_indicators(
        &self,
        symbol: &Symbol,
        timeframe: TimeFrame,
    ) -> Result<IndicatorSnapshot, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["symbols", symbol.as_str(), "indicators"])?)
            .query(&[("tf", timeframe.as_str())])
            .send()
            .await?;

        let body = read_json(response).await?;
        IndicatorSnapshot::from_json(&body, symbol, timeframe)
            .ok_or_else(|| ClientError::Parse("indicator payload is not an object".into()))
    }

    async fn fetch_prices(
        &self,
        symbol: &Symbol,
        timeframe: TimeFrame,
        limit: usize,
    ) -> Result<Vec<Candle>, ClientError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.endpoint(&["symbols", symbol.as_str(), "prices"])?)
            .query(&[("tf", timeframe.as_str()), ("limit", limit.as_str())])
            .send()
            .await?;

        let body = read_json(response).await?;
        let candles = decode_price_history(&body);
        debug!("{symbol} {timeframe}: received {} candle(s)", candles.len());
        Ok(candles)
    }
}
