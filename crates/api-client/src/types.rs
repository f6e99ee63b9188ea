// In crates/api-client/src/types.rs

use crate::retry::RetryPolicy;
use core_types::RawClose;
use reqwest::Client;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The main client for the brapi quote API.
#[derive(Debug)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The base URL for the quote API.
    pub base_url: String,
    /// The user's API token.
    pub token: Option<SecretString>,
    /// History range requested per ticker (e.g., "5d").
    pub range: String,
    /// Candle interval (e.g., "30m").
    pub interval: String,
    /// Backoff applied to transient failures.
    pub retry: RetryPolicy,
}

/// Response of `GET /api/quote/{tickers}`.
#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub results: Vec<QuoteResult>,
}

/// One instrument inside a `QuoteResponse`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub symbol: String,
    /// Older responses call this field `historicalData`.
    #[serde(default, alias = "historicalData")]
    pub historical_data_price: Vec<Candle>,
}

/// A single OHLC candle. Only the fields the signal needs are kept.
#[derive(Debug, Deserialize)]
pub struct Candle {
    /// Candle time in unix seconds.
    pub date: i64,
    /// Shapes other than a number, a string or null read as missing.
    #[serde(default = "missing_close", deserialize_with = "lenient_close")]
    pub close: RawClose,
}

/// Error payload, e.g. `{"error": true, "message": "Invalid token"}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: bool,
    pub message: String,
}

fn missing_close() -> RawClose {
    RawClose::Missing
}

fn lenient_close<'de, D>(deserializer: D) -> Result<RawClose, D::Error>
where
    D: Deserializer<'de>,
{
    let close = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64().map_or(RawClose::Missing, RawClose::Number),
        Value::String(text) => RawClose::Text(text),
        _ => RawClose::Missing,
    };
    Ok(close)
}
