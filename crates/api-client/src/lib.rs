// In crates/api-client/src/lib.rs

use app_config::QuoteSettings;
use async_trait::async_trait;
use chrono::DateTime;
use core_types::{RawSample, Ticker};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

pub mod error;
pub mod retry;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use retry::RetryPolicy;
pub use types::*;

/// Longest error body kept in an `Error::HttpStatus`.
const MAX_ERROR_BODY: usize = 512;

/// A source of raw price history for one instrument.
///
/// Implementations own their timeout and retry policy; whatever they return
/// is handed to the signal core as-is.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_history(&self, ticker: &Ticker) -> Result<Vec<RawSample>>;
}

impl ApiClient {
    /// Constructs a new ApiClient from QuoteSettings.
    pub fn new(settings: &QuoteSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("mms-alerts/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings
                .token
                .as_ref()
                .map(|token| SecretString::from(token.expose_secret().to_owned())),
            range: settings.range.clone(),
            interval: settings.interval.clone(),
            retry: RetryPolicy::from(&settings.retry),
        })
    }

    /// Fetches the candle history of a single ticker, retrying transient failures.
    ///
    /// This corresponds to the `GET /api/quote/{ticker}` endpoint.
    pub async fn get_price_history(&self, ticker: &Ticker) -> Result<Vec<RawSample>> {
        retry::retry_with_backoff(&self.retry, ticker.as_str(), || {
            self.get_price_history_once(ticker)
        })
        .await
    }

    async fn get_price_history_once(&self, ticker: &Ticker) -> Result<Vec<RawSample>> {
        let url = format!("{}/api/quote/{}", self.base_url, ticker);

        let mut request = self
            .http_client
            .get(&url)
            .query(&[("range", self.range.as_str()), ("interval", self.interval.as_str())]);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.expose_secret())]);
        }

        tracing::debug!(%ticker, url = %url, "Requesting price history...");

        let response = request.send().await.map_err(Error::RequestFailed)?;
        let status = response.status();
        let body = response.text().await.map_err(Error::RequestFailed)?;

        if !status.is_success() {
            // The provider usually explains itself; prefer its message over the raw body.
            if let Ok(api_error) = serde_json::from_str::<ApiErrorBody>(&body) {
                return Err(Error::ApiError {
                    status: status.as_u16(),
                    msg: api_error.message,
                });
            }
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: truncate(body, MAX_ERROR_BODY),
            });
        }

        parse_history(ticker, &body)
    }
}

#[async_trait]
impl QuoteSource for ApiClient {
    fn name(&self) -> &'static str {
        "brapi"
    }

    async fn fetch_history(&self, ticker: &Ticker) -> Result<Vec<RawSample>> {
        self.get_price_history(ticker).await
    }
}

/// Extracts the raw `(timestamp, close)` pairs for `ticker` from a quote response body.
///
/// Candles with an out-of-range timestamp are skipped. Close values are left
/// untouched; validating them is the preparer's job.
pub fn parse_history(ticker: &Ticker, body: &str) -> Result<Vec<RawSample>> {
    // Some error payloads arrive with a 200 status.
    if let Ok(api_error) = serde_json::from_str::<ApiErrorBody>(body) {
        if api_error.error {
            return Err(Error::ApiError {
                status: 200,
                msg: api_error.message,
            });
        }
    }

    let response: QuoteResponse = serde_json::from_str(body).map_err(Error::DeserializationFailed)?;

    let mut results = response.results;
    let position = results
        .iter()
        .position(|r| r.symbol.eq_ignore_ascii_case(ticker.as_str()))
        .unwrap_or(0);
    if results.is_empty() {
        return Err(Error::EmptyHistory(ticker.to_string()));
    }
    let result = results.swap_remove(position);

    let total = result.historical_data_price.len();
    let samples: Vec<RawSample> = result
        .historical_data_price
        .into_iter()
        .filter_map(|candle| {
            DateTime::from_timestamp(candle.date, 0).map(|timestamp| RawSample {
                timestamp,
                close: candle.close,
            })
        })
        .collect();

    if samples.len() < total {
        tracing::debug!(%ticker, skipped = total - samples.len(), "Skipped candles with invalid timestamps.");
    }
    if samples.is_empty() {
        return Err(Error::EmptyHistory(ticker.to_string()));
    }

    Ok(samples)
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::RawClose;

    fn petr4() -> Ticker {
        Ticker::new("PETR4").unwrap()
    }

    #[test]
    fn parses_historical_candles() {
        let body = r#"{
            "results": [{
                "symbol": "PETR4",
                "regularMarketPrice": 37.1,
                "historicalDataPrice": [
                    {"date": 1700000000, "open": 36.9, "close": 37.05, "volume": 1200},
                    {"date": 1700001800, "close": null},
                    {"date": 1700003600, "close": "37.40"},
                    {"date": 1700005400}
                ]
            }],
            "requestedAt": "2023-11-14T22:13:20.000Z"
        }"#;

        let samples = parse_history(&petr4(), body).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].timestamp.timestamp(), 1_700_000_000);
        assert_eq!(samples[0].close, RawClose::Number(37.05));
        assert_eq!(samples[1].close, RawClose::Missing);
        assert_eq!(samples[2].close, RawClose::Text("37.40".into()));
        assert_eq!(samples[3].close, RawClose::Missing);
    }

    #[test]
    fn unexpected_close_shapes_only_drop_their_candle() {
        let body = r#"{"results": [{"symbol": "PETR4", "historicalDataPrice": [
            {"date": 1700000000, "close": 10},
            {"date": 1700001800, "close": true},
            {"date": 1700003600, "close": {"v": 1}},
            {"date": 1700005400, "close": [1]},
            {"date": 1700007200, "close": 12}
        ]}]}"#;

        let samples = parse_history(&petr4(), body).unwrap();
        let closes: Vec<&RawClose> = samples.iter().map(|s| &s.close).collect();
        assert_eq!(
            closes,
            vec![
                &RawClose::Number(10.0),
                &RawClose::Missing,
                &RawClose::Missing,
                &RawClose::Missing,
                &RawClose::Number(12.0),
            ]
        );
    }

    #[test]
    fn accepts_legacy_historical_data_field() {
        let body = r#"{"results": [{"symbol": "VALE3", "historicalData": [{"date": 1700000000, "close": 61.2}]}]}"#;
        let samples = parse_history(&Ticker::new("VALE3").unwrap(), body).unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn picks_the_matching_symbol() {
        let body = r#"{"results": [
            {"symbol": "VALE3", "historicalDataPrice": [{"date": 1700000000, "close": 61.2}]},
            {"symbol": "petr4", "historicalDataPrice": [{"date": 1700000000, "close": 37.0}, {"date": 1700001800, "close": 37.5}]}
        ]}"#;
        let samples = parse_history(&petr4(), body).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn error_payload_becomes_api_error() {
        let body = r#"{"error": true, "message": "Invalid token"}"#;
        match parse_history(&petr4(), body) {
            Err(Error::ApiError { msg, .. }) => assert_eq!(msg, "Invalid token"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_history_is_empty_history() {
        let empty_results = r#"{"results": []}"#;
        assert!(matches!(parse_history(&petr4(), empty_results), Err(Error::EmptyHistory(_))));

        let no_candles = r#"{"results": [{"symbol": "PETR4"}]}"#;
        assert!(matches!(parse_history(&petr4(), no_candles), Err(Error::EmptyHistory(_))));
    }

    #[test]
    fn malformed_body_is_a_deserialization_error() {
        assert!(matches!(
            parse_history(&petr4(), "<html>gateway timeout</html>"),
            Err(Error::DeserializationFailed(_))
        ));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(2_000);
        let truncated = truncate(body, MAX_ERROR_BODY);
        assert!(truncated.len() <= MAX_ERROR_BODY + '…'.len_utf8());
        assert_eq!(truncate("short".into(), MAX_ERROR_BODY), "short");
    }
}
