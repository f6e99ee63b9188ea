// In crates/app-config/src/types.rs

use serde::{Deserialize, Deserializer};
use secrecy::SecretString;
use std::path::PathBuf;

use core_types::{DetectorConfig, Ticker};

use crate::error::{Error, Result};

#[derive(Deserialize, Debug)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the upstream quote API.
    pub quotes: QuoteSettings,
    /// Which detector to run and with what parameters.
    pub signal: DetectorConfig,
    pub scheduler: SchedulerSettings,
    /// Instruments analysed on every run.
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Where generated alerts are recorded.
    #[serde(default)]
    pub sink: SinkSettings,
}

impl Settings {
    /// Parses the configured ticker list.
    pub fn tickers(&self) -> Result<Vec<Ticker>> {
        let mut tickers = Vec::with_capacity(self.tickers.len());
        for raw in &self.tickers {
            let ticker = Ticker::new(raw)?;
            if !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }
        Ok(tickers)
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tickers()?.is_empty() {
            return Err(Error::Invalid("at least one ticker must be configured".into()));
        }
        if self.scheduler.every_minutes == 0 {
            return Err(Error::Invalid("scheduler.every_minutes must be positive".into()));
        }
        if self.scheduler.max_concurrency == 0 {
            return Err(Error::Invalid("scheduler.max_concurrency must be positive".into()));
        }
        if self.quotes.timeout_secs == 0 {
            return Err(Error::Invalid("quotes.timeout_secs must be positive".into()));
        }
        strategies::factory::create_detector(&self.signal)
            .map_err(|e| Error::Invalid(format!("signal: {e}")))?;
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug)]
pub struct QuoteSettings {
    /// The REST API base URL for the quote provider.
    pub base_url: String,
    /// The provider's API token. Requests are sent without one when unset.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
    /// History range requested per ticker (e.g., "5d").
    pub range: String,
    /// Candle interval (e.g., "30m").
    pub interval: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SchedulerSettings {
    /// Minutes between two analysis runs.
    pub every_minutes: u64,
    /// Fire the first run immediately instead of after one period.
    #[serde(default)]
    pub run_on_startup: bool,
    /// Tickers fetched and evaluated at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    /// The connection URL for the PostgreSQL database.
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// The alert destination.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkSettings {
    Postgres(DatabaseSettings),
    /// One CSV file per run, written into `directory`.
    Csv { directory: PathBuf },
    /// Alerts are only logged.
    #[default]
    Log,
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::from))
}

/// Helper functions for serde defaults
fn default_timeout_secs() -> u64 { 30 }
fn default_max_concurrency() -> usize { 4 }
fn default_max_connections() -> u32 { 5 }
