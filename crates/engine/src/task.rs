// In crates/engine/src/task.rs

use anyhow::Context;
use api_client::QuoteSource;
use core_types::{Evaluation, Ticker};
use strategies::SignalDetector;

/// What one ticker produced during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerReport {
    pub ticker: Ticker,
    /// Raw samples returned by the quote source.
    pub fetched: usize,
    /// Samples left after preparation.
    pub valid: usize,
    pub evaluation: Evaluation,
}

impl TickerReport {
    pub(crate) fn log(&self) {
        match &self.evaluation {
            Evaluation::InsufficientData { valid_points, required } => tracing::info!(
                ticker = %self.ticker,
                valid_points,
                required,
                "Not enough data to evaluate. Skipping."
            ),
            Evaluation::NoCrossover { timestamp, price, sma } => tracing::info!(
                ticker = %self.ticker,
                %timestamp,
                %price,
                %sma,
                "No crossover."
            ),
            Evaluation::Crossover(alert) => tracing::info!(
                ticker = %self.ticker,
                timestamp = %alert.timestamp,
                price = %alert.price,
                sma = %alert.sma,
                kind = %alert.kind,
                "Crossover detected."
            ),
        }
    }
}

/// Fetches, prepares and evaluates a single ticker.
pub async fn analyze_ticker(
    source: &dyn QuoteSource,
    detector: &(dyn SignalDetector + Send + Sync),
    ticker: &Ticker,
) -> anyhow::Result<TickerReport> {
    let raw = source
        .fetch_history(ticker)
        .await
        .with_context(|| format!("failed to fetch {} history for {ticker}", source.name()))?;
    let fetched = raw.len();

    let series = strategies::prepare(ticker.clone(), raw);
    if series.len() < fetched {
        tracing::debug!(%ticker, dropped = fetched - series.len(), "Dropped invalid or duplicate samples.");
    }

    let evaluation = detector
        .evaluate(&series)
        .with_context(|| format!("{} failed on {ticker}", detector.name()))?;

    Ok(TickerReport {
        ticker: ticker.clone(),
        fetched,
        valid: series.len(),
        evaluation,
    })
}
