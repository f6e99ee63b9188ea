// In crates/core-types/src/types.rs

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An instrument identifier (e.g., "PETR4").
///
/// Always trimmed, upper-cased and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyTicker);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Ticker::new(value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

/// The close value exactly as the quote source delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawClose {
    Number(f64),
    Text(String),
    Missing,
}

impl From<f64> for RawClose {
    fn from(value: f64) -> Self {
        RawClose::Number(value)
    }
}

impl From<&str> for RawClose {
    fn from(value: &str) -> Self {
        RawClose::Text(value.to_string())
    }
}

impl From<Decimal> for RawClose {
    fn from(value: Decimal) -> Self {
        RawClose::Text(value.to_string())
    }
}

impl<T: Into<RawClose>> From<Option<T>> for RawClose {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawClose::Missing)
    }
}

/// One unvalidated observation from the quote source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub close: RawClose,
}

impl RawSample {
    pub fn new(timestamp: DateTime<Utc>, close: impl Into<RawClose>) -> Self {
        Self {
            timestamp,
            close: close.into(),
        }
    }
}

/// A validated closing price at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
}

/// Time-ordered closing prices for a single instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSeries {
    ticker: Ticker,
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    /// Builds a series, rejecting samples that are not strictly increasing in time.
    pub fn new(ticker: Ticker, samples: Vec<PriceSample>) -> Result<Self> {
        if samples.windows(2).any(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(Error::UnorderedSamples {
                ticker: ticker.to_string(),
            });
        }
        Ok(Self { ticker, samples })
    }

    /// Builds a series from samples in any order.
    ///
    /// When two samples share a timestamp, the one appearing later in
    /// `samples` wins.
    pub fn from_unordered(ticker: Ticker, mut samples: Vec<PriceSample>) -> Self {
        // Stable, so duplicates keep their input order.
        samples.sort_by_key(|sample| sample.timestamp);

        let mut ordered: Vec<PriceSample> = Vec::with_capacity(samples.len());
        for sample in samples {
            match ordered.last_mut() {
                Some(last) if last.timestamp == sample.timestamp => *last = sample,
                _ => ordered.push(sample),
            }
        }

        Self {
            ticker,
            samples: ordered,
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.last()
    }
}

/// A closing price paired with the SMA ending at that sample, when one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaPoint {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
    pub sma: Option<Decimal>,
}

/// The direction of a price/SMA crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    /// Price crossed from below the average to above it.
    Buy,
    /// Price crossed from above the average to below it.
    Sell,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Buy => "BUY",
            AlertKind::Sell => "SELL",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A crossover detected at the most recent sample of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub ticker: Ticker,
    /// Timestamp of the triggering price sample, not of the evaluation.
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub sma: Decimal,
    pub kind: AlertKind,
    /// The SMA window the alert was computed with.
    pub window: usize,
}

/// The outcome of evaluating one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Fewer valid points than needed to compare two SMA values.
    InsufficientData { valid_points: usize, required: usize },
    /// Enough data, but the latest sample did not cross the average.
    NoCrossover {
        timestamp: DateTime<Utc>,
        price: Decimal,
        sma: Decimal,
    },
    Crossover(AlertEvent),
}

impl Evaluation {
    pub fn into_alert(self) -> Option<AlertEvent> {
        match self {
            Evaluation::Crossover(alert) => Some(alert),
            _ => None,
        }
    }
}
