// In crates/strategies/src/sma_crossover.rs

use crate::types::SmaCrossoverSettings;
use crate::SignalDetector;
use core_types::{AlertEvent, AlertKind, Error, Evaluation, PriceSeries, Result, SmaPoint};
use rust_decimal::Decimal;

/// Price vs. simple moving average crossover detector.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    settings: SmaCrossoverSettings,
}

impl SmaCrossover {
    /// Creates a detector, rejecting a zero window up front.
    pub fn new(settings: SmaCrossoverSettings) -> Result<Self> {
        validate_window(settings.window)?;
        Ok(Self { settings })
    }
}

impl SignalDetector for SmaCrossover {
    fn name(&self) -> &'static str {
        "SmaCrossover"
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Evaluation> {
        evaluate(series, self.settings.window)
    }
}

fn validate_window(window: usize) -> Result<()> {
    if window == 0 {
        return Err(Error::InvalidWindow(window));
    }
    Ok(())
}

/// Pairs every sample with the SMA of the `window` closes ending at it.
///
/// The result has one point per sample. Points before index `window - 1`
/// carry no SMA.
pub fn sma_points(series: &PriceSeries, window: usize) -> Result<Vec<SmaPoint>> {
    validate_window(window)?;

    let samples = series.samples();
    let divisor = Decimal::from(window);

    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let sma = if i + 1 >= window {
                let sum = samples[i + 1 - window..=i]
                    .iter()
                    .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.close));
                let sma = sum.and_then(|sum| sum.checked_div(divisor)).ok_or_else(|| {
                    Error::SmaOverflow {
                        ticker: series.ticker().to_string(),
                    }
                })?;
                Some(sma)
            } else {
                None
            };
            Ok(SmaPoint {
                timestamp: sample.timestamp,
                close: sample.close,
                sma,
            })
        })
        .collect()
}

/// Classifies the move between two (price, SMA) pairs.
///
/// Only strict crossings count. A price sitting exactly on its average is
/// neither above nor below it.
pub fn classify(
    prev_price: Decimal,
    prev_sma: Decimal,
    cur_price: Decimal,
    cur_sma: Decimal,
) -> Option<AlertKind> {
    if prev_price < prev_sma && cur_price > cur_sma {
        Some(AlertKind::Buy)
    } else if prev_price > prev_sma && cur_price < cur_sma {
        Some(AlertKind::Sell)
    } else {
        None
    }
}

/// Evaluates the latest sample of `series` against its `window`-period SMA.
pub fn evaluate(series: &PriceSeries, window: usize) -> Result<Evaluation> {
    validate_window(window)?;

    let insufficient = Evaluation::InsufficientData {
        valid_points: series.len(),
        required: window.saturating_add(1),
    };

    if series.len() < window {
        return Ok(insufficient);
    }

    let points = sma_points(series, window)?;
    let mut defined = points
        .iter()
        .rev()
        .filter_map(|point| point.sma.map(|sma| (point, sma)));

    let (Some((cur, cur_sma)), Some((prev, prev_sma))) = (defined.next(), defined.next()) else {
        return Ok(insufficient);
    };

    let evaluation = match classify(prev.close, prev_sma, cur.close, cur_sma) {
        Some(kind) => Evaluation::Crossover(AlertEvent {
            ticker: series.ticker().clone(),
            timestamp: cur.timestamp,
            price: cur.close,
            sma: cur_sma,
            kind,
            window,
        }),
        None => Evaluation::NoCrossover {
            timestamp: cur.timestamp,
            price: cur.close,
            sma: cur_sma,
        },
    };

    Ok(evaluation)
}

/// Returns the alert raised by the latest sample, if any.
///
/// `Ok(None)` covers both "not enough data" and "no crossover".
pub fn detect(series: &PriceSeries, window: usize) -> Result<Option<AlertEvent>> {
    evaluate(series, window).map(Evaluation::into_alert)
}
