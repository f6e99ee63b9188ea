// In crates/strategies/src/prepare.rs

use core_types::{PriceSample, PriceSeries, RawClose, RawSample, Ticker};
use rust_decimal::prelude::*;

/// Turns raw quote samples into a clean, strictly time-ordered `PriceSeries`.
///
/// Samples whose close cannot be read as a finite decimal are dropped rather
/// than zero-filled, since a zero would drag the average down and fabricate
/// crossovers. Input order is not trusted. When two samples share a
/// timestamp, the one appearing later in the input wins.
pub fn prepare<I>(ticker: Ticker, raw: I) -> PriceSeries
where
    I: IntoIterator<Item = RawSample>,
{
    let samples: Vec<PriceSample> = raw
        .into_iter()
        .filter_map(|sample| {
            parse_close(&sample.close).map(|close| PriceSample {
                timestamp: sample.timestamp,
                close,
            })
        })
        .collect();

    PriceSeries::from_unordered(ticker, samples)
}

/// Coerces a raw close into a finite decimal, if possible.
pub fn parse_close(raw: &RawClose) -> Option<Decimal> {
    match raw {
        RawClose::Number(value) if value.is_finite() => Decimal::from_f64(*value),
        RawClose::Number(_) | RawClose::Missing => None,
        RawClose::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .ok()
        }
    }
}
