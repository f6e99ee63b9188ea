// In crates/strategies/src/lib.rs

use core_types::{Evaluation, PriceSeries};
pub mod factory;
pub mod prepare;
pub mod sma_crossover;
pub mod types;

pub use prepare::prepare;
pub use sma_crossover::{detect, evaluate, sma_points, SmaCrossover};

/// The universal interface for a signal detector.
///
/// A detector looks at a prepared `PriceSeries` and decides whether the most
/// recent sample produced an alert. Detectors are stateless: every call
/// re-derives its indicators from the series it is given, so the same series
/// always yields the same `Evaluation`.
pub trait SignalDetector {
    /// The name of the detector.
    fn name(&self) -> &'static str;

    fn evaluate(&self, series: &PriceSeries) -> core_types::Result<Evaluation>;
}
