// In crates/core-types/src/lib.rs

pub mod detector;
pub mod error;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use detector::DetectorConfig;
pub use error::{Error, Result};
pub use types::{
    AlertEvent, AlertKind, Evaluation, PriceSample, PriceSeries, RawClose, RawSample, SmaPoint,
    Ticker,
};
