// In crates/core-types/src/error.rs

use thiserror::Error;

/// Precondition violations raised by the signal core.
///
/// Insufficient data and unparseable samples are not errors: the first is a
/// normal "no signal" outcome and the second is dropped during preparation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Ticker must not be empty")]
    EmptyTicker,

    #[error("SMA window must be a positive integer, got {0}")]
    InvalidWindow(usize),

    #[error("Price samples for {ticker} are not in strictly increasing time order")]
    UnorderedSamples { ticker: String },

    #[error("SMA of {ticker} overflowed the decimal range")]
    SmaOverflow { ticker: String },
}

pub type Result<T> = std::result::Result<T, Error>;
