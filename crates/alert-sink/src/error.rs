// In crates/alert-sink/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database sink failed: {0}")]
    Database(#[from] database::Error),

    #[error("Failed to write alert file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode alerts as CSV: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
