// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: status {status}, msg: {msg}")]
    ApiError { status: u16, msg: String },
    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("No price history returned for {0}")]
    EmptyHistory(String),
}

impl Error {
    /// The HTTP status attached to this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ApiError { status, .. } | Error::HttpStatus { status, .. } => Some(*status),
            Error::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
